//! In-memory FTP server double shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rax_ftp_client::error::{TransportError, TransportResult};
use rax_ftp_client::transport::{Connector, Endpoint, FtpTransport};
use rax_ftp_client::utils::logging::setup_logging;
use rax_ftp_client::{FtpConfig, FtpConnection, TransferMode};

/// Remote filesystem plus knobs for injecting failures
#[derive(Debug)]
pub struct RemoteState {
    pub dirs: BTreeSet<String>,
    pub files: BTreeMap<String, (Vec<u8>, TransferMode)>,
    /// Every primitive issued, in order, e.g. `STOR /site/a.txt A`
    pub calls: Vec<String>,
    pub dials: usize,
    pub logins: usize,
    pub refuse_dial: bool,
    pub reject_login: bool,
    /// Directories whose RMD is refused
    pub locked_dirs: HashSet<String>,
    /// Remote files whose STOR is refused
    pub rejected_uploads: HashSet<String>,
    /// Remote files whose DELE is refused
    pub locked_files: HashSet<String>,
    /// NLST of a file answers with the file itself instead of 450
    pub nlst_lists_files: bool,
}

impl Default for RemoteState {
    fn default() -> Self {
        Self {
            dirs: BTreeSet::from(["/".to_string()]),
            files: BTreeMap::new(),
            calls: Vec::new(),
            dials: 0,
            logins: 0,
            refuse_dial: false,
            reject_login: false,
            locked_dirs: HashSet::new(),
            rejected_uploads: HashSet::new(),
            locked_files: HashSet::new(),
            nlst_lists_files: false,
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryServer {
    state: Arc<Mutex<RemoteState>>,
}

impl MemoryServer {
    pub fn new() -> Self {
        setup_logging();
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, RemoteState> {
        self.state.lock().unwrap()
    }

    pub fn add_dir(&self, path: &str) {
        self.state().dirs.insert(normalize("/", path));
    }

    pub fn add_file(&self, path: &str, data: &[u8]) {
        self.state()
            .files
            .insert(normalize("/", path), (data.to_vec(), TransferMode::Binary));
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn connector(&self) -> Arc<dyn Connector> {
        Arc::new(MemoryConnector {
            server: self.clone(),
        })
    }

    /// A connection to this server with a minimal valid configuration.
    pub fn connection(&self) -> FtpConnection {
        FtpConnection::new(
            FtpConfig::new().host("memory.test").user("alice").password("secret"),
            self.connector(),
        )
    }
}

/// Resolve `path` against `cwd` into `/a/b` form.
pub fn normalize(cwd: &str, path: &str) -> String {
    let joined = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("{}/{}", cwd.trim_end_matches('/'), path)
    };
    let mut parts: Vec<&str> = Vec::new();
    for part in joined.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            p => parts.push(p),
        }
    }
    format!("/{}", parts.join("/"))
}

fn parent_of(path: &str) -> String {
    match path.rsplit_once('/') {
        Some(("", _)) | None => "/".to_string(),
        Some((parent, _)) => parent.to_string(),
    }
}

fn refused(text: &str) -> TransportError {
    TransportError::from_reply(550, text)
}

struct MemoryConnector {
    server: MemoryServer,
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn open(&self, endpoint: &Endpoint) -> TransportResult<Box<dyn FtpTransport>> {
        let mut state = self.server.state();
        state.dials += 1;
        if state.refuse_dial {
            return Err(TransportError::connect_failed(format!(
                "connect to {}: connection refused",
                endpoint.address()
            )));
        }
        Ok(Box::new(MemoryTransport {
            server: self.server.clone(),
            cwd: "/".to_string(),
        }))
    }
}

struct MemoryTransport {
    server: MemoryServer,
    cwd: String,
}

impl MemoryTransport {
    fn log(&self, call: String) -> MutexGuard<'_, RemoteState> {
        let mut state = self.server.state();
        state.calls.push(call);
        state
    }

    fn resolve(&self, path: &str) -> String {
        normalize(&self.cwd, path)
    }
}

#[async_trait]
impl FtpTransport for MemoryTransport {
    async fn login(&mut self, user: Option<&str>, _password: Option<&str>) -> TransportResult<()> {
        let mut state = self.log(format!("USER {}", user.unwrap_or("anonymous")));
        if state.reject_login {
            return Err(TransportError::auth_rejected(530, "Login incorrect."));
        }
        state.logins += 1;
        Ok(())
    }

    async fn set_passive(&mut self, passive: bool) -> TransportResult<()> {
        drop(self.log(format!("PASSIVE {}", passive)));
        Ok(())
    }

    async fn pwd(&mut self) -> TransportResult<String> {
        drop(self.log("PWD".into()));
        Ok(self.cwd.clone())
    }

    async fn chdir(&mut self, path: &str) -> TransportResult<()> {
        let target = self.resolve(path);
        let state = self.log(format!("CWD {}", target));
        if !state.dirs.contains(&target) {
            return Err(refused("No such directory."));
        }
        drop(state);
        self.cwd = target;
        Ok(())
    }

    async fn mkdir(&mut self, path: &str) -> TransportResult<()> {
        let target = self.resolve(path);
        let mut state = self.log(format!("MKD {}", target));
        if state.dirs.contains(&target) || !state.dirs.contains(&parent_of(&target)) {
            return Err(refused("Create directory operation failed."));
        }
        state.dirs.insert(target);
        Ok(())
    }

    async fn alloc(&mut self, size: u64) -> TransportResult<()> {
        drop(self.log(format!("ALLO {}", size)));
        Ok(())
    }

    async fn put(&mut self, local: &Path, remote: &str, mode: TransferMode) -> TransportResult<u64> {
        let data = tokio::fs::read(local).await?;
        let target = self.resolve(remote);
        let mut state = self.log(format!("STOR {} {}", target, mode.type_code()));
        if state.rejected_uploads.contains(&target) || !state.dirs.contains(&parent_of(&target)) {
            return Err(refused("Could not create file."));
        }
        let sent = data.len() as u64;
        state.files.insert(target, (data, mode));
        Ok(sent)
    }

    async fn get(&mut self, remote: &str, local: &Path, mode: TransferMode) -> TransportResult<u64> {
        let target = self.resolve(remote);
        let data = {
            let state = self.log(format!("RETR {} {}", target, mode.type_code()));
            match state.files.get(&target) {
                Some((data, _)) => data.clone(),
                None => return Err(refused("Failed to open file.")),
            }
        };
        tokio::fs::write(local, &data).await?;
        Ok(data.len() as u64)
    }

    async fn rename(&mut self, from: &str, to: &str) -> TransportResult<()> {
        let (from, to) = (self.resolve(from), self.resolve(to));
        let mut state = self.log(format!("RNFR {} RNTO {}", from, to));
        match state.files.remove(&from) {
            Some(entry) => {
                state.files.insert(to, entry);
                Ok(())
            }
            None => Err(refused("RNFR command failed.")),
        }
    }

    async fn delete(&mut self, path: &str) -> TransportResult<()> {
        let target = self.resolve(path);
        let mut state = self.log(format!("DELE {}", target));
        if state.locked_files.contains(&target) {
            return Err(refused("Permission denied."));
        }
        match state.files.remove(&target) {
            Some(_) => Ok(()),
            None => Err(refused("Delete operation failed.")),
        }
    }

    async fn rmdir(&mut self, path: &str) -> TransportResult<()> {
        let target = self.resolve(path);
        let mut state = self.log(format!("RMD {}", target));
        let prefix = format!("{}/", target.trim_end_matches('/'));
        let has_children = state.files.keys().any(|f| f.starts_with(&prefix))
            || state.dirs.iter().any(|d| d.starts_with(&prefix));
        if target == "/"
            || !state.dirs.contains(&target)
            || has_children
            || state.locked_dirs.contains(&target)
        {
            return Err(refused("Remove directory operation failed."));
        }
        state.dirs.remove(&target);
        Ok(())
    }

    async fn nlist(&mut self, path: &str) -> TransportResult<Vec<String>> {
        let target = self.resolve(path);
        let state = self.log(format!("NLST {}", target));
        if state.nlst_lists_files && state.files.contains_key(&target) {
            return Ok(vec![target]);
        }
        if !state.dirs.contains(&target) {
            return Err(TransportError::from_reply(450, "No such directory."));
        }
        let children = state
            .dirs
            .iter()
            .chain(state.files.keys())
            .filter(|p| p.as_str() != "/" && parent_of(p) == target)
            .filter_map(|p| p.rsplit('/').next().map(str::to_string))
            .collect();
        Ok(children)
    }

    async fn raw_list(&mut self, path: &str) -> TransportResult<Vec<String>> {
        let names = self.nlist(path).await?;
        Ok(names
            .into_iter()
            .map(|n| format!("-rw-r--r-- 1 ftp ftp 0 Jan 01 00:00 {}", n))
            .collect())
    }

    async fn size(&mut self, path: &str) -> TransportResult<Option<u64>> {
        let target = self.resolve(path);
        let state = self.log(format!("SIZE {}", target));
        Ok(state.files.get(&target).map(|(d, _)| d.len() as u64))
    }

    async fn mdtm(&mut self, path: &str) -> TransportResult<Option<DateTime<Utc>>> {
        let target = self.resolve(path);
        let state = self.log(format!("MDTM {}", target));
        Ok(state
            .files
            .get(&target)
            .and_then(|_| DateTime::from_timestamp(1_700_000_000, 0)))
    }

    async fn chmod(&mut self, path: &str, mode: u32) -> TransportResult<()> {
        let target = self.resolve(path);
        drop(self.log(format!("SITE CHMOD {:o} {}", mode, target)));
        Ok(())
    }

    async fn systype(&mut self) -> TransportResult<String> {
        drop(self.log("SYST".into()));
        Ok("UNIX Type: L8".into())
    }

    async fn close(&mut self) -> TransportResult<()> {
        drop(self.log("QUIT".into()));
        Ok(())
    }
}
