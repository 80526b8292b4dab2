//! Client operations
//!
//! Single remote operations. Each one makes sure the session is up, issues
//! one transport primitive, and turns a failed reply into an `Operation` error.

use chrono::{DateTime, Utc};
use log::{debug, info};
use std::io::ErrorKind;
use std::path::Path;

use crate::client::FtpConnection;
use crate::error::handlers::operation_error;
use crate::error::{FtpClientError, FtpResult};
use crate::transfer::ModeSelection;
use crate::utils::format::format_size;

fn require_path(operation: &'static str, path: &str) -> FtpResult<()> {
    if path.trim().is_empty() {
        return Err(FtpClientError::operation(operation, path, "empty path"));
    }
    Ok(())
}

impl FtpConnection {
    /// Change the remote working directory.
    pub async fn change_dir(&mut self, path: &str) -> FtpResult<()> {
        require_path("changedir", path)?;
        let transport = self.ensure_connected().await?;
        transport
            .chdir(path)
            .await
            .map_err(|e| operation_error("changedir", path, e))
    }

    /// Probe a directory by entering it; a refusal is `Ok(false)`, not an error.
    pub async fn try_change_dir(&mut self, path: &str) -> FtpResult<bool> {
        require_path("changedir", path)?;
        let transport = self.ensure_connected().await?;
        match transport.chdir(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_fatal() => Err(operation_error("changedir", path, e)),
            Err(e) => {
                debug!("Cannot enter {}: {}", path, e);
                Ok(false)
            }
        }
    }

    /// Remote working directory.
    pub async fn current_dir(&mut self) -> FtpResult<String> {
        let transport = self.ensure_connected().await?;
        transport.pwd().await.map_err(|e| operation_error("pwd", "", e))
    }

    /// Create a directory, optionally setting its permissions.
    pub async fn mkdir(&mut self, path: &str, permissions: Option<u32>) -> FtpResult<()> {
        require_path("mkdir", path)?;
        let transport = self.ensure_connected().await?;
        transport
            .mkdir(path)
            .await
            .map_err(|e| operation_error("mkdir", path, e))?;

        if let Some(mode) = permissions {
            self.chmod(path, mode).await?;
        }
        Ok(())
    }

    /// Upload a local file.
    ///
    /// Space is pre-allocated with the local size before the transfer.
    pub async fn upload(
        &mut self,
        local: impl AsRef<Path>,
        remote: &str,
        mode: ModeSelection,
        permissions: Option<u32>,
    ) -> FtpResult<u64> {
        let local = local.as_ref();
        require_path("upload", remote)?;
        let transport = self.ensure_connected().await?;

        let size = match tokio::fs::metadata(local).await {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => return Err(FtpClientError::SourceNotFound(local.to_path_buf())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(FtpClientError::SourceNotFound(local.to_path_buf()));
            }
            Err(e) => return Err(FtpClientError::Io(e)),
        };

        let mode = mode.resolve(&local.to_string_lossy());

        transport.alloc(size).await.map_err(|e| {
            if e.is_fatal() {
                operation_error("upload", remote, e)
            } else {
                FtpClientError::Allocation(e.to_string())
            }
        })?;

        let sent = transport
            .put(local, remote, mode)
            .await
            .map_err(|e| operation_error("upload", remote, e))?;
        info!("Uploaded {} -> {} ({} bytes, {})", local.display(), remote, sent, mode);

        if let Some(perm) = permissions {
            self.chmod(remote, perm).await?;
        }
        Ok(sent)
    }

    /// Download a remote file to a local path.
    pub async fn download(
        &mut self,
        remote: &str,
        local: impl AsRef<Path>,
        mode: ModeSelection,
    ) -> FtpResult<u64> {
        let local = local.as_ref();
        require_path("download", remote)?;
        let transport = self.ensure_connected().await?;
        let mode = mode.resolve(remote);

        let received = transport
            .get(remote, local, mode)
            .await
            .map_err(|e| operation_error("download", remote, e))?;
        info!("Downloaded {} -> {} ({} bytes, {})", remote, local.display(), received, mode);
        Ok(received)
    }

    /// Rename a file or directory.
    pub async fn rename(&mut self, old_path: &str, new_path: &str) -> FtpResult<()> {
        self.rename_as("rename", old_path, new_path).await
    }

    /// Move a file; the same primitive as `rename`, reported as a move.
    pub async fn move_file(&mut self, old_path: &str, new_path: &str) -> FtpResult<()> {
        self.rename_as("move", old_path, new_path).await
    }

    async fn rename_as(
        &mut self,
        operation: &'static str,
        old_path: &str,
        new_path: &str,
    ) -> FtpResult<()> {
        require_path(operation, old_path)?;
        require_path(operation, new_path)?;
        let transport = self.ensure_connected().await?;
        transport
            .rename(old_path, new_path)
            .await
            .map_err(|e| operation_error(operation, old_path, e))
    }

    /// Remove an empty remote directory.
    pub async fn rmdir(&mut self, path: &str) -> FtpResult<()> {
        require_path("rmdir", path)?;
        let transport = self.ensure_connected().await?;
        transport
            .rmdir(path)
            .await
            .map_err(|e| operation_error("rmdir", path, e))
    }

    /// Delete a single remote file.
    pub async fn delete_file(&mut self, path: &str) -> FtpResult<()> {
        require_path("delete", path)?;
        let transport = self.ensure_connected().await?;
        transport
            .delete(path)
            .await
            .map_err(|e| operation_error("delete", path, e))
    }

    /// Set permissions, e.g. `0o644`.
    pub async fn chmod(&mut self, path: &str, mode: u32) -> FtpResult<()> {
        require_path("chmod", path)?;
        let transport = self.ensure_connected().await?;
        transport
            .chmod(path, mode)
            .await
            .map_err(|e| operation_error("chmod", path, e))
    }

    /// Names under `path`, or raw `LIST` lines when `details` is set.
    pub async fn list_files(&mut self, path: &str, details: bool) -> FtpResult<Vec<String>> {
        let path = if path.is_empty() { "." } else { path };
        let transport = self.ensure_connected().await?;
        let result = if details {
            transport.raw_list(path).await
        } else {
            transport.nlist(path).await
        };
        result.map_err(|e| operation_error("list", path, e))
    }

    /// Remote system type as reported by `SYST`.
    pub async fn systype(&mut self) -> FtpResult<String> {
        let transport = self.ensure_connected().await?;
        transport
            .systype()
            .await
            .map_err(|e| operation_error("systype", "", e))
    }

    /// Size in bytes; `None` when the server does not know the file.
    pub async fn file_size(&mut self, path: &str) -> FtpResult<Option<u64>> {
        let transport = self.ensure_connected().await?;
        transport
            .size(path)
            .await
            .map_err(|e| operation_error("size", path, e))
    }

    /// Size as a human-readable string.
    pub async fn file_size_formatted(&mut self, path: &str) -> FtpResult<Option<String>> {
        Ok(self.file_size(path).await?.map(format_size))
    }

    pub async fn file_exists(&mut self, path: &str) -> FtpResult<bool> {
        Ok(self.file_size(path).await?.is_some())
    }

    /// Last modification time; `None` when the server cannot tell.
    pub async fn filemtime(&mut self, path: &str) -> FtpResult<Option<DateTime<Utc>>> {
        let transport = self.ensure_connected().await?;
        transport
            .mdtm(path)
            .await
            .map_err(|e| operation_error("mdtm", path, e))
    }

    /// Whether `path` can be entered; the working directory is left unchanged.
    pub async fn dir_exists(&mut self, path: &str) -> FtpResult<bool> {
        let previous = self.current_dir().await?;
        if !self.try_change_dir(path).await? {
            return Ok(false);
        }
        self.change_dir(&previous).await?;
        Ok(true)
    }
}
