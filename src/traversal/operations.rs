//! Recursive traversal operations
//!
//! `mirror` copies a local tree onto the server; `delete_dir` removes a
//! remote tree. Both walk depth-first over a single connection and decline
//! softly when a precondition does not hold.

use log::{debug, info, warn};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use crate::client::FtpConnection;
use crate::error::handlers::handle_tolerated;
use crate::error::{FtpClientError, FtpResult};
use crate::transfer::ModeSelection;
use crate::traversal::results::{
    DeleteReport, MirrorFailure, MirrorPolicy, MirrorReport, Outcome, Precondition,
};
use crate::utils::path::{absolutize, join_remote, listed_entry_path, with_trailing_slash};

/// Boxed, `Send` future for the recursive walkers.
type Walk<'a, T> = Pin<Box<dyn Future<Output = FtpResult<T>> + Send + 'a>>;

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

impl FtpConnection {
    /// Mirror `local_root` into `remote_root`, continuing past failed entries.
    pub async fn mirror(
        &mut self,
        local_root: impl AsRef<Path>,
        remote_root: &str,
    ) -> FtpResult<Outcome<MirrorReport>> {
        self.mirror_with_policy(local_root, remote_root, MirrorPolicy::default())
            .await
    }

    /// Mirror `local_root` into `remote_root`.
    ///
    /// Hidden entries (names starting with `.`) are skipped. Missing remote
    /// directories are created. Text-like files are sent in ascii mode and
    /// everything else in binary. A lost control connection is always
    /// returned as an error, whatever the policy.
    pub async fn mirror_with_policy(
        &mut self,
        local_root: impl AsRef<Path>,
        remote_root: &str,
        policy: MirrorPolicy,
    ) -> FtpResult<Outcome<MirrorReport>> {
        let local_root = local_root.as_ref();

        if let Err(e) = self.connect().await {
            handle_tolerated("mirror skipped", &e);
            return Ok(Outcome::Declined(Precondition::NotConnected(e.to_string())));
        }

        // The walk changes directory, so relative targets are pinned first.
        let remote_root = if remote_root.starts_with('/') {
            remote_root.to_string()
        } else {
            let cwd = self.current_dir().await?;
            absolutize(&cwd, remote_root)
        };

        info!(
            "Mirroring {} -> {} on {}",
            local_root.display(),
            remote_root,
            self.name()
        );

        let mut report = MirrorReport::default();
        match self
            .mirror_dir(local_root.to_path_buf(), remote_root, policy, &mut report)
            .await?
        {
            Outcome::Completed(()) => {
                info!(
                    "Mirror finished: {} file(s), {} new dir(s), {} failure(s)",
                    report.files_uploaded,
                    report.directories_created,
                    report.failures.len()
                );
                Ok(Outcome::Completed(report))
            }
            Outcome::Declined(reason) => {
                warn!("Mirror declined: {}", reason);
                Ok(Outcome::Declined(reason))
            }
        }
    }

    fn mirror_dir<'a>(
        &'a mut self,
        local: PathBuf,
        remote: String,
        policy: MirrorPolicy,
        report: &'a mut MirrorReport,
    ) -> Walk<'a, Outcome<()>> {
        Box::pin(async move {
            let mut entries = match tokio::fs::read_dir(&local).await {
                Ok(entries) => entries,
                Err(e) => {
                    debug!("Cannot read {}: {}", local.display(), e);
                    return Ok(Outcome::Declined(Precondition::LocalUnreadable(local)));
                }
            };

            let remote = with_trailing_slash(&remote);
            if !self.try_change_dir(&remote).await? {
                if let Err(e) = self.mkdir(&remote, None).await {
                    tolerate("mirror mkdir", e)?;
                    return Ok(Outcome::Declined(Precondition::RemoteUnavailable(remote)));
                }
                report.directories_created += 1;
                if let Err(e) = self.change_dir(&remote).await {
                    tolerate("mirror chdir", e)?;
                    return Ok(Outcome::Declined(Precondition::RemoteUnavailable(remote)));
                }
            }

            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        record(report, policy, &remote, FtpClientError::Io(e))?;
                        break;
                    }
                };

                let name = entry.file_name().to_string_lossy().into_owned();
                if is_hidden(&name) {
                    debug!("Skipping hidden entry {}", entry.path().display());
                    continue;
                }

                let local_path = entry.path();
                let remote_path = join_remote(&remote, &name);

                // Follows symlinks, like a plain `is_dir` check would.
                let is_dir = match tokio::fs::metadata(&local_path).await {
                    Ok(meta) => meta.is_dir(),
                    Err(e) => {
                        record(report, policy, &remote_path, FtpClientError::Io(e))?;
                        continue;
                    }
                };

                if is_dir {
                    let nested = self
                        .mirror_dir(local_path, remote_path.clone(), policy, report)
                        .await?;
                    if let Outcome::Declined(reason) = nested {
                        let err = FtpClientError::operation("mirror", remote_path.as_str(), reason);
                        record(report, policy, &remote_path, err)?;
                    }
                    continue;
                }

                match self
                    .upload(&local_path, &remote_path, ModeSelection::Auto, None)
                    .await
                {
                    Ok(bytes) => {
                        report.files_uploaded += 1;
                        report.bytes_uploaded += bytes;
                    }
                    Err(e) => record(report, policy, &remote_path, e)?,
                }
            }

            Ok(Outcome::Completed(()))
        })
    }

    /// Delete the remote directory `path` and everything below it.
    ///
    /// Listed entries are first deleted as files; an entry that refuses
    /// deletion is taken to be a directory and removed recursively. A final
    /// `RMD` failure is a hard error.
    pub async fn delete_dir(&mut self, path: &str) -> FtpResult<Outcome<DeleteReport>> {
        if let Err(e) = self.connect().await {
            handle_tolerated("delete_dir skipped", &e);
            return Ok(Outcome::Declined(Precondition::NotConnected(e.to_string())));
        }

        info!("Deleting remote tree {} on {}", path, self.name());
        let mut report = DeleteReport::default();
        self.delete_tree(path, &mut report).await?;
        info!(
            "Deleted {} file(s) and {} dir(s) under {}",
            report.files_deleted, report.directories_removed, path
        );
        Ok(Outcome::Completed(report))
    }

    fn delete_tree<'a>(&'a mut self, path: &'a str, report: &'a mut DeleteReport) -> Walk<'a, ()> {
        Box::pin(async move {
            let dir = with_trailing_slash(path);

            let entries = match self.list_files(&dir, false).await {
                Ok(entries) => entries,
                Err(e @ FtpClientError::Connection(_)) => return Err(e),
                Err(e) => {
                    // Empty directories make some servers answer NLST with 450/550.
                    debug!("No listing for {}: {}", dir, e);
                    Vec::new()
                }
            };

            for entry in entries {
                let Some(entry_path) = listed_entry_path(&dir, &entry) else {
                    continue;
                };
                // NLST of a plain file lists the file itself.
                if with_trailing_slash(&entry_path) == dir {
                    debug!("{} lists itself; not a directory", dir);
                    continue;
                }

                match self.delete_file(&entry_path).await {
                    Ok(()) => report.files_deleted += 1,
                    Err(e @ FtpClientError::Connection(_)) => return Err(e),
                    Err(_) => self.delete_tree(&entry_path, report).await?,
                }
            }

            self.rmdir(&dir).await?;
            report.directories_removed += 1;
            Ok(())
        })
    }
}

/// Log a tolerated failure; connection-level errors still propagate.
fn tolerate(context: &str, err: FtpClientError) -> FtpResult<()> {
    if matches!(err, FtpClientError::Connection(_)) {
        return Err(err);
    }
    handle_tolerated(context, &err);
    Ok(())
}

/// Apply the mirror policy to one failed entry.
fn record(
    report: &mut MirrorReport,
    policy: MirrorPolicy,
    path: &str,
    err: FtpClientError,
) -> FtpResult<()> {
    if matches!(err, FtpClientError::Connection(_)) || policy == MirrorPolicy::AbortOnFirst {
        return Err(err);
    }
    warn!("Mirror entry {} failed: {}", path, err);
    report.failures.push(MirrorFailure {
        path: path.to_string(),
        reason: err.to_string(),
    });
    Ok(())
}
