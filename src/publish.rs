//! Publishing of located result files to a remote repository.
//!
//! A publish run:
//!   - logs in to the remote host with the publisher's credentials
//!   - resolves the jurisdiction's results repository
//!   - pushes every located file to the publishing branch, creating or updating it
//!   - merges the publishing branch into the public branch
//!
//! The run is fail-fast: the first error is returned as is, files already pushed
//! stay pushed and the merge is not attempted.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::config::RemoteSettings;
use crate::contract::{
    Credentials, PublishAction, PublishReport, PublishedFile, Publisher, RemoteHost,
    RemoteRepository, TreeEntry,
};
use crate::error::PublishError;
use crate::hooks::{PublishHooks, PublishStage};
use crate::locate::{FileLocator, FileQuery, RAW_MARKER};

/// Remote directory for raw result files.
pub const RAW_PREFIX: &str = "raw";
/// Remote directory for cleaned result files.
pub const CLEAN_PREFIX: &str = "clean";

const PUBLISHER_NAME: &str = "RemotePublisher";

/// Publishes result files to one repository per jurisdiction on a remote host.
pub struct RemotePublisher<H> {
    host: H,
    credentials: Credentials,
    locator: FileLocator,
    settings: RemoteSettings,
}

impl<H: RemoteHost> RemotePublisher<H> {
    pub fn new(
        host: H,
        credentials: Credentials,
        locator: FileLocator,
        settings: RemoteSettings,
    ) -> Self {
        Self {
            host,
            credentials,
            locator,
            settings,
        }
    }

    pub fn settings(&self) -> &RemoteSettings {
        &self.settings
    }

    /// `<organization>-results-<jurisdiction>`, always lowercase.
    pub fn repository_name(&self, jurisdiction: &str) -> String {
        format!(
            "{}-results-{}",
            self.settings.organization,
            jurisdiction.to_lowercase()
        )
        .to_lowercase()
    }

    /// Path of `filename` inside the results repository.
    pub fn get_path(&self, filename: &Path) -> String {
        remote_path(filename)
    }

    /// Content identifier of `path` on `branch`, or `None` if the path is not tracked.
    pub async fn get_sha(
        &self,
        repo: &dyn RemoteRepository,
        path: &str,
        branch: &str,
    ) -> Result<Option<String>, PublishError> {
        let tree = repo.tree(branch).await?;
        debug!(
            repository = %repo.name(),
            branch,
            entries = tree.len(),
            "[PUBLISH] Fetched remote tree"
        );
        Ok(find_sha(&tree, path).map(str::to_owned))
    }

    /// Push a single local file to `branch`, creating or updating it.
    pub async fn publish_file(
        &self,
        repo: &dyn RemoteRepository,
        filename: &Path,
        branch: &str,
        hooks: &PublishHooks,
    ) -> Result<PublishedFile, PublishError> {
        hooks.emit(PublishStage::PrePublish, PUBLISHER_NAME, filename)?;

        let path = self.get_path(filename);
        let content = std::fs::read_to_string(filename).map_err(|e| {
            error!(error = ?e, file = %filename.display(), "[PUBLISH][ERROR] Failed to read result file");
            PublishError::Io {
                path: filename.to_path_buf(),
                source: e,
            }
        })?;

        let action = match self.get_sha(repo, &path, branch).await? {
            Some(sha) => {
                let message = format!("Update file {path}");
                let commit = repo
                    .update_file(&path, &message, &content, &sha, branch)
                    .await?;
                info!(path = %path, commit = %commit.commit_sha, "[PUBLISH] Updated remote file");
                PublishAction::Updated
            }
            None => {
                let message = format!("Create file {path}");
                let commit = repo.create_file(&path, &message, &content, branch).await?;
                info!(path = %path, commit = %commit.commit_sha, "[PUBLISH] Created remote file");
                PublishAction::Created
            }
        };

        hooks.emit(PublishStage::PostPublish, PUBLISHER_NAME, filename)?;

        Ok(PublishedFile {
            local_path: filename.to_path_buf(),
            remote_path: path,
            action,
        })
    }
}

#[async_trait]
impl<H: RemoteHost> Publisher for RemotePublisher<H> {
    fn locator(&self) -> &FileLocator {
        &self.locator
    }

    async fn publish(
        &self,
        query: &FileQuery,
        hooks: &PublishHooks,
    ) -> Result<PublishReport, PublishError> {
        info!(
            jurisdiction = %query.jurisdiction,
            date_filter = query.date_filter.as_deref().unwrap_or("*"),
            raw = query.raw,
            "[PUBLISH] Starting publish run"
        );

        let session = self.host.login(&self.credentials).await.map_err(|e| {
            error!(error = %e, username = %self.credentials.username, "[PUBLISH][ERROR] Login failed");
            e
        })?;

        let repo_name = self.repository_name(&query.jurisdiction);
        let repo = session
            .repository(&self.settings.organization, &repo_name)
            .await
            .map_err(|e| {
                error!(error = %e, repository = %repo_name, "[PUBLISH][ERROR] Could not resolve repository");
                e
            })?;

        let filenames: Vec<PathBuf> = self.get_filenames(query);
        info!(
            repository = %repo.name(),
            count = filenames.len(),
            "[PUBLISH] Publishing result files"
        );

        let mut files = Vec::with_capacity(filenames.len());
        for filename in &filenames {
            let published = self
                .publish_file(repo.as_ref(), filename, &self.settings.publish_branch, hooks)
                .await
                .map_err(|e| {
                    error!(error = %e, file = %filename.display(), "[PUBLISH][ERROR] Publishing file failed");
                    e
                })?;
            files.push(published);
        }

        let merge = repo
            .merge(&self.settings.public_branch, &self.settings.publish_branch)
            .await
            .map_err(|e| {
                error!(
                    error = %e,
                    base = %self.settings.public_branch,
                    head = %self.settings.publish_branch,
                    "[PUBLISH][ERROR] Merge into public branch failed"
                );
                e
            })?;
        info!(
            repository = %repo.name(),
            files = files.len(),
            merge = ?merge,
            "[PUBLISH] Publish run complete"
        );

        Ok(PublishReport {
            repository: repo.name(),
            files,
            merge,
        })
    }
}

/// `raw/<basename>` if the extension-stripped name ends with the raw marker,
/// `clean/<basename>` otherwise. Always uses `/`.
pub fn remote_path(filename: &Path) -> String {
    let basename = filename
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let is_raw = filename
        .file_stem()
        .map(|stem| stem.to_string_lossy().ends_with(RAW_MARKER))
        .unwrap_or(false);

    let prefix = if is_raw { RAW_PREFIX } else { CLEAN_PREFIX };
    format!("{prefix}/{basename}")
}

/// Sha of the first entry whose path equals `path`.
pub fn find_sha<'a>(entries: &'a [TreeEntry], path: &str) -> Option<&'a str> {
    entries
        .iter()
        .find(|entry| entry.path == path)
        .map(|entry| entry.sha.as_str())
}
