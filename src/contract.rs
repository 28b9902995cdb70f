#![allow(unused)]

//! # contract: interfaces between the publisher and the outside world
//!
//! This module defines the traits the publishing pipeline is written against:
//!
//! - [`RemoteHost`], [`RemoteSession`] and [`RemoteRepository`] describe the hosted
//!   version-control service that result files are pushed to. The concrete GitHub
//!   client lives in [`crate::github`].
//! - [`Publisher`] is the capability every publisher offers: find the files for a
//!   jurisdiction and push them somewhere.
//!
//! ## Mocking & Testing
//! - The remote traits are annotated for `mockall`, so tests can drive the publisher
//!   with deterministic `MockRemoteHost`/`MockRemoteSession`/`MockRemoteRepository`.
//!
//! ## Error handling
//! - Remote calls return [`RemoteError`]; the publisher propagates them untouched.

use async_trait::async_trait;
use mockall::automock;
use std::fmt;
use std::path::PathBuf;

use crate::error::{PublishError, RemoteError};
use crate::hooks::PublishHooks;
use crate::locate::{FileLocator, FileQuery};

/// Username and secret (password or token) for the remote host.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// One entry of a recursive tree listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    /// Content identifier of the entry on the listed branch.
    pub sha: String,
    /// `blob`, `tree` or `commit`, as reported by the host.
    pub kind: String,
}

/// Result of a create/update file call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub commit_sha: String,
    /// Sha of the file content after the commit.
    pub content_sha: Option<String>,
}

/// Result of merging one branch into another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    Merged { sha: String },
    /// The base already contained the head; nothing was merged.
    UpToDate,
}

/// Entry point to a hosted version-control service.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RemoteHost: Send + Sync {
    /// Authenticate and open a session for the duration of one publish run.
    async fn login(&self, credentials: &Credentials)
        -> Result<Box<dyn RemoteSession>, RemoteError>;
}

/// An authenticated session.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// Resolve `owner/name`. Fails with [`RemoteError::NotFound`] if it does not exist.
    async fn repository(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Box<dyn RemoteRepository>, RemoteError>;
}

/// A single remote repository.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RemoteRepository: Send + Sync {
    /// Full name (`owner/name`), used for logging and reports.
    fn name(&self) -> String;

    /// Recursive listing of every tracked path on `branch`.
    async fn tree(&self, branch: &str) -> Result<Vec<TreeEntry>, RemoteError>;

    async fn create_file(
        &self,
        path: &str,
        message: &str,
        content: &str,
        branch: &str,
    ) -> Result<CommitInfo, RemoteError>;

    /// Replace the file at `path`; `sha` must be the current content identifier.
    async fn update_file(
        &self,
        path: &str,
        message: &str,
        content: &str,
        sha: &str,
        branch: &str,
    ) -> Result<CommitInfo, RemoteError>;

    /// Merge `head` into `base`.
    async fn merge(&self, base: &str, head: &str) -> Result<MergeOutcome, RemoteError>;
}

/// Whether a file was newly created or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishAction {
    Created,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedFile {
    pub local_path: PathBuf,
    pub remote_path: String,
    pub action: PublishAction,
}

/// Summary of one publish run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub repository: String,
    pub files: Vec<PublishedFile>,
    pub merge: MergeOutcome,
}

/// Capability shared by every publisher: locate result files and push them.
///
/// Implementors must override [`Publisher::publish`]; the provided body only
/// reports [`PublishError::NotImplemented`].
#[async_trait]
pub trait Publisher: Send + Sync {
    fn locator(&self) -> &FileLocator;

    /// Local result files matching `query`.
    fn get_filenames(&self, query: &FileQuery) -> Vec<PathBuf> {
        self.locator().get_filenames(query)
    }

    async fn publish(
        &self,
        query: &FileQuery,
        hooks: &PublishHooks,
    ) -> Result<PublishReport, PublishError> {
        Err(PublishError::NotImplemented)
    }
}
