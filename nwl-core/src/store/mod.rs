//! Remote blob store access.
//!
//! A store holds named blobs inside a directory-like namespace. Every blob
//! has a content token (a hash of its bytes); writes and deletes must present
//! the token they last saw and fail with [`StoreError::Conflict`] if the blob
//! changed in between.
//!
//! Two backends are provided:
//! - [`GitHubStore`]: the GitHub contents API over HTTPS
//! - [`MemoryStore`]: an in-process store with the same semantics

mod error;
mod github;
mod memory;

use std::future::Future;

pub use error::StoreError;
pub use github::{GitHubStore, RepoLocation, RepoUrlError, DEFAULT_API_BASE};
pub use memory::{content_token, ChangeKind, ChangeRecord, MemoryStore};

/// Bytes of a blob together with the token identifying that exact content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub content: Vec<u8>,
    pub token: String,
}

/// Where a loaded document lives and which content version was loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBlobHandle {
    path: String,
    token: String,
}

impl RemoteBlobHandle {
    pub fn new(path: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            token: token.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// File name part of the path.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub(crate) fn set_token(&mut self, token: String) {
        self.token = token;
    }
}

/// Joins a folder and a blob name into a store path.
pub fn join_path(folder: &str, name: &str) -> String {
    let folder = folder.trim_matches('/');
    let name = name.trim_start_matches('/');
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", folder, name)
    }
}

/// Capability interface of a content store with compare-and-swap writes.
///
/// No method retries; every failure is reported to the caller.
pub trait RemoteStore {
    /// Lists the blob names directly inside `directory`.
    fn list(&self, directory: &str) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;

    /// Reads a blob and its current token.
    fn get(&self, path: &str) -> impl Future<Output = Result<Blob, StoreError>> + Send;

    /// Writes a blob and returns its new token.
    ///
    /// With `expected_token` the write only succeeds if the blob still has
    /// that token. Without it the write only creates: an occupied path fails
    /// with [`StoreError::AlreadyExists`].
    fn put(
        &self,
        path: &str,
        content: &[u8],
        expected_token: Option<&str>,
        message: &str,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;

    /// Deletes a blob if it still has `expected_token`.
    fn delete(
        &self,
        path: &str,
        expected_token: &str,
        message: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
