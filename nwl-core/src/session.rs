//! Load/edit/save sessions over a remote store.
//!
//! A [`Session`] owns at most one open document. Saves and deletes present
//! the token the document was loaded with; if the remote changed meanwhile
//! they fail with a conflict and the caller has to reload.

use thiserror::Error;

use crate::codec::{self, CodecError};
use crate::merge::ReorderReport;
use crate::models::LevelDocument;
use crate::repository::{LevelRepository, RepositoryError};
use crate::store::{RemoteBlobHandle, RemoteStore, StoreError};

/// Lifecycle of the open document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No document loaded.
    Empty,
    /// Document matches the remote version it was loaded from.
    Loaded,
    /// Document has local edits not yet saved.
    Dirty,
    /// A save is in flight.
    Saving,
    /// The last save found the remote changed; reload to continue.
    Conflict,
}

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("No document is loaded")]
    NoDocument,
}

impl SessionError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, SessionError::Store(e) if e.is_conflict())
    }
}

/// Edit session over one remote document at a time.
pub struct Session<S> {
    store: S,
    open: Option<LevelRepository>,
    state: SessionState,
}

impl<S: RemoteStore> Session<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            open: None,
            state: SessionState::Empty,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The open document, if any.
    pub fn repository(&self) -> Option<&LevelRepository> {
        self.open.as_ref()
    }

    fn require_open(&self) -> Result<&LevelRepository, SessionError> {
        self.open.as_ref().ok_or(SessionError::NoDocument)
    }

    /// Lists blob names in `directory`.
    pub async fn list(&self, directory: &str) -> Result<Vec<String>, SessionError> {
        Ok(self.store.list(directory).await?)
    }

    /// Loads the document at `path`, replacing any open one.
    ///
    /// On failure the previously open document stays open.
    pub async fn load(&mut self, path: &str) -> Result<&LevelRepository, SessionError> {
        let blob = self.store.get(path).await?;
        let document = codec::decode(&blob.content)?;
        tracing::debug!(path, token = %blob.token, records = document.records.len(), "loaded level");

        self.state = SessionState::Loaded;
        let handle = RemoteBlobHandle::new(path, blob.token);
        Ok(&*self.open.insert(LevelRepository::new(document, handle)))
    }

    /// Mutable access to the open document. Marks the session dirty.
    ///
    /// Prefer [`Session::edit`], which only marks it dirty when the edit
    /// succeeds.
    pub fn repository_mut(&mut self) -> Result<&mut LevelRepository, SessionError> {
        let repository = self.open.as_mut().ok_or(SessionError::NoDocument)?;
        if self.state != SessionState::Conflict {
            self.state = SessionState::Dirty;
        }
        Ok(repository)
    }

    /// Applies an edit to the open document.
    ///
    /// The session only becomes dirty when the edit succeeds.
    pub fn edit<T, F>(&mut self, f: F) -> Result<T, SessionError>
    where
        F: FnOnce(&mut LevelRepository) -> Result<T, RepositoryError>,
    {
        let repository = self.open.as_mut().ok_or(SessionError::NoDocument)?;
        let value = f(repository)?;
        if self.state != SessionState::Conflict {
            self.state = SessionState::Dirty;
        }
        Ok(value)
    }

    /// Reorders the open document's records by `order`.
    pub fn reorder(&mut self, order: &[String]) -> Result<ReorderReport, SessionError> {
        self.edit(|repository| Ok(repository.reorder(order)))
    }

    /// Fetches an order list blob.
    pub async fn load_order_list(&self, path: &str) -> Result<Vec<String>, SessionError> {
        let blob = self.store.get(path).await?;
        Ok(codec::decode_order_list(&blob.content)?)
    }

    /// Fetches the order list at `order_path` and reorders the open document
    /// by it.
    pub async fn reorder_from(&mut self, order_path: &str) -> Result<ReorderReport, SessionError> {
        self.require_open()?;
        let order = self.load_order_list(order_path).await?;
        self.reorder(&order)
    }

    /// Canonical bytes of the open document.
    pub fn encoded(&self) -> Result<Vec<u8>, SessionError> {
        Ok(codec::encode(self.require_open()?.document())?)
    }

    /// Writes the open document back, guarded by the token it was loaded
    /// with. Returns the new token.
    pub async fn save(&mut self, message: &str) -> Result<String, SessionError> {
        let repository = self.require_open()?;
        let bytes = codec::encode(repository.document())?;
        let path = repository.handle().path().to_string();
        let token = repository.handle().token().to_string();

        let previous = self.state;
        self.state = SessionState::Saving;

        match self.store.put(&path, &bytes, Some(&token), message).await {
            Ok(new_token) => {
                if let Some(repository) = self.open.as_mut() {
                    repository.set_token(new_token.clone());
                }
                self.state = SessionState::Loaded;
                tracing::info!(path = %path, token = %new_token, "saved level");
                Ok(new_token)
            }
            Err(e) if e.is_conflict() => {
                self.state = SessionState::Conflict;
                tracing::warn!(path = %path, "save rejected: remote changed since load");
                Err(e.into())
            }
            Err(e) => {
                self.state = previous;
                Err(e.into())
            }
        }
    }

    /// Deletes the open document's blob and closes it.
    ///
    /// Returns the handle of the deleted blob.
    pub async fn delete(&mut self, message: &str) -> Result<RemoteBlobHandle, SessionError> {
        let handle = self.require_open()?.handle().clone();
        self.store
            .delete(handle.path(), handle.token(), message)
            .await?;

        self.open = None;
        self.state = SessionState::Empty;
        Ok(handle)
    }

    /// Creates a new blob at `path`. Fails if the path is already taken.
    ///
    /// The open document, if any, is not affected.
    pub async fn create_new(
        &self,
        path: &str,
        document: &LevelDocument,
        message: &str,
    ) -> Result<RemoteBlobHandle, SessionError> {
        let bytes = codec::encode(document)?;
        let token = self.store.put(path, &bytes, None, message).await?;
        tracing::info!(path, token = %token, "created level");
        Ok(RemoteBlobHandle::new(path, token))
    }
}
