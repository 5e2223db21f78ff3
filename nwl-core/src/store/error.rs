use thiserror::Error;

/// Errors returned by [`RemoteStore`](super::RemoteStore) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network failure or an unexpected response from the remote.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Not found: {path}")]
    NotFound { path: String },

    #[error("Already exists: {path}")]
    AlreadyExists { path: String },

    /// The blob changed since `expected` was read. `actual` is filled in when
    /// the backend reports the current token.
    #[error("Conflict on {path}: remote content changed since token {expected}")]
    Conflict {
        path: String,
        expected: String,
        actual: Option<String>,
    },

    /// A write was attempted without credentials.
    #[error("Authentication required to {operation} {path}; configure a token")]
    AuthRequired {
        operation: &'static str,
        path: String,
    },
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}
