//! In-process store with the same compare-and-swap rules as the remote one.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{Blob, RemoteStore, StoreError};

/// Token of a blob: hex SHA-256 of its bytes.
pub fn content_token(content: &[u8]) -> String {
    format!("{:x}", Sha256::digest(content))
}

/// Kind of change recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

/// One entry of the audit log kept by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub kind: ChangeKind,
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    blobs: BTreeMap<String, Vec<u8>>,
    log: Vec<ChangeRecord>,
}

/// Volatile store backed by a map.
///
/// Clones share the same contents, so two sessions can race on one blob.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle to the same contents that refuses writes, like a
    /// remote client without credentials.
    pub fn read_only(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            read_only: true,
        }
    }

    /// Stores a blob directly, bypassing token checks and the audit log.
    pub fn seed(&self, path: impl Into<String>, content: impl Into<Vec<u8>>) -> String {
        let content = content.into();
        let token = content_token(&content);
        if let Ok(mut state) = self.state.lock() {
            state.blobs.insert(path.into(), content);
        }
        token
    }

    /// Current bytes at `path`, if any.
    pub fn content(&self, path: &str) -> Option<Vec<u8>> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.blobs.get(path).cloned())
    }

    /// All changes made through the store interface, oldest first.
    pub fn changes(&self) -> Vec<ChangeRecord> {
        self.state
            .lock()
            .map(|state| state.log.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Transport("memory store lock poisoned".to_string()))
    }

    fn require_writable(&self, operation: &'static str, path: &str) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::AuthRequired {
                operation,
                path: path.to_string(),
            });
        }
        Ok(())
    }
}

impl RemoteStore for MemoryStore {
    async fn list(&self, directory: &str) -> Result<Vec<String>, StoreError> {
        let state = self.lock()?;
        let prefix = format!("{}/", directory.trim_matches('/'));

        Ok(state
            .blobs
            .keys()
            .filter_map(|path| path.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(String::from)
            .collect())
    }

    async fn get(&self, path: &str) -> Result<Blob, StoreError> {
        let state = self.lock()?;
        let content = state.blobs.get(path).cloned().ok_or(StoreError::NotFound {
            path: path.to_string(),
        })?;
        let token = content_token(&content);
        Ok(Blob { content, token })
    }

    async fn put(
        &self,
        path: &str,
        content: &[u8],
        expected_token: Option<&str>,
        message: &str,
    ) -> Result<String, StoreError> {
        self.require_writable("write", path)?;
        let mut state = self.lock()?;

        let current = state.blobs.get(path).map(|bytes| content_token(bytes));
        let kind = match (expected_token, current) {
            (None, None) => ChangeKind::Create,
            (None, Some(_)) => {
                return Err(StoreError::AlreadyExists {
                    path: path.to_string(),
                })
            }
            (Some(_), None) => {
                return Err(StoreError::NotFound {
                    path: path.to_string(),
                })
            }
            (Some(expected), Some(actual)) if expected != actual => {
                return Err(StoreError::Conflict {
                    path: path.to_string(),
                    expected: expected.to_string(),
                    actual: Some(actual),
                })
            }
            (Some(_), Some(_)) => ChangeKind::Update,
        };

        state.blobs.insert(path.to_string(), content.to_vec());
        state.log.push(ChangeRecord {
            kind,
            path: path.to_string(),
            message: message.to_string(),
        });
        Ok(content_token(content))
    }

    async fn delete(
        &self,
        path: &str,
        expected_token: &str,
        message: &str,
    ) -> Result<(), StoreError> {
        self.require_writable("delete", path)?;
        let mut state = self.lock()?;

        let actual = match state.blobs.get(path) {
            Some(bytes) => content_token(bytes),
            None => {
                return Err(StoreError::NotFound {
                    path: path.to_string(),
                })
            }
        };
        if actual != expected_token {
            return Err(StoreError::Conflict {
                path: path.to_string(),
                expected: expected_token.to_string(),
                actual: Some(actual),
            });
        }

        state.blobs.remove(path);
        state.log.push(ChangeRecord {
            kind: ChangeKind::Delete,
            path: path.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_token_is_stable() {
        assert_eq!(content_token(b"abc"), content_token(b"abc"));
        assert_ne!(content_token(b"abc"), content_token(b"abd"));
        assert_eq!(content_token(b"").len(), 64);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.get("data/x.json").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_create_then_update_with_token() {
        let store = MemoryStore::new();
        let t1 = store.put("data/x.json", b"one", None, "create").await.unwrap();
        let blob = store.get("data/x.json").await.unwrap();
        assert_eq!(blob.token, t1);
        assert_eq!(blob.content, b"one");

        let t2 = store
            .put("data/x.json", b"two", Some(&t1), "update")
            .await
            .unwrap();
        assert_ne!(t1, t2);
        assert_eq!(store.content("data/x.json").unwrap(), b"two");

        let kinds: Vec<ChangeKind> = store.changes().iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![ChangeKind::Create, ChangeKind::Update]);
    }

    #[tokio::test]
    async fn test_create_over_existing_fails() {
        let store = MemoryStore::new();
        store.seed("data/x.json", "one");
        let err = store.put("data/x.json", b"two", None, "create").await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
        assert_eq!(store.content("data/x.json").unwrap(), b"one");
    }

    #[tokio::test]
    async fn test_stale_token_conflicts() {
        let store = MemoryStore::new();
        let t1 = store.seed("data/x.json", "one");
        let t2 = store
            .put("data/x.json", b"two", Some(&t1), "first writer")
            .await
            .unwrap();

        let err = store
            .put("data/x.json", b"three", Some(&t1), "second writer")
            .await
            .unwrap_err();
        match err {
            StoreError::Conflict {
                expected, actual, ..
            } => {
                assert_eq!(expected, t1);
                assert_eq!(actual, Some(t2));
            }
            other => panic!("expected conflict, got {:?}", other),
        }
        assert_eq!(store.content("data/x.json").unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_delete_checks_token() {
        let store = MemoryStore::new();
        let token = store.seed("data/x.json", "one");

        let err = store.delete("data/x.json", "stale", "rm").await.unwrap_err();
        assert!(err.is_conflict());

        store.delete("data/x.json", &token, "rm").await.unwrap();
        let err = store.delete("data/x.json", &token, "rm").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_is_not_recursive() {
        let store = MemoryStore::new();
        store.seed("data/b.json", "1");
        store.seed("data/a.json", "1");
        store.seed("data/nested/c.json", "1");
        store.seed("other/d.json", "1");

        let names = store.list("data").await.unwrap();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }

    #[tokio::test]
    async fn test_read_only_refuses_writes() {
        let store = MemoryStore::new();
        let token = store.seed("data/x.json", "one");
        let reader = store.read_only();

        assert!(reader.get("data/x.json").await.is_ok());
        let err = reader.put("data/y.json", b"y", None, "create").await.unwrap_err();
        assert!(matches!(err, StoreError::AuthRequired { .. }));
        let err = reader.delete("data/x.json", &token, "rm").await.unwrap_err();
        assert!(matches!(err, StoreError::AuthRequired { .. }));
        assert!(store.changes().is_empty());
    }
}
