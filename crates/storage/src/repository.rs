use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by remote file stores.
///
/// `NotFound` is the only expected, non-transient failure: it means the
/// file does not exist yet.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("remote returned status {0}")]
    HttpStatus(u16),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound)
    }
}

/// Opaque revision marker of a remote file. Required to update it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FileSha(String);

impl FileSha {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for FileSha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileSha({})", self.0)
    }
}

/// A fetched remote file: decoded text plus its revision marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    pub content: String,
    pub sha: FileSha,
}

/// How a write landed on the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Updated,
}

/// Contract for a remote, version-controlled file store.
#[async_trait]
pub trait RemoteFileStore: Send + Sync {
    /// Fetch a file and its revision marker.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the file does not exist, or other
    /// storage errors for transport and authorization failures.
    async fn get_file(&self, path: &str) -> Result<RemoteFile, StorageError>;

    /// Create a new file.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the file already exists.
    async fn create_file(&self, path: &str, content: &str, message: &str)
    -> Result<(), StorageError>;

    /// Replace an existing file at revision `sha`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if `sha` is stale.
    async fn update_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
        sha: &FileSha,
    ) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY STORE ───────────────────────────────────────────────────────────
//

/// Which store operation an injected failure applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOp {
    Get,
    Create,
    Update,
}

#[derive(Debug, Clone)]
struct StoredFile {
    content: String,
    revision: u64,
}

#[derive(Default)]
struct MemoryState {
    files: HashMap<String, StoredFile>,
    failures: VecDeque<(FileOp, StorageError)>,
    calls: Vec<(FileOp, String)>,
    commits: Vec<String>,
    revision: u64,
}

/// In-memory remote store for testing and offline prototyping.
///
/// Revisions are monotonically increasing counters rendered as shas.
#[derive(Clone, Default)]
pub struct InMemoryFileStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryFileStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file without recording a call.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the state lock is poisoned.
    pub fn insert(&self, path: &str, content: &str) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.revision += 1;
        let revision = guard.revision;
        guard.files.insert(
            path.to_owned(),
            StoredFile {
                content: content.to_owned(),
                revision,
            },
        );
        Ok(())
    }

    /// Make the next matching operation fail with `err`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the state lock is poisoned.
    pub fn fail_next(&self, op: FileOp, err: StorageError) -> Result<(), StorageError> {
        self.lock()?.failures.push_back((op, err));
        Ok(())
    }

    /// Current content of a file, if present.
    #[must_use]
    pub fn content(&self, path: &str) -> Option<String> {
        self.lock()
            .ok()
            .and_then(|g| g.files.get(path).map(|f| f.content.clone()))
    }

    /// Operations seen so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<(FileOp, String)> {
        self.lock().map(|g| g.calls.clone()).unwrap_or_default()
    }

    /// Commit messages of successful writes, in order.
    #[must_use]
    pub fn commit_messages(&self) -> Vec<String> {
        self.lock().map(|g| g.commits.clone()).unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

impl MemoryState {
    fn record(&mut self, op: FileOp, path: &str) -> Result<(), StorageError> {
        self.calls.push((op, path.to_owned()));
        if let Some(pos) = self.failures.iter().position(|(o, _)| *o == op) {
            if let Some((_, err)) = self.failures.remove(pos) {
                return Err(err);
            }
        }
        Ok(())
    }

    fn write(&mut self, path: &str, content: &str, message: &str) {
        self.revision += 1;
        let revision = self.revision;
        self.files.insert(
            path.to_owned(),
            StoredFile {
                content: content.to_owned(),
                revision,
            },
        );
        self.commits.push(message.to_owned());
    }
}

fn sha_for(revision: u64) -> FileSha {
    FileSha::new(format!("{revision:040x}"))
}

#[async_trait]
impl RemoteFileStore for InMemoryFileStore {
    async fn get_file(&self, path: &str) -> Result<RemoteFile, StorageError> {
        let mut guard = self.lock()?;
        guard.record(FileOp::Get, path)?;
        let file = guard.files.get(path).ok_or(StorageError::NotFound)?;
        Ok(RemoteFile {
            path: path.to_owned(),
            content: file.content.clone(),
            sha: sha_for(file.revision),
        })
    }

    async fn create_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
    ) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.record(FileOp::Create, path)?;
        if guard.files.contains_key(path) {
            return Err(StorageError::Conflict);
        }
        guard.write(path, content, message);
        Ok(())
    }

    async fn update_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
        sha: &FileSha,
    ) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.record(FileOp::Update, path)?;
        let current = guard.files.get(path).ok_or(StorageError::NotFound)?;
        if sha_for(current.revision) != *sha {
            return Err(StorageError::Conflict);
        }
        guard.write(path, content, message);
        Ok(())
    }
}

/// Handle on the remote store behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub files: Arc<dyn RemoteFileStore>,
}

impl Storage {
    #[must_use]
    pub fn new(files: Arc<dyn RemoteFileStore>) -> Self {
        Self { files }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_update_with_current_sha() {
        let store = InMemoryFileStore::new();
        store.create_file("a.csv", "x", "first").await.unwrap();

        let fetched = store.get_file("a.csv").await.unwrap();
        assert_eq!(fetched.content, "x");

        store
            .update_file("a.csv", "y", "second", &fetched.sha)
            .await
            .unwrap();
        assert_eq!(store.content("a.csv").as_deref(), Some("y"));
        assert_eq!(store.commit_messages(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn stale_sha_and_double_create_conflict() {
        let store = InMemoryFileStore::new();
        store.create_file("a.csv", "x", "m").await.unwrap();
        let stale = store.get_file("a.csv").await.unwrap().sha;
        store.update_file("a.csv", "y", "m", &stale).await.unwrap();

        let err = store.update_file("a.csv", "z", "m", &stale).await.unwrap_err();
        assert_eq!(err, StorageError::Conflict);
        let err = store.create_file("a.csv", "z", "m").await.unwrap_err();
        assert_eq!(err, StorageError::Conflict);
    }

    #[tokio::test]
    async fn injected_failure_fires_once() {
        let store = InMemoryFileStore::new();
        store.insert("a.csv", "x").unwrap();
        store
            .fail_next(FileOp::Get, StorageError::Connection("reset".into()))
            .unwrap();

        assert!(matches!(
            store.get_file("a.csv").await,
            Err(StorageError::Connection(_))
        ));
        assert!(store.get_file("a.csv").await.is_ok());
        assert_eq!(store.calls().len(), 2);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let store = InMemoryFileStore::new();
        let err = store.get_file("nope.csv").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
