use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KvError {
    #[error("Key not found")]
    NotFound,

    #[error("Invalid backend handle: expected {expected}, got {found}")]
    BackendType {
        expected: &'static str,
        found: &'static str,
    },

    #[error(
        "Write conflict on key {key:?}: committed at version {conflict_version}, transaction started at {start_version}"
    )]
    WriteConflict {
        key: Vec<u8>,
        start_version: u64,
        conflict_version: u64,
    },

    #[error("Transient backend error: {0}")]
    Transient(String),

    #[error("Store is closed")]
    StoreClosed,

    #[error("Unsupported backend: {0}")]
    UnsupportedBackend(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl KvError {
    /// Conflicts and transient failures may succeed on a fresh transaction.
    pub fn is_retryable(&self) -> bool {
        matches!(self, KvError::WriteConflict { .. } | KvError::Transient(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, KvError::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, KvError>;

impl From<serde_json::Error> for KvError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}
