use super::{KvError, Result};
use crate::storage::{Snapshot, Transaction};
use std::fmt;

pub type Key = Vec<u8>;
pub type Value = Vec<u8>;

/// Version a snapshot is taken at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Version {
    /// Everything committed so far.
    #[default]
    Latest,
    /// An explicit point in the store's version history.
    At(u64),
}

impl Version {
    /// Resolve against the store's current version.
    pub fn resolve(self, current: u64) -> u64 {
        match self {
            Version::Latest => current,
            Version::At(version) => version,
        }
    }
}

impl From<u64> for Version {
    fn from(version: u64) -> Self {
        Version::At(version)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Latest => write!(f, "latest"),
            Version::At(version) => write!(f, "v{}", version),
        }
    }
}

/// A backend object handed in by the caller.
///
/// Operations that need a particular kind ask for it through
/// [`Handle::as_snapshot`] or [`Handle::into_transaction`] and fail with
/// [`KvError::BackendType`] when the caller passed the other one.
pub enum Handle<'a> {
    Snapshot(&'a dyn Snapshot),
    Transaction(&'a mut dyn Transaction),
}

impl<'a> Handle<'a> {
    pub fn kind(&self) -> &'static str {
        match self {
            Handle::Snapshot(_) => "snapshot",
            Handle::Transaction(_) => "transaction",
        }
    }

    pub fn as_snapshot(&self) -> Result<&'a dyn Snapshot> {
        match self {
            Handle::Snapshot(snapshot) => Ok(*snapshot),
            other => Err(KvError::BackendType {
                expected: "snapshot",
                found: other.kind(),
            }),
        }
    }

    pub fn into_transaction(self) -> Result<&'a mut dyn Transaction> {
        match self {
            Handle::Transaction(txn) => Ok(txn),
            other => Err(KvError::BackendType {
                expected: "transaction",
                found: other.kind(),
            }),
        }
    }
}

impl fmt::Debug for Handle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handle::Snapshot(snapshot) => write!(f, "Handle::Snapshot(v{})", snapshot.version()),
            Handle::Transaction(txn) => {
                write!(f, "Handle::Transaction(start=v{})", txn.start_version())
            }
        }
    }
}

/// Where a read takes its snapshot from.
#[derive(Debug, Default)]
pub enum ReadView<'a> {
    #[default]
    Latest,
    Version(u64),
    Handle(Handle<'a>),
}

impl<'a> ReadView<'a> {
    pub fn snapshot(snapshot: &'a dyn Snapshot) -> Self {
        ReadView::Handle(Handle::Snapshot(snapshot))
    }
}

impl From<Version> for ReadView<'_> {
    fn from(version: Version) -> Self {
        match version {
            Version::Latest => ReadView::Latest,
            Version::At(version) => ReadView::Version(version),
        }
    }
}

impl<'a> From<Handle<'a>> for ReadView<'a> {
    fn from(handle: Handle<'a>) -> Self {
        ReadView::Handle(handle)
    }
}
