//! Error types for the projection layer.

use thiserror::Error;

use objfs_graph::GraphError;

use crate::handle::Handle;

/// Errors returned to the protocol dispatcher.
///
/// Each variant corresponds to one protocol-level filesystem error code.
/// Failures are detected at the point of violation and returned directly;
/// the projection layer never retries.
#[derive(Debug, Error)]
pub enum FsError {
    /// The handle is no longer present in the handle table.
    #[error("stale handle: {0}")]
    StaleHandle(Handle),

    /// The name is absent from the container.
    #[error("no such entry: '{0}'")]
    NoSuchEntry(String),

    /// Removal of a non-empty directory was refused.
    #[error("directory '{0}' is not empty")]
    NotEmpty(String),

    /// The target value's type rejected the attempted reconstruction or
    /// removal.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// A directory operation was applied to a file.
    #[error("handle {0} is not a directory")]
    NotADirectory(Handle),

    /// A file operation was applied to a directory.
    #[error("handle {0} is not a file")]
    NotAFile(Handle),
}

impl From<GraphError> for FsError {
    fn from(err: GraphError) -> Self {
        FsError::AccessDenied(err.to_string())
    }
}
