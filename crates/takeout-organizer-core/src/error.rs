use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Errors that stop a run before any file is touched.
///
/// Per-file problems (bad sidecars, failed transfers) never show up here;
/// they are folded into [`crate::ProcessResult`] instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("source is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),

    #[error("cannot read source directory {}: {source}", .path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot prepare destination {}: {source}", .path.display())]
    Destination {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to start worker pool: {0}")]
    WorkerPool(String),
}
