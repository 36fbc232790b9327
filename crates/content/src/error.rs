use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    /// Content root does not exist or is not a directory.
    #[error("content directory not found: {}", .0.display())]
    RootMissing(PathBuf),

    /// Directory traversal failed.
    #[error("cannot walk {}: {source}", .root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// The content selector could not be compiled.
    #[error("invalid content selector: {0}")]
    Selector(String),

    /// A document could not be read or parsed. Aborts the whole load.
    #[error("cannot parse {path}: {reason}")]
    Parse { path: String, reason: String },
}
