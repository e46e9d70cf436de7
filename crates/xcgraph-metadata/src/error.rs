//! Provider error taxonomy

use std::path::PathBuf;

use thiserror::Error;
use xcgraph_core::SdkError;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("couldn't find framework at {}", .0.display())]
    FrameworkNotFound(PathBuf),

    #[error("couldn't find library at {}", .0.display())]
    LibraryNotFound(PathBuf),

    #[error("couldn't find xcframework at {}", .0.display())]
    XCFrameworkNotFound(PathBuf),

    #[error("couldn't read binary metadata from {}", .0.display())]
    MetadataNotFound(PathBuf),

    #[error("couldn't find Info.plist at {}", .0.display())]
    InfoPlistNotFound(PathBuf),

    #[error("invalid Info.plist at {}: {reason}", .path.display())]
    InvalidInfoPlist { path: PathBuf, reason: String },

    #[error(transparent)]
    Sdk(#[from] SdkError),

    #[error("metadata task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl MetadataError {
    /// The artifact path the error refers to, when there is one.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            MetadataError::FrameworkNotFound(path)
            | MetadataError::LibraryNotFound(path)
            | MetadataError::XCFrameworkNotFound(path)
            | MetadataError::MetadataNotFound(path)
            | MetadataError::InfoPlistNotFound(path)
            | MetadataError::InvalidInfoPlist { path, .. } => Some(path),
            MetadataError::Sdk(_) | MetadataError::Task(_) => None,
        }
    }
}
