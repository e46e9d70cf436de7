//! Loading error taxonomy

use std::path::PathBuf;

use thiserror::Error;
use xcgraph_core::SdkError;
use xcgraph_metadata::MetadataError;

use crate::cycles::{format_cycle, CycleNode};

#[derive(Debug, Error)]
pub enum GraphLoadingError {
    #[error("couldn't find project at {}", .0.display())]
    MissingProject(PathBuf),

    #[error("couldn't find target '{name}' in project at {}", .path.display())]
    TargetNotFound { name: String, path: PathBuf },

    #[error("found circular dependency: {}", format_cycle(.0))]
    CircularDependency(Vec<CycleNode>),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Sdk(#[from] SdkError),
}
