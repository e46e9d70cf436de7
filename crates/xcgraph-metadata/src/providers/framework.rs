//! Filesystem `.framework` provider

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::{FrameworkMetadata, FrameworkMetadataProviding};
use crate::binary;
use crate::error::MetadataError;

#[derive(Debug, Clone, Copy, Default)]
pub struct FrameworkMetadataProvider;

impl FrameworkMetadataProvider {
    pub fn new() -> Self {
        FrameworkMetadataProvider
    }
}

#[async_trait]
impl FrameworkMetadataProviding for FrameworkMetadataProvider {
    async fn load_metadata(&self, path: &Path) -> Result<FrameworkMetadata, MetadataError> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || load(path)).await?
    }
}

fn load(path: PathBuf) -> Result<FrameworkMetadata, MetadataError> {
    if !path.is_dir() {
        return Err(MetadataError::FrameworkNotFound(path));
    }

    let binary_path = binary_path(&path);
    let binary = binary::read(&binary_path)?;
    let dsym_path = dsym_path(&path);
    let bcsymbolmap_paths = bcsymbolmap_paths(&path, &binary.uuids);
    let is_carthage = path.to_string_lossy().contains("Carthage/Build");

    debug!(
        framework = %path.display(),
        linking = ?binary.linking,
        architectures = binary.architectures.len(),
        "framework metadata"
    );

    Ok(FrameworkMetadata {
        path,
        binary_path,
        dsym_path,
        bcsymbolmap_paths,
        linking: binary.linking,
        architectures: binary.architectures,
        is_carthage,
    })
}

/// `Foo.framework/Foo`
pub fn binary_path(framework: &Path) -> PathBuf {
    match framework.file_stem() {
        Some(stem) => framework.join(stem),
        None => framework.to_path_buf(),
    }
}

/// Sibling `Foo.framework.dSYM`, if present.
fn dsym_path(framework: &Path) -> Option<PathBuf> {
    let name = framework.file_name()?.to_string_lossy();
    let dsym = framework.with_file_name(format!("{}.dSYM", name));
    dsym.exists().then_some(dsym)
}

fn bcsymbolmap_paths(framework: &Path, uuids: &[[u8; 16]]) -> Vec<PathBuf> {
    let Some(parent) = framework.parent() else {
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = uuids
        .iter()
        .map(|uuid| parent.join(format!("{}.bcsymbolmap", binary::format_uuid(uuid))))
        .filter(|path| path.exists())
        .collect();
    paths.sort();
    paths.dedup();
    paths
}
