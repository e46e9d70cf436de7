//! Filesystem library provider

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{LibraryMetadata, LibraryMetadataProviding};
use crate::binary;
use crate::error::MetadataError;

#[derive(Debug, Clone, Copy, Default)]
pub struct LibraryMetadataProvider;

impl LibraryMetadataProvider {
    pub fn new() -> Self {
        LibraryMetadataProvider
    }
}

#[async_trait]
impl LibraryMetadataProviding for LibraryMetadataProvider {
    async fn load_metadata(
        &self,
        path: &Path,
        public_headers: &Path,
        swift_module_map: Option<&Path>,
    ) -> Result<LibraryMetadata, MetadataError> {
        let path = path.to_path_buf();
        let public_headers = public_headers.to_path_buf();
        let swift_module_map = swift_module_map.map(Path::to_path_buf);
        tokio::task::spawn_blocking(move || load(path, public_headers, swift_module_map)).await?
    }
}

fn load(
    path: PathBuf,
    public_headers: PathBuf,
    swift_module_map: Option<PathBuf>,
) -> Result<LibraryMetadata, MetadataError> {
    if !path.is_file() {
        return Err(MetadataError::LibraryNotFound(path));
    }
    let binary = binary::read(&path)?;
    Ok(LibraryMetadata {
        path,
        public_headers,
        swift_module_map,
        architectures: binary.architectures,
        linking: binary.linking,
    })
}
