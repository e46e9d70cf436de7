//! Filesystem `.xcframework` provider

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use xcgraph_core::{BinaryArchitecture, XCFrameworkInfoPlist, XCFrameworkLibrary};

use super::{XCFrameworkMetadata, XCFrameworkMetadataProviding};
use crate::binary;
use crate::error::MetadataError;

#[derive(Debug, Clone, Copy, Default)]
pub struct XCFrameworkMetadataProvider;

impl XCFrameworkMetadataProvider {
    pub fn new() -> Self {
        XCFrameworkMetadataProvider
    }
}

#[async_trait]
impl XCFrameworkMetadataProviding for XCFrameworkMetadataProvider {
    async fn load_metadata(&self, path: &Path) -> Result<XCFrameworkMetadata, MetadataError> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || load(path)).await?
    }
}

fn load(path: PathBuf) -> Result<XCFrameworkMetadata, MetadataError> {
    if !path.is_dir() {
        return Err(MetadataError::XCFrameworkNotFound(path));
    }

    let info_plist = info_plist(&path)?;
    let primary = primary_library(&info_plist).ok_or_else(|| MetadataError::InvalidInfoPlist {
        path: path.join("Info.plist"),
        reason: "AvailableLibraries is empty".to_string(),
    })?;
    let primary_binary_path = primary.binary_path(&path);
    let binary = binary::read(&primary_binary_path)?;

    debug!(
        xcframework = %path.display(),
        library = %primary.identifier,
        linking = ?binary.linking,
        "xcframework metadata"
    );

    Ok(XCFrameworkMetadata {
        path,
        info_plist,
        primary_binary_path,
        linking: binary.linking,
    })
}

pub fn info_plist(xcframework: &Path) -> Result<XCFrameworkInfoPlist, MetadataError> {
    let path = xcframework.join("Info.plist");
    if !path.is_file() {
        return Err(MetadataError::InfoPlistNotFound(path));
    }
    plist::from_file(&path).map_err(|err| MetadataError::InvalidInfoPlist {
        reason: err.to_string(),
        path,
    })
}

/// The slice linked by default: the first one carrying `arm64`, else the first.
pub fn primary_library(info_plist: &XCFrameworkInfoPlist) -> Option<&XCFrameworkLibrary> {
    info_plist
        .libraries
        .iter()
        .find(|library| library.architectures.contains(&BinaryArchitecture::Arm64))
        .or_else(|| info_plist.libraries.first())
}
