//! Provider traits and the metadata they return

pub mod framework;
pub mod library;
pub mod xcframework;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use xcgraph_core::{
    BinaryArchitecture, BinaryLinking, Node, SystemFrameworkMetadataProvider, XCFrameworkInfoPlist,
};

use crate::error::MetadataError;

// ── Metadata ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkMetadata {
    pub path: PathBuf,
    pub binary_path: PathBuf,
    pub dsym_path: Option<PathBuf>,
    pub bcsymbolmap_paths: Vec<PathBuf>,
    pub linking: BinaryLinking,
    pub architectures: Vec<BinaryArchitecture>,
    pub is_carthage: bool,
}

impl From<FrameworkMetadata> for Node {
    fn from(metadata: FrameworkMetadata) -> Self {
        Node::Framework {
            path: metadata.path,
            binary_path: metadata.binary_path,
            dsym_path: metadata.dsym_path,
            bcsymbolmap_paths: metadata.bcsymbolmap_paths,
            linking: metadata.linking,
            architectures: metadata.architectures,
            is_carthage: metadata.is_carthage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryMetadata {
    pub path: PathBuf,
    pub public_headers: PathBuf,
    pub swift_module_map: Option<PathBuf>,
    pub architectures: Vec<BinaryArchitecture>,
    pub linking: BinaryLinking,
}

impl From<LibraryMetadata> for Node {
    fn from(metadata: LibraryMetadata) -> Self {
        Node::Library {
            path: metadata.path,
            public_headers: metadata.public_headers,
            linking: metadata.linking,
            architectures: metadata.architectures,
            swift_module_map: metadata.swift_module_map,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XCFrameworkMetadata {
    pub path: PathBuf,
    pub info_plist: XCFrameworkInfoPlist,
    pub primary_binary_path: PathBuf,
    pub linking: BinaryLinking,
}

impl From<XCFrameworkMetadata> for Node {
    fn from(metadata: XCFrameworkMetadata) -> Self {
        Node::XCFramework {
            path: metadata.path,
            info_plist: metadata.info_plist,
            primary_binary_path: metadata.primary_binary_path,
            linking: metadata.linking,
        }
    }
}

// ── Providers ───────────────────────────────────────────────

/// Resolves `.framework` bundles.
#[async_trait]
pub trait FrameworkMetadataProviding: Send + Sync {
    async fn load_metadata(&self, path: &Path) -> Result<FrameworkMetadata, MetadataError>;
}

/// Resolves static or dynamic libraries with their headers.
#[async_trait]
pub trait LibraryMetadataProviding: Send + Sync {
    async fn load_metadata(
        &self,
        path: &Path,
        public_headers: &Path,
        swift_module_map: Option<&Path>,
    ) -> Result<LibraryMetadata, MetadataError>;
}

/// Resolves `.xcframework` bundles.
#[async_trait]
pub trait XCFrameworkMetadataProviding: Send + Sync {
    async fn load_metadata(&self, path: &Path) -> Result<XCFrameworkMetadata, MetadataError>;
}

/// The set of providers a load runs with.
#[derive(Clone)]
pub struct MetadataProviders {
    pub framework: Arc<dyn FrameworkMetadataProviding>,
    pub library: Arc<dyn LibraryMetadataProviding>,
    pub xcframework: Arc<dyn XCFrameworkMetadataProviding>,
    pub system: SystemFrameworkMetadataProvider,
}

impl MetadataProviders {
    pub fn new(
        framework: Arc<dyn FrameworkMetadataProviding>,
        library: Arc<dyn LibraryMetadataProviding>,
        xcframework: Arc<dyn XCFrameworkMetadataProviding>,
    ) -> Self {
        MetadataProviders {
            framework,
            library,
            xcframework,
            system: SystemFrameworkMetadataProvider::new(),
        }
    }

    /// Providers reading artifacts from disk.
    pub fn filesystem() -> Self {
        Self::new(
            Arc::new(framework::FrameworkMetadataProvider::new()),
            Arc::new(library::LibraryMetadataProvider::new()),
            Arc::new(xcframework::XCFrameworkMetadataProvider::new()),
        )
    }
}

impl Default for MetadataProviders {
    fn default() -> Self {
        Self::filesystem()
    }
}

impl std::fmt::Debug for MetadataProviders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataProviders").finish_non_exhaustive()
    }
}
