//! Metadata providers for precompiled artifacts
//!
//! Each provider takes the path of a framework, library or xcframework and
//! returns what the graph needs to know about its binary: architectures,
//! linking, and companion debug files. The filesystem implementations read
//! Mach-O headers with `object` and xcframework manifests with `plist`.

pub mod binary;
pub mod cache;
pub mod error;
pub mod providers;

#[cfg(test)]
pub mod tests;

pub use cache::{CacheStats, MetadataCache};
pub use error::MetadataError;
pub use providers::{
    FrameworkMetadata, FrameworkMetadataProviding, LibraryMetadata, LibraryMetadataProviding, MetadataProviders,
    XCFrameworkMetadata, XCFrameworkMetadataProviding,
};
pub use providers::framework::FrameworkMetadataProvider;
pub use providers::library::LibraryMetadataProvider;
pub use providers::xcframework::XCFrameworkMetadataProvider;
pub use xcgraph_core::sdk::{SdkError, SystemFrameworkMetadata, SystemFrameworkMetadataProvider};
