//! System SDK path resolution
//!
//! SDK dependencies never touch the filesystem: their location is derived
//! from the SDK name and the platform with fixed templates.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::model::Platform;
use crate::node::{Node, SdkSource, SdkStatus};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SdkError {
    #[error("the SDK type of '{0}' is not supported: only .framework, .tbd and .dylib are")]
    UnsupportedSdk(String),
}

/// Resolved location of a system SDK.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemFrameworkMetadata {
    pub name: String,
    pub path: PathBuf,
    pub status: SdkStatus,
    pub source: SdkSource,
}

impl From<SystemFrameworkMetadata> for Node {
    fn from(metadata: SystemFrameworkMetadata) -> Self {
        Node::Sdk {
            name: metadata.name,
            path: metadata.path,
            status: metadata.status,
            source: metadata.source,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemFrameworkMetadataProvider;

impl SystemFrameworkMetadataProvider {
    pub fn new() -> Self {
        SystemFrameworkMetadataProvider
    }

    pub fn load_metadata(
        &self,
        sdk_name: &str,
        status: SdkStatus,
        platform: Platform,
        source: SdkSource,
    ) -> Result<SystemFrameworkMetadata, SdkError> {
        let sdk = platform.sdk_directory_name();
        let root = format!("/Platforms/{sdk}.platform/Developer/SDKs/{sdk}.sdk");
        let extension = sdk_name.rsplit_once('.').map(|(_, ext)| ext);

        let path = match extension {
            Some("framework") => format!("{root}/System/Library/Frameworks/{sdk_name}"),
            Some("tbd") | Some("dylib") => format!("{root}/usr/lib/{sdk_name}"),
            _ => return Err(SdkError::UnsupportedSdk(sdk_name.to_string())),
        };

        Ok(SystemFrameworkMetadata {
            name: sdk_name.to_string(),
            path: PathBuf::from(path),
            status,
            source,
        })
    }

    /// The implicit test framework, which ships in the developer directory.
    pub fn load_xctest_metadata(&self, platform: Platform) -> SystemFrameworkMetadata {
        let sdk = platform.sdk_directory_name();
        SystemFrameworkMetadata {
            name: "XCTest.framework".to_string(),
            path: PathBuf::from(format!(
                "/Platforms/{sdk}.platform/Developer/Library/Frameworks/XCTest.framework"
            )),
            status: SdkStatus::Required,
            source: SdkSource::Developer,
        }
    }
}
