//! Link/embed-facing projection of graph nodes

use std::path::PathBuf;

use serde::Serialize;

use crate::model::Target;
use crate::node::{BinaryArchitecture, BinaryLinking, Node, SdkSource, SdkStatus, XCFrameworkInfoPlist};

/// What a build step references for a dependency: a binary on disk, a
/// product built by another target, or a system SDK.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DependencyReference {
    #[serde(rename = "xcframework")]
    XCFramework {
        path: PathBuf,
        info_plist: XCFrameworkInfoPlist,
        primary_binary_path: PathBuf,
        binary_path: PathBuf,
    },
    Framework {
        path: PathBuf,
        binary_path: PathBuf,
        dsym_path: Option<PathBuf>,
        bcsymbolmap_paths: Vec<PathBuf>,
        linking: BinaryLinking,
        architectures: Vec<BinaryArchitecture>,
    },
    Library {
        path: PathBuf,
        linking: BinaryLinking,
        architectures: Vec<BinaryArchitecture>,
    },
    Sdk {
        path: PathBuf,
        status: SdkStatus,
        source: SdkSource,
    },
    Product {
        target: String,
        product_name: String,
    },
}

impl DependencyReference {
    pub fn product(target: &Target) -> Self {
        DependencyReference::Product {
            target: target.name.clone(),
            product_name: target.product_name_with_extension(),
        }
    }

    /// Reference for a non-target node. Targets need their declaration, see
    /// [`DependencyReference::product`]; package products have no reference.
    pub fn from_node(node: &Node) -> Option<Self> {
        match node {
            Node::XCFramework {
                path,
                info_plist,
                primary_binary_path,
                ..
            } => Some(DependencyReference::XCFramework {
                path: path.clone(),
                info_plist: info_plist.clone(),
                primary_binary_path: primary_binary_path.clone(),
                binary_path: primary_binary_path.clone(),
            }),
            Node::Framework {
                path,
                binary_path,
                dsym_path,
                bcsymbolmap_paths,
                linking,
                architectures,
                ..
            } => Some(DependencyReference::Framework {
                path: path.clone(),
                binary_path: binary_path.clone(),
                dsym_path: dsym_path.clone(),
                bcsymbolmap_paths: bcsymbolmap_paths.clone(),
                linking: *linking,
                architectures: architectures.clone(),
            }),
            Node::Library {
                path,
                linking,
                architectures,
                ..
            } => Some(DependencyReference::Library {
                path: path.clone(),
                linking: *linking,
                architectures: architectures.clone(),
            }),
            Node::Sdk {
                path,
                status,
                source,
                ..
            } => Some(DependencyReference::Sdk {
                path: path.clone(),
                status: *status,
                source: *source,
            }),
            Node::Target { .. } | Node::PackageProduct { .. } => None,
        }
    }
}
