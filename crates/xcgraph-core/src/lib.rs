//! xcgraph core: declaration model, dependency graph, and traversal queries

pub mod model;
pub mod node;
pub mod sdk;
pub mod graph;
pub mod reference;
pub mod traverser;


#[cfg(test)]
pub mod test_utils;

pub use model::{Package, Platform, Product, Project, Requirement, Target, TargetDependency, Workspace};
pub use node::{BinaryArchitecture, BinaryLinking, Node, SdkSource, SdkStatus, XCFrameworkInfoPlist, XCFrameworkLibrary};
pub use sdk::{SdkError, SystemFrameworkMetadata, SystemFrameworkMetadataProvider};
pub use graph::{DependencyEntry, Graph, GraphDocument};
pub use reference::DependencyReference;
pub use traverser::{GraphTarget, GraphTraverser};
