//! Graph builders for traverser tests

use std::path::{Path, PathBuf};

use crate::graph::Graph;
use crate::model::{Platform, Product, Project, Target, Workspace};
use crate::node::{BinaryArchitecture, BinaryLinking, Node, SdkSource, SdkStatus};
use crate::sdk::SystemFrameworkMetadataProvider;

/// Hand-assembled graph, bypassing the loader.
pub struct GraphBuilder {
    graph: Graph,
}

impl GraphBuilder {
    pub fn new() -> Self {
        GraphBuilder {
            graph: Graph::new("Test", "/", Workspace::new("/", "Test", Vec::new())),
        }
    }

    pub fn project(mut self, path: &str, targets: Vec<Target>) -> Self {
        let path = PathBuf::from(path);
        let project = Project::new(&path, "Project", targets.clone());
        self.graph.targets.insert(
            path.clone(),
            targets.into_iter().map(|t| (t.name.clone(), t)).collect(),
        );
        self.graph.workspace.projects.push(path.clone());
        self.graph.projects.insert(path, project);
        self
    }

    pub fn edge(mut self, from: Node, to: Node) -> Self {
        self.graph.dependencies.entry(from).or_default().insert(to);
        self
    }

    pub fn edges(self, from: Node, to: impl IntoIterator<Item = Node>) -> Self {
        to.into_iter().fold(self, |builder, to| builder.edge(from.clone(), to))
    }

    pub fn build(self) -> Graph {
        self.graph
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn ios(name: &str, product: Product) -> Target {
    Target::new(name, Platform::Ios, product)
}

pub fn target_node(name: &str, path: &str) -> Node {
    Node::target(name, path)
}

pub fn framework_node(path: &str, linking: BinaryLinking) -> Node {
    let path = PathBuf::from(path);
    let stem = path.file_stem().map(|s| s.to_os_string()).unwrap_or_default();
    Node::Framework {
        binary_path: path.join(stem),
        path,
        dsym_path: None,
        bcsymbolmap_paths: Vec::new(),
        linking,
        architectures: vec![BinaryArchitecture::Arm64],
        is_carthage: false,
    }
}

pub fn xcframework_node(path: &str, linking: BinaryLinking) -> Node {
    let path = PathBuf::from(path);
    Node::XCFramework {
        primary_binary_path: path.join("ios-arm64/Binary"),
        path,
        info_plist: crate::node::XCFrameworkInfoPlist { libraries: Vec::new() },
        linking,
    }
}

pub fn library_node(path: &str, public_headers: &str, swift_module_map: Option<&str>) -> Node {
    Node::Library {
        path: PathBuf::from(path),
        public_headers: PathBuf::from(public_headers),
        linking: BinaryLinking::Static,
        architectures: vec![BinaryArchitecture::Arm64],
        swift_module_map: swift_module_map.map(PathBuf::from),
    }
}

pub fn sdk_node(name: &str, status: SdkStatus) -> Node {
    SystemFrameworkMetadataProvider::new()
        .load_metadata(name, status, Platform::Ios, SdkSource::System)
        .expect("valid sdk name")
        .into()
}

pub fn path(p: &str) -> &Path {
    Path::new(p)
}
