//! The value graph produced by the loader
//!
//! A `Graph` is an immutable snapshot: projects and targets as declared, plus
//! an adjacency map from every node to its direct dependencies. Export helpers
//! project it into `petgraph` for DOT output and into a serializable document.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use crate::model::{Package, Project, Target, Workspace};
use crate::node::Node;

/// The dependency graph of a workspace.
#[derive(Clone)]
pub struct Graph {
    pub name: String,
    pub path: PathBuf,
    pub workspace: Workspace,
    pub projects: HashMap<PathBuf, Project>,
    /// Packages per project path, keyed by local path or remote URL.
    pub packages: HashMap<PathBuf, HashMap<String, Package>>,
    pub targets: HashMap<PathBuf, HashMap<String, Target>>,
    /// Direct dependencies. A missing key means the node has none.
    pub dependencies: HashMap<Node, HashSet<Node>>,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("name", &self.name)
            .field("project_count", &self.projects.len())
            .field("node_count", &self.node_count())
            .field("edge_count", &self.edge_count())
            .finish()
    }
}

impl Graph {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, workspace: Workspace) -> Self {
        Graph {
            name: name.into(),
            path: path.into(),
            workspace,
            projects: HashMap::new(),
            packages: HashMap::new(),
            targets: HashMap::new(),
            dependencies: HashMap::new(),
        }
    }

    /// Direct dependencies of a node.
    pub fn direct_dependencies<'a>(&'a self, node: &Node) -> impl Iterator<Item = &'a Node> + use<'a> {
        self.dependencies.get(node).into_iter().flatten()
    }

    /// Look up a loaded target.
    pub fn target(&self, path: &Path, name: &str) -> Option<&Target> {
        self.targets.get(path)?.get(name)
    }

    /// Every node: loaded targets plus everything appearing in the adjacency map.
    pub fn nodes(&self) -> BTreeSet<Node> {
        let mut nodes: BTreeSet<Node> = self
            .targets
            .iter()
            .flat_map(|(path, targets)| {
                targets
                    .keys()
                    .map(move |name| Node::target(name.as_str(), path.as_path()))
            })
            .collect();
        for (from, to) in &self.dependencies {
            nodes.insert(from.clone());
            nodes.extend(to.iter().cloned());
        }
        nodes
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes().len()
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.dependencies.values().map(HashSet::len).sum()
    }

    /// Project into a `petgraph` directed graph. Node indices follow node order.
    pub fn to_petgraph(&self) -> DiGraph<Node, ()> {
        let mut inner = DiGraph::new();
        let mut indices: HashMap<Node, NodeIndex> = HashMap::new();
        for node in self.nodes() {
            let idx = inner.add_node(node.clone());
            indices.insert(node, idx);
        }

        let mut edges: Vec<(&Node, &Node)> = self
            .dependencies
            .iter()
            .flat_map(|(from, to)| to.iter().map(move |t| (from, t)))
            .collect();
        edges.sort();
        for (from, to) in edges {
            if let (Some(&a), Some(&b)) = (indices.get(from), indices.get(to)) {
                inner.add_edge(a, b, ());
            }
        }
        inner
    }

    /// Re-check acyclicity over the whole adjacency map.
    pub fn is_acyclic(&self) -> bool {
        !petgraph::algo::is_cyclic_directed(&self.to_petgraph())
    }

    /// Graphviz rendering labelled with node descriptions.
    pub fn to_dot(&self) -> String {
        let labelled = self.to_petgraph().map(|_, node| node.to_string(), |_, _| "");
        format!("{}", Dot::with_config(&labelled, &[Config::EdgeNoLabel]))
    }

    /// Serializable, deterministically ordered view of the graph.
    pub fn document(&self) -> GraphDocument<'_> {
        let mut projects: Vec<&Project> = self.projects.values().collect();
        projects.sort_by(|a, b| a.path.cmp(&b.path));

        let packages: BTreeMap<&Path, BTreeMap<&str, &Package>> = self
            .packages
            .iter()
            .map(|(path, packages)| {
                let sorted = packages.iter().map(|(k, v)| (k.as_str(), v)).collect();
                (path.as_path(), sorted)
            })
            .collect();

        let mut dependencies: Vec<DependencyEntry<'_>> = self
            .dependencies
            .iter()
            .map(|(from, to)| {
                let mut to: Vec<&Node> = to.iter().collect();
                to.sort();
                DependencyEntry { from, to }
            })
            .collect();
        dependencies.sort_by(|a, b| a.from.cmp(b.from));

        GraphDocument {
            name: &self.name,
            path: &self.path,
            workspace: &self.workspace,
            projects,
            packages,
            dependencies,
        }
    }
}

/// JSON export of a [`Graph`].
#[derive(Debug, Serialize)]
pub struct GraphDocument<'a> {
    pub name: &'a str,
    pub path: &'a Path,
    pub workspace: &'a Workspace,
    pub projects: Vec<&'a Project>,
    pub packages: BTreeMap<&'a Path, BTreeMap<&'a str, &'a Package>>,
    pub dependencies: Vec<DependencyEntry<'a>>,
}

#[derive(Debug, Serialize)]
pub struct DependencyEntry<'a> {
    pub from: &'a Node,
    pub to: Vec<&'a Node>,
}
