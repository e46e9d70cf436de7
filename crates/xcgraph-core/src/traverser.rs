//! Read-only queries over a built [`Graph`]
//!
//! Every query is a constrained depth-first walk. Most of them reduce to
//! [`GraphTraverser::filter_dependencies`] with a different pair of
//! predicates: `test` selects what is collected, `skip` prunes the walk
//! below a node without excluding the node itself.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::trace;

use crate::graph::Graph;
use crate::model::{Platform, Product, Project, Target};
use crate::node::{Node, SdkSource, SdkStatus};
use crate::reference::DependencyReference;
use crate::sdk::{SdkError, SystemFrameworkMetadataProvider};

/// A loaded target together with the project declaring it.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GraphTarget<'a> {
    pub path: &'a Path,
    pub target: &'a Target,
    #[serde(skip)]
    pub project: &'a Project,
}

impl GraphTarget<'_> {
    pub fn node(&self) -> Node {
        Node::target(self.target.name.as_str(), self.path)
    }

    pub fn name(&self) -> &str {
        &self.target.name
    }
}

impl PartialEq for GraphTarget<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.target.name == other.target.name
    }
}

impl Eq for GraphTarget<'_> {}

impl Hash for GraphTarget<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
        self.target.name.hash(state);
    }
}

impl PartialOrd for GraphTarget<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GraphTarget<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.path, &self.target.name).cmp(&(other.path, &other.target.name))
    }
}

/// Stateless query layer over a [`Graph`].
#[derive(Debug, Clone, Copy)]
pub struct GraphTraverser<'a> {
    graph: &'a Graph,
    system_frameworks: SystemFrameworkMetadataProvider,
}

impl<'a> GraphTraverser<'a> {
    pub fn new(graph: &'a Graph) -> Self {
        GraphTraverser {
            graph,
            system_frameworks: SystemFrameworkMetadataProvider::new(),
        }
    }

    pub fn graph(&self) -> &'a Graph {
        self.graph
    }

    // ── Lookups ─────────────────────────────────────────────

    /// The target plus its owning project, if both are loaded.
    pub fn target(&self, path: &Path, name: &str) -> Option<GraphTarget<'a>> {
        let (path, targets) = self.graph.targets.get_key_value(path)?;
        let target = targets.get(name)?;
        let project = self.graph.projects.get(path)?;
        Some(GraphTarget {
            path,
            target,
            project,
        })
    }

    /// All targets loaded for a project.
    pub fn targets(&self, path: &Path) -> BTreeSet<GraphTarget<'a>> {
        self.graph
            .targets
            .get(path)
            .into_iter()
            .flat_map(|targets| targets.keys())
            .filter_map(|name| self.target(path, name))
            .collect()
    }

    pub fn all_targets(&self) -> BTreeSet<GraphTarget<'a>> {
        self.graph
            .targets
            .keys()
            .flat_map(|path| self.targets(path))
            .collect()
    }

    pub fn apps(&self) -> BTreeSet<GraphTarget<'a>> {
        self.all_targets()
            .into_iter()
            .filter(|t| t.target.product == Product::App)
            .collect()
    }

    pub fn test_targets(&self) -> BTreeSet<GraphTarget<'a>> {
        self.all_targets()
            .into_iter()
            .filter(|t| t.target.product.is_tests_bundle())
            .collect()
    }

    fn target_of(&self, node: &Node) -> Option<GraphTarget<'a>> {
        let (name, path) = node.as_target()?;
        self.target(path, name)
    }

    fn test_target(&self, node: &Node, test: impl Fn(&Target) -> bool) -> bool {
        self.target_of(node).is_some_and(|t| test(t.target))
    }

    fn reference(&self, node: &Node) -> Option<DependencyReference> {
        match node {
            Node::Target { .. } => self
                .target_of(node)
                .map(|t| DependencyReference::product(t.target)),
            _ => DependencyReference::from_node(node),
        }
    }

    // ── Reachability ────────────────────────────────────────

    /// Depth-first walk below `from`. A visited node is collected when `test`
    /// holds and its own dependencies are not walked when `skip` holds. The
    /// root is neither tested nor skipped.
    pub fn filter_dependencies(
        &self,
        from: &Node,
        test: impl Fn(&Node) -> bool,
        skip: impl Fn(&Node) -> bool,
    ) -> HashSet<Node> {
        self.filter_dependencies_from(std::slice::from_ref(from), test, skip)
    }

    fn filter_dependencies_from(
        &self,
        roots: &[Node],
        test: impl Fn(&Node) -> bool,
        skip: impl Fn(&Node) -> bool,
    ) -> HashSet<Node> {
        let mut visited: HashSet<&Node> = HashSet::new();
        let mut found = HashSet::new();
        let mut stack: Vec<&Node> = roots.iter().collect();

        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            if !roots.contains(node) {
                if test(node) {
                    found.insert(node.clone());
                }
                if skip(node) {
                    continue;
                }
            }
            for dependency in self.graph.direct_dependencies(node) {
                if !visited.contains(dependency) {
                    stack.push(dependency);
                }
            }
        }

        found
    }

    fn transitive_static_dependencies(&self, from: &Node) -> HashSet<Node> {
        self.filter_dependencies(
            from,
            |n| self.test_target(n, |t| t.product.is_static()),
            |n| self.is_static_boundary(n),
        )
    }

    /// Static products are flattened through; every other target and every
    /// dynamic binary ends the walk.
    fn is_static_boundary(&self, node: &Node) -> bool {
        match node {
            Node::Target { .. } => self.test_target(node, |t| !t.product.is_static()),
            _ => node.is_precompiled_dynamic(),
        }
    }

    fn can_embed_frameworks(&self, node: &Node) -> bool {
        self.test_target(node, |t| t.product.can_embed_frameworks())
    }

    /// Precompiled nodes linked through `from`'s direct precompiled
    /// dependencies: the direct ones, statics chained below static binaries,
    /// and every dynamic binary below them.
    fn precompiled_linkables(&self, from: &Node) -> HashSet<Node> {
        let direct: Vec<Node> = self
            .graph
            .direct_dependencies(from)
            .filter(|n| n.is_precompiled())
            .cloned()
            .collect();

        let mut linkables = self.filter_dependencies_from(
            &direct,
            Node::is_precompiled_static,
            |n| !n.is_precompiled() || n.is_precompiled_dynamic(),
        );
        linkables.extend(self.filter_dependencies_from(
            &direct,
            Node::is_precompiled_dynamic,
            |n| !n.is_precompiled(),
        ));
        linkables.extend(direct);
        linkables
    }

    // ── Direct dependencies ─────────────────────────────────

    /// Direct target dependencies declared in the same project.
    pub fn direct_target_dependencies(&self, path: &Path, name: &str) -> BTreeSet<GraphTarget<'a>> {
        let from = Node::target(name, path);
        self.graph
            .direct_dependencies(&from)
            .filter_map(|node| self.target_of(node))
            .filter(|t| t.path == path)
            .collect()
    }

    pub fn direct_static_dependencies(&self, path: &Path, name: &str) -> BTreeSet<DependencyReference> {
        self.direct_target_dependencies(path, name)
            .into_iter()
            .filter(|t| t.target.product.is_static())
            .map(|t| DependencyReference::product(t.target))
            .collect()
    }

    pub fn app_extension_dependencies(&self, path: &Path, name: &str) -> BTreeSet<GraphTarget<'a>> {
        self.direct_target_dependencies(path, name)
            .into_iter()
            .filter(|t| t.target.product.is_app_extension())
            .collect()
    }

    pub fn app_clip_dependencies(&self, path: &Path, name: &str) -> Option<GraphTarget<'a>> {
        self.direct_target_dependencies(path, name)
            .into_iter()
            .find(|t| t.target.product == Product::AppClip)
    }

    /// The app a unit or UI test bundle runs inside: its direct app dependency.
    pub fn unit_test_host(&self, path: &Path, name: &str) -> Option<GraphTarget<'a>> {
        self.direct_target_dependencies(path, name)
            .into_iter()
            .find(|t| t.target.product.can_host_tests())
    }

    /// The target embedding this one as a companion, e.g. the watch app
    /// hosting a watch extension. Candidates are the project's targets whose
    /// product can host this target's product and whose own direct
    /// dependencies include it.
    pub fn host_target_for(&self, path: &Path, name: &str) -> Option<GraphTarget<'a>> {
        let hosted = self.target(path, name)?;
        let host_products = hosted.target.product.host_products();
        let node = hosted.node();

        self.targets(path)
            .into_iter()
            .filter(|candidate| host_products.contains(&candidate.target.product))
            .find(|candidate| {
                self.graph
                    .direct_dependencies(&candidate.node())
                    .any(|dependency| *dependency == node)
            })
    }

    // ── Transitive dependencies ─────────────────────────────

    /// Test bundles of the same project that reach the target transitively.
    pub fn test_targets_depending_on(&self, path: &Path, name: &str) -> BTreeSet<GraphTarget<'a>> {
        let dependency = Node::target(name, path);
        self.targets(path)
            .into_iter()
            .filter(|t| t.target.product.is_tests_bundle())
            .filter(|t| {
                !self
                    .filter_dependencies(&t.node(), |n| *n == dependency, |_| false)
                    .is_empty()
            })
            .collect()
    }

    /// Union of every project target's transitive closure. A target only
    /// leaves out itself, so same-project dependencies are included.
    pub fn all_dependencies(&self, path: &Path) -> BTreeSet<Node> {
        self.targets(path)
            .iter()
            .flat_map(|t| self.filter_dependencies(&t.node(), |_| true, |_| false))
            .collect()
    }

    /// Bundle targets whose resources ship with this target.
    pub fn resource_bundle_dependencies(&self, path: &Path, name: &str) -> BTreeSet<GraphTarget<'a>> {
        let Some(target) = self.target(path, name) else {
            return BTreeSet::new();
        };

        self.filter_dependencies(
            &target.node(),
            |n| self.test_target(n, |t| t.product == Product::Bundle),
            |n| {
                self.test_target(n, |t| t.product.supports_resources())
                    || n.is_precompiled_dynamic_framework()
            },
        )
        .iter()
        .filter_map(|n| self.target_of(n))
        .collect()
    }

    /// Frameworks that have to be copied into the target's bundle.
    pub fn embeddable_frameworks(&self, path: &Path, name: &str) -> BTreeSet<DependencyReference> {
        let Some(target) = self.target(path, name) else {
            return BTreeSet::new();
        };
        if !target.target.product.can_embed_frameworks() {
            return BTreeSet::new();
        }

        let from = target.node();
        let precompiled = self.filter_dependencies(
            &from,
            Node::is_precompiled_dynamic_framework,
            |n| n.is_precompiled_dynamic_framework() || self.can_embed_frameworks(n),
        );
        let products = self.filter_dependencies(
            &from,
            |n| self.test_target(n, |t| t.product == Product::Framework),
            |n| self.can_embed_frameworks(n),
        );

        let mut references: BTreeSet<DependencyReference> = precompiled
            .iter()
            .chain(products.iter())
            .filter_map(|n| self.reference(n))
            .collect();

        if target.target.product.is_tests_bundle() {
            match self.unit_test_host(path, name) {
                Some(host) => {
                    let provided = self.embeddable_frameworks(host.path, host.name());
                    references.retain(|r| !provided.contains(r));
                }
                None if target.target.product == Product::UnitTests => references.clear(),
                None => {}
            }
        }

        trace!(target_name = name, count = references.len(), "embeddable frameworks");
        references
    }

    /// Everything the target's binary links against.
    ///
    /// Static targets are flattened into the closest consumer that can link
    /// static products, carrying their SDKs and linked binaries along. Tests
    /// running inside a host app only get what the host doesn't link already.
    pub fn linkable_dependencies(&self, path: &Path, name: &str) -> Result<BTreeSet<DependencyReference>, SdkError> {
        self.linkable_dependencies_with(path, name, true)
    }

    /// Linkable dependencies without host exclusion, plus static precompiled
    /// frameworks and their closure. Feeds header and framework search paths.
    pub fn searchable_path_dependencies(
        &self,
        path: &Path,
        name: &str,
    ) -> Result<BTreeSet<DependencyReference>, SdkError> {
        let mut references = self.linkable_dependencies_with(path, name, false)?;

        let static_frameworks: Vec<Node> = self
            .graph
            .direct_dependencies(&Node::target(name, path))
            .filter(|n| matches!(n, Node::Framework { .. }) && n.is_precompiled_static())
            .cloned()
            .collect();
        references.extend(static_frameworks.iter().filter_map(DependencyReference::from_node));
        references.extend(
            self.filter_dependencies_from(&static_frameworks, |_| true, |_| false)
                .iter()
                .filter_map(|n| self.reference(n)),
        );

        Ok(references)
    }

    fn linkable_dependencies_with(
        &self,
        path: &Path,
        name: &str,
        exclude_host: bool,
    ) -> Result<BTreeSet<DependencyReference>, SdkError> {
        let Some(target) = self.target(path, name) else {
            return Ok(BTreeSet::new());
        };
        let from = target.node();
        let product = target.target.product;
        let mut references = BTreeSet::new();

        let transitive_static = if product.can_link_static_products() {
            self.transitive_static_dependencies(&from)
        } else {
            HashSet::new()
        };

        // SDKs required by static dependencies
        for dependency in &transitive_static {
            references.extend(
                self.graph
                    .direct_dependencies(dependency)
                    .filter(|n| n.is_sdk())
                    .filter_map(DependencyReference::from_node),
            );
        }

        if product == Product::AppClip {
            let sdk = self.system_frameworks.load_metadata(
                "AppClip.framework",
                SdkStatus::Required,
                Platform::Ios,
                SdkSource::System,
            )?;
            references.insert(DependencyReference::Sdk {
                path: sdk.path,
                status: sdk.status,
                source: sdk.source,
            });
        }

        references.extend(
            self.graph
                .direct_dependencies(&from)
                .filter(|n| n.is_sdk())
                .filter_map(DependencyReference::from_node),
        );

        references.extend(
            self.precompiled_linkables(&from)
                .iter()
                .filter_map(DependencyReference::from_node),
        );

        for dependency in &transitive_static {
            references.extend(self.reference(dependency));
            references.extend(
                self.graph
                    .direct_dependencies(dependency)
                    .filter(|n| self.test_target(n, |t| t.product.is_dynamic_linkable()))
                    .filter_map(|n| self.reference(n)),
            );
            references.extend(
                self.precompiled_linkables(dependency)
                    .iter()
                    .filter_map(DependencyReference::from_node),
            );
        }

        references.extend(
            self.graph
                .direct_dependencies(&from)
                .filter(|n| self.test_target(n, |t| t.product.is_dynamic_linkable()))
                .filter_map(|n| self.reference(n)),
        );

        if exclude_host && product.is_tests_bundle() {
            if let Some(host) = self.unit_test_host(path, name) {
                let linked_by_host = self.linkable_dependencies_with(host.path, host.name(), true)?;
                references.retain(|r| !linked_by_host.contains(r));
            }
        }

        trace!(target_name = name, count = references.len(), "linkable dependencies");
        Ok(prefer_required(references))
    }

    // ── Search paths ────────────────────────────────────────

    fn libraries(&self, path: &Path, name: &str) -> HashSet<Node> {
        self.filter_dependencies(&Node::target(name, path), Node::is_library, |_| false)
    }

    pub fn libraries_public_headers_folders(&self, path: &Path, name: &str) -> BTreeSet<PathBuf> {
        self.libraries(path, name)
            .into_iter()
            .filter_map(|n| match n {
                Node::Library { public_headers, .. } => Some(public_headers),
                _ => None,
            })
            .collect()
    }

    pub fn libraries_search_paths(&self, path: &Path, name: &str) -> BTreeSet<PathBuf> {
        self.libraries(path, name)
            .iter()
            .filter_map(|n| n.path().parent().map(Path::to_path_buf))
            .collect()
    }

    pub fn libraries_swift_include_paths(&self, path: &Path, name: &str) -> BTreeSet<PathBuf> {
        self.libraries(path, name)
            .into_iter()
            .filter_map(|n| match n {
                Node::Library {
                    swift_module_map: Some(module_map),
                    ..
                } => module_map.parent().map(Path::to_path_buf),
                _ => None,
            })
            .collect()
    }

    /// Runtime search paths for a unit test bundle without a host app.
    pub fn run_path_search_paths(&self, path: &Path, name: &str) -> BTreeSet<PathBuf> {
        let Some(target) = self.target(path, name) else {
            return BTreeSet::new();
        };
        if target.target.product != Product::UnitTests || self.unit_test_host(path, name).is_some() {
            return BTreeSet::new();
        }

        self.filter_dependencies(
            &target.node(),
            Node::is_precompiled_dynamic_framework,
            |n| self.can_embed_frameworks(n),
        )
        .iter()
        .filter_map(|n| n.path().parent().map(Path::to_path_buf))
        .collect()
    }

    /// Paths of every framework and xcframework reachable from the target.
    pub fn precompiled_frameworks_paths(&self, path: &Path, name: &str) -> BTreeSet<PathBuf> {
        self.filter_dependencies(&Node::target(name, path), Node::is_framework_like, |_| false)
            .iter()
            .map(|n| n.path().to_path_buf())
            .collect()
    }
}

/// Collapse an SDK linked both required and optional into the required entry.
fn prefer_required(mut references: BTreeSet<DependencyReference>) -> BTreeSet<DependencyReference> {
    let required: HashSet<PathBuf> = references
        .iter()
        .filter_map(|r| match r {
            DependencyReference::Sdk {
                path,
                status: SdkStatus::Required,
                ..
            } => Some(path.clone()),
            _ => None,
        })
        .collect();

    references.retain(|r| {
        !matches!(r, DependencyReference::Sdk { path, status: SdkStatus::Optional, .. } if required.contains(path))
    });
    references
}
