//! The graph loader
//!
//! A load runs in three phases:
//!
//! 1. **Plan**: walk every project reachable from the entry projects and
//!    collect the distinct precompiled artifacts they declare.
//! 2. **Resolve**: ask the metadata providers about every artifact at once.
//!    The first failure aborts the load.
//! 3. **Build**: depth-first walk of each target's declarations, producing
//!    nodes and edges and rejecting cycles.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use futures_util::future::try_join_all;
use tracing::{debug, info, trace};
use xcgraph_core::{
    Graph, Node, Package, Platform, Project, SdkSource, SystemFrameworkMetadataProvider, Target, TargetDependency,
    Workspace,
};
use xcgraph_metadata::{MetadataCache, MetadataError, MetadataProviders};

use crate::cycles::{CycleDetector, CycleNode};
use crate::error::GraphLoadingError;

/// Builds [`Graph`]s from project declarations.
#[derive(Debug, Clone, Default)]
pub struct GraphLoader {
    providers: MetadataProviders,
}

impl GraphLoader {
    pub fn new(providers: MetadataProviders) -> Self {
        GraphLoader { providers }
    }

    /// A loader reading artifact metadata from disk.
    pub fn filesystem() -> Self {
        Self::new(MetadataProviders::filesystem())
    }

    /// Load the closure of a single project.
    pub async fn load_project(
        &self,
        path: &Path,
        projects: &[Project],
    ) -> Result<(Project, Graph), GraphLoadingError> {
        let root = projects
            .iter()
            .find(|p| p.path == path)
            .ok_or_else(|| GraphLoadingError::MissingProject(path.to_path_buf()))?;

        let loaded = self.load(vec![path.to_path_buf()], projects).await?;
        let workspace = Workspace::new(path, root.name.clone(), loaded.project_paths());
        let graph = loaded.into_graph(root.name.clone(), path, workspace);

        info!(
            project = %root.name,
            projects = graph.projects.len(),
            nodes = graph.node_count(),
            "loaded project graph"
        );
        Ok((root.clone(), graph))
    }

    /// Load every project a workspace declares, plus the projects their
    /// targets reference.
    pub async fn load_workspace(
        &self,
        workspace: &Workspace,
        projects: &[Project],
    ) -> Result<Graph, GraphLoadingError> {
        let loaded = self.load(workspace.projects.clone(), projects).await?;
        let mut workspace = workspace.clone();
        workspace.projects = loaded.project_paths();
        let graph = loaded.into_graph(workspace.name.clone(), workspace.path.clone(), workspace);

        info!(
            workspace = %graph.name,
            projects = graph.projects.len(),
            nodes = graph.node_count(),
            "loaded workspace graph"
        );
        Ok(graph)
    }

    async fn load(&self, entry: Vec<PathBuf>, projects: &[Project]) -> Result<Loaded, GraphLoadingError> {
        let projects: HashMap<&Path, &Project> = projects.iter().map(|p| (p.path.as_path(), p)).collect();

        let plan = plan(entry, &projects)?;
        debug!(
            projects = plan.projects.len(),
            artifacts = plan.artifacts.len(),
            "planned load"
        );

        let cache = MetadataCache::new();
        try_join_all(plan.artifacts.iter().map(|artifact| self.resolve(artifact, &cache))).await?;

        let mut builder = Builder::new(&projects, &plan.nested, &cache, self.providers.system);
        for path in &plan.projects {
            let project = projects
                .get(path.as_path())
                .ok_or_else(|| GraphLoadingError::MissingProject(path.clone()))?;
            debug!(project = %project.name, path = %path.display(), "loading project");
            for target in &project.targets {
                builder.build_target(path, &target.name)?;
            }
        }

        let stats = cache.stats();
        debug!(
            artifacts = stats.entries,
            hits = stats.hits,
            misses = stats.misses,
            "metadata cache"
        );

        Ok(Loaded {
            projects: plan
                .projects
                .iter()
                .filter_map(|path| projects.get(path.as_path()).map(|p| (path.clone(), (*p).clone())))
                .collect(),
            targets: builder.targets,
            dependencies: builder.dependencies,
        })
    }

    async fn resolve(&self, artifact: &Artifact, cache: &MetadataCache) -> Result<(), GraphLoadingError> {
        let node: Node = match artifact {
            Artifact::Framework(path) => self.providers.framework.load_metadata(path).await?.into(),
            Artifact::XCFramework(path) => self.providers.xcframework.load_metadata(path).await?.into(),
            Artifact::Library {
                path,
                public_headers,
                swift_module_map,
            } => self
                .providers
                .library
                .load_metadata(path, public_headers, swift_module_map.as_deref())
                .await?
                .into(),
        };
        debug!(artifact = %node, linking = ?node.linking(), "resolved metadata");
        cache.insert(artifact.path().to_path_buf(), node);
        Ok(())
    }
}

// ── Plan ────────────────────────────────────────────────────

/// A precompiled artifact to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Artifact {
    Framework(PathBuf),
    XCFramework(PathBuf),
    Library {
        path: PathBuf,
        public_headers: PathBuf,
        swift_module_map: Option<PathBuf>,
    },
}

impl Artifact {
    fn from_declaration(declaration: &TargetDependency) -> Option<Self> {
        match declaration {
            TargetDependency::Framework { path, .. } => Some(Artifact::Framework(path.clone())),
            TargetDependency::XCFramework { path, .. } => Some(Artifact::XCFramework(path.clone())),
            TargetDependency::Library {
                path,
                public_headers,
                swift_module_map,
            } => Some(Artifact::Library {
                path: path.clone(),
                public_headers: public_headers.clone(),
                swift_module_map: swift_module_map.clone(),
            }),
            _ => None,
        }
    }

    fn path(&self) -> &Path {
        match self {
            Artifact::Framework(path) | Artifact::XCFramework(path) | Artifact::Library { path, .. } => path,
        }
    }
}

/// A declaration together with the project it was written in.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Declared {
    dependency: TargetDependency,
    project: PathBuf,
}

struct Plan {
    /// Reachable project paths, sorted.
    projects: BTreeSet<PathBuf>,
    /// Distinct artifacts in declaration order. The first declaration of a
    /// path wins.
    artifacts: Vec<Artifact>,
    /// Nested declarations per framework/xcframework path, merged across
    /// every place the artifact is declared.
    nested: HashMap<PathBuf, Vec<Declared>>,
}

fn plan(entry: Vec<PathBuf>, projects: &HashMap<&Path, &Project>) -> Result<Plan, GraphLoadingError> {
    let mut queue = entry;
    queue.reverse();
    let mut reachable = BTreeSet::new();
    let mut artifacts = Vec::new();
    let mut seen_artifacts = HashSet::new();
    let mut nested: HashMap<PathBuf, Vec<Declared>> = HashMap::new();

    while let Some(path) = queue.pop() {
        if reachable.contains(&path) {
            continue;
        }
        let project = projects
            .get(path.as_path())
            .ok_or_else(|| GraphLoadingError::MissingProject(path.clone()))?;

        let mut declarations: Vec<&TargetDependency> = project
            .targets
            .iter()
            .flat_map(|t| t.dependencies.iter())
            .rev()
            .collect();
        while let Some(declaration) = declarations.pop() {
            if let TargetDependency::Project { path, .. } = declaration {
                queue.push(path.clone());
            }
            if let Some(artifact) = Artifact::from_declaration(declaration) {
                let key = artifact.path().to_path_buf();
                if seen_artifacts.insert(key.clone()) {
                    artifacts.push(artifact);
                }
                let merged = nested.entry(key).or_default();
                for dependency in declaration.nested() {
                    let declared = Declared {
                        dependency: dependency.clone(),
                        project: path.clone(),
                    };
                    if !merged.contains(&declared) {
                        merged.push(declared);
                    }
                }
            }
            declarations.extend(declaration.nested().iter().rev());
        }

        reachable.insert(path);
    }

    Ok(Plan {
        projects: reachable,
        artifacts,
        nested,
    })
}

// ── Build ───────────────────────────────────────────────────

/// A node whose declarations are being walked.
struct Frame {
    node: Node,
    declarations: Vec<Declared>,
    next: usize,
    resolved: Vec<Node>,
    platform: Platform,
}

enum Step {
    /// A node with nothing left to walk.
    Leaf(Node),
    /// A node whose declarations need walking.
    Enter(Frame),
}

struct Builder<'a> {
    projects: &'a HashMap<&'a Path, &'a Project>,
    nested: &'a HashMap<PathBuf, Vec<Declared>>,
    cache: &'a MetadataCache,
    system: SystemFrameworkMetadataProvider,
    detector: CycleDetector,
    targets: HashMap<PathBuf, HashMap<String, Target>>,
    dependencies: HashMap<Node, HashSet<Node>>,
}

impl<'a> Builder<'a> {
    fn new(
        projects: &'a HashMap<&'a Path, &'a Project>,
        nested: &'a HashMap<PathBuf, Vec<Declared>>,
        cache: &'a MetadataCache,
        system: SystemFrameworkMetadataProvider,
    ) -> Self {
        Builder {
            projects,
            nested,
            cache,
            system,
            detector: CycleDetector::new(),
            targets: HashMap::new(),
            dependencies: HashMap::new(),
        }
    }

    /// Walk a target and everything below it. Already built targets are skipped.
    fn build_target(&mut self, path: &Path, name: &str) -> Result<(), GraphLoadingError> {
        let mut stack = match self.enter_target(path, name)? {
            Step::Enter(frame) => vec![frame],
            Step::Leaf(_) => return Ok(()),
        };

        while let Some(frame) = stack.last_mut() {
            let Some(declaration) = frame.declarations.get(frame.next).cloned() else {
                let Some(done) = stack.pop() else { break };
                let node = self.finish(done);
                match stack.last_mut() {
                    Some(parent) => parent.resolved.push(node),
                    None => break,
                }
                continue;
            };
            frame.next += 1;
            let platform = frame.platform;

            match self.step(&declaration.dependency, platform, &declaration.project)? {
                Step::Leaf(node) => {
                    if let Some(frame) = stack.last_mut() {
                        frame.resolved.push(node);
                    }
                }
                Step::Enter(child) => stack.push(child),
            }
        }

        Ok(())
    }

    fn step(
        &mut self,
        declaration: &TargetDependency,
        platform: Platform,
        project: &Path,
    ) -> Result<Step, GraphLoadingError> {
        match declaration {
            TargetDependency::Target { name } => self.enter_target(project, name),
            TargetDependency::Project { target, path } => self.enter_target(path, target),
            TargetDependency::Framework { path, .. } | TargetDependency::XCFramework { path, .. } => {
                self.enter_precompiled(path, platform)
            }
            TargetDependency::Library { path, .. } => Ok(Step::Leaf(self.cached(path)?)),
            TargetDependency::Sdk { name, status } => {
                let sdk = self.system.load_metadata(name, *status, platform, SdkSource::System)?;
                Ok(Step::Leaf(sdk.into()))
            }
            TargetDependency::Package { product } => Ok(Step::Leaf(Node::PackageProduct {
                path: project.to_path_buf(),
                product: product.clone(),
            })),
            TargetDependency::Xctest => Ok(Step::Leaf(self.system.load_xctest_metadata(platform).into())),
        }
    }

    fn enter_target(&mut self, path: &Path, name: &str) -> Result<Step, GraphLoadingError> {
        let projects = self.projects;
        let project = projects
            .get(path)
            .ok_or_else(|| GraphLoadingError::MissingProject(path.to_path_buf()))?;
        let target = project.target(name).ok_or_else(|| GraphLoadingError::TargetNotFound {
            name: name.to_string(),
            path: path.to_path_buf(),
        })?;

        let node = Node::target(name, path);
        if !self.enter(CycleNode::new(path, name))? {
            return Ok(Step::Leaf(node));
        }

        debug!(target_name = name, project = %path.display(), "loading target");
        self.targets
            .entry(path.to_path_buf())
            .or_default()
            .insert(name.to_string(), target.clone());

        Ok(Step::Enter(Frame {
            node,
            declarations: target
                .dependencies
                .iter()
                .map(|dependency| Declared {
                    dependency: dependency.clone(),
                    project: path.to_path_buf(),
                })
                .collect(),
            next: 0,
            resolved: Vec::new(),
            platform: target.platform,
        }))
    }

    /// Enter a framework or xcframework, walking the nested declarations
    /// merged from every place it is declared.
    fn enter_precompiled(&mut self, path: &Path, platform: Platform) -> Result<Step, GraphLoadingError> {
        let node = self.cached(path)?;
        if !self.enter(CycleNode::artifact(path))? {
            return Ok(Step::Leaf(node));
        }
        Ok(Step::Enter(Frame {
            node,
            declarations: self.nested.get(path).cloned().unwrap_or_default(),
            next: 0,
            resolved: Vec::new(),
            platform,
        }))
    }

    fn enter(&mut self, key: CycleNode) -> Result<bool, GraphLoadingError> {
        self.detector
            .enter(&key)
            .map_err(GraphLoadingError::CircularDependency)
    }

    fn cached(&self, path: &Path) -> Result<Node, GraphLoadingError> {
        self.cache
            .get(path)
            .ok_or_else(|| MetadataError::MetadataNotFound(path.to_path_buf()).into())
    }

    /// Record a walked node's edges and hand the node back to its parent.
    fn finish(&mut self, frame: Frame) -> Node {
        self.detector.exit();
        if !frame.resolved.is_empty() {
            for dependency in &frame.resolved {
                trace!(from = %frame.node, to = %dependency, "edge");
            }
            self.dependencies
                .entry(frame.node.clone())
                .or_default()
                .extend(frame.resolved);
        }
        frame.node
    }
}

/// Output of the build phase, before it is named and wrapped in a workspace.
struct Loaded {
    projects: HashMap<PathBuf, Project>,
    targets: HashMap<PathBuf, HashMap<String, Target>>,
    dependencies: HashMap<Node, HashSet<Node>>,
}

impl Loaded {
    fn project_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.projects.keys().cloned().collect();
        paths.sort();
        paths
    }

    fn into_graph(self, name: String, path: impl Into<PathBuf>, workspace: Workspace) -> Graph {
        let mut graph = Graph::new(name, path, workspace);
        graph.packages = self
            .projects
            .iter()
            .filter(|(_, project)| !project.packages.is_empty())
            .map(|(path, project)| {
                let packages: HashMap<String, Package> =
                    project.packages.iter().map(|p| (p.key(), p.clone())).collect();
                (path.clone(), packages)
            })
            .collect();
        graph.projects = self.projects;
        graph.targets = self.targets;
        graph.dependencies = self.dependencies;
        graph
    }
}
