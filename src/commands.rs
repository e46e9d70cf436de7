//! CLI command implementations

use std::path::Path;

use anyhow::{bail, Context};
use clap::ValueEnum;
use serde::Serialize;
use xcgraph_core::{Graph, GraphTraverser};
use xcgraph_loader::GraphLoader;

use crate::manifest::{self, Manifest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    Json,
    Dot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QueryKind {
    /// Targets declared by a project
    Targets,
    /// Every app target in the graph
    Apps,
    /// Every test bundle target in the graph
    TestTargets,
    /// Every node reachable from a project's targets
    #[value(name = "all")]
    AllDependencies,
    #[value(name = "direct")]
    DirectDependencies,
    #[value(name = "static")]
    StaticDependencies,
    #[value(name = "extensions")]
    AppExtensions,
    AppClip,
    UnitTestHost,
    #[value(name = "host")]
    HostTarget,
    /// Test targets depending on the target
    #[value(name = "tests")]
    TestsDependingOn,
    #[value(name = "resources")]
    ResourceBundles,
    Embeddable,
    Linkable,
    Searchable,
    #[value(name = "headers")]
    HeaderSearchPaths,
    #[value(name = "search-paths")]
    LibrarySearchPaths,
    SwiftIncludePaths,
    #[value(name = "run-path-search-paths")]
    RunPaths,
    PrecompiledFrameworks,
}

/// Load the graph described by a manifest.
///
/// With a workspace the whole workspace is loaded; otherwise the first
/// project in the manifest is the root.
pub async fn load_graph(manifest_path: &Path) -> anyhow::Result<Graph> {
    let manifest = Manifest::load(manifest_path)?;
    let loader = GraphLoader::filesystem();

    let graph = match &manifest.workspace {
        Some(workspace) => loader.load_workspace(workspace, &manifest.projects).await?,
        None => {
            let root = manifest
                .projects
                .first()
                .with_context(|| format!("manifest {} declares no projects", manifest_path.display()))?;
            let (_, graph) = loader.load_project(&root.path, &manifest.projects).await?;
            graph
        }
    };
    Ok(graph)
}

pub async fn load(manifest_path: &Path) -> anyhow::Result<()> {
    let graph = load_graph(manifest_path).await?;
    let target_count: usize = graph.targets.values().map(|targets| targets.len()).sum();

    tracing::info!(
        "Loaded {} projects, {} nodes, {} edges",
        graph.projects.len(),
        graph.node_count(),
        graph.edge_count()
    );

    println!("workspace: {} ({})", graph.name, graph.path.display());
    println!("projects:  {}", graph.projects.len());
    println!("targets:   {}", target_count);
    println!("nodes:     {}", graph.node_count());
    println!("edges:     {}", graph.edge_count());
    Ok(())
}

pub async fn graph(manifest_path: &Path, format: GraphFormat) -> anyhow::Result<()> {
    let graph = load_graph(manifest_path).await?;
    match format {
        GraphFormat::Json => println!("{}", serde_json::to_string_pretty(&graph.document())?),
        GraphFormat::Dot => println!("{}", graph.to_dot()),
    }
    Ok(())
}

pub async fn query(
    manifest_path: &Path,
    kind: QueryKind,
    project: &Path,
    target: Option<&str>,
) -> anyhow::Result<()> {
    let graph = load_graph(manifest_path).await?;
    let base = manifest_path.parent().unwrap_or_else(|| Path::new("."));
    let project = manifest::resolve(base, project);

    let output = run_query(&graph, kind, &project, target)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Evaluate a query against a loaded graph.
pub fn run_query(
    graph: &Graph,
    kind: QueryKind,
    project: &Path,
    target: Option<&str>,
) -> anyhow::Result<serde_json::Value> {
    let traverser = GraphTraverser::new(graph);
    let name = || require_target(&traverser, kind, project, target);

    match kind {
        QueryKind::Targets => to_json(traverser.targets(project)),
        QueryKind::Apps => to_json(traverser.apps()),
        QueryKind::TestTargets => to_json(traverser.test_targets()),
        QueryKind::AllDependencies => to_json(traverser.all_dependencies(project)),
        QueryKind::DirectDependencies => to_json(traverser.direct_target_dependencies(project, name()?)),
        QueryKind::StaticDependencies => to_json(traverser.direct_static_dependencies(project, name()?)),
        QueryKind::AppExtensions => to_json(traverser.app_extension_dependencies(project, name()?)),
        QueryKind::AppClip => to_json(traverser.app_clip_dependencies(project, name()?)),
        QueryKind::UnitTestHost => to_json(traverser.unit_test_host(project, name()?)),
        QueryKind::HostTarget => to_json(traverser.host_target_for(project, name()?)),
        QueryKind::TestsDependingOn => to_json(traverser.test_targets_depending_on(project, name()?)),
        QueryKind::ResourceBundles => to_json(traverser.resource_bundle_dependencies(project, name()?)),
        QueryKind::Embeddable => to_json(traverser.embeddable_frameworks(project, name()?)),
        QueryKind::Linkable => to_json(traverser.linkable_dependencies(project, name()?)?),
        QueryKind::Searchable => to_json(traverser.searchable_path_dependencies(project, name()?)?),
        QueryKind::HeaderSearchPaths => to_json(traverser.libraries_public_headers_folders(project, name()?)),
        QueryKind::LibrarySearchPaths => to_json(traverser.libraries_search_paths(project, name()?)),
        QueryKind::SwiftIncludePaths => to_json(traverser.libraries_swift_include_paths(project, name()?)),
        QueryKind::RunPaths => to_json(traverser.run_path_search_paths(project, name()?)),
        QueryKind::PrecompiledFrameworks => to_json(traverser.precompiled_frameworks_paths(project, name()?)),
    }
}

fn require_target<'t>(
    traverser: &GraphTraverser<'_>,
    kind: QueryKind,
    project: &Path,
    target: Option<&'t str>,
) -> anyhow::Result<&'t str> {
    let name = target.with_context(|| format!("query {:?} requires --target", kind))?;
    if traverser.target(project, name).is_none() {
        bail!("target '{}' is not loaded in project {}", name, project.display());
    }
    Ok(name)
}

fn to_json(value: impl Serialize) -> anyhow::Result<serde_json::Value> {
    Ok(serde_json::to_value(value)?)
}
