//! Integration tests for xcgraph
//!
//! These tests drive the CLI binary against manifests on disk and run the
//! filesystem-backed loader against real artifact directories.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;
use xcgraph_core::{
    BinaryLinking, DependencyReference, GraphTraverser, Node, Platform, Product, Project, Target,
    TargetDependency, Workspace,
};
use xcgraph_loader::{GraphLoader, GraphLoadingError};

const MANIFEST: &str = r#"
workspace:
  path: .
  name: Shop
  projects: [App]
projects:
  - path: App
    name: App
    targets:
      - name: App
        platform: iOS
        product: app
        dependencies:
          - type: project
            target: Core
            path: Core
          - type: sdk
            name: UIKit.framework
      - name: AppTests
        platform: iOS
        product: unitTests
        dependencies:
          - type: target
            name: App
  - path: Core
    name: Core
    targets:
      - name: Core
        platform: iOS
        product: framework
        dependencies:
          - type: target
            name: Storage
      - name: Storage
        platform: iOS
        product: staticLibrary
        dependencies:
          - type: sdk
            name: libsqlite3.tbd
"#;

const CYCLE_MANIFEST: &str = r#"
projects:
  - path: App
    name: App
    targets:
      - name: A
        platform: macOS
        product: framework
        dependencies:
          - type: target
            name: B
      - name: B
        platform: macOS
        product: framework
        dependencies:
          - type: target
            name: A
"#;

fn xcgraph(manifest: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_xcgraph"))
        .arg("--manifest")
        .arg(manifest)
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute xcgraph")
}

fn write_manifest(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "xcgraph failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

// ── CLI ─────────────────────────────────────────────────────

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_xcgraph"))
        .arg("--help")
        .output()
        .expect("Failed to execute xcgraph");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("xcgraph"));
    assert!(stdout.contains("Load and query project dependency graphs"));
}

#[test]
fn test_cli_version() {
    let dir = TempDir::new().unwrap();
    let output = xcgraph(&dir.path().join("unused.yaml"), &["version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_load_summary() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, "xcgraph.yaml", MANIFEST);

    let output = xcgraph(&manifest, &["load"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("workspace: Shop"));
    assert!(stdout.contains("projects:  2"));
    assert!(stdout.contains("targets:   4"));
}

#[test]
fn test_cli_graph_json_and_dot() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, "xcgraph.yaml", MANIFEST);

    let document = stdout_json(&xcgraph(&manifest, &["graph"]));
    assert_eq!(document["name"], "Shop");
    assert_eq!(document["projects"].as_array().unwrap().len(), 2);
    assert!(!document["dependencies"].as_array().unwrap().is_empty());

    let output = xcgraph(&manifest, &["graph", "--format", "dot"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("digraph"));
}

#[test]
fn test_cli_queries() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, "xcgraph.yaml", MANIFEST);

    let embeddable = stdout_json(&xcgraph(
        &manifest,
        &["query", "embeddable", "--project", "App", "--target", "App"],
    ));
    assert_eq!(
        embeddable,
        serde_json::json!([{"kind": "product", "target": "Core", "product_name": "Core.framework"}])
    );

    let host = stdout_json(&xcgraph(
        &manifest,
        &["query", "unit-test-host", "--project", "App", "--target", "AppTests"],
    ));
    assert_eq!(host["target"]["name"], "App");

    let targets = stdout_json(&xcgraph(&manifest, &["query", "targets", "--project", "Core"]));
    assert_eq!(targets.as_array().unwrap().len(), 2);
}

#[test]
fn test_cli_query_requires_target() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, "xcgraph.yaml", MANIFEST);

    let output = xcgraph(&manifest, &["query", "linkable", "--project", "App"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("requires --target"));
}

#[test]
fn test_cli_reports_cycles() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, "cycle.yaml", CYCLE_MANIFEST);

    let output = xcgraph(&manifest, &["load"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("circular dependency"));
}

#[test]
fn test_cli_toml_manifest() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(
        &dir,
        "xcgraph.toml",
        r#"
[[projects]]
path = "Tool"
name = "Tool"

[[projects.targets]]
name = "tool"
platform = "macOS"
product = "commandLineTool"
dependencies = [{ type = "sdk", name = "libz.tbd", status = "optional" }]
"#,
    );

    let linkable = stdout_json(&xcgraph(
        &manifest,
        &["query", "linkable", "--project", "Tool", "--target", "tool"],
    ));
    assert_eq!(linkable[0]["kind"], "sdk");
    assert_eq!(linkable[0]["status"], "optional");
}

// ── Filesystem loader ───────────────────────────────────────

/// A 64-bit arm64 Mach-O of the given file type with no load commands.
fn macho(filetype: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    for word in [0xfeed_facf_u32, 0x0100_000c, 0, filetype, 0, 0, 0, 0] {
        bytes.extend_from_slice(&word.to_le_bytes());
    }
    bytes
}

fn write_framework(root: &Path, name: &str) -> PathBuf {
    let framework = root.join("Vendor").join(format!("{}.framework", name));
    fs::create_dir_all(&framework).unwrap();
    fs::write(framework.join(name), macho(0x6)).unwrap();
    framework
}

#[tokio::test]
async fn test_filesystem_loader_reads_frameworks() {
    let dir = TempDir::new().unwrap();
    let analytics = write_framework(dir.path(), "Analytics");

    let app = Target::new("App", Platform::Ios, Product::App)
        .with_dependencies(vec![TargetDependency::framework(&analytics)]);
    let project = Project::new(dir.path(), "App", vec![app]);

    let (_, graph) = GraphLoader::filesystem()
        .load_project(dir.path(), &[project])
        .await
        .unwrap();

    let framework = graph
        .nodes()
        .into_iter()
        .find(|node| matches!(node, Node::Framework { .. }))
        .unwrap();
    let Node::Framework {
        binary_path,
        linking,
        is_carthage,
        ..
    } = &framework
    else {
        unreachable!()
    };
    assert_eq!(binary_path, &analytics.join("Analytics"));
    assert_eq!(*linking, BinaryLinking::Dynamic);
    assert!(!is_carthage);

    let traverser = GraphTraverser::new(&graph);
    let embeddable = traverser.embeddable_frameworks(dir.path(), "App");
    assert_eq!(
        embeddable.into_iter().collect::<Vec<_>>(),
        vec![DependencyReference::from_node(&framework).unwrap()]
    );
    assert_eq!(
        traverser.precompiled_frameworks_paths(dir.path(), "App"),
        BTreeSet::from([analytics.clone()])
    );
}

#[tokio::test]
async fn test_filesystem_loader_missing_framework() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("Vendor/Missing.framework");

    let app = Target::new("App", Platform::Ios, Product::App)
        .with_dependencies(vec![TargetDependency::framework(&missing)]);
    let project = Project::new(dir.path(), "App", vec![app]);
    let workspace = Workspace::new(dir.path(), "App", vec![dir.path().to_path_buf()]);

    let err = GraphLoader::filesystem()
        .load_workspace(&workspace, &[project])
        .await
        .unwrap_err();
    assert!(matches!(err, GraphLoadingError::Metadata(_)));
    assert!(err.to_string().contains("Missing.framework"));
}
