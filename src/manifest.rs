//! Manifest files: the projects to load and an optional workspace
//!
//! The format follows the file extension: `.yaml`/`.yml`, `.toml` or `.json`.
//! Relative paths are resolved against the manifest's directory.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use xcgraph_core::{Package, Project, TargetDependency, Workspace};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub workspace: Option<Workspace>,
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        let mut manifest = Self::parse(&content, extension)
            .with_context(|| format!("failed to parse manifest {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        manifest.resolve_paths(base);
        Ok(manifest)
    }

    pub fn parse(content: &str, extension: &str) -> Result<Self> {
        let manifest = match extension {
            "yaml" | "yml" => serde_yaml::from_str(content)?,
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            other => bail!("unsupported manifest format '{}': use yaml, toml or json", other),
        };
        Ok(manifest)
    }

    /// Make every declared path absolute relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        if let Some(workspace) = &mut self.workspace {
            workspace.path = resolve(base, &workspace.path);
            for project in &mut workspace.projects {
                *project = resolve(base, project);
            }
        }
        for project in &mut self.projects {
            project.path = resolve(base, &project.path);
            for package in &mut project.packages {
                if let Package::Local { path } = package {
                    *path = resolve(base, path);
                }
            }
            for target in &mut project.targets {
                for dependency in &mut target.dependencies {
                    resolve_dependency(base, dependency);
                }
            }
        }
    }
}

fn resolve_dependency(base: &Path, dependency: &mut TargetDependency) {
    match dependency {
        TargetDependency::Project { path, .. } => *path = resolve(base, path),
        TargetDependency::Framework { path, dependencies } | TargetDependency::XCFramework { path, dependencies } => {
            *path = resolve(base, path);
            for nested in dependencies {
                resolve_dependency(base, nested);
            }
        }
        TargetDependency::Library {
            path,
            public_headers,
            swift_module_map,
        } => {
            *path = resolve(base, path);
            *public_headers = resolve(base, public_headers);
            if let Some(module_map) = swift_module_map {
                *module_map = resolve(base, module_map);
            }
        }
        TargetDependency::Target { .. }
        | TargetDependency::Sdk { .. }
        | TargetDependency::Package { .. }
        | TargetDependency::Xctest => {}
    }
}

pub fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xcgraph_core::{Platform, Product};

    const YAML: &str = r#"
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
            target: Kit
            path: Kit
          - type: framework
            path: Carthage/Build/iOS/Alamofire.framework
  - path: Kit
    name: Kit
    packages:
      - kind: local
        path: Packages/Networking
      - kind: remote
        url: https://github.com/apple/swift-log
        requirement:
          exact: "1.5.0"
    targets:
      - name: Kit
        platform: iOS
        product: staticLibrary
"#;

    #[test]
    fn test_parse_yaml_and_resolve_paths() {
        let mut manifest = Manifest::parse(YAML, "yaml").unwrap();
        manifest.resolve_paths(Path::new("/repo"));

        let workspace = manifest.workspace.unwrap();
        assert_eq!(workspace.projects, vec![PathBuf::from("/repo/App")]);
        assert_eq!(manifest.projects.len(), 2);

        let app = &manifest.projects[0];
        assert_eq!(app.path, PathBuf::from("/repo/App"));
        assert_eq!(app.targets[0].platform, Platform::Ios);
        assert_eq!(
            app.targets[0].dependencies[0],
            TargetDependency::project("Kit", "/repo/Kit")
        );
        assert_eq!(
            app.targets[0].dependencies[1],
            TargetDependency::framework("/repo/Carthage/Build/iOS/Alamofire.framework")
        );
        assert_eq!(manifest.projects[1].targets[0].product, Product::StaticLibrary);
    }

    #[test]
    fn test_resolve_local_package_paths() {
        let mut manifest = Manifest::parse(YAML, "yaml").unwrap();
        manifest.resolve_paths(Path::new("/repo"));

        let packages = &manifest.projects[1].packages;
        assert_eq!(
            packages[0],
            Package::Local {
                path: PathBuf::from("/repo/Packages/Networking")
            }
        );
        assert_eq!(packages[0].key(), "/repo/Packages/Networking");
        assert!(matches!(&packages[1], Package::Remote { url, .. } if url == "https://github.com/apple/swift-log"));
    }

    #[test]
    fn test_parse_toml() {
        let content = r#"
[[projects]]
path = "/App"
name = "App"

[[projects.targets]]
name = "App"
platform = "macOS"
product = "commandLineTool"
dependencies = [{ type = "sdk", name = "libz.tbd", status = "optional" }]
"#;
        let manifest = Manifest::parse(content, "toml").unwrap();
        assert!(manifest.workspace.is_none());
        assert_eq!(manifest.projects[0].targets[0].product, Product::CommandLineTool);
    }

    #[test]
    fn test_parse_json() {
        let content = r#"{"projects": [{"path": "/App", "name": "App", "targets": []}]}"#;
        let manifest = Manifest::parse(content, "json").unwrap();
        assert_eq!(manifest.projects[0].name, "App");
    }

    #[test]
    fn test_unsupported_extension() {
        let err = Manifest::parse("", "xml").unwrap_err();
        assert!(err.to_string().contains("unsupported manifest format"));
    }
}
