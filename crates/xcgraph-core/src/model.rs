//! Declarative project model consumed by the graph loader

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::node::SdkStatus;

/// Platform a target is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "iOS", alias = "ios")]
    Ios,
    #[serde(rename = "macOS", alias = "macos")]
    MacOs,
    #[serde(rename = "tvOS", alias = "tvos")]
    TvOs,
    #[serde(rename = "watchOS", alias = "watchos")]
    WatchOs,
}

impl Platform {
    /// Name of the platform's SDK directory, e.g. `iPhoneOS` for `iPhoneOS.sdk`.
    pub fn sdk_directory_name(self) -> &'static str {
        match self {
            Platform::Ios => "iPhoneOS",
            Platform::MacOs => "MacOSX",
            Platform::TvOs => "AppleTVOS",
            Platform::WatchOs => "WatchOS",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Ios => "iOS",
            Platform::MacOs => "macOS",
            Platform::TvOs => "tvOS",
            Platform::WatchOs => "watchOS",
        };
        f.write_str(name)
    }
}

/// The build-output kind of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Product {
    // ── Runnables ───────────────────────────────────────────
    App,
    AppClip,
    CommandLineTool,
    Xpc,

    // ── Linkables ───────────────────────────────────────────
    StaticLibrary,
    DynamicLibrary,
    Framework,
    StaticFramework,

    // ── Tests ───────────────────────────────────────────────
    UnitTests,
    UiTests,

    // ── Resources ───────────────────────────────────────────
    Bundle,

    // ── Extensions / companion apps ─────────────────────────
    AppExtension,
    StickerPackExtension,
    MessagesExtension,
    TvTopShelfExtension,
    Watch2App,
    Watch2Extension,
}

impl Product {
    pub fn is_static(self) -> bool {
        matches!(self, Product::StaticLibrary | Product::StaticFramework)
    }

    /// Framework or dynamic library built from source.
    pub fn is_dynamic_linkable(self) -> bool {
        matches!(self, Product::Framework | Product::DynamicLibrary)
    }

    pub fn is_linkable(self) -> bool {
        self.is_static() || self.is_dynamic_linkable()
    }

    pub fn is_tests_bundle(self) -> bool {
        matches!(self, Product::UnitTests | Product::UiTests)
    }

    pub fn can_host_tests(self) -> bool {
        matches!(self, Product::App | Product::AppClip)
    }

    pub fn is_app_extension(self) -> bool {
        matches!(
            self,
            Product::AppExtension
                | Product::StickerPackExtension
                | Product::Watch2Extension
                | Product::TvTopShelfExtension
                | Product::MessagesExtension
        )
    }

    /// Products whose binary is the final link step for static dependencies.
    pub fn can_link_static_products(self) -> bool {
        matches!(
            self,
            Product::Framework
                | Product::App
                | Product::CommandLineTool
                | Product::Xpc
                | Product::UnitTests
                | Product::UiTests
                | Product::AppExtension
                | Product::Watch2Extension
                | Product::MessagesExtension
                | Product::AppClip
        )
    }

    /// Products with a bundle that can carry embedded frameworks.
    pub fn can_embed_frameworks(self) -> bool {
        matches!(
            self,
            Product::App
                | Product::Watch2App
                | Product::AppClip
                | Product::UnitTests
                | Product::UiTests
                | Product::Watch2Extension
                | Product::Xpc
        )
    }

    pub fn supports_resources(self) -> bool {
        matches!(
            self,
            Product::App
                | Product::Framework
                | Product::UnitTests
                | Product::UiTests
                | Product::Bundle
                | Product::AppExtension
                | Product::Watch2App
                | Product::Watch2Extension
                | Product::TvTopShelfExtension
                | Product::MessagesExtension
                | Product::StickerPackExtension
                | Product::AppClip
        )
    }

    /// Products that may embed a target of this product as a companion.
    pub fn host_products(self) -> &'static [Product] {
        match self {
            Product::Watch2Extension => &[Product::Watch2App],
            Product::Watch2App
            | Product::AppExtension
            | Product::StickerPackExtension
            | Product::MessagesExtension
            | Product::TvTopShelfExtension
            | Product::AppClip
            | Product::Xpc => &[Product::App],
            _ => &[],
        }
    }

    /// File extension of the built product, if any.
    pub fn extension(self) -> Option<&'static str> {
        match self {
            Product::App | Product::AppClip | Product::Watch2App => Some("app"),
            Product::CommandLineTool => None,
            Product::Xpc => Some("xpc"),
            Product::StaticLibrary => Some("a"),
            Product::DynamicLibrary => Some("dylib"),
            Product::Framework | Product::StaticFramework => Some("framework"),
            Product::UnitTests | Product::UiTests => Some("xctest"),
            Product::Bundle => Some("bundle"),
            Product::AppExtension
            | Product::StickerPackExtension
            | Product::MessagesExtension
            | Product::TvTopShelfExtension
            | Product::Watch2Extension => Some("appex"),
        }
    }
}

/// Version requirement of a remote package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Requirement {
    UpToNextMajor(String),
    UpToNextMinor(String),
    Range { from: String, to: String },
    Exact(String),
    Branch(String),
    Revision(String),
}

/// A package declared by a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Package {
    Local { path: PathBuf },
    Remote { url: String, requirement: Requirement },
}

impl Package {
    /// Key the package is recorded under in the graph: its local path or remote URL.
    pub fn key(&self) -> String {
        match self {
            Package::Local { path } => path.display().to_string(),
            Package::Remote { url, .. } => url.clone(),
        }
    }
}

/// A dependency as declared on a target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TargetDependency {
    /// A target in the same project.
    Target { name: String },
    /// A target in another project.
    Project { target: String, path: PathBuf },
    Framework {
        path: PathBuf,
        #[serde(default)]
        dependencies: Vec<TargetDependency>,
    },
    Library {
        path: PathBuf,
        #[serde(rename = "publicHeaders")]
        public_headers: PathBuf,
        #[serde(default, rename = "swiftModuleMap")]
        swift_module_map: Option<PathBuf>,
    },
    #[serde(rename = "xcframework")]
    XCFramework {
        path: PathBuf,
        #[serde(default)]
        dependencies: Vec<TargetDependency>,
    },
    Sdk {
        name: String,
        #[serde(default)]
        status: SdkStatus,
    },
    Package { product: String },
    Xctest,
}

impl TargetDependency {
    pub fn target(name: impl Into<String>) -> Self {
        TargetDependency::Target { name: name.into() }
    }

    pub fn project(target: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        TargetDependency::Project {
            target: target.into(),
            path: path.into(),
        }
    }

    pub fn framework(path: impl Into<PathBuf>) -> Self {
        TargetDependency::Framework {
            path: path.into(),
            dependencies: Vec::new(),
        }
    }

    pub fn xcframework(path: impl Into<PathBuf>) -> Self {
        TargetDependency::XCFramework {
            path: path.into(),
            dependencies: Vec::new(),
        }
    }

    pub fn sdk(name: impl Into<String>, status: SdkStatus) -> Self {
        TargetDependency::Sdk {
            name: name.into(),
            status,
        }
    }

    pub fn package(product: impl Into<String>) -> Self {
        TargetDependency::Package {
            product: product.into(),
        }
    }

    /// Declarations nested under a precompiled artifact.
    pub fn nested(&self) -> &[TargetDependency] {
        match self {
            TargetDependency::Framework { dependencies, .. }
            | TargetDependency::XCFramework { dependencies, .. } => dependencies,
            _ => &[],
        }
    }
}

/// A buildable unit declared inside a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub name: String,
    pub platform: Platform,
    pub product: Product,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<TargetDependency>,
}

impl Target {
    pub fn new(name: impl Into<String>, platform: Platform, product: Product) -> Self {
        Target {
            name: name.into(),
            platform,
            product,
            product_name: None,
            bundle_id: None,
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<TargetDependency>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn product_name(&self) -> &str {
        self.product_name.as_deref().unwrap_or(&self.name)
    }

    /// Product file name, e.g. `Core.framework` or `libCore.a`.
    pub fn product_name_with_extension(&self) -> String {
        let name = self.product_name();
        match self.product {
            Product::StaticLibrary | Product::DynamicLibrary => {
                format!("lib{}.{}", name, self.product.extension().unwrap_or_default())
            }
            product => match product.extension() {
                Some(extension) => format!("{}.{}", name, extension),
                None => name.to_string(),
            },
        }
    }
}

/// A project: a directory holding targets and package declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub path: PathBuf,
    pub name: String,
    #[serde(default)]
    pub targets: Vec<Target>,
    #[serde(default)]
    pub packages: Vec<Package>,
}

impl Project {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>, targets: Vec<Target>) -> Self {
        Project {
            path: path.into(),
            name: name.into(),
            targets,
            packages: Vec::new(),
        }
    }

    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == name)
    }
}

/// A workspace grouping a list of project paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub path: PathBuf,
    pub name: String,
    #[serde(default)]
    pub projects: Vec<PathBuf>,
}

impl Workspace {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>, projects: Vec<PathBuf>) -> Self {
        Workspace {
            path: path.into(),
            name: name.into(),
            projects,
        }
    }
}
