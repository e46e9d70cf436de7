//! Graph node kinds and the binary metadata they carry

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How other binaries link against a precompiled binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryLinking {
    Static,
    Dynamic,
}

/// CPU architecture slice of a precompiled binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BinaryArchitecture {
    #[serde(rename = "x86_64")]
    X86_64,
    #[serde(rename = "i386")]
    I386,
    #[serde(rename = "arm64")]
    Arm64,
    #[serde(rename = "arm64e")]
    Arm64e,
    #[serde(rename = "arm64_32")]
    Arm64_32,
    #[serde(rename = "armv7")]
    Armv7,
    #[serde(rename = "armv7s")]
    Armv7s,
    #[serde(rename = "armv7k")]
    Armv7k,
}

impl BinaryArchitecture {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryArchitecture::X86_64 => "x86_64",
            BinaryArchitecture::I386 => "i386",
            BinaryArchitecture::Arm64 => "arm64",
            BinaryArchitecture::Arm64e => "arm64e",
            BinaryArchitecture::Arm64_32 => "arm64_32",
            BinaryArchitecture::Armv7 => "armv7",
            BinaryArchitecture::Armv7s => "armv7s",
            BinaryArchitecture::Armv7k => "armv7k",
        }
    }
}

impl FromStr for BinaryArchitecture {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x86_64" => Ok(BinaryArchitecture::X86_64),
            "i386" => Ok(BinaryArchitecture::I386),
            "arm64" => Ok(BinaryArchitecture::Arm64),
            "arm64e" => Ok(BinaryArchitecture::Arm64e),
            "arm64_32" => Ok(BinaryArchitecture::Arm64_32),
            "armv7" => Ok(BinaryArchitecture::Armv7),
            "armv7s" => Ok(BinaryArchitecture::Armv7s),
            "armv7k" => Ok(BinaryArchitecture::Armv7k),
            other => Err(format!("unknown architecture '{}'", other)),
        }
    }
}

impl fmt::Display for BinaryArchitecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an SDK must be present at launch or is weakly linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdkStatus {
    #[default]
    Required,
    Optional,
}

/// Where an SDK lives: the platform SDK or the developer directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdkSource {
    System,
    Developer,
}

/// One entry of an xcframework's `AvailableLibraries`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct XCFrameworkLibrary {
    #[serde(rename = "LibraryIdentifier")]
    pub identifier: String,
    #[serde(rename = "LibraryPath")]
    pub path: PathBuf,
    #[serde(rename = "SupportedArchitectures")]
    pub architectures: Vec<BinaryArchitecture>,
    #[serde(rename = "SupportedPlatform", default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(
        rename = "SupportedPlatformVariant",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub platform_variant: Option<String>,
}

impl XCFrameworkLibrary {
    /// Binary path relative to the xcframework root.
    pub fn binary_path(&self, xcframework: &Path) -> PathBuf {
        let library = xcframework.join(&self.identifier).join(&self.path);
        let is_framework = self.path.extension().is_some_and(|e| e == "framework");
        match self.path.file_stem() {
            Some(stem) if is_framework => library.join(stem),
            _ => library,
        }
    }
}

/// The decoded `Info.plist` of an xcframework.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct XCFrameworkInfoPlist {
    #[serde(rename = "AvailableLibraries")]
    pub libraries: Vec<XCFrameworkLibrary>,
}

/// A node in the dependency graph.
///
/// Equality and hashing are structural over every field, including the
/// optional ones, so two artifacts only collapse into one node when all of
/// their metadata agrees.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Node {
    // ── Built from source ───────────────────────────────────
    Target {
        name: String,
        path: PathBuf,
    },

    // ── Precompiled ─────────────────────────────────────────
    Framework {
        path: PathBuf,
        binary_path: PathBuf,
        dsym_path: Option<PathBuf>,
        bcsymbolmap_paths: Vec<PathBuf>,
        linking: BinaryLinking,
        architectures: Vec<BinaryArchitecture>,
        is_carthage: bool,
    },
    Library {
        path: PathBuf,
        public_headers: PathBuf,
        linking: BinaryLinking,
        architectures: Vec<BinaryArchitecture>,
        swift_module_map: Option<PathBuf>,
    },
    #[serde(rename = "xcframework")]
    XCFramework {
        path: PathBuf,
        info_plist: XCFrameworkInfoPlist,
        primary_binary_path: PathBuf,
        linking: BinaryLinking,
    },

    // ── External ────────────────────────────────────────────
    PackageProduct {
        path: PathBuf,
        product: String,
    },
    Sdk {
        name: String,
        path: PathBuf,
        status: SdkStatus,
        source: SdkSource,
    },
}

impl Node {
    pub fn target(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Node::Target {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Node::Target { path, .. }
            | Node::Framework { path, .. }
            | Node::Library { path, .. }
            | Node::XCFramework { path, .. }
            | Node::PackageProduct { path, .. }
            | Node::Sdk { path, .. } => path,
        }
    }

    /// Linking of a precompiled node; `None` for every other kind.
    pub fn linking(&self) -> Option<BinaryLinking> {
        match self {
            Node::Framework { linking, .. }
            | Node::Library { linking, .. }
            | Node::XCFramework { linking, .. } => Some(*linking),
            Node::Target { .. } | Node::PackageProduct { .. } | Node::Sdk { .. } => None,
        }
    }

    pub fn is_target(&self) -> bool {
        matches!(self, Node::Target { .. })
    }

    pub fn is_sdk(&self) -> bool {
        matches!(self, Node::Sdk { .. })
    }

    pub fn is_library(&self) -> bool {
        matches!(self, Node::Library { .. })
    }

    pub fn is_precompiled(&self) -> bool {
        self.linking().is_some()
    }

    pub fn is_precompiled_static(&self) -> bool {
        self.linking() == Some(BinaryLinking::Static)
    }

    /// Dynamic framework, xcframework or library.
    pub fn is_precompiled_dynamic(&self) -> bool {
        self.linking() == Some(BinaryLinking::Dynamic)
    }

    /// Dynamic framework or xcframework: the precompiled kinds that get embedded.
    pub fn is_precompiled_dynamic_framework(&self) -> bool {
        matches!(
            self,
            Node::Framework { linking: BinaryLinking::Dynamic, .. }
                | Node::XCFramework { linking: BinaryLinking::Dynamic, .. }
        )
    }

    pub fn is_framework_like(&self) -> bool {
        matches!(self, Node::Framework { .. } | Node::XCFramework { .. })
    }

    /// The `(name, project path)` pair of a target node.
    pub fn as_target(&self) -> Option<(&str, &Path)> {
        match self {
            Node::Target { name, path } => Some((name, path)),
            _ => None,
        }
    }
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Target { name, .. } => write!(f, "target '{}'", name),
            Node::Framework { path, .. } => write!(f, "framework '{}'", basename(path)),
            Node::Library { path, .. } => write!(f, "library '{}'", basename(path)),
            Node::XCFramework { path, .. } => write!(f, "xcframework '{}'", basename(path)),
            Node::PackageProduct { product, .. } => write!(f, "package '{}'", product),
            Node::Sdk { name, .. } => write!(f, "sdk '{}'", name),
        }
    }
}
