//! Unit tests for xcgraph-metadata

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use xcgraph_core::{BinaryArchitecture, BinaryLinking, Node, XCFrameworkInfoPlist, XCFrameworkLibrary};

use crate::binary::{self, format_uuid};
use crate::cache::MetadataCache;
use crate::error::MetadataError;
use crate::providers::framework::FrameworkMetadataProvider;
use crate::providers::library::LibraryMetadataProvider;
use crate::providers::xcframework::XCFrameworkMetadataProvider;
use crate::providers::{FrameworkMetadataProviding, LibraryMetadataProviding, XCFrameworkMetadataProviding};

const CPU_TYPE_ARM64: u32 = 0x0100_000c;
const CPU_TYPE_X86_64: u32 = 0x0100_0007;
const CPU_TYPE_ARM: u32 = 12;
const CPU_SUBTYPE_ARM_V7: u32 = 9;
const CPU_SUBTYPE_ARM_V7S: u32 = 11;
const CPU_SUBTYPE_ARM_V7K: u32 = 12;
const MH_OBJECT: u32 = 0x1;
const MH_DYLIB: u32 = 0x6;
const LC_UUID: u32 = 0x1b;

const UUID: [u8; 16] = [
    0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde, 0xf0, 0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef,
];

// ── Fixtures ────────────────────────────────────────────────

/// A 64-bit Mach-O with a single `LC_UUID` load command.
fn macho(cputype: u32, filetype: u32, uuid: [u8; 16]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for word in [0xfeed_facf, cputype, 0, filetype, 1, 24, 0, 0] {
        bytes.extend_from_slice(&u32::to_le_bytes(word));
    }
    bytes.extend_from_slice(&LC_UUID.to_le_bytes());
    bytes.extend_from_slice(&24u32.to_le_bytes());
    bytes.extend_from_slice(&uuid);
    bytes
}

/// A universal binary wrapping the given slices.
fn fat(slices: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&0xcafe_babe_u32.to_be_bytes());
    bytes.extend_from_slice(&(slices.len() as u32).to_be_bytes());

    let mut offset = 256u32;
    let mut layout = Vec::new();
    for (cputype, slice) in slices {
        for word in [*cputype, 0, offset, slice.len() as u32, 3] {
            bytes.extend_from_slice(&word.to_be_bytes());
        }
        layout.push((offset as usize, slice));
        offset += 256;
    }
    for (offset, slice) in layout {
        bytes.resize(offset, 0);
        bytes.extend_from_slice(slice);
    }
    bytes
}

/// An `ar` archive with one object member.
fn archive(member: &[u8]) -> Vec<u8> {
    let mut bytes = b"!<arch>\n".to_vec();
    let header = format!(
        "{:<16}{:<12}{:<6}{:<6}{:<8}{:<10}`\n",
        "Core.o",
        0,
        0,
        0,
        644,
        member.len()
    );
    bytes.extend_from_slice(header.as_bytes());
    bytes.extend_from_slice(member);
    if member.len() % 2 == 1 {
        bytes.push(b'\n');
    }
    bytes
}

fn write(path: &Path, bytes: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, bytes).unwrap();
}

fn dylib() -> Vec<u8> {
    macho(CPU_TYPE_ARM64, MH_DYLIB, UUID)
}

fn static_archive() -> Vec<u8> {
    archive(&macho(CPU_TYPE_ARM64, MH_OBJECT, UUID))
}

// ── Binary inspection ───────────────────────────────────────

#[test]
fn test_inspect_thin_dylib() {
    let info = binary::inspect(&dylib()).unwrap();
    assert_eq!(info.architectures, vec![BinaryArchitecture::Arm64]);
    assert_eq!(info.linking, BinaryLinking::Dynamic);
    assert_eq!(info.uuids, vec![UUID]);
}

#[test]
fn test_inspect_fat_dylib() {
    let mut other = UUID;
    other[0] = 0xff;
    let data = fat(&[
        (CPU_TYPE_X86_64, macho(CPU_TYPE_X86_64, MH_DYLIB, other)),
        (CPU_TYPE_ARM64, macho(CPU_TYPE_ARM64, MH_DYLIB, UUID)),
    ]);

    let info = binary::inspect(&data).unwrap();
    assert_eq!(
        info.architectures,
        vec![BinaryArchitecture::X86_64, BinaryArchitecture::Arm64]
    );
    assert_eq!(info.linking, BinaryLinking::Dynamic);
    assert_eq!(info.uuids.len(), 2);
}

#[test]
fn test_inspect_static_archive() {
    let info = binary::inspect(&static_archive()).unwrap();
    assert_eq!(info.architectures, vec![BinaryArchitecture::Arm64]);
    assert_eq!(info.linking, BinaryLinking::Static);
}

/// A 32-bit ARM Mach-O dylib with the given cpu subtype and no load commands.
fn macho_arm32(cpusubtype: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    for word in [0xfeed_face, CPU_TYPE_ARM, cpusubtype, MH_DYLIB, 0, 0, 0] {
        bytes.extend_from_slice(&u32::to_le_bytes(word));
    }
    bytes
}

#[test]
fn test_inspect_distinguishes_armv7_variants() {
    let data = fat(&[
        (CPU_TYPE_ARM, macho_arm32(CPU_SUBTYPE_ARM_V7)),
        (CPU_TYPE_ARM, macho_arm32(CPU_SUBTYPE_ARM_V7S)),
    ]);
    let info = binary::inspect(&data).unwrap();
    assert_eq!(
        info.architectures,
        vec![BinaryArchitecture::Armv7, BinaryArchitecture::Armv7s]
    );

    let watch = binary::inspect(&macho_arm32(CPU_SUBTYPE_ARM_V7K)).unwrap();
    assert_eq!(watch.architectures, vec![BinaryArchitecture::Armv7k]);
    assert_eq!(watch.linking, BinaryLinking::Dynamic);
}

#[test]
fn test_inspect_rejects_garbage() {
    assert!(binary::inspect(b"definitely not a binary").is_err());
}

#[test]
fn test_format_uuid() {
    assert_eq!(format_uuid(&UUID), "12345678-9ABC-DEF0-0123-456789ABCDEF");
}

// ── Framework provider ──────────────────────────────────────

#[tokio::test]
async fn test_framework_metadata() {
    let dir = TempDir::new().unwrap();
    let build = dir.path().join("Carthage/Build/iOS");
    let framework = build.join("Core.framework");
    write(&framework.join("Core"), &dylib());
    fs::create_dir_all(build.join("Core.framework.dSYM")).unwrap();
    let symbol_map = build.join("12345678-9ABC-DEF0-0123-456789ABCDEF.bcsymbolmap");
    write(&symbol_map, b"");

    let metadata = FrameworkMetadataProvider::new().load_metadata(&framework).await.unwrap();

    assert_eq!(metadata.binary_path, framework.join("Core"));
    assert_eq!(metadata.dsym_path, Some(build.join("Core.framework.dSYM")));
    assert_eq!(metadata.bcsymbolmap_paths, vec![symbol_map]);
    assert_eq!(metadata.linking, BinaryLinking::Dynamic);
    assert_eq!(metadata.architectures, vec![BinaryArchitecture::Arm64]);
    assert!(metadata.is_carthage);

    let node: Node = metadata.into();
    assert!(node.is_precompiled_dynamic_framework());
}

#[tokio::test]
async fn test_framework_without_companions() {
    let dir = TempDir::new().unwrap();
    let framework = dir.path().join("Static.framework");
    write(&framework.join("Static"), &static_archive());

    let metadata = FrameworkMetadataProvider::new().load_metadata(&framework).await.unwrap();

    assert_eq!(metadata.dsym_path, None);
    assert!(metadata.bcsymbolmap_paths.is_empty());
    assert_eq!(metadata.linking, BinaryLinking::Static);
    assert!(!metadata.is_carthage);
}

#[tokio::test]
async fn test_framework_not_found() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("Missing.framework");

    let err = FrameworkMetadataProvider::new().load_metadata(&missing).await.unwrap_err();
    assert!(matches!(err, MetadataError::FrameworkNotFound(ref path) if *path == missing));
}

#[tokio::test]
async fn test_framework_without_binary() {
    let dir = TempDir::new().unwrap();
    let framework = dir.path().join("Empty.framework");
    fs::create_dir_all(&framework).unwrap();

    let err = FrameworkMetadataProvider::new().load_metadata(&framework).await.unwrap_err();
    assert!(matches!(err, MetadataError::MetadataNotFound(ref path) if *path == framework.join("Empty")));
}

// ── Library provider ────────────────────────────────────────

#[tokio::test]
async fn test_library_metadata() {
    let dir = TempDir::new().unwrap();
    let library = dir.path().join("libCore.a");
    write(&library, &static_archive());
    let headers = dir.path().join("include");
    let module_map = dir.path().join("Core.swiftmodule");

    let metadata = LibraryMetadataProvider::new()
        .load_metadata(&library, &headers, Some(&module_map))
        .await
        .unwrap();

    assert_eq!(metadata.public_headers, headers);
    assert_eq!(metadata.swift_module_map, Some(module_map));
    assert_eq!(metadata.linking, BinaryLinking::Static);
}

#[tokio::test]
async fn test_library_not_found() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("libMissing.a");

    let err = LibraryMetadataProvider::new()
        .load_metadata(&missing, dir.path(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, MetadataError::LibraryNotFound(_)));
    assert_eq!(err.path(), Some(missing.as_path()));
}

// ── XCFramework provider ────────────────────────────────────

fn library(identifier: &str, architectures: Vec<BinaryArchitecture>) -> XCFrameworkLibrary {
    XCFrameworkLibrary {
        identifier: identifier.to_string(),
        path: PathBuf::from("Core.framework"),
        architectures,
        platform: Some("ios".to_string()),
        platform_variant: None,
    }
}

#[tokio::test]
async fn test_xcframework_prefers_arm64_slice() {
    let dir = TempDir::new().unwrap();
    let xcframework = dir.path().join("Core.xcframework");
    let info_plist = XCFrameworkInfoPlist {
        libraries: vec![
            library("ios-x86_64-simulator", vec![BinaryArchitecture::X86_64]),
            library("ios-arm64", vec![BinaryArchitecture::Arm64]),
        ],
    };
    fs::create_dir_all(&xcframework).unwrap();
    plist::to_file_xml(xcframework.join("Info.plist"), &info_plist).unwrap();
    let binary = xcframework.join("ios-arm64/Core.framework/Core");
    write(&binary, &dylib());

    let metadata = XCFrameworkMetadataProvider::new().load_metadata(&xcframework).await.unwrap();

    assert_eq!(metadata.primary_binary_path, binary);
    assert_eq!(metadata.linking, BinaryLinking::Dynamic);
    assert_eq!(metadata.info_plist, info_plist);
}

#[tokio::test]
async fn test_xcframework_errors() {
    let dir = TempDir::new().unwrap();
    let provider = XCFrameworkMetadataProvider::new();

    let missing = dir.path().join("Missing.xcframework");
    let err = provider.load_metadata(&missing).await.unwrap_err();
    assert!(matches!(err, MetadataError::XCFrameworkNotFound(_)));

    let no_plist = dir.path().join("NoPlist.xcframework");
    fs::create_dir_all(&no_plist).unwrap();
    let err = provider.load_metadata(&no_plist).await.unwrap_err();
    assert!(matches!(err, MetadataError::InfoPlistNotFound(_)));

    let bad_plist = dir.path().join("Bad.xcframework");
    write(&bad_plist.join("Info.plist"), b"not a plist");
    let err = provider.load_metadata(&bad_plist).await.unwrap_err();
    assert!(matches!(err, MetadataError::InvalidInfoPlist { .. }));

    let empty = dir.path().join("Empty.xcframework");
    fs::create_dir_all(&empty).unwrap();
    plist::to_file_xml(empty.join("Info.plist"), &XCFrameworkInfoPlist { libraries: Vec::new() }).unwrap();
    let err = provider.load_metadata(&empty).await.unwrap_err();
    assert!(matches!(err, MetadataError::InvalidInfoPlist { .. }));
}

// ── Cache ───────────────────────────────────────────────────

#[test]
fn test_cache_first_insert_wins_and_counts_lookups() {
    let cache = MetadataCache::new();
    let path = PathBuf::from("/Frameworks/A.framework");
    let first = Node::Library {
        path: path.clone(),
        public_headers: PathBuf::from("/a"),
        linking: BinaryLinking::Static,
        architectures: Vec::new(),
        swift_module_map: None,
    };
    let mut second = first.clone();
    if let Node::Library { public_headers, .. } = &mut second {
        *public_headers = PathBuf::from("/b");
    }

    assert!(cache.get(&path).is_none());
    cache.insert(path.clone(), first.clone());
    cache.insert(path.clone(), second);
    assert_eq!(cache.get(&path), Some(first));
    assert_eq!(cache.len(), 1);

    let stats = cache.stats();
    assert_eq!((stats.entries, stats.hits, stats.misses), (1, 1, 1));
}
