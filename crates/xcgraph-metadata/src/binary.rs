//! Mach-O and `ar` inspection of precompiled binaries

use std::path::Path;

use object::read::archive::ArchiveFile;
use object::macho;
use object::read::macho::{FatArch, MachHeader, MachOFatFile32, MachOFatFile64};
use object::{Architecture, Endianness, FileKind, Object, ObjectKind, SubArchitecture};
use tracing::debug;
use xcgraph_core::{BinaryArchitecture, BinaryLinking};

use crate::error::MetadataError;

/// What the graph needs from a binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryInfo {
    pub architectures: Vec<BinaryArchitecture>,
    pub linking: BinaryLinking,
    /// `LC_UUID` of every Mach-O slice, in slice order.
    pub uuids: Vec<[u8; 16]>,
}

/// Read and inspect the binary at `path`.
pub fn read(path: &Path) -> Result<BinaryInfo, MetadataError> {
    let data = std::fs::read(path).map_err(|err| {
        debug!(path = %path.display(), error = %err, "binary unreadable");
        MetadataError::MetadataNotFound(path.to_path_buf())
    })?;
    inspect(&data).map_err(|err| {
        debug!(path = %path.display(), error = %err, "binary not parseable");
        MetadataError::MetadataNotFound(path.to_path_buf())
    })
}

/// Inspect a thin or fat Mach-O, or an `ar` archive of Mach-O objects.
///
/// Linking is dynamic as soon as one slice is a dylib.
pub fn inspect(data: &[u8]) -> object::Result<BinaryInfo> {
    let mut architectures = Vec::new();
    let mut uuids = Vec::new();
    let mut dynamic = false;

    for slice in slices(data)? {
        match FileKind::parse(slice)? {
            FileKind::Archive => architectures.extend(archive_architecture(slice)?),
            _ => {
                let file = object::File::parse(slice)?;
                architectures.extend(map_architecture(&file, slice));
                dynamic |= file.kind() == ObjectKind::Dynamic;
                uuids.extend(file.mach_uuid()?);
            }
        }
    }

    architectures.sort();
    architectures.dedup();

    Ok(BinaryInfo {
        architectures,
        linking: if dynamic { BinaryLinking::Dynamic } else { BinaryLinking::Static },
        uuids,
    })
}

fn slices(data: &[u8]) -> object::Result<Vec<&[u8]>> {
    match FileKind::parse(data)? {
        FileKind::MachOFat32 => MachOFatFile32::parse(data)?
            .arches()
            .iter()
            .map(|arch| arch.data(data))
            .collect(),
        FileKind::MachOFat64 => MachOFatFile64::parse(data)?
            .arches()
            .iter()
            .map(|arch| arch.data(data))
            .collect(),
        _ => Ok(vec![data]),
    }
}

/// Architecture of the first member that parses as an object file.
fn archive_architecture(data: &[u8]) -> object::Result<Option<BinaryArchitecture>> {
    let archive = ArchiveFile::parse(data)?;
    for member in archive.members() {
        let member = member?;
        // Symbol tables and other non-object members are skipped.
        let member = member.data(data)?;
        let Ok(file) = object::File::parse(member) else {
            continue;
        };
        if let Some(arch) = map_architecture(&file, member) {
            return Ok(Some(arch));
        }
    }
    Ok(None)
}

fn map_architecture(file: &object::File<'_>, data: &[u8]) -> Option<BinaryArchitecture> {
    match (file.architecture(), file.sub_architecture()) {
        (Architecture::Aarch64, Some(SubArchitecture::Arm64E)) => Some(BinaryArchitecture::Arm64e),
        (Architecture::Aarch64, _) => Some(BinaryArchitecture::Arm64),
        (Architecture::Aarch64_Ilp32, _) => Some(BinaryArchitecture::Arm64_32),
        (Architecture::X86_64, _) => Some(BinaryArchitecture::X86_64),
        (Architecture::I386, _) => Some(BinaryArchitecture::I386),
        (Architecture::Arm, _) => Some(match cpu_subtype(data) {
            Some(macho::CPU_SUBTYPE_ARM_V7S) => BinaryArchitecture::Armv7s,
            Some(macho::CPU_SUBTYPE_ARM_V7K) => BinaryArchitecture::Armv7k,
            _ => BinaryArchitecture::Armv7,
        }),
        _ => None,
    }
}

/// `cpusubtype` of a thin Mach-O header, capability bits masked off.
fn cpu_subtype(data: &[u8]) -> Option<u32> {
    let subtype = match FileKind::parse(data).ok()? {
        FileKind::MachO32 => {
            let header = macho::MachHeader32::<Endianness>::parse(data, 0).ok()?;
            header.cpusubtype(header.endian().ok()?)
        }
        FileKind::MachO64 => {
            let header = macho::MachHeader64::<Endianness>::parse(data, 0).ok()?;
            header.cpusubtype(header.endian().ok()?)
        }
        _ => return None,
    };
    Some(subtype & !macho::CPU_SUBTYPE_MASK)
}

/// Uppercase, hyphenated form used for `.bcsymbolmap` file names.
pub fn format_uuid(uuid: &[u8; 16]) -> String {
    let hex: String = uuid.iter().map(|b| format!("{:02X}", b)).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}
