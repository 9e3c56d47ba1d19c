//! Block storage usage collector.
//!
//! Physical block devices are discovered from a disk-by-path directory
//! (`/dev/disk/by-path`), matched against the live mount table and queried
//! with `statvfs` for used and total bytes.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::error::ReadError;

/// Usage of one mounted block device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageDevice {
    pub device: String,
    pub total: u64,
    pub used: u64,
    pub fraction: f64,
}

/// One row of the mount table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub fsname: String,
    pub dir: String,
    pub fstype: String,
}

/// Block counts returned by `statvfs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsBlocks {
    pub blocks: u64,
    pub free_blocks: u64,
    pub fragment_size: u64,
}

impl FsBlocks {
    /// Used = total − free blocks × fragment size.
    pub fn usage(&self, device: &str) -> StorageDevice {
        let total = self.blocks * self.fragment_size;
        let used = total.saturating_sub(self.free_blocks * self.fragment_size);
        let fraction = if total == 0 {
            0.0
        } else {
            used as f64 / total as f64
        };
        StorageDevice {
            device: device.to_string(),
            total,
            used,
            fraction,
        }
    }
}

/// Decodes the octal escapes (`\040` for space etc.) used in mount tables.
fn unescape_mount_field(field: &str) -> String {
    if !field.contains('\\') {
        return field.to_string();
    }
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() {
            let oct = &bytes[i + 1..i + 4];
            if oct.iter().all(|b| (b'0'..=b'7').contains(b)) {
                let v = oct.iter().fold(0u32, |acc, b| acc * 8 + (b - b'0') as u32);
                out.push(v as u8);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Parses a /proc/mounts-shaped table.
pub fn parse_mounts(content: &str) -> Vec<MountEntry> {
    content
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let fsname = parts.next()?;
            let dir = parts.next()?;
            let fstype = parts.next()?;
            Some(MountEntry {
                fsname: unescape_mount_field(fsname),
                dir: unescape_mount_field(dir),
                fstype: fstype.to_string(),
            })
        })
        .collect()
}

/// Lists device names under a disk-by-path directory.
///
/// Symlinks resolve to their target's file name (`../../sda1` → `sda1`);
/// plain entries use their own name.
pub fn list_block_devices(by_path: &Path) -> Result<Vec<String>, ReadError> {
    let entries = fs::read_dir(by_path).map_err(|e| ReadError::unavailable(by_path, e))?;

    let mut devices: Vec<String> = entries
        .flatten()
        .filter_map(|entry| {
            let path = entry.path();
            let resolved = match fs::read_link(&path) {
                Ok(target) => target,
                Err(_) => path,
            };
            resolved
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .collect();

    devices.sort();
    devices.dedup();
    Ok(devices)
}

/// Matches devices to mount entries; the first mount of each device wins.
pub fn match_mounts<'a>(
    devices: &[String],
    mounts: &'a [MountEntry],
) -> Vec<(String, &'a MountEntry)> {
    let mut matched: BTreeMap<String, &MountEntry> = BTreeMap::new();
    for mount in mounts {
        for device in devices {
            if mount.fsname == format!("/dev/{}", device) && !matched.contains_key(device) {
                matched.insert(device.clone(), mount);
            }
        }
    }
    matched.into_iter().collect()
}

/// Gets block counts for a mount point using libc statvfs.
pub fn statvfs_blocks(path: &str) -> Result<FsBlocks, ReadError> {
    use std::ffi::CString;
    use std::mem;

    let c_path = CString::new(path)
        .map_err(|e| ReadError::malformed("mount point", format!("{}: {}", path, e)))?;

    // SAFETY: statvfs only writes into the zeroed struct we own, and c_path
    // is a valid NUL-terminated string for the duration of the call.
    unsafe {
        let mut stat: libc::statvfs = mem::zeroed();
        if libc::statvfs(c_path.as_ptr(), &mut stat) != 0 {
            return Err(ReadError::unavailable(
                Path::new(path),
                std::io::Error::last_os_error(),
            ));
        }

        Ok(FsBlocks {
            blocks: stat.f_blocks as u64,
            free_blocks: stat.f_bfree as u64,
            fragment_size: stat.f_frsize as u64,
        })
    }
}

/// Rebuilds the storage list, sorted by device name.
///
/// A device whose mount point cannot be queried is skipped with a warning.
pub fn read_storages(by_path: &Path, mounts_path: &Path) -> Result<Vec<StorageDevice>, ReadError> {
    let devices = list_block_devices(by_path)?;
    let content =
        fs::read_to_string(mounts_path).map_err(|e| ReadError::unavailable(mounts_path, e))?;
    let mounts = parse_mounts(&content);

    let mut storages = Vec::new();
    for (device, mount) in match_mounts(&devices, &mounts) {
        match statvfs_blocks(&mount.dir) {
            Ok(blocks) => storages.push(blocks.usage(&device)),
            Err(e) => warn!("Could not get stats about storage {}: {}", device, e),
        }
    }
    Ok(storages)
}
