//! The fixed-size header at the start of every disk image.
//!
//! Layout and field meanings are grounded on `original_source/src/FAT32.h`'s
//! `metadata_t`/`superblock_t` structs, translated from the original's raw
//! host-byte-order struct dump into an explicit little-endian byte layout —
//! the original's "whatever `sizeof` says, however the host happens to pack
//! it" approach does not survive being written by one machine and read by
//! another, which is exactly the portability bug this crate fixes.

use crate::error::{FatError, FatResult};

/// Length of the fixed `disk_name` field, in bytes.
pub const DISK_NAME_LEN: usize = 10;

/// Serialized size of a `Superblock` on disk.
pub const SUPERBLOCK_LEN: usize = DISK_NAME_LEN + 4 * 7;

/// Knobs a caller can set when creating a new disk image. Everything else
/// (offsets, `user_space`) is derived.
#[derive(Debug, Clone, Copy)]
pub struct FatConfig {
    pub cluster_size: u32,
    pub total_size: u32,
}

impl Default for FatConfig {
    fn default() -> Self {
        // 2 KiB clusters, 100 MiB image, matching the original's
        // `CLUSTER_SIZE`/`STORAGE_SIZE` defaults.
        Self {
            cluster_size: 2 * 1024,
            total_size: 100 * 1024 * 1024,
        }
    }
}

/// The disk image's header: geometry plus the three region offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Superblock {
    pub disk_name: [u8; DISK_NAME_LEN],
    pub total_size: u32,
    pub cluster_size: u32,
    pub cluster_count: u32,
    pub user_space: u32,
    pub superblock_offset: u32,
    pub fat_offset: u32,
    pub root_offset: u32,
}

impl Superblock {
    /// Builds a fresh superblock for `disk_name` from `config`, deriving
    /// `cluster_count` and the three region offsets.
    pub fn new(disk_name: &str, config: FatConfig) -> FatResult<Self> {
        if config.cluster_size == 0 {
            return Err(FatError::OutOfRange {
                what: "cluster_size",
                limit: 0,
            });
        }

        let fat_offset = SUPERBLOCK_LEN as u32;
        // One tentative FAT sizing pass, then fixed point: the FAT's own
        // size does not depend on the cluster count it stores, once we
        // budget the image as superblock + FAT + (cluster_count clusters).
        let cluster_count =
            clusters_that_fit(config.total_size, fat_offset, config.cluster_size);
        let fat_len = cluster_count * 4;
        let root_offset = fat_offset + fat_len;
        let user_space = config.total_size.saturating_sub(fat_offset + fat_len);

        Ok(Self {
            disk_name: encode_fixed_name(disk_name)?,
            total_size: config.total_size,
            cluster_size: config.cluster_size,
            cluster_count,
            user_space,
            superblock_offset: 0,
            fat_offset,
            root_offset,
        })
    }

    pub fn to_bytes(&self) -> [u8; SUPERBLOCK_LEN] {
        let mut out = [0u8; SUPERBLOCK_LEN];
        let mut off = 0;
        out[off..off + DISK_NAME_LEN].copy_from_slice(&self.disk_name);
        off += DISK_NAME_LEN;
        for field in [
            self.total_size,
            self.cluster_size,
            self.cluster_count,
            self.user_space,
            self.superblock_offset,
            self.fat_offset,
            self.root_offset,
        ] {
            out[off..off + 4].copy_from_slice(&field.to_le_bytes());
            off += 4;
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> FatResult<Self> {
        if bytes.len() < SUPERBLOCK_LEN {
            return Err(FatError::NotFat32);
        }
        let mut disk_name = [0u8; DISK_NAME_LEN];
        disk_name.copy_from_slice(&bytes[0..DISK_NAME_LEN]);

        let mut off = DISK_NAME_LEN;
        let mut next_u32 = || {
            let v = u32::from_le_bytes(bytes[off..off + 4].try_into().unwrap());
            off += 4;
            v
        };

        let sb = Self {
            disk_name,
            total_size: next_u32(),
            cluster_size: next_u32(),
            cluster_count: next_u32(),
            user_space: next_u32(),
            superblock_offset: next_u32(),
            fat_offset: next_u32(),
            root_offset: next_u32(),
        };

        if sb.cluster_size == 0 || sb.fat_offset < SUPERBLOCK_LEN as u32 {
            return Err(FatError::NotFat32);
        }
        Ok(sb)
    }

    pub fn disk_name_str(&self) -> String {
        decode_fixed_name(&self.disk_name)
    }
}

/// Number of whole clusters that fit after `fat_offset` once the FAT itself
/// (4 bytes per cluster) is budgeted out of `total_size`.
fn clusters_that_fit(total_size: u32, fat_offset: u32, cluster_size: u32) -> u32 {
    let available = total_size.saturating_sub(fat_offset) as u64;
    // available = cluster_count * 4 + cluster_count * cluster_size
    let per_cluster = 4 + cluster_size as u64;
    (available / per_cluster) as u32
}

fn encode_fixed_name(name: &str) -> FatResult<[u8; DISK_NAME_LEN]> {
    if name.len() > DISK_NAME_LEN {
        return Err(FatError::OutOfRange {
            what: "disk_name",
            limit: DISK_NAME_LEN,
        });
    }
    let mut out = [0u8; DISK_NAME_LEN];
    out[..name.len()].copy_from_slice(name.as_bytes());
    Ok(out)
}

fn decode_fixed_name(raw: &[u8; DISK_NAME_LEN]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}
