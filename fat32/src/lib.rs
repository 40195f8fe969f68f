//! A FAT32-style on-disk engine: superblock, FAT chaining, cluster
//! allocation, and directories spanning multiple clusters, stored in a
//! single fixed-size host file.
//!
//! This is not bit-compatible with Microsoft FAT32 — it borrows the shape
//! (a file allocation table chaining fixed-size clusters) without the BIOS
//! Parameter Block or short-name encoding a real FAT32 volume needs. Layout
//! is little-endian and field-by-field serialized (no `#[repr(packed)]` +
//! transmute), so an image written on one machine reads back identically on
//! any other.
//!
//! `FatEngine` is the single entry point: it owns the superblock, the FAT,
//! and a cursor onto the current directory, and exposes the path-operation
//! surface (`mkdir`, `cd`, `ls`, `touch`, `cat`, `rm`, `mv`, `cp`) that a VFS
//! layer or CLI dispatches to.

mod dir;
mod disk;
mod engine;
mod error;
mod fat;
mod superblock;

pub use dir::{
    DirEntry, DirHeader, Directory, DIR_ENTRY_LEN, DIR_HEADER_LEN, DIR_NAME_LEN, NO_CLUSTER,
};
pub use disk::{Disk, FileDisk};
pub use engine::FatEngine;
pub use error::{DiskError, DiskResult, FatError, FatResult};
pub use fat::{FatTable, ALLOCATED, BAD, EOF, UNALLOCATED};
pub use superblock::{FatConfig, Superblock, DISK_NAME_LEN, SUPERBLOCK_LEN};
