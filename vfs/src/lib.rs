//! The VFS layer: a registry of named disk images with an at-most-one-
//! mounted invariant, dispatching file operations to whichever engine is
//! currently mounted.
//!
//! Grounded on `original_source/src/VFS.cpp` (`VFS::add_disk`, `mnt_disk`,
//! `umnt_disk`, `rm_disk`, `lst_disks`) and spec.md §4.3/§9 ("Polymorphism
//! over filesystem types", "Singletons" — this crate threads a `Registry`
//! value explicitly rather than reaching for a lazy global).

mod error;
mod fs;
mod registry;

pub mod proto;

pub use error::{VfsError, VfsResult};
pub use fs::FileSystem;
pub use registry::{DiskDescriptor, FsType, Registry};
