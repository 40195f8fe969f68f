//! Error taxonomy for the FAT32-style on-disk engine.
//!
//! `DiskError` covers host file I/O; `FatError` wraps it and adds every
//! engine-level failure kind named in the spec (no-space, not-found, corrupt
//! chain, ...). Library code never panics or unwraps its way past a failure
//! here — every fallible path returns one of these.

use std::io;

/// Failures from the byte-oriented `Disk` layer.
#[derive(Debug, thiserror::Error)]
pub enum DiskError {
    #[error("host I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("seek offset {offset} is out of bounds for a {len}-byte image")]
    SeekOutOfBounds { offset: u64, len: u64 },
}

/// Failures from the FAT engine (superblock, FAT, directories, files).
#[derive(Debug, thiserror::Error)]
pub enum FatError {
    #[error(transparent)]
    Disk(#[from] DiskError),

    #[error("not enough free clusters to complete the operation")]
    NoSpace,

    #[error("no entry named {0:?} in the current directory")]
    NotFound(String),

    #[error("an entry named {0:?} already exists")]
    AlreadyExists(String),

    #[error("{0:?} is not a directory")]
    NotADirectory(String),

    #[error("{0:?} is not a file")]
    NotAFile(String),

    #[error("directory {0:?} is not empty")]
    DirectoryNotEmpty(String),

    #[error("corrupt cluster chain: hit a bad or unallocated link before EOF")]
    CorruptChain,

    #[error("{what} exceeds the {limit}-byte fixed field")]
    OutOfRange { what: &'static str, limit: usize },

    #[error("the image on disk is not a recognized FAT32-style volume")]
    NotFat32,
}

pub type DiskResult<T> = Result<T, DiskError>;
pub type FatResult<T> = Result<T, FatError>;
