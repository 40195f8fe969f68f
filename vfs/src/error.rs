//! VFS registry error taxonomy. Wraps `fat32_core::FatError` so a dispatch
//! failure inside the mounted engine and a registry-state failure (wrong
//! mount transition, unknown disk) share one `Result` type at the CLI
//! boundary.

use fat32_core::FatError;

#[derive(Debug, thiserror::Error)]
pub enum VfsError {
    #[error("no disk is currently mounted")]
    NotMounted,

    #[error("a disk is already mounted; unmount it first")]
    AlreadyMounted,

    #[error("a disk named {0:?} is already registered")]
    AlreadyRegistered(String),

    #[error("no disk named {0:?} is registered")]
    NotRegistered(String),

    #[error("unknown filesystem type {0:?}")]
    UnknownFsType(String),

    #[error(transparent)]
    Fat(#[from] FatError),
}

pub type VfsResult<T> = Result<T, VfsError>;
