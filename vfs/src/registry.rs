//! The VFS registry: named disk descriptors plus the at-most-one-mounted
//! state machine. Grounded on `original_source/src/VFS.cpp`'s
//! `add_disk`/`rm_disk`/`mnt_disk`/`umnt_disk`/`lst_disks`.

use std::collections::HashMap;
use std::path::PathBuf;

use fat32_core::{FatConfig, FatEngine};
use log::warn;

use crate::error::{VfsError, VfsResult};
use crate::fs::FileSystem;

/// The one filesystem type this VFS knows how to mount today. A one-variant
/// enum, not a trait object factory, because `add(name, fs_type)` needs a
/// value to reject unknown type strings against before anything is mounted —
/// see spec.md §4.3's `UnknownFsType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsType {
    Fat32,
}

impl FsType {
    pub const DEFAULT: &'static str = "fat32";

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fat32" => Some(Self::Fat32),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fat32 => "fat32",
        }
    }
}

/// spec.md §4.3's `{filesystem_type, engine_handle_or_none}`. The engine
/// handle itself lives in `MountState::Mounted` rather than here, since at
/// most one can exist at a time (spec.md §5).
#[derive(Debug, Clone, Copy)]
pub struct DiskDescriptor {
    pub fs_type: FsType,
}

enum MountState {
    Empty,
    Mounted { name: String, fs: Box<dyn FileSystem> },
}

/// Maps disk names to descriptors and owns the singleton mount slot. All
/// user-level file commands are routed through `dispatch`/`dispatch_mut`
/// once something is mounted; with `MountState::Empty` they fail with
/// `VfsError::NotMounted`.
pub struct Registry {
    disks_dir: PathBuf,
    config: FatConfig,
    disks: HashMap<String, DiskDescriptor>,
    mounted: MountState,
}

impl Registry {
    /// `disks_dir` is where `mnt` opens `<disks_dir>/<name>` image files;
    /// `config` is the geometry new images are created with.
    pub fn new(disks_dir: impl Into<PathBuf>, config: FatConfig) -> Self {
        Self {
            disks_dir: disks_dir.into(),
            config,
            disks: HashMap::new(),
            mounted: MountState::Empty,
        }
    }

    pub fn add(&mut self, name: &str, fs_type: Option<&str>) -> VfsResult<()> {
        if self.disks.contains_key(name) {
            return Err(VfsError::AlreadyRegistered(name.to_string()));
        }
        let fs_type = match fs_type {
            Some(t) => FsType::parse(t).ok_or_else(|| VfsError::UnknownFsType(t.to_string()))?,
            None => FsType::Fat32,
        };
        self.disks.insert(name.to_string(), DiskDescriptor { fs_type });
        Ok(())
    }

    pub fn rm(&mut self, name: &str) -> VfsResult<()> {
        if !self.disks.contains_key(name) {
            return Err(VfsError::NotRegistered(name.to_string()));
        }
        if self.mounted_name() == Some(name) {
            self.umnt();
        }
        self.disks.remove(name);
        Ok(())
    }

    pub fn mnt(&mut self, name: &str) -> VfsResult<()> {
        if matches!(self.mounted, MountState::Mounted { .. }) {
            return Err(VfsError::AlreadyMounted);
        }
        let descriptor = self
            .disks
            .get(name)
            .copied()
            .ok_or_else(|| VfsError::NotRegistered(name.to_string()))?;

        let fs: Box<dyn FileSystem> = match descriptor.fs_type {
            FsType::Fat32 => Box::new(FatEngine::open(&self.disks_dir, name, self.config)?),
        };
        self.mounted = MountState::Mounted { name: name.to_string(), fs };
        Ok(())
    }

    /// Idempotent: a no-op (logged warning, not an error) when nothing is
    /// mounted, per spec.md §4.3 and §7 ("errors at the VFS layer are
    /// reported ... as warnings without terminating the session").
    pub fn umnt(&mut self) {
        match std::mem::replace(&mut self.mounted, MountState::Empty) {
            MountState::Empty => warn!("there is no system currently mounted"),
            MountState::Mounted { .. } => {}
        }
    }

    pub fn mounted_name(&self) -> Option<&str> {
        match &self.mounted {
            MountState::Empty => None,
            MountState::Mounted { name, .. } => Some(name.as_str()),
        }
    }

    pub fn is_mounted(&self) -> bool {
        matches!(self.mounted, MountState::Mounted { .. })
    }

    /// Enumerates registered disks as `(name, fs_type, is_mounted)`, matching
    /// spec.md §4.3's `ls()`.
    pub fn ls(&self) -> Vec<(&str, FsType, bool)> {
        let mounted = self.mounted_name();
        let mut out: Vec<_> = self
            .disks
            .iter()
            .map(|(name, d)| (name.as_str(), d.fs_type, Some(name.as_str()) == mounted))
            .collect();
        out.sort_by(|a, b| a.0.cmp(b.0));
        out
    }

    /// Borrows the mounted filesystem for dispatch, or `NotMounted`.
    pub fn fs_mut(&mut self) -> VfsResult<&mut dyn FileSystem> {
        match &mut self.mounted {
            MountState::Empty => Err(VfsError::NotMounted),
            MountState::Mounted { fs, .. } => Ok(fs.as_mut()),
        }
    }

    pub fn fs(&self) -> VfsResult<&dyn FileSystem> {
        match &self.mounted {
            MountState::Empty => Err(VfsError::NotMounted),
            MountState::Mounted { fs, .. } => Ok(fs.as_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(dir: &std::path::Path) -> Registry {
        Registry::new(dir, FatConfig::default())
    }

    #[test]
    fn add_then_ls_contains_the_disk_rm_then_ls_does_not() {
        let dir = tempfile::tempdir().unwrap();
        let mut reg = registry(dir.path());
        reg.add("A", None).unwrap();
        assert!(reg.ls().iter().any(|(n, ..)| *n == "A"));
        reg.rm("A").unwrap();
        assert!(!reg.ls().iter().any(|(n, ..)| *n == "A"));
    }

    #[test]
    fn add_duplicate_name_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut reg = registry(dir.path());
        reg.add("A", None).unwrap();
        assert!(matches!(reg.add("A", None), Err(VfsError::AlreadyRegistered(_))));
    }

    #[test]
    fn add_unknown_fs_type_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut reg = registry(dir.path());
        assert!(matches!(
            reg.add("A", Some("zzz")),
            Err(VfsError::UnknownFsType(_))
        ));
    }

    #[test]
    fn mnt_then_mnt_again_fails_already_mounted() {
        let dir = tempfile::tempdir().unwrap();
        let mut reg = registry(dir.path());
        reg.add("A", None).unwrap();
        reg.add("B", None).unwrap();
        reg.mnt("A").unwrap();
        assert!(matches!(reg.mnt("B"), Err(VfsError::AlreadyMounted)));
        assert_eq!(reg.mounted_name(), Some("A"));
    }

    #[test]
    fn mnt_unregistered_disk_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut reg = registry(dir.path());
        assert!(matches!(reg.mnt("ghost"), Err(VfsError::NotRegistered(_))));
    }

    #[test]
    fn umnt_on_empty_is_a_harmless_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let mut reg = registry(dir.path());
        reg.umnt();
        assert!(!reg.is_mounted());
    }

    #[test]
    fn rm_on_mounted_disk_forces_unmount_first() {
        let dir = tempfile::tempdir().unwrap();
        let mut reg = registry(dir.path());
        reg.add("A", None).unwrap();
        reg.mnt("A").unwrap();
        reg.rm("A").unwrap();
        assert!(!reg.is_mounted());
        assert!(reg.ls().is_empty());
    }

    #[test]
    fn dispatch_without_a_mount_fails_not_mounted() {
        let dir = tempfile::tempdir().unwrap();
        let mut reg = registry(dir.path());
        assert!(matches!(reg.fs_mut(), Err(VfsError::NotMounted)));
    }

    #[test]
    fn mounted_engine_dispatches_mkdir_and_ls() {
        let dir = tempfile::tempdir().unwrap();
        let mut reg = registry(dir.path());
        reg.add("A", None).unwrap();
        reg.mnt("A").unwrap();
        reg.fs_mut().unwrap().mkdir("foo").unwrap();
        let names: Vec<String> = reg.fs().unwrap().ls().iter().map(|e| e.name_str()).collect();
        assert!(names.contains(&"foo".to_string()));
    }
}
