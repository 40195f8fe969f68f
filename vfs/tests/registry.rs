//! Integration scenarios spanning the registry and the mounted engine
//! together, per spec.md §8's concrete scenarios.

use fat32_core::FatConfig;
use vfs_core::{FsType, Registry, VfsError};

#[test]
fn scenario_two_disks_second_mount_fails_state_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let mut reg = Registry::new(dir.path(), FatConfig::default());

    reg.add("A", None).unwrap();
    reg.add("B", None).unwrap();
    reg.mnt("A").unwrap();

    let err = reg.mnt("B").unwrap_err();
    assert!(matches!(err, VfsError::AlreadyMounted));
    assert_eq!(reg.mounted_name(), Some("A"));

    let listing = reg.ls();
    assert_eq!(listing.len(), 2);
    assert!(listing.iter().any(|(n, t, mounted)| *n == "A" && *t == FsType::Fat32 && *mounted));
    assert!(listing.iter().any(|(n, _, mounted)| *n == "B" && !*mounted));
}

#[test]
fn scenario_umnt_then_mnt_restores_root_listing() {
    let dir = tempfile::tempdir().unwrap();
    let mut reg = Registry::new(dir.path(), FatConfig::default());
    reg.add("A", None).unwrap();

    reg.mnt("A").unwrap();
    reg.fs_mut().unwrap().mkdir("foo").unwrap();
    reg.fs_mut().unwrap().cd("foo").unwrap();
    reg.fs_mut().unwrap().touch("bar").unwrap();
    reg.umnt();

    reg.mnt("A").unwrap();
    reg.fs_mut().unwrap().cd("foo").unwrap();
    let names: Vec<String> = reg.fs().unwrap().ls().iter().map(|e| e.name_str()).collect();
    assert!(names.contains(&"bar".to_string()));
}
