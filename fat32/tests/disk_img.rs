//! End-to-end scenarios against a real on-disk image, per spec.md §8's
//! concrete scenarios: mount, build a small tree, unmount, remount, and
//! check the tree survived the round trip.

use fat32_core::{FatConfig, FatEngine};

fn small_config(cluster_size: u32, cluster_count: u32) -> FatConfig {
    FatConfig {
        cluster_size,
        total_size: fat32_core::SUPERBLOCK_LEN as u32 + cluster_count * (4 + cluster_size),
    }
}

#[test]
fn scenario_mkdir_cd_touch_ls_survives_remount() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mut engine = FatEngine::open(dir.path(), "A", FatConfig::default()).unwrap();
        engine.mkdir("foo").unwrap();
        engine.cd("foo").unwrap();
        engine.touch("bar").unwrap();
        let names: Vec<String> = engine.ls().iter().map(|e| e.name_str()).collect();
        assert!(names.contains(&".".to_string()));
        assert!(names.contains(&"..".to_string()));
        assert!(names.contains(&"bar".to_string()));
    }

    // umnt + mnt again: root must come back clean and foo/bar must still be
    // there with the same listing.
    let mut engine = FatEngine::open(dir.path(), "A", FatConfig::default()).unwrap();
    assert_eq!(engine.ls().len(), 2);
    engine.cd("foo").unwrap();
    let names: Vec<String> = engine.ls().iter().map(|e| e.name_str()).collect();
    assert!(names.contains(&"bar".to_string()));
}

#[test]
fn file_of_five_kib_round_trips_across_three_clusters() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = FatEngine::open(dir.path(), "A", small_config(2048, 64)).unwrap();

    let content = vec![0x5Au8; 5 * 1024];
    engine.store_file("f", &content).unwrap();
    assert_eq!(engine.cat("f").unwrap(), content);
}

#[test]
fn filling_fat_to_one_free_cluster_makes_mkdir_fail_without_losing_the_free_cluster() {
    let dir = tempfile::tempdir().unwrap();
    // 64-byte clusters leave room for only 1 entry in a directory's first
    // cluster, so a fresh directory's 2 seed entries always spill into a
    // continuation cluster: `mkdir` always needs at least 2 clusters.
    let mut engine = FatEngine::open(dir.path(), "A", small_config(64, 3)).unwrap();
    let free_before = engine.n_free_clusters();

    assert!(engine.mkdir("x").is_err());
    assert_eq!(engine.n_free_clusters(), free_before);
}

#[test]
fn rm_then_recreate_reuses_freed_clusters_first_fit() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = FatEngine::open(dir.path(), "A", small_config(2048, 16)).unwrap();

    engine.store_file("f", &vec![0xAAu8; 3 * 2048]).unwrap();
    engine.rm("f", false).unwrap();
    engine.store_file("g", &vec![0xBBu8; 3 * 2048]).unwrap();

    assert_eq!(engine.cat("g").unwrap(), vec![0xBBu8; 3 * 2048]);
}

#[test]
fn directory_name_of_exactly_ten_bytes_is_accepted_eleven_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = FatEngine::open(dir.path(), "A", FatConfig::default()).unwrap();

    engine.mkdir("0123456789").unwrap();
    assert!(engine.mkdir("01234567890").is_err());
}
