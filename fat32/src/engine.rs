//! The FAT engine: superblock, FAT table, and a cursor to the current
//! directory, wired together over a `Disk`. This is where cluster
//! arithmetic, directory (de)serialization, and the path-operation surface
//! (`mkdir`, `cd`, `ls`, `cat`, `touch`, `rm`, `mv`, `cp`) live.
//!
//! Grounded on `original_source/src/FAT32.cpp`'s `init`/`load`/`set_up`,
//! `store_dir`/`read_dir`, `add_new_entry`, and the path-command handlers.

use std::path::Path;

use log::{info, warn};

use crate::dir::{
    DirEntry, DirHeader, Directory, DIR_ENTRY_LEN, DIR_HEADER_LEN, DIR_NAME_LEN, NO_CLUSTER,
};
use crate::disk::{Disk, FileDisk};
use crate::error::{FatError, FatResult};
use crate::fat::{FatTable, BAD, EOF, UNALLOCATED};
use crate::superblock::{FatConfig, Superblock, SUPERBLOCK_LEN};

fn div_ceil(a: usize, b: usize) -> usize {
    if b == 0 {
        0
    } else {
        (a + b - 1) / b
    }
}

/// Owns one mounted disk image: its superblock, FAT, and current directory.
pub struct FatEngine {
    disk: FileDisk,
    superblock: Superblock,
    fat: FatTable,
    cwd: Directory,
}

impl FatEngine {
    /// Opens `<disks_dir>/<name>`, loading it if it already exists or
    /// creating it fresh with `config` otherwise.
    pub fn open(disks_dir: &Path, name: &str, config: FatConfig) -> FatResult<Self> {
        if FileDisk::exists(disks_dir, name) {
            Self::load(disks_dir, name)
        } else {
            Self::create(disks_dir, name, config)
        }
    }

    fn create(disks_dir: &Path, name: &str, config: FatConfig) -> FatResult<Self> {
        info!("creating disk image {name:?}");
        let mut disk = FileDisk::open_in(disks_dir, name)?;
        let superblock = Superblock::new(name, config)?;
        disk.truncate(superblock.total_size as u64)?;

        let mut engine = Self {
            disk,
            superblock,
            fat: FatTable::new(0),
            cwd: Directory::new_empty(0, 0)?,
        };
        engine.fat = FatTable::new(engine.superblock.cluster_count);

        let tentative = engine
            .fat
            .find_free(1)
            .expect("fresh FAT always has free clusters")[0];
        let mut root = Directory::new_empty(tentative, 0)?;
        engine.store_dir_inner(&mut root)?;
        engine.cwd = root;

        engine.persist_superblock()?;
        engine.persist_fat()?;
        engine.disk.flush()?;
        Ok(engine)
    }

    fn load(disks_dir: &Path, name: &str) -> FatResult<Self> {
        info!("loading disk image {name:?}");
        let mut disk = FileDisk::open_in(disks_dir, name)?;

        disk.seek(0)?;
        let mut sb_bytes = [0u8; SUPERBLOCK_LEN];
        disk.read(&mut sb_bytes)?;
        let superblock = Superblock::from_bytes(&sb_bytes)?;

        disk.seek(superblock.fat_offset as u64)?;
        let fat_len = superblock.cluster_count as usize * 4;
        let mut fat_bytes = vec![0u8; fat_len];
        disk.read(&mut fat_bytes)?;
        let mut fat = FatTable::from_bytes(&fat_bytes);

        let reclaimed = fat.reclaim_allocated();
        if reclaimed > 0 {
            warn!("reclaimed {reclaimed} cluster(s) left ALLOCATED by an interrupted operation");
        }

        let mut engine = Self {
            disk,
            superblock,
            fat,
            cwd: Directory::new_empty(0, 0)?,
        };
        engine.cwd = engine.read_dir(0)?;
        if reclaimed > 0 {
            engine.persist_fat()?;
            engine.disk.flush()?;
        }
        Ok(engine)
    }

    pub fn superblock(&self) -> &Superblock {
        &self.superblock
    }

    pub fn n_free_clusters(&self) -> usize {
        self.fat.n_free_clusters()
    }

    // ---------- cluster I/O ----------

    fn cluster_offset(&self, cluster: u32) -> u64 {
        self.superblock.root_offset as u64
            + cluster as u64 * self.superblock.cluster_size as u64
    }

    fn read_cluster(&mut self, cluster: u32) -> FatResult<Vec<u8>> {
        let mut buf = vec![0u8; self.superblock.cluster_size as usize];
        self.disk.seek(self.cluster_offset(cluster))?;
        self.disk.read(&mut buf)?;
        Ok(buf)
    }

    fn write_cluster(&mut self, cluster: u32, data: &[u8]) -> FatResult<()> {
        let cluster_size = self.superblock.cluster_size as usize;
        let mut buf = vec![0u8; cluster_size];
        let take = data.len().min(cluster_size);
        buf[..take].copy_from_slice(&data[..take]);
        self.disk.seek(self.cluster_offset(cluster))?;
        self.disk.write(&buf)?;
        Ok(())
    }

    fn persist_fat(&mut self) -> FatResult<()> {
        self.disk.seek(self.superblock.fat_offset as u64)?;
        self.disk.write(&self.fat.to_bytes())?;
        Ok(())
    }

    fn persist_superblock(&mut self) -> FatResult<()> {
        self.disk.seek(0)?;
        self.disk.write(&self.superblock.to_bytes())?;
        Ok(())
    }

    // ---------- directory serialization (spec.md 4.2) ----------

    /// Lays out `dir` fresh: allocates a first cluster (and, if the entry
    /// array doesn't fit, continuation clusters chained after it), writes
    /// them, and persists the FAT. Never assumes `dir` was previously
    /// stored — callers that are re-laying out an existing directory must
    /// free its old chain first (`relayout_cwd` does this for the current
    /// directory).
    fn store_dir_inner(&mut self, dir: &mut Directory) -> FatResult<()> {
        let cluster_size = self.superblock.cluster_size as usize;
        let entries_in_first = (cluster_size - DIR_HEADER_LEN) / DIR_ENTRY_LEN;
        let entry_count = dir.entries.len();
        let remaining = entry_count.saturating_sub(entries_in_first);
        let per_cluster = cluster_size / DIR_ENTRY_LEN;
        let additional = div_ceil(remaining, per_cluster);

        // Check the whole budget (first cluster plus every continuation)
        // before touching the FAT at all, so a `NoSpace` here never leaves
        // a half-allocated directory behind for a caller to clean up.
        if self.fat.n_free_clusters() < 1 + additional {
            return Err(FatError::NoSpace);
        }

        let first = self.fat.find_free(1)?[0];
        self.fat.set(first, crate::fat::ALLOCATED);
        dir.header.start_cluster = first;
        dir.header.entry_count = entry_count as u32;

        let first_take = entry_count.min(entries_in_first);
        self.write_dir_first_cluster(first, &dir.header, &dir.entries[..first_take])?;

        if remaining == 0 {
            self.fat.set(first, EOF);
            self.persist_fat()?;
            return Ok(());
        }

        let rest = self.fat.find_free(additional)?;

        let mut prev = first;
        for (i, &cl) in rest.iter().enumerate() {
            self.fat.set(prev, cl);
            let start = entries_in_first + i * per_cluster;
            let end = (start + per_cluster).min(entry_count);
            self.write_entries_cluster(cl, &dir.entries[start..end])?;
            prev = cl;
        }
        self.fat.set(prev, EOF);
        self.persist_fat()?;
        Ok(())
    }

    fn write_dir_first_cluster(
        &mut self,
        cluster: u32,
        header: &DirHeader,
        entries: &[DirEntry],
    ) -> FatResult<()> {
        let cluster_size = self.superblock.cluster_size as usize;
        let mut buf = vec![0u8; cluster_size];
        buf[..DIR_HEADER_LEN].copy_from_slice(&header.to_bytes());
        for (i, entry) in entries.iter().enumerate() {
            let off = DIR_HEADER_LEN + i * DIR_ENTRY_LEN;
            buf[off..off + DIR_ENTRY_LEN].copy_from_slice(&entry.to_bytes());
        }
        self.write_cluster(cluster, &buf)
    }

    fn write_entries_cluster(&mut self, cluster: u32, entries: &[DirEntry]) -> FatResult<()> {
        let cluster_size = self.superblock.cluster_size as usize;
        let mut buf = vec![0u8; cluster_size];
        for (i, entry) in entries.iter().enumerate() {
            let off = i * DIR_ENTRY_LEN;
            buf[off..off + DIR_ENTRY_LEN].copy_from_slice(&entry.to_bytes());
        }
        self.write_cluster(cluster, &buf)
    }

    /// Inverse of `store_dir_inner`: reads the header from `start_cluster`,
    /// then walks continuation clusters via the FAT until `entry_count`
    /// entries have been read.
    pub fn read_dir(&mut self, start_cluster: u32) -> FatResult<Directory> {
        let cluster_size = self.superblock.cluster_size as usize;
        let first_bytes = self.read_cluster(start_cluster)?;
        let header = DirHeader::from_bytes(&first_bytes)?;

        let entries_in_first = (cluster_size - DIR_HEADER_LEN) / DIR_ENTRY_LEN;
        let entry_count = header.entry_count as usize;
        let mut entries = Vec::with_capacity(entry_count);

        let first_take = entry_count.min(entries_in_first);
        for i in 0..first_take {
            let off = DIR_HEADER_LEN + i * DIR_ENTRY_LEN;
            entries.push(DirEntry::from_bytes(&first_bytes[off..off + DIR_ENTRY_LEN])?);
        }

        let per_cluster = cluster_size / DIR_ENTRY_LEN;
        let mut remaining = entry_count - first_take;
        let mut current = start_cluster;
        while remaining > 0 {
            let next = self.fat.get(current).ok_or(FatError::CorruptChain)?;
            if next == EOF || next == BAD || next == UNALLOCATED {
                return Err(FatError::CorruptChain);
            }
            current = next;
            let bytes = self.read_cluster(current)?;
            let take = remaining.min(per_cluster);
            for i in 0..take {
                let off = i * DIR_ENTRY_LEN;
                entries.push(DirEntry::from_bytes(&bytes[off..off + DIR_ENTRY_LEN])?);
            }
            remaining -= take;
        }

        Ok(Directory { header, entries })
    }

    /// Frees the current directory's existing chain and re-serializes it
    /// from its (already mutated) in-memory entry list, per spec.md's
    /// "re-layout on every mutation" policy.
    ///
    /// The old chain is freed *before* the re-layout so the root directory
    /// (permanently at cluster 0) reclaims its own cluster via ordinary
    /// first-fit rather than needing special-cased pinning. If the
    /// re-layout then fails, the freed chain is relinked to its original
    /// shape and `cwd` is restored to exactly where it stood before this
    /// call — a failed relayout must never leave the directory freed and
    /// unwritten (spec.md §7 only allows the orphaned-but-allocated leak,
    /// never data loss).
    fn relayout_cwd(&mut self) -> FatResult<()> {
        let old_start = self.cwd.header.start_cluster;
        let old_chain = self.fat.chain(old_start)?;
        for &cl in &old_chain {
            self.fat.set(cl, UNALLOCATED);
        }

        let mut dir = std::mem::replace(&mut self.cwd, Directory::new_empty(0, 0)?);
        match self.store_dir_inner(&mut dir) {
            Ok(()) => {
                self.cwd = dir;
                Ok(())
            }
            Err(e) => {
                self.fat.relink_chain(&old_chain);
                let _ = self.persist_fat();
                dir.header.start_cluster = old_start;
                self.cwd = dir;
                Err(e)
            }
        }
    }

    // ---------- file read / write (spec.md 4.2) ----------

    pub fn read_file(&mut self, entry: &DirEntry) -> FatResult<Vec<u8>> {
        if entry.is_directory {
            return Err(FatError::NotAFile(entry.name_str()));
        }
        if entry.size == 0 {
            return Ok(Vec::new());
        }
        let cluster_size = self.superblock.cluster_size as usize;
        let expected = div_ceil(entry.size as usize, cluster_size);
        let chain = self.fat.chain(entry.start_cluster)?;
        if chain.len() != expected {
            return Err(FatError::CorruptChain);
        }

        let mut out = Vec::with_capacity(entry.size as usize);
        let mut remaining = entry.size as usize;
        for cl in chain {
            let data = self.read_cluster(cl)?;
            let take = remaining.min(cluster_size);
            out.extend_from_slice(&data[..take]);
            remaining -= take;
        }
        Ok(out)
    }

    fn write_file_data(&mut self, content: &[u8]) -> FatResult<u32> {
        if content.is_empty() {
            return Ok(NO_CLUSTER);
        }
        let cluster_size = self.superblock.cluster_size as usize;
        let needed = div_ceil(content.len(), cluster_size);
        let chain = self.fat.allocate_chain(needed)?;
        for (i, &cl) in chain.iter().enumerate() {
            let start = i * cluster_size;
            let end = (start + cluster_size).min(content.len());
            if let Err(e) = self.write_cluster(cl, &content[start..end]) {
                for &c in &chain {
                    self.fat.set(c, UNALLOCATED);
                }
                return Err(e);
            }
        }
        self.persist_fat()?;
        Ok(chain[0])
    }

    // ---------- path operations (spec.md 4.2, supplemented 6.5) ----------

    pub fn mkdir(&mut self, name: &str) -> FatResult<()> {
        if self.cwd.find(name).is_some() {
            return Err(FatError::AlreadyExists(name.to_string()));
        }
        let parent_cluster = self.cwd.header.start_cluster;
        let tentative = self.fat.find_free(1)?[0];
        let mut new_dir = Directory::new_empty(tentative, parent_cluster)?;
        self.store_dir_inner(&mut new_dir)?;

        self.cwd
            .add_entry(DirEntry::new(name, new_dir.header.start_cluster, 0, true)?);
        self.relayout_cwd()?;
        self.disk.flush()?;
        Ok(())
    }

    pub fn cd(&mut self, name: &str) -> FatResult<()> {
        let entry = self
            .cwd
            .find(name)
            .ok_or_else(|| FatError::NotFound(name.to_string()))?
            .clone();
        if !entry.is_directory {
            return Err(FatError::NotADirectory(name.to_string()));
        }
        self.cwd = self.read_dir(entry.start_cluster)?;
        Ok(())
    }

    pub fn ls(&self) -> &[DirEntry] {
        &self.cwd.entries
    }

    pub fn cwd_name(&self) -> &[u8; DIR_NAME_LEN] {
        &self.cwd.header.name
    }

    pub fn touch(&mut self, name: &str) -> FatResult<()> {
        self.store_file(name, &[])
    }

    pub fn cat(&mut self, name: &str) -> FatResult<Vec<u8>> {
        let entry = self
            .cwd
            .find(name)
            .ok_or_else(|| FatError::NotFound(name.to_string()))?
            .clone();
        self.read_file(&entry)
    }

    pub fn store_file(&mut self, name: &str, content: &[u8]) -> FatResult<()> {
        if self.cwd.find(name).is_some() {
            return Err(FatError::AlreadyExists(name.to_string()));
        }
        let start_cluster = self.write_file_data(content)?;
        self.cwd
            .add_entry(DirEntry::new(name, start_cluster, content.len() as u32, false)?);
        self.relayout_cwd()?;
        self.disk.flush()?;
        Ok(())
    }

    /// Imports a host file at `host_path` into the current directory under
    /// `name` — the `cp ext` half of spec.md's `cp` template, grounded on
    /// `original_source/src/FAT32.cpp`'s `insert_file`/`store_file`.
    pub fn import_host_file(&mut self, host_path: &Path, name: &str) -> FatResult<()> {
        let content = std::fs::read(host_path).map_err(crate::error::DiskError::from)?;
        self.store_file(name, &content)
    }

    /// Copies a file already present in the mounted filesystem under a new
    /// name, allocating a fresh chain rather than aliasing the source's.
    pub fn cp(&mut self, src: &str, dst: &str) -> FatResult<()> {
        let entry = self
            .cwd
            .find(src)
            .ok_or_else(|| FatError::NotFound(src.to_string()))?
            .clone();
        if entry.is_directory {
            return Err(FatError::NotAFile(src.to_string()));
        }
        let content = self.read_file(&entry)?;
        self.store_file(dst, &content)
    }

    /// Same-directory rename: no data moves, only the entry's name changes.
    pub fn mv(&mut self, src: &str, dst: &str) -> FatResult<()> {
        if self.cwd.find(dst).is_some() {
            return Err(FatError::AlreadyExists(dst.to_string()));
        }
        let index = self
            .cwd
            .find_index(src)
            .ok_or_else(|| FatError::NotFound(src.to_string()))?;
        self.cwd.entries[index].name = crate::dir::encode_name(dst)?;
        self.relayout_cwd()?;
        self.disk.flush()?;
        Ok(())
    }

    /// Removes `name` from the current directory. Files free their whole
    /// chain; non-empty directories require `recursive`, else
    /// `DirectoryNotEmpty` — spec.md leaves `rm`'s body as a template, and
    /// the original's own `rm` overloads are empty stubs, so this behavior
    /// is this implementation's own (documented in SPEC_FULL.md/DESIGN.md).
    pub fn rm(&mut self, name: &str, recursive: bool) -> FatResult<()> {
        let index = self
            .cwd
            .find_index(name)
            .ok_or_else(|| FatError::NotFound(name.to_string()))?;
        let entry = self.cwd.entries[index].clone();

        if entry.is_directory {
            let sub = self.read_dir(entry.start_cluster)?;
            if !sub.is_empty_of_children() && !recursive {
                return Err(FatError::DirectoryNotEmpty(name.to_string()));
            }
            if recursive {
                for child in sub.entries.iter().filter(|e| e.name_str() != "." && e.name_str() != "..") {
                    self.remove_subtree(child)?;
                }
            }
            self.fat.free_chain(entry.start_cluster)?;
        } else {
            self.free_entry_chain(&entry)?;
        }

        self.cwd.remove_entry(index);
        self.relayout_cwd()?;
        self.disk.flush()?;
        Ok(())
    }

    fn remove_subtree(&mut self, entry: &DirEntry) -> FatResult<()> {
        if entry.is_directory {
            let sub = self.read_dir(entry.start_cluster)?;
            for child in sub
                .entries
                .iter()
                .filter(|e| e.name_str() != "." && e.name_str() != "..")
            {
                self.remove_subtree(child)?;
            }
            return self.fat.free_chain(entry.start_cluster);
        }
        self.free_entry_chain(entry)
    }

    /// Frees a file entry's cluster chain, skipping entries that never had
    /// one allocated (`NO_CLUSTER`, a zero-byte file) — `FatTable` no
    /// longer treats cluster 0 as "empty", so this sentinel must never
    /// reach `free_chain`/`chain`.
    fn free_entry_chain(&mut self, entry: &DirEntry) -> FatResult<()> {
        if entry.start_cluster == NO_CLUSTER {
            return Ok(());
        }
        self.fat.free_chain(entry.start_cluster)
    }
}
