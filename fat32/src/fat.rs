//! The file allocation table: one `u32` sentinel per cluster, plus the
//! first-fit allocator and chain walker built on top of it.
//!
//! Sentinel values and the allocator's scan order are grounded on
//! `original_source/src/FAT32.h`'s `clu_values_t` enum and
//! `original_source/src/FAT32.cpp`'s `attain_clu`/`get_list_of_clu`.

use crate::error::FatError;

pub const UNALLOCATED: u32 = 0x0000_0000;
pub const ALLOCATED: u32 = 0x0000_0001;
pub const BAD: u32 = 0x0000_FFF7;
pub const EOF: u32 = 0x0000_FFF8;

/// In-memory view of the FAT region: one entry per cluster.
#[derive(Debug, Clone)]
pub struct FatTable {
    entries: Vec<u32>,
}

impl FatTable {
    pub fn new(cluster_count: u32) -> Self {
        Self {
            entries: vec![UNALLOCATED; cluster_count as usize],
        }
    }

    pub fn from_entries(entries: Vec<u32>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.entries
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.entries.len() * 4);
        for &e in &self.entries {
            out.extend_from_slice(&e.to_le_bytes());
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let entries = bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Self { entries }
    }

    /// Resets every transient `ALLOCATED` slot back to `UNALLOCATED`. Called
    /// once right after loading the FAT off disk: a cluster left in the
    /// `ALLOCATED` state survived a crash mid-allocation and belongs to no
    /// chain, so it is reclaimed rather than trusted.
    pub fn reclaim_allocated(&mut self) -> usize {
        let mut reclaimed = 0;
        for e in &mut self.entries {
            if *e == ALLOCATED {
                *e = UNALLOCATED;
                reclaimed += 1;
            }
        }
        reclaimed
    }

    pub fn get(&self, cluster: u32) -> Option<u32> {
        self.entries.get(cluster as usize).copied()
    }

    pub fn set(&mut self, cluster: u32, value: u32) {
        self.entries[cluster as usize] = value;
    }

    /// Count of clusters currently `UNALLOCATED`.
    pub fn n_free_clusters(&self) -> usize {
        self.entries.iter().filter(|&&e| e == UNALLOCATED).count()
    }

    /// First-fit scan for `count` free clusters, returned in ascending
    /// index order (not yet chained or marked allocated).
    pub fn find_free(&self, count: usize) -> Result<Vec<u32>, FatError> {
        let found: Vec<u32> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, &e)| e == UNALLOCATED)
            .take(count)
            .map(|(i, _)| i as u32)
            .collect();
        if found.len() < count {
            return Err(FatError::NoSpace);
        }
        Ok(found)
    }

    /// Allocates exactly `count` fresh clusters, chains them in order with
    /// `EOF` terminating the last, and returns the chain. Reverts every
    /// slot it touched if the table doesn't have enough free clusters.
    pub fn allocate_chain(&mut self, count: usize) -> Result<Vec<u32>, FatError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let clusters = self.find_free(count)?;
        for (i, &cl) in clusters.iter().enumerate() {
            let next = clusters.get(i + 1).copied().unwrap_or(EOF);
            self.set(cl, next);
        }
        Ok(clusters)
    }

    /// Walks a chain from `start`, returning every cluster visited in
    /// order. `start` is always a real cluster index here — cluster 0 is
    /// the root directory's own home, not a sentinel, so this never
    /// short-circuits on it; callers that track "no cluster allocated" (an
    /// empty file) use `dir::NO_CLUSTER` and must not reach this function
    /// with it. Fails closed on a `BAD` or `UNALLOCATED` link found before
    /// an `EOF` terminator — a truncated chain is reported, never silently
    /// accepted as "the file ends here".
    pub fn chain(&self, start: u32) -> Result<Vec<u32>, FatError> {
        let mut out = Vec::new();
        let mut current = start;
        loop {
            out.push(current);
            let next = self
                .get(current)
                .ok_or(FatError::CorruptChain)?;
            match next {
                EOF => break,
                BAD | UNALLOCATED => return Err(FatError::CorruptChain),
                _ => current = next,
            }
        }
        Ok(out)
    }

    /// Frees every cluster in the chain rooted at `start`, leaving them
    /// `UNALLOCATED`.
    pub fn free_chain(&mut self, start: u32) -> Result<(), FatError> {
        let clusters = self.chain(start)?;
        for cl in clusters {
            self.set(cl, UNALLOCATED);
        }
        Ok(())
    }

    /// Restores `chain`'s original linkage (`chain[i]` → `chain[i + 1]`,
    /// last → `EOF`). Used to undo a `free_chain` when a directory
    /// re-layout attempt that followed it failed, so a failed re-layout
    /// never loses the chain it started from.
    pub fn relink_chain(&mut self, chain: &[u32]) {
        for (i, &cl) in chain.iter().enumerate() {
            let next = chain.get(i + 1).copied().unwrap_or(EOF);
            self.set(cl, next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_chain_terminates_with_eof() {
        let mut fat = FatTable::new(8);
        let chain = fat.allocate_chain(3).unwrap();
        assert_eq!(chain.len(), 3);
        assert_eq!(fat.get(chain[2]).unwrap(), EOF);
        assert_eq!(fat.get(chain[0]).unwrap(), chain[1]);
    }

    #[test]
    fn allocate_chain_fails_without_enough_free_clusters() {
        let mut fat = FatTable::new(2);
        assert!(matches!(fat.allocate_chain(3), Err(FatError::NoSpace)));
    }

    #[test]
    fn chain_rejects_unallocated_link() {
        let mut fat = FatTable::new(4);
        fat.set(0, 1);
        fat.set(1, UNALLOCATED);
        assert!(matches!(fat.chain(0), Err(FatError::CorruptChain)));
    }

    #[test]
    fn chain_rejects_bad_link() {
        let mut fat = FatTable::new(4);
        fat.set(0, BAD);
        assert!(matches!(fat.chain(0), Err(FatError::CorruptChain)));
    }

    #[test]
    fn free_chain_returns_clusters_to_unallocated() {
        let mut fat = FatTable::new(4);
        let chain = fat.allocate_chain(2).unwrap();
        fat.free_chain(chain[0]).unwrap();
        assert_eq!(fat.n_free_clusters(), 4);
    }

    #[test]
    fn reclaim_allocated_resets_only_transient_slots() {
        let mut fat = FatTable::new(4);
        fat.set(0, ALLOCATED);
        fat.set(1, EOF);
        let reclaimed = fat.reclaim_allocated();
        assert_eq!(reclaimed, 1);
        assert_eq!(fat.get(0).unwrap(), UNALLOCATED);
        assert_eq!(fat.get(1).unwrap(), EOF);
    }

    #[test]
    fn bytes_round_trip() {
        let mut fat = FatTable::new(4);
        fat.set(2, EOF);
        let bytes = fat.to_bytes();
        let back = FatTable::from_bytes(&bytes);
        assert_eq!(fat.as_slice(), back.as_slice());
    }
}
