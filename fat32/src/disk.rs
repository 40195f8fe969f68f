//! Byte-oriented access to one host file backing a disk image.
//!
//! Every higher layer (superblock, FAT, directories, files) reaches the
//! image only through this trait. There is no caching beyond what the host
//! OS already does, and no retry on partial reads/writes: a short read or
//! write is a hard failure, not something callers are expected to loop on.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::{DiskError, DiskResult};

/// Root directory `Disk::open` resolves bare names under. `FatEngine` always
/// goes through `FileDisk::open_in` with an explicit directory; this default
/// only backs the trait's `open(name)` convenience constructor.
static DEFAULT_DISKS_DIR: OnceLock<PathBuf> = OnceLock::new();

fn default_disks_dir() -> &'static Path {
    DEFAULT_DISKS_DIR.get_or_init(|| PathBuf::from("disks"))
}

/// A byte-addressable handle onto a single disk image file.
pub trait Disk {
    /// Opens (creating if absent) the named image under the default disks
    /// directory.
    fn open(name: &str) -> DiskResult<Self>
    where
        Self: Sized;

    /// Sets the file length to exactly `size`, zero-filling any new bytes.
    fn truncate(&mut self, size: u64) -> DiskResult<()>;

    /// Absolute positioning from the start of the image.
    fn seek(&mut self, offset: u64) -> DiskResult<()>;

    /// Reads exactly `buf.len()` bytes at the current position.
    fn read(&mut self, buf: &mut [u8]) -> DiskResult<()>;

    /// Writes exactly `buf.len()` bytes at the current position.
    fn write(&mut self, buf: &[u8]) -> DiskResult<()>;

    /// Ensures every buffered write has reached the host file.
    fn flush(&mut self) -> DiskResult<()>;

    /// Unlinks the backing file. Consumes the handle.
    fn remove(self) -> DiskResult<()>;
}

/// A `Disk` backed by a plain `std::fs::File`.
#[derive(Debug)]
pub struct FileDisk {
    file: File,
    path: PathBuf,
}

impl FileDisk {
    /// Opens (creating if absent) `<disks_dir>/<name>` for read/write access.
    pub fn open_in(disks_dir: &Path, name: &str) -> DiskResult<Self> {
        std::fs::create_dir_all(disks_dir)?;
        let path = disks_dir.join(name);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;
        Ok(Self { file, path })
    }

    /// True if `<disks_dir>/<name>` already exists on the host.
    pub fn exists(disks_dir: &Path, name: &str) -> bool {
        disks_dir.join(name).exists()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current length of the backing file, in bytes.
    pub fn len(&self) -> DiskResult<u64> {
        Ok(self.file.metadata()?.len())
    }
}

impl Disk for FileDisk {
    fn open(name: &str) -> DiskResult<Self> {
        Self::open_in(default_disks_dir(), name)
    }

    fn truncate(&mut self, size: u64) -> DiskResult<()> {
        self.file.set_len(size)?;
        Ok(())
    }

    fn seek(&mut self, offset: u64) -> DiskResult<()> {
        let len = self.len()?;
        if offset > len {
            return Err(DiskError::SeekOutOfBounds { offset, len });
        }
        self.file.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> DiskResult<()> {
        self.file.read_exact(buf)?;
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> DiskResult<()> {
        self.file.write_all(buf)?;
        Ok(())
    }

    fn flush(&mut self) -> DiskResult<()> {
        self.file.flush()?;
        self.file.sync_data()?;
        Ok(())
    }

    fn remove(self) -> DiskResult<()> {
        std::fs::remove_file(&self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_zero_fills() {
        let dir = tempfile::tempdir().unwrap();
        let mut disk = FileDisk::open_in(dir.path(), "a.img").unwrap();
        disk.truncate(16).unwrap();
        disk.seek(0).unwrap();
        let mut buf = [0xffu8; 16];
        disk.read(&mut buf).unwrap();
        assert_eq!(buf, [0u8; 16]);
    }

    #[test]
    fn write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut disk = FileDisk::open_in(dir.path(), "b.img").unwrap();
        disk.truncate(8).unwrap();
        disk.seek(0).unwrap();
        disk.write(b"ABCDEFGH").unwrap();
        disk.flush().unwrap();
        disk.seek(0).unwrap();
        let mut buf = [0u8; 8];
        disk.read(&mut buf).unwrap();
        assert_eq!(&buf, b"ABCDEFGH");
    }

    #[test]
    fn seek_past_end_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut disk = FileDisk::open_in(dir.path(), "c.img").unwrap();
        disk.truncate(4).unwrap();
        assert!(disk.seek(5).is_err());
    }

    #[test]
    fn remove_unlinks_file() {
        let dir = tempfile::tempdir().unwrap();
        let disk = FileDisk::open_in(dir.path(), "d.img").unwrap();
        let path = disk.path().to_path_buf();
        disk.remove().unwrap();
        assert!(!path.exists());
    }
}
