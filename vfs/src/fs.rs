//! The capability set every mountable filesystem type exposes to the
//! registry and, through it, the CLI. Grounded on spec.md §9 "Polymorphism
//! over filesystem types": the original's `IFS` is `{cd, mkdir, rm, cp, mv,
//! ls, touch, cat}` behind a C++ abstract base with exactly one concrete
//! subclass (`FAT32`). Here that's a plain trait `FatEngine` implements;
//! adding a second filesystem type later is an additive `impl FileSystem for
//! ...`, not a rewrite of `Registry`.

use fat32_core::{DirEntry, FatResult};

pub trait FileSystem {
    fn mkdir(&mut self, name: &str) -> FatResult<()>;
    fn cd(&mut self, name: &str) -> FatResult<()>;
    fn ls(&self) -> &[DirEntry];
    fn touch(&mut self, name: &str) -> FatResult<()>;
    fn cat(&mut self, name: &str) -> FatResult<Vec<u8>>;
    fn rm(&mut self, name: &str, recursive: bool) -> FatResult<()>;
    fn mv(&mut self, src: &str, dst: &str) -> FatResult<()>;
    fn cp(&mut self, src: &str, dst: &str) -> FatResult<()>;
    fn import_host_file(&mut self, host_path: &std::path::Path, name: &str) -> FatResult<()>;
}

impl FileSystem for fat32_core::FatEngine {
    fn mkdir(&mut self, name: &str) -> FatResult<()> {
        fat32_core::FatEngine::mkdir(self, name)
    }

    fn cd(&mut self, name: &str) -> FatResult<()> {
        fat32_core::FatEngine::cd(self, name)
    }

    fn ls(&self) -> &[DirEntry] {
        fat32_core::FatEngine::ls(self)
    }

    fn touch(&mut self, name: &str) -> FatResult<()> {
        fat32_core::FatEngine::touch(self, name)
    }

    fn cat(&mut self, name: &str) -> FatResult<Vec<u8>> {
        fat32_core::FatEngine::cat(self, name)
    }

    fn rm(&mut self, name: &str, recursive: bool) -> FatResult<()> {
        fat32_core::FatEngine::rm(self, name, recursive)
    }

    fn mv(&mut self, src: &str, dst: &str) -> FatResult<()> {
        fat32_core::FatEngine::mv(self, src, dst)
    }

    fn cp(&mut self, src: &str, dst: &str) -> FatResult<()> {
        fat32_core::FatEngine::cp(self, src, dst)
    }

    fn import_host_file(&mut self, host_path: &std::path::Path, name: &str) -> FatResult<()> {
        fat32_core::FatEngine::import_host_file(self, host_path, name)
    }
}
