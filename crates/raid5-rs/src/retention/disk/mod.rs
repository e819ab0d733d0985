
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom};
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

use anyhow::Context;

/// Disk wraps one opened back-end with exact positional block I/O.
#[derive(Debug)]
pub struct Disk {
    path: PathBuf,
    file: File,
    blocks: u64,
}

impl Disk {
    /// `open` opens a back-end read-write and records its usable block count.
    ///
    /// The size is taken by seeking to the end so block devices report their
    /// real capacity; a trailing partial block is ignored.
    ///
    /// # Errors
    /// Returns an error if the path cannot be opened read-write or sized.
    pub fn open(path: &str, block_size: usize) -> anyhow::Result<Self> {
        let path = PathBuf::from(path);
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let size = file
            .seek(SeekFrom::End(0))
            .with_context(|| format!("failed to size {}", path.display()))?;
        let blocks = size / block_size as u64;
        Ok(Self { path, file, blocks })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `blocks` returns the number of usable blocks on this device.
    #[must_use]
    pub const fn blocks(&self) -> u64 {
        self.blocks
    }

    /// `read_block` reads exactly `buf.len()` bytes at `phys_off`.
    ///
    /// # Errors
    /// Returns an error on a short read or syscall failure.
    pub fn read_block(&self, phys_off: u64, buf: &mut [u8]) -> anyhow::Result<()> {
        self.file.read_exact_at(buf, phys_off).with_context(|| {
            format!("read of {} at offset {phys_off} failed", self.path.display())
        })
    }

    /// `write_block` writes exactly `buf.len()` bytes at `phys_off`.
    ///
    /// # Errors
    /// Returns an error on a short write or syscall failure.
    pub fn write_block(&self, phys_off: u64, buf: &[u8]) -> anyhow::Result<()> {
        self.file.write_all_at(buf, phys_off).with_context(|| {
            format!("write of {} at offset {phys_off} failed", self.path.display())
        })
    }

    /// `flush` forces written blocks to stable storage.
    ///
    /// # Errors
    /// Returns an error if the fsync fails.
    pub fn flush(&self) -> anyhow::Result<()> {
        self.file
            .sync_all()
            .with_context(|| format!("fsync of {} failed", self.path.display()))
    }
}
