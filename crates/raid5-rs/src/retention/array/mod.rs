
use std::fmt::Write;

use anyhow::{bail, Context};
use tracing::{info, warn};

use crate::metrics::{self, DiskOp, IoOpType};
use crate::retention::disk::Disk;

/// Literal specifier marking an absent slot.
pub const MISSING: &str = "MISSING";
/// Specifier prefix marking the slot to rebuild before serving.
pub const REBUILD_PREFIX: char = '+';

pub const MIN_DEVICES: usize = 3;
pub const MAX_DEVICES: usize = 16;

/// Array is the device table: N ordered slots, each either an open back-end
/// or missing, with at most one slot marked for rebuild. Slot state is fixed
/// for the lifetime of the process.
#[derive(Debug)]
pub struct Array {
    slots: Vec<Option<Disk>>,
    rebuild_target: Option<usize>,
    block_size: usize,
    min_blocks: u64,
}

impl Array {
    /// `open` parses the ordered slot specifiers and opens every present
    /// back-end.
    ///
    /// A specifier is a path, a path prefixed with `+` (rebuild target, at
    /// most one across all slots), or the literal `MISSING`.
    ///
    /// # Errors
    /// Returns an error on fewer than 3 or more than 16 slots, a zero block
    /// size, more than one rebuild target, a rebuild mark on a missing slot,
    /// an unopenable path, all slots missing, or every present device being
    /// smaller than one block.
    pub fn open(specs: &[String], block_size: usize) -> anyhow::Result<Self> {
        if block_size == 0 {
            bail!("block size must be positive");
        }
        if specs.len() < MIN_DEVICES {
            bail!("RAID5 requires at least {MIN_DEVICES} devices, got {}", specs.len());
        }
        if specs.len() > MAX_DEVICES {
            bail!("at most {MAX_DEVICES} devices are supported, got {}", specs.len());
        }

        let mut slots = Vec::with_capacity(specs.len());
        let mut rebuild_target = None;
        for (i, spec) in specs.iter().enumerate() {
            if spec == MISSING {
                warn!("DEGRADED: slot {i} is missing");
                slots.push(None);
                continue;
            }
            let path = match spec.strip_prefix(REBUILD_PREFIX) {
                Some(rest) => {
                    if rebuild_target.is_some() {
                        bail!("at most one slot may be marked as rebuild target");
                    }
                    if rest == MISSING {
                        bail!("slot {i} cannot be both missing and a rebuild target");
                    }
                    rebuild_target = Some(i);
                    rest
                }
                None => spec.as_str(),
            };
            let disk = Disk::open(path, block_size).with_context(|| format!("slot {i}"))?;
            info!(
                "slot {i}: opened {} ({} bytes)",
                disk.path().display(),
                disk.blocks() * block_size as u64
            );
            slots.push(Some(disk));
        }

        if slots.iter().all(Option::is_none) {
            bail!("all devices are missing");
        }
        let min_blocks = slots.iter().flatten().map(Disk::blocks).min().unwrap_or(0);
        if min_blocks == 0 {
            bail!("smallest device holds no whole block of {block_size} bytes");
        }

        Ok(Self {
            slots,
            rebuild_target,
            block_size,
            min_blocks,
        })
    }

    /// `devices` returns N, the slot count.
    #[must_use]
    pub fn devices(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    /// `min_blocks` returns the stripe count K, set by the smallest device.
    #[must_use]
    pub const fn min_blocks(&self) -> u64 {
        self.min_blocks
    }

    /// `capacity_bytes` returns the virtual device size exposed to clients.
    #[must_use]
    pub fn capacity_bytes(&self) -> u64 {
        (self.devices() as u64 - 1) * self.min_blocks * self.block_size as u64
    }

    #[must_use]
    pub fn is_missing(&self, i: usize) -> bool {
        self.slots.get(i).map_or(true, Option::is_none)
    }

    #[must_use]
    pub const fn rebuild_target(&self) -> Option<usize> {
        self.rebuild_target
    }

    fn disk(&self, i: usize) -> anyhow::Result<&Disk> {
        match self.slots.get(i) {
            Some(Some(disk)) => Ok(disk),
            Some(None) => bail!("slot {i} is missing"),
            None => bail!("slot index out of range: {i} (devices={})", self.devices()),
        }
    }

    /// `read_block` reads one block from slot `i` at `phys_off`.
    ///
    /// # Errors
    /// Returns an error if the slot is missing or the device read fails.
    pub fn read_block(&self, i: usize, phys_off: u64, buf: &mut [u8]) -> anyhow::Result<()> {
        let res = self.disk(i).and_then(|d| d.read_block(phys_off, buf));
        metrics::record_disk_op(DiskOp {
            disk: i,
            op: IoOpType::Read,
            bytes: buf.len() as u64,
            error: res.is_err(),
        });
        res
    }

    /// `write_block` writes one block to slot `i` at `phys_off`.
    ///
    /// # Errors
    /// Returns an error if the slot is missing or the device write fails.
    pub fn write_block(&self, i: usize, phys_off: u64, buf: &[u8]) -> anyhow::Result<()> {
        let res = self.disk(i).and_then(|d| d.write_block(phys_off, buf));
        metrics::record_disk_op(DiskOp {
            disk: i,
            op: IoOpType::Write,
            bytes: buf.len() as u64,
            error: res.is_err(),
        });
        res
    }

    /// `flush_all` fsyncs every present back-end. Per-slot failures are
    /// logged, not fatal.
    pub fn flush_all(&self) {
        for (i, slot) in self.slots.iter().enumerate() {
            if let Some(disk) = slot {
                if let Err(e) = disk.flush() {
                    warn!("flush: slot {i}: {e:#}");
                }
            }
        }
    }

    /// `status_string` renders a one-line state report per slot.
    #[must_use]
    pub fn status_string(&self) -> String {
        let mut out = String::new();
        for (i, slot) in self.slots.iter().enumerate() {
            let _ = match slot {
                Some(disk) => {
                    let state = if self.rebuild_target == Some(i) {
                        "REBUILD_TARGET"
                    } else {
                        "OK"
                    };
                    writeln!(
                        out,
                        "slot {i}: {state} (path={}, blocks={})",
                        disk.path().display(),
                        disk.blocks()
                    )
                }
                None => writeln!(out, "slot {i}: MISSING"),
            };
        }
        out
    }
}
