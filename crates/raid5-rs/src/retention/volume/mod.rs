//! The RAID5 I/O engine: request translation, degraded reads, parity
//! maintenance and the offline rebuild scan.

mod mapper;

use anyhow::{bail, Result};
use tracing::{debug, info};

pub use mapper::{Geometry, Placement};

use crate::layout::block::{xor_into, Block};
use crate::metrics::{self, IoOpType, RaidOp};
use crate::retention::array::Array;

/// Volume is the engine: it owns the device table and translates virtual
/// device requests into per-slot block I/O. Requests are processed one at a
/// time to completion; geometry and slot state never change after startup.
pub struct Volume {
    array: Array,
    geom: Geometry,
}

impl Volume {
    #[must_use]
    pub fn new(array: Array) -> Self {
        let geom = Geometry::new(array.devices(), array.block_size());
        Self { array, geom }
    }

    /// `capacity_bytes` returns S, the virtual device size.
    #[must_use]
    pub fn capacity_bytes(&self) -> u64 {
        self.array.capacity_bytes()
    }

    #[must_use]
    pub const fn geometry(&self) -> &Geometry {
        &self.geom
    }

    /// `status_string` renders the device table state, one line per slot.
    #[must_use]
    pub fn status_string(&self) -> String {
        self.array.status_string()
    }

    fn check_request(&self, len: usize, offset: u64) -> Result<()> {
        let bs = self.geom.block_size as u64;
        if offset % bs != 0 || len as u64 % bs != 0 {
            bail!("request not aligned to block size {bs}: offset={offset}, len={len}");
        }
        let Some(end) = offset.checked_add(len as u64) else {
            bail!("request overflows the address space: offset={offset}, len={len}");
        };
        if end > self.capacity_bytes() {
            bail!(
                "request beyond device end: offset={offset}, len={len}, size={}",
                self.capacity_bytes()
            );
        }
        Ok(())
    }

    /// `read` fills `out` from the virtual device starting at `offset`.
    ///
    /// Blocks whose data slot is missing are reconstructed from the parity
    /// block and the surviving peers.
    ///
    /// # Errors
    /// Fails on a misaligned or out-of-range request, a back-end I/O error,
    /// or when a second slot needed for reconstruction is missing.
    pub fn read(&self, out: &mut [u8], offset: u64) -> Result<()> {
        debug!("R - offset: {offset}, len: {}", out.len());
        let res = self.read_inner(out, offset);
        metrics::record_raid_op(RaidOp {
            op: IoOpType::Read,
            bytes: out.len() as u64,
            degraded: self.degraded(),
            error: res.is_err(),
        });
        res
    }

    fn read_inner(&self, out: &mut [u8], offset: u64) -> Result<()> {
        self.check_request(out.len(), offset)?;
        let bs = self.geom.block_size;
        let first_block = offset / bs as u64;
        let mut peer = Block::zeroed(bs);
        for (idx, chunk) in out.chunks_exact_mut(bs).enumerate() {
            let place = self.geom.locate(first_block + idx as u64);
            if self.array.is_missing(place.data) {
                self.reconstruct_block(&place, chunk, peer.as_bytes_mut())?;
            } else {
                self.array.read_block(place.data, place.phys_off, chunk)?;
            }
        }
        Ok(())
    }

    /// XORs the parity block and every surviving peer into `out`, leaving the
    /// lost data block there. `peer` is a caller-provided scratch block.
    fn reconstruct_block(&self, place: &Placement, out: &mut [u8], peer: &mut [u8]) -> Result<()> {
        if self.array.is_missing(place.parity) {
            bail!(
                "cannot reconstruct block: data slot {} and parity slot {} are both missing (stripe {})",
                place.data,
                place.parity,
                place.stripe
            );
        }
        self.array.read_block(place.parity, place.phys_off, out)?;
        for i in 0..self.geom.devices {
            if i == place.parity || i == place.data {
                continue;
            }
            if self.array.is_missing(i) {
                bail!(
                    "cannot reconstruct block: slots {} and {i} are both missing (stripe {})",
                    place.data,
                    place.stripe
                );
            }
            self.array.read_block(i, place.phys_off, peer)?;
            xor_into(out, peer);
        }
        Ok(())
    }

    /// `write` stores `data` to the virtual device starting at `offset`.
    ///
    /// Stripe-aligned spans take the full-stripe fast path (parity computed
    /// from the incoming data alone); everything else goes block-by-block
    /// through read-modify-write.
    ///
    /// # Errors
    /// Fails on a misaligned or out-of-range request, a back-end I/O error,
    /// or when a stripe's parity slot is missing.
    pub fn write(&mut self, data: &[u8], offset: u64) -> Result<()> {
        debug!("W - offset: {offset}, len: {}", data.len());
        let res = self.write_inner(data, offset);
        metrics::record_raid_op(RaidOp {
            op: IoOpType::Write,
            bytes: data.len() as u64,
            degraded: self.degraded(),
            error: res.is_err(),
        });
        res
    }

    fn write_inner(&mut self, data: &[u8], offset: u64) -> Result<()> {
        self.check_request(data.len(), offset)?;
        let bs = self.geom.block_size;
        let span = self.geom.stripe_span_bytes();

        let mut parity = Block::zeroed(bs);
        let mut old_data = Block::zeroed(bs);
        let mut offset = offset;
        let mut rest = data;
        while !rest.is_empty() {
            if self.geom.is_full_stripe_boundary(offset, rest.len() as u64) {
                let (stripe_data, tail) = rest.split_at(span as usize);
                self.write_full_stripe(offset, stripe_data, &mut parity)?;
                rest = tail;
                offset += span;
            } else {
                let (block, tail) = rest.split_at(bs);
                self.write_block_rmw(offset, block, &mut parity, &mut old_data)?;
                rest = tail;
                offset += bs as u64;
            }
        }
        Ok(())
    }

    /// Full-stripe fast path: parity is the XOR of the incoming data blocks,
    /// no old values are read. Missing data slots are skipped (their content
    /// stays recoverable from parity and peers); a missing parity slot fails
    /// the write.
    fn write_full_stripe(&mut self, offset: u64, data: &[u8], parity: &mut Block) -> Result<()> {
        let bs = self.geom.block_size;
        let first_block = offset / bs as u64;
        let head = self.geom.locate(first_block);

        parity.fill_zero();
        for (pos, block) in data.chunks_exact(bs).enumerate() {
            let slot = self.geom.locate(first_block + pos as u64).data;
            if !self.array.is_missing(slot) {
                self.array.write_block(slot, head.phys_off, block)?;
            }
            parity.xor_in_place(block);
        }

        if self.array.is_missing(head.parity) {
            bail!(
                "cannot complete full-stripe write: parity slot {} is missing (stripe {})",
                head.parity,
                head.stripe
            );
        }
        self.array
            .write_block(head.parity, head.phys_off, parity.as_bytes())
    }

    /// Read-modify-write slow path for one logical block:
    /// `new_parity = old_parity ^ old_data ^ new_data`.
    ///
    /// Both reads complete before either write. There is no barrier between
    /// the data write and the parity write (the write hole stays open).
    fn write_block_rmw(
        &mut self,
        offset: u64,
        new_data: &[u8],
        parity: &mut Block,
        old_data: &mut Block,
    ) -> Result<()> {
        let place = self.geom.locate(offset / self.geom.block_size as u64);

        if self.array.is_missing(place.parity) {
            parity.fill_zero();
        } else {
            self.array
                .read_block(place.parity, place.phys_off, parity.as_bytes_mut())?;
        }
        if self.array.is_missing(place.data) {
            old_data.fill_zero();
        } else {
            self.array
                .read_block(place.data, place.phys_off, old_data.as_bytes_mut())?;
        }

        parity.xor_in_place(old_data.as_bytes());
        parity.xor_in_place(new_data);

        if !self.array.is_missing(place.data) {
            self.array.write_block(place.data, place.phys_off, new_data)?;
        }
        if self.array.is_missing(place.parity) {
            bail!(
                "cannot update parity: parity slot {} is missing (stripe {})",
                place.parity,
                place.stripe
            );
        }
        self.array
            .write_block(place.parity, place.phys_off, parity.as_bytes())
    }

    /// `flush` fsyncs every present back-end. Per-slot failures are logged
    /// and do not fail the flush.
    pub fn flush(&self) -> Result<()> {
        debug!("flush");
        self.array.flush_all();
        Ok(())
    }

    /// `rebuild` rewrites the rebuild-target slot from the survivors, one
    /// stripe at a time. A no-op when no slot is marked. Runs to completion
    /// before any client I/O is served.
    ///
    /// # Errors
    /// Fails if any non-target slot needed for reconstruction is missing
    /// (including the parity slot of a data rebuild) or on a back-end I/O
    /// error. The caller must treat a failed rebuild as fatal.
    pub fn rebuild(&mut self) -> Result<()> {
        let Some(target) = self.array.rebuild_target() else {
            return Ok(());
        };
        let stripes = self.array.min_blocks();
        info!("rebuilding slot {target} across {stripes} stripes");

        let bs = self.geom.block_size;
        let mut acc = Block::zeroed(bs);
        let mut peer = Block::zeroed(bs);
        for stripe in 0..stripes {
            let phys_off = stripe * bs as u64;
            let parity = self.geom.parity_slot(stripe);

            if target == parity {
                acc.fill_zero();
            } else if self.array.is_missing(parity) {
                bail!("rebuild failed: parity slot {parity} is missing (stripe {stripe})");
            } else {
                self.array.read_block(parity, phys_off, acc.as_bytes_mut())?;
            }

            for i in 0..self.geom.devices {
                if i == parity || i == target {
                    continue;
                }
                if self.array.is_missing(i) {
                    bail!("rebuild failed: slot {i} is missing (stripe {stripe})");
                }
                self.array.read_block(i, phys_off, peer.as_bytes_mut())?;
                acc.xor_in_place(peer.as_bytes());
            }

            self.array.write_block(target, phys_off, acc.as_bytes())?;
        }

        info!("rebuild of slot {target} complete");
        Ok(())
    }

    fn degraded(&self) -> bool {
        (0..self.geom.devices).any(|i| self.array.is_missing(i))
    }
}
