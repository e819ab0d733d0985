//! Callback surface handed to the block-device shim.

use anyhow::Result;
use tracing::debug;

use crate::retention::volume::Volume;

/// The operations the shim drives against the engine. Offsets and lengths
/// are multiples of the configured block size; misaligned requests fail.
pub trait BlockDevice {
    /// `size` returns the virtual device capacity in bytes.
    fn size(&self) -> u64;

    /// `read` fills `out` from the virtual device at `offset`.
    ///
    /// # Errors
    /// Fails on misaligned or out-of-range requests, back-end I/O errors, or
    /// an unreconstructible degraded read.
    fn read(&self, out: &mut [u8], offset: u64) -> Result<()>;

    /// `write` stores `data` to the virtual device at `offset`.
    ///
    /// # Errors
    /// Fails on misaligned or out-of-range requests, back-end I/O errors, or
    /// a missing parity slot.
    fn write(&mut self, data: &[u8], offset: u64) -> Result<()>;

    /// `flush` pushes written blocks to stable storage.
    ///
    /// # Errors
    /// Reserved; the default engine treats per-slot flush failures as
    /// best-effort and reports success.
    fn flush(&self) -> Result<()>;

    /// `disconnect` is the shim's shutdown notification.
    fn disconnect(&mut self);
}

impl BlockDevice for Volume {
    fn size(&self) -> u64 {
        self.capacity_bytes()
    }

    fn read(&self, out: &mut [u8], offset: u64) -> Result<()> {
        Volume::read(self, out, offset)
    }

    fn write(&mut self, data: &[u8], offset: u64) -> Result<()> {
        Volume::write(self, data, offset)
    }

    fn flush(&self) -> Result<()> {
        Volume::flush(self)
    }

    fn disconnect(&mut self) {
        debug!("disconnect");
    }
}
