//! Pure geometry: mapping logical offsets to stripes, slots and physical
//! offsets.

/// Geometry fixes the layout for one array: N devices, B-byte blocks. Every
/// mapping below is a total function of its inputs.
#[derive(Clone, Copy, Debug)]
pub struct Geometry {
    pub devices: usize,
    pub block_size: usize,
}

/// Placement locates one logical block on the array.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Placement {
    pub stripe: u64,
    /// Slot holding this stripe's parity block.
    pub parity: usize,
    /// Slot holding the logical block itself.
    pub data: usize,
    /// Byte offset of the block on every slot of the stripe.
    pub phys_off: u64,
}

impl Geometry {
    #[must_use]
    pub const fn new(devices: usize, block_size: usize) -> Self {
        Self {
            devices,
            block_size,
        }
    }

    /// `data_blocks` returns the number of data slots per stripe (N - 1).
    #[must_use]
    pub const fn data_blocks(&self) -> usize {
        self.devices - 1
    }

    /// `stripe_span_bytes` returns the logical bytes covered by one stripe.
    #[must_use]
    pub const fn stripe_span_bytes(&self) -> u64 {
        (self.devices as u64 - 1) * self.block_size as u64
    }

    /// `parity_slot` returns the slot holding parity for `stripe`. Parity
    /// rotates one slot per stripe.
    #[must_use]
    pub const fn parity_slot(&self, stripe: u64) -> usize {
        (stripe % self.devices as u64) as usize
    }

    /// `is_full_stripe_boundary` reports whether a request starting at
    /// `offset` with `len` bytes left begins on a stripe boundary and covers
    /// at least one full stripe of data.
    #[must_use]
    pub const fn is_full_stripe_boundary(&self, offset: u64, len: u64) -> bool {
        offset % self.stripe_span_bytes() == 0 && len >= self.stripe_span_bytes()
    }

    /// `locate` maps a logical block number to its placement.
    ///
    /// A data position at or past the parity slot shifts up by one, so the
    /// parity slot itself never carries data for its own stripe.
    #[must_use]
    pub const fn locate(&self, logical_block: u64) -> Placement {
        let data_blocks = self.data_blocks() as u64;
        let stripe = logical_block / data_blocks;
        let pos = (logical_block % data_blocks) as usize;
        let parity = self.parity_slot(stripe);
        let data = if pos < parity { pos } else { pos + 1 };
        Placement {
            stripe,
            parity,
            data,
            phys_off: stripe * self.block_size as u64,
        }
    }
}
