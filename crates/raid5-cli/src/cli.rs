use std::path::PathBuf;

use clap::Parser;

/// RAID5 with distributed parity over 3 to 16 back-end devices. The logical
/// device exposes only data blocks; each stripe holds N-1 data blocks and one
/// parity block, rotated across the devices.
#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Block size in bytes.
    pub block_size: u32,

    /// Path where the virtual RAID device is exported.
    pub raid_device: PathBuf,

    /// Back-end devices in slot order: PATH, +PATH (rebuild the slot from the
    /// others before serving) or the literal MISSING.
    #[arg(required = true, num_args = 1..)]
    pub devices: Vec<String>,

    /// Produce verbose I/O traces.
    #[arg(short, long)]
    pub verbose: bool,
}
