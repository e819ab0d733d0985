use std::path::Path;

use anyhow::{Context, Result};
use fuser::MountOption;
use raid5_rs::device::BlockDevice;
use tracing::info;

use crate::fs::DeviceFs;

/// Attaches the engine to the shim: exports `target` as a single-file FUSE
/// mount over `raid_device` and serves until unmounted.
///
/// # Errors
/// Returns an error if the device node cannot be created or the mount fails.
pub fn run_mount<T: BlockDevice>(target: T, raid_device: &Path, block_size: u32) -> Result<()> {
    // The mount covers a regular file, which must exist beforehand.
    if !raid_device.exists() {
        std::fs::File::create(raid_device)
            .with_context(|| format!("failed to create device node {}", raid_device.display()))?;
    }

    info!(
        "exporting {} byte device at {}",
        target.size(),
        raid_device.display()
    );

    let fs = DeviceFs::new(target, block_size);
    let options = vec![MountOption::RW, MountOption::FSName("raid5".into())];
    fuser::mount2(fs, raid_device, &options)
        .with_context(|| format!("failed to attach device at {}", raid_device.display()))
}
