#![allow(clippy::multiple_crate_versions)]

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;
mod fs;
mod metrics;
mod mount;

use cli::Cli;
use metrics::TotalsSink;
use raid5_rs::retention::array::Array;
use raid5_rs::retention::volume::Volume;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let totals = Arc::new(TotalsSink::default());
    let _ = raid5_rs::metrics::install_metrics_sink(totals.clone());

    let array = Array::open(&cli.devices, cli.block_size as usize)?;
    info!("device table:\n{}", array.status_string());

    let mut volume = Volume::new(array);
    volume.rebuild()?;
    info!("RAID device resulting size: {} bytes", volume.capacity_bytes());

    let res = mount::run_mount(volume, &cli.raid_device, cli.block_size);
    totals.log_summary();
    res
}

fn init_tracing(verbose: bool) {
    if tracing::dispatcher::has_been_set() {
        return;
    }

    let default_directive = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(default_directive.parse().unwrap()),
        )
        .init();
}
