use std::sync::atomic::{AtomicU64, Ordering};

use raid5_rs::metrics::{DiskOp, IoOpType, MetricsSink, RaidOp};
use tracing::info;

/// TotalsSink accumulates transfer counters for the shutdown summary.
#[derive(Default)]
pub struct TotalsSink {
    raid_reads: AtomicU64,
    raid_writes: AtomicU64,
    bytes_read: AtomicU64,
    bytes_written: AtomicU64,
    degraded_ops: AtomicU64,
    raid_errors: AtomicU64,
    disk_reads: AtomicU64,
    disk_writes: AtomicU64,
    disk_errors: AtomicU64,
}

impl MetricsSink for TotalsSink {
    fn record_disk_op(&self, op: DiskOp) {
        match op.op {
            IoOpType::Read => self.disk_reads.fetch_add(1, Ordering::Relaxed),
            IoOpType::Write => self.disk_writes.fetch_add(1, Ordering::Relaxed),
        };
        if op.error {
            self.disk_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn record_raid_op(&self, op: RaidOp) {
        match op.op {
            IoOpType::Read => {
                self.raid_reads.fetch_add(1, Ordering::Relaxed);
                self.bytes_read.fetch_add(op.bytes, Ordering::Relaxed);
            }
            IoOpType::Write => {
                self.raid_writes.fetch_add(1, Ordering::Relaxed);
                self.bytes_written.fetch_add(op.bytes, Ordering::Relaxed);
            }
        }
        if op.degraded {
            self.degraded_ops.fetch_add(1, Ordering::Relaxed);
        }
        if op.error {
            self.raid_errors.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl TotalsSink {
    pub fn log_summary(&self) {
        info!(
            "io totals: reads={} ({} bytes), writes={} ({} bytes), degraded={}, errors={}, disk reads={}, disk writes={}, disk errors={}",
            self.raid_reads.load(Ordering::Relaxed),
            self.bytes_read.load(Ordering::Relaxed),
            self.raid_writes.load(Ordering::Relaxed),
            self.bytes_written.load(Ordering::Relaxed),
            self.degraded_ops.load(Ordering::Relaxed),
            self.raid_errors.load(Ordering::Relaxed),
            self.disk_reads.load(Ordering::Relaxed),
            self.disk_writes.load(Ordering::Relaxed),
            self.disk_errors.load(Ordering::Relaxed),
        );
    }
}
