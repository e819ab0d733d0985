//! Lightweight metrics hooks for recording engine and back-end I/O.

use std::sync::{Arc, OnceLock};

/// `IoOpType` describes a read or write operation.
#[derive(Copy, Clone, Debug)]
pub enum IoOpType {
    Read,
    Write,
}

/// `DiskOp` captures one back-end block transfer.
#[derive(Copy, Clone, Debug)]
pub struct DiskOp {
    /// Slot index of the back-end.
    pub disk: usize,
    pub op: IoOpType,
    pub bytes: u64,
    pub error: bool,
}

/// `RaidOp` captures one request against the virtual device.
#[derive(Copy, Clone, Debug)]
pub struct RaidOp {
    pub op: IoOpType,
    pub bytes: u64,
    /// True when the array was serving with a missing slot.
    pub degraded: bool,
    pub error: bool,
}

/// `MetricsSink` records disk and RAID operations from the engine.
pub trait MetricsSink: Send + Sync + 'static {
    /// `record_disk_op` records a back-end transfer.
    fn record_disk_op(&self, op: DiskOp);
    /// `record_raid_op` records a virtual-device request.
    fn record_raid_op(&self, op: RaidOp);
}

static METRICS_SINK: OnceLock<Arc<dyn MetricsSink>> = OnceLock::new();

/// `install_metrics_sink` installs a process-wide metrics sink.
///
/// # Returns
/// `true` if the sink was installed, `false` if one was already registered.
pub fn install_metrics_sink(sink: Arc<dyn MetricsSink>) -> bool {
    METRICS_SINK.set(sink).is_ok()
}

/// `is_enabled` reports whether a metrics sink has been installed.
pub fn is_enabled() -> bool {
    METRICS_SINK.get().is_some()
}

/// `record_disk_op` forwards a back-end transfer to the installed sink.
pub fn record_disk_op(op: DiskOp) {
    if let Some(sink) = METRICS_SINK.get() {
        sink.record_disk_op(op);
    }
}

/// `record_raid_op` forwards a virtual-device request to the installed sink.
pub fn record_raid_op(op: RaidOp) {
    if let Some(sink) = METRICS_SINK.get() {
        sink.record_raid_op(op);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct TestSink {
        disk_ops: Mutex<Vec<DiskOp>>,
        raid_ops: Mutex<Vec<RaidOp>>,
    }

    impl MetricsSink for TestSink {
        fn record_disk_op(&self, op: DiskOp) {
            self.disk_ops.lock().unwrap().push(op);
        }

        fn record_raid_op(&self, op: RaidOp) {
            self.raid_ops.lock().unwrap().push(op);
        }
    }

    #[test]
    fn metrics_sink_records_ops_when_enabled() {
        let sink = Arc::new(TestSink {
            disk_ops: Mutex::new(Vec::new()),
            raid_ops: Mutex::new(Vec::new()),
        });

        assert!(install_metrics_sink(sink.clone()));
        assert!(is_enabled());

        record_disk_op(DiskOp {
            disk: 1,
            op: IoOpType::Write,
            bytes: 2048,
            error: false,
        });
        record_raid_op(RaidOp {
            op: IoOpType::Read,
            bytes: 512,
            degraded: true,
            error: false,
        });

        {
            let disk_ops = sink.disk_ops.lock().unwrap();
            assert_eq!(disk_ops.len(), 1);
            assert_eq!(disk_ops[0].disk, 1);
            assert_eq!(disk_ops[0].bytes, 2048);
            assert!(!disk_ops[0].error);
            drop(disk_ops);
        }

        {
            let raid_ops = sink.raid_ops.lock().unwrap();
            assert_eq!(raid_ops.len(), 1);
            assert_eq!(raid_ops[0].bytes, 512);
            assert!(raid_ops[0].degraded);
            drop(raid_ops);
        }
    }
}
