use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared between the dispatch loop and observers (uses atomics).
///
/// The loop is the only writer; any thread may read.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Ticks the loop has processed
    pub ticks: AtomicU64,
    /// Ticks that found the buffer empty
    pub idle_ticks: AtomicU64,
    /// Batches the handler accepted
    pub batches_dispatched: AtomicU64,
    /// Items inside accepted batches
    pub items_dispatched: AtomicU64,
    /// Handler calls that failed (including panics)
    pub dispatch_failures: AtomicU64,
    /// Items inside failed batches, which are dropped
    pub items_dropped: AtomicU64,
}

impl DispatchMetrics {
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn idle_ticks(&self) -> u64 {
        self.idle_ticks.load(Ordering::Relaxed)
    }

    pub fn batches_dispatched(&self) -> u64 {
        self.batches_dispatched.load(Ordering::Relaxed)
    }

    pub fn items_dispatched(&self) -> u64 {
        self.items_dispatched.load(Ordering::Relaxed)
    }

    pub fn dispatch_failures(&self) -> u64 {
        self.dispatch_failures.load(Ordering::Relaxed)
    }

    pub fn items_dropped(&self) -> u64 {
        self.items_dropped.load(Ordering::Relaxed)
    }

    /// Returns a plain copy of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            ticks: self.ticks(),
            idle_ticks: self.idle_ticks(),
            batches_dispatched: self.batches_dispatched(),
            items_dispatched: self.items_dispatched(),
            dispatch_failures: self.dispatch_failures(),
            items_dropped: self.items_dropped(),
        }
    }

    pub(crate) fn record_tick(&self, idle: bool) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        if idle {
            self.idle_ticks.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_success(&self, item_count: u64) {
        self.items_dispatched.fetch_add(item_count, Ordering::Relaxed);
        self.batches_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self, item_count: u64) {
        self.items_dropped.fetch_add(item_count, Ordering::Relaxed);
        self.dispatch_failures.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time copy of [`DispatchMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub ticks: u64,
    pub idle_ticks: u64,
    pub batches_dispatched: u64,
    pub items_dispatched: u64,
    pub dispatch_failures: u64,
    pub items_dropped: u64,
}

impl MetricsSnapshot {
    /// Items that reached the handler, whether it accepted them or not.
    pub fn items_attempted(&self) -> u64 {
        self.items_dispatched + self.items_dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_recorded_events() {
        let metrics = DispatchMetrics::default();
        metrics.record_tick(true);
        metrics.record_tick(false);
        metrics.record_success(3);
        metrics.record_tick(false);
        metrics.record_failure(2);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.ticks, 3);
        assert_eq!(snapshot.idle_ticks, 1);
        assert_eq!(snapshot.batches_dispatched, 1);
        assert_eq!(snapshot.items_dispatched, 3);
        assert_eq!(snapshot.dispatch_failures, 1);
        assert_eq!(snapshot.items_dropped, 2);
        assert_eq!(snapshot.items_attempted(), 5);
    }
}
