use std::sync::atomic::{AtomicU64, Ordering};

/// The independent counters an export reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    /// Voxel slots processed during normalization.
    Voxels,
    /// Region cells completed.
    Regions,
    /// Sub-progress inside a single region. Owned by the [`crate::RegionWriter`].
    Chunks,
}

/// Receives progress of an export.
///
/// For each [`Counter`], `begin` announces the maximum before its phase starts and `update`
/// reports monotonically increasing values, bounded by that maximum. A counter may begin more
/// than once, as [`Counter::Chunks`] does for every region.
pub trait ProgressObserver {
    fn begin(&self, counter: Counter, max: u64);
    fn update(&self, counter: Counter, value: u64);
}

/// Discards all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn begin(&self, _counter: Counter, _max: u64) {}
    fn update(&self, _counter: Counter, _value: u64) {}
}

#[derive(Debug, Default)]
struct AtomicCounter {
    value: AtomicU64,
    max: AtomicU64,
}

/// Lock-free progress storage. Meant to be shared with some other thread (like a UI) which
/// polls [`ProgressCounters::snapshot`] while the export runs.
#[derive(Debug, Default)]
pub struct ProgressCounters {
    voxels: AtomicCounter,
    regions: AtomicCounter,
    chunks: AtomicCounter,
}

/// Point-in-time copy of [`ProgressCounters`]. Each pair is `(value, max)`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub voxels: (u64, u64),
    pub regions: (u64, u64),
    pub chunks: (u64, u64),
}

impl ProgressCounters {
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, counter: Counter) -> &AtomicCounter {
        match counter {
            Counter::Voxels => &self.voxels,
            Counter::Regions => &self.regions,
            Counter::Chunks => &self.chunks,
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let read = |c: &AtomicCounter| {
            (
                c.value.load(Ordering::Relaxed),
                c.max.load(Ordering::Relaxed),
            )
        };

        ProgressSnapshot {
            voxels: read(&self.voxels),
            regions: read(&self.regions),
            chunks: read(&self.chunks),
        }
    }
}

impl ProgressObserver for ProgressCounters {
    fn begin(&self, counter: Counter, max: u64) {
        let counter = self.counter(counter);
        counter.value.store(0, Ordering::Relaxed);
        counter.max.store(max, Ordering::Relaxed);
    }

    fn update(&self, counter: Counter, value: u64) {
        self.counter(counter).value.store(value, Ordering::Relaxed);
    }
}
