// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The handful of values every worker writes during a tick.
//!
//! Workers fold their own partition into local extrema first and merge
//! into these once at the end, so contention is one compare-and-swap
//! per worker rather than one per cell.  Min and max are
//! order-independent, which is what makes the result the same for any
//! number of workers.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// An `f64` stored as its bit pattern.
struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn new(value: f64) -> Self {
        AtomicF64(AtomicU64::new(value.to_bits()))
    }

    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Release)
    }

    /// Replace the stored value with `value` for as long as `better`
    /// says the candidate wins.
    fn update_if<F>(&self, value: f64, better: F)
    where
        F: Fn(f64, f64) -> bool,
    {
        let mut current = self.0.load(Ordering::Acquire);
        while better(value, f64::from_bits(current)) {
            match self.0.compare_exchange_weak(
                current,
                value.to_bits(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }
}

/// Extrema and orbit length gathered by one worker over its range.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LocalStats {
    /// The smallest value produced
    pub min: f64,
    /// The largest value produced
    pub max: f64,
    /// The longest history seen
    pub max_orbit: usize,
    /// Whether any processed cell is still `Incomplete`
    pub unsettled: bool,
}

impl Default for LocalStats {
    fn default() -> Self {
        LocalStats {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            max_orbit: 0,
            unsettled: false,
        }
    }
}

impl LocalStats {
    /// Fold one freshly produced value into the stats.  NaN compares
    /// false against everything and so never becomes an extremum.
    pub fn observe(&mut self, value: f64, history_len: usize) {
        if value > self.max {
            self.max = value;
        }
        if value < self.min {
            self.min = value;
        }
        if history_len > self.max_orbit {
            self.max_orbit = history_len;
        }
    }
}

/// The cross-worker accumulators for one tick.
pub struct Accumulators {
    max: AtomicF64,
    min: AtomicF64,
    max_orbit: AtomicUsize,
    unsettled: AtomicBool,
    worker_nanos: AtomicU64,
}

impl Default for Accumulators {
    fn default() -> Self {
        Accumulators::new()
    }
}

impl Accumulators {
    /// Fresh accumulators: max at negative infinity, min at positive
    /// infinity, everything else zeroed.
    pub fn new() -> Self {
        Accumulators {
            max: AtomicF64::new(f64::NEG_INFINITY),
            min: AtomicF64::new(f64::INFINITY),
            max_orbit: AtomicUsize::new(0),
            unsettled: AtomicBool::new(false),
            worker_nanos: AtomicU64::new(0),
        }
    }

    /// Put everything back to its starting value.  Only called between
    /// ticks, when no worker is running.
    pub fn reset(&self) {
        self.max.store(f64::NEG_INFINITY);
        self.min.store(f64::INFINITY);
        self.max_orbit.store(0, Ordering::Release);
        self.unsettled.store(false, Ordering::Release);
        self.worker_nanos.store(0, Ordering::Release);
    }

    /// Fold one worker's results in.
    pub fn merge(&self, stats: &LocalStats) {
        self.max.update_if(stats.max, |candidate, current| candidate > current);
        self.min.update_if(stats.min, |candidate, current| candidate < current);
        self.max_orbit.fetch_max(stats.max_orbit, Ordering::AcqRel);
        if stats.unsettled {
            self.mark_unsettled();
        }
    }

    /// Record that at least one cell has not settled this tick.
    pub fn mark_unsettled(&self) {
        self.unsettled.store(true, Ordering::Release);
    }

    /// Add a worker's elapsed time.
    pub fn add_worker_time(&self, elapsed: Duration) {
        let nanos = elapsed.as_secs() * 1_000_000_000 + u64::from(elapsed.subsec_nanos());
        self.worker_nanos.fetch_add(nanos, Ordering::AcqRel);
    }

    /// The largest value produced this tick.
    pub fn max(&self) -> f64 {
        self.max.load()
    }

    /// The smallest value produced this tick.
    pub fn min(&self) -> f64 {
        self.min.load()
    }

    /// The longest history observed this tick.
    pub fn max_orbit(&self) -> usize {
        self.max_orbit.load(Ordering::Acquire)
    }

    /// True if any worker left a cell `Incomplete`, or failed.
    pub fn unsettled(&self) -> bool {
        self.unsettled.load(Ordering::Acquire)
    }

    /// The summed elapsed time of all workers.
    pub fn worker_time(&self) -> Duration {
        Duration::from_nanos(self.worker_nanos.load(Ordering::Acquire))
    }
}
