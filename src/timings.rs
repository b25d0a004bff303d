// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Rolling averages of how long ticks take.

use std::collections::VecDeque;
use std::time::Duration;

/// How many samples each window keeps.
pub const TIMING_WINDOW: usize = 60;

/// Converts a duration to fractional milliseconds.
pub fn millis(d: Duration) -> f64 {
    d.as_secs() as f64 * 1_000.0 + f64::from(d.subsec_nanos()) / 1_000_000.0
}

/// A fixed-capacity window of samples with a running average.
#[derive(Clone, Debug)]
pub struct RollingWindow {
    capacity: usize,
    samples: VecDeque<f64>,
    average: f64,
}

impl RollingWindow {
    /// An empty window holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        RollingWindow {
            capacity: capacity.max(1),
            samples: VecDeque::with_capacity(capacity.max(1)),
            average: 0.0,
        }
    }

    /// Add a sample, evicting the oldest if full, and return the new
    /// average.
    pub fn push(&mut self, sample: f64) -> f64 {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
        self.average = self.samples.iter().sum::<f64>() / self.samples.len() as f64;
        self.average
    }

    /// The average of the samples in the window, 0 when empty.
    pub fn average(&self) -> f64 {
        self.average
    }

    /// The number of samples currently held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True before the first sample.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Coordinator-side and worker-side timings, in milliseconds.
#[derive(Clone, Debug)]
pub struct TickTimings {
    tick: RollingWindow,
    worker: RollingWindow,
}

impl Default for TickTimings {
    fn default() -> Self {
        TickTimings {
            tick: RollingWindow::new(TIMING_WINDOW),
            worker: RollingWindow::new(TIMING_WINDOW),
        }
    }
}

impl TickTimings {
    /// Record one tick's wall-clock duration and the mean duration of
    /// its workers.
    pub fn record(&mut self, tick: Duration, mean_worker: Duration) {
        self.tick.push(millis(tick));
        self.worker.push(millis(mean_worker));
    }

    /// Average wall-clock tick duration, ms.
    pub fn average_tick_ms(&self) -> f64 {
        self.tick.average()
    }

    /// Average per-worker duration, ms.
    pub fn average_worker_ms(&self) -> f64 {
        self.worker.average()
    }

    /// Number of ticks in the window.
    pub fn samples(&self) -> usize {
        self.tick.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_evicts_oldest() {
        let mut w = RollingWindow::new(3);
        assert!(w.is_empty());
        assert_eq!(w.push(3.0), 3.0);
        assert_eq!(w.push(6.0), 4.5);
        assert_eq!(w.push(9.0), 6.0);
        assert_eq!(w.push(12.0), 9.0);
        assert_eq!(w.len(), 3);
    }

    #[test]
    fn tick_timings_cap_at_sixty() {
        let mut t = TickTimings::default();
        for i in 0..100 {
            t.record(Duration::from_millis(i), Duration::from_millis(2));
        }
        assert_eq!(t.samples(), TIMING_WINDOW);
        // the window holds 40..100
        assert_eq!(t.average_tick_ms(), 69.5);
        assert_eq!(t.average_worker_ms(), 2.0);
    }

    #[test]
    fn millis_is_fractional() {
        assert_eq!(millis(Duration::from_micros(1500)), 1.5);
        assert_eq!(millis(Duration::from_secs(2)), 2000.0);
    }
}
