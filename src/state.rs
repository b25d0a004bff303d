// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Process-wide run state.
//!
//! Everything about the run that more than one party looks at lives
//! here: the coordinator writes the iteration count and the terminal
//! flags, workers bump the live worker count, and the input side flips
//! the mode and display toggles.  It is shared as an `Arc<RunState>`
//! and every field is atomic, so the input side never has to wait for
//! a tick to finish to pause the run.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// The one-line summary of where a run stands.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProcessStatus {
    /// Ticks only run on request.
    Manual,
    /// The scheduler is ticking.
    AutoRunning,
    /// Automatic, but paused.
    AutoPaused,
    /// Automatic and the iteration cap was hit.
    ReachedMaxIterations,
    /// Every cell has settled.
    FinishedIterating,
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            ProcessStatus::Manual => "Manual",
            ProcessStatus::AutoRunning => "Auto Running",
            ProcessStatus::AutoPaused => "Auto Paused",
            ProcessStatus::ReachedMaxIterations => "Reached Max Iterations",
            ProcessStatus::FinishedIterating => "Finished Iterating",
        })
    }
}

/// Shared flags and counters for one run.
#[derive(Debug)]
pub struct RunState {
    iteration: AtomicUsize,
    running_workers: AtomicUsize,
    all_settled: AtomicBool,
    max_announced: AtomicBool,
    paused: AtomicBool,
    automatic: AtomicBool,
    status_colors: AtomicBool,
    trip_length_colors: AtomicBool,
    max_iterations: usize,
}

impl RunState {
    /// A fresh run.  `max_iterations` of zero means no cap.
    pub fn new(automatic: bool, max_iterations: usize) -> Self {
        RunState {
            iteration: AtomicUsize::new(0),
            running_workers: AtomicUsize::new(0),
            all_settled: AtomicBool::new(false),
            max_announced: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            automatic: AtomicBool::new(automatic),
            status_colors: AtomicBool::new(false),
            trip_length_colors: AtomicBool::new(false),
            max_iterations,
        }
    }

    /// Completed ticks so far.
    pub fn iteration(&self) -> usize {
        self.iteration.load(Ordering::SeqCst)
    }

    pub(crate) fn complete_iteration(&self) -> usize {
        self.iteration.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The iteration cap, 0 for none.
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// True when running automatically and the cap has been hit.
    pub fn cap_reached(&self) -> bool {
        self.is_automatic() && self.max_iterations > 0 && self.iteration() >= self.max_iterations
    }

    /// Workers currently inside a tick.
    pub fn running_workers(&self) -> usize {
        self.running_workers.load(Ordering::SeqCst)
    }

    /// Count a worker as running until the guard is dropped.
    pub(crate) fn worker_guard(&self) -> WorkerGuard {
        self.running_workers.fetch_add(1, Ordering::SeqCst);
        WorkerGuard { state: self }
    }

    /// True once no cell is `Incomplete`.
    pub fn all_settled(&self) -> bool {
        self.all_settled.load(Ordering::SeqCst)
    }

    /// Marks the run settled; returns true the first time.
    pub(crate) fn mark_settled(&self) -> bool {
        !self.all_settled.swap(true, Ordering::SeqCst)
    }

    /// Returns true only the first time the cap refuses a tick, so the
    /// refusal is logged once.
    pub(crate) fn announce_max_reached(&self) -> bool {
        !self.max_announced.swap(true, Ordering::SeqCst)
    }

    /// True if no further tick will run without a mode change.
    pub fn is_finished(&self) -> bool {
        self.all_settled() || self.cap_reached()
    }

    /// Whether automatic ticking is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Whether the scheduler drives ticks.
    pub fn is_automatic(&self) -> bool {
        self.automatic.load(Ordering::SeqCst)
    }

    /// Switch between manual and automatic ticking.  Leaving automatic
    /// mode clears the pause.  Ignored once the run has settled.
    pub fn toggle_automatic(&self) -> bool {
        if self.all_settled() {
            return self.is_automatic();
        }
        let automatic = !self.automatic.fetch_xor(true, Ordering::SeqCst);
        if !automatic {
            self.paused.store(false, Ordering::SeqCst);
        }
        info!("switched to {} mode", if automatic { "automatic" } else { "manual" });
        automatic
    }

    /// Pause or resume automatic ticking.  Has no effect in manual mode
    /// or once the run has settled.
    pub fn toggle_paused(&self) -> bool {
        if !self.is_automatic() || self.all_settled() {
            return self.is_paused();
        }
        let paused = !self.paused.fetch_xor(true, Ordering::SeqCst);
        info!("{}", if paused { "paused" } else { "resumed" });
        paused
    }

    /// Whether the renderer colors cells by status.
    pub fn status_colors(&self) -> bool {
        self.status_colors.load(Ordering::SeqCst)
    }

    /// Whether the renderer colors cells by trip length instead of value.
    pub fn trip_length_colors(&self) -> bool {
        self.trip_length_colors.load(Ordering::SeqCst)
    }

    /// Set both display toggles.
    pub fn set_display(&self, status_colors: bool, trip_length_colors: bool) {
        self.status_colors.store(status_colors, Ordering::SeqCst);
        self.trip_length_colors.store(trip_length_colors, Ordering::SeqCst);
    }

    /// Flip coloring by status.
    pub fn toggle_status_colors(&self) -> bool {
        !self.status_colors.fetch_xor(true, Ordering::SeqCst)
    }

    /// Flip coloring by trip length.
    pub fn toggle_trip_length_colors(&self) -> bool {
        !self.trip_length_colors.fetch_xor(true, Ordering::SeqCst)
    }

    /// Summarize the run for display.
    pub fn process_status(&self) -> ProcessStatus {
        if self.all_settled() {
            ProcessStatus::FinishedIterating
        } else if self.cap_reached() {
            ProcessStatus::ReachedMaxIterations
        } else if !self.is_automatic() {
            ProcessStatus::Manual
        } else if self.is_paused() {
            ProcessStatus::AutoPaused
        } else {
            ProcessStatus::AutoRunning
        }
    }
}

/// Decrements the running worker count when dropped, including when
/// the worker unwinds.
pub(crate) struct WorkerGuard<'a> {
    state: &'a RunState,
}

impl<'a> Drop for WorkerGuard<'a> {
    fn drop(&mut self) {
        self.state.running_workers.fetch_sub(1, Ordering::SeqCst);
    }
}
