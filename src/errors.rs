// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error types.  None of these abort a run: configuration errors are
//! reported and replaced by defaults, and worker faults are confined
//! to the partition that raised them.

use std::any::Any;
use std::ops::Range;

/// Something in the startup configuration that could not be honored.
/// The configuration pass logs these and substitutes the default.
#[derive(Debug, Fail, PartialEq)]
pub enum ConfigError {
    /// Width or height of the cell grid was zero.
    #[fail(display = "grid dimensions must be positive, got {}x{}", width, height)]
    InvalidDimensions {
        /// Requested grid width
        width: usize,
        /// Requested grid height
        height: usize,
    },

    /// The worker pool must have at least one worker.
    #[fail(display = "thread count must be positive, got {}", _0)]
    InvalidThreadCount(usize),

    /// The scheduler cannot run at zero ticks per second.
    #[fail(display = "ticks per second must be positive, got {}", _0)]
    InvalidTickRate(u32),

    /// No transform is registered under this name.
    #[fail(display = "unknown transform \"{}\"", _0)]
    UnknownTransform(String),
}

/// A worker panicked while evaluating the transform over its range.
#[derive(Debug, Fail)]
#[fail(display = "worker for cells {:?} faulted: {}", range, message)]
pub struct WorkerFault {
    /// The partition the worker owned.
    pub range: Range<usize>,
    /// The panic payload, if it was a string.
    pub message: String,
}

impl WorkerFault {
    /// Build a fault report out of a caught panic payload.
    pub fn from_panic(range: Range<usize>, payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        WorkerFault { range, message }
    }
}
