#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Nonlinear map visualizer engine
//!
//! Take a grid of numbers and apply the same function to every one of
//! them, over and over.  Some of them fall to one, or to zero, and stay
//! there.  Some of them come back to a value they have already visited
//! and so are trapped in a cycle forever.  The rest wander off, or
//! wander long enough that we lose track of where they have been.  The
//! pictures a visualizer makes of this are pictures of which cells end
//! up where, and how long it takes them to get there.
//!
//! This crate is the part of such a visualizer that does the work: the
//! population of cells, the classifier that decides when a cell has
//! settled, and the machinery that advances the whole population one
//! "tick" at a time across a pool of worker threads.  Each worker owns
//! a contiguous slice of the grid for the duration of a tick; only the
//! running minimum, maximum and orbit-length statistics are shared
//! between them.  Drawing the result is somebody else's job.

extern crate crossbeam;
#[macro_use]
extern crate failure;
extern crate itertools;
#[macro_use]
extern crate log;
extern crate rand;

pub mod accumulators;
pub mod cell;
pub mod config;
pub mod engine;
pub mod errors;
pub mod partition;
pub mod population;
pub mod scheduler;
pub mod snapshot;
pub mod state;
pub mod timings;
pub mod transforms;
pub mod worker;

pub use cell::{Cell, Position, Status, HISTORY_LIMIT};
pub use config::Config;
pub use engine::{Engine, SharedEngine, TickOutcome, TickReport};
pub use population::Population;
pub use scheduler::{Scheduler, SchedulerEvent};
pub use snapshot::{CellView, Snapshot};
pub use state::{ProcessStatus, RunState};
pub use transforms::Transform;
