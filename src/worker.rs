// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! One worker's share of a tick.
//!
//! A worker owns its partition outright for the duration of the tick:
//! it is handed a `&mut [Cell]` that no other worker can see, so cell
//! updates need no locking.  Only the accumulators are shared.

use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use accumulators::{Accumulators, LocalStats};
use cell::{Cell, Status};
use errors::WorkerFault;
use state::RunState;
use transforms::Transform;

/// What a worker did with its partition.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkerReport {
    /// The partition, as offsets into the population
    pub range: Range<usize>,
    /// Cells the transform was applied to
    pub processed: usize,
    /// Extrema and orbit lengths over the processed cells
    pub stats: LocalStats,
    /// Time spent on the partition
    pub elapsed: Duration,
}

/// Apply `transform` to every active cell of `cells`, the partition at
/// `range` of the population.
///
/// New values for the whole partition are computed before any cell is
/// touched.  If the transform panics partway through, the partition is
/// left exactly as it was, the tick is flagged as unsettled, and the
/// panic comes back as a `WorkerFault`.
pub fn run(
    range: Range<usize>,
    cells: &mut [Cell],
    transform: &Transform,
    accumulators: &Accumulators,
    state: &RunState,
) -> Result<WorkerReport, WorkerFault> {
    let _running = state.worker_guard();
    let start = Instant::now();

    let produced = panic::catch_unwind(AssertUnwindSafe(|| {
        cells
            .iter()
            .map(|cell| {
                if cell.status().is_active() {
                    Some(transform.apply(cell.value()))
                } else {
                    None
                }
            })
            .collect::<Vec<Option<f64>>>()
    }));

    let produced = match produced {
        Ok(produced) => produced,
        Err(payload) => {
            accumulators.mark_unsettled();
            accumulators.add_worker_time(start.elapsed());
            return Err(WorkerFault::from_panic(range, payload));
        }
    };

    let mut stats = LocalStats::default();
    let mut processed = 0;
    for (cell, value) in cells.iter_mut().zip(produced) {
        if let Some(value) = value {
            cell.set(value);
            processed += 1;
            if cell.status() == Status::Incomplete {
                stats.unsettled = true;
            }
            stats.observe(value, cell.history().len());
        }
    }

    accumulators.merge(&stats);
    let elapsed = start.elapsed();
    accumulators.add_worker_time(elapsed);

    Ok(WorkerReport {
        range,
        processed,
        stats,
        elapsed,
    })
}
