// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A read-only copy of the engine for whoever draws it.

use cell::{Cell, Position, Status};
use population::StatusCounts;
use state::ProcessStatus;

/// What the renderer needs to know about one cell.
#[derive(Clone, Debug, PartialEq)]
pub struct CellView {
    /// Column and row
    pub position: Position,
    /// Current value
    pub value: f64,
    /// Classifier verdict
    pub status: Status,
    /// Detected orbit, empty while incomplete
    pub orbit: Vec<f64>,
    /// Length of the orbit
    pub orbit_period: usize,
    /// Number of distinct recent values remembered
    pub history_len: usize,
}

impl<'a> From<&'a Cell> for CellView {
    fn from(cell: &'a Cell) -> Self {
        CellView {
            position: cell.position(),
            value: cell.value(),
            status: cell.status(),
            orbit: cell.orbit().to_vec(),
            orbit_period: cell.orbit_period(),
            history_len: cell.history().len(),
        }
    }
}

/// The whole engine as of the last completed tick.
#[derive(Clone, Debug)]
pub struct Snapshot {
    /// Grid width
    pub width: usize,
    /// Grid height
    pub height: usize,
    /// Every cell, row-major
    pub cells: Vec<CellView>,
    /// Largest value produced by the last tick
    pub current_max: f64,
    /// Smallest value produced by the last tick
    pub current_min: f64,
    /// Longest history observed by the last tick
    pub current_max_orbit: usize,
    /// Completed ticks
    pub iteration: usize,
    /// True once no cell is incomplete
    pub all_settled: bool,
    /// Rolling average wall-clock tick time, ms
    pub average_tick_ms: f64,
    /// Rolling average per-worker time, ms
    pub average_worker_ms: f64,
    /// Label of the transform being iterated
    pub transform: &'static str,
    /// Configured worker count
    pub threads: usize,
    /// Workers running right now
    pub running_workers: usize,
    /// Where the run stands
    pub process_status: ProcessStatus,
    /// Renderer hint: color by status
    pub status_colors: bool,
    /// Renderer hint: color by trip length
    pub trip_length_colors: bool,
    /// Cells per status
    pub counts: StatusCounts,
}

impl Snapshot {
    /// The cell at a column and row, if inside the grid.
    pub fn cell_at(&self, column: usize, row: usize) -> Option<&CellView> {
        if column >= self.width || row >= self.height {
            return None;
        }
        self.cells.get(row * self.width + column)
    }
}
