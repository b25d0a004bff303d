// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The fixed grid of cells.  Cells are stored row-major, so the cell at
//! column `c`, row `r` lives at offset `r * width + c`.

use itertools::{Itertools, MinMaxResult};

use cell::{Cell, Position, Status};

/// All of the cells being iterated, created once and never resized.
#[derive(Clone, Debug)]
pub struct Population {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

/// How many cells are in each state.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusCounts {
    /// Cells with no verdict yet
    pub incomplete: usize,
    /// Cells that reached zero
    pub zero: usize,
    /// Cells that reached one
    pub one: usize,
    /// Cells caught in a cycle
    pub cycle: usize,
}

/// The starting value for the cell at a given position: `2^column +
/// 2^row`.  Large grids overflow to infinity in the far corner, which
/// the classifier treats as a one-cycle.
pub fn seed_value(position: Position) -> f64 {
    2f64.powi(position.0 as i32) + 2f64.powi(position.1 as i32)
}

impl Population {
    /// Builds a `width` by `height` grid seeded with `seed_value`.
    pub fn new(width: usize, height: usize) -> Self {
        Population::from_fn(width, height, seed_value)
    }

    /// Builds a grid whose initial values come from a function of the
    /// cell position.
    pub fn from_fn<F>(width: usize, height: usize, seed: F) -> Self
    where
        F: Fn(Position) -> f64,
    {
        let cells = (0..width * height)
            .map(|index| {
                let position = Population::position_of(width, index);
                Cell::new(position, seed(position))
            })
            .collect();
        Population {
            width,
            height,
            cells,
        }
    }

    /// Builds a single-row population from explicit initial values.
    pub fn from_values(values: &[f64]) -> Self {
        let cells = values
            .iter()
            .enumerate()
            .map(|(index, &v)| Cell::new(Position(index, 0), v))
            .collect();
        Population {
            width: values.len(),
            height: if values.is_empty() { 0 } else { 1 },
            cells,
        }
    }

    fn position_of(width: usize, index: usize) -> Position {
        Position(index % width, index / width)
    }

    /// Grid width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The total number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True if the grid has no cells at all.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All cells, row-major.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Mutable access for the tick workers, which split this slice
    /// into disjoint partitions.
    pub(crate) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// The cell at a column and row, if it is inside the grid.
    pub fn cell_at(&self, column: usize, row: usize) -> Option<&Cell> {
        if column >= self.width || row >= self.height {
            return None;
        }
        self.cells.get(row * self.width + column)
    }

    /// The trip length (orbit length) of the cell at a column and row.
    pub fn trip_length_at(&self, column: usize, row: usize) -> Option<usize> {
        self.cell_at(column, row).map(Cell::orbit_period)
    }

    /// Tally the cells by status.
    pub fn status_counts(&self) -> StatusCounts {
        self.cells
            .iter()
            .fold(StatusCounts::default(), |mut counts, cell| {
                match cell.status() {
                    Status::Incomplete => counts.incomplete += 1,
                    Status::Zero => counts.zero += 1,
                    Status::One => counts.one += 1,
                    Status::Cycle => counts.cycle += 1,
                }
                counts
            })
    }

    /// True once no cell is `Incomplete`.
    pub fn is_settled(&self) -> bool {
        self.cells.iter().all(|c| c.status().is_settled())
    }

    /// The smallest and largest current values, ignoring NaN.
    pub fn extrema(&self) -> Option<(f64, f64)> {
        match self
            .cells
            .iter()
            .map(Cell::value)
            .filter(|v| !v.is_nan())
            .minmax_by(|a, b| a.partial_cmp(b).unwrap_or(::std::cmp::Ordering::Equal))
        {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(v) => Some((v, v)),
            MinMaxResult::MinMax(lo, hi) => Some((lo, hi)),
        }
    }

    /// The longest history held by any cell.
    pub fn longest_history(&self) -> usize {
        self.cells
            .iter()
            .map(|c| c.history().len())
            .max()
            .unwrap_or(0)
    }
}
