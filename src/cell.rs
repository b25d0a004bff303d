// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A single cell of the population: one evolving value and what we
//! have learned about where it is going.
//!
//! Every value a cell takes on, including its initial value, is run
//! through the same classifier.  A cell that hits exactly zero or
//! exactly one has reached a fixed point; a cell that produces a value
//! it has already produced is in a cycle, and the cycle is the slice
//! of its history from the first appearance of that value onward.
//! Comparisons are exact.  There is no tolerance: two values that
//! differ in the last bit are different values.  When looking a value
//! up in the history, every NaN is the same value, so a cell stuck on
//! NaN closes a one-cycle like any other repeated value.

use std::collections::VecDeque;
use std::fmt;

/// The number of recent values a cell remembers for cycle detection.
/// Orbits longer than this are never detected.
pub const HISTORY_LIMIT: usize = 50;

/// History membership: bitwise, except that all NaNs match.
fn same_value(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || a.to_bits() == b.to_bits()
}

/// Describes the column and row of a cell in the grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Position(pub usize, pub usize);

/// What the classifier has concluded about a cell.
///
/// The transition out of `Incomplete` happens at most once.  Note that
/// a `Cycle` cell is still iterated on every tick; only `Zero` and
/// `One` are truly at rest.  This is the long-standing behavior of the
/// visualizer and is kept so that cycling cells keep moving around
/// their orbit on screen.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// No fixed point or cycle found yet.
    Incomplete,
    /// The cell reached exactly zero.
    Zero,
    /// The cell reached exactly one.
    One,
    /// The cell produced a value already present in its history.
    Cycle,
}

impl Status {
    /// True for any status other than `Incomplete`.
    pub fn is_settled(self) -> bool {
        self != Status::Incomplete
    }

    /// True if a worker should still apply the transform to a cell in
    /// this state.
    pub fn is_active(self) -> bool {
        match self {
            Status::Incomplete | Status::Cycle => true,
            Status::Zero | Status::One => false,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            Status::Incomplete => "Incomplete",
            Status::Zero => "Zero",
            Status::One => "One",
            Status::Cycle => "Cycle",
        };
        f.write_str(name)
    }
}

/// One element of the population.
#[derive(Clone, Debug)]
pub struct Cell {
    position: Position,
    value: f64,
    history: VecDeque<f64>,
    status: Status,
    orbit: Vec<f64>,
}

impl Cell {
    /// Creates a cell at a position and classifies its initial value.
    pub fn new(position: Position, initial: f64) -> Self {
        let mut cell = Cell {
            position,
            value: initial,
            history: VecDeque::with_capacity(HISTORY_LIMIT + 1),
            status: Status::Incomplete,
            orbit: Vec::new(),
        };
        cell.set(initial);
        cell
    }

    /// Store a freshly produced value and classify it.
    ///
    /// Classification only runs while the cell is `Incomplete`.  The
    /// value is recorded in the history regardless, which means a
    /// `Cycle` cell whose value drifts (say, through rounding) keeps
    /// growing its history even though its orbit is fixed.
    pub fn set(&mut self, value: f64) {
        self.value = value;

        if self.status == Status::Incomplete {
            if value == 0.0 {
                self.settle(Status::Zero, vec![0.0]);
            } else if value == 1.0 {
                self.settle(Status::One, vec![1.0]);
            } else if let Some(first) = self
                .history
                .iter()
                .position(|&seen| same_value(seen, value))
            {
                let orbit = self.history.iter().skip(first).cloned().collect();
                self.settle(Status::Cycle, orbit);
            }
        }

        if !self.history.iter().any(|&seen| same_value(seen, value)) {
            self.history.push_back(value);
            if self.history.len() > HISTORY_LIMIT {
                self.history.pop_front();
            }
        }
    }

    fn settle(&mut self, status: Status, orbit: Vec<f64>) {
        debug_assert_eq!(self.status, Status::Incomplete);
        self.status = status;
        self.orbit = orbit;
    }

    /// Where the cell lives in the grid.
    pub fn position(&self) -> Position {
        self.position
    }

    /// The current value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// The classifier's verdict.
    pub fn status(&self) -> Status {
        self.status
    }

    /// The recent distinct values, oldest first.
    pub fn history(&self) -> &VecDeque<f64> {
        &self.history
    }

    /// The detected orbit.  Empty while the cell is `Incomplete`.
    pub fn orbit(&self) -> &[f64] {
        &self.orbit
    }

    /// The length of the detected orbit, 0 while `Incomplete`.
    pub fn orbit_period(&self) -> usize {
        self.orbit.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(initial: f64) -> Cell {
        Cell::new(Position(0, 0), initial)
    }

    #[test]
    fn initial_value_is_remembered() {
        let c = cell(5.0);
        assert_eq!(c.status(), Status::Incomplete);
        assert_eq!(c.history().len(), 1);
        assert_eq!(c.orbit_period(), 0);
        assert!(c.orbit().is_empty());
    }

    #[test]
    fn initial_fixed_points_settle_immediately() {
        let c = cell(1.0);
        assert_eq!(c.status(), Status::One);
        assert_eq!(c.orbit(), &[1.0]);
        let c = cell(0.0);
        assert_eq!(c.status(), Status::Zero);
        assert_eq!(c.orbit(), &[0.0]);
        assert_eq!(c.orbit_period(), 1);
    }

    #[test]
    fn repeated_value_is_a_one_cycle() {
        let mut c = cell(5.0);
        c.set(5.0);
        assert_eq!(c.status(), Status::Cycle);
        assert_eq!(c.orbit(), &[5.0]);
        assert_eq!(c.orbit_period(), 1);
        assert_eq!(c.history().len(), 1);
    }

    #[test]
    fn orbit_starts_at_first_occurrence() {
        let mut c = cell(2.0);
        for v in &[3.0, 4.0, 7.0, 3.0] {
            c.set(*v);
        }
        assert_eq!(c.status(), Status::Cycle);
        assert_eq!(c.orbit(), &[3.0, 4.0, 7.0]);
        assert_eq!(c.orbit_period(), 3);
    }

    #[test]
    fn status_is_sticky() {
        let mut c = cell(2.0);
        c.set(2.0);
        assert_eq!(c.status(), Status::Cycle);
        c.set(1.0);
        assert_eq!(c.status(), Status::Cycle);
        c.set(0.0);
        assert_eq!(c.status(), Status::Cycle);
        assert_eq!(c.orbit(), &[2.0]);

        let mut c = cell(1.0);
        c.set(1.0);
        c.set(0.0);
        assert_eq!(c.status(), Status::One);
    }

    #[test]
    fn cycling_cells_keep_growing_history() {
        let mut c = cell(2.0);
        c.set(2.0);
        c.set(9.0);
        c.set(10.0);
        assert_eq!(c.value(), 10.0);
        assert_eq!(c.history().iter().cloned().collect::<Vec<_>>(), vec![2.0, 9.0, 10.0]);
        assert_eq!(c.orbit(), &[2.0]);
    }

    #[test]
    fn history_is_capped_and_evicts_oldest_first() {
        let mut c = cell(2.0);
        for i in 3..200 {
            c.set(i as f64);
            assert!(c.history().len() <= HISTORY_LIMIT);
        }
        assert_eq!(c.history().len(), HISTORY_LIMIT);
        assert_eq!(c.history().front(), Some(&150.0));
        assert_eq!(c.history().back(), Some(&199.0));
        assert_eq!(c.status(), Status::Incomplete);
    }

    #[test]
    fn evicted_values_no_longer_close_a_cycle() {
        let mut c = cell(2.0);
        for i in 3..(3 + HISTORY_LIMIT) {
            c.set(i as f64);
        }
        assert!(!c.history().contains(&2.0));
        c.set(2.0);
        assert_eq!(c.status(), Status::Incomplete);
    }

    #[test]
    fn comparisons_are_exact() {
        let mut c = cell(0.1 + 0.2);
        c.set(0.3);
        assert_eq!(c.status(), Status::Incomplete);
        c.set(1.0 - 1e-16);
        assert_eq!(c.status(), Status::Incomplete);
    }

    #[test]
    fn repeated_nan_is_a_one_cycle() {
        let mut c = cell(4.0);
        c.set(::std::f64::NAN);
        assert_eq!(c.status(), Status::Incomplete);
        c.set(-::std::f64::NAN);
        assert_eq!(c.status(), Status::Cycle);
        assert_eq!(c.orbit_period(), 1);
        assert!(c.orbit()[0].is_nan());
        for _ in 0..10 {
            c.set(::std::f64::NAN);
        }
        assert_eq!(c.history().len(), 2);
    }

    #[test]
    fn signed_zeros_are_distinct_in_history() {
        let mut c = cell(-0.0);
        assert_eq!(c.status(), Status::Zero);
        c.set(0.0);
        assert_eq!(c.history().len(), 2);
    }

    #[test]
    fn infinity_cycles_on_itself() {
        let mut c = cell(::std::f64::INFINITY);
        c.set(::std::f64::INFINITY);
        assert_eq!(c.status(), Status::Cycle);
        assert_eq!(c.orbit_period(), 1);
    }
}
