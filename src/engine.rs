// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The tick coordinator.
//!
//! A tick partitions the population, hands every worker exclusive
//! ownership of one partition, and blocks until all of them are done.
//! Ticks never overlap: `run_tick` takes the engine by `&mut`, and when
//! the engine is shared with the scheduler it sits behind a mutex that
//! is held for the whole tick.

use crossbeam;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use accumulators::{Accumulators, LocalStats};
use cell::Cell;
use config::Config;
use errors::WorkerFault;
use partition::{partition, split};
use population::Population;
use snapshot::{CellView, Snapshot};
use state::RunState;
use timings::{millis, TickTimings};
use transforms::{self, Transform};
use worker::{self, WorkerReport};

/// An engine shared between the scheduler and the input side.
pub type SharedEngine = Arc<Mutex<Engine>>;

/// Statistics for one completed tick.
#[derive(Clone, Debug, PartialEq)]
pub struct TickReport {
    /// The iteration number this tick completed
    pub iteration: usize,
    /// Wall-clock time of the whole tick
    pub duration: Duration,
    /// Mean time per worker
    pub mean_worker_time: Duration,
    /// Workers that ran
    pub workers: usize,
    /// Workers whose partition made no progress
    pub faults: usize,
    /// Largest value produced
    pub max: f64,
    /// Smallest value produced
    pub min: f64,
    /// Longest history seen
    pub max_orbit: usize,
    /// True if this tick settled the last incomplete cell
    pub settled: bool,
}

/// The result of asking for a tick.
#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    /// A tick ran.
    Ticked(TickReport),
    /// Nothing to do: every cell had already settled.
    Settled {
        /// Ticks it took to get there
        iterations: usize,
    },
    /// Refused: the automatic iteration cap has been reached.
    MaxIterationsReached {
        /// The cap
        max: usize,
    },
    /// Refused: automatic ticking is paused.
    Paused,
}

impl TickOutcome {
    /// True if no further tick will run.
    pub fn is_terminal(&self) -> bool {
        match *self {
            TickOutcome::Ticked(ref report) => report.settled,
            TickOutcome::Settled { .. } | TickOutcome::MaxIterationsReached { .. } => true,
            TickOutcome::Paused => false,
        }
    }
}

/// Owns the population and everything needed to advance it.
pub struct Engine {
    population: Population,
    transform: Transform,
    threads: usize,
    accumulators: Accumulators,
    timings: TickTimings,
    state: Arc<RunState>,
}

impl Engine {
    /// Builds an engine from a startup configuration.  Invalid options
    /// are replaced by their defaults.
    pub fn new(config: Config) -> Self {
        let config = config.sanitized();
        let state = RunState::new(config.automatic, config.max_iterations);
        state.set_display(config.status_colors, config.trip_length_colors);
        let transform = *config.resolve_transform();
        info!(
            "{}x{} cells, {} worker(s), iterating {}",
            config.width, config.height, config.threads, transform.label
        );
        Engine::from_parts(
            Population::new(config.width, config.height),
            transform,
            config.threads,
            state,
        )
    }

    /// Builds an engine around an existing population.
    pub fn from_parts(
        population: Population,
        transform: Transform,
        threads: usize,
        state: RunState,
    ) -> Self {
        let accumulators = Accumulators::new();
        if let Some((min, max)) = population.extrema() {
            accumulators.merge(&LocalStats {
                min,
                max,
                max_orbit: population.longest_history(),
                unsettled: false,
            });
        }
        Engine {
            population,
            transform,
            threads: threads.max(1),
            accumulators,
            timings: TickTimings::default(),
            state: Arc::new(state),
        }
    }

    /// Wrap the engine for sharing with a scheduler.
    pub fn into_shared(self) -> SharedEngine {
        Arc::new(Mutex::new(self))
    }

    /// Advance every active cell by one application of the transform.
    ///
    /// Refuses, without touching anything, when the run has settled,
    /// when the automatic iteration cap has been reached, or when
    /// paused.  Worker faults are logged and reflected in the report;
    /// they are never returned as errors.
    pub fn run_tick(&mut self) -> TickOutcome {
        if self.state.all_settled() {
            return TickOutcome::Settled {
                iterations: self.state.iteration(),
            };
        }
        if self.state.cap_reached() {
            let max = self.state.max_iterations();
            if self.state.announce_max_reached() {
                info!("finished iterating: reached max configured iterations ({})", max);
            }
            return TickOutcome::MaxIterationsReached { max };
        }
        if self.state.is_paused() {
            return TickOutcome::Paused;
        }

        let started = Instant::now();
        self.accumulators.reset();

        let results = self.dispatch();
        let workers = results.len();
        let mut faults = 0;
        for result in results {
            match result {
                Ok(report) => trace!(
                    "cells {:?}: {} processed in {:.3}ms",
                    report.range,
                    report.processed,
                    millis(report.elapsed)
                ),
                Err(fault) => {
                    error!("{}", fault);
                    self.accumulators.mark_unsettled();
                    faults += 1;
                }
            }
        }

        let iteration = self.state.complete_iteration();
        let settled = !self.accumulators.unsettled();
        let duration = started.elapsed();
        let mean_worker_time = self.accumulators.worker_time() / workers.max(1) as u32;
        self.timings.record(duration, mean_worker_time);
        debug!(
            "iteration #{} took {:.3}ms ({:.3}ms per worker)",
            iteration,
            millis(duration),
            millis(mean_worker_time)
        );

        if settled && self.state.mark_settled() {
            info!(
                "finished iterating: every cell reached 1, 0, or a cycle; took {} iterations",
                iteration
            );
        }

        TickOutcome::Ticked(TickReport {
            iteration,
            duration,
            mean_worker_time,
            workers,
            faults,
            max: self.accumulators.max(),
            min: self.accumulators.min(),
            max_orbit: self.accumulators.max_orbit(),
            settled,
        })
    }

    /// Run every partition and collect what the workers report.  With a
    /// single worker the tick runs on the calling thread.
    fn dispatch(&mut self) -> Vec<Result<WorkerReport, WorkerFault>> {
        let len = self.population.len();
        let transform = self.transform;
        let accumulators = &self.accumulators;
        let state = &*self.state;

        if self.threads == 1 {
            if len == 0 {
                return vec![];
            }
            return vec![worker::run(
                0..len,
                self.population.cells_mut(),
                &transform,
                accumulators,
                state,
            )];
        }

        let ranges = partition(len, self.threads);
        let parts = split(self.population.cells_mut(), &ranges);
        let joined = crossbeam::scope(|scope| {
            let handles: Vec<_> = parts
                .into_iter()
                .filter(|&(ref range, _)| range.start < range.end)
                .map(|(range, cells)| {
                    let name = format!("cell-worker-{}-to-{}", range.start, range.end);
                    trace!("starting {}", name);
                    let owned = range.clone();
                    let handle = scope
                        .builder()
                        .name(name)
                        .spawn(move |_| worker::run(owned, cells, &transform, accumulators, state));
                    (range, handle)
                })
                .collect();

            handles
                .into_iter()
                .map(|(range, handle)| match handle {
                    Ok(handle) => handle
                        .join()
                        .unwrap_or_else(|payload| Err(WorkerFault::from_panic(range, payload))),
                    Err(e) => Err(WorkerFault {
                        range,
                        message: format!("could not start worker thread: {}", e),
                    }),
                })
                .collect::<Vec<_>>()
        });

        match joined {
            Ok(results) => results,
            Err(payload) => vec![Err(WorkerFault::from_panic(0..len, payload))],
        }
    }

    /// Run one tick on request from the input side.  Ignored, returning
    /// `None`, in automatic mode, where the scheduler owns ticking.
    pub fn request_tick(&mut self) -> Option<TickOutcome> {
        if self.state.is_automatic() {
            None
        } else {
            Some(self.run_tick())
        }
    }

    /// Switch to a registered transform.  An unknown name keeps the
    /// current one and returns false.
    pub fn select_transform(&mut self, name: &str) -> bool {
        match transforms::lookup(name) {
            Some(transform) => {
                info!("now iterating {}", transform.label);
                self.transform = *transform;
                true
            }
            None => {
                warn!("unknown transform \"{}\"; keeping {}", name, self.transform.name);
                false
            }
        }
    }

    /// Switch to any transform, registered or not.
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    /// The transform being iterated.
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// A handle on the run state, for toggling modes without waiting
    /// for the engine.
    pub fn state(&self) -> Arc<RunState> {
        Arc::clone(&self.state)
    }

    /// The cells.
    pub fn population(&self) -> &Population {
        &self.population
    }

    /// The cell at a column and row.
    pub fn cell_at(&self, column: usize, row: usize) -> Option<&Cell> {
        self.population.cell_at(column, row)
    }

    /// Configured worker count.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Largest value produced by the last tick.
    pub fn current_max(&self) -> f64 {
        self.accumulators.max()
    }

    /// Smallest value produced by the last tick.
    pub fn current_min(&self) -> f64 {
        self.accumulators.min()
    }

    /// Longest history observed by the last tick.
    pub fn current_max_orbit(&self) -> usize {
        self.accumulators.max_orbit()
    }

    /// Rolling tick timings.
    pub fn timings(&self) -> &TickTimings {
        &self.timings
    }

    /// Copy out everything a renderer needs.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            width: self.population.width(),
            height: self.population.height(),
            cells: self.population.cells().iter().map(CellView::from).collect(),
            current_max: self.current_max(),
            current_min: self.current_min(),
            current_max_orbit: self.current_max_orbit(),
            iteration: self.state.iteration(),
            all_settled: self.state.all_settled(),
            average_tick_ms: self.timings.average_tick_ms(),
            average_worker_ms: self.timings.average_worker_ms(),
            transform: self.transform.label,
            threads: self.threads,
            running_workers: self.state.running_workers(),
            process_status: self.state.process_status(),
            status_colors: self.state.status_colors(),
            trip_length_colors: self.state.trip_length_colors(),
            counts: self.population.status_counts(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cell::Status;
    use state::ProcessStatus;

    fn engine(values: &[f64], transform: &str, threads: usize) -> Engine {
        Engine::from_parts(
            Population::from_values(values),
            *transforms::lookup(transform).unwrap(),
            threads,
            RunState::new(false, 0),
        )
    }

    fn ticked(outcome: TickOutcome) -> TickReport {
        match outcome {
            TickOutcome::Ticked(report) => report,
            other => panic!("expected a tick, got {:?}", other),
        }
    }

    #[test]
    fn identity_makes_a_one_cycle_in_one_tick() {
        let mut e = engine(&[5.0], "identity", 1);
        let report = ticked(e.run_tick());
        let cell = &e.population().cells()[0];
        assert_eq!(cell.status(), Status::Cycle);
        assert_eq!(cell.orbit(), &[5.0]);
        assert_eq!(cell.orbit_period(), 1);
        assert!(report.settled);
        assert_eq!(report.iteration, 1);
    }

    #[test]
    fn collatz_from_six_settles_in_six_ticks() {
        let mut e = engine(&[6.0], "collatz", 1);
        let mut values = vec![];
        for tick in 1..=6 {
            let report = ticked(e.run_tick());
            values.push(e.population().cells()[0].value());
            assert_eq!(report.settled, tick == 6);
        }
        assert_eq!(values, vec![3.0, 5.0, 8.0, 4.0, 2.0, 1.0]);
        let cell = &e.population().cells()[0];
        assert_eq!(cell.status(), Status::One);
        assert_eq!(cell.orbit(), &[1.0]);
        assert_eq!(cell.orbit_period(), 1);
        assert!(e.state().all_settled());
        assert_eq!(e.state().iteration(), 6);
    }

    #[test]
    fn settled_runs_are_idempotent() {
        let mut e = engine(&[6.0, 4.0, 2.0], "collatz", 2);
        while !ticked(e.run_tick()).settled {}
        let before: Vec<f64> = e.population().cells().iter().map(Cell::value).collect();
        let iterations = e.state().iteration();
        for _ in 0..5 {
            assert_eq!(e.run_tick(), TickOutcome::Settled { iterations });
        }
        let after: Vec<f64> = e.population().cells().iter().map(Cell::value).collect();
        assert_eq!(before, after);
        assert_eq!(e.state().iteration(), iterations);
        assert_eq!(e.snapshot().process_status, ProcessStatus::FinishedIterating);
    }

    #[test]
    fn worker_count_does_not_change_the_extrema() {
        let values: Vec<f64> = (0..997).map(|i| (i as f64) * 3.5 - 400.0).collect();
        let mut single = engine(&values, "collatz", 1);
        let mut pooled = engine(&values, "collatz", 4);
        for _ in 0..20 {
            let a = ticked(single.run_tick());
            let b = ticked(pooled.run_tick());
            assert_eq!(a.max, b.max);
            assert_eq!(a.min, b.min);
            assert_eq!(a.max_orbit, b.max_orbit);
            assert_eq!(single.current_max(), pooled.current_max());
            assert_eq!(single.current_min(), pooled.current_min());
        }
        let a: Vec<f64> = single.population().cells().iter().map(Cell::value).collect();
        let b: Vec<f64> = pooled.population().cells().iter().map(Cell::value).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn more_workers_than_cells() {
        let mut e = engine(&[6.0, 7.0, 9.0], "collatz", 8);
        let report = ticked(e.run_tick());
        assert_eq!(report.workers, 3);
        assert_eq!(report.faults, 0);
        let values: Vec<f64> = e.population().cells().iter().map(Cell::value).collect();
        assert_eq!(values, vec![3.0, 11.0, 14.0]);
    }

    #[test]
    fn automatic_cap_refuses_further_ticks() {
        let mut e = Engine::from_parts(
            Population::from_values(&[27.0]),
            *transforms::lookup("collatz").unwrap(),
            1,
            RunState::new(true, 3),
        );
        for _ in 0..3 {
            ticked(e.run_tick());
        }
        assert_eq!(e.run_tick(), TickOutcome::MaxIterationsReached { max: 3 });
        assert_eq!(e.run_tick(), TickOutcome::MaxIterationsReached { max: 3 });
        assert_eq!(e.state().iteration(), 3);
        assert!(e.run_tick().is_terminal());
    }

    #[test]
    fn pause_blocks_ticks() {
        let mut e = Engine::from_parts(
            Population::from_values(&[27.0]),
            *transforms::lookup("collatz").unwrap(),
            1,
            RunState::new(true, 0),
        );
        e.state().toggle_paused();
        assert_eq!(e.run_tick(), TickOutcome::Paused);
        assert_eq!(e.state().iteration(), 0);
        assert!(e.request_tick().is_none());
        e.state().toggle_automatic();
        assert!(e.request_tick().is_some());
        assert_eq!(e.state().iteration(), 1);
    }

    fn explodes_on_negatives(x: f64) -> f64 {
        if x < 0.0 {
            panic!("negative input");
        }
        x + 1.0
    }

    #[test]
    fn a_faulting_partition_does_not_stop_the_tick() {
        let mut e = engine(&[2.0, 3.0, -1.0, 4.0], "add", 2);
        e.set_transform(Transform::new("explodes", "Explodes", explodes_on_negatives));
        assert_eq!(e.transform().name, "explodes");
        let report = ticked(e.run_tick());
        assert_eq!(report.workers, 2);
        assert_eq!(report.faults, 1);
        assert!(!report.settled);
        let values: Vec<f64> = e.population().cells().iter().map(Cell::value).collect();
        assert_eq!(values, vec![3.0, 4.0, -1.0, 4.0]);
        assert_eq!(report.max, 4.0);
        assert_eq!(report.min, 3.0);
        assert_eq!(e.state().iteration(), 1);
        assert_eq!(e.state().running_workers(), 0);
    }

    #[test]
    fn cells_stuck_on_nan_settle_as_cycles() {
        let mut e = Engine::from_parts(
            Population::new(3, 2),
            *transforms::lookup("collatzFractal").unwrap(),
            2,
            RunState::new(false, 0),
        );
        assert!(!ticked(e.run_tick()).settled);
        assert!(ticked(e.run_tick()).settled);
        assert_eq!(e.state().iteration(), 2);
        assert!(e.population().is_settled());
        for cell in e.population().cells() {
            assert_eq!(cell.status(), Status::Cycle);
            assert_eq!(cell.orbit_period(), 1);
            assert!(cell.orbit()[0].is_nan());
            assert_eq!(cell.history().len(), 2);
        }
        assert_eq!(e.run_tick(), TickOutcome::Settled { iterations: 2 });
    }

    #[test]
    fn extrema_before_the_first_tick_come_from_the_seed() {
        let e = engine(&[3.0, -8.0, 12.0], "collatz", 1);
        assert_eq!(e.current_min(), -8.0);
        assert_eq!(e.current_max(), 12.0);
        assert_eq!(e.current_max_orbit(), 1);
    }

    #[test]
    fn unknown_transform_keeps_the_current_one() {
        let mut e = engine(&[3.0], "collatz", 1);
        assert!(!e.select_transform("nope"));
        assert_eq!(e.transform().name, "collatz");
        assert!(e.select_transform("add"));
        ticked(e.run_tick());
        assert_eq!(e.population().cells()[0].value(), 4.0);
    }

    #[test]
    fn engine_from_config() {
        let e = Engine::new(Config {
            width: 6,
            height: 4,
            threads: 0,
            transform: "sine".to_string(),
            status_colors: true,
            ..Config::default()
        });
        assert_eq!(e.threads(), 4);
        assert_eq!(e.population().len(), 24);
        let snap = e.snapshot();
        assert_eq!(snap.transform, "Sine");
        assert!(snap.status_colors);
        assert_eq!(snap.cell_at(5, 3).unwrap().value, 32.0 + 8.0);
        assert_eq!(snap.process_status, ProcessStatus::Manual);
        let counts = snap.counts;
        assert_eq!(counts.incomplete + counts.one + counts.zero + counts.cycle, 24);
    }

    #[test]
    fn timings_accumulate() {
        let mut e = engine(&[27.0, 97.0], "collatz", 2);
        for _ in 0..70 {
            ticked(e.run_tick());
        }
        assert_eq!(e.timings().samples(), 60);
        assert!(e.timings().average_tick_ms() >= 0.0);
    }
}
