extern crate nonlinear;
extern crate rand;

use nonlinear::{transforms, Engine, Population, RunState, Status, TickOutcome, HISTORY_LIMIT};
use rand::{thread_rng, Rng};

fn engine(name: &str, population: Population, threads: usize) -> Engine {
    Engine::from_parts(
        population,
        *transforms::lookup(name).unwrap(),
        threads,
        RunState::new(false, 0),
    )
}

fn statuses(engine: &Engine) -> Vec<Status> {
    engine.population().cells().iter().map(|c| c.status()).collect()
}

#[test]
fn settled_cells_never_change() {
    let mut rng = thread_rng();
    let seeds: Vec<f64> = (0..500).map(|_| f64::from(rng.gen_range(1u32, 10_000))).collect();
    let mut engine = engine("iwanski", Population::from_values(&seeds), 3);

    let mut before = statuses(&engine);
    let mut values: Vec<f64> = engine.population().cells().iter().map(|c| c.value()).collect();
    for _ in 0..40 {
        engine.run_tick();
        let after = statuses(&engine);
        for (i, cell) in engine.population().cells().iter().enumerate() {
            if before[i].is_settled() && before[i] != Status::Cycle {
                assert_eq!(after[i], before[i]);
                assert_eq!(cell.value(), values[i]);
            }
            if before[i] == Status::Cycle {
                assert_eq!(after[i], Status::Cycle);
            }
            assert!(cell.history().len() <= HISTORY_LIMIT);
        }
        values = engine.population().cells().iter().map(|c| c.value()).collect();
        before = after;
    }
    // Every digit-square sum sequence ends at one or in the cycle through 4.
    assert!(engine.state().all_settled());
}

#[test]
fn worker_count_does_not_change_the_result() {
    let grid = || Population::new(24, 16);
    let mut reference = engine("collatz", grid(), 1);
    let mut others: Vec<Engine> = [2, 5, 16, 1000]
        .iter()
        .map(|&w| engine("collatz", grid(), w))
        .collect();

    for _ in 0..30 {
        let expected = reference.run_tick();
        for other in &mut others {
            let outcome = other.run_tick();
            match (&expected, &outcome) {
                (TickOutcome::Ticked(a), TickOutcome::Ticked(b)) => {
                    assert_eq!(a.max, b.max);
                    assert_eq!(a.min, b.min);
                    assert_eq!(a.max_orbit, b.max_orbit);
                    assert_eq!(a.settled, b.settled);
                }
                (a, b) => assert_eq!(a, b),
            }
            assert_eq!(statuses(&reference), statuses(other));
        }
    }
}

#[test]
fn long_orbits_are_forgotten_past_the_history_limit() {
    let mut engine = engine("add", Population::from_values(&[0.5]), 1);
    for _ in 0..(HISTORY_LIMIT * 2) {
        engine.run_tick();
    }
    let cell = engine.cell_at(0, 0).unwrap();
    assert_eq!(cell.status(), Status::Incomplete);
    assert_eq!(cell.history().len(), HISTORY_LIMIT);
    assert_eq!(cell.value(), 0.5 + (HISTORY_LIMIT * 2) as f64);
    assert_eq!(engine.current_max_orbit(), HISTORY_LIMIT);
}
