// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Drives ticks at a fixed rate in automatic mode.
//!
//! The scheduler thread sleeps on its control channel for one frame
//! interval at a time.  Every wakeup adds the elapsed wall-clock time
//! to a count of ticks owed, and whole ticks are paid off one at a
//! time.  The rate therefore tracks the clock no matter how late the
//! thread wakes up, and it has nothing to do with how often anybody
//! draws.

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use failure::Error;
use std::sync::PoisonError;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use engine::{SharedEngine, TickOutcome, TickReport};

/// Events kept for a slow consumer before new ones are dropped.
pub const EVENT_BACKLOG: usize = 256;

fn nanos(d: Duration) -> f64 {
    d.as_secs() as f64 * 1e9 + f64::from(d.subsec_nanos())
}

/// Fixed-timestep bookkeeping: converts elapsed time into whole ticks.
#[derive(Clone, Debug)]
pub struct FixedTimestep {
    rate: f64,
    owed: f64,
    last: Instant,
}

impl FixedTimestep {
    /// Start counting from `now` at `ticks_per_second`.
    pub fn new(ticks_per_second: u32, now: Instant) -> Self {
        FixedTimestep {
            rate: f64::from(ticks_per_second.max(1)),
            owed: 0.0,
            last: now,
        }
    }

    /// The time between ticks.
    pub fn interval(&self) -> Duration {
        Duration::from_nanos((1e9 / self.rate) as u64)
    }

    /// Credit the time since the last call.  At most one second's
    /// worth of ticks can be owed at once.
    pub fn advance(&mut self, now: Instant) {
        if now > self.last {
            self.owed += nanos(now - self.last) * self.rate / 1e9;
            self.last = now;
        }
        if self.owed > self.rate {
            self.owed = self.rate;
        }
    }

    /// Pay off one tick if at least one is owed.
    pub fn take(&mut self) -> bool {
        if self.owed >= 1.0 {
            self.owed -= 1.0;
            true
        } else {
            false
        }
    }

    /// The fractional number of ticks owed.
    pub fn owed(&self) -> f64 {
        self.owed
    }
}

/// What the scheduler tells the rendering side.
#[derive(Clone, Debug, PartialEq)]
pub enum SchedulerEvent {
    /// A tick ran.
    Ticked(TickReport),
    /// The run reached a terminal state.  Sent once.
    Finished(TickOutcome),
}

/// Handle on the running scheduler thread.  Dropping it stops the
/// thread.
pub struct Scheduler {
    control: Option<Sender<()>>,
    events: Receiver<SchedulerEvent>,
    handle: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Spawn the scheduler thread for a shared engine.
    pub fn start(engine: SharedEngine, ticks_per_second: u32) -> Result<Scheduler, Error> {
        let (control, control_rx) = bounded(1);
        let (events_tx, events) = bounded(EVENT_BACKLOG);
        let handle = thread::Builder::new()
            .name("scheduler".to_string())
            .spawn(move || run(engine, ticks_per_second, control_rx, events_tx))?;
        Ok(Scheduler {
            control: Some(control),
            events,
            handle: Some(handle),
        })
    }

    /// The event stream.
    pub fn events(&self) -> &Receiver<SchedulerEvent> {
        &self.events
    }

    /// Stop the thread and wait for it.  A tick in flight completes
    /// first.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Disconnecting the control channel is the stop signal.
        self.control.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("scheduler thread panicked");
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn publish(events: &Sender<SchedulerEvent>, event: SchedulerEvent) {
    match events.try_send(event) {
        Ok(()) | Err(TrySendError::Disconnected(_)) => {}
        Err(TrySendError::Full(_)) => trace!("event consumer is behind; dropping event"),
    }
}

fn run(
    engine: SharedEngine,
    ticks_per_second: u32,
    control: Receiver<()>,
    events: Sender<SchedulerEvent>,
) {
    let state = engine.lock().unwrap_or_else(PoisonError::into_inner).state();
    let mut timestep = FixedTimestep::new(ticks_per_second, Instant::now());
    let interval = timestep.interval();
    let mut announced = false;
    debug!("scheduler running at {} ticks per second", ticks_per_second);

    loop {
        match control.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }

        timestep.advance(Instant::now());
        while timestep.take() {
            // Owed frames are spent without ticking unless the run is live.
            if !state.is_automatic() || state.is_paused() || (announced && state.is_finished()) {
                continue;
            }
            let outcome = engine.lock().unwrap_or_else(PoisonError::into_inner).run_tick();
            if let TickOutcome::Ticked(ref report) = outcome {
                publish(&events, SchedulerEvent::Ticked(report.clone()));
            }
            if outcome.is_terminal() && !announced {
                announced = true;
                publish(&events, SchedulerEvent::Finished(outcome));
            }
        }
    }
    debug!("scheduler stopped");
}
