//! Fixed-rate runner thread.
//!
//! The runner owns the engine and a working copy of the inputs. Commands
//! arrive over an `mpsc` channel and are applied between ticks; the latest
//! frame is published for polling.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use propwash_core::commands::ControlCommand;
use propwash_core::state::FrameResult;
use propwash_core::{PropwashError, Result};

use crate::control::SimInputs;
use crate::engine::HydrodynamicsEngine;

/// Messages accepted by the runner thread.
#[derive(Debug)]
pub enum RunnerCommand {
    /// Change an input before the next tick.
    Control(ControlCommand),
    /// Stop ticking and hand the engine back.
    Shutdown,
}

/// Handle to a running engine thread.
pub struct RunnerHandle {
    command_tx: mpsc::Sender<RunnerCommand>,
    latest: Arc<Mutex<Option<FrameResult>>>,
    thread: JoinHandle<HydrodynamicsEngine>,
}

/// Move `engine` onto a named thread that ticks at `tick_rate_hz`.
pub fn spawn_runner(
    engine: HydrodynamicsEngine,
    inputs: SimInputs,
    tick_rate_hz: u32,
) -> Result<RunnerHandle> {
    if tick_rate_hz == 0 {
        return Err(PropwashError::invalid("tick_rate_hz", "must be > 0"));
    }
    let (command_tx, command_rx) = mpsc::channel::<RunnerCommand>();
    let latest = Arc::new(Mutex::new(None));
    let shared = Arc::clone(&latest);
    let tick = Duration::from_nanos(1_000_000_000 / tick_rate_hz as u64);

    let thread = std::thread::Builder::new()
        .name("propwash-runner".into())
        .spawn(move || run_loop(engine, inputs, tick, command_rx, &shared))
        .map_err(|e| PropwashError::Runner(format!("failed to spawn runner thread: {e}")))?;

    log::info!("Runner started at {tick_rate_hz} Hz");
    Ok(RunnerHandle {
        command_tx,
        latest,
        thread,
    })
}

impl RunnerHandle {
    /// Queue a control command for the next tick boundary.
    pub fn send(&self, command: ControlCommand) -> Result<()> {
        self.command_tx
            .send(RunnerCommand::Control(command))
            .map_err(|_| PropwashError::Runner("runner thread has stopped".into()))
    }

    /// Most recently published frame.
    pub fn latest(&self) -> Option<FrameResult> {
        self.latest.lock().ok().and_then(|frame| *frame)
    }

    /// Stop the thread and return the engine.
    pub fn shutdown(self) -> Result<HydrodynamicsEngine> {
        // The thread may already have exited; joining still returns the engine.
        let _ = self.command_tx.send(RunnerCommand::Shutdown);
        let engine = self
            .thread
            .join()
            .map_err(|_| PropwashError::Runner("runner thread panicked".into()))?;
        log::info!("Runner stopped after {} steps", engine.time().step);
        Ok(engine)
    }
}

fn run_loop(
    mut engine: HydrodynamicsEngine,
    mut inputs: SimInputs,
    tick: Duration,
    command_rx: mpsc::Receiver<RunnerCommand>,
    latest: &Mutex<Option<FrameResult>>,
) -> HydrodynamicsEngine {
    let dt = tick.as_secs_f64();
    let mut next_tick_time = Instant::now();

    'outer: loop {
        // 1. Drain pending commands
        loop {
            match command_rx.try_recv() {
                Ok(RunnerCommand::Control(cmd)) => {
                    if let Err(e) = inputs.apply(cmd) {
                        log::warn!("Rejected control command: {e}");
                    }
                }
                Ok(RunnerCommand::Shutdown) => break 'outer,
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => break 'outer,
            }
        }

        // 2. Tick and publish
        if !inputs.paused {
            let frame = engine.tick(&inputs.environment, &inputs.propeller, dt);
            if let Ok(mut lock) = latest.lock() {
                *lock = Some(frame);
            }
        }

        // 3. Sleep until the next tick
        next_tick_time += tick;
        let now = Instant::now();
        if next_tick_time > now {
            std::thread::sleep(next_tick_time - now);
        } else if now - next_tick_time > tick * 2 {
            next_tick_time = now;
        }
    }

    if let Err(e) = engine.flush_logger() {
        log::warn!("Frame logger flush failed on shutdown: {e}");
    }
    engine
}
