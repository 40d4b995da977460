//! Control loop of the host runner.
//!
//! A ticker thread raises the [`TickFlag`] once per tick period. The loop
//! applies every pending input line before it checks the flag, so a tick
//! always sees the newest commands.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam::channel::{Receiver, RecvTimeoutError};
use nimble_control::{NimbleController, RingLed, TickFlag};
use nimble_link::LinkTransport;
use tracing::{debug, info};

use crate::input::{HostCommand, InputEvent};

/// Periodic tick source on its own thread.
#[derive(Debug)]
pub struct Ticker {
    flag: Arc<TickFlag>,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn spawn(period: Duration) -> std::io::Result<Self> {
        let flag = Arc::new(TickFlag::new());
        let shutdown = Arc::new(AtomicBool::new(false));
        let handle = {
            let flag = Arc::clone(&flag);
            let shutdown = Arc::clone(&shutdown);
            thread::Builder::new()
                .name("nimbled-tick".into())
                .spawn(move || {
                    while !shutdown.load(Ordering::Acquire) {
                        thread::sleep(period);
                        flag.raise();
                    }
                })?
        };
        Ok(Self {
            flag,
            shutdown,
            handle: Some(handle),
        })
    }

    pub fn flag(&self) -> &TickFlag {
        &self.flag
    }

    fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            debug!("Tick thread panicked");
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Stop after this many ticks.
    pub max_ticks: Option<u64>,
    /// Keep ticking this long after input closes.
    pub linger: Duration,
    /// Log the frame state at this interval.
    pub status_interval: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub ticks: u64,
    pub overruns: u64,
}

/// Run until input closes (plus the linger time) or the tick limit is hit.
pub fn run<T: LinkTransport>(
    controller: &mut NimbleController<T>,
    input: &Receiver<InputEvent>,
    flag: &TickFlag,
    poll_interval: Duration,
    options: &RunOptions,
) -> Result<RunSummary> {
    let mut ticks = 0u64;
    let mut closed_at: Option<Instant> = None;
    let mut last_status = Instant::now();

    loop {
        while let Ok(event) = input.try_recv() {
            if handle_event(controller, event) {
                closed_at.get_or_insert_with(Instant::now);
            }
        }

        if controller.run_pending(flag)?.is_some() {
            ticks += 1;
        }

        if options.max_ticks.is_some_and(|max| ticks >= max) {
            debug!(ticks, "Tick limit reached");
            break;
        }
        if closed_at.is_some_and(|at| at.elapsed() >= options.linger) {
            break;
        }
        if let Some(interval) = options.status_interval
            && last_status.elapsed() >= interval
        {
            controller.log_frame_state();
            last_status = Instant::now();
        }

        if closed_at.is_some() {
            thread::sleep(poll_interval);
            continue;
        }
        match input.recv_timeout(poll_interval) {
            Ok(event) => {
                if handle_event(controller, event) {
                    closed_at.get_or_insert_with(Instant::now);
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                closed_at.get_or_insert_with(Instant::now);
            }
        }
    }

    let summary = RunSummary {
        ticks,
        overruns: flag.overruns(),
    };
    info!(ticks = summary.ticks, overruns = summary.overruns, "Control loop finished");
    Ok(summary)
}

/// Apply one input event. Returns `true` when input has closed.
pub fn handle_event<T: LinkTransport>(
    controller: &mut NimbleController<T>,
    event: InputEvent,
) -> bool {
    match event {
        InputEvent::TCode(line) => {
            controller.input_line(&line);
            false
        }
        InputEvent::Host(command) => {
            apply_host_command(controller, command);
            false
        }
        InputEvent::Closed => true,
    }
}

fn apply_host_command<T: LinkTransport>(
    controller: &mut NimbleController<T>,
    command: HostCommand,
) {
    match command {
        HostCommand::Start => controller.start(),
        HostCommand::Stop => controller.stop(),
        HostCommand::Toggle => controller.on_button_press(),
        HostCommand::Status => controller.log_frame_state(),
        HostCommand::Leds => {
            let leds = controller.indicators(true, false);
            let ring = RingLed::ALL
                .iter()
                .map(|&led| format!("{led:?}={}", leds.ring_duty(led)))
                .collect::<Vec<_>>()
                .join(" ");
            info!(ring = %ring, actuator = leds.actuator_link, "Indicators");
        }
    }
}
