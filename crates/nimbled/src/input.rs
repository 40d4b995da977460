//! Console input.
//!
//! A reader thread turns lines of standard input into [`InputEvent`]s on a
//! crossbeam channel. Lines starting with `#` are host commands; every other
//! line is TCode for the controller.

use std::io::BufRead;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{Receiver, Sender, bounded};
use tracing::{debug, warn};

/// Lines buffered between the reader thread and the control loop.
pub const INPUT_QUEUE_DEPTH: usize = 256;

/// Host commands, one per `#` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    Start,
    Stop,
    /// Same as pressing the encoder button.
    Toggle,
    /// Log the frame state.
    Status,
    /// Log the indicator LED duties.
    Leds,
}

impl HostCommand {
    pub fn parse(word: &str) -> Option<Self> {
        match word.trim().to_ascii_lowercase().as_str() {
            "start" => Some(HostCommand::Start),
            "stop" => Some(HostCommand::Stop),
            "toggle" | "button" => Some(HostCommand::Toggle),
            "status" => Some(HostCommand::Status),
            "leds" => Some(HostCommand::Leds),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    TCode(String),
    Host(HostCommand),
    Closed,
}

impl InputEvent {
    /// Classify one input line. Blank lines and unknown host commands yield
    /// `None`.
    pub fn from_line(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        if let Some(word) = line.strip_prefix('#') {
            let command = HostCommand::parse(word);
            if command.is_none() {
                warn!(command = word, "Unknown host command");
            }
            return command.map(InputEvent::Host);
        }
        if line.trim().is_empty() {
            return None;
        }
        Some(InputEvent::TCode(line.to_string()))
    }
}

/// Forward every line of `reader` to `tx`, then send [`InputEvent::Closed`].
/// Returns early when the receiver is gone.
pub fn forward_lines<R: BufRead>(reader: R, tx: &Sender<InputEvent>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Failed to read input");
                break;
            }
        };
        if let Some(event) = InputEvent::from_line(&line)
            && tx.send(event).is_err()
        {
            return;
        }
    }
    debug!("Input closed");
    if tx.send(InputEvent::Closed).is_err() {
        debug!("Control loop already gone");
    }
}

/// Spawn the stdin reader thread.
pub fn spawn_stdin_reader() -> std::io::Result<(Receiver<InputEvent>, JoinHandle<()>)> {
    let (tx, rx) = bounded(INPUT_QUEUE_DEPTH);
    let handle = thread::Builder::new()
        .name("nimbled-input".into())
        .spawn(move || forward_lines(std::io::stdin().lock(), &tx))?;
    Ok((rx, handle))
}
