//! The protocol engine: command buffer, tokenizer and axis registry.
//!
//! Input arrives one byte at a time ([`TCode::input_byte`]) or as a whole
//! string ([`TCode::input_str`], [`TCode::input_line`]). Malformed tokens are
//! logged at `debug` and dropped; nothing in the input path returns an error.
//!
//! Tokens end at a space or newline, except setup tokens (`$...`) which keep
//! their two space-separated operands and end at the third space.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::axis::{AXIS_DEFAULT_VALUE, Axis, RampExtension};
use crate::buffer::CommandBuffer;
use crate::calibration::{CalibrationStore, MemoryCalibrationStore};
use crate::channel::{CHANNEL_KIND_COUNT, ChannelId, ChannelKind, MAX_CHANNEL_COUNT};
use crate::clock::{Clock, MonotonicClock};
use crate::command::{AxisCommand, Command, DeviceCommand, SetupCommand};
use crate::config::TCodeConfig;
use crate::easing::EasingType;
use crate::error::TCodeResult;
use crate::ports::{MessageSink, NullSink};

pub struct TCode {
    config: TCodeConfig,
    buffer: CommandBuffer,
    axes: [[Axis; MAX_CHANNEL_COUNT]; CHANNEL_KIND_COUNT],
    clock: Arc<dyn Clock>,
    sink: Box<dyn MessageSink>,
    calibration: Box<dyn CalibrationStore>,
}

impl std::fmt::Debug for TCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TCode")
            .field("config", &self.config)
            .field("buffered", &self.buffer.len())
            .finish_non_exhaustive()
    }
}

impl TCode {
    /// Build an engine. Every axis starts held at 5000 and is then stopped,
    /// which sends vibration axes toward zero.
    pub fn new(
        config: TCodeConfig,
        clock: Arc<dyn Clock>,
        sink: Box<dyn MessageSink>,
        calibration: Box<dyn CalibrationStore>,
    ) -> TCodeResult<Self> {
        config.validate()?;
        let buffer = CommandBuffer::with_capacity(config.buffer_capacity)?;
        let mut tcode = Self {
            config,
            buffer,
            axes: std::array::from_fn(|_| std::array::from_fn(|_| Axis::new())),
            clock,
            sink,
            calibration,
        };
        tcode.stop();
        Ok(tcode)
    }

    /// Engine with a wall clock, no message output and in-memory
    /// calibration.
    pub fn with_defaults(config: TCodeConfig) -> TCodeResult<Self> {
        Self::new(
            config,
            Arc::new(MonotonicClock::new()),
            Box::new(NullSink),
            Box::new(MemoryCalibrationStore::new()),
        )
    }

    pub fn config(&self) -> &TCodeConfig {
        &self.config
    }

    pub fn channel_count(&self) -> usize {
        self.config.channel_count
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Prepare the calibration store. Returns `true` when it had to be
    /// formatted.
    pub fn init(&mut self) -> TCodeResult<bool> {
        let formatted = self.calibration.initialise()?;
        if formatted {
            debug!("Calibration store formatted with default ranges");
        }
        Ok(formatted)
    }

    pub fn set_message_sink(&mut self, sink: Box<dyn MessageSink>) {
        self.sink = sink;
    }

    pub fn send_message(&mut self, message: &str) {
        self.sink.send(message);
    }

    /// Feed one byte of the command stream.
    pub fn input_byte(&mut self, byte: u8) {
        let upper = byte.to_ascii_uppercase();
        if !self.buffer.push(upper) && self.buffer.is_full() {
            self.execute_next_buffered();
            self.buffer.push(upper);
        }

        if byte == b'\n' {
            while !self.buffer.is_empty() {
                self.execute_next_buffered();
            }
            self.buffer.clear();
        }
    }

    pub fn input_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.input_byte(byte);
        }
    }

    /// Feed a line through the byte path, followed by a newline.
    pub fn input_line(&mut self, line: &str) {
        self.input_bytes(line.as_bytes());
        self.input_byte(b'\n');
    }

    /// Execute a complete command string directly, bypassing the buffer.
    pub fn input_str(&mut self, input: &str) {
        let upper = input.trim().to_ascii_uppercase();
        let mut rest = upper.as_bytes();
        while !rest.is_empty() {
            let (token, remainder) = split_token(rest);
            self.execute_token(token);
            rest = remainder;
        }
    }

    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
    }

    /// Freeze linear, rotation and auxiliary axes where they are and bring
    /// vibration axes to zero.
    pub fn stop(&mut self) {
        let now = self.clock.now_ms();
        for kind in ChannelKind::ALL {
            for axis in self.axes_of_mut(kind) {
                match kind {
                    ChannelKind::Vibration => axis.set(0, RampExtension::None, now),
                    _ => axis.stop(now),
                }
            }
        }
    }

    /// Position of the axis named by `id`, or 5000 when `id` is not a valid
    /// channel.
    pub fn axis_read(&self, id: &str) -> i32 {
        let now = self.clock.now_ms();
        self.lookup(id)
            .map_or(AXIS_DEFAULT_VALUE, |axis| axis.position(now))
    }

    pub fn axis_write(&mut self, id: &str, magnitude: i32, extension: RampExtension) {
        let now = self.clock.now_ms();
        if let Some(axis) = self.lookup_mut(id) {
            axis.set(magnitude, extension, now);
        }
    }

    /// Time of the last command to `id`, or 0 when `id` is not a valid
    /// channel.
    pub fn axis_last_t(&self, id: &str) -> u64 {
        self.lookup(id).map_or(0, Axis::last_command_time)
    }

    pub fn axis_register(&mut self, id: &str, name: &str) {
        if let Some(axis) = self.lookup_mut(id) {
            axis.set_name(name);
        }
    }

    pub fn axis_changed(&mut self, id: &str) -> bool {
        let now = self.clock.now_ms();
        self.lookup_mut(id).is_some_and(|axis| axis.changed(now))
    }

    pub fn axis_easing_type(&mut self, id: &str, easing: EasingType) {
        if let Some(axis) = self.lookup_mut(id) {
            axis.set_easing(easing);
        }
    }

    pub fn axis(&self, id: ChannelId) -> Option<&Axis> {
        self.axes.get(id.kind().slot())?.get(id.index())
    }

    pub fn axis_mut(&mut self, id: ChannelId) -> Option<&mut Axis> {
        self.axes.get_mut(id.kind().slot())?.get_mut(id.index())
    }

    fn lookup(&self, id: &str) -> Option<&Axis> {
        let id = ChannelId::parse(id.as_bytes(), self.config.channel_count).ok()?;
        self.axis(id)
    }

    fn lookup_mut(&mut self, id: &str) -> Option<&mut Axis> {
        let id = ChannelId::parse(id.as_bytes(), self.config.channel_count).ok()?;
        self.axis_mut(id)
    }

    fn axes_of_mut(&mut self, kind: ChannelKind) -> impl Iterator<Item = &mut Axis> {
        let count = self.config.channel_count;
        self.axes
            .get_mut(kind.slot())
            .into_iter()
            .flat_map(move |row| row.iter_mut().take(count))
    }

    fn execute_next_buffered(&mut self) {
        let mut boundary = TokenBoundary::new(self.buffer.peek());
        let mut token = Vec::new();
        while let Some(byte) = self.buffer.peek() {
            if boundary.ends_at(byte) {
                break;
            }
            token.push(byte);
            self.buffer.pop();
        }
        if matches!(self.buffer.peek(), Some(b' ' | b'\n')) {
            self.buffer.pop();
        }
        self.execute_token(&token);
    }

    fn execute_token(&mut self, token: &[u8]) {
        match Command::parse(token, self.config.channel_count) {
            Ok(Command::Axis(command)) => self.apply_axis(command),
            Ok(Command::Device(command)) => self.apply_device(command),
            Ok(Command::Setup(command)) => self.apply_setup(command),
            Ok(Command::Ignored) => {
                if !token.is_empty() {
                    trace!(token = %String::from_utf8_lossy(token), "Ignoring token");
                }
            }
            Err(err) => {
                debug!(token = %String::from_utf8_lossy(token), error = %err, "Dropping malformed token");
            }
        }
    }

    fn apply_axis(&mut self, command: AxisCommand) {
        let now = self.clock.now_ms();
        if let Some(axis) = self.axis_mut(command.id) {
            axis.set(command.magnitude, command.extension, now);
            axis.set_easing(command.easing);
        }
    }

    fn apply_device(&mut self, command: DeviceCommand) {
        match command {
            DeviceCommand::Stop => self.stop(),
            DeviceCommand::FirmwareId => {
                let message = format!("{}\n", self.config.firmware_id);
                self.sink.send(&message);
            }
            DeviceCommand::Version => {
                let message = format!("{}\n", self.config.version);
                self.sink.send(&message);
            }
            DeviceCommand::AxisInfo => {
                for kind in ChannelKind::ALL {
                    for index in 0..self.config.channel_count {
                        if let Ok(id) = ChannelId::new(kind, index, self.config.channel_count) {
                            self.send_axis_row(id);
                        }
                    }
                }
            }
        }
    }

    fn apply_setup(&mut self, command: SetupCommand) {
        match self
            .calibration
            .put_range(command.id, command.low, command.high)
        {
            Ok(()) => self.send_axis_row(command.id),
            Err(err) => warn!(id = %command.id, error = %err, "Failed to store axis range"),
        }
    }

    /// `"<id> <low> <high> <name>\n"`, skipped for unnamed axes.
    fn send_axis_row(&mut self, id: ChannelId) {
        let Some(name) = self.axis(id).map(|axis| axis.name().to_owned()) else {
            return;
        };
        if name.is_empty() {
            return;
        }
        match self.calibration.get_range(id) {
            Ok((low, high)) => {
                let low = low.clamp(0, 9999);
                let high = high.clamp(0, 9999);
                let row = format!("{id} {low} {high} {name}\n");
                self.sink.send(&row);
            }
            Err(err) => debug!(id = %id, error = %err, "No stored range for axis"),
        }
    }
}

/// Split the next token off an upper-cased command string.
/// Spaces a setup token keeps before its third one ends it.
const SETUP_SEPARATORS: usize = 2;

/// Tracks where the token starting with `first` ends.
struct TokenBoundary {
    setup: bool,
    spaces: usize,
}

impl TokenBoundary {
    fn new(first: Option<u8>) -> Self {
        Self {
            setup: first == Some(b'$'),
            spaces: 0,
        }
    }

    fn ends_at(&mut self, byte: u8) -> bool {
        match byte {
            b'\n' => true,
            b' ' if self.setup && self.spaces < SETUP_SEPARATORS => {
                self.spaces += 1;
                false
            }
            b' ' => true,
            _ => false,
        }
    }
}

fn split_token(input: &[u8]) -> (&[u8], &[u8]) {
    let mut boundary = TokenBoundary::new(input.first().copied());
    let end = input
        .iter()
        .position(|&b| boundary.ends_at(b))
        .unwrap_or(input.len());
    let (token, rest) = input.split_at(end);
    (token, rest.get(1..).unwrap_or_default())
}
