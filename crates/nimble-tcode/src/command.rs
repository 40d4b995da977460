//! Token grammar.
//!
//! A token is classified by its first character:
//!
//! | First | Kind | Shape |
//! |-------|------|-------|
//! | `L` `R` `V` `A` | axis | `<id><digits>[I\|S<digits>][<\|>\|<>\|=]` |
//! | `D` | device | `DS`, `D0`, `D1`, `D2` |
//! | `$` | setup | `$<id> <low> <high>` |
//!
//! Anything else parses to [`Command::Ignored`].

use crate::axis::{AXIS_MAX, AXIS_MIN, EXTENSION_MAX, RampExtension};
use crate::channel::ChannelId;
use crate::easing::EasingType;
use crate::error::{TCodeError, TCodeResult};

/// Digits a magnitude is right-padded to before it is read.
const MAGNITUDE_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisCommand {
    pub id: ChannelId,
    pub magnitude: i32,
    pub extension: RampExtension,
    pub easing: EasingType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    Stop,
    FirmwareId,
    Version,
    AxisInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupCommand {
    pub id: ChannelId,
    pub low: i32,
    pub high: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Axis(AxisCommand),
    Device(DeviceCommand),
    Setup(SetupCommand),
    Ignored,
}

impl Command {
    /// Parse one upper-case token.
    pub fn parse(token: &[u8], channel_count: usize) -> TCodeResult<Self> {
        match token.first() {
            Some(b'L' | b'R' | b'V' | b'A') => {
                AxisCommand::parse(token, channel_count).map(Command::Axis)
            }
            Some(b'D') => Ok(DeviceCommand::parse(token).map_or(Command::Ignored, Command::Device)),
            Some(b'$') => SetupCommand::parse(token, channel_count).map(Command::Setup),
            _ => Ok(Command::Ignored),
        }
    }
}

/// Cursor over a token.
struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(bytes: &'a [u8], pos: usize) -> Self {
        Self { bytes, pos }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn digits(&mut self) -> &'a [u8] {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        self.bytes.get(start..self.pos).unwrap_or_default()
    }

    fn finish(&self) -> TCodeResult<()> {
        match self.peek() {
            None => Ok(()),
            Some(byte) => Err(TCodeError::TrailingInput(char::from(byte))),
        }
    }
}

fn parse_saturating(digits: &[u8]) -> u32 {
    digits.iter().fold(0u32, |acc, &digit| {
        acc.saturating_mul(10).saturating_add(u32::from(digit - b'0'))
    })
}

// Zero is only accepted when its digit string actually ends in '0'; an empty
// string never does.
fn zero_is_literal(value: u32, digits: &[u8]) -> bool {
    value != 0 || digits.last() == Some(&b'0')
}

fn lossy(token: &[u8]) -> String {
    String::from_utf8_lossy(token).into_owned()
}

/// Read a 0..=9999 magnitude, right-padding short digit runs with zeros.
fn read_magnitude(scanner: &mut Scanner<'_>) -> TCodeResult<i32> {
    let digits = scanner.digits();
    let mut padded = digits.to_vec();
    while padded.len() < MAGNITUDE_WIDTH {
        padded.push(b'0');
    }
    let value = parse_saturating(&padded).min(AXIS_MAX.unsigned_abs());
    if !zero_is_literal(value, &padded) {
        return Err(TCodeError::InvalidMagnitude(lossy(digits)));
    }
    i32::try_from(value).map_err(|_| TCodeError::InvalidMagnitude(lossy(digits)))
}

/// Read a setup bound: like a magnitude, without padding.
fn read_bound(scanner: &mut Scanner<'_>) -> TCodeResult<i32> {
    let digits = scanner.digits();
    let value = parse_saturating(digits).min(AXIS_MAX.unsigned_abs());
    if !zero_is_literal(value, digits) {
        return Err(TCodeError::MalformedSetup(lossy(digits)));
    }
    i32::try_from(value)
        .map(|v| v.clamp(AXIS_MIN, AXIS_MAX))
        .map_err(|_| TCodeError::MalformedSetup(lossy(digits)))
}

impl AxisCommand {
    pub fn parse(token: &[u8], channel_count: usize) -> TCodeResult<Self> {
        let id = ChannelId::parse(token, channel_count)?;
        let mut scanner = Scanner::new(token, 2);

        let magnitude = read_magnitude(&mut scanner)?;

        let extension = match scanner.peek() {
            Some(marker @ (b'I' | b'S')) => {
                scanner.pos += 1;
                let digits = scanner.digits();
                let value = parse_saturating(digits).min(EXTENSION_MAX);
                if !zero_is_literal(value, digits) {
                    return Err(TCodeError::InvalidExtension(lossy(digits)));
                }
                if marker == b'S' {
                    if value == 0 {
                        return Err(TCodeError::ZeroSpeed);
                    }
                    RampExtension::Speed(value)
                } else {
                    RampExtension::Interval(value)
                }
            }
            _ => RampExtension::None,
        };

        let mut easing = EasingType::Linear;
        if extension != RampExtension::None {
            if scanner.eat(b'<') {
                easing = if scanner.eat(b'>') {
                    EasingType::EaseInOut
                } else {
                    EasingType::EaseIn
                };
            } else if scanner.eat(b'>') {
                easing = EasingType::EaseOut;
            } else {
                scanner.eat(b'=');
            }
        }

        scanner.finish()?;

        Ok(Self {
            id,
            magnitude,
            extension,
            easing,
        })
    }
}

impl DeviceCommand {
    /// Only the character after `D` is significant.
    pub fn parse(token: &[u8]) -> Option<Self> {
        match token.get(1)? {
            b'S' => Some(Self::Stop),
            b'0' => Some(Self::FirmwareId),
            b'1' => Some(Self::Version),
            b'2' => Some(Self::AxisInfo),
            _ => None,
        }
    }
}

impl SetupCommand {
    pub fn parse(token: &[u8], channel_count: usize) -> TCodeResult<Self> {
        let body = token.get(1..).unwrap_or_default();
        let id = ChannelId::parse(body, channel_count)?;
        let mut scanner = Scanner::new(body, 2);

        if !scanner.eat(b' ') {
            return Err(TCodeError::MalformedSetup(lossy(token)));
        }
        let low = read_bound(&mut scanner)?;
        if !scanner.eat(b' ') {
            return Err(TCodeError::MalformedSetup(lossy(token)));
        }
        let high = read_bound(&mut scanner)?;
        scanner.finish()?;

        Ok(Self { id, low, high })
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn prop_parse_never_panics(token in proptest::collection::vec(any::<u8>(), 0..32)) {
            let _ = Command::parse(&token, 10);
        }

        #[test]
        fn prop_four_digit_magnitude_round_trips(value in 0i32..=9999, index in 0usize..3) {
            let token = format!("L{index}{value:04}");
            let command = AxisCommand::parse(token.as_bytes(), 3)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(command.magnitude, value);
            prop_assert_eq!(command.id.index(), index);
        }
    }
}
