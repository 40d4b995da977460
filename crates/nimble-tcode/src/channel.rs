//! Channel addressing: the two-character `type` + `index` id of an axis.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TCodeError, TCodeResult};

/// Largest channel count a device may be configured with.
pub const MAX_CHANNEL_COUNT: usize = 10;

/// Number of channel kinds (`L`, `R`, `V`, `A`).
pub const CHANNEL_KIND_COUNT: usize = 4;

/// Logical channel family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    Linear,
    Rotation,
    Vibration,
    Auxiliary,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; CHANNEL_KIND_COUNT] = [
        ChannelKind::Linear,
        ChannelKind::Rotation,
        ChannelKind::Vibration,
        ChannelKind::Auxiliary,
    ];

    pub fn from_letter(letter: u8) -> Option<Self> {
        match letter {
            b'L' => Some(Self::Linear),
            b'R' => Some(Self::Rotation),
            b'V' => Some(Self::Vibration),
            b'A' => Some(Self::Auxiliary),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Self::Linear => 'L',
            Self::Rotation => 'R',
            Self::Vibration => 'V',
            Self::Auxiliary => 'A',
        }
    }

    /// Position of this kind in registry and calibration layouts.
    pub fn slot(self) -> usize {
        match self {
            Self::Linear => 0,
            Self::Rotation => 1,
            Self::Vibration => 2,
            Self::Auxiliary => 3,
        }
    }
}

/// A validated channel address.
///
/// Only constructible through [`ChannelId::new`] or [`ChannelId::parse`], so
/// holding one means the index is inside the configured channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId {
    kind: ChannelKind,
    index: u8,
}

impl ChannelId {
    pub fn new(kind: ChannelKind, index: usize, channel_count: usize) -> TCodeResult<Self> {
        if index >= channel_count || index >= MAX_CHANNEL_COUNT {
            return Err(TCodeError::InvalidChannel(format!(
                "{}{}",
                kind.letter(),
                index
            )));
        }
        let index = u8::try_from(index)
            .map_err(|_| TCodeError::InvalidChannel(format!("{}{}", kind.letter(), index)))?;
        Ok(Self { kind, index })
    }

    /// Decode the first two characters of `token`.
    ///
    /// The type letter must be one of `L`, `R`, `V`, `A` and the index digit
    /// must be below `channel_count`. Anything after the second character is
    /// ignored here.
    pub fn parse(token: &[u8], channel_count: usize) -> TCodeResult<Self> {
        let invalid = || TCodeError::InvalidChannel(String::from_utf8_lossy(token).into_owned());

        let letter = token.first().copied().ok_or_else(invalid)?;
        let digit = token.get(1).copied().ok_or_else(invalid)?;
        let kind = ChannelKind::from_letter(letter).ok_or_else(invalid)?;
        if !digit.is_ascii_digit() {
            return Err(invalid());
        }
        let index = usize::from(digit - b'0');
        Self::new(kind, index, channel_count).map_err(|_| invalid())
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn index(&self) -> usize {
        usize::from(self.index)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.letter(), self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_ids() -> TCodeResult<()> {
        let id = ChannelId::parse(b"L0", 3)?;
        assert_eq!(id.kind(), ChannelKind::Linear);
        assert_eq!(id.index(), 0);

        let id = ChannelId::parse(b"A29999", 3)?;
        assert_eq!(id.kind(), ChannelKind::Auxiliary);
        assert_eq!(id.index(), 2);
        assert_eq!(id.to_string(), "A2");
        Ok(())
    }

    #[test]
    fn test_parse_rejects_index_beyond_count() {
        assert!(ChannelId::parse(b"L3", 3).is_err());
        assert!(ChannelId::parse(b"V1", 1).is_err());
        assert!(ChannelId::parse(b"R9", 10).is_ok());
    }

    #[test]
    fn test_parse_rejects_unknown_letter() {
        assert!(ChannelId::parse(b"X0", 10).is_err());
        assert!(ChannelId::parse(b"D0", 10).is_err());
    }

    #[test]
    fn test_parse_rejects_short_and_non_digit() {
        assert!(ChannelId::parse(b"", 10).is_err());
        assert!(ChannelId::parse(b"L", 10).is_err());
        assert!(ChannelId::parse(b"L/", 10).is_err());
        assert!(ChannelId::parse(b"LX", 10).is_err());
    }

    #[test]
    fn test_kind_slots_are_distinct() {
        let slots: Vec<usize> = ChannelKind::ALL.iter().map(|k| k.slot()).collect();
        assert_eq!(slots, vec![0, 1, 2, 3]);
        for kind in ChannelKind::ALL {
            assert_eq!(ChannelKind::from_letter(kind.letter() as u8), Some(kind));
        }
    }
}
