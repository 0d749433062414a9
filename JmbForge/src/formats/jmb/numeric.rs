//! Signed 16-bit big-endian control code value
//!
//! Every slot of a sentence code array is one of these. Parsing from text
//! follows the big-endian digit order used by the inline `@xy` escapes
//! (`"ff0a"` is `0xFF0A`).

use std::fmt;
use std::ops::BitOr;

use crate::error::{Error, Result};

/// A 16-bit control code, stored as its signed native value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct S16Be(i16);

impl S16Be {
    /// Wrap a native value.
    #[must_use]
    pub const fn new(value: i16) -> Self {
        Self(value)
    }

    /// Reinterpret raw bits as a signed code.
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits as i16)
    }

    /// Parse two hex digit pairs (`"fffd"`) into a code.
    ///
    /// # Errors
    /// Returns [`Error::InvalidHex`] unless the input is exactly four hex digits.
    pub fn from_hex(pairs: &str) -> Result<Self> {
        if pairs.len() != 4 || !pairs.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidHex(pairs.to_string()));
        }
        u16::from_str_radix(pairs, 16)
            .map(Self::from_bits)
            .map_err(|_| Error::InvalidHex(pairs.to_string()))
    }

    /// Combine with a category flag.
    #[must_use]
    pub const fn with_flag(self, flag: Self) -> Self {
        Self(self.0 | flag.0)
    }

    /// The signed native value.
    #[must_use]
    pub const fn to_int(self) -> i16 {
        self.0
    }

    /// Raw bit pattern.
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0 as u16
    }

    /// High byte of the big-endian representation.
    #[must_use]
    pub const fn high_byte(self) -> u8 {
        self.0.to_be_bytes()[0]
    }
}

impl BitOr for S16Be {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.with_flag(rhs)
    }
}

impl From<i16> for S16Be {
    fn from(value: i16) -> Self {
        Self(value)
    }
}

impl From<S16Be> for i16 {
    fn from(value: S16Be) -> Self {
        value.0
    }
}

impl fmt::Display for S16Be {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}", self.bits())
    }
}
