//! Endian-aware primitive reads and writes
//!
//! The US layout is always little-endian. The JA layout is read with the
//! byte order chosen at load time and written back the same way.

use std::io::{Read, Write};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::Result;

/// Byte order of multi-byte fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

impl Endian {
    /// `Big` when `big_endian` is set.
    #[must_use]
    pub fn from_flag(big_endian: bool) -> Self {
        if big_endian { Self::Big } else { Self::Little }
    }

    pub(crate) fn read_u16<R: Read>(self, r: &mut R) -> Result<u16> {
        Ok(match self {
            Self::Little => r.read_u16::<LittleEndian>()?,
            Self::Big => r.read_u16::<BigEndian>()?,
        })
    }

    pub(crate) fn read_i16<R: Read>(self, r: &mut R) -> Result<i16> {
        Ok(match self {
            Self::Little => r.read_i16::<LittleEndian>()?,
            Self::Big => r.read_i16::<BigEndian>()?,
        })
    }

    pub(crate) fn read_u32<R: Read>(self, r: &mut R) -> Result<u32> {
        Ok(match self {
            Self::Little => r.read_u32::<LittleEndian>()?,
            Self::Big => r.read_u32::<BigEndian>()?,
        })
    }

    pub(crate) fn read_i16_array<R: Read>(self, r: &mut R, len: usize) -> Result<Vec<i16>> {
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            out.push(self.read_i16(r)?);
        }
        Ok(out)
    }

    pub(crate) fn write_u16<W: Write>(self, w: &mut W, value: u16) -> Result<()> {
        match self {
            Self::Little => w.write_u16::<LittleEndian>(value)?,
            Self::Big => w.write_u16::<BigEndian>(value)?,
        }
        Ok(())
    }

    pub(crate) fn write_i16<W: Write>(self, w: &mut W, value: i16) -> Result<()> {
        match self {
            Self::Little => w.write_i16::<LittleEndian>(value)?,
            Self::Big => w.write_i16::<BigEndian>(value)?,
        }
        Ok(())
    }

    pub(crate) fn write_u32<W: Write>(self, w: &mut W, value: u32) -> Result<()> {
        match self {
            Self::Little => w.write_u32::<LittleEndian>(value)?,
            Self::Big => w.write_u32::<BigEndian>(value)?,
        }
        Ok(())
    }

    pub(crate) fn write_i16_array<W: Write>(self, w: &mut W, values: &[i16]) -> Result<()> {
        for &v in values {
            self.write_i16(w, v)?;
        }
        Ok(())
    }
}

/// Round `value` up to the next multiple of [`ALIGNMENT`](super::ALIGNMENT).
#[must_use]
pub fn align_up(value: u32) -> u32 {
    value.next_multiple_of(super::ALIGNMENT)
}
