//! First-difference coder.
//!
//! Each difference `d = curr - prev` (wrapping in the element type) is
//! written as:
//!
//! | Field    | Bits                 | Contents                                  |
//! |----------|----------------------|-------------------------------------------|
//! | slice    | `slice_width`        | low bits of `d`                           |
//! | unary    | `m + 1`              | `m` zeros then a one, for `m < 31`        |
//! | escape   | `32 + element_bits+1`| 32 zeros then `d` with an explicit sign   |
//!
//! where `m` is the zig-zag image of `q = d >> slice_width`.

use crate::bits::{low_bits, sign_extend, BitReader, BitWriter};
use crate::element::{in_range, Element};
use crate::error::{CodecError, Result};
use std::marker::PhantomData;

/// Zig-zag values at or above this are escaped.
pub const ESCAPE_THRESHOLD: u64 = 31;

/// Length of the all-zero escape prefix.
pub const ESCAPE_ZEROS: u32 = 32;

/// Map a signed quotient onto the non-negative integers: 0, -1, 1, -2, ...
#[inline]
pub fn zigzag(q: i64) -> u64 {
    if q >= 0 {
        (q as u64) << 1
    } else {
        (-2 * q - 1) as u64
    }
}

#[inline]
pub fn unzigzag(m: u64) -> i64 {
    if m & 1 == 0 {
        (m >> 1) as i64
    } else {
        -((m >> 1) as i64) - 1
    }
}

/// How a single difference is laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codeword {
    Unary { slice: u64, zeros: u32 },
    Escape { slice: u64, literal: u64 },
}

/// Per-call difference codec for element type `E`.
#[derive(Debug, Clone, Copy)]
pub struct DeltaCoder<E: Element> {
    slice_width: u32,
    _element: PhantomData<E>,
}

impl<E: Element> DeltaCoder<E> {
    pub fn new(slice_width: u32) -> Result<Self> {
        if slice_width > E::BITS {
            return Err(CodecError::invalid(format!(
                "slice width {} exceeds {}-bit element width",
                slice_width,
                E::BITS
            )));
        }
        Ok(Self { slice_width, _element: PhantomData })
    }

    pub fn slice_width(&self) -> u32 {
        self.slice_width
    }

    pub fn escape_bits(&self) -> u32 {
        E::KIND.escape_bits()
    }

    pub fn classify(&self, d: i64) -> Codeword {
        let slice = low_bits(d, self.slice_width);
        let m = zigzag(d >> self.slice_width);
        if m < ESCAPE_THRESHOLD {
            Codeword::Unary { slice, zeros: m as u32 }
        } else {
            Codeword::Escape { slice, literal: low_bits(d, self.escape_bits()) }
        }
    }

    /// Exact encoded length of `d` in bits.
    pub fn codeword_bits(&self, d: i64) -> u32 {
        match self.classify(d) {
            Codeword::Unary { zeros, .. } => self.slice_width + zeros + 1,
            Codeword::Escape { .. } => self.slice_width + ESCAPE_ZEROS + self.escape_bits(),
        }
    }

    /// Longest possible codeword for this element type and slice width.
    pub fn max_codeword_bits(&self) -> u32 {
        self.slice_width + ESCAPE_ZEROS + self.escape_bits()
    }

    pub fn encode_difference(&self, writer: &mut BitWriter<'_>, prev: E, curr: E) -> Result<()> {
        self.write_delta(writer, curr.wrapping_diff(prev))
    }

    pub(crate) fn write_delta(&self, writer: &mut BitWriter<'_>, d: i64) -> Result<()> {
        match self.classify(d) {
            Codeword::Unary { slice, zeros } => {
                writer.write_bits(slice, self.slice_width)?;
                writer.write_zero_bits(zeros)?;
                writer.set_single_bit()
            }
            Codeword::Escape { slice, literal } => {
                writer.write_bits(slice, self.slice_width)?;
                writer.write_zero_bits(ESCAPE_ZEROS)?;
                writer.write_bits(literal, self.escape_bits())
            }
        }
    }

    pub fn decode_difference(&self, reader: &mut BitReader<'_>, prev: E) -> Result<E> {
        let d = self.read_delta(reader)?;
        Ok(prev.wrapping_offset(d))
    }

    pub(crate) fn read_delta(&self, reader: &mut BitReader<'_>) -> Result<i64> {
        let start = reader.bit_offset();
        let slice = reader.read_bits(self.slice_width)?;

        match reader.read_unary(ESCAPE_ZEROS)? {
            Some(zeros) if u64::from(zeros) >= ESCAPE_THRESHOLD => {
                Err(CodecError::corrupt(start, "non-canonical unary code"))
            }
            Some(zeros) => {
                let d = (unzigzag(u64::from(zeros)) << self.slice_width) | slice as i64;
                if !in_range::<E>(d) {
                    return Err(CodecError::corrupt(start, "difference outside element range"));
                }
                Ok(d)
            }
            None => {
                let width = self.escape_bits();
                let d = sign_extend(reader.read_bits(width)?, width);
                if !in_range::<E>(d) {
                    return Err(CodecError::corrupt(start, "escape literal outside element range"));
                }
                if zigzag(d >> self.slice_width) < ESCAPE_THRESHOLD {
                    return Err(CodecError::corrupt(start, "non-canonical escape"));
                }
                if low_bits(d, self.slice_width) != slice {
                    return Err(CodecError::corrupt(start, "escape literal disagrees with slice"));
                }
                Ok(d)
            }
        }
    }
}
