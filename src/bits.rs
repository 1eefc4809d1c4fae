//! Bit cursor over byte slices.
//!
//! Fields are packed MSB-first: the first bit written lands in the high bit
//! of the first byte. Neither side knows what the bits mean; they only move
//! raw fields of up to 64 bits at an arbitrary bit offset.

use crate::error::{CodecError, Result};

#[inline]
fn low_mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Two's complement truncation of `v` to `width` bits.
#[inline]
pub fn low_bits(v: i64, width: u32) -> u64 {
    (v as u64) & low_mask(width)
}

/// Inverse of [`low_bits`]: interpret the top bit of a `width`-bit field as the sign.
#[inline]
pub fn sign_extend(raw: u64, width: u32) -> i64 {
    if width == 0 {
        return 0;
    }
    let shift = 64 - width;
    ((raw << shift) as i64) >> shift
}

/// Writes bit fields into a caller-owned buffer, never past `limit` bytes.
pub struct BitWriter<'a> {
    buf: &'a mut [u8],
    limit: usize,
    bit_pos: usize,
}

impl<'a> BitWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        let limit = buf.len();
        Self { buf, limit, bit_pos: 0 }
    }

    /// Start writing at a byte offset (e.g. after a header).
    pub fn at_byte(buf: &'a mut [u8], byte_offset: usize) -> Self {
        let limit = buf.len();
        Self { buf, limit, bit_pos: byte_offset * 8 }
    }

    pub fn bit_offset(&self) -> usize {
        self.bit_pos
    }

    /// Number of bytes touched so far, counting a partial trailing byte.
    pub fn bytes_written(&self) -> usize {
        self.bit_pos.div_ceil(8)
    }

    #[inline]
    fn reserve(&self, width: u32) -> Result<()> {
        let needed = (self.bit_pos + width as usize).div_ceil(8);
        if needed > self.limit {
            return Err(CodecError::OutOfSpace { needed, capacity: self.limit });
        }
        Ok(())
    }

    /// Write the low `width` bits of `value`.
    pub fn write_bits(&mut self, value: u64, width: u32) -> Result<()> {
        debug_assert!(width <= 64);
        if width == 0 {
            return Ok(());
        }
        self.reserve(width)?;

        let mut remaining = width;
        while remaining > 0 {
            let byte_idx = self.bit_pos / 8;
            let used = (self.bit_pos % 8) as u32;
            let free = 8 - used;
            let take = free.min(remaining);
            let chunk = ((value >> (remaining - take)) & low_mask(take)) as u8;
            let placed = chunk << (free - take);
            // First touch of a byte clears whatever the caller left there.
            if used == 0 {
                self.buf[byte_idx] = placed;
            } else {
                self.buf[byte_idx] |= placed;
            }
            self.bit_pos += take as usize;
            remaining -= take;
        }
        Ok(())
    }

    /// Emit `count` zero bits (unary prefixes).
    pub fn write_zero_bits(&mut self, count: u32) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        self.reserve(count)?;

        let mut remaining = count as usize;
        while remaining > 0 {
            let used = self.bit_pos % 8;
            if used == 0 {
                self.buf[self.bit_pos / 8] = 0;
            }
            let take = (8 - used).min(remaining);
            self.bit_pos += take;
            remaining -= take;
        }
        Ok(())
    }

    /// Write a single `1` bit; the terminator of every short unary code.
    #[inline]
    pub fn set_single_bit(&mut self) -> Result<()> {
        self.reserve(1)?;
        let byte_idx = self.bit_pos / 8;
        let used = self.bit_pos % 8;
        if used == 0 {
            self.buf[byte_idx] = 0x80;
        } else {
            self.buf[byte_idx] |= 0x80 >> used;
        }
        self.bit_pos += 1;
        Ok(())
    }

    /// Round up to the next byte boundary. Pad bits are already zero.
    pub fn align_to_byte(&mut self) {
        self.bit_pos = self.bit_pos.div_ceil(8) * 8;
    }

    /// Copy whole bytes at a byte-aligned position.
    pub fn write_aligned(&mut self, bytes: &[u8]) -> Result<()> {
        debug_assert_eq!(self.bit_pos % 8, 0);
        self.reserve(bytes.len() as u32 * 8)?;
        let start = self.bit_pos / 8;
        self.buf[start..start + bytes.len()].copy_from_slice(bytes);
        self.bit_pos += bytes.len() * 8;
        Ok(())
    }
}

/// Reads bit fields from a stream, never past `limit` bytes.
pub struct BitReader<'a> {
    buf: &'a [u8],
    limit_bits: usize,
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, limit_bits: buf.len() * 8, bit_pos: 0 }
    }

    /// Read from `byte_offset` up to (not including) `limit` bytes.
    pub fn with_limit(buf: &'a [u8], byte_offset: usize, limit: usize) -> Self {
        let limit = limit.min(buf.len());
        Self { buf, limit_bits: limit * 8, bit_pos: byte_offset * 8 }
    }

    pub fn bit_offset(&self) -> usize {
        self.bit_pos
    }

    pub fn bytes_consumed(&self) -> usize {
        self.bit_pos.div_ceil(8)
    }

    pub fn remaining_bits(&self) -> usize {
        self.limit_bits.saturating_sub(self.bit_pos)
    }

    #[inline]
    fn ensure(&self, width: usize) -> Result<()> {
        if self.bit_pos + width > self.limit_bits {
            return Err(CodecError::corrupt(self.bit_pos, "stream truncated"));
        }
        Ok(())
    }

    /// Read a `width`-bit unsigned field.
    pub fn read_bits(&mut self, width: u32) -> Result<u64> {
        debug_assert!(width <= 64);
        if width == 0 {
            return Ok(0);
        }
        self.ensure(width as usize)?;

        let mut value = 0u64;
        let mut remaining = width;
        while remaining > 0 {
            let byte = self.buf[self.bit_pos / 8];
            let used = (self.bit_pos % 8) as u32;
            let free = 8 - used;
            let take = free.min(remaining);
            let chunk = (u64::from(byte) >> (free - take)) & low_mask(take);
            value = (value << take) | chunk;
            self.bit_pos += take as usize;
            remaining -= take;
        }
        Ok(value)
    }

    /// Count zero bits up to and including a terminating one bit, looking at
    /// no more than `max_zeros` zeros.
    ///
    /// Returns `Some(zeros)` with the cursor past the terminator, or `None`
    /// with the cursor past exactly `max_zeros` zeros.
    pub fn read_unary(&mut self, max_zeros: u32) -> Result<Option<u32>> {
        let mut zeros = 0u32;
        loop {
            let budget = max_zeros - zeros;
            if budget == 0 {
                return Ok(None);
            }
            if self.bit_pos >= self.limit_bits {
                return Err(CodecError::corrupt(self.bit_pos, "unterminated unary code"));
            }
            let used = (self.bit_pos % 8) as u32;
            let avail = ((8 - used) as usize).min(self.limit_bits - self.bit_pos) as u32;
            // Bits already consumed in this byte are shifted out before counting.
            let window = self.buf[self.bit_pos / 8] << used;
            let lead = window.leading_zeros().min(avail);
            if lead < avail && lead < budget {
                self.bit_pos += lead as usize + 1;
                return Ok(Some(zeros + lead));
            }
            let step = avail.min(budget);
            self.bit_pos += step as usize;
            zeros += step;
        }
    }

    /// Skip to the next byte boundary.
    pub fn align_to_byte(&mut self) {
        self.bit_pos = self.bit_pos.div_ceil(8) * 8;
    }

    /// Borrow `len` whole bytes at a byte-aligned position.
    pub fn read_aligned(&mut self, len: usize) -> Result<&'a [u8]> {
        debug_assert_eq!(self.bit_pos % 8, 0);
        self.ensure(len * 8)?;
        let start = self.bit_pos / 8;
        self.bit_pos += len * 8;
        Ok(&self.buf[start..start + len])
    }
}
