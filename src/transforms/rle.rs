//! Run-length layer over the difference coder.
//!
//! A block body becomes a sequence of segments, each introduced by one
//! signed 8-bit marker written at the current bit offset:
//!
//! | Marker byte   | Segment                                                   |
//! |---------------|-----------------------------------------------------------|
//! | `0x01..=0x7F` | literal run: that many difference codewords follow        |
//! | `0x81..=0xFF` | constant run of `257 - byte` (2..=128) differences, then  |
//! |               | the difference itself as a raw element-width literal      |
//! | `0x80`        | continuation: 8-bit `n - 1` follows, the previous constant|
//! |               | difference repeats `n` (1..=256) more times               |
//! | `0x00`        | never emitted                                             |

use crate::bits::{low_bits, sign_extend, BitReader, BitWriter};
use crate::element::Element;
use crate::error::{CodecError, Result};
use crate::transforms::delta::DeltaCoder;
use log::trace;

/// Shortest run of equal differences worth a constant-run segment.
pub const RUN_THRESHOLD: usize = 4;

pub const MAX_LITERAL_RUN: usize = 127;

pub const MAX_CONSTANT_RUN: usize = 128;

pub const CONTINUATION_MARKER: u8 = 0x80;

pub const MAX_CONTINUATION_RUN: usize = 256;

pub const MARKER_BITS: u32 = 8;

/// Logical segment of a difference row, before marker-size splitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    LiteralRun(usize),
    ConstantRun { value: i64, len: usize },
}

impl Segment {
    pub fn len(&self) -> usize {
        match *self {
            Segment::LiteralRun(len) | Segment::ConstantRun { len, .. } => len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decoded marker byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Literal(usize),
    Constant(usize),
    Continuation,
}

impl Marker {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => None,
            1..=0x7F => Some(Marker::Literal(byte as usize)),
            CONTINUATION_MARKER => Some(Marker::Continuation),
            _ => Some(Marker::Constant(257 - byte as usize)),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Marker::Literal(n) => {
                debug_assert!((1..=MAX_LITERAL_RUN).contains(&n));
                n as u8
            }
            Marker::Constant(n) => {
                debug_assert!((2..=MAX_CONSTANT_RUN).contains(&n));
                (257 - n) as u8
            }
            Marker::Continuation => CONTINUATION_MARKER,
        }
    }
}

/// Split a difference row into literal and constant runs.
pub fn plan_segments(diffs: &[i64]) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut pending = 0;
    let mut i = 0;

    while i < diffs.len() {
        let value = diffs[i];
        let mut run = 1;
        while i + run < diffs.len() && diffs[i + run] == value {
            run += 1;
        }

        if run >= RUN_THRESHOLD {
            if pending > 0 {
                segments.push(Segment::LiteralRun(pending));
                pending = 0;
            }
            segments.push(Segment::ConstantRun { value, len: run });
        } else {
            pending += run;
        }
        i += run;
    }

    if pending > 0 {
        segments.push(Segment::LiteralRun(pending));
    }
    segments
}

/// Exact encoded size of a difference row in bits.
pub fn row_bits<E: Element>(coder: &DeltaCoder<E>, diffs: &[i64]) -> usize {
    let mut bits = 0usize;
    let mut pos = 0;
    for segment in plan_segments(diffs) {
        match segment {
            Segment::LiteralRun(len) => {
                bits += len.div_ceil(MAX_LITERAL_RUN) * MARKER_BITS as usize;
                bits += diffs[pos..pos + len]
                    .iter()
                    .map(|&d| coder.codeword_bits(d) as usize)
                    .sum::<usize>();
            }
            Segment::ConstantRun { len, .. } => {
                bits += MARKER_BITS as usize + E::BITS as usize;
                let rest = len.saturating_sub(MAX_CONSTANT_RUN);
                bits += rest.div_ceil(MAX_CONTINUATION_RUN) * 2 * MARKER_BITS as usize;
            }
        }
        pos += segment.len();
    }
    bits
}

pub fn encode_row<E: Element>(
    writer: &mut BitWriter<'_>,
    coder: &DeltaCoder<E>,
    diffs: &[i64],
) -> Result<()> {
    let mut pos = 0;
    for segment in plan_segments(diffs) {
        match segment {
            Segment::LiteralRun(len) => {
                for chunk in diffs[pos..pos + len].chunks(MAX_LITERAL_RUN) {
                    writer.write_bits(u64::from(Marker::Literal(chunk.len()).to_byte()), MARKER_BITS)?;
                    for &d in chunk {
                        coder.write_delta(writer, d)?;
                    }
                }
            }
            Segment::ConstantRun { value, len } => {
                trace!("constant run of {} x {} at element {}", len, value, pos + 1);
                let head = len.min(MAX_CONSTANT_RUN);
                writer.write_bits(u64::from(Marker::Constant(head).to_byte()), MARKER_BITS)?;
                writer.write_bits(low_bits(value, E::BITS), E::BITS)?;

                let mut rest = len - head;
                while rest > 0 {
                    let n = rest.min(MAX_CONTINUATION_RUN);
                    writer.write_bits(u64::from(CONTINUATION_MARKER), MARKER_BITS)?;
                    writer.write_bits((n - 1) as u64, MARKER_BITS)?;
                    rest -= n;
                }
            }
        }
        pos += segment.len();
    }
    Ok(())
}

/// Decode `out.len()` elements following `first`.
pub fn decode_row<E: Element>(
    reader: &mut BitReader<'_>,
    coder: &DeltaCoder<E>,
    first: E,
    out: &mut [E],
) -> Result<()> {
    let mut prev = first;
    let mut filled = 0;
    let mut last_constant: Option<i64> = None;

    while filled < out.len() {
        let at = reader.bit_offset();
        let byte = reader.read_bits(MARKER_BITS)? as u8;
        let remaining = out.len() - filled;

        let (len, repeated) = match Marker::from_byte(byte) {
            None => return Err(CodecError::corrupt(at, "zero run marker")),
            Some(Marker::Literal(n)) => {
                if n > remaining {
                    return Err(CodecError::corrupt(at, "literal run overruns block"));
                }
                for slot in &mut out[filled..filled + n] {
                    prev = coder.decode_difference(reader, prev)?;
                    *slot = prev;
                }
                filled += n;
                last_constant = None;
                continue;
            }
            Some(Marker::Constant(n)) => {
                let d = sign_extend(reader.read_bits(E::BITS)?, E::BITS);
                (n, d)
            }
            Some(Marker::Continuation) => {
                let d = last_constant
                    .ok_or_else(|| CodecError::corrupt(at, "continuation without constant run"))?;
                let n = reader.read_bits(MARKER_BITS)? as usize + 1;
                (n, d)
            }
        };

        if len > remaining {
            return Err(CodecError::corrupt(at, "constant run overruns block"));
        }
        for slot in &mut out[filled..filled + len] {
            prev = prev.wrapping_offset(repeated);
            *slot = prev;
        }
        filled += len;
        last_constant = Some(repeated);
    }
    Ok(())
}
