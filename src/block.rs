use crate::bits::{BitReader, BitWriter};
use crate::element::Element;
use crate::error::{CodecError, Result};
use crate::transforms::delta::DeltaCoder;
use crate::transforms::rle;

/// Encodes rows of one stream. Holds the difference scratch row so it is
/// allocated once per call rather than once per block.
pub struct BlockEncoder<E: Element> {
    coder: DeltaCoder<E>,
    run_length: bool,
    diffs: Vec<i64>,
}

impl<E: Element> BlockEncoder<E> {
    pub fn new(slice_width: u32, run_length: bool) -> Result<Self> {
        Ok(Self { coder: DeltaCoder::new(slice_width)?, run_length, diffs: Vec::new() })
    }

    /// Raw first element, then the bit-packed differences, then byte alignment.
    pub fn encode_block(&mut self, writer: &mut BitWriter<'_>, row: &[E]) -> Result<()> {
        let Some((&first, _)) = row.split_first() else {
            return Ok(());
        };

        let mut raw = [0u8; 4];
        first.write_be(&mut raw);
        writer.write_aligned(&raw[..E::KIND.bytes()])?;

        if self.run_length {
            self.fill_diffs(row);
            rle::encode_row(writer, &self.coder, &self.diffs)?;
        } else {
            for pair in row.windows(2) {
                self.coder.encode_difference(writer, pair[0], pair[1])?;
            }
        }

        writer.align_to_byte();
        Ok(())
    }

    /// Exact byte length `encode_block` will produce for `row`.
    pub fn block_len(&mut self, row: &[E]) -> usize {
        if row.is_empty() {
            return 0;
        }
        let body = if self.run_length {
            self.fill_diffs(row);
            rle::row_bits(&self.coder, &self.diffs)
        } else {
            row.windows(2)
                .map(|pair| self.coder.codeword_bits(pair[1].wrapping_diff(pair[0])) as usize)
                .sum()
        };
        E::KIND.bytes() + body.div_ceil(8)
    }

    fn fill_diffs(&mut self, row: &[E]) {
        self.diffs.clear();
        self.diffs.extend(row.windows(2).map(|pair| pair[1].wrapping_diff(pair[0])));
    }
}

pub struct BlockDecoder<E: Element> {
    coder: DeltaCoder<E>,
    run_length: bool,
}

impl<E: Element> BlockDecoder<E> {
    pub fn new(slice_width: u32, run_length: bool) -> Result<Self> {
        Ok(Self { coder: DeltaCoder::new(slice_width)?, run_length })
    }

    pub fn decode_block(&self, reader: &mut BitReader<'_>, out: &mut [E]) -> Result<()> {
        let Some((head, rest)) = out.split_first_mut() else {
            return Ok(());
        };

        let first = E::read_be(reader.read_aligned(E::KIND.bytes())?);
        *head = first;

        if self.run_length {
            rle::decode_row(reader, &self.coder, first, rest)?;
        } else {
            let mut prev = first;
            for slot in rest.iter_mut() {
                prev = self.coder.decode_difference(reader, prev)?;
                *slot = prev;
            }
        }

        reader.align_to_byte();
        Ok(())
    }
}

/// Upper bound on the encoded size of one block of `block_width` elements.
pub fn max_block_len<E: Element>(block_width: usize, slice_width: u32, run_length: bool) -> Result<usize> {
    if block_width == 0 {
        return Ok(0);
    }
    let coder = DeltaCoder::<E>::new(slice_width)?;
    let overflow = || CodecError::invalid("block width too large for worst-case size");

    let tail = block_width - 1;
    let mut bits = tail
        .checked_mul(coder.max_codeword_bits() as usize)
        .ok_or_else(overflow)?;
    if run_length {
        // A constant run never costs more than its elements would as
        // escapes, so literal-run markers are the only overhead.
        bits = bits
            .checked_add(tail.div_ceil(rle::MAX_LITERAL_RUN) * rle::MARKER_BITS as usize)
            .ok_or_else(overflow)?;
    }
    Ok(E::KIND.bytes() + bits.div_ceil(8))
}
