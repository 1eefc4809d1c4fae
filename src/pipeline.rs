use crate::bits::{BitReader, BitWriter};
use crate::block::{max_block_len, BlockDecoder, BlockEncoder};
use crate::config::CodecConfig;
use crate::container::{Header, HEADER_SIZE};
use crate::element::{Element, ElementKind};
use crate::error::{CodecError, Result};
use log::{debug, trace, warn};
use rayon::prelude::*;
use std::time::{Duration, Instant};

/// Upper bound on elements per stream byte: one continuation pair (16 bits)
/// repeats a constant at most 256 times.
const MAX_ELEMENTS_PER_BYTE: u64 = 128;

#[derive(Debug, Clone)]
pub struct CompressionStats {
	pub original_size: u64,
	pub compressed_size: u64,
	pub ratio: f64,
	pub arrays_processed: usize,
	pub processing_time: Duration,
}

impl CompressionStats {
	fn new(original_size: u64, compressed_size: u64, arrays_processed: usize, processing_time: Duration) -> Self {
		let ratio = if compressed_size > 0 { original_size as f64 / compressed_size as f64 } else { 0.0 };
		Self { original_size, compressed_size, ratio, arrays_processed, processing_time }
	}
}

/// Header fields of an encoded stream plus derived sizes.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
	pub kind: ElementKind,
	pub block_width: usize,
	pub block_count: usize,
	pub slice_width: u32,
	pub run_length: bool,
	pub original_size: u64,
	pub compressed_size: u64,
	pub compression_ratio: f64,
}

/// A borrowed raster handed to the batch functions.
#[derive(Debug, Clone, Copy)]
pub struct Raster<'a, E: Element> {
	pub data: &'a [E],
	pub block_width: usize,
	pub block_count: usize,
}

impl<'a, E: Element> Raster<'a, E> {
	pub fn new(data: &'a [E], block_width: usize, block_count: usize) -> Self {
		Self { data, block_width, block_count }
	}
}

/// Returns the element count, checking that the geometry fits the header fields.
fn check_geometry(block_width: usize, block_count: usize) -> Result<usize> {
	if u32::try_from(block_width).is_err() || u32::try_from(block_count).is_err() {
		return Err(CodecError::invalid(format!(
			"geometry {}x{} does not fit 32-bit header fields", block_width, block_count
		)));
	}
	block_width
		.checked_mul(block_count)
		.ok_or_else(|| CodecError::invalid("block_width * block_count overflows"))
}

fn check_len(what: &str, actual: usize, expected: usize) -> Result<()> {
	if actual != expected {
		return Err(CodecError::invalid(format!(
			"{} holds {} elements, geometry needs {}", what, actual, expected
		)));
	}
	Ok(())
}

/// Encode `block_count` rows of `block_width` elements into `dest`.
///
/// Returns the number of bytes written, which is also recorded in the
/// header. Fails with `OutOfSpace` if `dest` cannot hold the stream; bytes
/// past the returned length are never touched.
pub fn encode<E: Element>(
	source: &[E],
	block_width: usize,
	block_count: usize,
	slice_width: u32,
	run_length: bool,
	dest: &mut [u8],
) -> Result<usize> {
	let count = check_geometry(block_width, block_count)?;
	check_len("source", source.len(), count)?;
	let mut encoder = BlockEncoder::<E>::new(slice_width, run_length)?;

	let header = Header {
		total_size: 0,
		block_count: block_count as u32,
		block_width: block_width as u32,
		slice_width: slice_width as u8,
		kind: E::KIND,
		run_length,
	};
	header.write(dest)?;

	let mut writer = BitWriter::at_byte(dest, HEADER_SIZE);
	if block_width > 0 {
		for (i, row) in source.chunks_exact(block_width).enumerate() {
			let start = writer.bytes_written();
			encoder.encode_block(&mut writer, row)?;
			trace!("block {} -> {} bytes", i, writer.bytes_written() - start);
		}
	}
	let total = writer.bytes_written();

	let total_size = u32::try_from(total)
		.map_err(|_| CodecError::invalid(format!("encoded stream of {} bytes exceeds u32 size field", total)))?;
	Header::patch_total_size(dest, total_size);

	debug!(
		"encoded {} {} elements ({}x{}, slice {}, rle {}) into {} bytes",
		count, E::KIND, block_width, block_count, slice_width, run_length, total
	);
	Ok(total)
}

pub fn encode_with<E: Element>(
	source: &[E],
	block_width: usize,
	block_count: usize,
	config: &CodecConfig,
	dest: &mut [u8],
) -> Result<usize> {
	config.validate_for(E::KIND)?;
	encode(source, block_width, block_count, config.slice_width, config.run_length, dest)
}

/// Decode a stream produced by [`encode`] into `dest`.
///
/// The caller's geometry and element type must match the header.
pub fn decode<E: Element>(source: &[u8], block_width: usize, block_count: usize, dest: &mut [E]) -> Result<()> {
	let count = check_geometry(block_width, block_count)?;
	check_len("destination", dest.len(), count)?;

	let header = Header::read(source)?;
	if header.kind != E::KIND {
		return Err(CodecError::invalid(format!(
			"stream holds {} elements, caller asked for {}", header.kind, E::KIND
		)));
	}
	if header.block_width as usize != block_width || header.block_count as usize != block_count {
		return Err(CodecError::invalid(format!(
			"stream geometry {}x{} does not match requested {}x{}",
			header.block_width, header.block_count, block_width, block_count
		)));
	}

	let result = decode_body(source, &header, dest);
	if let Err(ref e) = result {
		warn!("decode of {}x{} {} stream failed: {}", block_width, block_count, E::KIND, e);
	}
	result
}

/// `total_size` from the header, checked against the bytes actually present.
fn declared_len(header: &Header, available: usize) -> Result<usize> {
	let total = header.total_size as usize;
	if total < HEADER_SIZE {
		return Err(CodecError::corrupt(0, "declared size smaller than header"));
	}
	if total > available {
		return Err(CodecError::corrupt(available * 8, "stream shorter than declared size"));
	}
	Ok(total)
}

fn decode_body<E: Element>(source: &[u8], header: &Header, dest: &mut [E]) -> Result<()> {
	let total = declared_len(header, source.len())?;
	let decoder = BlockDecoder::<E>::new(u32::from(header.slice_width), header.run_length)?;
	let mut reader = BitReader::with_limit(source, HEADER_SIZE, total);
	let block_width = header.block_width as usize;
	if block_width > 0 {
		for row in dest.chunks_exact_mut(block_width) {
			decoder.decode_block(&mut reader, row)?;
		}
	}

	if reader.bytes_consumed() != total {
		return Err(CodecError::corrupt(reader.bit_offset(), "trailing bytes after last block"));
	}
	debug!("decoded {} bytes into {} {} elements", total, dest.len(), E::KIND);
	Ok(())
}

/// Worst-case encoded size for the given geometry, header included.
pub fn max_encoded_len<E: Element>(
	block_width: usize,
	block_count: usize,
	slice_width: u32,
	run_length: bool,
) -> Result<usize> {
	check_geometry(block_width, block_count)?;
	max_block_len::<E>(block_width, slice_width, run_length)?
		.checked_mul(block_count)
		.and_then(|body| body.checked_add(HEADER_SIZE))
		.ok_or_else(|| CodecError::invalid("worst-case size overflows usize"))
}

/// Encode into a freshly allocated buffer sized to the worst case.
pub fn encode_to_vec<E: Element>(
	source: &[E],
	block_width: usize,
	block_count: usize,
	config: &CodecConfig,
) -> Result<Vec<u8>> {
	config.validate_for(E::KIND)?;
	check_len("source", source.len(), check_geometry(block_width, block_count)?)?;
	let capacity = max_encoded_len::<E>(block_width, block_count, config.slice_width, config.run_length)?;
	let mut out = vec![0u8; capacity];
	let len = encode_with(source, block_width, block_count, config, &mut out)?;
	out.truncate(len);
	Ok(out)
}

/// Decode a stream whose geometry is taken from its own header.
pub fn decode_to_vec<E: Element>(stream: &[u8]) -> Result<Vec<E>> {
	let header = Header::read(stream)?;
	let total = declared_len(&header, stream.len())?;
	let count = header.element_count();
	if count > (total as u64).saturating_mul(MAX_ELEMENTS_PER_BYTE) {
		return Err(CodecError::corrupt(4 * 8, "geometry larger than the stream can hold"));
	}
	let count = usize::try_from(count).map_err(|_| CodecError::corrupt(4 * 8, "geometry overflows usize"))?;

	let mut out = vec![E::default(); count];
	decode(stream, header.block_width as usize, header.block_count as usize, &mut out)?;
	Ok(out)
}

pub fn stream_info(stream: &[u8]) -> Result<StreamInfo> {
	let header = Header::read(stream)?;
	let original_size = header.element_count() * header.kind.bytes() as u64;
	let compressed_size = u64::from(header.total_size);
	let compression_ratio = if compressed_size > 0 { original_size as f64 / compressed_size as f64 } else { 0.0 };

	Ok(StreamInfo {
		kind: header.kind,
		block_width: header.block_width as usize,
		block_count: header.block_count as usize,
		slice_width: u32::from(header.slice_width),
		run_length: header.run_length,
		original_size,
		compressed_size,
		compression_ratio,
	})
}

/// Fully decodes the stream and discards the result. A malformed stream is
/// `Ok(false)`; a stream of another element type is still an error.
pub fn validate_stream<E: Element>(stream: &[u8]) -> Result<bool> {
	match decode_to_vec::<E>(stream) {
		Ok(_) => Ok(true),
		Err(CodecError::CorruptStream { .. }) => Ok(false),
		Err(e) => Err(e),
	}
}

fn build_pool(threads: usize) -> Result<rayon::ThreadPool> {
	if threads == 0 {
		return Err(CodecError::invalid("thread count must be at least 1"));
	}
	rayon::ThreadPoolBuilder::new()
		.num_threads(threads)
		.build()
		.map_err(|e| CodecError::ThreadPool(e.to_string()))
}

/// Encode independent rasters in parallel. Output order follows input order.
pub fn encode_batch<E: Element>(
	rasters: &[Raster<'_, E>],
	config: &CodecConfig,
) -> Result<(Vec<Vec<u8>>, CompressionStats)> {
	config.validate_for(E::KIND)?;
	let pool = build_pool(config.threads)?;
	let started = Instant::now();

	let streams = pool.install(|| {
		rasters
			.par_iter()
			.map(|r| encode_to_vec(r.data, r.block_width, r.block_count, config))
			.collect::<Result<Vec<_>>>()
	})?;

	let original_size = rasters.iter().map(|r| (r.data.len() * E::KIND.bytes()) as u64).sum();
	let compressed_size = streams.iter().map(|s| s.len() as u64).sum();
	let stats = CompressionStats::new(original_size, compressed_size, rasters.len(), started.elapsed());
	debug!(
		"batch encoded {} rasters on {} threads: {} -> {} bytes ({:.2}x)",
		stats.arrays_processed, config.threads, stats.original_size, stats.compressed_size, stats.ratio
	);
	Ok((streams, stats))
}

/// Decode independent streams in parallel. Output order follows input order.
pub fn decode_batch<E: Element, S: AsRef<[u8]> + Sync>(streams: &[S], threads: usize) -> Result<Vec<Vec<E>>> {
	let pool = build_pool(threads)?;
	let decoded = pool.install(|| {
		streams
			.par_iter()
			.map(|s| decode_to_vec::<E>(s.as_ref()))
			.collect::<Result<Vec<_>>>()
	})?;
	debug!("batch decoded {} streams on {} threads", decoded.len(), threads);
	Ok(decoded)
}
