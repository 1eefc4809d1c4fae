use rowpack::{decode_batch, encode_batch, encode_to_vec, stream_info, CodecConfig, Raster};

fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::init();

	let width = 320;
	let height = 40;
	let frame: Vec<i16> = (0..width * height)
		.map(|i| {
			let (x, y) = ((i % width) as i16, (i / width) as i16);
			if x > 150 && x < 170 { 900 } else { 100 + y / 4 + x / 16 }
		})
		.collect();

	let config = CodecConfig::default().with_slice_width(1);
	let stream = encode_to_vec(&frame, width, height, &config)?;
	let info = stream_info(&stream)?;
	println!(
		"{} frame {}x{}: {} -> {} bytes ({:.2}x)",
		info.kind, info.block_width, info.block_count, info.original_size, info.compressed_size, info.compression_ratio
	);

	let tiles: Vec<Raster<'_, i16>> = frame.chunks(width * 10).map(|tile| Raster::new(tile, width, 10)).collect();
	let (streams, stats) = encode_batch(&tiles, &config)?;
	println!(
		"batch of {} tiles: {} -> {} bytes ({:.2}x) in {:?}",
		stats.arrays_processed, stats.original_size, stats.compressed_size, stats.ratio, stats.processing_time
	);

	let restored: Vec<i16> = decode_batch::<i16, _>(&streams, config.threads)?.concat();
	assert_eq!(restored, frame);
	println!("restored {} elements", restored.len());
	Ok(())
}
