use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rowpack::{
	decode, decode_to_vec, encode, encode_to_vec, max_encoded_len, stream_info, CodecConfig, CodecError, Element,
	Header, HEADER_SIZE,
};

fn init_logger() {
	let _ = env_logger::builder().is_test(true).try_init();
}

fn random_walk<E: Element>(rng: &mut StdRng, len: usize, step: i64) -> Vec<E> {
	let mut value: i64 = 0;
	(0..len)
		.map(|_| {
			value = (value + rng.gen_range(-step..=step)).clamp(E::MIN, E::MAX);
			E::from_i64_checked(value).unwrap()
		})
		.collect()
}

fn ramp<E: Element>(len: usize) -> Vec<E> {
	(0..len as i64).map(|i| E::from_i64_checked(i % E::MAX).unwrap()).collect()
}

fn single_jump<E: Element>(len: usize) -> Vec<E> {
	(0..len).map(|i| if i < len / 2 { E::from_i64_checked(E::MIN).unwrap() } else { E::from_i64_checked(E::MAX).unwrap() }).collect()
}

fn uniform<E: Element>(rng: &mut StdRng, len: usize) -> Vec<E> {
	(0..len).map(|_| E::from_i64_checked(rng.gen_range(E::MIN..=E::MAX)).unwrap()).collect()
}

fn datasets<E: Element>(rng: &mut StdRng, len: usize) -> Vec<(&'static str, Vec<E>)> {
	vec![
		("zeros", vec![E::default(); len]),
		("ramp", ramp(len)),
		("walk", random_walk(rng, len, 5)),
		("wide_walk", random_walk(rng, len, 3000)),
		("jump", single_jump(len)),
		("uniform", uniform(rng, len)),
	]
}

fn assert_roundtrips<E: Element>(seed: u64) {
	let mut rng = StdRng::seed_from_u64(seed);
	let (block_width, block_count) = (97, 5);

	for (name, data) in datasets::<E>(&mut rng, block_width * block_count) {
		for slice_width in 0..=E::BITS {
			for run_length in [false, true] {
				let capacity = max_encoded_len::<E>(block_width, block_count, slice_width, run_length).unwrap();
				let mut stream = vec![0u8; capacity];
				let len = encode(&data, block_width, block_count, slice_width, run_length, &mut stream)
					.unwrap_or_else(|e| panic!("{} s={} rle={}: {}", name, slice_width, run_length, e));

				let mut decoded = vec![E::default(); data.len()];
				decode(&stream[..len], block_width, block_count, &mut decoded).unwrap();
				assert_eq!(decoded, data, "{} {} s={} rle={}", E::KIND, name, slice_width, run_length);
			}
		}
	}
}

#[test]
fn round_trip_int8() {
	init_logger();
	assert_roundtrips::<i8>(8);
}

#[test]
fn round_trip_int16() {
	init_logger();
	assert_roundtrips::<i16>(16);
}

#[test]
fn round_trip_int32() {
	init_logger();
	assert_roundtrips::<i32>(32);
}

#[test]
fn smooth_data_compresses() {
	let mut rng = StdRng::seed_from_u64(7);
	let data: Vec<i16> = random_walk(&mut rng, 640 * 48, 3);
	let stream = encode_to_vec(&data, 640, 48, &CodecConfig::default().with_slice_width(2)).unwrap();
	let info = stream_info(&stream).unwrap();
	assert!(info.compression_ratio > 2.0, "ratio {:.2}", info.compression_ratio);
}

#[test]
fn one_byte_short_is_out_of_space() {
	let mut rng = StdRng::seed_from_u64(99);
	let data: Vec<i32> = random_walk(&mut rng, 50 * 4, 400);
	for run_length in [false, true] {
		let exact = encode_to_vec(&data, 50, 4, &CodecConfig::default().with_run_length(run_length)).unwrap();

		// last byte is the canary
		let mut dest = vec![0u8; exact.len()];
		dest[exact.len() - 1] = 0xA5;
		let err = encode(&data, 50, 4, 3, run_length, &mut dest[..exact.len() - 1]).unwrap_err();
		assert!(err.is_out_of_space(), "{:?}", err);
		assert_eq!(dest[exact.len() - 1], 0xA5);

		let mut dest = vec![0u8; exact.len()];
		assert_eq!(encode(&data, 50, 4, 3, run_length, &mut dest).unwrap(), exact.len());
		assert_eq!(dest, exact);
	}
}

#[test]
fn header_too_small_for_dest() {
	let err = encode::<i8>(&[1, 2, 3], 3, 1, 0, false, &mut [0u8; 10]).unwrap_err();
	assert_eq!(err, CodecError::OutOfSpace { needed: HEADER_SIZE, capacity: 10 });
}

#[test]
fn long_zero_run_is_corrupt() {
	let data: Vec<i16> = (0..32).map(|i| i * 2).collect();
	let mut stream = encode_to_vec(&data, 32, 1, &CodecConfig::default().with_run_length(false)).unwrap();

	// wipe everything after the raw first element: 33+ zero bits with no valid escape
	let len = stream.len();
	for byte in &mut stream[HEADER_SIZE + 2..len] {
		*byte = 0;
	}
	let mut out = vec![0i16; 32];
	let err = decode(&stream, 32, 1, &mut out).unwrap_err();
	assert!(err.is_corrupt(), "{:?}", err);
}

#[test]
fn flipped_bits_never_panic() {
	let mut rng = StdRng::seed_from_u64(1234);
	let data: Vec<i16> = random_walk(&mut rng, 64 * 8, 40);
	let stream = encode_to_vec(&data, 64, 8, &CodecConfig::default()).unwrap();

	for _ in 0..500 {
		let mut damaged = stream.clone();
		let bit = rng.gen_range(HEADER_SIZE * 8..damaged.len() * 8);
		damaged[bit / 8] ^= 0x80 >> (bit % 8);
		let mut out = vec![0i16; data.len()];
		// either an error or some decoded raster, but never a panic or overread
		let _ = decode(&damaged, 64, 8, &mut out);
	}
}

#[test]
fn truncated_stream_is_corrupt() {
	let data: Vec<i8> = (0..40).map(|i| (i * 3) as i8).collect();
	let stream = encode_to_vec(&data, 20, 2, &CodecConfig::default()).unwrap();
	for cut in [0, 5, HEADER_SIZE, stream.len() - 1] {
		let mut out = vec![0i8; 40];
		assert!(decode(&stream[..cut], 20, 2, &mut out).unwrap_err().is_corrupt(), "cut at {}", cut);
	}
}

#[test]
fn caller_geometry_must_match_header() {
	let data = vec![5i32; 12];
	let stream = encode_to_vec(&data, 4, 3, &CodecConfig::default()).unwrap();

	let mut out = vec![0i32; 12];
	assert!(matches!(decode(&stream, 3, 4, &mut out), Err(CodecError::InvalidParameter(_))));
	let mut short = vec![0i32; 11];
	assert!(matches!(decode(&stream, 4, 3, &mut short), Err(CodecError::InvalidParameter(_))));
	let mut wrong: Vec<i16> = vec![0; 12];
	assert!(matches!(decode(&stream, 4, 3, &mut wrong), Err(CodecError::InvalidParameter(_))));

	decode(&stream, 4, 3, &mut out).unwrap();
	assert_eq!(out, data);
}

#[test]
fn invalid_slice_width() {
	let data = vec![0i8; 8];
	let err = encode(&data, 8, 1, 9, false, &mut [0u8; 64]).unwrap_err();
	assert!(matches!(err, CodecError::InvalidParameter(_)));
	let err = encode_to_vec(&data, 8, 1, &CodecConfig::default().with_slice_width(9)).unwrap_err();
	assert!(matches!(err, CodecError::InvalidParameter(_)));
}

#[test]
fn header_fields_are_self_describing() {
	let data: Vec<i16> = (0..30).collect();
	let stream = encode_to_vec(&data, 10, 3, &CodecConfig::default().with_slice_width(4)).unwrap();
	assert_eq!(&stream[0..4], &(stream.len() as u32).to_be_bytes());
	assert_eq!(&stream[4..8], &3u32.to_be_bytes());
	assert_eq!(&stream[8..12], &10u32.to_be_bytes());
	assert_eq!(stream[12], 4);
	assert_eq!(stream[13], 0x82);

	let header = Header::read(&stream).unwrap();
	assert_eq!(header.element_count(), 30);
	assert_eq!(decode_to_vec::<i16>(&stream).unwrap(), data);
}

#[test]
fn blocks_start_byte_aligned() {
	// every block is a constant row, so each is the raw element plus one constant-run body
	let data: Vec<i8> = (0..4).flat_map(|row| std::iter::repeat(row as i8 * 10).take(6)).collect();
	let stream = encode_to_vec(&data, 6, 4, &CodecConfig::default().with_slice_width(0)).unwrap();
	// raw (1) + marker (1) + constant literal (1) per block
	assert_eq!(stream.len(), HEADER_SIZE + 4 * 3);
	for row in 0..4 {
		assert_eq!(stream[HEADER_SIZE + row * 3] as i8, row as i8 * 10);
	}
}
