use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rowpack::{decode, encode, max_encoded_len};

const WIDTH: usize = 1024;
const HEIGHT: usize = 256;

fn detector_frame() -> Vec<i16> {
	let mut rng = StdRng::seed_from_u64(42);
	let mut frame = Vec::with_capacity(WIDTH * HEIGHT);
	for _ in 0..HEIGHT {
		let mut value: i16 = 1200;
		for x in 0..WIDTH {
			// flat sky with occasional hot pixels
			if x % 97 == 0 {
				value = value.wrapping_add(rng.gen_range(-2000..2000));
			} else {
				value = value.wrapping_add(rng.gen_range(-3..=3));
			}
			frame.push(value);
		}
	}
	frame
}

fn bench_encode(c: &mut Criterion) {
	let data = detector_frame();
	let mut group = c.benchmark_group("encode");
	group.throughput(Throughput::Bytes((data.len() * 2) as u64));
	for (slice_width, run_length) in [(0, false), (2, false), (2, true), (4, true)] {
		let mut dest = vec![0u8; max_encoded_len::<i16>(WIDTH, HEIGHT, slice_width, run_length).unwrap()];
		let id = BenchmarkId::new(if run_length { "rle" } else { "plain" }, slice_width);
		group.bench_with_input(id, &slice_width, |b, &s| {
			b.iter(|| encode(black_box(&data), WIDTH, HEIGHT, s, run_length, &mut dest).unwrap());
		});
	}
	group.finish();
}

fn bench_decode(c: &mut Criterion) {
	let data = detector_frame();
	let mut group = c.benchmark_group("decode");
	group.throughput(Throughput::Bytes((data.len() * 2) as u64));
	for run_length in [false, true] {
		let mut stream = vec![0u8; max_encoded_len::<i16>(WIDTH, HEIGHT, 2, run_length).unwrap()];
		let len = encode(&data, WIDTH, HEIGHT, 2, run_length, &mut stream).unwrap();
		stream.truncate(len);
		let mut out = vec![0i16; data.len()];
		group.bench_function(if run_length { "rle" } else { "plain" }, |b| {
			b.iter(|| decode(black_box(&stream), WIDTH, HEIGHT, &mut out).unwrap());
		});
	}
	group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
