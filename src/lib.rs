//! # rowpack
//!
//! A lossless codec for rasters of slowly varying 8, 16 and 32-bit signed
//! integers, such as rows of a detector image.
//!
//! Each row (a *block*) is stored as its first element followed by the
//! first differences, coded with a Rice-style scheme: the low
//! `slice_width` bits of each difference go out verbatim and the rest is a
//! zig-zag unary code, with an escape for large jumps. An optional
//! run-length layer collapses stretches of equal differences.
//!
//! ## Features
//!
//! - **Three element widths**: one generic implementation for `i8`, `i16` and `i32`
//! - **Bounded output**: [`max_encoded_len`] gives a size that never fails with `OutOfSpace`
//! - **Corruption detection**: malformed streams are rejected, never read past their end
//! - **Portable header**: multi-byte header fields are always big-endian on the wire
//! - **Parallel batches**: independent rasters can be encoded on a rayon pool
//!
//! ## Quick Start
//!
//! ### Caller-owned buffers
//!
//! ```rust
//! use rowpack::{decode, encode, max_encoded_len};
//!
//! let row: Vec<i16> = vec![100, 102, 104, 103, 103, 103, 103, 103, 200];
//! let mut stream = vec![0u8; max_encoded_len::<i16>(9, 1, 2, true).unwrap()];
//! let len = encode(&row, 9, 1, 2, true, &mut stream).unwrap();
//!
//! let mut decoded = vec![0i16; 9];
//! decode(&stream[..len], 9, 1, &mut decoded).unwrap();
//! assert_eq!(row, decoded);
//! ```
//!
//! ### Allocating helpers
//!
//! ```rust
//! use rowpack::{decode_to_vec, encode_to_vec, CodecConfig};
//!
//! let raster: Vec<i32> = (0..64 * 8).map(|i| 1000 + i / 3).collect();
//! let config = CodecConfig::default().with_slice_width(1);
//! let stream = encode_to_vec(&raster, 64, 8, &config).unwrap();
//! assert_eq!(decode_to_vec::<i32>(&stream).unwrap(), raster);
//! ```

pub mod bits;
pub mod block;
pub mod config;
pub mod container;
pub mod element;
pub mod error;
pub mod pipeline;
pub mod transforms;

// Re-export commonly used types for convenience
pub use config::{CodecConfig, DEFAULT_SLICE_WIDTH};
pub use container::{Header, TypeTag, HEADER_SIZE};
pub use element::{Element, ElementKind};
pub use error::{CodecError, Result};
pub use pipeline::{
    decode, decode_batch, decode_to_vec, encode, encode_batch, encode_to_vec, encode_with, max_encoded_len,
    stream_info, validate_stream, CompressionStats, Raster, StreamInfo,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
