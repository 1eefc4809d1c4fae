use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
	#[error("Destination buffer too small: need at least {needed} bytes, capacity is {capacity}")]
	OutOfSpace { needed: usize, capacity: usize },

	#[error("Corrupt stream at bit {bit_offset}: {reason}")]
	CorruptStream { bit_offset: usize, reason: &'static str },

	#[error("Invalid parameter: {0}")]
	InvalidParameter(String),

	#[error("Thread pool error: {0}")]
	ThreadPool(String),
}

impl CodecError {
	pub(crate) fn corrupt(bit_offset: usize, reason: &'static str) -> Self {
		CodecError::CorruptStream { bit_offset, reason }
	}

	pub(crate) fn invalid(message: impl Into<String>) -> Self {
		CodecError::InvalidParameter(message.into())
	}

	pub fn is_out_of_space(&self) -> bool {
		matches!(self, CodecError::OutOfSpace { .. })
	}

	pub fn is_corrupt(&self) -> bool {
		matches!(self, CodecError::CorruptStream { .. })
	}
}

pub type Result<T> = std::result::Result<T, CodecError>;
