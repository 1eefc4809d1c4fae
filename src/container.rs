use crate::element::ElementKind;
use crate::error::{CodecError, Result};
use byteorder::{BigEndian, ByteOrder, NativeEndian};

/// total_size(4) + block_count(4) + block_width(4) + slice_width(1) + type_tag(1)
pub const HEADER_SIZE: usize = 14;

/// Byte order of multi-byte header fields on the wire.
pub type WireOrder = BigEndian;

/// Offsets of the fields that need byte-order normalization.
const WIDE_FIELDS: [usize; 3] = [0, 4, 8];

bitflags::bitflags! {
	#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
	pub struct TypeTag: u8 {
		const INT8       = 0b0000_0001;
		const INT16      = 0b0000_0010;
		const INT32      = 0b0000_0100;
		const RUN_LENGTH = 0b1000_0000;
	}
}

impl TypeTag {
	pub fn new(kind: ElementKind, run_length: bool) -> Self {
		let mut tag = match kind {
			ElementKind::Int8 => TypeTag::INT8,
			ElementKind::Int16 => TypeTag::INT16,
			ElementKind::Int32 => TypeTag::INT32,
		};
		if run_length { tag |= TypeTag::RUN_LENGTH; }
		tag
	}

	/// Element kind, if exactly one width bit is set.
	pub fn kind(self) -> Option<ElementKind> {
		let width = self & (TypeTag::INT8 | TypeTag::INT16 | TypeTag::INT32);
		if width == TypeTag::INT8 { Some(ElementKind::Int8) }
		else if width == TypeTag::INT16 { Some(ElementKind::Int16) }
		else if width == TypeTag::INT32 { Some(ElementKind::Int32) }
		else { None }
	}

	pub fn run_length(self) -> bool {
		self.contains(TypeTag::RUN_LENGTH)
	}
}

/// True when host order `H` lays out multi-byte integers differently from the wire.
fn host_differs<H: ByteOrder>() -> bool {
	H::read_u16(&[0x01, 0x02]) != WireOrder::read_u16(&[0x01, 0x02])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
	pub total_size: u32,
	pub block_count: u32,
	pub block_width: u32,
	pub slice_width: u8,
	pub kind: ElementKind,
	pub run_length: bool,
}

impl Header {
	pub fn tag(&self) -> TypeTag {
		TypeTag::new(self.kind, self.run_length)
	}

	pub fn element_count(&self) -> u64 {
		u64::from(self.block_count) * u64::from(self.block_width)
	}

	/// Memory image of the header as a host with byte order `H` would lay it out.
	pub fn write_host<H: ByteOrder>(&self, buf: &mut [u8]) {
		H::write_u32(&mut buf[0..4], self.total_size);
		H::write_u32(&mut buf[4..8], self.block_count);
		H::write_u32(&mut buf[8..12], self.block_width);
		buf[12] = self.slice_width;
		buf[13] = self.tag().bits();
	}

	/// Parse a host-order memory image.
	pub fn read_host<H: ByteOrder>(buf: &[u8]) -> Result<Self> {
		let tag = TypeTag::from_bits(buf[13])
			.ok_or_else(|| CodecError::corrupt(13 * 8, "unknown type tag bits"))?;
		let kind = tag.kind().ok_or_else(|| CodecError::corrupt(13 * 8, "type tag has no single element width"))?;
		let slice_width = buf[12];
		if u32::from(slice_width) > kind.bits() {
			return Err(CodecError::corrupt(12 * 8, "slice width exceeds element width"));
		}

		Ok(Self {
			total_size: H::read_u32(&buf[0..4]),
			block_count: H::read_u32(&buf[4..8]),
			block_width: H::read_u32(&buf[8..12]),
			slice_width,
			kind,
			run_length: tag.run_length(),
		})
	}

	/// Convert a header image between host order `H` and wire order in place.
	/// The swap is its own inverse, so the same call serves both directions.
	pub fn normalize<H: ByteOrder>(buf: &mut [u8]) {
		if !host_differs::<H>() { return; }
		for offset in WIDE_FIELDS {
			buf[offset..offset + 4].reverse();
		}
	}

	pub fn write(&self, buf: &mut [u8]) -> Result<()> {
		if buf.len() < HEADER_SIZE {
			return Err(CodecError::OutOfSpace { needed: HEADER_SIZE, capacity: buf.len() });
		}
		let image = &mut buf[..HEADER_SIZE];
		self.write_host::<NativeEndian>(image);
		Self::normalize::<NativeEndian>(image);
		Ok(())
	}

	pub fn read(buf: &[u8]) -> Result<Self> {
		if buf.len() < HEADER_SIZE {
			return Err(CodecError::corrupt(buf.len() * 8, "stream shorter than header"));
		}
		let mut image = [0u8; HEADER_SIZE];
		image.copy_from_slice(&buf[..HEADER_SIZE]);
		Self::normalize::<NativeEndian>(&mut image);
		Self::read_host::<NativeEndian>(&image)
	}

	pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
		let mut image = [0u8; HEADER_SIZE];
		self.write_host::<NativeEndian>(&mut image);
		Self::normalize::<NativeEndian>(&mut image);
		image
	}

	/// Fill in `total_size` once the stream length is known.
	pub fn patch_total_size(buf: &mut [u8], total_size: u32) {
		let field = &mut buf[0..4];
		NativeEndian::write_u32(field, total_size);
		if host_differs::<NativeEndian>() { field.reverse(); }
	}
}
