pub mod delta;
pub mod rle;

pub use delta::{Codeword, DeltaCoder};
pub use rle::{Marker, Segment};
