//! Element width variants.
//!
//! The codec is written once against the sealed [`Element`] trait and
//! instantiated for `i8`, `i16` and `i32`. All quotient, zig-zag and escape
//! arithmetic is carried out on `i64`, which is wide enough for the 33-bit
//! escape literal of the 32-bit variant.

use crate::error::CodecError;
use std::fmt::{self, Debug};
use std::str::FromStr;

mod private {
    pub trait Sealed {}

    impl Sealed for i8 {}
    impl Sealed for i16 {}
    impl Sealed for i32 {}
}

/// Element width tag carried in the stream header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Int8,
    Int16,
    Int32,
}

impl ElementKind {
    pub const fn bits(self) -> u32 {
        match self {
            ElementKind::Int8 => 8,
            ElementKind::Int16 => 16,
            ElementKind::Int32 => 32,
        }
    }

    pub const fn bytes(self) -> usize {
        (self.bits() / 8) as usize
    }

    /// Width of the escape literal: one bit more than the element so the
    /// sign is explicit.
    pub const fn escape_bits(self) -> u32 {
        self.bits() + 1
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Int8 => write!(f, "i8"),
            ElementKind::Int16 => write!(f, "i16"),
            ElementKind::Int32 => write!(f, "i32"),
        }
    }
}

impl FromStr for ElementKind {
    type Err = CodecError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "i8" | "int8" | "byte" => Ok(ElementKind::Int8),
            "i16" | "int16" | "short" => Ok(ElementKind::Int16),
            "i32" | "int32" | "long" => Ok(ElementKind::Int32),
            _ => Err(CodecError::invalid(format!("Invalid element type: {}", s))),
        }
    }
}

/// Fixed-width signed integer that can be packed by the codec.
///
/// Sealed: implemented for `i8`, `i16` and `i32` only.
pub trait Element: private::Sealed + Copy + Debug + PartialEq + Default + Send + Sync {
    const KIND: ElementKind;
    const BITS: u32;
    const MIN: i64;
    const MAX: i64;

    /// `self - prev` with the element type's wrapping arithmetic, widened.
    fn wrapping_diff(self, prev: Self) -> i64;

    /// `self + delta` with wrapping arithmetic; `delta` must already be in range.
    fn wrapping_offset(self, delta: i64) -> Self;

    /// Narrow `v`, rejecting values outside the element range.
    fn from_i64_checked(v: i64) -> Option<Self>;

    fn write_be(self, buf: &mut [u8]);

    fn read_be(buf: &[u8]) -> Self;
}

/// True when `v` is representable by `E`.
#[inline]
pub fn in_range<E: Element>(v: i64) -> bool {
    (E::MIN..=E::MAX).contains(&v)
}

macro_rules! impl_element {
    ($ty:ty, $kind:expr) => {
        impl Element for $ty {
            const KIND: ElementKind = $kind;
            const BITS: u32 = <$ty>::BITS;
            const MIN: i64 = <$ty>::MIN as i64;
            const MAX: i64 = <$ty>::MAX as i64;

            #[inline]
            fn wrapping_diff(self, prev: Self) -> i64 {
                i64::from(self.wrapping_sub(prev))
            }

            #[inline]
            fn wrapping_offset(self, delta: i64) -> Self {
                self.wrapping_add(delta as $ty)
            }

            #[inline]
            fn from_i64_checked(v: i64) -> Option<Self> {
                <$ty>::try_from(v).ok()
            }

            #[inline]
            fn write_be(self, buf: &mut [u8]) {
                buf[..<$ty>::BITS as usize / 8].copy_from_slice(&self.to_be_bytes());
            }

            #[inline]
            fn read_be(buf: &[u8]) -> Self {
                let mut raw = [0u8; <$ty>::BITS as usize / 8];
                raw.copy_from_slice(&buf[..<$ty>::BITS as usize / 8]);
                <$ty>::from_be_bytes(raw)
            }
        }
    };
}

impl_element!(i8, ElementKind::Int8);
impl_element!(i16, ElementKind::Int16);
impl_element!(i32, ElementKind::Int32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_widths() {
        assert_eq!(<i8 as Element>::KIND.bits(), 8);
        assert_eq!(<i16 as Element>::KIND.escape_bits(), 17);
        assert_eq!(<i32 as Element>::KIND.escape_bits(), 33);
        assert_eq!(ElementKind::Int32.bytes(), 4);
    }

    #[test]
    fn test_wrapping_diff_stays_in_range() {
        assert_eq!(i16::MAX.wrapping_diff(i16::MIN), -1);
        assert_eq!(i8::MIN.wrapping_diff(i8::MAX), 1);
        assert_eq!(i32::MIN.wrapping_diff(i32::MAX), 1);
        assert_eq!(103i16.wrapping_diff(104), -1);
    }

    #[test]
    fn test_wrapping_offset_inverts_diff() {
        let pairs: [(i32, i32); 4] = [(0, 0), (i32::MIN, i32::MAX), (-5, 7), (i32::MAX, -1)];
        for (prev, curr) in pairs {
            let d = curr.wrapping_diff(prev);
            assert_eq!(prev.wrapping_offset(d), curr);
        }
    }

    #[test]
    fn test_checked_narrowing() {
        assert_eq!(<i8 as Element>::from_i64_checked(127), Some(127i8));
        assert_eq!(<i8 as Element>::from_i64_checked(128), None);
        assert!(in_range::<i16>(-32768));
        assert!(!in_range::<i16>(32768));
    }

    #[test]
    fn test_big_endian_raw_io() {
        let mut buf = [0u8; 4];
        (-2i32).write_be(&mut buf);
        assert_eq!(buf, [0xFF, 0xFF, 0xFF, 0xFE]);
        assert_eq!(<i32 as Element>::read_be(&buf), -2);

        0x1234i16.write_be(&mut buf);
        assert_eq!(&buf[..2], &[0x12, 0x34]);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("INT16".parse::<ElementKind>().unwrap(), ElementKind::Int16);
        assert_eq!("i8".parse::<ElementKind>().unwrap(), ElementKind::Int8);
        assert!("float".parse::<ElementKind>().is_err());
    }
}
