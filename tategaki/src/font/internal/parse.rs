//! Parsing primitives.
//!
//! Every read is bounds checked and reports the failing offset, so a
//! truncated or malformed table surfaces as [`FontError::OutOfBounds`]
//! instead of a panic.

use super::{RawTag, Tag};
use crate::error::FontError;

pub type ReadResult<T> = Result<T, FontError>;

/// Big-endian scalar decodable from a byte slice.
pub trait FromBeData: Sized + Copy {
    const SIZE: usize;

    fn from_be_slice(bytes: &[u8]) -> Self;
}

macro_rules! be_scalar {
    ($($ty:ty),*) => {
        $(
            impl FromBeData for $ty {
                const SIZE: usize = core::mem::size_of::<$ty>();

                #[inline(always)]
                fn from_be_slice(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; core::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_be_bytes(raw)
                }
            }
        )*
    };
}

be_scalar!(u8, i8, u16, i16, u32, i32);

/// Buffer wrapping a byte slice for reading big endian data at absolute
/// offsets.
#[derive(Copy, Clone, Debug)]
pub struct Bytes<'a>(pub &'a [u8]);

impl<'a> Bytes<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self(data)
    }

    /// Returns the underlying data.
    pub fn data(&self) -> &'a [u8] {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if `len` bytes starting at `offset` are in bounds.
    pub fn check_range(&self, offset: usize, len: usize) -> bool {
        offset
            .checked_add(len)
            .is_some_and(|end| end <= self.0.len())
    }

    pub fn ensure_range(&self, offset: usize, len: usize) -> ReadResult<()> {
        if self.check_range(offset, len) {
            Ok(())
        } else {
            Err(FontError::OutOfBounds { offset, len })
        }
    }

    /// Reads a value of the specified type at some offset.
    #[inline(always)]
    pub fn read<T: FromBeData>(&self, offset: usize) -> ReadResult<T> {
        self.ensure_range(offset, T::SIZE)?;
        Ok(T::from_be_slice(&self.0[offset..offset + T::SIZE]))
    }

    #[inline(always)]
    pub fn read_u8(&self, offset: usize) -> ReadResult<u8> {
        self.read(offset)
    }

    #[inline(always)]
    pub fn read_u16(&self, offset: usize) -> ReadResult<u16> {
        self.read(offset)
    }

    #[inline(always)]
    pub fn read_i16(&self, offset: usize) -> ReadResult<i16> {
        self.read(offset)
    }

    #[inline(always)]
    pub fn read_u32(&self, offset: usize) -> ReadResult<u32> {
        self.read(offset)
    }

    /// Reads a 32-bit field that must fit in a signed 32-bit integer.
    ///
    /// Counts and lengths are stored unsigned but are only meaningful up
    /// to `i32::MAX`; anything larger is a malformed font.
    pub fn read_u31(&self, offset: usize) -> ReadResult<u32> {
        let raw: u32 = self.read(offset)?;
        if raw > i32::MAX as u32 {
            return Err(FontError::NegativeInt32(raw));
        }
        Ok(raw)
    }

    /// Reads a 4-byte tag.
    pub fn read_tag(&self, offset: usize) -> ReadResult<Tag> {
        self.read::<RawTag>(offset).map(Tag)
    }

    /// Reads a 16-bit offset relative to `base` and returns the absolute
    /// position.
    pub fn read_offset16(&self, offset: usize, base: usize) -> ReadResult<usize> {
        Ok(base + self.read_u16(offset)? as usize)
    }

    /// Reads a sequence of bytes at the specified offset and length.
    pub fn read_bytes(&self, offset: usize, len: usize) -> ReadResult<&'a [u8]> {
        self.ensure_range(offset, len)?;
        Ok(&self.0[offset..offset + len])
    }

    /// Creates a new stream at the specified offset.
    pub fn stream_at(&self, offset: usize) -> ReadResult<Stream<'a>> {
        if offset > self.0.len() {
            return Err(FontError::OutOfBounds { offset, len: 0 });
        }
        Ok(Stream {
            data: self.0,
            offset,
        })
    }
}

/// Cursor over a byte slice for reading sequential big endian data.
#[derive(Copy, Clone, Debug)]
pub struct Stream<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Stream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Returns the current offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the number of bytes available for reading.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    /// Skips the specified number of bytes.
    pub fn skip(&mut self, bytes: usize) -> ReadResult<()> {
        Bytes(self.data).ensure_range(self.offset, bytes)?;
        self.offset += bytes;
        Ok(())
    }

    /// Reads a value of the specified type and advances the offset.
    #[inline(always)]
    pub fn read<T: FromBeData>(&mut self) -> ReadResult<T> {
        let value = Bytes(self.data).read::<T>(self.offset)?;
        self.offset += T::SIZE;
        Ok(value)
    }

    #[inline(always)]
    pub fn read_u16(&mut self) -> ReadResult<u16> {
        self.read()
    }

    #[inline(always)]
    pub fn read_i16(&mut self) -> ReadResult<i16> {
        self.read()
    }

    #[inline(always)]
    pub fn read_u32(&mut self) -> ReadResult<u32> {
        self.read()
    }

    /// Reads a 32-bit offset or count with the sign bit clear.
    pub fn read_u31(&mut self) -> ReadResult<u32> {
        let raw = self.read_u32()?;
        if raw > i32::MAX as u32 {
            return Err(FontError::NegativeInt32(raw));
        }
        Ok(raw)
    }

    pub fn read_tag(&mut self) -> ReadResult<Tag> {
        self.read::<RawTag>().map(Tag)
    }
}
