//! Versioned archive I/O.
//!
//! [`ArchiveWrite`] and [`ArchiveRead`] move fixed-size numeric fields in and
//! out of a byte stream. Fields are grouped into chunks that carry a major
//! and minor version and a length, so a reader can skip data appended by a
//! newer minor version. [`MemoryArchive`] keeps the stream in memory.
//!
//! [`Subd::write_to`](crate::Subd::write_to) and
//! [`Subd::read_from`](crate::Subd::read_from) persist a whole surface.

mod memory;
mod subd_io;

pub use memory::MemoryArchive;
pub use subd_io::{SUBD_ARCHIVE_MAJOR, SUBD_ARCHIVE_MINOR};

use crate::error::ArchiveError;
use crate::math::Point3;

/// Version and payload length of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub major: u8,
    pub minor: u8,
    /// Payload bytes following the header.
    pub length: u64,
}

/// Writing side of an archive.
pub trait ArchiveWrite {
    /// Writes one byte.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot accept more data.
    fn write_u8(&mut self, value: u8) -> Result<(), ArchiveError>;

    /// # Errors
    ///
    /// Returns an error if the archive cannot accept more data.
    fn write_u16(&mut self, value: u16) -> Result<(), ArchiveError>;

    /// # Errors
    ///
    /// Returns an error if the archive cannot accept more data.
    fn write_u32(&mut self, value: u32) -> Result<(), ArchiveError>;

    /// # Errors
    ///
    /// Returns an error if the archive cannot accept more data.
    fn write_u64(&mut self, value: u64) -> Result<(), ArchiveError>;

    /// Writes the IEEE bit pattern of `value`, so NaN payloads survive.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot accept more data.
    fn write_f64(&mut self, value: f64) -> Result<(), ArchiveError> {
        self.write_u64(value.to_bits())
    }

    /// # Errors
    ///
    /// Returns an error if the archive cannot accept more data.
    fn write_bool(&mut self, value: bool) -> Result<(), ArchiveError> {
        self.write_u8(u8::from(value))
    }

    /// Writes a count followed by every value.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be written.
    fn write_values<T: ArchiveValue>(&mut self, values: &[T]) -> Result<(), ArchiveError> {
        self.write_u64(values.len() as u64)?;
        for value in values {
            value.write(self)?;
        }
        Ok(())
    }

    /// Opens a nested chunk.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot accept more data.
    fn begin_chunk(&mut self, major: u8, minor: u8) -> Result<(), ArchiveError>;

    /// Closes the innermost open chunk and records its length.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Chunk`] if no chunk is open.
    fn end_chunk(&mut self) -> Result<(), ArchiveError>;
}

/// Reading side of an archive.
pub trait ArchiveRead {
    /// Reads one byte.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::UnexpectedEnd`] past the end of the data or
    /// of the current chunk.
    fn read_u8(&mut self) -> Result<u8, ArchiveError>;

    /// # Errors
    ///
    /// Returns [`ArchiveError::UnexpectedEnd`] past the end of the data.
    fn read_u16(&mut self) -> Result<u16, ArchiveError>;

    /// # Errors
    ///
    /// Returns [`ArchiveError::UnexpectedEnd`] past the end of the data.
    fn read_u32(&mut self) -> Result<u32, ArchiveError>;

    /// # Errors
    ///
    /// Returns [`ArchiveError::UnexpectedEnd`] past the end of the data.
    fn read_u64(&mut self) -> Result<u64, ArchiveError>;

    /// # Errors
    ///
    /// Returns [`ArchiveError::UnexpectedEnd`] past the end of the data.
    fn read_f64(&mut self) -> Result<f64, ArchiveError> {
        self.read_u64().map(f64::from_bits)
    }

    /// # Errors
    ///
    /// Returns [`ArchiveError::Corrupt`] for bytes other than 0 and 1.
    fn read_bool(&mut self) -> Result<bool, ArchiveError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(ArchiveError::Corrupt(format!("invalid bool byte {other}"))),
        }
    }

    /// Reads a count followed by that many values.
    ///
    /// # Errors
    ///
    /// Returns an error if the count exceeds the remaining data or a value
    /// cannot be read.
    fn read_values<T: ArchiveValue>(&mut self) -> Result<Vec<T>, ArchiveError> {
        let count = self.read_count()?;
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(T::read(self)?);
        }
        Ok(values)
    }

    /// Reads an element count, rejecting counts the remaining data could not
    /// hold.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Corrupt`] for impossible counts.
    fn read_count(&mut self) -> Result<usize, ArchiveError> {
        let count = self.read_u64()?;
        let remaining = self.remaining();
        usize::try_from(count)
            .ok()
            .filter(|&c| c <= remaining)
            .ok_or_else(|| ArchiveError::Corrupt(format!("count {count} exceeds {remaining} remaining bytes")))
    }

    /// Bytes left in the current chunk, or in the archive outside chunks.
    fn remaining(&self) -> usize;

    /// Enters the next chunk and returns its header.
    ///
    /// # Errors
    ///
    /// Returns an error if the header is truncated or the chunk extends past
    /// its parent.
    fn read_chunk_header(&mut self) -> Result<ChunkHeader, ArchiveError>;

    /// Leaves the innermost chunk, skipping whatever was not read.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Chunk`] if no chunk is open.
    fn end_read_chunk(&mut self) -> Result<(), ArchiveError>;
}

/// A value with a fixed archive encoding.
pub trait ArchiveValue: Sized {
    /// # Errors
    ///
    /// Returns an error if the archive rejects the data.
    fn write<W: ArchiveWrite + ?Sized>(&self, archive: &mut W) -> Result<(), ArchiveError>;

    /// # Errors
    ///
    /// Returns an error if the data is truncated or malformed.
    fn read<R: ArchiveRead + ?Sized>(archive: &mut R) -> Result<Self, ArchiveError>;
}

macro_rules! archive_value {
    ($ty:ty, $write:ident, $read:ident) => {
        impl ArchiveValue for $ty {
            fn write<W: ArchiveWrite + ?Sized>(&self, archive: &mut W) -> Result<(), ArchiveError> {
                archive.$write(*self)
            }

            fn read<R: ArchiveRead + ?Sized>(archive: &mut R) -> Result<Self, ArchiveError> {
                archive.$read()
            }
        }
    };
}

archive_value!(u8, write_u8, read_u8);
archive_value!(u16, write_u16, read_u16);
archive_value!(u32, write_u32, read_u32);
archive_value!(u64, write_u64, read_u64);
archive_value!(f64, write_f64, read_f64);
archive_value!(bool, write_bool, read_bool);

impl ArchiveValue for Point3 {
    fn write<W: ArchiveWrite + ?Sized>(&self, archive: &mut W) -> Result<(), ArchiveError> {
        archive.write_f64(self.x)?;
        archive.write_f64(self.y)?;
        archive.write_f64(self.z)
    }

    fn read<R: ArchiveRead + ?Sized>(archive: &mut R) -> Result<Self, ArchiveError> {
        Ok(Point3::new(archive.read_f64()?, archive.read_f64()?, archive.read_f64()?))
    }
}
