use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::ArchiveError;

use super::{ArchiveRead, ArchiveWrite, ChunkHeader};

/// Size of a chunk header: major, minor, and a `u64` payload length.
const CHUNK_HEADER_LEN: usize = 10;

/// An in-memory little-endian archive.
///
/// A new archive writes into a growable buffer; [`MemoryArchive::into_reader`]
/// or [`MemoryArchive::from_bytes`] gives an archive that reads from the
/// start of the data.
#[derive(Debug, Default)]
pub struct MemoryArchive {
    writer: BytesMut,
    /// Offsets of the length fields of open chunks.
    open_chunks: Vec<usize>,
    reader: Bytes,
    /// Reader `remaining()` values at which open chunks end.
    chunk_ends: Vec<usize>,
}

impl MemoryArchive {
    /// Creates an empty archive for writing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an archive reading `data`.
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self {
            reader: data.into(),
            ..Self::default()
        }
    }

    /// Number of bytes written so far.
    #[must_use]
    pub fn written_len(&self) -> usize {
        self.writer.len()
    }

    /// The written bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Chunk`] if a chunk is still open.
    pub fn into_bytes(self) -> Result<Bytes, ArchiveError> {
        if !self.open_chunks.is_empty() {
            return Err(ArchiveError::Chunk(format!("{} chunks left open", self.open_chunks.len())));
        }
        Ok(self.writer.freeze())
    }

    /// An archive reading back what was written.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Chunk`] if a chunk is still open.
    pub fn into_reader(self) -> Result<Self, ArchiveError> {
        self.into_bytes().map(Self::from_bytes)
    }

    /// Bytes the reader may consume before the innermost chunk ends.
    fn available(&self) -> usize {
        let end = self.chunk_ends.last().copied().unwrap_or(0);
        self.reader.remaining().saturating_sub(end)
    }

    fn take(&mut self, needed: usize) -> Result<(), ArchiveError> {
        let available = self.available();
        if needed > available {
            return Err(ArchiveError::UnexpectedEnd { needed, available });
        }
        Ok(())
    }
}

impl ArchiveWrite for MemoryArchive {
    fn write_u8(&mut self, value: u8) -> Result<(), ArchiveError> {
        self.writer.put_u8(value);
        Ok(())
    }

    fn write_u16(&mut self, value: u16) -> Result<(), ArchiveError> {
        self.writer.put_u16_le(value);
        Ok(())
    }

    fn write_u32(&mut self, value: u32) -> Result<(), ArchiveError> {
        self.writer.put_u32_le(value);
        Ok(())
    }

    fn write_u64(&mut self, value: u64) -> Result<(), ArchiveError> {
        self.writer.put_u64_le(value);
        Ok(())
    }

    fn begin_chunk(&mut self, major: u8, minor: u8) -> Result<(), ArchiveError> {
        self.writer.put_u8(major);
        self.writer.put_u8(minor);
        self.open_chunks.push(self.writer.len());
        self.writer.put_u64_le(0);
        Ok(())
    }

    fn end_chunk(&mut self) -> Result<(), ArchiveError> {
        let at = self
            .open_chunks
            .pop()
            .ok_or_else(|| ArchiveError::Chunk("end_chunk without an open chunk".into()))?;
        let length = (self.writer.len() - at - 8) as u64;
        self.writer[at..at + 8].copy_from_slice(&length.to_le_bytes());
        Ok(())
    }
}

impl ArchiveRead for MemoryArchive {
    fn read_u8(&mut self) -> Result<u8, ArchiveError> {
        self.take(1)?;
        Ok(self.reader.get_u8())
    }

    fn read_u16(&mut self) -> Result<u16, ArchiveError> {
        self.take(2)?;
        Ok(self.reader.get_u16_le())
    }

    fn read_u32(&mut self) -> Result<u32, ArchiveError> {
        self.take(4)?;
        Ok(self.reader.get_u32_le())
    }

    fn read_u64(&mut self) -> Result<u64, ArchiveError> {
        self.take(8)?;
        Ok(self.reader.get_u64_le())
    }

    fn remaining(&self) -> usize {
        self.available()
    }

    fn read_chunk_header(&mut self) -> Result<ChunkHeader, ArchiveError> {
        self.take(CHUNK_HEADER_LEN)?;
        let major = self.reader.get_u8();
        let minor = self.reader.get_u8();
        let length = self.reader.get_u64_le();
        let available = self.available();
        let payload = usize::try_from(length)
            .ok()
            .filter(|&l| l <= available)
            .ok_or_else(|| ArchiveError::Chunk(format!("chunk of {length} bytes exceeds {available} available")))?;
        self.chunk_ends.push(self.reader.remaining() - payload);
        Ok(ChunkHeader { major, minor, length })
    }

    fn end_read_chunk(&mut self) -> Result<(), ArchiveError> {
        let end = self
            .chunk_ends
            .pop()
            .ok_or_else(|| ArchiveError::Chunk("end_chunk without an open chunk".into()))?;
        let skip = self.reader.remaining() - end;
        if skip > 0 {
            tracing::trace!(skip, "skipping unread chunk bytes");
            self.reader.advance(skip);
        }
        Ok(())
    }
}
