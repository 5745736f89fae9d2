//! Chunk assembly.
//!
//! Encoders emit compressed output as a sequence of [`EncodedChunk`]s that
//! are meaningless on their own. [`ChunkAssembler`] collects them in arrival
//! order and concatenates them into one artifact. Arrival order must equal
//! emission order; a chunk that arrives out of sequence is rejected rather
//! than reordered.

use bytes::{Bytes, BytesMut};
use frameforge_common::{Error, Result};

/// Whether an encoded chunk can be decoded on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkType {
    Key,
    Delta,
}

/// One encoder-emitted fragment of a compressed bitstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedChunk {
    /// Emission order, starting at 0.
    pub sequence: u64,
    /// Presentation timestamp in microseconds.
    pub timestamp_us: i64,
    pub chunk_type: ChunkType,
    pub data: Bytes,
}

impl EncodedChunk {
    /// Size of the payload in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Ordered accumulator of encoded chunks for one session.
#[derive(Debug, Default)]
pub struct ChunkAssembler {
    chunks: Vec<EncodedChunk>,
    byte_len: usize,
}

impl ChunkAssembler {
    /// Create an empty assembler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the next chunk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AssemblyFailure`] if the chunk's sequence number is
    /// not the next one expected.
    pub fn push(&mut self, chunk: EncodedChunk) -> Result<()> {
        let expected = self.chunks.len() as u64;
        if chunk.sequence != expected {
            return Err(Error::assembly(format!(
                "chunk {} arrived out of order (expected {})",
                chunk.sequence, expected
            )));
        }
        self.byte_len += chunk.len();
        self.chunks.push(chunk);
        Ok(())
    }

    /// Number of chunks collected.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Total payload bytes collected.
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// Whether no chunk has been collected.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Byte offsets at which each chunk ends in the assembled artifact.
    pub fn boundaries(&self) -> Vec<usize> {
        self.chunks
            .iter()
            .scan(0usize, |offset, chunk| {
                *offset += chunk.len();
                Some(*offset)
            })
            .collect()
    }

    /// Drop every collected chunk.
    pub fn discard(&mut self) {
        self.chunks.clear();
        self.byte_len = 0;
    }

    /// Concatenate all chunks in arrival order.
    pub fn assemble(self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.byte_len);
        for chunk in &self.chunks {
            buf.extend_from_slice(&chunk.data);
        }
        buf.freeze()
    }
}
