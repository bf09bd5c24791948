//! BZip2 decoder.

use crate::block::{self, DecodedBlock};
use crate::stream::{self, Marker};
use crate::{BlockSize, STREAM_MAGIC};
use bzcodec_core::{BitReader, BzError, ChecksumScope, Result, combine_stream_crc};
use log::{debug, warn};

/// BZip2 decoder over one stream held in memory.
#[derive(Debug)]
pub struct BzDecoder<'a> {
    reader: BitReader<'a>,
    block_size: BlockSize,
    combined_crc: u32,
    blocks: usize,
    finished: bool,
}

impl<'a> BzDecoder<'a> {
    /// Create a new decoder, reading the stream header.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let mut reader = BitReader::new(data);
        let block_size = stream::read_header(&mut reader)?;

        Ok(Self {
            reader,
            block_size,
            combined_crc: 0,
            blocks: 0,
            finished: false,
        })
    }

    /// Read and decode the next block, producing at most `limit` bytes.
    ///
    /// Returns `None` once the footer has been read and its combined CRC
    /// verified.
    pub fn read_block(&mut self, limit: usize) -> Result<Option<DecodedBlock>> {
        if self.finished {
            return Ok(None);
        }

        match stream::read_marker(&mut self.reader)? {
            Marker::EndOfStream => {
                let stored_crc = self.reader.read_u32()?;
                if stored_crc != self.combined_crc {
                    return Err(BzError::crc_mismatch(
                        ChecksumScope::Stream,
                        stored_crc,
                        self.combined_crc,
                    ));
                }
                self.reader.align_to_byte();
                self.finished = true;
                Ok(None)
            }
            Marker::Block => {
                let block = block::decode_block(
                    &mut self.reader,
                    self.blocks,
                    self.block_size.max_block_len(),
                    limit,
                )?;
                self.combined_crc = combine_stream_crc(self.combined_crc, block.crc);
                self.blocks += 1;
                Ok(Some(block))
            }
        }
    }

    /// Get the block size.
    pub fn block_size(&self) -> BlockSize {
        self.block_size
    }

    /// Number of blocks decoded so far.
    pub fn blocks_read(&self) -> usize {
        self.blocks
    }

    /// Whether the footer has been reached.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Bytes after the footer; empty until the stream is finished.
    pub fn trailing(&self) -> &'a [u8] {
        if self.finished {
            self.reader.remaining_bytes()
        } else {
            &[]
        }
    }
}

/// Reusable decompression settings.
///
/// # Example
///
/// ```
/// use bzcodec::{BlockSize, Decompressor, compress};
///
/// let mut joined = compress(b"first ", BlockSize::default()).unwrap();
/// joined.extend(compress(b"second", BlockSize::new(1).unwrap()).unwrap());
///
/// let decompressor = Decompressor::new(64).concatenated(true);
/// assert_eq!(decompressor.decompress(&joined).unwrap(), b"first second");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decompressor {
    capacity: usize,
    concatenated: bool,
}

impl Decompressor {
    /// Decompressor producing at most `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            concatenated: false,
        }
    }

    /// Decompressor with no output bound.
    pub fn unbounded() -> Self {
        Self::new(usize::MAX)
    }

    /// Accept several streams written back to back.
    pub fn concatenated(mut self, enabled: bool) -> Self {
        self.concatenated = enabled;
        self
    }

    /// Configured output bound.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Decompress `data` into a new buffer.
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let mut rest = data;
        let mut streams = 0usize;

        loop {
            let mut decoder = BzDecoder::new(rest)?;
            while let Some(block) = self.next_block(&mut decoder, output.len())? {
                output.extend_from_slice(&block.data);
            }
            streams += 1;
            rest = decoder.trailing();

            debug!(
                "stream {} done: {} blocks, {} bytes so far",
                streams,
                decoder.blocks_read(),
                output.len()
            );

            if !self.concatenated || rest.is_empty() {
                break;
            }
            if rest.iter().all(|&b| b == 0) {
                warn!("ignoring {} bytes of zero padding after stream", rest.len());
                break;
            }
            if !rest.starts_with(&STREAM_MAGIC) {
                return Err(BzError::format(format!(
                    "{} bytes of trailing garbage after stream {}",
                    rest.len(),
                    streams
                )));
            }
        }

        Ok(output)
    }

    /// Read the next block into the room left after `produced` bytes.
    ///
    /// Overflow is reported against the whole capacity, not the remainder.
    fn next_block(
        &self,
        decoder: &mut BzDecoder<'_>,
        produced: usize,
    ) -> Result<Option<DecodedBlock>> {
        decoder
            .read_block(self.capacity - produced)
            .map_err(|err| match err {
                BzError::OutputBufferTooSmall { needed, .. } => {
                    BzError::output_too_small(needed.saturating_add(produced), self.capacity)
                }
                other => other,
            })
    }

    /// Decompress `data` into `out`, returning the bytes written.
    pub fn decompress_into(&self, data: &[u8], out: &mut [u8]) -> Result<usize> {
        let bounded = Self {
            capacity: self.capacity.min(out.len()),
            ..*self
        };
        let decompressed = bounded.decompress(data)?;
        out[..decompressed.len()].copy_from_slice(&decompressed);
        Ok(decompressed.len())
    }
}

impl Default for Decompressor {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Decompress BZip2 data, failing if the output would exceed `capacity`.
///
/// Only the first stream is decoded; bytes after its footer are ignored.
pub fn decompress(data: &[u8], capacity: usize) -> Result<Vec<u8>> {
    Decompressor::new(capacity).decompress(data)
}

/// Decompress into a caller-supplied buffer, returning the bytes written.
pub fn decompress_into(data: &[u8], out: &mut [u8]) -> Result<usize> {
    Decompressor::unbounded().decompress_into(data, out)
}

/// Decompress a sequence of back-to-back streams.
pub fn decompress_concatenated(data: &[u8], capacity: usize) -> Result<Vec<u8>> {
    Decompressor::new(capacity).concatenated(true).decompress(data)
}
