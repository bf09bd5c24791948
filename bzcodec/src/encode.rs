//! BZip2 encoder.

use crate::block::{self, EncodedBlock};
use crate::{BlockSize, stream};
use bzcodec_core::{BitWriter, BzError, Result, combine_stream_crc};
use log::debug;

/// BZip2 encoder.
///
/// Writes the stream header on creation, one block per
/// [`write_block`](Self::write_block) call and the footer on
/// [`finish`](Self::finish).
#[derive(Debug)]
pub struct BzEncoder {
    writer: BitWriter,
    block_size: BlockSize,
    combined_crc: u32,
    blocks: usize,
    limit: Option<usize>,
}

impl BzEncoder {
    /// Create a new encoder.
    pub fn new(block_size: BlockSize) -> Self {
        let mut writer = BitWriter::new();
        stream::write_header(&mut writer, block_size);

        Self {
            writer,
            block_size,
            combined_crc: 0,
            blocks: 0,
            limit: None,
        }
    }

    /// Fail with [`BzError::OutputBufferTooSmall`] once the stream would
    /// exceed `limit` bytes.
    pub fn with_limit(mut self, limit: usize) -> Result<Self> {
        self.limit = Some(limit);
        self.check_limit(self.writer.byte_len())?;
        Ok(self)
    }

    /// Block size written in the header.
    pub fn block_size(&self) -> BlockSize {
        self.block_size
    }

    /// Number of blocks written so far.
    pub fn blocks_written(&self) -> usize {
        self.blocks
    }

    /// Compress one block from the front of `data`.
    ///
    /// Returns how many bytes of `data` the block covers; call again with
    /// the rest until it is used up.
    pub fn write_block(&mut self, data: &[u8]) -> Result<usize> {
        if data.is_empty() {
            return Ok(0);
        }

        let block = block::encode_block(data, self.block_size.block_capacity())?;
        self.append(&block)?;
        Ok(block.consumed)
    }

    /// Place an already encoded block in the stream.
    pub fn append(&mut self, block: &EncodedBlock) -> Result<()> {
        // the footer adds 80 bits after the last block
        let needed = (self.writer.bits_written() + block.bit_len + 80).div_ceil(8) as usize;
        self.check_limit(needed)?;

        self.writer.append_bits(&block.bytes, block.bit_len);
        self.combined_crc = combine_stream_crc(self.combined_crc, block.crc);
        self.blocks += 1;
        Ok(())
    }

    /// Finish encoding and write the stream footer.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        stream::write_footer(&mut self.writer, self.combined_crc);
        self.check_limit(self.writer.byte_len())?;

        debug!(
            "finished stream: {} blocks, {} bytes, combined crc {:#010x}",
            self.blocks,
            self.writer.byte_len(),
            self.combined_crc
        );
        Ok(self.writer.into_inner())
    }

    fn check_limit(&self, needed: usize) -> Result<()> {
        match self.limit {
            Some(available) if needed > available => {
                Err(BzError::output_too_small(needed, available))
            }
            _ => Ok(()),
        }
    }
}

/// Reusable compression settings.
///
/// # Example
///
/// ```
/// use bzcodec::{BlockSize, Compressor};
///
/// let compressor = Compressor::new(BlockSize::new(9).unwrap());
/// let stream = compressor.compress(b"hello hello hello").unwrap();
/// assert_eq!(&stream[..4], b"BZh9");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Compressor {
    block_size: BlockSize,
    capacity: Option<usize>,
}

impl Compressor {
    /// Compressor with the given block size and no output bound.
    pub fn new(block_size: BlockSize) -> Self {
        Self {
            block_size,
            capacity: None,
        }
    }

    /// Bound the compressed size.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Configured block size.
    pub fn block_size(&self) -> BlockSize {
        self.block_size
    }

    /// Configured output bound, if any.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Compress `data` into a new stream.
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = BzEncoder::new(self.block_size);
        if let Some(limit) = self.capacity {
            encoder = encoder.with_limit(limit)?;
        }

        let mut offset = 0;
        while offset < data.len() {
            offset += encoder.write_block(&data[offset..])?;
        }

        encoder.finish()
    }

    /// Compress `data` into `out`, returning the stream length.
    pub fn compress_into(&self, data: &[u8], out: &mut [u8]) -> Result<usize> {
        let limit = self.capacity.map_or(out.len(), |c| c.min(out.len()));
        let compressed = self.with_capacity(limit).compress(data)?;
        out[..compressed.len()].copy_from_slice(&compressed);
        Ok(compressed.len())
    }
}

/// Output bound used when the caller has no better estimate:
/// the input length, but at least 128 bytes.
pub fn default_output_capacity(input_len: usize) -> usize {
    input_len.max(128)
}

/// Compress data using BZip2.
pub fn compress(data: &[u8], block_size: BlockSize) -> Result<Vec<u8>> {
    Compressor::new(block_size).compress(data)
}

/// Compress data, failing if the stream would exceed `capacity` bytes.
pub fn compress_with_capacity(data: &[u8], block_size: BlockSize, capacity: usize) -> Result<Vec<u8>> {
    Compressor::new(block_size).with_capacity(capacity).compress(data)
}

/// Compress data into a caller-supplied buffer, returning the bytes used.
pub fn compress_into(data: &[u8], block_size: BlockSize, out: &mut [u8]) -> Result<usize> {
    Compressor::new(block_size).compress_into(data, out)
}
