//! BZip2 compression/decompression.
//!
//! This crate provides a pure Rust implementation of the bzip2 stream
//! format, byte-compatible with the reference tool in both directions.
//!
//! BZip2 uses a pipeline of transformations:
//! 1. Run-Length Encoding (RLE1) - Initial encoding of runs
//! 2. Burrows-Wheeler Transform (BWT) - Block sorting for better compression
//! 3. Move-to-Front Transform (MTF) - Locality transformation
//! 4. Zero-Run Length Encoding (RLE2) - Special encoding for zeros
//! 5. Huffman Coding - Final entropy coding with 2 to 6 tables per block
//!
//! ## Example
//!
//! ```rust
//! use bzcodec::{BlockSize, compress, decompress};
//!
//! let data = b"aaaabbbbccc";
//! let compressed = compress(data, BlockSize::new(1).unwrap()).unwrap();
//! assert_eq!(&compressed[..4], b"BZh1");
//!
//! let restored = decompress(&compressed, data.len()).unwrap();
//! assert_eq!(restored, data);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod block;
/// Burrows-Wheeler Transform implementation.
pub mod bwt;
mod decode;
mod encode;
pub mod huffman;
pub mod mtf;
pub mod rle;
mod sais;
pub mod stream;

pub use bzcodec_core::{BzError, ChecksumScope, ErrorKind, Result};
pub use decode::{BzDecoder, Decompressor, decompress, decompress_concatenated, decompress_into};
pub use encode::{
    BzEncoder, Compressor, compress, compress_into, compress_with_capacity,
    default_output_capacity,
};
pub use stream::{BlockInfo, StreamInfo, inspect};

/// Stream header prefix ("BZh"), followed by the block size digit.
pub const STREAM_MAGIC: [u8; 3] = *b"BZh";

/// Block header magic bytes (0x314159265359).
pub const BLOCK_MAGIC: [u8; 6] = [0x31, 0x41, 0x59, 0x26, 0x53, 0x59];

/// End of stream magic bytes (0x177245385090).
pub const EOS_MAGIC: [u8; 6] = [0x17, 0x72, 0x45, 0x38, 0x50, 0x90];

/// Maximum block size (900k).
pub const MAX_BLOCK_SIZE: usize = 900_000;

/// Bytes by which the encoder keeps a block's RLE1 output below the
/// declared block size.
pub const BLOCK_SLACK: usize = 19;

/// Block size multiplier (1-9, where 9 = 900k blocks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockSize(u8);

impl BlockSize {
    /// Smallest block size (100k).
    pub const MIN: Self = Self(1);

    /// Largest block size (900k).
    pub const MAX: Self = Self(9);

    /// Create a block size; fails outside 1-9.
    pub fn new(level: u8) -> Result<Self> {
        if (1..=9).contains(&level) {
            Ok(Self(level))
        } else {
            Err(BzError::invalid_parameter(
                "block_size",
                format!("{} is outside 1..=9", level),
            ))
        }
    }

    /// Get the multiplier value.
    pub fn level(&self) -> u8 {
        self.0
    }

    /// ASCII digit written in the stream header.
    pub fn digit(&self) -> u8 {
        b'0' + self.0
    }

    /// Largest block a stream of this size may hold.
    pub fn max_block_len(&self) -> usize {
        self.0 as usize * 100_000
    }

    /// RLE1 bytes the encoder puts in one block.
    pub fn block_capacity(&self) -> usize {
        self.max_block_len() - BLOCK_SLACK
    }
}

impl Default for BlockSize {
    fn default() -> Self {
        Self(5)
    }
}

impl TryFrom<u8> for BlockSize {
    type Error = BzError;

    fn try_from(level: u8) -> Result<Self> {
        Self::new(level)
    }
}

impl std::fmt::Display for BlockSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
