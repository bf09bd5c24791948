//! # bzcodec Core
//!
//! Core components for the bzcodec bzip2 implementation.
//!
//! This crate provides the building blocks the codec is layered on:
//!
//! - [`bitstream`]: MSB-first bit-level I/O over byte buffers
//! - [`crc`]: the bzip2 CRC-32 and the stream CRC combination rule
//! - [`error`]: Error types and their classification
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: Tooling                                             │
//! │     bzcodec CLI                                         │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     RLE1, BWT, MTF/RLE2, Huffman, block/stream framing  │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: BitStream (this crate)                              │
//! │     BitReader/BitWriter, CRC, errors                    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use bzcodec_core::bitstream::BitReader;
//! use bzcodec_core::crc::Crc32;
//!
//! // Read bits from data, most significant bit first
//! let data = [0xAB, 0xCD];
//! let mut reader = BitReader::new(&data);
//! assert_eq!(reader.read_bits(12).unwrap(), 0xABC);
//!
//! // Compute the bzip2 CRC-32
//! let crc = Crc32::compute(b"123456789");
//! assert_eq!(crc, 0xFC891918);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod crc;
pub mod error;

// Re-exports for convenience
pub use bitstream::{BitReader, BitWriter};
pub use crc::{Crc32, combine_stream_crc};
pub use error::{BzError, ChecksumScope, ErrorKind, Result};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bitstream::{BitReader, BitWriter};
    pub use crate::crc::Crc32;
    pub use crate::error::{BzError, ErrorKind, Result};
}
