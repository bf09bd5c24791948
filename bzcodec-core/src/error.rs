//! Error types for bzcodec operations.
//!
//! Every failure a compress or decompress call can report is a variant of
//! [`BzError`]. Variants fall into three families (see [`ErrorKind`]):
//! parameter errors raised before any work is done, format errors for
//! structurally broken input, and integrity errors for a well-formed stream
//! whose checksums do not match its content.

use std::fmt;
use thiserror::Error;

/// Broad classification of a [`BzError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The caller passed an invalid argument or too small a buffer.
    Parameter,
    /// The input is not a valid bzip2 stream.
    Format,
    /// The stream is well-formed but a checksum does not match.
    Integrity,
}

/// Which checksum failed to verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChecksumScope {
    /// A per-block CRC, with the zero-based block index.
    Block(usize),
    /// The combined CRC in the stream footer.
    Stream,
}

impl fmt::Display for ChecksumScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Block(index) => write!(f, "block {index}"),
            Self::Stream => f.write_str("stream"),
        }
    }
}

/// The main error type for bzcodec operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BzError {
    /// An argument is out of its accepted range.
    #[error("Invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// What was wrong with it.
        message: String,
    },

    /// The output would not fit in the capacity the caller provided.
    #[error("Output buffer too small: need at least {needed} bytes, have {available}")]
    OutputBufferTooSmall {
        /// Lower bound on the bytes required.
        needed: usize,
        /// Capacity the caller provided.
        available: usize,
    },

    /// The bit stream ended before a field could be read.
    #[error("Truncated input: needed {needed} more bits, {available} available")]
    TruncatedInput {
        /// Bits requested.
        needed: u32,
        /// Bits left in the input.
        available: u64,
    },

    /// Bad magic, header, or other structural damage.
    #[error("Invalid bzip2 stream: {message}")]
    Format {
        /// Description of the problem.
        message: String,
    },

    /// The BWT origin pointer does not address a row of the block.
    #[error("BWT origin pointer {orig_ptr} out of range for block of {len} bytes")]
    InvalidOriginPointer {
        /// Pointer read from the block header.
        orig_ptr: u32,
        /// Length of the transformed block.
        len: usize,
    },

    /// A decoded symbol lies outside the block's alphabet.
    #[error("Symbol {symbol} outside alphabet of size {alpha_size}")]
    InvalidSymbol {
        /// The offending symbol.
        symbol: u16,
        /// Declared alphabet size.
        alpha_size: usize,
    },

    /// Huffman code lengths cannot be limited to the permitted maximum.
    #[error("Huffman code lengths exceed {max_len} bits for alphabet of {alpha_size} symbols")]
    HuffmanOverflow {
        /// Maximum allowed code length.
        max_len: u8,
        /// Alphabet size.
        alpha_size: usize,
    },

    /// No Huffman code matches the bits at this position.
    #[error("Invalid Huffman code at bit position {bit_position}")]
    InvalidHuffmanCode {
        /// Bit position where decoding started.
        bit_position: u64,
    },

    /// A block ended inside a four-byte run with no count byte.
    #[error("Malformed run-length data: block ends inside a run marker")]
    MalformedRunLength,

    /// The stream uses a legacy feature this decoder refuses.
    #[error("Unsupported legacy feature: {feature}")]
    UnsupportedLegacyFeature {
        /// The feature encountered.
        feature: &'static str,
    },

    /// A block or stream CRC does not match the decoded data.
    #[error("CRC mismatch in {scope}: expected {expected:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        /// Which checksum failed.
        scope: ChecksumScope,
        /// Value stored in the stream.
        expected: u32,
        /// Value computed from the decoded data.
        computed: u32,
    },
}

/// Result type alias for bzcodec operations.
pub type Result<T> = std::result::Result<T, BzError>;

impl BzError {
    /// Create an invalid parameter error.
    pub fn invalid_parameter(name: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            message: message.into(),
        }
    }

    /// Create an output buffer too small error.
    pub fn output_too_small(needed: usize, available: usize) -> Self {
        Self::OutputBufferTooSmall { needed, available }
    }

    /// Create a truncated input error.
    pub fn truncated(needed: u32, available: u64) -> Self {
        Self::TruncatedInput { needed, available }
    }

    /// Create a format error.
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Create an invalid origin pointer error.
    pub fn invalid_origin(orig_ptr: u32, len: usize) -> Self {
        Self::InvalidOriginPointer { orig_ptr, len }
    }

    /// Create an invalid symbol error.
    pub fn invalid_symbol(symbol: u16, alpha_size: usize) -> Self {
        Self::InvalidSymbol { symbol, alpha_size }
    }

    /// Create a Huffman overflow error.
    pub fn huffman_overflow(max_len: u8, alpha_size: usize) -> Self {
        Self::HuffmanOverflow {
            max_len,
            alpha_size,
        }
    }

    /// Create an invalid Huffman code error.
    pub fn invalid_huffman(bit_position: u64) -> Self {
        Self::InvalidHuffmanCode { bit_position }
    }

    /// Create an unsupported legacy feature error.
    pub fn unsupported_legacy(feature: &'static str) -> Self {
        Self::UnsupportedLegacyFeature { feature }
    }

    /// Create a checksum mismatch error.
    pub fn crc_mismatch(scope: ChecksumScope, expected: u32, computed: u32) -> Self {
        Self::ChecksumMismatch {
            scope,
            expected,
            computed,
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParameter { .. } | Self::OutputBufferTooSmall { .. } => {
                ErrorKind::Parameter
            }
            Self::ChecksumMismatch { .. } => ErrorKind::Integrity,
            Self::TruncatedInput { .. }
            | Self::Format { .. }
            | Self::InvalidOriginPointer { .. }
            | Self::InvalidSymbol { .. }
            | Self::HuffmanOverflow { .. }
            | Self::InvalidHuffmanCode { .. }
            | Self::MalformedRunLength
            | Self::UnsupportedLegacyFeature { .. } => ErrorKind::Format,
        }
    }

    /// Whether a caller may choose to proceed despite this error.
    ///
    /// Only integrity errors qualify: the stream parsed cleanly but its
    /// content is suspect.
    pub fn is_recoverable(&self) -> bool {
        self.kind() == ErrorKind::Integrity
    }
}
