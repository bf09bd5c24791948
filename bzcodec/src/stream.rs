//! Stream framing: the `BZh` header, the end-of-stream footer and a
//! read-only walk over a stream's blocks.

use crate::block::decode_block;
use crate::{BLOCK_MAGIC, BlockSize, EOS_MAGIC, STREAM_MAGIC};
use bzcodec_core::{BitReader, BitWriter, BzError, Result, combine_stream_crc};

/// What follows a block boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// Another block.
    Block,
    /// The footer.
    EndOfStream,
}

/// Write `BZh` and the block size digit.
pub fn write_header(writer: &mut BitWriter, block_size: BlockSize) {
    writer.write_bytes(&STREAM_MAGIC);
    writer.write_u8(block_size.digit());
}

/// Read and validate the four header bytes.
pub fn read_header(reader: &mut BitReader<'_>) -> Result<BlockSize> {
    let header: [u8; 4] = reader.read_array()?;

    if header[..2] != STREAM_MAGIC[..2] {
        return Err(BzError::format("not a bzip2 stream (bad magic)"));
    }
    match header[2] {
        b'h' => {}
        b'0' => return Err(BzError::unsupported_legacy("BZ0 streams")),
        _ => return Err(BzError::format("unknown bzip2 version marker")),
    }

    header[3]
        .checked_sub(b'0')
        .and_then(|level| BlockSize::new(level).ok())
        .ok_or_else(|| BzError::format(format!("invalid block size digit {:#04x}", header[3])))
}

/// Read the 48-bit marker that starts a block or the footer.
pub fn read_marker(reader: &mut BitReader<'_>) -> Result<Marker> {
    let magic: [u8; 6] = reader.read_array()?;
    if magic == BLOCK_MAGIC {
        Ok(Marker::Block)
    } else if magic == EOS_MAGIC {
        Ok(Marker::EndOfStream)
    } else {
        Err(BzError::format("bad block magic"))
    }
}

/// Write the footer magic and combined CRC, then pad to a byte boundary.
pub fn write_footer(writer: &mut BitWriter, combined_crc: u32) {
    writer.write_bytes(&EOS_MAGIC);
    writer.write_u32(combined_crc);
    writer.flush();
}

/// Summary of one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockInfo {
    /// Stored block CRC.
    pub crc: u32,
    /// BWT origin row.
    pub orig_ptr: u32,
    /// Length of the block in its RLE1 form.
    pub bwt_len: usize,
    /// Bytes the block decodes to.
    pub decoded_len: usize,
    /// Bit offset of the block magic within the stream.
    pub bit_offset: u64,
}

/// Summary of a whole stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    /// Declared block size.
    pub block_size: BlockSize,
    /// Blocks in stream order.
    pub blocks: Vec<BlockInfo>,
    /// Combined CRC from the footer.
    pub combined_crc: u32,
    /// Bytes the stream occupies, footer padding included.
    pub compressed_len: usize,
}

impl StreamInfo {
    /// Total decoded size.
    pub fn decompressed_len(&self) -> u64 {
        self.blocks.iter().map(|b| b.decoded_len as u64).sum()
    }

    /// Decoded size over compressed size.
    pub fn ratio(&self) -> f64 {
        if self.compressed_len == 0 {
            return 0.0;
        }
        self.decompressed_len() as f64 / self.compressed_len as f64
    }
}

/// Walk a stream, verifying every checksum, and describe it.
pub fn inspect(data: &[u8]) -> Result<StreamInfo> {
    let mut reader = BitReader::new(data);
    let block_size = read_header(&mut reader)?;
    let mut blocks = Vec::new();
    let mut combined = 0u32;

    loop {
        let bit_offset = reader.bit_position();
        match read_marker(&mut reader)? {
            Marker::Block => {
                let block =
                    decode_block(&mut reader, blocks.len(), block_size.max_block_len(), usize::MAX)?;
                combined = combine_stream_crc(combined, block.crc);
                blocks.push(BlockInfo {
                    crc: block.crc,
                    orig_ptr: block.orig_ptr,
                    bwt_len: block.bwt_len,
                    decoded_len: block.data.len(),
                    bit_offset,
                });
            }
            Marker::EndOfStream => {
                let stored = reader.read_u32()?;
                if stored != combined {
                    return Err(BzError::crc_mismatch(
                        bzcodec_core::ChecksumScope::Stream,
                        stored,
                        combined,
                    ));
                }
                reader.align_to_byte();
                return Ok(StreamInfo {
                    block_size,
                    blocks,
                    combined_crc: stored,
                    compressed_len: (reader.bit_position() / 8) as usize,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_roundtrip() {
        let mut writer = BitWriter::new();
        write_header(&mut writer, BlockSize::new(7).unwrap());
        let bytes = writer.into_inner();
        assert_eq!(bytes, b"BZh7");
        let mut reader = BitReader::new(&bytes);
        assert_eq!(read_header(&mut reader).unwrap().level(), 7);
    }

    #[test]
    fn test_header_errors() {
        for bad in [b"BZh0".as_slice(), b"BZhA", b"PK\x03\x04", b"BZx9"] {
            let mut reader = BitReader::new(bad);
            assert!(matches!(read_header(&mut reader), Err(BzError::Format { .. })), "{:?}", bad);
        }
        let mut reader = BitReader::new(b"BZ0");
        assert!(read_header(&mut reader).is_err());
        let mut reader = BitReader::new(b"BZ09");
        assert!(matches!(
            read_header(&mut reader),
            Err(BzError::UnsupportedLegacyFeature { .. })
        ));
    }

    #[test]
    fn test_empty_stream_layout() {
        let mut writer = BitWriter::new();
        write_header(&mut writer, BlockSize::MAX);
        write_footer(&mut writer, 0);
        let bytes = writer.into_inner();
        assert_eq!(
            bytes,
            [0x42, 0x5A, 0x68, 0x39, 0x17, 0x72, 0x45, 0x38, 0x50, 0x90, 0, 0, 0, 0]
        );

        let info = inspect(&bytes).unwrap();
        assert!(info.blocks.is_empty());
        assert_eq!(info.compressed_len, 14);
        assert_eq!(info.decompressed_len(), 0);
    }

    #[test]
    fn test_marker() {
        let mut reader = BitReader::new(&BLOCK_MAGIC);
        assert_eq!(read_marker(&mut reader).unwrap(), Marker::Block);
        let mut reader = BitReader::new(&EOS_MAGIC);
        assert_eq!(read_marker(&mut reader).unwrap(), Marker::EndOfStream);
        let mut reader = BitReader::new(&[0u8; 6]);
        assert!(read_marker(&mut reader).is_err());
    }
}
