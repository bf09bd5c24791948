//! Block assembly and disassembly.
//!
//! A block on the wire:
//!
//! ```text
//! magic      48  0x314159265359
//! crc        32  CRC of the original bytes the block covers
//! randomised  1  always 0 when written
//! orig_ptr   24  BWT origin row
//! symbol map 16 + 16 per used range
//! tables         see huffman::TableSet
//! data           Huffman-coded MTF/RLE2 symbols up to EOB
//! ```
//!
//! Blocks share no state, so each one is encoded into its own bit buffer
//! and the stream only concatenates them.

use crate::huffman::TableSet;
use crate::mtf::{self, MtfDecoder, SymbolMap};
use crate::{BLOCK_MAGIC, bwt, rle};
use bzcodec_core::{BitReader, BitWriter, BzError, ChecksumScope, Crc32, Result};
use log::debug;

/// One compressed block, not yet placed in a stream.
#[derive(Debug, Clone)]
pub struct EncodedBlock {
    /// CRC of the original bytes.
    pub crc: u32,
    /// Input bytes covered by this block.
    pub consumed: usize,
    /// BWT origin row.
    pub orig_ptr: u32,
    /// Bit-packed block, magic included, last byte zero-padded.
    pub bytes: Vec<u8>,
    /// Number of meaningful bits in `bytes`.
    pub bit_len: u64,
}

/// Compress the first block's worth of `data`.
///
/// `capacity` bounds the RLE1 output of the block. `data` must not be empty.
pub fn encode_block(data: &[u8], capacity: usize) -> Result<EncodedBlock> {
    if data.is_empty() {
        return Err(BzError::invalid_parameter("data", "cannot encode an empty block"));
    }

    let (rle1_data, consumed) = rle::rle1_encode_block(data, capacity);
    let crc = Crc32::compute(&data[..consumed]);

    let (bwt_data, orig_ptr) = bwt::transform(&rle1_data);
    let map = SymbolMap::from_data(&rle1_data);
    let symbols = mtf::encode(&bwt_data, &map);
    let tables = TableSet::build(&symbols, map.alpha_size())?;

    let mut writer = BitWriter::with_capacity(rle1_data.len() / 2 + 64);
    writer.write_bytes(&BLOCK_MAGIC);
    writer.write_u32(crc);
    writer.write_bit(false);
    writer.write_bits(orig_ptr, 24);
    map.write(&mut writer);
    tables.write(&mut writer);
    tables.write_symbols(&mut writer, &symbols);

    let bit_len = writer.bits_written();
    let bytes = writer.into_inner();

    debug!(
        "encoded block: {} input bytes, {} after rle1, {} symbols, {} tables, {} bits, crc {:#010x}",
        consumed,
        rle1_data.len(),
        symbols.len(),
        tables.tables.len(),
        bit_len,
        crc
    );

    Ok(EncodedBlock {
        crc,
        consumed,
        orig_ptr,
        bytes,
        bit_len,
    })
}

/// A block read back from a stream.
#[derive(Debug, Clone)]
pub struct DecodedBlock {
    /// CRC stored in the block header (verified against `data`).
    pub crc: u32,
    /// BWT origin row.
    pub orig_ptr: u32,
    /// Length of the BWT block (RLE1 form).
    pub bwt_len: usize,
    /// The original bytes.
    pub data: Vec<u8>,
}

/// Decode one block whose magic has already been consumed.
///
/// `index` numbers the block for error reports, `max_block` is the stream's
/// declared block size and `limit` the most output the caller can take.
pub fn decode_block(
    reader: &mut BitReader<'_>,
    index: usize,
    max_block: usize,
    limit: usize,
) -> Result<DecodedBlock> {
    let stored_crc = reader.read_u32()?;
    if reader.read_bit()? {
        return Err(BzError::unsupported_legacy("randomised blocks"));
    }
    let orig_ptr = reader.read_bits(24)?;

    let map = SymbolMap::read(reader)?;
    let tables = TableSet::read(reader, map.alpha_size())?;

    let mut symbols = MtfDecoder::new(&map, max_block);
    tables.read_symbols(reader, |sym| symbols.push(sym))?;
    let bwt_data = symbols.finish();
    if bwt_data.is_empty() {
        return Err(BzError::format("block holds no data"));
    }

    let rle1_data = bwt::inverse_transform(&bwt_data, orig_ptr)?;
    let data = rle::rle1_decode(&rle1_data, limit)?;

    let computed = Crc32::compute(&data);
    if computed != stored_crc {
        return Err(BzError::crc_mismatch(
            ChecksumScope::Block(index),
            stored_crc,
            computed,
        ));
    }

    debug!(
        "decoded block {}: {} bwt bytes, {} output bytes, crc {:#010x}",
        index,
        bwt_data.len(),
        data.len(),
        computed
    );

    Ok(DecodedBlock {
        crc: stored_crc,
        orig_ptr,
        bwt_len: bwt_data.len(),
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(data: &[u8], capacity: usize) -> Vec<u8> {
        let block = encode_block(data, capacity).unwrap();
        let mut reader = BitReader::new(&block.bytes);
        assert_eq!(reader.read_array::<6>().unwrap(), BLOCK_MAGIC);
        let decoded = decode_block(&mut reader, 0, capacity + 5, usize::MAX).unwrap();
        assert_eq!(decoded.crc, block.crc);
        assert_eq!(decoded.orig_ptr, block.orig_ptr);
        decoded.data
    }

    #[test]
    fn test_block_roundtrip() {
        let data = b"aaaabbbbccc";
        assert_eq!(roundtrip(data, 100_000), data);
    }

    #[test]
    fn test_block_single_byte() {
        assert_eq!(roundtrip(b"x", 100_000), b"x");
    }

    #[test]
    fn test_block_stops_at_capacity() {
        let data: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
        let block = encode_block(&data, 600).unwrap();
        assert_eq!(block.consumed, 600);
        assert_eq!(roundtrip(&data[..600], 600), &data[..600]);
    }

    #[test]
    fn test_block_known_header() {
        // Same header fields the reference encoder writes for this input
        let block = encode_block(b"aaaabbbbccc", 99_981).unwrap();
        assert_eq!(block.crc, 0xD63C_024E);
        assert_eq!(&block.bytes[..10], &[0x31, 0x41, 0x59, 0x26, 0x53, 0x59, 0xD6, 0x3C, 0x02, 0x4E]);
    }

    #[test]
    fn test_block_rejects_empty() {
        assert!(matches!(
            encode_block(b"", 100),
            Err(BzError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_block_crc_mismatch() {
        let mut block = encode_block(b"hello hello hello", 1000).unwrap();
        block.bytes[9] ^= 0x01;
        let mut reader = BitReader::new(&block.bytes[6..]);
        assert!(matches!(
            decode_block(&mut reader, 3, 1000, usize::MAX),
            Err(BzError::ChecksumMismatch {
                scope: ChecksumScope::Block(3),
                ..
            })
        ));
    }

    #[test]
    fn test_block_randomised_flag() {
        let mut block = encode_block(b"abc", 1000).unwrap();
        // first bit after magic and crc
        block.bytes[10] |= 0x80;
        let mut reader = BitReader::new(&block.bytes[6..]);
        assert!(matches!(
            decode_block(&mut reader, 0, 1000, usize::MAX),
            Err(BzError::UnsupportedLegacyFeature { .. })
        ));
    }

    #[test]
    fn test_block_output_limit() {
        let data = vec![b'z'; 500];
        let block = encode_block(&data, 1000).unwrap();
        let mut reader = BitReader::new(&block.bytes[6..]);
        assert!(matches!(
            decode_block(&mut reader, 0, 1000, 499),
            Err(BzError::OutputBufferTooSmall { .. })
        ));
    }
}
