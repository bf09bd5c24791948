//! Helpers shared by the integration tests.

use bzcodec::huffman::TableSet;
use bzcodec::mtf::SymbolMap;
use bzcodec::stream::{self, Marker};
use bzcodec_core::BitReader;

/// Number of Huffman tables in the first block of `data`.
pub fn first_block_tables(data: &[u8]) -> usize {
    let mut reader = BitReader::new(data);
    stream::read_header(&mut reader).unwrap();
    assert_eq!(stream::read_marker(&mut reader).unwrap(), Marker::Block);

    reader.read_u32().unwrap(); // block CRC
    assert!(!reader.read_bit().unwrap());
    reader.read_bits(24).unwrap(); // origin pointer

    let map = SymbolMap::read(&mut reader).unwrap();
    TableSet::read(&mut reader, map.alpha_size()).unwrap().tables.len()
}
