//! Move-to-Front Transform for BZip2.
//!
//! MTF transforms a stream by replacing each byte with its position
//! in a dynamic list. After each byte, that byte is moved to the front
//! of the list. This converts local byte clusters into many zeros.
//!
//! The list only holds the bytes a block actually uses, numbered densely in
//! ascending byte order by a [`SymbolMap`]. Ranks are then folded with the
//! zero-run code and terminated by an end-of-block symbol.

use crate::rle::{RUNA, RUNB, ZeroRun, push_zero_run};
use bzcodec_core::{BitReader, BitWriter, BzError, Result};

/// The set of byte values used by one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolMap {
    in_use: [bool; 256],
    seq_to_unseq: Vec<u8>,
    unseq_to_seq: [u8; 256],
}

impl SymbolMap {
    /// Collect the bytes present in `data`.
    pub fn from_data(data: &[u8]) -> Self {
        let mut in_use = [false; 256];
        for &byte in data {
            in_use[byte as usize] = true;
        }
        Self::from_in_use(in_use)
    }

    /// Build from an explicit presence table.
    pub fn from_in_use(in_use: [bool; 256]) -> Self {
        let mut seq_to_unseq = Vec::with_capacity(256);
        let mut unseq_to_seq = [0u8; 256];
        for (byte, _) in in_use.iter().enumerate().filter(|(_, used)| **used) {
            unseq_to_seq[byte] = seq_to_unseq.len() as u8;
            seq_to_unseq.push(byte as u8);
        }
        Self {
            in_use,
            seq_to_unseq,
            unseq_to_seq,
        }
    }

    /// Write the two-level bitmap: one bit per 16-byte range, then 16 bits
    /// for each range that has a byte in use. Lowest byte is the MSB.
    pub fn write(&self, writer: &mut BitWriter) {
        let ranges: Vec<&[bool]> = self.in_use.chunks(16).collect();

        let mut top = 0u32;
        for (i, range) in ranges.iter().enumerate() {
            if range.iter().any(|&u| u) {
                top |= 1 << (15 - i);
            }
        }
        writer.write_bits(top, 16);

        for range in ranges.iter().filter(|r| r.iter().any(|&u| u)) {
            let mut bits = 0u32;
            for (j, _) in range.iter().enumerate().filter(|(_, used)| **used) {
                bits |= 1 << (15 - j);
            }
            writer.write_bits(bits, 16);
        }
    }

    /// Read the bitmap written by [`SymbolMap::write`].
    pub fn read(reader: &mut BitReader<'_>) -> Result<Self> {
        let top = reader.read_bits(16)?;
        let mut in_use = [false; 256];

        for i in (0..16).filter(|i| top & (1 << (15 - i)) != 0) {
            let bits = reader.read_bits(16)?;
            for j in (0..16).filter(|j| bits & (1 << (15 - j)) != 0) {
                in_use[i * 16 + j] = true;
            }
        }

        let map = Self::from_in_use(in_use);
        if map.is_empty() {
            return Err(BzError::format("block uses no symbols"));
        }
        Ok(map)
    }

    /// Whether `byte` is in the block's alphabet.
    pub fn contains(&self, byte: u8) -> bool {
        self.in_use[byte as usize]
    }

    /// Presence table indexed by byte value.
    pub fn in_use(&self) -> &[bool; 256] {
        &self.in_use
    }

    /// Number of distinct bytes.
    pub fn len(&self) -> usize {
        self.seq_to_unseq.len()
    }

    /// True when no byte is in use.
    pub fn is_empty(&self) -> bool {
        self.seq_to_unseq.is_empty()
    }

    /// Size of the coded alphabet: RUNA, RUNB, ranks 1.., EOB.
    pub fn alpha_size(&self) -> usize {
        self.len() + 2
    }

    /// End-of-block symbol.
    pub fn eob(&self) -> u16 {
        (self.len() + 1) as u16
    }

    /// Byte for a dense index.
    pub fn byte(&self, index: u8) -> u8 {
        self.seq_to_unseq[index as usize]
    }

    /// Dense index for a byte in use.
    pub fn index(&self, byte: u8) -> u8 {
        self.unseq_to_seq[byte as usize]
    }
}

/// The recency list of dense symbol indices.
#[derive(Debug, Clone)]
pub struct MtfList {
    list: Vec<u8>,
}

impl MtfList {
    /// Identity order over `n` symbols.
    pub fn new(n: usize) -> Self {
        Self {
            list: (0..n).map(|i| i as u8).collect(),
        }
    }

    /// Symbol at the front.
    pub fn front(&self) -> Option<u8> {
        self.list.first().copied()
    }

    /// Rank of `value`, moving it to the front.
    pub fn encode(&mut self, value: u8) -> usize {
        let pos = self.list.iter().position(|&v| v == value).unwrap_or(0);
        if pos > 0 {
            self.list[..=pos].rotate_right(1);
        }
        pos
    }

    /// Symbol at `rank`, moving it to the front.
    pub fn decode(&mut self, rank: usize) -> Option<u8> {
        let value = *self.list.get(rank)?;
        if rank > 0 {
            self.list[..=rank].rotate_right(1);
        }
        Some(value)
    }
}

/// Turn a BWT block into the coded symbol stream, ending with EOB.
pub fn encode(data: &[u8], map: &SymbolMap) -> Vec<u16> {
    let mut list = MtfList::new(map.len());
    let mut result = Vec::with_capacity(data.len() + 1);
    let mut zeros = 0usize;

    for &byte in data {
        let rank = list.encode(map.index(byte));
        if rank == 0 {
            zeros += 1;
            continue;
        }
        push_zero_run(&mut result, zeros);
        zeros = 0;
        result.push(rank as u16 + 1);
    }
    push_zero_run(&mut result, zeros);
    result.push(map.eob());

    result
}

/// Incremental inverse of [`encode`], fed one symbol at a time.
#[derive(Debug)]
pub struct MtfDecoder<'a> {
    map: &'a SymbolMap,
    list: MtfList,
    run: ZeroRun,
    output: Vec<u8>,
    limit: usize,
}

impl<'a> MtfDecoder<'a> {
    /// Decoder producing at most `limit` bytes.
    pub fn new(map: &'a SymbolMap, limit: usize) -> Self {
        Self {
            map,
            list: MtfList::new(map.len()),
            run: ZeroRun::default(),
            output: Vec::new(),
            limit,
        }
    }

    /// Consume one symbol. Returns `true` once EOB has been seen.
    pub fn push(&mut self, symbol: u16) -> Result<bool> {
        if symbol == RUNA || symbol == RUNB {
            return self.run.push(symbol).map(|_| false);
        }
        self.flush_run()?;

        if symbol == self.map.eob() {
            return Ok(true);
        }
        if symbol > self.map.eob() {
            return Err(BzError::invalid_symbol(symbol, self.map.alpha_size()));
        }

        let index = self
            .list
            .decode(symbol as usize - 1)
            .ok_or_else(|| BzError::invalid_symbol(symbol, self.map.alpha_size()))?;
        self.emit(self.map.byte(index), 1)
    }

    /// The decoded BWT block.
    pub fn finish(self) -> Vec<u8> {
        self.output
    }

    fn flush_run(&mut self) -> Result<()> {
        let len = self.run.take();
        if len == 0 {
            return Ok(());
        }
        let index = self
            .list
            .front()
            .ok_or_else(|| BzError::format("zero run in a block with no symbols"))?;
        self.emit(self.map.byte(index), len).map(|_| ())
    }

    fn emit(&mut self, byte: u8, count: usize) -> Result<bool> {
        if self.output.len() + count > self.limit {
            return Err(BzError::format(format!(
                "block exceeds the declared maximum of {} bytes",
                self.limit
            )));
        }
        self.output.resize(self.output.len() + count, byte);
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(symbols: &[u16], map: &SymbolMap) -> Result<Vec<u8>> {
        let mut decoder = MtfDecoder::new(map, usize::MAX);
        for &sym in symbols {
            if decoder.push(sym)? {
                return Ok(decoder.finish());
            }
        }
        Err(BzError::format("missing EOB"))
    }

    #[test]
    fn test_symbol_map() {
        let map = SymbolMap::from_data(b"cab");
        assert_eq!(map.len(), 3);
        assert_eq!(map.alpha_size(), 5);
        assert_eq!(map.eob(), 4);
        assert_eq!(map.index(b'a'), 0);
        assert_eq!(map.index(b'c'), 2);
        assert_eq!(map.byte(1), b'b');
        assert!(map.contains(b'b'));
        assert!(!map.contains(b'd'));
    }

    #[test]
    fn test_symbol_map_bitmap() {
        let map = SymbolMap::from_data(b"aaaabbbbccc");
        let mut writer = BitWriter::new();
        map.write(&mut writer);
        // range 6 in use, then bytes 0x61..=0x63 within it
        assert_eq!(writer.into_inner(), vec![0x02, 0x00, 0x70, 0x00]);

        let data: Vec<u8> = (0..=255u8).step_by(7).collect();
        let map = SymbolMap::from_data(&data);
        let mut writer = BitWriter::new();
        map.write(&mut writer);
        let bytes = writer.into_inner();
        let mut reader = BitReader::new(&bytes);
        assert_eq!(SymbolMap::read(&mut reader).unwrap(), map);
    }

    #[test]
    fn test_symbol_map_rejects_empty() {
        let bytes = [0u8, 0];
        let mut reader = BitReader::new(&bytes);
        assert!(SymbolMap::read(&mut reader).is_err());
    }

    #[test]
    fn test_mtf_list() {
        let mut list = MtfList::new(3);
        // 'a' at pos 0, 'b' at pos 1, 'a' at pos 1 (after 'b' moved front), 'b' at pos 1
        assert_eq!(
            [0, 1, 0, 1].map(|v| list.encode(v)),
            [0, 1, 1, 1]
        );
        assert_eq!(list.front(), Some(1));

        let mut list = MtfList::new(3);
        assert_eq!(list.decode(2), Some(2));
        assert_eq!(list.decode(0), Some(2));
        assert_eq!(list.decode(3), None);
    }

    #[test]
    fn test_encode_repeated() {
        let map = SymbolMap::from_data(b"a");
        // Every byte is rank 0: one run of four, then EOB
        assert_eq!(encode(b"aaaa", &map), vec![RUNB, RUNA, 2]);
    }

    #[test]
    fn test_encode_mixed() {
        let map = SymbolMap::from_data(b"abc");
        // ranks: b=1, b=0, a=1, c=2, c=0, c=0
        assert_eq!(
            encode(b"bbaccc", &map),
            vec![2, RUNA, 2, 3, RUNB, map.eob()]
        );
    }

    #[test]
    fn test_mtf_roundtrip() {
        let test_cases = [
            b"hello".as_slice(),
            b"banana",
            b"abracadabra",
            b"the quick brown fox",
            b"zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz",
        ];

        for data in test_cases {
            let map = SymbolMap::from_data(data);
            let symbols = encode(data, &map);
            assert_eq!(symbols.last(), Some(&map.eob()));
            let recovered = decode_all(&symbols, &map).unwrap();
            assert_eq!(recovered, data, "Failed for: {:?}", data);
        }
    }

    #[test]
    fn test_all_bytes_roundtrip() {
        let data: Vec<u8> = (0..=255u8).rev().chain(0..=255u8).collect();
        let map = SymbolMap::from_data(&data);
        assert_eq!(map.alpha_size(), 258);
        let symbols = encode(&data, &map);
        assert!(symbols.iter().all(|&s| s <= 257));
        assert_eq!(decode_all(&symbols, &map).unwrap(), data);
    }

    #[test]
    fn test_decode_rejects_out_of_range() {
        let map = SymbolMap::from_data(b"ab");
        let mut decoder = MtfDecoder::new(&map, 100);
        assert!(matches!(
            decoder.push(9),
            Err(BzError::InvalidSymbol { symbol: 9, .. })
        ));
    }

    #[test]
    fn test_decode_limit() {
        let map = SymbolMap::from_data(b"a");
        let mut decoder = MtfDecoder::new(&map, 3);
        decoder.push(RUNB).unwrap();
        decoder.push(RUNA).unwrap();
        assert!(decoder.push(map.eob()).is_err());
    }
}
