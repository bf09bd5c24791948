//! Huffman coding for BZip2.
//!
//! BZip2 uses multiple Huffman tables (2 to 6) and can switch between them
//! every 50 symbols for better compression. Which table codes a group is
//! recorded in a selector list that is itself MTF- and unary-coded.

use bzcodec_core::{BitReader, BitWriter, BzError, Result};
use log::trace;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Minimum number of Huffman tables.
pub const MIN_TABLES: usize = 2;

/// Maximum number of Huffman tables.
pub const MAX_TABLES: usize = 6;

/// Symbols per selector group.
pub const SYMBOLS_PER_GROUP: usize = 50;

/// Maximum code length a stream may declare.
pub const MAX_CODE_LEN: usize = 20;

/// Longest code the encoder produces.
pub const MAX_ENCODE_CODE_LEN: u8 = 17;

/// Selectors kept per block; any beyond this are read and dropped.
pub const MAX_SELECTORS: usize = 2 + 900_000 / SYMBOLS_PER_GROUP;

/// Table refinement passes run by the encoder.
const REFINEMENT_PASSES: usize = 4;

/// Placeholder cost for symbols outside a starting table's band.
const OUT_OF_BAND_COST: u8 = 15;

/// A Huffman table for encoding and decoding.
#[derive(Debug, Clone)]
pub struct HuffmanTable {
    /// Code lengths for each symbol.
    pub lengths: Vec<u8>,
    /// Canonical codes for each symbol (for encoding).
    pub codes: Vec<u32>,
    /// Maximum code length.
    pub max_len: u8,
    /// First code for each code length (for decoding).
    first_code: [u32; MAX_CODE_LEN + 1],
    /// Number of codes of each length (for decoding).
    counts: [u32; MAX_CODE_LEN + 1],
    /// Base index in perms for each code length (for decoding).
    base_index: [u32; MAX_CODE_LEN + 1],
    /// Permutation table mapping decode indices to symbols.
    perms: Vec<u16>,
}

impl HuffmanTable {
    /// Create a new Huffman table from code lengths.
    ///
    /// Every symbol must have a length in `1..=20`.
    pub fn from_lengths(lengths: &[u8]) -> Result<Self> {
        if lengths.is_empty() {
            return Err(BzError::format("empty Huffman table"));
        }
        if let Some(&bad) = lengths
            .iter()
            .find(|&&l| l == 0 || l as usize > MAX_CODE_LEN)
        {
            return Err(BzError::format(format!("Huffman code length {} out of range", bad)));
        }

        let max_len = lengths.iter().copied().max().unwrap_or(1);

        // Count symbols at each length
        let mut counts = [0u32; MAX_CODE_LEN + 1];
        for &len in lengths {
            counts[len as usize] += 1;
        }

        // first_code[L] = first canonical code of length L
        // base_index[L] = index in perms where length-L symbols start
        let mut first_code = [0u32; MAX_CODE_LEN + 1];
        let mut base_index = [0u32; MAX_CODE_LEN + 1];

        let mut code = 0u32;
        let mut index = 0u32;
        for len in 1..=max_len as usize {
            first_code[len] = code;
            base_index[len] = index;
            code = (code + counts[len]) << 1;
            index += counts[len];
        }

        // Canonical codes: by length, then by symbol index
        let mut codes = vec![0u32; lengths.len()];
        let mut perms = vec![0u16; lengths.len()];
        let mut next_code = first_code;
        let mut next_index = base_index;

        for (sym, &len) in lengths.iter().enumerate() {
            let len = len as usize;
            codes[sym] = next_code[len];
            next_code[len] += 1;
            perms[next_index[len] as usize] = sym as u16;
            next_index[len] += 1;
        }

        Ok(Self {
            lengths: lengths.to_vec(),
            codes,
            max_len,
            first_code,
            counts,
            base_index,
            perms,
        })
    }

    /// Decode a single symbol.
    pub fn decode(&self, reader: &mut BitReader<'_>) -> Result<u16> {
        let start = reader.bit_position();
        let mut code = 0u32;

        for len in 1..=self.max_len as usize {
            code = (code << 1) | reader.read_bits(1)?;

            let count = self.counts[len];
            let first = self.first_code[len];
            if count > 0 && code >= first && code < first + count {
                let idx = self.base_index[len] + (code - first);
                return Ok(self.perms[idx as usize]);
            }
        }

        Err(BzError::invalid_huffman(start))
    }

    /// Write the code for `symbol`.
    pub fn encode(&self, writer: &mut BitWriter, symbol: u16) {
        let sym = symbol as usize;
        writer.write_bits(self.codes[sym], self.lengths[sym]);
    }

    /// Get the code and length for a symbol (for encoding).
    pub fn get_code(&self, symbol: u16) -> Option<(u32, u8)> {
        let sym = symbol as usize;
        (sym < self.lengths.len()).then(|| (self.codes[sym], self.lengths[sym]))
    }
}

/// Build Huffman code lengths from symbol frequencies.
///
/// Zero frequencies are treated as one so every symbol gets a code. When
/// the tree is deeper than `max_len`, all weights are halved (rounding up)
/// and the tree is rebuilt, which flattens it until it fits.
pub fn build_code_lengths(freqs: &[u32], max_len: u8) -> Result<Vec<u8>> {
    let n = freqs.len();
    if n > 1usize << max_len {
        return Err(BzError::huffman_overflow(max_len, n));
    }
    match n {
        0 => return Ok(Vec::new()),
        1 => return Ok(vec![1]),
        _ => {}
    }

    let mut weights: Vec<u64> = freqs.iter().map(|&f| u64::from(f.max(1))).collect();

    loop {
        let lengths = tree_depths(&weights);
        if lengths.iter().all(|&l| l <= max_len) {
            return Ok(lengths);
        }
        if weights.iter().all(|&w| w == 1) {
            return Err(BzError::huffman_overflow(max_len, n));
        }
        for w in weights.iter_mut() {
            *w = w.div_ceil(2);
        }
    }
}

/// Leaf depths of a Huffman tree over `weights` (at least two).
fn tree_depths(weights: &[u64]) -> Vec<u8> {
    let n = weights.len();
    let mut parent = vec![usize::MAX; 2 * n - 1];
    let mut heap: BinaryHeap<Reverse<(u64, usize)>> = weights
        .iter()
        .enumerate()
        .map(|(i, &w)| Reverse((w, i)))
        .collect();

    let mut next = n;
    while let (Some(Reverse((w1, a))), Some(Reverse((w2, b)))) = (heap.pop(), heap.pop()) {
        parent[a] = next;
        parent[b] = next;
        heap.push(Reverse((w1 + w2, next)));
        next += 1;
    }

    (0..n)
        .map(|leaf| {
            let mut depth = 0u8;
            let mut node = parent[leaf];
            while node != usize::MAX {
                depth = depth.saturating_add(1);
                node = parent[node];
            }
            depth
        })
        .collect()
}

/// Number of tables the encoder uses for a block of `symbol_count` symbols.
pub fn table_count(symbol_count: usize) -> usize {
    match symbol_count {
        0..200 => 2,
        200..600 => 3,
        600..1200 => 4,
        1200..2400 => 5,
        _ => 6,
    }
}

/// The Huffman tables of one block plus the per-group selectors.
#[derive(Debug, Clone)]
pub struct TableSet {
    /// Tables, 2 to 6 of them.
    pub tables: Vec<HuffmanTable>,
    /// Table index for each 50-symbol group.
    pub selectors: Vec<u8>,
}

impl TableSet {
    /// Choose tables and selectors for a symbol stream.
    pub fn build(symbols: &[u16], alpha_size: usize) -> Result<Self> {
        let n_groups = table_count(symbols.len());

        let mut freqs = vec![0u32; alpha_size];
        for &sym in symbols {
            freqs[sym as usize] += 1;
        }

        let mut lengths = initial_costs(&freqs, symbols.len(), n_groups);
        let mut selectors = Vec::with_capacity(symbols.len().div_ceil(SYMBOLS_PER_GROUP));

        for pass in 0..REFINEMENT_PASSES {
            let mut table_freqs = vec![vec![0u32; alpha_size]; n_groups];
            selectors.clear();

            for group in symbols.chunks(SYMBOLS_PER_GROUP) {
                let best = (0..n_groups)
                    .min_by_key(|&t| {
                        group
                            .iter()
                            .map(|&s| u32::from(lengths[t][s as usize]))
                            .sum::<u32>()
                    })
                    .unwrap_or(0);
                selectors.push(best as u8);
                for &s in group {
                    table_freqs[best][s as usize] += 1;
                }
            }

            lengths = table_freqs
                .iter()
                .map(|f| build_code_lengths(f, MAX_ENCODE_CODE_LEN))
                .collect::<Result<_>>()?;
            trace!("table pass {}: {} selectors over {} tables", pass, selectors.len(), n_groups);
        }

        let tables = lengths
            .iter()
            .map(|l| HuffmanTable::from_lengths(l))
            .collect::<Result<_>>()?;

        Ok(Self { tables, selectors })
    }

    /// Write table count, selectors and code lengths.
    pub fn write(&self, writer: &mut BitWriter) {
        writer.write_bits(self.tables.len() as u32, 3);
        writer.write_bits(self.selectors.len() as u32, 15);

        let mut order: Vec<u8> = (0..self.tables.len() as u8).collect();
        for &sel in &self.selectors {
            let pos = order.iter().position(|&t| t == sel).unwrap_or(0);
            order[..=pos].rotate_right(1);
            for _ in 0..pos {
                writer.write_bit(true);
            }
            writer.write_bit(false);
        }

        for table in &self.tables {
            let mut current = table.lengths[0];
            writer.write_bits(u32::from(current), 5);
            for &len in &table.lengths {
                while current < len {
                    writer.write_bits(0b10, 2);
                    current += 1;
                }
                while current > len {
                    writer.write_bits(0b11, 2);
                    current -= 1;
                }
                writer.write_bit(false);
            }
        }
    }

    /// Read table count, selectors and code lengths for `alpha_size` symbols.
    pub fn read(reader: &mut BitReader<'_>, alpha_size: usize) -> Result<Self> {
        let n_groups = reader.read_bits(3)? as usize;
        if !(MIN_TABLES..=MAX_TABLES).contains(&n_groups) {
            return Err(BzError::format(format!("invalid Huffman table count {}", n_groups)));
        }

        let n_selectors = reader.read_bits(15)? as usize;
        if n_selectors == 0 {
            return Err(BzError::format("block has no selectors"));
        }

        let mut order: Vec<u8> = (0..n_groups as u8).collect();
        let mut selectors = Vec::with_capacity(n_selectors.min(MAX_SELECTORS));
        for _ in 0..n_selectors {
            let mut pos = 0;
            while reader.read_bit()? {
                pos += 1;
                if pos >= n_groups {
                    return Err(BzError::format("selector index out of range"));
                }
            }
            let sel = order[pos];
            order[..=pos].rotate_right(1);
            if selectors.len() < MAX_SELECTORS {
                selectors.push(sel);
            }
        }

        let mut tables = Vec::with_capacity(n_groups);
        for _ in 0..n_groups {
            let mut lengths = Vec::with_capacity(alpha_size);
            let mut current = reader.read_bits(5)? as i32;
            for _ in 0..alpha_size {
                loop {
                    if !(1..=MAX_CODE_LEN as i32).contains(&current) {
                        return Err(BzError::format(format!(
                            "Huffman code length {} out of range",
                            current
                        )));
                    }
                    if !reader.read_bit()? {
                        break;
                    }
                    current += if reader.read_bit()? { -1 } else { 1 };
                }
                lengths.push(current as u8);
            }
            tables.push(HuffmanTable::from_lengths(&lengths)?);
        }

        Ok(Self { tables, selectors })
    }

    /// Write `symbols` switching tables every 50 symbols.
    pub fn write_symbols(&self, writer: &mut BitWriter, symbols: &[u16]) {
        for (group, &sel) in symbols.chunks(SYMBOLS_PER_GROUP).zip(&self.selectors) {
            let table = &self.tables[sel as usize];
            for &sym in group {
                table.encode(writer, sym);
            }
        }
    }

    /// Decode symbols into `consume` until it returns `true`.
    pub fn read_symbols<F>(&self, reader: &mut BitReader<'_>, mut consume: F) -> Result<()>
    where
        F: FnMut(u16) -> Result<bool>,
    {
        for &sel in &self.selectors {
            let table = &self.tables[sel as usize];
            for _ in 0..SYMBOLS_PER_GROUP {
                if consume(table.decode(reader)?)? {
                    return Ok(());
                }
            }
        }
        Err(BzError::format("block data runs past its last selector"))
    }
}

/// Starting cost tables: each covers a contiguous band of symbols holding
/// roughly an equal share of the frequency mass.
fn initial_costs(freqs: &[u32], symbol_count: usize, n_groups: usize) -> Vec<Vec<u8>> {
    let alpha_size = freqs.len();
    let mut costs = vec![vec![OUT_OF_BAND_COST; alpha_size]; n_groups];
    let mut band_start = 0;
    let mut remaining = symbol_count;

    for part in (1..=n_groups).rev() {
        let target = remaining / part;
        let mut band_end = band_start;
        let mut acc = 0usize;
        while acc < target && band_end < alpha_size {
            acc += freqs[band_end] as usize;
            band_end += 1;
        }
        if band_end > band_start + 1 && part != n_groups && part != 1 && (n_groups - part) % 2 == 1
        {
            band_end -= 1;
            acc -= freqs[band_end] as usize;
        }

        costs[part - 1][band_start..band_end].fill(0);
        band_start = band_end;
        remaining -= acc;
    }

    costs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kraft_ok(lengths: &[u8]) -> bool {
        let sum: u64 = lengths.iter().map(|&l| 1u64 << (32 - l)).sum();
        sum <= 1u64 << 32
    }

    #[test]
    fn test_huffman_table_creation() {
        let lengths = vec![2, 2, 3, 3, 2];
        let table = HuffmanTable::from_lengths(&lengths).unwrap();
        assert_eq!(table.max_len, 3);
        assert_eq!(table.codes, vec![0b00, 0b01, 0b110, 0b111, 0b10]);
        assert_eq!(table.get_code(4), Some((0b10, 2)));
        assert_eq!(table.get_code(5), None);
    }

    #[test]
    fn test_table_rejects_bad_lengths() {
        assert!(HuffmanTable::from_lengths(&[]).is_err());
        assert!(HuffmanTable::from_lengths(&[1, 0]).is_err());
        assert!(HuffmanTable::from_lengths(&[1, 21]).is_err());
    }

    #[test]
    fn test_decode_with_length_gaps() {
        // No codes of length 2 or 3
        let lengths = vec![1, 4, 4, 4, 4, 4, 4, 4, 4];
        let table = HuffmanTable::from_lengths(&lengths).unwrap();

        let mut writer = BitWriter::new();
        let symbols = [0u16, 8, 3, 0, 1, 5];
        for &s in &symbols {
            table.encode(&mut writer, s);
        }
        let data = writer.into_inner();
        let mut reader = BitReader::new(&data);
        for &s in &symbols {
            assert_eq!(table.decode(&mut reader).unwrap(), s);
        }
    }

    #[test]
    fn test_decode_invalid_code() {
        // Incomplete code: 0 and 10 are used, 11 is not
        let table = HuffmanTable::from_lengths(&[1, 2]).unwrap();
        let data = [0b1100_0000];
        let mut reader = BitReader::new(&data);
        assert!(matches!(
            table.decode(&mut reader),
            Err(BzError::InvalidHuffmanCode { bit_position: 0 })
        ));
    }

    #[test]
    fn test_build_code_lengths() {
        let freqs = vec![100, 50, 25, 10];
        let lengths = build_code_lengths(&freqs, 15).unwrap();
        assert_eq!(lengths, vec![1, 2, 3, 3]);
    }

    #[test]
    fn test_build_code_lengths_zero_freqs() {
        let lengths = build_code_lengths(&[0, 0, 0, 0], 17).unwrap();
        assert_eq!(lengths, vec![2, 2, 2, 2]);
        assert_eq!(build_code_lengths(&[0], 17).unwrap(), vec![1]);
    }

    #[test]
    fn test_build_code_lengths_respects_limit() {
        // Fibonacci weights force a maximally skewed tree
        let mut freqs = vec![1u32, 1];
        while freqs.len() < 40 {
            let next = freqs[freqs.len() - 1] + freqs[freqs.len() - 2];
            freqs.push(next);
        }
        let lengths = build_code_lengths(&freqs, 17).unwrap();
        assert!(lengths.iter().all(|&l| (1..=17).contains(&l)));
        assert!(kraft_ok(&lengths));
    }

    #[test]
    fn test_build_code_lengths_overflow() {
        assert!(matches!(
            build_code_lengths(&[1; 9], 3),
            Err(BzError::HuffmanOverflow { max_len: 3, alpha_size: 9 })
        ));
        assert_eq!(build_code_lengths(&[1; 8], 3).unwrap(), vec![3; 8]);
    }

    #[test]
    fn test_table_count() {
        assert_eq!(table_count(1), 2);
        assert_eq!(table_count(199), 2);
        assert_eq!(table_count(200), 3);
        assert_eq!(table_count(1199), 4);
        assert_eq!(table_count(2399), 5);
        assert_eq!(table_count(2400), 6);
    }

    #[test]
    fn test_initial_costs_cover_alphabet() {
        let freqs = vec![10u32, 40, 5, 5, 20, 20];
        let costs = initial_costs(&freqs, 100, 3);
        for sym in 0..freqs.len() {
            let zero_in = costs.iter().filter(|c| c[sym] == 0).count();
            assert!(zero_in <= 1, "symbol {} in more than one band", sym);
        }
    }

    #[test]
    fn test_table_set_roundtrip() {
        let alpha_size = 30;
        let symbols: Vec<u16> = (0..5000u32)
            .map(|i| ((i * i + 7 * i) % 29) as u16)
            .chain(std::iter::once(29))
            .collect();

        let set = TableSet::build(&symbols, alpha_size).unwrap();
        assert_eq!(set.tables.len(), 6);
        assert_eq!(set.selectors.len(), symbols.len().div_ceil(SYMBOLS_PER_GROUP));

        let mut writer = BitWriter::new();
        set.write(&mut writer);
        set.write_symbols(&mut writer, &symbols);
        let data = writer.into_inner();

        let mut reader = BitReader::new(&data);
        let read = TableSet::read(&mut reader, alpha_size).unwrap();
        assert_eq!(read.selectors, set.selectors);
        for (a, b) in read.tables.iter().zip(&set.tables) {
            assert_eq!(a.lengths, b.lengths);
        }

        let mut decoded = Vec::new();
        read.read_symbols(&mut reader, |sym| {
            decoded.push(sym);
            Ok(sym == 29)
        })
        .unwrap();
        assert_eq!(decoded, symbols);
    }

    #[test]
    fn test_read_rejects_bad_table_count() {
        let mut writer = BitWriter::new();
        writer.write_bits(1, 3);
        writer.write_bits(1, 15);
        let data = writer.into_inner();
        let mut reader = BitReader::new(&data);
        assert!(matches!(
            TableSet::read(&mut reader, 3),
            Err(BzError::Format { .. })
        ));
    }

    #[test]
    fn test_read_rejects_bad_selector() {
        let mut writer = BitWriter::new();
        writer.write_bits(2, 3);
        writer.write_bits(1, 15);
        // unary 2 with only two tables
        writer.write_bits(0b110, 3);
        let data = writer.into_inner();
        let mut reader = BitReader::new(&data);
        assert!(TableSet::read(&mut reader, 3).is_err());
    }

    #[test]
    fn test_read_rejects_zero_length() {
        let mut writer = BitWriter::new();
        writer.write_bits(2, 3);
        writer.write_bits(1, 15);
        writer.write_bit(false);
        writer.write_bits(1, 5);
        // decrement from 1 to 0
        writer.write_bits(0b11, 2);
        writer.write_bits(0, 8);
        let data = writer.into_inner();
        let mut reader = BitReader::new(&data);
        assert!(TableSet::read(&mut reader, 3).is_err());
    }
}
