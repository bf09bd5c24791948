//! Run-Length Encoding for BZip2.
//!
//! BZip2 uses two types of RLE:
//! 1. Initial RLE (rle1): Encodes runs of 4+ identical bytes before the BWT
//! 2. Zero-run RLE (rle2): Encodes runs of MTF rank 0 as RUNA/RUNB digits

use bzcodec_core::{BzError, Result};
use std::iter;

/// Number of identical bytes that triggers a count byte.
pub const RUN_THRESHOLD: usize = 4;

/// Longest run a single marker can carry (4 literals + count 251).
pub const MAX_RUN: usize = RUN_THRESHOLD + 251;

/// Zero-run digit worth 1 × its place value.
pub const RUNA: u16 = 0;

/// Zero-run digit worth 2 × its place value.
pub const RUNB: u16 = 1;

/// Largest place value a zero run may reach before the stream is rejected.
const MAX_RUN_WEIGHT: usize = 1 << 21;

/// Encode data with initial RLE (rle1).
///
/// Runs of 4 or more identical bytes are encoded as:
/// - First 4 bytes as-is
/// - Then a count byte (0-251) for additional repeats
pub fn rle1_encode(data: &[u8]) -> Vec<u8> {
    rle1_encode_block(data, usize::MAX).0
}

/// Encode as much of `data` as fits one block.
///
/// Whole runs are consumed until the encoded output reaches `capacity`;
/// the last run may overshoot it by up to four bytes. Returns the encoded
/// bytes and the number of input bytes they cover.
pub fn rle1_encode_block(data: &[u8], capacity: usize) -> (Vec<u8>, usize) {
    let mut result = Vec::with_capacity(data.len().min(capacity).saturating_add(5));
    let mut i = 0;

    while i < data.len() && result.len() < capacity {
        let byte = data[i];
        let mut run_len = 1;

        while i + run_len < data.len() && data[i + run_len] == byte && run_len < MAX_RUN {
            run_len += 1;
        }

        if run_len >= RUN_THRESHOLD {
            result.extend_from_slice(&[byte; RUN_THRESHOLD]);
            result.push((run_len - RUN_THRESHOLD) as u8);
        } else {
            result.extend(iter::repeat_n(byte, run_len));
        }
        i += run_len;
    }

    (result, i)
}

/// Decode RLE1-encoded data, producing at most `limit` bytes.
///
/// After four identical bytes the next byte is a repeat count and the run
/// state starts over.
pub fn rle1_decode(data: &[u8], limit: usize) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len().min(limit));
    let mut last: Option<u8> = None;
    let mut run = 0;

    for &byte in data {
        if run == RUN_THRESHOLD {
            // `last` is always set once a run of four has been seen
            let repeated = last.unwrap_or(0);
            let needed = result.len() + byte as usize;
            if needed > limit {
                return Err(BzError::output_too_small(needed, limit));
            }
            result.extend(iter::repeat_n(repeated, byte as usize));
            last = None;
            run = 0;
            continue;
        }

        if last == Some(byte) {
            run += 1;
        } else {
            last = Some(byte);
            run = 1;
        }

        if result.len() == limit {
            return Err(BzError::output_too_small(limit + 1, limit));
        }
        result.push(byte);
    }

    if run == RUN_THRESHOLD {
        return Err(BzError::MalformedRunLength);
    }

    Ok(result)
}

/// Append the RUNA/RUNB digits for a run of `run` zeros.
///
/// Bijective base-2, least significant digit first:
/// 1 -> RUNA, 2 -> RUNB, 3 -> RUNA RUNA, 4 -> RUNB RUNA, 5 -> RUNA RUNB, ...
pub fn push_zero_run(out: &mut Vec<u16>, run: usize) {
    let mut n = run;
    while n > 0 {
        out.push(if n & 1 == 1 { RUNA } else { RUNB });
        n = (n - 1) >> 1;
    }
}

/// Accumulates RUNA/RUNB digits back into a run length.
#[derive(Debug, Default, Clone)]
pub struct ZeroRun {
    len: usize,
    weight: usize,
}

impl ZeroRun {
    /// Add one RUNA or RUNB digit.
    pub fn push(&mut self, symbol: u16) -> Result<()> {
        if self.weight == 0 {
            self.weight = 1;
        }
        if self.weight >= MAX_RUN_WEIGHT {
            return Err(BzError::format("zero run too long"));
        }
        self.len += self.weight * (symbol as usize + 1);
        self.weight <<= 1;
        Ok(())
    }

    /// Return the accumulated length and reset.
    pub fn take(&mut self) -> usize {
        let len = self.len;
        self.len = 0;
        self.weight = 0;
        len
    }
}

/// Encode a raw MTF rank sequence with zero-run coding.
///
/// Runs of rank 0 become RUNA/RUNB digits; rank `r > 0` becomes symbol
/// `r + 1`. No end-of-block symbol is appended.
pub fn encode_zero_runs(ranks: &[u8]) -> Vec<u16> {
    let mut result = Vec::with_capacity(ranks.len());
    let mut zeros = 0usize;

    for &rank in ranks {
        if rank == 0 {
            zeros += 1;
            continue;
        }
        push_zero_run(&mut result, zeros);
        zeros = 0;
        result.push(rank as u16 + 1);
    }
    push_zero_run(&mut result, zeros);

    result
}

/// Invert [`encode_zero_runs`].
pub fn decode_zero_runs(symbols: &[u16]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(symbols.len());
    let mut run = ZeroRun::default();

    for &sym in symbols {
        if sym == RUNA || sym == RUNB {
            run.push(sym)?;
            continue;
        }
        result.resize(result.len() + run.take(), 0);
        if sym > 256 {
            return Err(BzError::invalid_symbol(sym, 257));
        }
        result.push((sym - 1) as u8);
    }
    result.resize(result.len() + run.take(), 0);

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rle1_no_runs() {
        let data = b"abcdef";
        let encoded = rle1_encode(data);
        assert_eq!(encoded, data.as_slice());

        let decoded = rle1_decode(&encoded, usize::MAX).unwrap();
        assert_eq!(decoded, data.as_slice());
    }

    #[test]
    fn test_rle1_short_runs() {
        let data = b"aabbbcccc";
        let encoded = rle1_encode(data);
        // "aa" stays as-is, "bbb" stays as-is, "cccc" becomes "cccc\0"
        assert_eq!(&encoded[..5], b"aabbb");
        assert_eq!(&encoded[5..], &[b'c', b'c', b'c', b'c', 0]);
    }

    #[test]
    fn test_rle1_max_run_restarts() {
        let data = vec![b'x'; 300];
        let encoded = rle1_encode(&data);
        // 255 = 4 + 251, then 45 = 4 + 41
        assert_eq!(encoded, vec![b'x', b'x', b'x', b'x', 251, b'x', b'x', b'x', b'x', 41]);
        assert_eq!(rle1_decode(&encoded, usize::MAX).unwrap(), data);
    }

    #[test]
    fn test_rle1_run_then_short_tail() {
        // 257 bytes: a capped run followed by a two-byte literal tail
        let data = vec![b'q'; 257];
        let encoded = rle1_encode(&data);
        assert_eq!(encoded, vec![b'q', b'q', b'q', b'q', 251, b'q', b'q']);
        assert_eq!(rle1_decode(&encoded, usize::MAX).unwrap(), data);
    }

    #[test]
    fn test_rle1_roundtrip() {
        let data = b"aaaaaabbbbbbbbccccccccccc";
        let encoded = rle1_encode(data);
        let decoded = rle1_decode(&encoded, usize::MAX).unwrap();
        assert_eq!(decoded, data.as_slice());
    }

    #[test]
    fn test_rle1_block_capacity() {
        let data: Vec<u8> = (0..100u8).collect();
        let (encoded, consumed) = rle1_encode_block(&data, 40);
        assert_eq!(encoded.len(), 40);
        assert_eq!(consumed, 40);

        // A run is never split: it may overshoot by at most four bytes.
        let mut data = vec![1u8, 2, 3];
        data.extend(std::iter::repeat_n(9u8, 50));
        let (encoded, consumed) = rle1_encode_block(&data, 4);
        assert_eq!(consumed, 53);
        assert_eq!(encoded.len(), 8);
    }

    #[test]
    fn test_rle1_decode_count_of_zero() {
        assert_eq!(
            rle1_decode(&[7, 7, 7, 7, 0, 7], usize::MAX).unwrap(),
            vec![7; 5]
        );
    }

    #[test]
    fn test_rle1_decode_missing_count() {
        assert_eq!(
            rle1_decode(b"zzzz", usize::MAX),
            Err(BzError::MalformedRunLength)
        );
        assert_eq!(
            rle1_decode(b"abzzzz", usize::MAX),
            Err(BzError::MalformedRunLength)
        );
    }

    #[test]
    fn test_rle1_decode_limit() {
        let encoded = rle1_encode(&[5u8; 100]);
        assert!(rle1_decode(&encoded, 100).is_ok());
        assert!(matches!(
            rle1_decode(&encoded, 99),
            Err(BzError::OutputBufferTooSmall { .. })
        ));
        assert!(matches!(
            rle1_decode(b"abc", 2),
            Err(BzError::OutputBufferTooSmall { .. })
        ));
    }

    #[test]
    fn test_zero_run_encoding() {
        // Single zero -> RUNA (1 = 1)
        assert_eq!(encode_zero_runs(&[0]), vec![RUNA]);

        // Two zeros -> RUNB (2 = 2)
        assert_eq!(encode_zero_runs(&[0, 0]), vec![RUNB]);

        // Three zeros -> RUNA RUNA (1 + 2 = 3)
        assert_eq!(encode_zero_runs(&[0, 0, 0]), vec![RUNA, RUNA]);

        // Four zeros -> RUNB RUNA (2 + 2 = 4)
        assert_eq!(encode_zero_runs(&[0; 4]), vec![RUNB, RUNA]);

        // Non-zero ranks shift up by one
        assert_eq!(encode_zero_runs(&[3, 0, 1]), vec![4, RUNA, 2]);
    }

    #[test]
    fn test_zero_run_lengths_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for run in 1..2000 {
            let mut digits = Vec::new();
            push_zero_run(&mut digits, run);
            assert!(seen.insert(digits.clone()), "duplicate digits for {}", run);

            let mut acc = ZeroRun::default();
            for &d in &digits {
                acc.push(d).unwrap();
            }
            assert_eq!(acc.take(), run);
        }
    }

    #[test]
    fn test_zero_run_roundtrip() {
        let data = vec![0, 0, 0, 1, 0, 0, 2, 0, 0, 0, 0, 0, 255];
        let encoded = encode_zero_runs(&data);
        let decoded = decode_zero_runs(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_zero_run_decode_rejects_large_symbol() {
        assert!(matches!(
            decode_zero_runs(&[2, 300]),
            Err(BzError::InvalidSymbol { symbol: 300, .. })
        ));
    }

    #[test]
    fn test_zero_run_overflow_is_rejected() {
        let mut acc = ZeroRun::default();
        let result = (0..40).try_for_each(|_| acc.push(RUNB));
        assert!(result.is_err());
    }
}
