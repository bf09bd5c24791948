//! Bit-level I/O for the bzip2 container.
//!
//! This module provides `BitReader` and `BitWriter` for reading and writing
//! data at the bit level. bzip2 fields are not byte-aligned: a block header
//! is followed by a 1-bit flag and a 24-bit pointer, Huffman codes run
//! straight across byte boundaries, and blocks start wherever the previous
//! one ended.
//!
//! # Bit Ordering
//!
//! bzip2 uses MSB-first ordering: the first bit written lands in the most
//! significant bit of the first byte, and multi-bit values are stored with
//! their most significant bit first.
//!
//! # Example
//!
//! ```
//! use bzcodec_core::bitstream::{BitReader, BitWriter};
//!
//! let mut writer = BitWriter::new();
//! writer.write_bits(0b101, 3);
//! writer.write_bits(0b1100, 4);
//! let output = writer.into_inner();
//! assert_eq!(output, vec![0b1011_1000]);
//!
//! let mut reader = BitReader::new(&output);
//! assert_eq!(reader.read_bits(3).unwrap(), 0b101);
//! assert_eq!(reader.read_bits(4).unwrap(), 0b1100);
//! ```

use crate::error::{BzError, Result};

/// A bit-level reader over a byte slice.
///
/// Bits are staged in a 64-bit buffer whose most significant bit is the next
/// bit of the stream, so a read is a single shift.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    /// Input bytes.
    data: &'a [u8],
    /// Index of the next byte to load into the buffer.
    byte_pos: usize,
    /// Bit buffer (MSB-aligned).
    buffer: u64,
    /// Number of valid bits in buffer.
    bits_in_buffer: u8,
}

impl<'a> BitReader<'a> {
    /// Create a new `BitReader` over `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            byte_pos: 0,
            buffer: 0,
            bits_in_buffer: 0,
        }
    }

    /// Current position in bits from the start of the input.
    pub fn bit_position(&self) -> u64 {
        self.byte_pos as u64 * 8 - self.bits_in_buffer as u64
    }

    /// Number of bits not yet consumed.
    pub fn bits_remaining(&self) -> u64 {
        (self.data.len() - self.byte_pos) as u64 * 8 + self.bits_in_buffer as u64
    }

    /// Whether every bit has been consumed.
    pub fn is_at_end(&self) -> bool {
        self.bits_remaining() == 0
    }

    /// Top up the buffer with whole bytes.
    #[inline]
    fn refill(&mut self) {
        while self.bits_in_buffer <= 56 && self.byte_pos < self.data.len() {
            self.buffer |= (self.data[self.byte_pos] as u64) << (56 - self.bits_in_buffer);
            self.bits_in_buffer += 8;
            self.byte_pos += 1;
        }
    }

    /// Read up to 32 bits from the stream.
    ///
    /// # Arguments
    ///
    /// * `count` - Number of bits to read (0-32)
    ///
    /// # Returns
    ///
    /// The bits read as a u32, with the first bit read in the most
    /// significant of the `count` positions. Fails with
    /// [`BzError::TruncatedInput`] without consuming anything if fewer than
    /// `count` bits remain.
    #[inline]
    pub fn read_bits(&mut self, count: u8) -> Result<u32> {
        let value = self.peek_bits(count)?;
        self.consume(count);
        Ok(value)
    }

    /// Peek at up to 32 bits without consuming them.
    #[inline]
    pub fn peek_bits(&mut self, count: u8) -> Result<u32> {
        debug_assert!(count <= 32, "Cannot read more than 32 bits at once");

        if count == 0 {
            return Ok(0);
        }

        if self.bits_in_buffer < count {
            self.refill();
            if self.bits_in_buffer < count {
                return Err(BzError::truncated(count as u32, self.bits_remaining()));
            }
        }

        Ok((self.buffer >> (64 - count as u32)) as u32)
    }

    #[inline]
    fn consume(&mut self, count: u8) {
        if count == 0 {
            return;
        }
        self.buffer = if count == 64 { 0 } else { self.buffer << count };
        self.bits_in_buffer -= count;
    }

    /// Read a single bit.
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Read 8 bits.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bits(8)? as u8)
    }

    /// Read 16 bits.
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(self.read_bits(16)? as u16)
    }

    /// Read 32 bits.
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_bits(32)
    }

    /// Read `N` whole bytes (not necessarily byte-aligned).
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let needed = N as u64 * 8;
        if self.bits_remaining() < needed {
            return Err(BzError::truncated(needed as u32, self.bits_remaining()));
        }
        let mut out = [0u8; N];
        for byte in &mut out {
            *byte = self.read_u8()?;
        }
        Ok(out)
    }

    /// Discard bits up to the next byte boundary.
    pub fn align_to_byte(&mut self) {
        let remainder = self.bits_in_buffer % 8;
        self.consume(remainder);
    }

    /// Bytes from the next byte boundary onwards.
    ///
    /// Only meaningful after [`align_to_byte`](Self::align_to_byte).
    pub fn remaining_bytes(&self) -> &'a [u8] {
        let buffered = (self.bits_in_buffer / 8) as usize;
        &self.data[self.byte_pos - buffered..]
    }
}

/// A bit-level writer producing an owned byte vector.
///
/// Bits accumulate in a small buffer and complete bytes are pushed to the
/// output as soon as they are formed. Call `flush()` (or `into_inner()`) to
/// pad and emit the final partial byte.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    /// Completed bytes.
    output: Vec<u8>,
    /// Pending bits, right-aligned.
    buffer: u64,
    /// Number of pending bits (always < 8 between calls).
    bits_in_buffer: u8,
}

impl BitWriter {
    /// Create an empty `BitWriter`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a `BitWriter` with room for `bytes` output bytes.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            output: Vec::with_capacity(bytes),
            buffer: 0,
            bits_in_buffer: 0,
        }
    }

    /// Get the total number of bits written so far.
    pub fn bits_written(&self) -> u64 {
        self.output.len() as u64 * 8 + self.bits_in_buffer as u64
    }

    /// Number of bytes the output occupies once flushed.
    pub fn byte_len(&self) -> usize {
        self.output.len() + usize::from(self.bits_in_buffer > 0)
    }

    #[inline]
    fn flush_bytes(&mut self) {
        while self.bits_in_buffer >= 8 {
            self.bits_in_buffer -= 8;
            self.output.push((self.buffer >> self.bits_in_buffer) as u8);
        }
        self.buffer &= (1u64 << self.bits_in_buffer) - 1;
    }

    /// Write up to 32 bits to the stream.
    ///
    /// # Arguments
    ///
    /// * `value` - The bits to write; only the low `count` bits are used
    /// * `count` - Number of bits to write (0-32), most significant first
    #[inline]
    pub fn write_bits(&mut self, value: u32, count: u8) {
        debug_assert!(count <= 32, "Cannot write more than 32 bits at once");

        if count == 0 {
            return;
        }

        let mask = if count == 32 {
            u32::MAX
        } else {
            (1u32 << count) - 1
        };
        self.buffer = (self.buffer << count) | (value & mask) as u64;
        self.bits_in_buffer += count;
        self.flush_bytes();
    }

    /// Write a single bit.
    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        self.write_bits(bit as u32, 1);
    }

    /// Write 8 bits.
    pub fn write_u8(&mut self, value: u8) {
        self.write_bits(value as u32, 8);
    }

    /// Write 16 bits.
    pub fn write_u16(&mut self, value: u16) {
        self.write_bits(value as u32, 16);
    }

    /// Write 32 bits.
    pub fn write_u32(&mut self, value: u32) {
        self.write_bits(value, 32);
    }

    /// Write whole bytes at the current (possibly unaligned) position.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.bits_in_buffer == 0 {
            self.output.extend_from_slice(bytes);
        } else {
            for &byte in bytes {
                self.write_u8(byte);
            }
        }
    }

    /// Append the first `bit_len` bits of `bytes`, as produced by another
    /// writer's [`into_inner`](Self::into_inner).
    pub fn append_bits(&mut self, bytes: &[u8], bit_len: u64) {
        debug_assert!(bit_len <= bytes.len() as u64 * 8);
        let whole = (bit_len / 8) as usize;
        self.write_bytes(&bytes[..whole]);
        let tail = (bit_len % 8) as u8;
        if tail > 0 {
            self.write_bits((bytes[whole] >> (8 - tail)) as u32, tail);
        }
    }

    /// Pad to a byte boundary with zero bits.
    pub fn flush(&mut self) {
        if self.bits_in_buffer > 0 {
            let padding = 8 - self.bits_in_buffer;
            self.write_bits(0, padding);
        }
    }

    /// Flush and return the written bytes.
    pub fn into_inner(mut self) -> Vec<u8> {
        self.flush();
        self.output
    }
}
