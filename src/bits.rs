//! Bit streams, least significant bit first.
//!
//! Values are split into bytes starting with their lowest bit, and each byte is filled starting
//! at its lowest bit. The writer remembers the exact number of bits so that the trailing padding
//! of the last byte never reaches the reader.
use crate::alloc::vec::Vec;

use log::debug;

/// Default initial allocation, in bits.
const INITIAL_BITS: usize = 8192;
/// Smallest factor the buffer grows by.
const MIN_GRANULARITY: usize = 2;
/// Widest value accepted by a single append or read.
const MAX_BITS_PER_CALL: u8 = 32;

/// An append-only bit buffer.
///
/// Owns its storage until [`release`] hands it to the caller.
///
/// [`release`]: #method.release
#[derive(Debug)]
pub struct BitWriter {
    /// Completed bytes.
    bytes: Vec<u8>,
    /// Capacity to allocate when the buffer is empty.
    initial_bytes: usize,
    /// The factor the capacity is multiplied by when full.
    granularity: usize,
    /// The buffer bits.
    buffer: u64,
    /// The number of valid buffer bits.
    bits_in_buffer: u8,
    /// Bits appended so far, without padding.
    bit_count: usize,
}

/// A bit cursor over a borrowed byte slice.
#[derive(Clone, Debug)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    bit_len: usize,
    position: usize,
}

impl BitWriter {
    /// A writer with room for 1024 bytes that doubles whenever it fills up.
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_BITS, MIN_GRANULARITY)
    }

    /// A writer with a chosen initial size in bits and growth factor.
    ///
    /// At least one byte is allocated and factors below 2 are raised to 2.
    pub fn with_capacity(bits: usize, granularity: usize) -> Self {
        let initial_bytes = bits.div_ceil(8).max(1);
        BitWriter {
            bytes: Vec::with_capacity(initial_bytes),
            initial_bytes,
            granularity: granularity.max(MIN_GRANULARITY),
            buffer: 0,
            bits_in_buffer: 0,
            bit_count: 0,
        }
    }

    /// Append the `count` low bits of `value`, lowest first.
    ///
    /// # Panics
    ///
    /// If `count` is larger than 32.
    pub fn append_bits(&mut self, value: u32, count: u8) {
        assert!(count <= MAX_BITS_PER_CALL, "at most 32 bits per append, got {}", count);
        let mask = (1u64 << count) - 1;
        self.buffer |= (u64::from(value) & mask) << self.bits_in_buffer;
        self.bits_in_buffer += count;
        self.bit_count += usize::from(count);

        while self.bits_in_buffer >= 8 {
            self.push_byte(self.buffer as u8);
            self.buffer >>= 8;
            self.bits_in_buffer -= 8;
        }
    }

    /// Number of bytes needed to hold every bit written so far.
    pub fn byte_count(&self) -> usize {
        self.bit_count.div_ceil(8)
    }

    /// Exact number of bits written so far.
    pub fn bit_count(&self) -> usize {
        self.bit_count
    }

    /// Allocated capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    /// Move the written bytes out, padding the last one with zero bits.
    ///
    /// The writer is left empty and can be used again. The returned vector has exactly
    /// [`byte_count`] elements, its capacity may be larger.
    ///
    /// [`byte_count`]: #method.byte_count
    pub fn release(&mut self) -> Vec<u8> {
        if self.bits_in_buffer > 0 {
            self.push_byte(self.buffer as u8);
        }
        self.buffer = 0;
        self.bits_in_buffer = 0;
        self.bit_count = 0;
        core::mem::take(&mut self.bytes)
    }

    fn push_byte(&mut self, byte: u8) {
        if self.bytes.len() == self.bytes.capacity() {
            self.grow();
        }
        self.bytes.push(byte);
    }

    fn grow(&mut self) {
        let additional = match self.bytes.capacity() {
            0 => self.initial_bytes,
            capacity => capacity.saturating_mul(self.granularity - 1),
        };
        // An oversized factor falls back to the amortized growth of `Vec`.
        if self.bytes.try_reserve_exact(additional).is_err() {
            self.bytes.reserve(1);
        }
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> BitReader<'a> {
    /// Read at most `bit_len` bits from `bytes`.
    ///
    /// A bit length beyond the end of the slice is clamped to the slice.
    pub fn new(bytes: &'a [u8], bit_len: usize) -> Self {
        let available = bytes.len().saturating_mul(8);
        if bit_len > available {
            debug!("bit length {} exceeds the {} available bits, clamping", bit_len, available);
        }

        BitReader {
            bytes,
            bit_len: bit_len.min(available),
            position: 0,
        }
    }

    /// Read the next `count` bits, lowest first.
    ///
    /// Reading past the declared length yields zero bits for the missing part. Check
    /// [`is_at_end`] before relying on a value.
    ///
    /// # Panics
    ///
    /// If `count` is larger than 32.
    ///
    /// [`is_at_end`]: #method.is_at_end
    pub fn read_bits(&mut self, count: u8) -> u32 {
        assert!(count <= MAX_BITS_PER_CALL, "at most 32 bits per read, got {}", count);
        let wanted = usize::from(count).min(self.remaining());
        let mut value = 0u32;
        let mut filled = 0;

        while filled < wanted {
            let byte = u32::from(self.bytes[self.position / 8]);
            let shift = self.position % 8;
            let take = (8 - shift).min(wanted - filled);
            let bits = (byte >> shift) & ((1u32 << take) - 1);
            value |= bits << filled;
            filled += take;
            self.position += take;
        }

        value
    }

    /// Whether every declared bit has been consumed.
    pub fn is_at_end(&self) -> bool {
        self.position >= self.bit_len
    }

    /// Bits not yet consumed.
    pub fn remaining(&self) -> usize {
        self.bit_len - self.position
    }

    /// Bits consumed so far.
    pub fn consumed(&self) -> usize {
        self.position
    }
}
