//! A module for all encoding needs.
use crate::alloc::vec::Vec;
use crate::bits::BitWriter;
use crate::dict::Dictionary;
use crate::{Code, MIN_CODESIZE};

use log::debug;
#[cfg(feature = "std")]
use std::io::{self, Read};

/// The result of encoding one buffer.
///
/// The stream has no terminator and no length, so `bit_count` has to travel along with the bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Compressed {
    /// The code stream, padded with zero bits to a full byte.
    pub bytes: Vec<u8>,
    /// The number of meaningful bits in `bytes`.
    pub bit_count: usize,
}

/// Greedy longest-match LZW encoder.
///
/// Every call to [`encode`] starts from a fresh dictionary, the value only keeps allocations.
///
/// [`encode`]: #method.encode
pub struct Encoder {
    /// The current encoding table.
    dict: Dictionary,
    /// Output bits.
    writer: BitWriter,
    /// The current code length.
    code_size: u8,
    /// The code corresponding to the currently read characters.
    current_code: Option<Code>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::with_writer(BitWriter::new())
    }

    /// Encode into a preconfigured bit writer.
    ///
    /// Use this to pick the initial allocation and growth factor of the output buffer.
    pub fn with_writer(writer: BitWriter) -> Self {
        Encoder {
            dict: Dictionary::indexed(),
            writer,
            code_size: MIN_CODESIZE,
            current_code: None,
        }
    }

    /// Compress all of `data`.
    ///
    /// Empty input produces no bytes and no bits.
    pub fn encode(&mut self, data: &[u8]) -> Compressed {
        self.dict.reset();
        self.code_size = MIN_CODESIZE;
        self.current_code = None;

        for &byte in data {
            match self.dict.find_index(self.current_code, byte) {
                Some(code) => self.current_code = Some(code),
                None => {
                    // Only compound matches can miss, so there always is a code to write.
                    if let Some(code) = self.current_code {
                        self.buffer_code(code);
                        if !self.dict.grow_or_reset(&mut self.code_size).is_reset() {
                            self.dict.add(code, byte);
                        }
                    }
                    self.current_code = Some(Code::from(byte));
                }
            }
        }

        if let Some(code) = self.current_code.take() {
            self.buffer_code(code);
        }

        let bit_count = self.writer.bit_count();
        let bytes = self.writer.release();
        debug!(
            "encoded {} bytes into {} bits ({} bytes)",
            data.len(),
            bit_count,
            bytes.len()
        );
        Compressed { bytes, bit_count }
    }

    /// Read `read` to its end and compress it.
    #[cfg(feature = "std")]
    pub fn encode_reader(&mut self, mut read: impl Read) -> io::Result<Compressed> {
        let mut data = Vec::new();
        read.read_to_end(&mut data)?;
        Ok(self.encode(&data))
    }

    /// Write a code with the width in effect before the dictionary changes.
    fn buffer_code(&mut self, code: Code) {
        self.writer.append_bits(u32::from(code), self.code_size);
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Compress `data` with a fresh [`Encoder`].
///
/// [`Encoder`]: struct.Encoder.html
pub fn encode(data: &[u8]) -> Compressed {
    Encoder::new().encode(data)
}

#[cfg(test)]
mod tests {
    use super::{encode, Encoder};
    use crate::bits::{BitReader, BitWriter};
    use crate::decode::decode;
    use crate::Code;
    use std::collections::HashMap;

    /// Width of the `n`th code written in a generation, counting from one.
    fn width_of(n: usize) -> u8 {
        match n {
            1..=257 => 9,
            258..=769 => 10,
            770..=1793 => 11,
            _ => 12,
        }
    }

    /// Codes written by a generation before the dictionary starts over.
    const GENERATION: usize = 3841;

    /// Straightforward LZW over owned strings, used as the reference trace.
    fn reference_codes(data: &[u8]) -> Vec<Code> {
        let literals = || -> HashMap<Vec<u8>, Code> {
            (0..=u8::MAX).map(|b| (vec![b], Code::from(b))).collect()
        };
        let mut table = literals();
        let mut codes = vec![];
        let mut current: Vec<u8> = vec![];

        for &byte in data {
            let mut extended = current.clone();
            extended.push(byte);
            if table.contains_key(&extended) {
                current = extended;
                continue;
            }

            codes.push(table[&current]);
            if codes.len() % GENERATION == 0 {
                table = literals();
            } else {
                let next = table.len() as Code;
                table.insert(extended, next);
            }
            current = vec![byte];
        }

        if !current.is_empty() {
            codes.push(table[&current]);
        }
        codes
    }

    /// Every adjacent pair occurs once, so each byte ends a match and yields one code.
    fn distinct_pairs(len: usize) -> Vec<u8> {
        let mut sequence = vec![];
        for a in 0..=u8::MAX {
            sequence.push(a);
            for b in a.saturating_add(1)..=u8::MAX {
                if b == a {
                    break;
                }
                sequence.push(a);
                sequence.push(b);
            }
        }
        assert!(len <= sequence.len());
        sequence.truncate(len);
        sequence
    }

    fn xorshift(len: usize, alphabet: u8) -> Vec<u8> {
        let mut state = 0x9e37_79b9u32;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state % u32::from(alphabet)) as u8
            })
            .collect()
    }

    fn expected_bits(code_count: usize) -> usize {
        (1..=code_count)
            .map(|n| usize::from(width_of((n - 1) % GENERATION + 1)))
            .sum()
    }

    #[test]
    fn empty_input_is_empty_output() {
        let compressed = encode(&[]);
        assert!(compressed.bytes.is_empty());
        assert_eq!(compressed.bit_count, 0);
    }

    #[test]
    fn single_byte_is_one_literal() {
        let compressed = encode(b"A");
        assert_eq!(compressed.bit_count, 9);
        assert_eq!(compressed.bytes, [0x41, 0x00]);
    }

    #[test]
    fn repeated_byte_uses_learned_code() {
        // 'a', then the entry 256 for "aa".
        let compressed = encode(b"aaa");
        assert_eq!(compressed.bit_count, 18);
        let mut reader = BitReader::new(&compressed.bytes, compressed.bit_count);
        assert_eq!(reader.read_bits(9), u32::from(b'a'));
        assert_eq!(reader.read_bits(9), 256);
        assert!(reader.is_at_end());
    }

    #[test]
    fn code_size_switches_at_table_boundaries() {
        for &len in &[1, 256, 257, 258, 768, 769, 770, 1793, 1794, 3840, 3841, 3842, 3843] {
            let data = distinct_pairs(len);
            let compressed = encode(&data);
            assert_eq!(compressed.bit_count, expected_bits(len), "length {}", len);
            assert_eq!(decode(&compressed.bytes, compressed.bit_count, len), data);
        }
    }

    #[test]
    fn widths_switch_at_512_1024_2048_and_reset() {
        let data = distinct_pairs(3845);
        let compressed = encode(&data);
        let mut reader = BitReader::new(&compressed.bytes, compressed.bit_count);
        // Without repeated pairs every code is the literal of its byte.
        for (n, &byte) in data.iter().enumerate() {
            let width = width_of(n % GENERATION + 1);
            assert_eq!(reader.read_bits(width), u32::from(byte), "code {}", n + 1);
        }
        assert!(reader.is_at_end());
    }

    #[test]
    fn matches_reference_trace() {
        for &(len, alphabet) in &[(1000, 2), (20_000, 4), (40_000, 16), (60_000, 255)] {
            let data = xorshift(len, alphabet);
            let codes = reference_codes(&data);
            assert!(codes.len() > GENERATION || len < 40_000, "no reset for {}", len);

            let mut expected = BitWriter::new();
            for (n, &code) in codes.iter().enumerate() {
                expected.append_bits(u32::from(code), width_of(n % GENERATION + 1));
            }

            let compressed = encode(&data);
            assert_eq!(compressed.bit_count, expected.bit_count());
            assert_eq!(compressed.bytes, expected.release());
        }
    }

    #[test]
    fn encoder_is_reusable() {
        let mut encoder = Encoder::with_writer(BitWriter::with_capacity(16, 3));
        let first = encoder.encode(b"TOBEORNOTTOBEORTOBEORNOT");
        let again = encoder.encode(b"TOBEORNOTTOBEORTOBEORNOT");
        assert_eq!(first, again);
        assert_eq!(encoder.encode(&[]).bit_count, 0);
    }

    #[test]
    fn encode_reader_reads_everything() {
        let data = xorshift(5000, 7);
        let compressed = Encoder::new().encode_reader(&data[..]).unwrap();
        assert_eq!(compressed, encode(&data));
    }
}
