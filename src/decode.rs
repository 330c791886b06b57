//! A module for all decoding needs.
use crate::alloc::{boxed::Box, vec, vec::Vec};
use crate::bits::BitReader;
use crate::dict::Dictionary;
use crate::{Code, MAX_ENTRIES, MIN_CODESIZE};

use log::debug;

/// Mirror of the encoder, rebuilding its dictionary from the code stream.
///
/// Every call starts from a fresh dictionary, the value only keeps allocations.
pub struct Decoder {
    /// The table of decoded codes.
    dict: Dictionary,
    /// Scratch space for one reconstructed sequence.
    scratch: Box<[u8]>,
}

/// How a call to [`Decoder::decode_into`] ended.
///
/// [`Decoder::decode_into`]: struct.Decoder.html#method.decode_into
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LzwStatus {
    /// Every bit of the input was consumed.
    Done,
    /// The output buffer filled up before the input ran out.
    OutputFull,
}

/// Progress of a call to [`Decoder::decode_into`].
///
/// [`Decoder::decode_into`]: struct.Decoder.html#method.decode_into
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferResult {
    /// Bits read from the input, including a code that no longer fit the output.
    pub consumed_bits: usize,
    /// Bytes written to the output.
    pub consumed_out: usize,
    pub status: LzwStatus,
}

/// Bounds-checked write cursor over the caller's output.
struct Sink<'o> {
    bytes: &'o mut [u8],
    write_mark: usize,
}

impl Decoder {
    pub fn new() -> Self {
        Decoder {
            dict: Dictionary::new(),
            scratch: vec![0; MAX_ENTRIES].into_boxed_slice(),
        }
    }

    /// Decompress `bit_count` bits of `inp` into a buffer of exactly `expected_len` bytes.
    ///
    /// Bytes the stream does not cover stay zero, output beyond `expected_len` is dropped.
    pub fn decode(&mut self, inp: &[u8], bit_count: usize, expected_len: usize) -> Vec<u8> {
        let mut out = vec![0; expected_len];
        self.decode_into(inp, bit_count, &mut out);
        out
    }

    /// Decompress `bit_count` bits of `inp` into `out`.
    ///
    /// Stops without error when either the input or the output is exhausted. A stream that was
    /// not produced by the encoder is decoded on a best effort basis: a first code above 255
    /// keeps only its low byte and a code past the next free entry is treated as that entry.
    pub fn decode_into(&mut self, inp: &[u8], bit_count: usize, out: &mut [u8]) -> BufferResult {
        self.dict.reset();
        let mut code_size = MIN_CODESIZE;
        let mut reader = BitReader::new(inp, bit_count);
        let mut sink = Sink::new(out);

        // The previous code, `None` at the start of each dictionary generation.
        let mut last: Option<Code> = None;
        // First byte of the sequence written last.
        let mut first_byte = 0u8;
        let mut status = LzwStatus::Done;

        while !reader.is_at_end() {
            let code = reader.read_bits(code_size) as Code;

            let prev = match last {
                Some(prev) => prev,
                None => {
                    let literal = code as u8;
                    if !sink.push(literal) {
                        status = LzwStatus::OutputFull;
                        break;
                    }
                    first_byte = literal;
                    last = Some(Code::from(literal));
                    continue;
                }
            };

            let (code, complete) = if self.dict.contains(code) {
                let sequence = self.dict.reconstruct_into(code, &mut self.scratch);
                first_byte = sequence.first().copied().unwrap_or(first_byte);
                (code, sink.extend(sequence))
            } else {
                // The encoder wrote the entry it was about to add: the previous sequence followed
                // by its own first byte.
                let next = self.dict.len() as Code;
                let sequence = self.dict.reconstruct_into(prev, &mut self.scratch);
                first_byte = sequence.first().copied().unwrap_or(first_byte);
                (next, sink.extend(sequence) && sink.push(first_byte))
            };

            if !complete {
                status = LzwStatus::OutputFull;
                break;
            }

            self.dict.add(prev, first_byte);
            last = if self.dict.grow_or_reset(&mut code_size).is_reset() {
                None
            } else {
                Some(code)
            };
        }

        debug!(
            "decoded {} of {} bits into {} bytes ({:?})",
            reader.consumed(),
            bit_count,
            sink.write_mark,
            status
        );

        BufferResult {
            consumed_bits: reader.consumed(),
            consumed_out: sink.write_mark,
            status,
        }
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl<'o> Sink<'o> {
    fn new(bytes: &'o mut [u8]) -> Self {
        Sink {
            bytes,
            write_mark: 0,
        }
    }

    fn push(&mut self, byte: u8) -> bool {
        match self.bytes.get_mut(self.write_mark) {
            Some(slot) => {
                *slot = byte;
                self.write_mark += 1;
                true
            }
            None => false,
        }
    }

    /// Write as much of `data` as fits, returning whether all of it did.
    fn extend(&mut self, data: &[u8]) -> bool {
        let room = self.bytes.len() - self.write_mark;
        let count = data.len().min(room);
        self.bytes[self.write_mark..][..count].copy_from_slice(&data[..count]);
        self.write_mark += count;
        count == data.len()
    }
}

/// Decompress with a fresh [`Decoder`] into exactly `expected_len` bytes.
///
/// The output is zero padded when the stream is shorter and truncated when it is longer, both
/// silently. Compare against a length or checksum kept elsewhere to detect either case.
///
/// [`Decoder`]: struct.Decoder.html
pub fn decode(inp: &[u8], bit_count: usize, expected_len: usize) -> Vec<u8> {
    Decoder::new().decode(inp, bit_count, expected_len)
}

#[cfg(test)]
mod tests {
    use super::{decode, Decoder, LzwStatus};
    use crate::bits::BitWriter;
    use crate::encode::encode;

    fn codes(codes: &[(u32, u8)]) -> (Vec<u8>, usize) {
        let mut writer = BitWriter::new();
        for &(code, width) in codes {
            writer.append_bits(code, width);
        }
        let bits = writer.bit_count();
        (writer.release(), bits)
    }

    #[test]
    fn empty_stream_is_empty_output() {
        assert!(decode(&[], 0, 0).is_empty());
        let result = Decoder::new().decode_into(&[], 0, &mut []);
        assert_eq!(result.status, LzwStatus::Done);
        assert_eq!(result.consumed_bits, 0);
    }

    #[test]
    fn tobeornot() {
        let data = b"TOBEORNOTTOBEORTOBEORNOT";
        let compressed = encode(data);
        assert!(compressed.bytes.len() < data.len());
        assert_eq!(decode(&compressed.bytes, compressed.bit_count, data.len()), data);
    }

    #[test]
    fn kwkwk_code_is_resolved() {
        // "aaa" is 'a' followed by the entry being defined by that very code.
        let (bytes, bits) = codes(&[(u32::from(b'a'), 9), (256, 9)]);
        assert_eq!(decode(&bytes, bits, 3), b"aaa");

        let (bytes, bits) = codes(&[(u32::from(b'a'), 9), (u32::from(b'b'), 9), (257, 9)]);
        assert_eq!(decode(&bytes, bits, 4), b"abbb");
    }

    #[test]
    fn output_is_truncated_to_expected_length() {
        let data = b"abababababababababababab";
        let compressed = encode(data);
        for len in 0..data.len() {
            let out = decode(&compressed.bytes, compressed.bit_count, len);
            assert_eq!(out, &data[..len]);
        }
    }

    #[test]
    fn short_stream_is_zero_padded() {
        let compressed = encode(b"xyz");
        let out = decode(&compressed.bytes, compressed.bit_count, 6);
        assert_eq!(out, b"xyz\0\0\0");
    }

    #[test]
    fn status_tells_full_from_done() {
        let data = b"hello hello hello";
        let compressed = encode(data);
        let mut decoder = Decoder::new();

        let mut exact = vec![0; data.len()];
        let result = decoder.decode_into(&compressed.bytes, compressed.bit_count, &mut exact);
        assert_eq!(result.status, LzwStatus::Done);
        assert_eq!(result.consumed_out, data.len());
        assert_eq!(result.consumed_bits, compressed.bit_count);

        let mut short = vec![0; 5];
        let result = decoder.decode_into(&compressed.bytes, compressed.bit_count, &mut short);
        assert_eq!(result.status, LzwStatus::OutputFull);
        assert_eq!(result.consumed_out, 5);
        assert!(result.consumed_bits < compressed.bit_count);
        assert_eq!(&short, b"hello");
    }

    #[test]
    fn first_code_keeps_low_byte() {
        let (bytes, bits) = codes(&[(0x141, 9)]);
        assert_eq!(decode(&bytes, bits, 1), [0x41]);
    }

    #[test]
    fn foreign_codes_stay_in_bounds() {
        // Far past the next free entry, then a code referring to what that created.
        let (bytes, bits) = codes(&[(u32::from(b'q'), 9), (500, 9), (256, 9), (511, 9)]);
        let out = decode(&bytes, bits, 16);
        assert_eq!(&out[..7], b"qqqqqqq");
    }

    #[test]
    fn arbitrary_bytes_do_not_panic() {
        let mut state = 0x1234_5678u32;
        let garbage: Vec<u8> = (0..20_000)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                state as u8
            })
            .collect();

        let mut decoder = Decoder::new();
        for &len in &[0, 1, 100, 100_000] {
            let out = decoder.decode(&garbage, garbage.len() * 8 + 17, len);
            assert_eq!(out.len(), len);
        }
    }
}
