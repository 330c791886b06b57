//! A minimal container for storing a code stream together with what it does not record.
//!
//! Layout, all integers little endian:
//!
//! | offset | size | content                 |
//! |--------|------|-------------------------|
//! | 0      | 4    | uncompressed length     |
//! | 4      | 4    | code stream bit count   |
//! | 8      | n    | code stream, n = ⌈bits/8⌉ |
use crate::alloc::vec::Vec;

use crate::{LITERAL_COUNT, MAX_ENTRIES, MIN_CODESIZE};

use log::debug;
use thiserror::Error;

/// Size of the fixed header.
pub const HEADER_LEN: usize = 8;

/// Longest sequence a single code can stand for.
const MAX_EXPANSION: u64 = (MAX_ENTRIES - LITERAL_COUNT + 1) as u64;

/// The out-of-band values the decoder needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub uncompressed_len: u32,
    pub bit_count: u32,
}

/// Errors when building or reading a frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },
    #[error("{0} does not fit into a 32-bit frame header")]
    TooLarge(usize),
    #[error("frame claims {uncompressed_len} bytes but {bit_count} bits cannot decode to that")]
    Inconsistent { uncompressed_len: u32, bit_count: u32 },
}

impl Header {
    /// Split `bytes` into the header and the code stream it describes.
    ///
    /// Bytes after the code stream are ignored. A length no code stream of the declared bit count
    /// could produce is rejected before anything is allocated for it.
    pub fn parse(bytes: &[u8]) -> Result<(Header, &[u8]), FrameError> {
        let fixed = bytes.get(..HEADER_LEN).ok_or(FrameError::Truncated {
            needed: HEADER_LEN,
            available: bytes.len(),
        })?;
        let word = |at: usize| {
            u32::from_le_bytes([fixed[at], fixed[at + 1], fixed[at + 2], fixed[at + 3]])
        };
        let header = Header {
            uncompressed_len: word(0),
            bit_count: word(4),
        };

        let body = &bytes[HEADER_LEN..];
        let payload_len = header.payload_len();
        if body.len() < payload_len {
            return Err(FrameError::Truncated {
                needed: HEADER_LEN + payload_len,
                available: bytes.len(),
            });
        }
        if u64::from(header.uncompressed_len) > header.max_decoded_len() {
            return Err(FrameError::Inconsistent {
                uncompressed_len: header.uncompressed_len,
                bit_count: header.bit_count,
            });
        }
        if body.len() > payload_len {
            debug!("ignoring {} trailing bytes after frame", body.len() - payload_len);
        }

        Ok((header, &body[..payload_len]))
    }

    /// Number of code stream bytes following the header.
    pub fn payload_len(&self) -> usize {
        (self.bit_count as usize).div_ceil(8)
    }

    /// Upper bound on the bytes the code stream can decode to.
    ///
    /// Every code takes at least nine bits and stands for at most one dictionary chain.
    pub fn max_decoded_len(&self) -> u64 {
        (u64::from(self.bit_count) / u64::from(MIN_CODESIZE) + 1) * MAX_EXPANSION
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.uncompressed_len.to_le_bytes());
        out.extend_from_slice(&self.bit_count.to_le_bytes());
    }
}

/// Compress `data` into a self-describing frame.
pub fn encode(data: &[u8]) -> Result<Vec<u8>, FrameError> {
    let uncompressed_len =
        u32::try_from(data.len()).map_err(|_| FrameError::TooLarge(data.len()))?;
    let compressed = crate::encode::encode(data);
    let bit_count = u32::try_from(compressed.bit_count)
        .map_err(|_| FrameError::TooLarge(compressed.bit_count))?;

    let header = Header {
        uncompressed_len,
        bit_count,
    };
    let mut out = Vec::with_capacity(HEADER_LEN + compressed.bytes.len());
    header.write_to(&mut out);
    out.extend_from_slice(&compressed.bytes);
    Ok(out)
}

/// Restore the data of a frame built by [`encode`].
///
/// A damaged code stream is not detected, only a frame too short for its header.
///
/// [`encode`]: fn.encode.html
pub fn decode(bytes: &[u8]) -> Result<Vec<u8>, FrameError> {
    let (header, payload) = Header::parse(bytes)?;
    let bit_count = header.bit_count as usize;
    let expected_len = header.uncompressed_len as usize;
    Ok(crate::decode::decode(payload, bit_count, expected_len))
}

#[cfg(test)]
mod tests {
    use super::{decode, encode, FrameError, Header, HEADER_LEN};

    #[test]
    fn frame_roundtrip() {
        let data = b"It was the best of times, it was the worst of times";
        let frame = encode(data).unwrap();
        let (header, payload) = Header::parse(&frame).unwrap();
        assert_eq!(header.uncompressed_len as usize, data.len());
        assert_eq!(payload.len(), frame.len() - HEADER_LEN);
        assert_eq!(decode(&frame).unwrap(), data);
    }

    #[test]
    fn empty_frame() {
        let frame = encode(&[]).unwrap();
        assert_eq!(frame, [0; HEADER_LEN]);
        assert!(decode(&frame).unwrap().is_empty());
    }

    #[test]
    fn header_layout_is_little_endian() {
        let mut out = vec![];
        Header {
            uncompressed_len: 0x0403_0201,
            bit_count: 9,
        }
        .write_to(&mut out);
        assert_eq!(out, [1, 2, 3, 4, 9, 0, 0, 0]);
    }

    #[test]
    fn truncation_is_reported() {
        assert_eq!(
            decode(&[1, 2, 3]),
            Err(FrameError::Truncated {
                needed: HEADER_LEN,
                available: 3
            })
        );

        let frame = encode(b"abcdefgh").unwrap();
        let short = &frame[..frame.len() - 1];
        assert_eq!(
            decode(short),
            Err(FrameError::Truncated {
                needed: frame.len(),
                available: frame.len() - 1
            })
        );
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut frame = encode(b"payload").unwrap();
        frame.extend_from_slice(b"junk");
        assert_eq!(decode(&frame).unwrap(), b"payload");
    }

    #[test]
    fn length_beyond_code_stream_is_rejected() {
        let hostile = [0xff, 0xff, 0xff, 0xff, 0, 0, 0, 0];
        assert_eq!(
            decode(&hostile),
            Err(FrameError::Inconsistent {
                uncompressed_len: u32::MAX,
                bit_count: 0
            })
        );

        // Nine bits hold a single code, the bound leaves room for one more chain.
        let mut frame = vec![];
        Header {
            uncompressed_len: 2 * 3841 + 1,
            bit_count: 9,
        }
        .write_to(&mut frame);
        frame.extend_from_slice(&[b'a', 0]);
        assert!(matches!(decode(&frame), Err(FrameError::Inconsistent { .. })));
    }

    #[test]
    fn longest_possible_expansion_is_accepted() {
        // A run of one byte grows the match by one per code, the table never resets.
        let data = vec![7u8; 200_000];
        let frame = encode(&data).unwrap();
        let (header, _) = Header::parse(&frame).unwrap();
        assert!(u64::from(header.uncompressed_len) <= header.max_decoded_len());
        assert_eq!(decode(&frame).unwrap(), data);

        let mut padded = vec![];
        Header {
            uncompressed_len: 3841,
            bit_count: 0,
        }
        .write_to(&mut padded);
        assert_eq!(decode(&padded).unwrap(), vec![0; 3841]);
    }

    #[test]
    fn error_messages() {
        let err = FrameError::Truncated {
            needed: 8,
            available: 2,
        };
        assert_eq!(err.to_string(), "frame truncated: need 8 bytes, have 2");
        assert_eq!(
            FrameError::TooLarge(usize::MAX).to_string(),
            format!("{} does not fit into a 32-bit frame header", usize::MAX)
        );
        let err = FrameError::Inconsistent {
            uncompressed_len: 100_000,
            bit_count: 18,
        };
        assert_eq!(
            err.to_string(),
            "frame claims 100000 bytes but 18 bits cannot decode to that"
        );
    }
}
