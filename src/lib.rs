//! # Headerless LZW encoder and decoder
//!
//! This crate packs opaque byte payloads with a 12-bit LZW variant that carries no clear code,
//! no end code and no header. Codes are written least significant bit first. Code width starts
//! at 9 bits and the dictionary resets to its 256 literal entries once it would need 13 bits.
//!
//! ## Synchronisation contract
//!
//! The decoder rebuilds the dictionary from the code stream alone. Nothing in the stream tells it
//! when the code width changes or when the dictionary starts over, so both sides must apply the
//! exact same rule at the exact same symbol:
//!
//!  * The encoder writes a code with the width in effect *before* that symbol touches the
//!    dictionary. Only afterwards does it check `size == 1 << width` to widen (or reset), and it
//!    adds the new entry only if no reset happened.
//!  * The decoder reads a code, adds the entry the encoder added one symbol earlier, and then runs
//!    the same check. After a reset the next code is a bare literal.
//!
//! Widening or resetting one symbol early or late does not fail loudly, it corrupts everything
//! that follows. The boundaries (512, 1024, 2048 and 4096 entries) are covered by the tests in
//! `encode` and in `tests/implicit_reset.rs`.
//!
//! The stream does not carry the uncompressed length either. Callers store it (and the exact bit
//! count) out of band, for example with the small container in [`frame`].
//!
//! ```
//! let data = b"TOBEORNOTTOBEORTOBEORNOT";
//! let compressed = lzwpack::encode(data);
//! let restored = lzwpack::decode(&compressed.bytes, compressed.bit_count, data.len());
//! assert_eq!(restored, data);
//! ```
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

#[cfg(feature = "alloc")]
extern crate alloc;

/// The widest code the stream ever uses.
pub const MAX_CODESIZE: u8 = 12;
/// The code width at the start of every dictionary generation.
pub const MIN_CODESIZE: u8 = 9;
/// Capacity of the dictionary.
pub const MAX_ENTRIES: usize = 1 << MAX_CODESIZE as usize;
/// Number of literal entries, one per byte value.
pub const LITERAL_COUNT: usize = 256;

/// Alias for a LZW code point
pub type Code = u16;

#[cfg(feature = "alloc")]
pub mod base64;
#[cfg(feature = "alloc")]
pub mod bits;
#[cfg(feature = "alloc")]
pub mod decode;
#[cfg(feature = "alloc")]
pub mod dict;
#[cfg(feature = "alloc")]
pub mod encode;
#[cfg(feature = "alloc")]
pub mod frame;

#[cfg(feature = "alloc")]
pub use crate::decode::{decode, Decoder};
#[cfg(feature = "alloc")]
pub use crate::encode::{encode, Compressed, Encoder};
