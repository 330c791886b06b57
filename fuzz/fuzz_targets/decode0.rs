#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|raw_data: &[u8]| {
    // The first two bytes pick the output length, the rest is an arbitrary code stream.
    let (len, stream) = match raw_data {
        [a, b, rest @ ..] => (usize::from(u16::from_le_bytes([*a, *b])), rest),
        _ => return,
    };
    let out = lzwpack::decode(stream, stream.len() * 8, len);
    assert_eq!(out.len(), len);

    let _ = lzwpack::frame::decode(raw_data);
    let _ = lzwpack::base64::decode(raw_data);
});
