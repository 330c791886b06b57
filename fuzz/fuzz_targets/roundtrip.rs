#![no_main]
use libfuzzer_sys::fuzz_target;
use lzwpack::{decode, encode, frame};

fuzz_target!(|data: &[u8]| {
    let compressed = encode(data);
    assert_eq!(compressed.bytes.len(), (compressed.bit_count + 7) / 8);
    let compare = decode(&compressed.bytes, compressed.bit_count, data.len());
    assert!(data == &*compare);

    let framed = frame::encode(data).unwrap();
    assert_eq!(frame::decode(&framed).unwrap(), data);
});
