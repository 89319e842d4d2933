#![no_main]

use libfuzzer_sys::fuzz_target;
use simdvec::{B_QUERY, provider};

fuzz_target!(|data: &[u8]| {
    let d = data.len() / (B_QUERY + 2);
    let (doc, rest) = data.split_at(d);
    let (query, rest) = rest.split_at(d * B_QUERY);
    let other = &rest[..d];

    let scalar = provider::available().remove(0);
    let bin = scalar.ip_byte_bin(query, doc).unwrap();
    let and = scalar.and_bit_count(doc, other).unwrap();
    assert!(bin <= 8 * d as u64 * ((1 << B_QUERY) - 1));

    for util in provider::available().into_iter().skip(1) {
        assert_eq!(util.ip_byte_bin(query, doc).unwrap(), bin);
        assert_eq!(util.and_bit_count(doc, other).unwrap(), and);
    }
});
