#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Decoding must never panic, for any byte soup and any channel count,
    // and a successful decode must re-encode to the identical bytes.
    for channels in 0..8 {
        if let Some(counts) = winch_core::record::decode(data, channels) {
            assert_eq!(winch_core::record::encode(&counts), data);
        }
    }
});
