#![no_main]
use libfuzzer_sys::fuzz_target;
use veil_pack::decode_value;

fuzz_target!(|data: &[u8]| {
    if let Ok(value) = decode_value(data) {
        // Anything that decodes must re-encode to the same bytes
        assert_eq!(value.to_vec(), data);
    }
});
