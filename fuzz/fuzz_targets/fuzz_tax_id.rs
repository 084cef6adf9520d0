#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok((identity, kind)) = boleto::core::validate_tax_id(s) {
            assert_eq!(identity.len(), kind.digit_count());
            assert!(identity.bytes().all(|b| b.is_ascii_digit()));
        }
    }
});
