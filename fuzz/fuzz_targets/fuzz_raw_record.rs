#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(record) = serde_json::from_slice::<boleto::core::RawRecord>(data) {
        let options = boleto::core::MappingOptions::default();
        if let Ok(request) = record.to_request(&options) {
            let _ = request.to_json();
        }
    }
});
