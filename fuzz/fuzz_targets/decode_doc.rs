#![no_main]
use carbon_pack::Document;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(doc) = Document::from_bytes(Vec::from(data)) {
        let _ = doc.to_json_compact();
    }
});
