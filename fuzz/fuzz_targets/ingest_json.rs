#![no_main]
use carbon_pack::{Document, DocumentOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(doc) = Document::from_json(text, DocumentOptions::default()) {
            let back = Document::from_bytes(doc.into_bytes()).expect("ingested bytes reload");
            let _ = back.to_json_compact();
        }
    }
});
