#![no_main]

use libfuzzer_sys::fuzz_target;

mod utils;

fuzz_target!(|data: &[u8]| {
    let Some(text) = utils::truncate_utf8(data) else {
        return;
    };

    let parsed = kls_syntax::ParsedFile::parse(std::path::Path::new("Fuzz.kt"), text);

    // Trees are lossless.
    assert_eq!(parsed.syntax().text().to_string(), text);

    let len = kls_core::text_size(text.len());
    let _ = parsed.element_at(len);
    let _ = parsed.element_at(0.into());
});
