#![no_main]

use libfuzzer_sys::fuzz_target;

mod utils;

fuzz_target!(|data: &[u8]| {
    let Some(cursor) = utils::le_u32(data) else {
        return;
    };
    let Some(text) = utils::truncate_utf8(&data[4..]) else {
        return;
    };

    // Split the input into an old and a new text at the first NUL.
    let (old, new) = text.split_once('\0').unwrap_or((text, ""));
    let cursor = cursor % (new.len() as u32 + 1);

    let mapped = kls_core::old_offset(old, new, cursor.into());
    let mapped = u32::from(mapped) as usize;
    assert!(mapped <= old.len());
    assert!(old.is_char_boundary(mapped));

    if let Some(region) = kls_core::changed_region(old, new) {
        assert!(region.old.end() <= kls_core::text_size(old.len()));
        assert!(region.new.end() <= kls_core::text_size(new.len()));
        assert_eq!(region.old.start(), region.new.start());
    } else {
        assert_eq!(old, new);
    }
});
