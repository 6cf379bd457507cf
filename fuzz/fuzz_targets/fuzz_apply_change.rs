#![no_main]

use kls_core::{Position, Range};
use kls_vfs::{apply_change, ContentChange};
use libfuzzer_sys::fuzz_target;

mod utils;

fn position(data: &[u8]) -> Position {
    Position::new(u32::from(data[0] % 8), u32::from(data[1]))
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 6 {
        return;
    }
    let start = position(&data[0..2]);
    let end = position(&data[2..4]);
    let range_length = (data[4] & 1 == 1).then_some(u32::from(data[5]));
    let Some(text) = utils::truncate_utf8(&data[6..]) else {
        return;
    };

    let (old, replacement) = text.split_once('\0').unwrap_or((text, "x"));
    let old = kls_vfs::normalize_line_endings(old);

    let mut change = ContentChange::replace(Range::new(start, end), replacement);
    change.range_length = range_length;

    // Positions are clamped, so the only error is an inverted range without a
    // length.
    match apply_change(&old, &change) {
        Ok(new) => assert!(!new.contains('\r')),
        Err(_) => assert!(range_length.is_none() && end < start),
    }
});
