use kls_core::TextSize;

pub const CURSOR_MARKER: &str = "$0";

/// Removes the `$0` marker from `fixture` and returns the text and the marker
/// offset.
///
/// # Panics
///
/// Panics if the fixture has no marker or more than one.
pub fn extract_cursor(fixture: &str) -> (String, TextSize) {
    let offset = fixture
        .find(CURSOR_MARKER)
        .expect("fixture missing $0 marker");
    let mut text = String::with_capacity(fixture.len());
    text.push_str(&fixture[..offset]);
    text.push_str(&fixture[offset + CURSOR_MARKER.len()..]);
    assert!(
        !text.contains(CURSOR_MARKER),
        "fixture has more than one $0 marker"
    );
    (text, TextSize::from(offset as u32))
}

/// Offset of the `nth` (0-based) occurrence of `needle` in `text`.
///
/// # Panics
///
/// Panics if there are fewer occurrences.
pub fn offset_of(text: &str, needle: &str, nth: usize) -> TextSize {
    let (offset, _) = text
        .match_indices(needle)
        .nth(nth)
        .unwrap_or_else(|| panic!("{needle:?} occurs fewer than {} times", nth + 1));
    TextSize::from(offset as u32)
}
