use kls_core::{text_size, LineIndex, Range};
use kls_vfs::{apply_change, ContentChange};
use proptest::prelude::*;

fn arb_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            8 => prop::sample::select(vec!['a', 'b', ' ', '=', '1']),
            2 => Just('\n'),
            1 => Just('é'),
            1 => Just('😀'),
        ],
        0..40,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

/// A text with a replaced span given as byte offsets on char boundaries.
fn arb_splice() -> impl Strategy<Value = (String, usize, usize, String)> {
    (arb_text(), arb_text(), any::<prop::sample::Index>(), any::<prop::sample::Index>())
        .prop_map(|(text, replacement, a, b)| {
            let boundaries: Vec<usize> = text
                .char_indices()
                .map(|(i, _)| i)
                .chain(std::iter::once(text.len()))
                .collect();
            let x = *a.get(&boundaries);
            let y = *b.get(&boundaries);
            (text, x.min(y), x.max(y), replacement)
        })
}

fn expected(text: &str, start: usize, end: usize, replacement: &str) -> String {
    format!("{}{}{}", &text[..start], replacement, &text[end..])
}

fn range_of(text: &str, start: usize, end: usize) -> Range {
    let index = LineIndex::new(text);
    Range::new(
        index.position(text, text_size(start)),
        index.position(text, text_size(end)),
    )
}

proptest! {
    #[test]
    fn ranged_splice_matches_full_replacement((text, start, end, replacement) in arb_splice()) {
        let change = ContentChange::replace(range_of(&text, start, end), replacement.clone());
        let spliced = apply_change(&text, &change).unwrap();
        let full = apply_change(&text, &ContentChange::full(expected(&text, start, end, &replacement))).unwrap();
        prop_assert_eq!(spliced, full);
    }

    #[test]
    fn range_length_overrides_the_range_end((text, start, end, replacement) in arb_splice()) {
        let length = text[start..end].encode_utf16().count() as u32;
        let mut range = range_of(&text, start, end);
        range.end = range.start;
        let change = ContentChange::replace(range, replacement.clone()).with_range_length(length);
        let spliced = apply_change(&text, &change).unwrap();
        prop_assert_eq!(spliced, expected(&text, start, end, &replacement));
    }
}
