//! Prefix/suffix diffing between the last compiled text and the live text.
//!
//! The translation is approximate on purpose: it is O(n) in the text length,
//! never fails, and only has to be good enough to pick a recovery target.
//! Offsets inside the changed region are interpolated linearly between the old
//! and new region lengths.

use crate::text::{TextRange, TextSize};
use crate::{floor_char_boundary, text_size};

/// The single region that differs between two texts, in both coordinate
/// spaces. Both ranges start at the end of the common prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangedRegion {
    pub old: TextRange,
    pub new: TextRange,
}

/// Returns `None` when `old == new`.
///
/// The common prefix and common suffix are measured independently and may
/// overlap (for example `"aa"` to `"aaa"`); the region ends are clamped so they
/// never precede the prefix.
pub fn changed_region(old: &str, new: &str) -> Option<ChangedRegion> {
    if old == new {
        return None;
    }

    let prefix = common_prefix_len(old, new);
    let suffix = common_suffix_len(old, new);
    let old_end = (old.len() - suffix).max(prefix);
    let new_end = (new.len() - suffix).max(prefix);

    Some(ChangedRegion {
        old: TextRange::new(text_size(prefix), text_size(old_end)),
        new: TextRange::new(text_size(prefix), text_size(new_end)),
    })
}

/// Map `cursor`, an offset into `new`, back to the matching offset in `old`.
///
/// Offsets up to the start of the changed region map to themselves, offsets in
/// the common suffix keep their distance from the end of the text, and offsets
/// strictly inside the changed region are scaled by `old_len / new_len`. The
/// result is always a char boundary of `old`.
pub fn old_offset(old: &str, new: &str, cursor: TextSize) -> TextSize {
    let cursor = u32::from(cursor) as usize;
    let Some(region) = changed_region(old, new) else {
        return text_size(floor_char_boundary(old, cursor));
    };

    let new_start = u32::from(region.new.start()) as usize;
    let new_end = u32::from(region.new.end()) as usize;

    let mapped = if cursor <= new_start {
        cursor
    } else if cursor < new_end {
        let old_start = u32::from(region.old.start()) as u64;
        let old_len = u32::from(region.old.len()) as u64;
        let new_len = (new_end - new_start) as u64;
        let delta = (cursor - new_start) as u64 * old_len / new_len;
        (old_start + delta) as usize
    } else {
        old.len().saturating_sub(new.len().saturating_sub(cursor))
    };

    text_size(floor_char_boundary(old, mapped))
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    let len = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    floor_char_boundary(a, len)
}

fn common_suffix_len(a: &str, b: &str) -> usize {
    let mut len = a
        .bytes()
        .rev()
        .zip(b.bytes().rev())
        .take_while(|(x, y)| x == y)
        .count();
    while len > 0 && !a.is_char_boundary(a.len() - len) {
        len -= 1;
    }
    len
}
