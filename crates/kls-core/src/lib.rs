//! Core shared types for kls: text sizes, positions, line lookups and the
//! old/new text offset translation used by the incremental cache.
//!
//! This crate is intentionally small; it only depends on `text-size`.

pub mod diff;
pub mod text;

pub use diff::{changed_region, old_offset, ChangedRegion};
pub use text::{
    describe_position, line_after, line_before, LineCol, LineIndex, Position, Range, TextRange,
    TextSize,
};

/// Clamp `offset` to `text` and move it back to the closest char boundary.
pub fn floor_char_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while offset > 0 && !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Convert a `usize` length into a [`TextSize`], saturating at `u32::MAX`.
#[inline]
pub fn text_size(len: usize) -> TextSize {
    TextSize::from(u32::try_from(len).unwrap_or(u32::MAX))
}
