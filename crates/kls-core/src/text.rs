//! Text model primitives: sizes, ranges, positions, and conversions.
//!
//! Source text handled by kls is always normalized to `\n` line endings before
//! it reaches the cache, so line lookups only split on `\n`.

pub use text_size::{TextRange, TextSize};

use crate::floor_char_boundary;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

/// LSP-compatible position (UTF-16 code units).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    #[inline]
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// LSP-compatible range (UTF-16 code units).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    #[inline]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    #[inline]
    pub const fn point(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }
}

/// Line start offsets for one text snapshot.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LineIndex {
    line_starts: Vec<TextSize>,
    text_len: TextSize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];
        line_starts.extend(
            text.match_indices('\n')
                .map(|(idx, _)| crate::text_size(idx + 1)),
        );
        Self {
            line_starts,
            text_len: crate::text_size(text.len()),
        }
    }

    #[inline]
    pub fn text_len(&self) -> TextSize {
        self.text_len
    }

    #[inline]
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    #[inline]
    pub fn line_start(&self, line: u32) -> Option<TextSize> {
        self.line_starts.get(line as usize).copied()
    }

    /// End of `line`, excluding its `\n`.
    pub fn line_end(&self, line: u32) -> Option<TextSize> {
        let line = line as usize;
        if line >= self.line_starts.len() {
            return None;
        }
        Some(match self.line_starts.get(line + 1) {
            Some(next) => *next - TextSize::from(1),
            None => self.text_len,
        })
    }

    fn line_of(&self, offset: TextSize) -> usize {
        let offset = offset.min(self.text_len);
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(insert) => insert.saturating_sub(1),
        }
    }

    /// Byte offset to a zero-based line and byte column.
    pub fn line_col(&self, offset: TextSize) -> LineCol {
        let offset = offset.min(self.text_len);
        let line = self.line_of(offset);
        LineCol {
            line: line as u32,
            col: u32::from(offset - self.line_starts[line]),
        }
    }

    /// Byte offset to an LSP position.
    ///
    /// `text` must be the snapshot this index was built from.
    pub fn position(&self, text: &str, offset: TextSize) -> Position {
        debug_assert_eq!(crate::text_size(text.len()), self.text_len);
        let offset = floor_char_boundary(text, u32::from(offset) as usize);
        let line = self.line_of(crate::text_size(offset));
        let start = u32::from(self.line_starts[line]) as usize;
        let character = text[start..offset]
            .chars()
            .map(|c| c.len_utf16() as u32)
            .sum();
        Position {
            line: line as u32,
            character,
        }
    }

    /// LSP position to a byte offset.
    ///
    /// Returns `None` when the line is out of bounds, the character is past the
    /// end of the line, or it points inside a surrogate pair.
    pub fn offset_of_position(&self, text: &str, position: Position) -> Option<TextSize> {
        let start = self.line_start(position.line)?;
        let end = self.line_end(position.line)?;
        let line = &text[u32::from(start) as usize..u32::from(end) as usize];

        let mut utf16 = 0u32;
        for (idx, ch) in line.char_indices() {
            if utf16 == position.character {
                return Some(start + crate::text_size(idx));
            }
            utf16 += ch.len_utf16() as u32;
            if utf16 > position.character {
                return None;
            }
        }
        (utf16 == position.character).then_some(end)
    }

    pub fn range(&self, text: &str, range: TextRange) -> Range {
        Range::new(
            self.position(text, range.start()),
            self.position(text, range.end()),
        )
    }

    pub fn text_range(&self, text: &str, range: Range) -> Option<TextRange> {
        let start = self.offset_of_position(text, range.start)?;
        let end = self.offset_of_position(text, range.end)?;
        (start <= end).then(|| TextRange::new(start, end))
    }
}

/// Human-readable location such as `Main.kt 3:14` (both numbers 1-based).
pub fn describe_position(file_name: &str, text: &str, offset: TextSize) -> String {
    let pos = LineIndex::new(text).position(text, offset);
    format!("{file_name} {}:{}", pos.line + 1, pos.character + 1)
}

/// The part of the line containing `offset` that precedes it.
pub fn line_before(text: &str, offset: TextSize) -> &str {
    let offset = floor_char_boundary(text, u32::from(offset) as usize);
    let before = &text[..offset];
    match before.rfind('\n') {
        Some(idx) => &before[idx + 1..],
        None => before,
    }
}

/// The part of the line containing `offset` that follows it.
pub fn line_after(text: &str, offset: TextSize) -> &str {
    let offset = floor_char_boundary(text, u32::from(offset) as usize);
    let after = &text[offset..];
    match after.find('\n') {
        Some(idx) => &after[..idx],
        None => after,
    }
}

#[cfg(feature = "lsp")]
mod lsp_compat {
    use super::{Position, Range};

    impl From<Position> for lsp_types::Position {
        fn from(value: Position) -> Self {
            lsp_types::Position::new(value.line, value.character)
        }
    }

    impl From<lsp_types::Position> for Position {
        fn from(value: lsp_types::Position) -> Self {
            Position::new(value.line, value.character)
        }
    }

    impl From<Range> for lsp_types::Range {
        fn from(value: Range) -> Self {
            lsp_types::Range::new(value.start.into(), value.end.into())
        }
    }

    impl From<lsp_types::Range> for Range {
        fn from(value: lsp_types::Range) -> Self {
            Range::new(value.start.into(), value.end.into())
        }
    }

}
