use std::borrow::Cow;
use std::sync::Arc;

use kls_core::{Position, Range};

/// An LSP-style content change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChange {
    /// The range of text to replace. If `None`, the entire document is replaced.
    pub range: Option<Range>,
    /// Length of the replaced text in UTF-16 code units. When present it
    /// decides how much old text is skipped; `range.end` is then ignored.
    pub range_length: Option<u32>,
    /// Replacement text.
    pub text: String,
}

impl ContentChange {
    pub fn full(text: impl Into<String>) -> Self {
        Self {
            range: None,
            range_length: None,
            text: text.into(),
        }
    }

    pub fn replace(range: Range, text: impl Into<String>) -> Self {
        Self {
            range: Some(range),
            range_length: None,
            text: text.into(),
        }
    }

    pub fn with_range_length(mut self, range_length: u32) -> Self {
        self.range_length = Some(range_length);
        self
    }
}

#[cfg(feature = "lsp")]
impl From<lsp_types::TextDocumentContentChangeEvent> for ContentChange {
    #[allow(deprecated)]
    fn from(value: lsp_types::TextDocumentContentChangeEvent) -> Self {
        Self {
            range: value.range.map(Into::into),
            range_length: value.range_length,
            text: value.text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("version {received} is not newer than {current}")]
    StaleVersion { current: i32, received: i32 },
    #[error("range end {end:?} precedes start {start:?}")]
    InvertedRange { start: Position, end: Position },
}

/// The text of one tracked file with its edit version.
///
/// Disk-loaded documents use version `-1`; every accepted edit carries a
/// strictly greater version than the one before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    text: Arc<str>,
    version: i32,
}

impl Document {
    pub const DISK_VERSION: i32 = -1;

    /// Line endings are normalized to `\n`.
    pub fn new(text: &str, version: i32) -> Self {
        Self {
            text: normalize_line_endings(text).into(),
            version,
        }
    }

    pub fn from_disk(text: &str) -> Self {
        Self::new(text, Self::DISK_VERSION)
    }

    pub fn text(&self) -> &Arc<str> {
        &self.text
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    /// Applies `changes` in order. Nothing is modified when the version is not
    /// newer or when any change is malformed.
    pub fn apply_changes(
        &mut self,
        new_version: i32,
        changes: &[ContentChange],
    ) -> Result<(), DocumentError> {
        if new_version <= self.version {
            return Err(DocumentError::StaleVersion {
                current: self.version,
                received: new_version,
            });
        }

        let mut text = self.text.to_string();
        for change in changes {
            text = apply_change(&text, change)?;
        }

        self.text = text.into();
        self.version = new_version;
        Ok(())
    }
}

/// Applies one change to `text`.
///
/// A ranged change keeps every line before `range.start.line` and the first
/// `range.start.character` code units of the start line, inserts the
/// replacement, skips `range_length` code units of old text (or up to
/// `range.end`), and keeps the remainder.
pub fn apply_change(text: &str, change: &ContentChange) -> Result<String, DocumentError> {
    let replacement = normalize_line_endings(&change.text);
    let Some(range) = change.range else {
        return Ok(replacement.into_owned());
    };

    let start = offset_of(text, range.start);
    let end = match change.range_length {
        Some(len) => advance_utf16(text, start, len),
        None if range.end < range.start => {
            return Err(DocumentError::InvertedRange {
                start: range.start,
                end: range.end,
            })
        }
        None => offset_of(text, range.end),
    };

    let mut out = String::with_capacity(text.len() - (end - start) + replacement.len());
    out.push_str(&text[..start]);
    out.push_str(&replacement);
    out.push_str(&text[end..]);
    Ok(out)
}

pub fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Byte offset of `position`, clamped: lines past the end map to the end of
/// the text, characters past the end of a line map to the line end, and a
/// character inside a surrogate pair maps to the start of that char.
fn offset_of(text: &str, position: Position) -> usize {
    let mut line_start = 0;
    for _ in 0..position.line {
        match text[line_start..].find('\n') {
            Some(idx) => line_start += idx + 1,
            None => return text.len(),
        }
    }
    let line_end = text[line_start..]
        .find('\n')
        .map_or(text.len(), |idx| line_start + idx);
    line_start + utf16_prefix_len(&text[line_start..line_end], position.character)
}

/// Byte offset reached by moving `units` UTF-16 code units forward from
/// `from`, crossing line breaks, clamped to the end of the text.
fn advance_utf16(text: &str, from: usize, units: u32) -> usize {
    from + utf16_prefix_len(&text[from..], units)
}

fn utf16_prefix_len(text: &str, units: u32) -> usize {
    let mut col = 0u32;
    for (idx, ch) in text.char_indices() {
        let len = ch.len_utf16() as u32;
        if col + len > units {
            return idx;
        }
        col += len;
    }
    text.len()
}
