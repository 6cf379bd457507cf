use std::path::Path;
use std::sync::Arc;

use rowan::{GreenNode, TokenAtOffset};
use text_size::{TextRange, TextSize};

use crate::syntax_kind::{SyntaxElement, SyntaxNode, SyntaxToken};
use crate::ParseError;

/// One parse of one file: the tree, the exact text it was built from, and the
/// path used to name the file in messages.
///
/// Trees are lossless, so `syntax().text() == text()` always holds; the text is
/// kept alongside the tree because it is the cache's staleness key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFile {
    path: Arc<Path>,
    text: Arc<str>,
    green: GreenNode,
    errors: Vec<ParseError>,
}

impl ParsedFile {
    pub fn new(path: Arc<Path>, text: Arc<str>, green: GreenNode, errors: Vec<ParseError>) -> Self {
        Self {
            path,
            text,
            green,
            errors,
        }
    }

    /// Parse `text` with the bundled Kotlin parser.
    pub fn parse(path: impl Into<Arc<Path>>, text: impl Into<Arc<str>>) -> Self {
        let text = text.into();
        let (green, errors) = crate::parser::parse(&text);
        Self::new(path.into(), text, green, errors)
    }

    pub fn path(&self) -> &Arc<Path> {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
    }

    pub fn is_script(&self) -> bool {
        self.path.extension().is_some_and(|ext| ext == "kts")
    }

    pub fn text(&self) -> &Arc<str> {
        &self.text
    }

    pub fn green(&self) -> &GreenNode {
        &self.green
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    /// The leaf at `offset`. On a boundary between two tokens the one starting
    /// at `offset` wins; at the end of the file the last token is returned.
    pub fn element_at(&self, offset: TextSize) -> Option<SyntaxToken> {
        let root = self.syntax();
        if offset > root.text_range().end() {
            return None;
        }
        match root.token_at_offset(offset) {
            TokenAtOffset::None => None,
            TokenAtOffset::Single(token) => Some(token),
            TokenAtOffset::Between(_, right) => Some(right),
        }
    }

    pub fn covering_element(&self, range: TextRange) -> SyntaxElement {
        self.syntax().covering_element(range)
    }
}
