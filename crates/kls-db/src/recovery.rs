//! Narrow reparsing around the cursor.
//!
//! When the live text has moved past the last compiled tree, point queries do
//! not wait for a whole-file compile. Instead the smallest declaration of the
//! compiled tree that encloses the edit is cut out of the live text, padded
//! with spaces so every offset stays absolute, and parsed on its own.

use std::path::Path;
use std::sync::Arc;

use kls_core::{changed_region, describe_position, old_offset, LineIndex, TextRange, TextSize};
use kls_syntax::ast::{AstNode, Parameter};
use kls_syntax::{ParsedFile, SyntaxKind, SyntaxNode, SyntaxToken};

const PARAMETER_PREFIX: &str = "val ";
const CLASS_NAME_PREFIX: &str = "val x: ";

/// The piece of live text chosen for reparsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryWindow {
    /// Range of the enclosing declaration in the compiled text.
    pub declaration_range: TextRange,
    /// Fragment text without padding, including any synthesized prefix.
    pub text: String,
    /// Number of padding spaces; the fragment starts at this offset.
    pub offset: usize,
}

impl RecoveryWindow {
    pub fn padded_text(&self) -> String {
        let mut padded = " ".repeat(self.offset);
        padded.push_str(&self.text);
        padded
    }
}

/// A freshly parsed fragment and the element under the cursor in it.
#[derive(Debug, Clone)]
pub struct Recovery {
    pub file: Arc<ParsedFile>,
    pub element: SyntaxNode,
    pub window: RecoveryWindow,
}

/// Parses the region around `cursor` (an offset into `content`) afresh.
///
/// With `as_reference`, declarations are rewritten into forms whose name is a
/// reference: an untyped parameter `a: Int` becomes `val a: Int`, and a class
/// name `A` becomes `val x: A`. Both rewrites need room before the fragment
/// for their prefix and are skipped otherwise.
///
/// `parse` receives the fragment file name (`dummy.virtual.kt`, or `.kts` for
/// scripts) and the padded text.
pub fn parse_at_point(
    compiled: &ParsedFile,
    content: &str,
    cursor: TextSize,
    as_reference: bool,
    parse: impl FnOnce(&Path, &str) -> ParsedFile,
) -> Option<Recovery> {
    let old_text = compiled.text();
    let old_cursor = old_offset(old_text, content, cursor);
    let old_changed = changed_region(old_text, content)
        .map(|region| region.old)
        .unwrap_or_else(|| TextRange::empty(cursor));

    let Some(token) = compiled.element_at(old_cursor) else {
        tracing::info!(
            target: "kls.db",
            "Couldn't find anything at {}",
            describe_position(compiled.file_name(), content, cursor)
        );
        return None;
    };
    let declaration = token
        .parent_ancestors()
        .find(|node| node.kind().is_declaration() && node.text_range().contains_range(old_changed));

    let window = recovery_window(compiled, content, &token, declaration.as_ref(), as_reference)?;
    tracing::info!(
        target: "kls.db",
        "Re-parsing {}",
        describe_range(compiled, window.declaration_range)
    );

    let name = if compiled.is_script() {
        "dummy.virtual.kts"
    } else {
        "dummy.virtual.kt"
    };
    let file = Arc::new(parse(Path::new(name), &window.padded_text()));
    let element = file.element_at(cursor).and_then(|token| token.parent())?;
    Some(Recovery {
        file,
        element,
        window,
    })
}

fn recovery_window(
    compiled: &ParsedFile,
    content: &str,
    token: &SyntaxToken,
    declaration: Option<&SyntaxNode>,
    as_reference: bool,
) -> Option<RecoveryWindow> {
    let declaration_kind = declaration.map(SyntaxNode::kind);

    if as_reference
        && declaration_kind == Some(SyntaxKind::ClassDeclaration)
        && token.kind() == SyntaxKind::Identifier
    {
        let start = u32::from(token.text_range().start()) as usize;
        if let Some(offset) = start.checked_sub(CLASS_NAME_PREFIX.len()) {
            return Some(RecoveryWindow {
                declaration_range: token.text_range(),
                text: format!("{CLASS_NAME_PREFIX}{}", token.text()),
                offset,
            });
        }
    }

    let range = declaration.map_or_else(|| compiled.syntax().text_range(), SyntaxNode::text_range);
    let start = u32::from(range.start()) as usize;
    let tail = compiled.text().len() - u32::from(range.end()) as usize;
    let end = content.len().checked_sub(tail)?;
    if end < start || !content.is_char_boundary(start) || !content.is_char_boundary(end) {
        tracing::info!(
            target: "kls.db",
            "Couldn't recover {} from the current text",
            describe_range(compiled, range)
        );
        return None;
    }

    let mut text = content[start..end].to_string();
    let mut offset = start;
    let untyped_parameter = as_reference
        && declaration
            .cloned()
            .and_then(Parameter::cast)
            .is_some_and(|parameter| !parameter.has_val_or_var());
    if untyped_parameter {
        if let Some(prefixed) = offset.checked_sub(PARAMETER_PREFIX.len()) {
            text.insert_str(0, PARAMETER_PREFIX);
            offset = prefixed;
        }
    }

    Some(RecoveryWindow {
        declaration_range: range,
        text,
        offset,
    })
}

/// `Main.kt 2:5-3:1` style description of a range of the compiled text.
fn describe_range(compiled: &ParsedFile, range: TextRange) -> String {
    let text = compiled.text();
    let index = LineIndex::new(text);
    let end = index.position(text, range.end());
    format!(
        "{}-{}:{}",
        describe_position(compiled.file_name(), text, range.start()),
        end.line + 1,
        end.character + 1
    )
}
