//! Lossless syntax trees for Kotlin sources.
//!
//! The tree is built with `rowan`: a [`SyntaxNode`] is a cheap cursor into an
//! immutable green tree, so parse results can be shared across threads and
//! compared by text. [`ParsedFile`] is the unit the cache stores per file.
//!
//! The bundled parser covers the subset of Kotlin the engine's tests and
//! reference frontend need: packages, imports, classes with primary
//! constructors, functions, properties and the usual expression forms
//! (calls, member access, safe calls, binary and prefix operators, `if`,
//! `return`, blocks).

pub mod ast;
mod lexer;
mod parsed;
mod parser;
mod syntax_kind;

pub use lexer::{lex, Token};
pub use parsed::ParsedFile;
pub use parser::parse;
pub use syntax_kind::{KotlinLanguage, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};
pub use text_size::{TextRange, TextSize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub range: TextRange,
}

/// The innermost node around `token` whose kind satisfies `pred`.
pub fn find_parent(token: &SyntaxToken, pred: impl Fn(SyntaxKind) -> bool) -> Option<SyntaxNode> {
    token.parent_ancestors().find(|node| pred(node.kind()))
}

/// The innermost expression containing `token`.
pub fn parent_expression(token: &SyntaxToken) -> Option<SyntaxNode> {
    find_parent(token, SyntaxKind::is_expression)
}

/// Indented `Kind@range` dump of a tree, used in tests and debug logging.
pub fn debug_tree(node: &SyntaxNode) -> String {
    let mut out = String::new();
    let mut depth = 0usize;
    for event in node.preorder_with_tokens() {
        match event {
            rowan::WalkEvent::Enter(element) => {
                let range = element.text_range();
                out.push_str(&"  ".repeat(depth));
                match &element {
                    rowan::NodeOrToken::Node(node) => {
                        out.push_str(&format!("{:?}@{:?}\n", node.kind(), range));
                    }
                    rowan::NodeOrToken::Token(token) => {
                        out.push_str(&format!("{:?}@{:?} {:?}\n", token.kind(), range, token.text()));
                    }
                }
                depth += 1;
            }
            rowan::WalkEvent::Leave(_) => depth -= 1,
        }
    }
    out
}
