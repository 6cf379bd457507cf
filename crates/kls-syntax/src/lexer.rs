use text_size::{TextRange, TextSize};

use crate::syntax_kind::SyntaxKind;
use crate::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub range: TextRange,
}

impl Token {
    pub fn text<'a>(&self, input: &'a str) -> &'a str {
        &input[self.range]
    }
}

/// Tokenize `input`. The tokens cover the input exactly; the final token is a
/// zero-width [`SyntaxKind::Eof`].
pub fn lex(input: &str) -> (Vec<Token>, Vec<ParseError>) {
    let mut lexer = Lexer {
        input,
        pos: 0,
        tokens: Vec::new(),
        errors: Vec::new(),
    };
    while lexer.pos < input.len() {
        lexer.next_token();
    }
    let end = kls_core::text_size(input.len());
    lexer.tokens.push(Token {
        kind: SyntaxKind::Eof,
        range: TextRange::empty(end),
    });
    (lexer.tokens, lexer.errors)
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    tokens: Vec<Token>,
    errors: Vec<ParseError>,
}

impl<'a> Lexer<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn push(&mut self, kind: SyntaxKind, len: usize) {
        let start = kls_core::text_size(self.pos);
        self.pos += len;
        self.tokens.push(Token {
            kind,
            range: TextRange::new(start, kls_core::text_size(self.pos)),
        });
    }

    fn next_token(&mut self) {
        let rest = self.rest();
        let Some(c) = rest.chars().next() else {
            return;
        };

        if c.is_whitespace() {
            let len = rest
                .find(|c: char| !c.is_whitespace())
                .unwrap_or(rest.len());
            return self.push(SyntaxKind::Whitespace, len);
        }
        if rest.starts_with("//") {
            let len = rest.find('\n').unwrap_or(rest.len());
            return self.push(SyntaxKind::LineComment, len);
        }
        if rest.starts_with("/*") {
            let len = match rest[2..].find("*/") {
                Some(idx) => idx + 4,
                None => {
                    self.error("unterminated block comment", rest.len());
                    rest.len()
                }
            };
            return self.push(SyntaxKind::BlockComment, len);
        }
        if c == '_' || unicode_ident::is_xid_start(c) {
            let len = rest
                .find(|c: char| !unicode_ident::is_xid_continue(c))
                .unwrap_or(rest.len());
            let kind = SyntaxKind::keyword(&rest[..len]).unwrap_or(SyntaxKind::Identifier);
            return self.push(kind, len);
        }
        if c.is_ascii_digit() {
            let len = rest
                .find(|c: char| !(c.is_ascii_digit() || c == '_'))
                .unwrap_or(rest.len());
            return self.push(SyntaxKind::IntLiteral, len);
        }
        if c == '"' {
            let len = self.string_len();
            return self.push(SyntaxKind::StringLiteral, len);
        }

        if let Some((kind, len)) = punctuation(rest) {
            return self.push(kind, len);
        }

        self.error("unexpected character", c.len_utf8());
        self.push(SyntaxKind::Error, c.len_utf8());
    }

    /// Length of the string literal at the cursor. Unterminated strings end at
    /// the line break.
    fn string_len(&mut self) -> usize {
        let rest = self.rest();
        let mut chars = rest.char_indices().skip(1);
        while let Some((idx, c)) = chars.next() {
            match c {
                '\\' => {
                    chars.next();
                }
                '"' => return idx + 1,
                '\n' => {
                    self.error("unterminated string literal", idx);
                    return idx;
                }
                _ => {}
            }
        }
        self.error("unterminated string literal", rest.len());
        rest.len()
    }

    fn error(&mut self, message: &str, len: usize) {
        let start = kls_core::text_size(self.pos);
        self.errors.push(ParseError {
            message: message.to_string(),
            range: TextRange::at(start, TextSize::from(len as u32)),
        });
    }
}

fn punctuation(rest: &str) -> Option<(SyntaxKind, usize)> {
    const TWO: &[(&str, SyntaxKind)] = &[
        ("?.", SyntaxKind::SafeDot),
        ("==", SyntaxKind::EqEq),
        ("!=", SyntaxKind::BangEq),
        ("<=", SyntaxKind::LessEq),
        (">=", SyntaxKind::GreaterEq),
        ("&&", SyntaxKind::AmpAmp),
        ("||", SyntaxKind::PipePipe),
        ("->", SyntaxKind::Arrow),
    ];
    if let Some((text, kind)) = TWO.iter().find(|(text, _)| rest.starts_with(text)) {
        return Some((*kind, text.len()));
    }

    let kind = match rest.as_bytes().first()? {
        b'(' => SyntaxKind::LParen,
        b')' => SyntaxKind::RParen,
        b'{' => SyntaxKind::LBrace,
        b'}' => SyntaxKind::RBrace,
        b',' => SyntaxKind::Comma,
        b':' => SyntaxKind::Colon,
        b';' => SyntaxKind::Semicolon,
        b'.' => SyntaxKind::Dot,
        b'?' => SyntaxKind::Question,
        b'=' => SyntaxKind::Eq,
        b'+' => SyntaxKind::Plus,
        b'-' => SyntaxKind::Minus,
        b'*' => SyntaxKind::Star,
        b'/' => SyntaxKind::Slash,
        b'%' => SyntaxKind::Percent,
        b'<' => SyntaxKind::Less,
        b'>' => SyntaxKind::Greater,
        b'!' => SyntaxKind::Bang,
        _ => return None,
    };
    Some((kind, 1))
}
