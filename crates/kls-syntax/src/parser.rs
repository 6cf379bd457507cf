use std::collections::VecDeque;

use rowan::{Checkpoint, GreenNode, GreenNodeBuilder};

use crate::lexer::{lex, Token};
use crate::syntax_kind::SyntaxKind;
use crate::ParseError;

/// Parse `input` into a lossless green tree rooted at [`SyntaxKind::SourceFile`].
///
/// The parser never fails: unexpected input is wrapped in
/// [`SyntaxKind::Error`] nodes and reported in the error list.
pub fn parse(input: &str) -> (GreenNode, Vec<ParseError>) {
    let (tokens, errors) = lex(input);
    Parser {
        input,
        tokens: VecDeque::from(tokens),
        builder: GreenNodeBuilder::new(),
        errors,
    }
    .parse_source_file()
}

struct Parser<'a> {
    input: &'a str,
    tokens: VecDeque<Token>,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<ParseError>,
}

fn infix_binding_power(kind: SyntaxKind) -> Option<u8> {
    Some(match kind {
        SyntaxKind::Eq => 1,
        SyntaxKind::PipePipe => 2,
        SyntaxKind::AmpAmp => 3,
        SyntaxKind::EqEq | SyntaxKind::BangEq => 4,
        SyntaxKind::Less | SyntaxKind::Greater | SyntaxKind::LessEq | SyntaxKind::GreaterEq => 5,
        SyntaxKind::Plus | SyntaxKind::Minus => 6,
        SyntaxKind::Star | SyntaxKind::Slash | SyntaxKind::Percent => 7,
        _ => return None,
    })
}

impl Parser<'_> {
    fn parse_source_file(mut self) -> (GreenNode, Vec<ParseError>) {
        self.builder.start_node(SyntaxKind::SourceFile.into());

        if self.at(SyntaxKind::PackageKw) {
            self.directive(SyntaxKind::PackageDirective);
        }
        while self.at(SyntaxKind::ImportKw) {
            self.directive(SyntaxKind::ImportDirective);
        }
        while !self.at(SyntaxKind::Eof) {
            if self.at(SyntaxKind::Semicolon) {
                self.bump();
            } else if !self.declaration() {
                self.recover("expected a declaration");
            }
        }

        self.eat_trivia();
        self.builder.finish_node();
        (self.builder.finish(), self.errors)
    }

    fn directive(&mut self, kind: SyntaxKind) {
        self.start_node(kind);
        self.bump();
        self.start_node(SyntaxKind::QualifiedName);
        self.expect(SyntaxKind::Identifier, "expected a name");
        while self.at(SyntaxKind::Dot)
            && matches!(self.nth(1), SyntaxKind::Identifier | SyntaxKind::Star)
        {
            self.bump();
            self.bump();
        }
        self.finish_node();
        self.finish_node();
    }

    /// Parses a declaration if one starts here.
    fn declaration(&mut self) -> bool {
        match self.current() {
            SyntaxKind::ClassKw => self.class_declaration(),
            SyntaxKind::FunKw => self.function_declaration(),
            SyntaxKind::ValKw | SyntaxKind::VarKw => self.property_declaration(),
            _ => return false,
        }
        true
    }

    fn class_declaration(&mut self) {
        self.start_node(SyntaxKind::ClassDeclaration);
        self.bump();
        self.expect(SyntaxKind::Identifier, "expected a class name");
        if self.at(SyntaxKind::LParen) {
            self.parameter_list();
        }
        if self.at(SyntaxKind::Colon) {
            self.bump();
            self.type_reference();
            if self.at(SyntaxKind::LParen) {
                self.value_arguments();
            }
        }
        if self.at(SyntaxKind::LBrace) {
            self.start_node(SyntaxKind::ClassBody);
            self.bump();
            while !self.at(SyntaxKind::RBrace) && !self.at(SyntaxKind::Eof) {
                if self.at(SyntaxKind::Semicolon) {
                    self.bump();
                } else if !self.declaration() {
                    self.recover("expected a member declaration");
                }
            }
            self.expect(SyntaxKind::RBrace, "expected '}'");
            self.finish_node();
        }
        self.finish_node();
    }

    fn function_declaration(&mut self) {
        self.start_node(SyntaxKind::FunctionDeclaration);
        self.bump();
        self.expect(SyntaxKind::Identifier, "expected a function name");
        if self.at(SyntaxKind::LParen) {
            self.parameter_list();
        } else {
            self.error_here("expected '('");
        }
        if self.at(SyntaxKind::Colon) {
            self.bump();
            self.type_reference();
        }
        if self.at(SyntaxKind::Eq) {
            self.bump();
            self.expression();
        } else if self.at(SyntaxKind::LBrace) {
            self.block();
        }
        self.finish_node();
    }

    fn parameter_list(&mut self) {
        self.start_node(SyntaxKind::ParameterList);
        self.bump();
        loop {
            match self.current() {
                SyntaxKind::RParen | SyntaxKind::LBrace | SyntaxKind::Eof => break,
                SyntaxKind::ValKw | SyntaxKind::VarKw | SyntaxKind::Identifier => self.parameter(),
                _ => self.recover("expected a parameter"),
            }
            if self.at(SyntaxKind::Comma) {
                self.bump();
            } else if !self.at(SyntaxKind::RParen) {
                break;
            }
        }
        self.expect(SyntaxKind::RParen, "expected ')'");
        self.finish_node();
    }

    fn parameter(&mut self) {
        self.start_node(SyntaxKind::Parameter);
        if matches!(self.current(), SyntaxKind::ValKw | SyntaxKind::VarKw) {
            self.bump();
        }
        self.expect(SyntaxKind::Identifier, "expected a parameter name");
        if self.expect(SyntaxKind::Colon, "expected ':'") {
            self.type_reference();
        }
        if self.at(SyntaxKind::Eq) {
            self.bump();
            self.expression();
        }
        self.finish_node();
    }

    fn type_reference(&mut self) {
        self.start_node(SyntaxKind::TypeReference);
        self.expect(SyntaxKind::Identifier, "expected a type");
        while self.at(SyntaxKind::Dot) && self.nth(1) == SyntaxKind::Identifier {
            self.bump();
            self.bump();
        }
        if self.at(SyntaxKind::Less) {
            self.bump();
            while self.at(SyntaxKind::Identifier) {
                self.type_reference();
                if !self.at(SyntaxKind::Comma) {
                    break;
                }
                self.bump();
            }
            self.expect(SyntaxKind::Greater, "expected '>'");
        }
        if self.at(SyntaxKind::Question) {
            self.bump();
        }
        self.finish_node();
    }

    fn property_declaration(&mut self) {
        self.start_node(SyntaxKind::PropertyDeclaration);
        self.bump();
        self.expect(SyntaxKind::Identifier, "expected a property name");
        if self.at(SyntaxKind::Colon) {
            self.bump();
            self.type_reference();
        }
        if self.at(SyntaxKind::Eq) {
            self.bump();
            self.expression();
        }
        self.finish_node();
    }

    fn block(&mut self) {
        self.start_node(SyntaxKind::Block);
        self.bump();
        while !self.at(SyntaxKind::RBrace) && !self.at(SyntaxKind::Eof) {
            if self.at(SyntaxKind::Semicolon) {
                self.bump();
            } else if self.declaration() {
                continue;
            } else if self.at_expression_start() {
                self.expression();
            } else {
                self.recover("expected a statement");
            }
        }
        self.expect(SyntaxKind::RBrace, "expected '}'");
        self.finish_node();
    }

    fn expression(&mut self) {
        self.binary(0);
    }

    fn binary(&mut self, min_bp: u8) {
        let checkpoint = self.checkpoint();
        if !self.prefix() {
            return;
        }
        loop {
            let op = self.current();
            let Some(bp) = infix_binding_power(op) else {
                break;
            };
            if bp < min_bp {
                break;
            }
            // A line break ends the expression unless the operator is a
            // logical one, which conventionally starts continuation lines.
            if self.newline_before_current()
                && !matches!(op, SyntaxKind::AmpAmp | SyntaxKind::PipePipe)
            {
                break;
            }
            self.builder
                .start_node_at(checkpoint, SyntaxKind::BinaryExpression.into());
            self.bump();
            // Assignment is right associative, everything else left associative.
            let next = if op == SyntaxKind::Eq { bp } else { bp + 1 };
            self.binary(next);
            self.finish_node();
        }
    }

    fn prefix(&mut self) -> bool {
        match self.current() {
            SyntaxKind::Bang | SyntaxKind::Minus | SyntaxKind::Plus => {
                self.start_node(SyntaxKind::PrefixExpression);
                self.bump();
                self.prefix();
                self.finish_node();
                true
            }
            _ => self.postfix(),
        }
    }

    fn postfix(&mut self) -> bool {
        let checkpoint = self.checkpoint();
        if !self.primary() {
            return false;
        }
        loop {
            match self.current() {
                kind @ (SyntaxKind::Dot | SyntaxKind::SafeDot) => {
                    let node = if kind == SyntaxKind::Dot {
                        SyntaxKind::DotQualifiedExpression
                    } else {
                        SyntaxKind::SafeQualifiedExpression
                    };
                    self.builder.start_node_at(checkpoint, node.into());
                    self.bump();
                    self.selector();
                    self.finish_node();
                }
                SyntaxKind::LParen if !self.newline_before_current() => {
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::CallExpression.into());
                    self.value_arguments();
                    self.finish_node();
                }
                _ => break,
            }
        }
        true
    }

    fn selector(&mut self) {
        if !self.at(SyntaxKind::Identifier) {
            self.error_here("expected a member name");
            return;
        }
        let checkpoint = self.checkpoint();
        self.start_node(SyntaxKind::ReferenceExpression);
        self.bump();
        self.finish_node();
        if self.at(SyntaxKind::LParen) && !self.newline_before_current() {
            self.builder
                .start_node_at(checkpoint, SyntaxKind::CallExpression.into());
            self.value_arguments();
            self.finish_node();
        }
    }

    fn primary(&mut self) -> bool {
        match self.current() {
            SyntaxKind::IntLiteral
            | SyntaxKind::StringLiteral
            | SyntaxKind::TrueKw
            | SyntaxKind::FalseKw
            | SyntaxKind::NullKw => {
                self.start_node(SyntaxKind::LiteralExpression);
                self.bump();
                self.finish_node();
            }
            SyntaxKind::Identifier => {
                self.start_node(SyntaxKind::ReferenceExpression);
                self.bump();
                self.finish_node();
            }
            SyntaxKind::LParen => {
                self.start_node(SyntaxKind::ParenthesizedExpression);
                self.bump();
                self.expression();
                self.expect(SyntaxKind::RParen, "expected ')'");
                self.finish_node();
            }
            SyntaxKind::IfKw => {
                self.start_node(SyntaxKind::IfExpression);
                self.bump();
                self.expect(SyntaxKind::LParen, "expected '('");
                self.expression();
                self.expect(SyntaxKind::RParen, "expected ')'");
                self.control_body();
                if self.at(SyntaxKind::ElseKw) {
                    self.bump();
                    self.control_body();
                }
                self.finish_node();
            }
            SyntaxKind::ReturnKw => {
                self.start_node(SyntaxKind::ReturnExpression);
                self.bump();
                if !self.newline_before_current() && self.at_expression_start() {
                    self.expression();
                }
                self.finish_node();
            }
            SyntaxKind::LBrace => self.block(),
            _ => {
                self.error_here("expected an expression");
                return false;
            }
        }
        true
    }

    fn control_body(&mut self) {
        if self.at(SyntaxKind::LBrace) {
            self.block();
        } else {
            self.expression();
        }
    }

    fn value_arguments(&mut self) {
        self.start_node(SyntaxKind::ValueArgumentList);
        self.bump();
        while self.at_expression_start() {
            self.start_node(SyntaxKind::ValueArgument);
            self.expression();
            self.finish_node();
            if !self.at(SyntaxKind::Comma) {
                break;
            }
            self.bump();
        }
        self.expect(SyntaxKind::RParen, "expected ')'");
        self.finish_node();
    }

    fn at_expression_start(&self) -> bool {
        matches!(
            self.current(),
            SyntaxKind::IntLiteral
                | SyntaxKind::StringLiteral
                | SyntaxKind::TrueKw
                | SyntaxKind::FalseKw
                | SyntaxKind::NullKw
                | SyntaxKind::Identifier
                | SyntaxKind::LParen
                | SyntaxKind::LBrace
                | SyntaxKind::IfKw
                | SyntaxKind::ReturnKw
                | SyntaxKind::Bang
                | SyntaxKind::Minus
                | SyntaxKind::Plus
        )
    }

    fn recover(&mut self, message: &str) {
        self.error_here(message);
        self.start_node(SyntaxKind::Error);
        self.bump();
        self.finish_node();
    }

    fn current(&self) -> SyntaxKind {
        self.nth(0)
    }

    fn nth(&self, n: usize) -> SyntaxKind {
        self.tokens
            .iter()
            .filter(|t| !t.kind.is_trivia())
            .nth(n)
            .map_or(SyntaxKind::Eof, |t| t.kind)
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    fn newline_before_current(&self) -> bool {
        self.tokens
            .iter()
            .take_while(|t| t.kind.is_trivia())
            .any(|t| t.kind == SyntaxKind::LineComment || t.text(self.input).contains('\n'))
    }

    fn eat_trivia(&mut self) {
        while self.tokens.front().is_some_and(|t| t.kind.is_trivia()) {
            self.bump_raw();
        }
    }

    fn bump_raw(&mut self) {
        if let Some(token) = self.tokens.pop_front() {
            self.builder.token(token.kind.into(), token.text(self.input));
        }
    }

    /// Consume the next significant token. `Eof` is never added to the tree.
    fn bump(&mut self) {
        self.eat_trivia();
        if !self.at(SyntaxKind::Eof) {
            self.bump_raw();
        }
    }

    fn expect(&mut self, kind: SyntaxKind, message: &str) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            self.error_here(message);
            false
        }
    }

    fn start_node(&mut self, kind: SyntaxKind) {
        self.eat_trivia();
        self.builder.start_node(kind.into());
    }

    fn checkpoint(&mut self) -> Checkpoint {
        self.eat_trivia();
        self.builder.checkpoint()
    }

    fn finish_node(&mut self) {
        self.builder.finish_node();
    }

    fn error_here(&mut self, message: &str) {
        let range = self
            .tokens
            .iter()
            .find(|t| !t.kind.is_trivia())
            .map(|t| t.range)
            .unwrap_or_else(|| text_size::TextRange::empty(kls_core::text_size(self.input.len())));
        self.errors.push(ParseError {
            message: message.to_string(),
            range,
        });
    }
}
