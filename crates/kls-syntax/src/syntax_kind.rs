use rowan::Language;

/// Token and node kinds of the Kotlin syntax tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum SyntaxKind {
    // Trivia.
    Whitespace,
    LineComment,
    BlockComment,

    // Atoms.
    Identifier,
    IntLiteral,
    StringLiteral,

    // Keywords.
    PackageKw,
    ImportKw,
    ClassKw,
    FunKw,
    ValKw,
    VarKw,
    ReturnKw,
    IfKw,
    ElseKw,
    TrueKw,
    FalseKw,
    NullKw,

    // Punctuation.
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Semicolon,
    Dot,
    SafeDot,
    Question,
    Eq,
    EqEq,
    BangEq,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    AmpAmp,
    PipePipe,
    Bang,
    Arrow,

    Eof,

    // Nodes.
    SourceFile,
    PackageDirective,
    ImportDirective,
    QualifiedName,
    ClassDeclaration,
    ClassBody,
    FunctionDeclaration,
    ParameterList,
    Parameter,
    TypeReference,
    PropertyDeclaration,
    Block,
    ReturnExpression,
    IfExpression,
    BinaryExpression,
    PrefixExpression,
    ParenthesizedExpression,
    DotQualifiedExpression,
    SafeQualifiedExpression,
    CallExpression,
    ValueArgumentList,
    ValueArgument,
    ReferenceExpression,
    LiteralExpression,

    /// Unknown characters (as a token) or unparseable input (as a node).
    Error,

    #[doc(hidden)]
    __Last,
}

impl SyntaxKind {
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            SyntaxKind::Whitespace | SyntaxKind::LineComment | SyntaxKind::BlockComment
        )
    }

    pub fn is_keyword(self) -> bool {
        (SyntaxKind::PackageKw as u16..=SyntaxKind::NullKw as u16).contains(&(self as u16))
    }

    /// Declarations: the units the recovery path re-parses in isolation.
    pub fn is_declaration(self) -> bool {
        matches!(
            self,
            SyntaxKind::ClassDeclaration
                | SyntaxKind::FunctionDeclaration
                | SyntaxKind::PropertyDeclaration
                | SyntaxKind::Parameter
        )
    }

    pub fn is_expression(self) -> bool {
        matches!(
            self,
            SyntaxKind::Block
                | SyntaxKind::ReturnExpression
                | SyntaxKind::IfExpression
                | SyntaxKind::BinaryExpression
                | SyntaxKind::PrefixExpression
                | SyntaxKind::ParenthesizedExpression
                | SyntaxKind::DotQualifiedExpression
                | SyntaxKind::SafeQualifiedExpression
                | SyntaxKind::CallExpression
                | SyntaxKind::ReferenceExpression
                | SyntaxKind::LiteralExpression
        )
    }

    pub fn keyword(text: &str) -> Option<SyntaxKind> {
        Some(match text {
            "package" => SyntaxKind::PackageKw,
            "import" => SyntaxKind::ImportKw,
            "class" => SyntaxKind::ClassKw,
            "fun" => SyntaxKind::FunKw,
            "val" => SyntaxKind::ValKw,
            "var" => SyntaxKind::VarKw,
            "return" => SyntaxKind::ReturnKw,
            "if" => SyntaxKind::IfKw,
            "else" => SyntaxKind::ElseKw,
            "true" => SyntaxKind::TrueKw,
            "false" => SyntaxKind::FalseKw,
            "null" => SyntaxKind::NullKw,
            _ => return None,
        })
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        rowan::SyntaxKind(kind as u16)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KotlinLanguage {}

impl Language for KotlinLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> SyntaxKind {
        if raw.0 < SyntaxKind::__Last as u16 {
            // SAFETY: the value is within the range of the `repr(u16)` enum.
            unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
        } else {
            SyntaxKind::Error
        }
    }

    fn kind_to_raw(kind: SyntaxKind) -> rowan::SyntaxKind {
        kind.into()
    }
}

pub type SyntaxNode = rowan::SyntaxNode<KotlinLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<KotlinLanguage>;
pub type SyntaxElement = rowan::SyntaxElement<KotlinLanguage>;
