use std::fmt::Display;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TokenKind {
    Identifier,
    Number,
    RelOp,
    AddOp,
    MulOp,
    Assignment,
    Delimiter,
    Reserved,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Identifier => "id",
                Self::Number => "number",
                Self::RelOp => "relop",
                Self::AddOp => "addop",
                Self::MulOp => "mulop",
                Self::Assignment => "assignment",
                Self::Delimiter => "delimiter",
                Self::Reserved => "reserved",
            }
        )
    }
}

pub const RESERVED_WORDS: [&str; 8] = [
    "int", "void", "if", "else", "while", "return", "read", "write",
];

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Token {
    kind: TokenKind,
    text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn matches(&self, pattern: Pattern) -> bool {
        pattern.admits(self)
    }

    pub fn is_identifier(&self) -> bool {
        self.matches(IDENTIFIER)
    }

    pub fn is_number(&self) -> bool {
        self.matches(NUMBER)
    }

    pub fn is_any_relop(&self) -> bool {
        self.matches(ANY_RELOP)
    }

    pub fn is_any_addop(&self) -> bool {
        self.matches(ANY_ADDOP)
    }

    pub fn is_any_mulop(&self) -> bool {
        self.matches(ANY_MULOP)
    }

    /// `int` or `void`, the only type names in the language.
    pub fn is_type(&self) -> bool {
        self.matches(INT) || self.matches(VOID)
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// A grammar template that tokens are matched against.
///
/// `Any` accepts every lexeme of its kind. `Exact` pins the lexeme as well, except for
/// identifiers and numbers, which only ever match by kind.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Pattern {
    Any(TokenKind),
    Exact(TokenKind, &'static str),
}

impl Pattern {
    pub fn admits(self, token: &Token) -> bool {
        match self {
            Self::Any(kind) => token.kind == kind,
            Self::Exact(kind @ (TokenKind::Identifier | TokenKind::Number), _) => {
                token.kind == kind
            }
            Self::Exact(kind, text) => token.kind == kind && token.text == text,
        }
    }
}

impl Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any(kind) => write!(f, "any {kind}"),
            Self::Exact(_, text) => write!(f, "`{text}`"),
        }
    }
}

pub const INT: Pattern = Pattern::Exact(TokenKind::Reserved, "int");
pub const VOID: Pattern = Pattern::Exact(TokenKind::Reserved, "void");
pub const IF: Pattern = Pattern::Exact(TokenKind::Reserved, "if");
pub const ELSE: Pattern = Pattern::Exact(TokenKind::Reserved, "else");
pub const WHILE: Pattern = Pattern::Exact(TokenKind::Reserved, "while");
pub const RETURN: Pattern = Pattern::Exact(TokenKind::Reserved, "return");
pub const READ: Pattern = Pattern::Exact(TokenKind::Reserved, "read");
pub const WRITE: Pattern = Pattern::Exact(TokenKind::Reserved, "write");
pub const COMMA: Pattern = Pattern::Exact(TokenKind::Delimiter, ",");
pub const SEMICOLON: Pattern = Pattern::Exact(TokenKind::Delimiter, ";");
pub const OPEN_PAREN: Pattern = Pattern::Exact(TokenKind::Delimiter, "(");
pub const CLOSE_PAREN: Pattern = Pattern::Exact(TokenKind::Delimiter, ")");
pub const OPEN_BRACE: Pattern = Pattern::Exact(TokenKind::Delimiter, "{");
pub const CLOSE_BRACE: Pattern = Pattern::Exact(TokenKind::Delimiter, "}");
pub const ASSIGN: Pattern = Pattern::Exact(TokenKind::Assignment, "=");
pub const IDENTIFIER: Pattern = Pattern::Any(TokenKind::Identifier);
pub const NUMBER: Pattern = Pattern::Any(TokenKind::Number);
pub const ANY_RELOP: Pattern = Pattern::Any(TokenKind::RelOp);
pub const ANY_ADDOP: Pattern = Pattern::Any(TokenKind::AddOp);
pub const ANY_MULOP: Pattern = Pattern::Any(TokenKind::MulOp);
