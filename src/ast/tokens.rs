use std::fmt;

/// A source location, 1-based.
///
/// Every token carries the position of its first character; errors raised
/// anywhere later in the pipeline point back to one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A lexical token: a kind plus the position where it started.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Position,
}

impl Token {
    pub fn new(kind: TokenKind, pos: Position) -> Self {
        Token { kind, pos }
    }
}

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Numeric literal, carrying the raw lexeme.
    ///
    /// Integer, decimal, and scientific forms all lex to this one kind;
    /// the parser decides integer vs float.
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 3.14
    /// 6.02e23
    /// ```
    Number(String),

    /// String literal with escapes already decoded
    String(String),

    /// Boolean literal (`true` / `false`)
    Boolean(bool),

    /// Null literal
    Null,

    /// Field name, variable, or function name
    ///
    /// Must start with a letter or underscore, followed by letters, digits,
    /// or underscores.
    Identifier(String),

    // Keywords (case-sensitive)
    /// `let` - starts a binding chain
    Let,

    /// `if` - conditional expression (always requires `else`)
    If,

    /// `else`
    Else,

    /// `function` - top-level named function definition
    Function,

    // Arithmetic
    /// Addition or string concatenation
    Plus,

    /// Subtraction or unary negation
    Minus,

    /// Multiplication
    Star,

    /// Division
    Slash,

    /// Modulo
    Percent,

    // Comparison
    /// Equality operator (`==`)
    EqEq,

    /// Inequality operator (`!=`)
    NotEq,

    /// Less than
    Lt,

    /// Less than or equal
    LtEq,

    /// Greater than
    Gt,

    /// Greater than or equal
    GtEq,

    // Logical
    /// Logical AND (`&&`)
    AndAnd,

    /// Logical OR (`||`)
    OrOr,

    /// Logical NOT (`!`)
    Bang,

    // Binding and functions
    /// Assignment in `let` chains and `function` definitions (`=`)
    Assign,

    /// Lambda arrow (`=>`)
    FatArrow,

    /// Pipeline operator (`|>`)
    ///
    /// # Examples
    /// ```text
    /// input.items |> filter(i => i.qty > 0) |> sum()
    /// ```
    PipeArrow,

    // Navigation
    /// Attribute marker (`@`)
    ///
    /// Marks attribute access in paths (`order.@id`) and attribute keys in
    /// object literals (`{@id: "5"}`).
    At,

    /// Member access dot
    Dot,

    /// Recursive descent (`..`)
    DotDot,

    // Delimiters
    /// Left parenthesis
    LParen,

    /// Right parenthesis
    RParen,

    /// Left brace for object literals
    LBrace,

    /// Right brace
    RBrace,

    /// Left bracket for index and predicate access, and array literals
    LBracket,

    /// Right bracket
    RBracket,

    /// Comma
    Comma,

    /// Colon in object literal key-value pairs
    Colon,

    /// End of input
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "number '{}'", n),
            TokenKind::String(s) => write!(f, "string \"{}\"", s),
            TokenKind::Boolean(b) => write!(f, "'{}'", b),
            TokenKind::Null => write!(f, "'null'"),
            TokenKind::Identifier(name) => write!(f, "identifier '{}'", name),
            TokenKind::Let => write!(f, "'let'"),
            TokenKind::If => write!(f, "'if'"),
            TokenKind::Else => write!(f, "'else'"),
            TokenKind::Function => write!(f, "'function'"),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::Slash => write!(f, "'/'"),
            TokenKind::Percent => write!(f, "'%'"),
            TokenKind::EqEq => write!(f, "'=='"),
            TokenKind::NotEq => write!(f, "'!='"),
            TokenKind::Lt => write!(f, "'<'"),
            TokenKind::LtEq => write!(f, "'<='"),
            TokenKind::Gt => write!(f, "'>'"),
            TokenKind::GtEq => write!(f, "'>='"),
            TokenKind::AndAnd => write!(f, "'&&'"),
            TokenKind::OrOr => write!(f, "'||'"),
            TokenKind::Bang => write!(f, "'!'"),
            TokenKind::Assign => write!(f, "'='"),
            TokenKind::FatArrow => write!(f, "'=>'"),
            TokenKind::PipeArrow => write!(f, "'|>'"),
            TokenKind::At => write!(f, "'@'"),
            TokenKind::Dot => write!(f, "'.'"),
            TokenKind::DotDot => write!(f, "'..'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::LBrace => write!(f, "'{{'"),
            TokenKind::RBrace => write!(f, "'}}'"),
            TokenKind::LBracket => write!(f, "'['"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}
