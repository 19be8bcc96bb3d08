use std::fmt;

use crate::ast::{Position, Token, TokenKind};

/// Error raised while scanning source text.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub pos: Position,
    pub message: String,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lex error at {}: {}", self.pos, self.message)
    }
}

impl std::error::Error for LexError {}

/// Hand-written scanner turning source text into a token vector.
///
/// Pure function of its input: no side effects, no forward references.
/// Multi-character operators are matched greedily (`|>` before `|`, `==` and
/// `=>` before `=`, `..` before `.`).
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer::with_start_line(input, 1)
    }

    /// Start counting lines at `start_line`, so diagnostics for a script
    /// body point into the full file rather than past the `---` separator.
    pub fn with_start_line(input: &str, start_line: usize) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: start_line,
            column: 1,
        }
    }

    /// Consume the whole input.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        if self.current_char() == Some('\n') {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.position += 1;
    }

    fn pos(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn error(&self, pos: Position, message: impl Into<String>) -> LexError {
        LexError {
            pos,
            message: message.into(),
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.current_char() {
                Some(ch) if ch.is_whitespace() => self.advance(),
                Some('/') if self.peek_char(1) == Some('/') => {
                    while let Some(ch) = self.current_char() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('/') if self.peek_char(1) == Some('*') => {
                    let start = self.pos();
                    self.advance();
                    self.advance();
                    loop {
                        match self.current_char() {
                            Some('*') if self.peek_char(1) == Some('/') => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            Some(_) => self.advance(),
                            None => {
                                return Err(self.error(start, "Unterminated block comment"));
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_string(&mut self, quote: char) -> Result<String, LexError> {
        let start = self.pos();
        let mut result = String::new();
        self.advance(); // consume opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    let escape_pos = self.pos();
                    self.advance(); // consume backslash
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('"') => result.push('"'),
                        Some('\'') => result.push('\''),
                        Some('\\') => result.push('\\'),
                        Some('u') => {
                            self.advance();
                            let mut code = 0u32;
                            for _ in 0..4 {
                                let digit = self
                                    .current_char()
                                    .and_then(|c| c.to_digit(16))
                                    .ok_or_else(|| {
                                        self.error(
                                            escape_pos,
                                            "Expected four hex digits after \\u",
                                        )
                                    })?;
                                code = code * 16 + digit;
                                self.advance();
                            }
                            let decoded = char::from_u32(code).ok_or_else(|| {
                                self.error(
                                    escape_pos,
                                    format!("\\u{:04x} is not a valid character", code),
                                )
                            })?;
                            result.push(decoded);
                            continue;
                        }
                        Some(ch) => {
                            return Err(self
                                .error(escape_pos, format!("Invalid escape sequence: \\{}", ch)));
                        }
                        None => {
                            return Err(self.error(start, "Unterminated string"));
                        }
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(self.error(start, "Unterminated string: missing closing quote"))
    }

    /// Read an integer, decimal, or scientific numeric literal as one raw
    /// lexeme; the parser resolves integer vs float.
    fn read_number(&mut self) -> Result<String, LexError> {
        let start = self.pos();
        let mut number = String::new();

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !number.contains('.')
                && !number.contains('e')
                && !number.contains('E')
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                number.push(ch);
                self.advance();
            } else if (ch == 'e' || ch == 'E') && !number.contains('e') && !number.contains('E') {
                let sign = matches!(self.peek_char(1), Some('+') | Some('-'));
                let digit_at = if sign { 2 } else { 1 };
                if !self.peek_char(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                    return Err(self.error(start, format!("Malformed exponent in '{}'", number)));
                }
                number.push(ch);
                self.advance();
                if sign {
                    number.push(self.current_char().unwrap_or('+'));
                    self.advance();
                }
            } else {
                break;
            }
        }

        Ok(number)
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace_and_comments()?;

        let pos = self.pos();
        let token = |kind| Ok(Token::new(kind, pos));

        match self.current_char() {
            None => token(TokenKind::Eof),
            Some('+') => {
                self.advance();
                token(TokenKind::Plus)
            }
            Some('-') => {
                self.advance();
                token(TokenKind::Minus)
            }
            Some('*') => {
                self.advance();
                token(TokenKind::Star)
            }
            Some('/') => {
                self.advance();
                token(TokenKind::Slash)
            }
            Some('%') => {
                self.advance();
                token(TokenKind::Percent)
            }
            Some('@') => {
                self.advance();
                token(TokenKind::At)
            }
            Some('.') => {
                if self.peek_char(1) == Some('.') {
                    self.advance();
                    self.advance();
                    token(TokenKind::DotDot)
                } else {
                    self.advance();
                    token(TokenKind::Dot)
                }
            }
            Some('=') => match self.peek_char(1) {
                Some('=') => {
                    self.advance();
                    self.advance();
                    token(TokenKind::EqEq)
                }
                Some('>') => {
                    self.advance();
                    self.advance();
                    token(TokenKind::FatArrow)
                }
                _ => {
                    self.advance();
                    token(TokenKind::Assign)
                }
            },
            Some('!') => {
                if self.peek_char(1) == Some('=') {
                    self.advance();
                    self.advance();
                    token(TokenKind::NotEq)
                } else {
                    self.advance();
                    token(TokenKind::Bang)
                }
            }
            Some('<') => {
                if self.peek_char(1) == Some('=') {
                    self.advance();
                    self.advance();
                    token(TokenKind::LtEq)
                } else {
                    self.advance();
                    token(TokenKind::Lt)
                }
            }
            Some('>') => {
                if self.peek_char(1) == Some('=') {
                    self.advance();
                    self.advance();
                    token(TokenKind::GtEq)
                } else {
                    self.advance();
                    token(TokenKind::Gt)
                }
            }
            Some('&') => {
                if self.peek_char(1) == Some('&') {
                    self.advance();
                    self.advance();
                    token(TokenKind::AndAnd)
                } else {
                    Err(self.error(pos, "Unexpected '&' (did you mean '&&'?)"))
                }
            }
            Some('|') => match self.peek_char(1) {
                Some('>') => {
                    self.advance();
                    self.advance();
                    token(TokenKind::PipeArrow)
                }
                Some('|') => {
                    self.advance();
                    self.advance();
                    token(TokenKind::OrOr)
                }
                _ => Err(self.error(pos, "Unexpected '|' (did you mean '|>' or '||'?)")),
            },
            Some('(') => {
                self.advance();
                token(TokenKind::LParen)
            }
            Some(')') => {
                self.advance();
                token(TokenKind::RParen)
            }
            Some('{') => {
                self.advance();
                token(TokenKind::LBrace)
            }
            Some('}') => {
                self.advance();
                token(TokenKind::RBrace)
            }
            Some('[') => {
                self.advance();
                token(TokenKind::LBracket)
            }
            Some(']') => {
                self.advance();
                token(TokenKind::RBracket)
            }
            Some(',') => {
                self.advance();
                token(TokenKind::Comma)
            }
            Some(':') => {
                self.advance();
                token(TokenKind::Colon)
            }
            Some('"') => {
                let s = self.read_string('"')?;
                token(TokenKind::String(s))
            }
            Some('\'') => {
                let s = self.read_string('\'')?;
                token(TokenKind::String(s))
            }
            Some(ch) if ch.is_ascii_digit() => {
                let lexeme = self.read_number()?;
                token(TokenKind::Number(lexeme))
            }
            Some(ch) if ch.is_alphabetic() || ch == '_' => {
                let ident = self.read_identifier();

                let kind = match ident.as_str() {
                    "let" => TokenKind::Let,
                    "if" => TokenKind::If,
                    "else" => TokenKind::Else,
                    "function" => TokenKind::Function,
                    "true" => TokenKind::Boolean(true),
                    "false" => TokenKind::Boolean(false),
                    "null" => TokenKind::Null,
                    _ => TokenKind::Identifier(ident),
                };
                token(kind)
            }
            Some(ch) => Err(self.error(pos, format!("Unexpected character '{}'", ch))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("let if else function true false null"),
            vec![
                TokenKind::Let,
                TokenKind::If,
                TokenKind::Else,
                TokenKind::Function,
                TokenKind::Boolean(true),
                TokenKind::Boolean(false),
                TokenKind::Null,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_greedy_operators() {
        assert_eq!(
            kinds("|> || == => = .. . != <= >="),
            vec![
                TokenKind::PipeArrow,
                TokenKind::OrOr,
                TokenKind::EqEq,
                TokenKind::FatArrow,
                TokenKind::Assign,
                TokenKind::DotDot,
                TokenKind::Dot,
                TokenKind::NotEq,
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_number_forms() {
        assert_eq!(
            kinds("42 3.14 6.02e23 1e-9"),
            vec![
                TokenKind::Number("42".into()),
                TokenKind::Number("3.14".into()),
                TokenKind::Number("6.02e23".into()),
                TokenKind::Number("1e-9".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_positions_track_lines() {
        let tokens = Lexer::new("a\n  b").tokenize().unwrap();
        assert_eq!(tokens[0].pos, Position::new(1, 1));
        assert_eq!(tokens[1].pos, Position::new(2, 3));
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("\"abc").tokenize().unwrap_err();
        assert!(err.message.contains("Unterminated string"));
    }

    #[test]
    fn test_unterminated_block_comment() {
        let err = Lexer::new("1 /* comment").tokenize().unwrap_err();
        assert!(err.message.contains("Unterminated block comment"));
    }

    #[test]
    fn test_bare_pipe_rejected() {
        let err = Lexer::new("a | b").tokenize().unwrap_err();
        assert_eq!(err.pos, Position::new(1, 3));
    }

    #[test]
    fn test_comments_skipped() {
        assert_eq!(
            kinds("1 // line\n/* block\nstill */ 2"),
            vec![
                TokenKind::Number("1".into()),
                TokenKind::Number("2".into()),
                TokenKind::Eof,
            ]
        );
    }
}
