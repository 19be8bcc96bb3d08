use std::fmt;

use crate::ast::{
    BinOp, DescendKey, Expr, Header, Position, Program, Property, Statement, Token, TokenKind,
    UnOp,
};

/// Error raised on malformed input.
///
/// `expected` is a human-readable description of the token set that would
/// have been accepted at `pos`; `found` is the token actually present.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub pos: Position,
    pub expected: String,
    pub found: TokenKind,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parse error at {}: expected {}, found {}",
            self.pos, self.expected, self.found
        )
    }
}

impl std::error::Error for ParseError {}

/// Recursive-descent parser: one function per precedence level, consuming an
/// owned token vector.
///
/// Precedence, high to low: postfix (member, index, predicate, attribute,
/// wildcard, descent) > unary > multiplicative > additive > relational >
/// equality > `&&` > `||` > `|>` > `let` chains.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            position: 0,
        }
    }

    fn current(&self) -> &Token {
        // The lexer always terminates the vector with Eof.
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn pos(&self) -> Position {
        self.current().pos
    }

    fn peek_kind(&self, offset: usize) -> &TokenKind {
        let at = (self.position + offset).min(self.tokens.len() - 1);
        &self.tokens[at].kind
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.kind()) == std::mem::discriminant(kind)
    }

    fn error(&self, expected: impl Into<String>) -> ParseError {
        ParseError {
            pos: self.pos(),
            expected: expected.into(),
            found: self.kind().clone(),
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<(), ParseError> {
        if self.check(&kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(expected))
        }
    }

    fn expect_identifier(&mut self, expected: &str) -> Result<String, ParseError> {
        match self.kind() {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error(expected)),
        }
    }

    /// Parse a complete program: `function` definitions followed by the
    /// single top-level expression.
    ///
    /// The returned program carries a default header; [`crate::script`]
    /// substitutes the one declared in the script's front matter.
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut statements = Vec::new();
        while self.check(&TokenKind::Function) {
            statements.push(self.parse_function_def()?);
        }

        let body = self.parse_expression()?;
        self.expect(TokenKind::Eof, "end of input")?;

        Ok(Program {
            header: Header::default(),
            statements,
            body,
        })
    }

    /// Parse a single expression and require it to consume all input.
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expression()?;
        self.expect(TokenKind::Eof, "end of input")?;
        Ok(expr)
    }

    fn parse_function_def(&mut self) -> Result<Statement, ParseError> {
        let pos = self.pos();
        self.expect(TokenKind::Function, "'function'")?;
        let name = self.expect_identifier("function name")?;

        self.expect(TokenKind::LParen, "'(' after function name")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                params.push(self.expect_identifier("parameter name")?);
                if self.check(&TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')' after parameters")?;
        self.expect(TokenKind::Assign, "'=' before function body")?;
        let body = self.parse_expression()?;

        Ok(Statement::FunctionDef {
            name,
            params,
            body,
            pos,
        })
    }

    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        if self.check(&TokenKind::Let) {
            self.parse_let_chain()
        } else {
            self.parse_pipe()
        }
    }

    /// `let x = e1, let y = e2, final` nests right; each binding scopes over
    /// the remainder of its own chain only.
    fn parse_let_chain(&mut self) -> Result<Expr, ParseError> {
        let pos = self.pos();
        self.expect(TokenKind::Let, "'let'")?;
        let name = self.expect_identifier("binding name after 'let'")?;
        self.expect(TokenKind::Assign, "'=' after binding name")?;
        let value = self.parse_pipe()?;
        self.expect(TokenKind::Comma, "',' after let binding")?;
        let body = self.parse_expression()?;

        Ok(Expr::Let {
            name,
            value: Box::new(value),
            body: Box::new(body),
            pos,
        })
    }

    /// The pipe production is right-recursive: `a |> b |> c` parses as
    /// `Pipe(a, Pipe(b, c))`. Data still flows left to right; the evaluator
    /// re-threads nested targets.
    fn parse_pipe(&mut self) -> Result<Expr, ParseError> {
        let source = self.parse_or()?;

        if self.check(&TokenKind::PipeArrow) {
            self.advance();
            let target = self.parse_pipe()?;
            Ok(Expr::Pipe {
                source: Box::new(source),
                target: Box::new(target),
            })
        } else {
            Ok(source)
        }
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;

        while self.check(&TokenKind::OrOr) {
            let pos = self.pos();
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Binary {
                op: BinOp::Or,
                left: Box::new(left),
                right: Box::new(right),
                pos,
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_equality()?;

        while self.check(&TokenKind::AndAnd) {
            let pos = self.pos();
            self.advance();
            let right = self.parse_equality()?;
            left = Expr::Binary {
                op: BinOp::And,
                left: Box::new(left),
                right: Box::new(right),
                pos,
            };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_relational()?;

        loop {
            let op = match self.kind() {
                TokenKind::EqEq => BinOp::Equal,
                TokenKind::NotEq => BinOp::NotEqual,
                _ => break,
            };
            let pos = self.pos();
            self.advance();
            let right = self.parse_relational()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                pos,
            };
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.kind() {
                TokenKind::Lt => BinOp::LessThan,
                TokenKind::Gt => BinOp::GreaterThan,
                TokenKind::LtEq => BinOp::LessEqual,
                TokenKind::GtEq => BinOp::GreaterEqual,
                _ => break,
            };
            let pos = self.pos();
            self.advance();
            let right = self.parse_additive()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                pos,
            };
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Subtract,
                _ => break,
            };
            let pos = self.pos();
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                pos,
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.kind() {
                TokenKind::Star => BinOp::Multiply,
                TokenKind::Slash => BinOp::Divide,
                TokenKind::Percent => BinOp::Modulo,
                _ => break,
            };
            let pos = self.pos();
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                pos,
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.kind() {
            TokenKind::Bang => UnOp::Not,
            TokenKind::Minus => UnOp::Negate,
            TokenKind::Plus => UnOp::Plus,
            _ => return self.parse_postfix(),
        };
        let pos = self.pos();
        self.advance();
        let operand = self.parse_unary()?; // right-associative
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
            pos,
        })
    }

    /// Parse postfix navigation: member, wildcard, recursive descent,
    /// attribute, index, and predicate access, chained left to right.
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.check(&TokenKind::Dot) {
                let pos = self.pos();
                self.advance();

                match self.kind() {
                    TokenKind::Star => {
                        self.advance();
                        expr = Expr::Wildcard {
                            target: Box::new(expr),
                            pos,
                        };
                    }
                    TokenKind::At => {
                        self.advance();
                        let name = self.expect_identifier("attribute name after '@'")?;
                        expr = Expr::Attribute {
                            target: Box::new(expr),
                            name,
                            pos,
                        };
                    }
                    TokenKind::Identifier(_) => {
                        let name = self.expect_identifier("member name")?;
                        expr = Expr::Member {
                            target: Box::new(expr),
                            name,
                            pos,
                        };
                    }
                    _ => return Err(self.error("member name, '*', or '@' after '.'")),
                }
            } else if self.check(&TokenKind::DotDot) {
                let pos = self.pos();
                self.advance();

                let key = match self.kind() {
                    TokenKind::Star => {
                        self.advance();
                        DescendKey::Wildcard
                    }
                    TokenKind::Identifier(_) => {
                        DescendKey::Name(self.expect_identifier("descendant name")?)
                    }
                    _ => return Err(self.error("descendant name or '*' after '..'")),
                };
                expr = Expr::Descend {
                    target: Box::new(expr),
                    key,
                    pos,
                };
            } else if self.check(&TokenKind::At) {
                let pos = self.pos();
                self.advance();
                let name = self.expect_identifier("attribute name after '@'")?;
                expr = Expr::Attribute {
                    target: Box::new(expr),
                    name,
                    pos,
                };
            } else if self.check(&TokenKind::LBracket) {
                let pos = self.pos();
                self.advance();
                expr = self.parse_bracket_access(expr, pos)?;
            } else {
                break;
            }
        }
        Ok(expr)
    }

    /// Disambiguate the bracket forms:
    /// `[*]` wildcard, `[0]` / `[-1]` index, `["quoted key"]` member,
    /// anything else a predicate filter.
    fn parse_bracket_access(&mut self, target: Expr, pos: Position) -> Result<Expr, ParseError> {
        if self.check(&TokenKind::Star) && *self.peek_kind(1) == TokenKind::RBracket {
            self.advance();
            self.advance();
            return Ok(Expr::Wildcard {
                target: Box::new(target),
                pos,
            });
        }

        if let Some(index) = self.bracket_index_literal()? {
            self.expect(TokenKind::RBracket, "']' after index")?;
            return Ok(Expr::Index {
                target: Box::new(target),
                index,
                pos,
            });
        }

        if let TokenKind::String(key) = self.kind()
            && *self.peek_kind(1) == TokenKind::RBracket
        {
            let name = key.clone();
            self.advance();
            self.advance();
            return Ok(Expr::Member {
                target: Box::new(target),
                name,
                pos,
            });
        }

        let condition = self.parse_expression()?;
        self.expect(TokenKind::RBracket, "']' after predicate")?;
        Ok(Expr::Predicate {
            target: Box::new(target),
            condition: Box::new(condition),
            pos,
        })
    }

    /// Recognize `[0]` and `[-1]` without consuming a predicate expression.
    fn bracket_index_literal(&mut self) -> Result<Option<i64>, ParseError> {
        let (negative, lexeme_at) = if self.check(&TokenKind::Minus) {
            (true, 1)
        } else {
            (false, 0)
        };

        if let TokenKind::Number(lexeme) = self.peek_kind(lexeme_at)
            && *self.peek_kind(lexeme_at + 1) == TokenKind::RBracket
            && !lexeme.contains(['.', 'e', 'E'])
        {
            let value: i64 = lexeme
                .parse()
                .map_err(|_| self.error("integer index in range"))?;
            self.advance();
            if negative {
                self.advance();
            }
            return Ok(Some(if negative { -value } else { value }));
        }
        Ok(None)
    }

    /// Parse primary expressions: literals, identifiers (and the calls and
    /// single-parameter lambdas they begin), grouped expressions,
    /// multi-parameter lambdas, object and array literals, and `if`.
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.kind().clone() {
            TokenKind::Number(lexeme) => {
                self.advance();
                self.number_literal(&lexeme)
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expr::String(s))
            }
            TokenKind::Boolean(b) => {
                self.advance();
                Ok(Expr::Boolean(b))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Null)
            }
            TokenKind::Identifier(name) => {
                let pos = self.pos();
                self.advance();

                if self.check(&TokenKind::LParen) {
                    self.advance();
                    let args = self.parse_call_args()?;
                    Ok(Expr::Call { name, args, pos })
                } else if self.check(&TokenKind::FatArrow) {
                    self.advance();
                    let body = self.parse_expression()?;
                    Ok(Expr::Lambda {
                        params: vec![name],
                        body: Box::new(body),
                    })
                } else {
                    Ok(Expr::Identifier { name, pos })
                }
            }
            TokenKind::LParen => {
                if self.lparen_starts_lambda() {
                    self.parse_lambda_params()
                } else {
                    self.advance();
                    let expr = self.parse_expression()?;
                    self.expect(TokenKind::RParen, "')'")?;
                    Ok(expr)
                }
            }
            TokenKind::LBrace => {
                self.advance();
                self.parse_object_literal()
            }
            TokenKind::LBracket => {
                self.advance();
                self.parse_array_literal()
            }
            TokenKind::If => self.parse_if(),
            _ => Err(self.error("an expression")),
        }
    }

    fn number_literal(&self, lexeme: &str) -> Result<Expr, ParseError> {
        if lexeme.contains(['.', 'e', 'E']) {
            lexeme
                .parse::<f64>()
                .map(Expr::Float)
                .map_err(|_| self.error("a valid numeric literal"))
        } else if let Ok(n) = lexeme.parse::<i64>() {
            Ok(Expr::Integer(n))
        } else {
            // Integer literal too wide for i64; keep the magnitude.
            lexeme
                .parse::<f64>()
                .map(Expr::Float)
                .map_err(|_| self.error("a valid numeric literal"))
        }
    }

    fn parse_call_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if self.check(&TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')' after arguments")?;
        Ok(args)
    }

    /// Lookahead for `(p1, p2, ...) =>` so parenthesized lambdas can be told
    /// apart from grouped expressions without backtracking.
    fn lparen_starts_lambda(&self) -> bool {
        let mut at = 1; // past '('
        if !matches!(self.peek_kind(at), TokenKind::Identifier(_)) {
            return false;
        }
        at += 1;
        while *self.peek_kind(at) == TokenKind::Comma {
            at += 1;
            if !matches!(self.peek_kind(at), TokenKind::Identifier(_)) {
                return false;
            }
            at += 1;
        }
        *self.peek_kind(at) == TokenKind::RParen && *self.peek_kind(at + 1) == TokenKind::FatArrow
    }

    fn parse_lambda_params(&mut self) -> Result<Expr, ParseError> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        loop {
            params.push(self.expect_identifier("parameter name")?);
            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RParen, "')' after parameters")?;
        self.expect(TokenKind::FatArrow, "'=>'")?;
        let body = self.parse_expression()?;
        Ok(Expr::Lambda {
            params,
            body: Box::new(body),
        })
    }

    /// Keys may be bare identifiers, quoted strings, or attribute keys
    /// (`@name` or a quoted key starting with `@`). Trailing commas are
    /// rejected: after a comma the next token must start another property.
    fn parse_object_literal(&mut self) -> Result<Expr, ParseError> {
        let mut properties = Vec::new();

        while !self.check(&TokenKind::RBrace) {
            let (key, is_attribute) = match self.kind().clone() {
                TokenKind::At => {
                    self.advance();
                    (self.expect_identifier("attribute key after '@'")?, true)
                }
                TokenKind::String(s) => {
                    self.advance();
                    match s.strip_prefix('@') {
                        Some(rest) => (rest.to_string(), true),
                        None => (s, false),
                    }
                }
                TokenKind::Identifier(name) => {
                    self.advance();
                    (name, false)
                }
                _ => return Err(self.error("object key")),
            };

            self.expect(TokenKind::Colon, "':' after object key")?;
            let value = self.parse_expression()?;
            properties.push(Property {
                key,
                value,
                is_attribute,
            });

            if !self.check(&TokenKind::RBrace) {
                self.expect(TokenKind::Comma, "',' or '}'")?;
                if self.check(&TokenKind::RBrace) {
                    return Err(self.error("object key after ','"));
                }
            }
        }

        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(Expr::Object(properties))
    }

    fn parse_array_literal(&mut self) -> Result<Expr, ParseError> {
        let mut elements = Vec::new();

        while !self.check(&TokenKind::RBracket) {
            elements.push(self.parse_expression()?);

            if !self.check(&TokenKind::RBracket) {
                self.expect(TokenKind::Comma, "',' or ']'")?;
                if self.check(&TokenKind::RBracket) {
                    return Err(self.error("array element after ','"));
                }
            }
        }

        self.expect(TokenKind::RBracket, "']'")?;
        Ok(Expr::Array(elements))
    }

    /// `if (cond) expr else expr`, with `else if` chains. An `if` without a
    /// final `else` is malformed: the expression must be total.
    fn parse_if(&mut self) -> Result<Expr, ParseError> {
        let pos = self.pos();
        self.expect(TokenKind::If, "'if'")?;
        self.expect(TokenKind::LParen, "'(' after 'if'")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen, "')' after condition")?;
        let then_branch = self.parse_expression()?;

        let mut else_ifs = Vec::new();
        let else_branch;
        loop {
            self.expect(TokenKind::Else, "'else' (if expressions must be total)")?;
            if self.check(&TokenKind::If) {
                self.advance();
                self.expect(TokenKind::LParen, "'(' after 'if'")?;
                let cond = self.parse_expression()?;
                self.expect(TokenKind::RParen, "')' after condition")?;
                let branch = self.parse_expression()?;
                else_ifs.push((cond, branch));
            } else {
                else_branch = self.parse_expression()?;
                break;
            }
        }

        Ok(Expr::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_ifs,
            else_branch: Box::new(else_branch),
            pos,
        })
    }
}
