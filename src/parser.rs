use crate::ast::*;
use crate::error::{SiccarError, SiccarResult};
use crate::token::{Token, TokenKind};

/// The parser - turns tokens intae an AST
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    next_id: NodeId,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            current: 0,
            next_id: 0,
        }
    }

    /// Parse the tokens intae a program
    pub fn parse(&mut self) -> SiccarResult<Program> {
        let mut statements = Vec::new();

        self.skip_newlines();

        while !self.is_at_end() {
            statements.push(self.declaration()?);
            self.skip_newlines();
        }

        Ok(Program::new(statements))
    }

    // Branch-bearing nodes get an id in the order they finish parsing.
    // Uniqueness is whit matters; probe slot order comes frae the
    // enumerator's walk, no frae these.
    fn next_node_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // === Declaration parsing ===

    fn declaration(&mut self) -> SiccarResult<Stmt> {
        if self.check(&TokenKind::Ken) {
            self.var_declaration()
        } else if self.check(&TokenKind::Dae) {
            self.function_declaration()
        } else if self.check(&TokenKind::Ilk) {
            self.enum_declaration()
        } else {
            self.statement()
        }
    }

    fn var_declaration(&mut self) -> SiccarResult<Stmt> {
        let span = self.current_span();
        self.advance(); // consume 'ken'

        let name = self.expect_identifier("variable name")?;

        let initializer = if self.match_token(&TokenKind::Equals) {
            Some(self.expression()?)
        } else {
            None
        };

        self.expect_statement_end()?;

        Ok(Stmt::VarDecl {
            name,
            initializer,
            span,
        })
    }

    fn function_declaration(&mut self) -> SiccarResult<Stmt> {
        let span = self.current_span();
        self.advance(); // consume 'dae'

        let name = self.expect_identifier("function name")?;
        self.expect(&TokenKind::LeftParen, "(")?;

        let mut params = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                params.push(self.expect_identifier("parameter name")?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect(&TokenKind::RightParen, ")")?;
        self.skip_newlines();
        self.expect(&TokenKind::LeftBrace, "{")?;

        let body = self.block_statements()?;

        Ok(Stmt::Function {
            name,
            params,
            body,
            span,
        })
    }

    fn enum_declaration(&mut self) -> SiccarResult<Stmt> {
        let span = self.current_span();
        self.advance(); // consume 'ilk'

        let name = self.expect_identifier("ilk name")?;
        self.skip_newlines();
        self.expect(&TokenKind::LeftBrace, "{")?;
        self.skip_newlines();

        let mut variants: Vec<String> = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            let variant_span = self.current_span();
            let variant = self.expect_identifier("variant name")?;
            if variants.contains(&variant) {
                return Err(SiccarError::DuplicateVariant {
                    ilk: name,
                    variant,
                    line: variant_span.line,
                });
            }
            variants.push(variant);
            self.skip_newlines();
            if !self.match_token(&TokenKind::Comma) {
                self.skip_newlines();
                break;
            }
            self.skip_newlines();
        }

        self.expect(&TokenKind::RightBrace, "}")?;

        if variants.is_empty() {
            return Err(SiccarError::ParseError {
                message: format!("The ilk '{}' needs at least ane variant", name),
                line: span.line,
            });
        }

        Ok(Stmt::Enum {
            name,
            variants,
            span,
        })
    }

    // === Statement parsing ===

    fn statement(&mut self) -> SiccarResult<Stmt> {
        if self.check(&TokenKind::Gin) {
            self.if_statement()
        } else if self.check(&TokenKind::Whiles) {
            self.while_statement()
        } else if self.check(&TokenKind::Fer) {
            self.for_statement()
        } else if self.check(&TokenKind::Gie) {
            self.return_statement()
        } else if self.check(&TokenKind::Blether) {
            self.print_statement()
        } else if self.check(&TokenKind::Brak) {
            self.break_statement()
        } else if self.check(&TokenKind::Haud) {
            self.continue_statement()
        } else if self.check(&TokenKind::Keek) {
            self.match_statement()
        } else if self.check(&TokenKind::LeftBrace) {
            self.block()
        } else {
            self.expression_statement()
        }
    }

    fn if_statement(&mut self) -> SiccarResult<Stmt> {
        let span = self.current_span();
        self.advance(); // consume 'gin'

        let condition = self.expression()?;
        self.skip_newlines();
        let then_branch = Box::new(self.block()?);

        let else_branch = if self.match_token(&TokenKind::Ither) {
            self.skip_newlines();
            if self.check(&TokenKind::Gin) {
                // else if
                Some(Box::new(self.if_statement()?))
            } else {
                Some(Box::new(self.block()?))
            }
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
            id: self.next_node_id(),
            span,
        })
    }

    fn while_statement(&mut self) -> SiccarResult<Stmt> {
        let span = self.current_span();
        self.advance(); // consume 'whiles'

        let condition = self.expression()?;
        self.skip_newlines();
        let body = Box::new(self.block()?);

        Ok(Stmt::While {
            condition,
            body,
            id: self.next_node_id(),
            span,
        })
    }

    fn for_statement(&mut self) -> SiccarResult<Stmt> {
        let span = self.current_span();
        self.advance(); // consume 'fer'

        let variable = self.expect_identifier("loop variable")?;
        self.expect(&TokenKind::In, "in")?;
        let iterable = self.expression()?;
        self.skip_newlines();
        let body = Box::new(self.block()?);

        Ok(Stmt::For {
            variable,
            iterable,
            body,
            id: self.next_node_id(),
            span,
        })
    }

    fn return_statement(&mut self) -> SiccarResult<Stmt> {
        let span = self.current_span();
        self.advance(); // consume 'gie'

        let value = if self.check(&TokenKind::Newline) || self.check(&TokenKind::Eof) {
            None
        } else {
            Some(self.expression()?)
        };

        self.expect_statement_end()?;

        Ok(Stmt::Return { value, span })
    }

    fn print_statement(&mut self) -> SiccarResult<Stmt> {
        let span = self.current_span();
        self.advance(); // consume 'blether'

        let value = self.expression()?;
        self.expect_statement_end()?;

        Ok(Stmt::Print { value, span })
    }

    fn break_statement(&mut self) -> SiccarResult<Stmt> {
        let span = self.current_span();
        self.advance(); // consume 'brak'
        self.expect_statement_end()?;
        Ok(Stmt::Break { span })
    }

    fn continue_statement(&mut self) -> SiccarResult<Stmt> {
        let span = self.current_span();
        self.advance(); // consume 'haud'
        self.expect_statement_end()?;
        Ok(Stmt::Continue { span })
    }

    fn match_statement(&mut self) -> SiccarResult<Stmt> {
        let span = self.current_span();
        self.advance(); // consume 'keek'

        let value = self.expression()?;
        self.skip_newlines();
        self.expect(&TokenKind::LeftBrace, "{")?;
        self.skip_newlines();

        let mut arms: Vec<MatchArm> = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            if let Some(last) = arms.last() {
                if last.pattern.is_default() {
                    return Err(SiccarError::ParseError {
                        message: "The catch-aw arm must be the last ane in a keek".to_string(),
                        line: self.current_line(),
                    });
                }
            }
            arms.push(self.match_arm()?);
            self.skip_newlines();
        }

        self.expect(&TokenKind::RightBrace, "}")?;

        if arms.is_empty() {
            return Err(SiccarError::ParseError {
                message: "A keek needs at least ane whan arm".to_string(),
                line: span.line,
            });
        }

        Ok(Stmt::Match {
            value,
            arms,
            id: self.next_node_id(),
            span,
        })
    }

    fn match_arm(&mut self) -> SiccarResult<MatchArm> {
        let span = self.current_span();
        self.expect(&TokenKind::Whan, "whan")?;

        let pattern = self.pattern()?;
        self.expect(&TokenKind::Arrow, "->")?;
        self.skip_newlines();

        // Match arms can have blocks, statements, or expressions
        let body = if self.check(&TokenKind::LeftBrace) {
            self.block()?
        } else if self.check(&TokenKind::Blether) {
            self.print_statement()?
        } else if self.check(&TokenKind::Gie) {
            self.return_statement()?
        } else if self.check(&TokenKind::Brak) {
            self.break_statement()?
        } else if self.check(&TokenKind::Haud) {
            self.continue_statement()?
        } else {
            let expr = self.expression()?;
            Stmt::Expression {
                span: expr.span(),
                expr,
            }
        };

        Ok(MatchArm {
            pattern,
            body,
            span,
        })
    }

    fn pattern(&mut self) -> SiccarResult<Pattern> {
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::Integer(n) => {
                let n = *n;
                self.advance();
                Ok(Pattern::Literal(Literal::Integer(n)))
            }
            TokenKind::Float(n) => {
                let n = *n;
                self.advance();
                Ok(Pattern::Literal(Literal::Float(n)))
            }
            TokenKind::String(s) => {
                let s = process_escapes(s);
                self.advance();
                Ok(Pattern::Literal(Literal::String(s)))
            }
            TokenKind::Aye => {
                self.advance();
                Ok(Pattern::Literal(Literal::Bool(true)))
            }
            TokenKind::Nae => {
                self.advance();
                Ok(Pattern::Literal(Literal::Bool(false)))
            }
            TokenKind::Naething => {
                self.advance();
                Ok(Pattern::Literal(Literal::Nil))
            }
            TokenKind::Underscore => {
                self.advance();
                Ok(Pattern::Wildcard)
            }
            TokenKind::Identifier(name) if name == "_" => {
                self.advance();
                Ok(Pattern::Wildcard)
            }
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                // Dotted path is an ilk variant: Season.Winter
                if self.match_token(&TokenKind::Dot) {
                    let variant = self.expect_identifier("variant name")?;
                    Ok(Pattern::Variant {
                        ilk: name,
                        name: variant,
                    })
                } else {
                    Ok(Pattern::Identifier(name))
                }
            }
            _ => Err(SiccarError::ParseError {
                message: format!("Expected pattern, got {}", token.kind),
                line: token.line,
            }),
        }
    }

    fn block(&mut self) -> SiccarResult<Stmt> {
        let span = self.current_span();
        self.expect(&TokenKind::LeftBrace, "{")?;
        let statements = self.block_statements()?;
        Ok(Stmt::Block { statements, span })
    }

    fn block_statements(&mut self) -> SiccarResult<Vec<Stmt>> {
        let mut statements = Vec::new();
        self.skip_newlines();

        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            statements.push(self.declaration()?);
            self.skip_newlines();
        }

        self.expect(&TokenKind::RightBrace, "}")?;
        Ok(statements)
    }

    fn expression_statement(&mut self) -> SiccarResult<Stmt> {
        let expr = self.expression()?;
        let span = expr.span();
        self.expect_statement_end()?;
        Ok(Stmt::Expression { expr, span })
    }

    // === Expression parsing (precedence climbing) ===

    fn expression(&mut self) -> SiccarResult<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> SiccarResult<Expr> {
        let expr = self.or()?;

        if self.match_token(&TokenKind::Equals) {
            let span = self.current_span();
            let value = self.assignment()?;

            match expr {
                Expr::Variable { name, .. } => {
                    return Ok(Expr::Assign {
                        name,
                        value: Box::new(value),
                        span,
                    });
                }
                _ => {
                    return Err(SiccarError::ParseError {
                        message: "Invalid assignment target".to_string(),
                        line: span.line,
                    });
                }
            }
        }

        Ok(expr)
    }

    fn or(&mut self) -> SiccarResult<Expr> {
        let mut expr = self.and()?;

        while self.match_token(&TokenKind::Or) {
            let span = self
                .previous()
                .map(|t| Span::new(t.line, t.column))
                .unwrap_or(self.current_span());
            let right = self.and()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator: LogicalOp::Or,
                right: Box::new(right),
                id: self.next_node_id(),
                span,
            };
        }

        Ok(expr)
    }

    fn and(&mut self) -> SiccarResult<Expr> {
        let mut expr = self.equality()?;

        while self.match_token(&TokenKind::An) {
            let span = self
                .previous()
                .map(|t| Span::new(t.line, t.column))
                .unwrap_or(self.current_span());
            let right = self.equality()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator: LogicalOp::And,
                right: Box::new(right),
                id: self.next_node_id(),
                span,
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> SiccarResult<Expr> {
        let mut expr = self.comparison()?;

        loop {
            let op = if self.match_token(&TokenKind::EqualsEquals) {
                BinaryOp::Equal
            } else if self.match_token(&TokenKind::BangEquals) {
                BinaryOp::NotEqual
            } else {
                break;
            };

            let span = self
                .previous()
                .map(|t| Span::new(t.line, t.column))
                .unwrap_or(self.current_span());
            let right = self.comparison()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator: op,
                right: Box::new(right),
                span,
            };
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> SiccarResult<Expr> {
        let mut expr = self.term()?;

        loop {
            let op = if self.match_token(&TokenKind::Less) {
                BinaryOp::Less
            } else if self.match_token(&TokenKind::LessEquals) {
                BinaryOp::LessEqual
            } else if self.match_token(&TokenKind::Greater) {
                BinaryOp::Greater
            } else if self.match_token(&TokenKind::GreaterEquals) {
                BinaryOp::GreaterEqual
            } else {
                break;
            };

            let span = self
                .previous()
                .map(|t| Span::new(t.line, t.column))
                .unwrap_or(self.current_span());
            let right = self.term()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator: op,
                right: Box::new(right),
                span,
            };
        }

        Ok(expr)
    }

    fn term(&mut self) -> SiccarResult<Expr> {
        let mut expr = self.factor()?;

        loop {
            let op = if self.match_token(&TokenKind::Plus) {
                BinaryOp::Add
            } else if self.match_token(&TokenKind::Minus) {
                BinaryOp::Subtract
            } else {
                break;
            };

            let span = self
                .previous()
                .map(|t| Span::new(t.line, t.column))
                .unwrap_or(self.current_span());
            let right = self.factor()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator: op,
                right: Box::new(right),
                span,
            };
        }

        Ok(expr)
    }

    fn factor(&mut self) -> SiccarResult<Expr> {
        let mut expr = self.unary()?;

        loop {
            let op = if self.match_token(&TokenKind::Star) {
                BinaryOp::Multiply
            } else if self.match_token(&TokenKind::Slash) {
                BinaryOp::Divide
            } else if self.match_token(&TokenKind::Percent) {
                BinaryOp::Modulo
            } else {
                break;
            };

            let span = self
                .previous()
                .map(|t| Span::new(t.line, t.column))
                .unwrap_or(self.current_span());
            let right = self.unary()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator: op,
                right: Box::new(right),
                span,
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> SiccarResult<Expr> {
        if self.match_token(&TokenKind::Minus) {
            let span = self
                .previous()
                .map(|t| Span::new(t.line, t.column))
                .unwrap_or(self.current_span());
            let operand = self.unary()?;
            return Ok(Expr::Unary {
                operator: UnaryOp::Negate,
                operand: Box::new(operand),
                span,
            });
        }

        // For `nae`, we need to distinguish between:
        // - `nae` as a boolean literal (when not followed by an operand)
        // - `nae x` as a NOT operator (when followed by an operand)
        if self.check(&TokenKind::Nae) && self.is_nae_followed_by_operand() {
            self.advance(); // consume nae
            let span = self
                .previous()
                .map(|t| Span::new(t.line, t.column))
                .unwrap_or(self.current_span());
            let operand = self.unary()?;
            return Ok(Expr::Unary {
                operator: UnaryOp::Not,
                operand: Box::new(operand),
                span,
            });
        }

        if self.match_token(&TokenKind::Bang) {
            let span = self
                .previous()
                .map(|t| Span::new(t.line, t.column))
                .unwrap_or(self.current_span());
            let operand = self.unary()?;
            return Ok(Expr::Unary {
                operator: UnaryOp::Not,
                operand: Box::new(operand),
                span,
            });
        }

        self.call()
    }

    /// Check if `nae` is followed by something that could be an operand
    fn is_nae_followed_by_operand(&self) -> bool {
        if self.current + 1 >= self.tokens.len() {
            return false;
        }
        let next = &self.tokens[self.current + 1];
        matches!(
            next.kind,
            TokenKind::Integer(_)
                | TokenKind::Float(_)
                | TokenKind::String(_)
                | TokenKind::Identifier(_)
                | TokenKind::LeftParen
                | TokenKind::Minus
                | TokenKind::Bang
                | TokenKind::Aye
                | TokenKind::Naething
        )
    }

    fn call(&mut self) -> SiccarResult<Expr> {
        let mut expr = self.primary()?;

        loop {
            if self.match_token(&TokenKind::LeftParen) {
                expr = self.finish_call(expr)?;
            } else if self.match_token(&TokenKind::Dot) {
                let property = self.expect_identifier("property name")?;
                let span = self.current_span();
                expr = Expr::Get {
                    object: Box::new(expr),
                    property,
                    span,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> SiccarResult<Expr> {
        let span = callee.span();
        let mut arguments = Vec::new();

        if !self.check(&TokenKind::RightParen) {
            loop {
                arguments.push(self.expression()?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect(&TokenKind::RightParen, ")")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            arguments,
            span,
        })
    }

    fn primary(&mut self) -> SiccarResult<Expr> {
        let token = self.peek().clone();
        let span = Span::new(token.line, token.column);

        match &token.kind {
            TokenKind::Integer(n) => {
                let n = *n;
                self.advance();
                self.maybe_range(Expr::Literal {
                    value: Literal::Integer(n),
                    span,
                })
            }
            TokenKind::Float(n) => {
                let n = *n;
                self.advance();
                Ok(Expr::Literal {
                    value: Literal::Float(n),
                    span,
                })
            }
            TokenKind::String(s) => {
                let s = process_escapes(s);
                self.advance();
                Ok(Expr::Literal {
                    value: Literal::String(s),
                    span,
                })
            }
            TokenKind::Aye => {
                self.advance();
                Ok(Expr::Literal {
                    value: Literal::Bool(true),
                    span,
                })
            }
            TokenKind::Nae => {
                self.advance();
                Ok(Expr::Literal {
                    value: Literal::Bool(false),
                    span,
                })
            }
            TokenKind::Naething => {
                self.advance();
                Ok(Expr::Literal {
                    value: Literal::Nil,
                    span,
                })
            }
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                let expr = Expr::Variable { name, span };
                self.maybe_range(expr)
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.expect(&TokenKind::RightParen, ")")?;
                Ok(Expr::Grouping {
                    expr: Box::new(expr),
                    span,
                })
            }
            _ => Err(SiccarError::ParseError {
                message: format!("Unexpected token: {}", token.kind),
                line: token.line,
            }),
        }
    }

    fn maybe_range(&mut self, start_expr: Expr) -> SiccarResult<Expr> {
        if self.match_token(&TokenKind::DotDot) {
            let span = start_expr.span();
            let end = self.term()?;
            Ok(Expr::Range {
                start: Box::new(start_expr),
                end: Box::new(end),
                span,
            })
        } else {
            Ok(start_expr)
        }
    }

    // === Helper methods ===

    fn peek(&self) -> &Token {
        self.tokens
            .get(self.current)
            .unwrap_or(&self.tokens[self.tokens.len() - 1])
    }

    fn previous(&self) -> Option<&Token> {
        if self.current > 0 {
            self.tokens.get(self.current - 1)
        } else {
            None
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous().unwrap()
    }

    fn check(&self, kind: &TokenKind) -> bool {
        if self.is_at_end() {
            false
        } else {
            std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
        }
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, expected: &str) -> SiccarResult<()> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(SiccarError::UnexpectedToken {
                expected: expected.to_string(),
                found: self.peek().kind.to_string(),
                line: self.peek().line,
            })
        }
    }

    fn expect_identifier(&mut self, context: &str) -> SiccarResult<String> {
        let token = self.peek().clone();
        if let TokenKind::Identifier(name) = &token.kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(SiccarError::UnexpectedToken {
                expected: context.to_string(),
                found: token.kind.to_string(),
                line: token.line,
            })
        }
    }

    fn expect_statement_end(&mut self) -> SiccarResult<()> {
        if self.is_at_end() || self.check(&TokenKind::RightBrace) {
            return Ok(());
        }

        if self.match_token(&TokenKind::Newline) {
            return Ok(());
        }

        if self.match_token(&TokenKind::Semicolon) {
            self.skip_newlines();
            return Ok(());
        }

        // Be lenient - if the next token starts a new statement, that's fine
        let next = &self.peek().kind;
        if matches!(
            next,
            TokenKind::Ken
                | TokenKind::Dae
                | TokenKind::Ilk
                | TokenKind::Gin
                | TokenKind::Whiles
                | TokenKind::Fer
                | TokenKind::Gie
                | TokenKind::Blether
                | TokenKind::Brak
                | TokenKind::Haud
                | TokenKind::Keek
        ) {
            return Ok(());
        }

        Err(SiccarError::UnexpectedToken {
            expected: "newline or ';'".to_string(),
            found: self.peek().kind.to_string(),
            line: self.peek().line,
        })
    }

    fn skip_newlines(&mut self) {
        while self.match_token(&TokenKind::Newline) {}
    }

    fn current_span(&self) -> Span {
        let token = self.peek();
        Span::new(token.line, token.column)
    }

    fn current_line(&self) -> usize {
        self.peek().line
    }
}

/// Process escape sequences in a string
fn process_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('r') => result.push('\r'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some(other) => {
                    // Unknown escape - keep as-is
                    result.push('\\');
                    result.push(other);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Convenience function tae parse source code
pub fn parse(source: &str) -> SiccarResult<Program> {
    let tokens = crate::lexer::lex(source)?;
    let mut parser = Parser::new(tokens);
    parser.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_declaration() {
        let program = parse("ken x = 5").unwrap();
        assert_eq!(program.statements.len(), 1);
        assert!(matches!(program.statements[0], Stmt::VarDecl { .. }));
    }

    #[test]
    fn test_function_declaration() {
        let program = parse("dae greet(name) {\n  blether name\n}").unwrap();
        assert_eq!(program.statements.len(), 1);
        assert!(matches!(program.statements[0], Stmt::Function { .. }));
    }

    #[test]
    fn test_enum_declaration() {
        let program = parse("ilk Season { Spring, Simmer, Hairst, Winter }").unwrap();
        assert_eq!(program.statements.len(), 1);
        match &program.statements[0] {
            Stmt::Enum { name, variants, .. } => {
                assert_eq!(name, "Season");
                assert_eq!(variants, &["Spring", "Simmer", "Hairst", "Winter"]);
            }
            other => panic!("Expected Enum, got {:?}", other),
        }
    }

    #[test]
    fn test_enum_multiline() {
        let program = parse("ilk Sweetie {\n  Soor,\n  Toffee,\n  Tablet\n}").unwrap();
        match &program.statements[0] {
            Stmt::Enum { variants, .. } => assert_eq!(variants.len(), 3),
            other => panic!("Expected Enum, got {:?}", other),
        }
    }

    #[test]
    fn test_enum_duplicate_variant_rejected() {
        let err = parse("ilk Season { Winter, Winter }").unwrap_err();
        assert!(matches!(err, SiccarError::DuplicateVariant { .. }));
    }

    #[test]
    fn test_enum_empty_rejected() {
        let err = parse("ilk Toom { }").unwrap_err();
        assert!(matches!(err, SiccarError::ParseError { .. }));
    }

    #[test]
    fn test_if_statement() {
        let program =
            parse("gin x > 5 {\n  blether \"big\"\n} ither {\n  blether \"wee\"\n}").unwrap();
        assert_eq!(program.statements.len(), 1);
        assert!(matches!(program.statements[0], Stmt::If { .. }));
    }

    #[test]
    fn test_while_loop() {
        let program = parse("whiles x < 10 {\n  x = x + 1\n}").unwrap();
        assert_eq!(program.statements.len(), 1);
        assert!(matches!(program.statements[0], Stmt::While { .. }));
    }

    #[test]
    fn test_for_loop() {
        let program = parse("fer i in 1..10 {\n  blether i\n}").unwrap();
        assert_eq!(program.statements.len(), 1);
        assert!(matches!(program.statements[0], Stmt::For { .. }));
    }

    #[test]
    fn test_expressions() {
        let program = parse("ken x = 5 + 3 * 2").unwrap();
        assert_eq!(program.statements.len(), 1);
    }

    #[test]
    fn test_match_statement() {
        let program =
            parse("keek x {\n  whan 1 -> { blether \"one\" }\n  whan _ -> { blether \"other\" }\n}")
                .unwrap();
        assert_eq!(program.statements.len(), 1);
        assert!(matches!(program.statements[0], Stmt::Match { .. }));
    }

    #[test]
    fn test_match_variant_patterns() {
        let source = "keek s {\n  whan Season.Spring -> blether \"buds\"\n  whan Season.Winter -> blether \"snaw\"\n  whan _ -> blether \"mild\"\n}";
        let program = parse(source).unwrap();
        match &program.statements[0] {
            Stmt::Match { arms, .. } => {
                assert_eq!(arms.len(), 3);
                assert!(matches!(
                    &arms[0].pattern,
                    Pattern::Variant { ilk, name } if ilk == "Season" && name == "Spring"
                ));
                assert!(matches!(&arms[2].pattern, Pattern::Wildcard));
            }
            other => panic!("Expected Match, got {:?}", other),
        }
    }

    #[test]
    fn test_match_default_must_be_last() {
        let source = "keek x {\n  whan _ -> blether \"aw\"\n  whan 1 -> blether \"one\"\n}";
        let err = parse(source).unwrap_err();
        assert!(matches!(err, SiccarError::ParseError { .. }));
    }

    #[test]
    fn test_match_needs_an_arm() {
        let err = parse("keek x {\n}").unwrap_err();
        assert!(matches!(err, SiccarError::ParseError { .. }));
    }

    #[test]
    fn test_logical_nodes_get_distinct_ids() {
        let program = parse("ken x = a an b or c").unwrap();
        fn collect_ids(expr: &Expr, ids: &mut Vec<NodeId>) {
            match expr {
                Expr::Logical {
                    left, right, id, ..
                } => {
                    ids.push(*id);
                    collect_ids(left, ids);
                    collect_ids(right, ids);
                }
                Expr::Binary { left, right, .. } => {
                    collect_ids(left, ids);
                    collect_ids(right, ids);
                }
                _ => {}
            }
        }
        let mut ids = Vec::new();
        if let Stmt::VarDecl {
            initializer: Some(expr),
            ..
        } = &program.statements[0]
        {
            collect_ids(expr, &mut ids);
        }
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_variant_access_expression() {
        let program = parse("ken s = Season.Hairst").unwrap();
        if let Stmt::VarDecl {
            initializer: Some(Expr::Get { property, .. }),
            ..
        } = &program.statements[0]
        {
            assert_eq!(property, "Hairst");
        } else {
            panic!("Expected Get expression");
        }
    }

    #[test]
    fn test_nae_as_literal_and_not() {
        // nae on its ain is the false literal
        let program = parse("ken x = nae").unwrap();
        if let Stmt::VarDecl {
            initializer: Some(Expr::Literal { value, .. }),
            ..
        } = &program.statements[0]
        {
            assert_eq!(value, &Literal::Bool(false));
        } else {
            panic!("Expected literal false");
        }

        // nae followed by an operand is logical NOT
        let program = parse("ken x = nae aye").unwrap();
        if let Stmt::VarDecl {
            initializer: Some(expr),
            ..
        } = &program.statements[0]
        {
            assert!(matches!(
                expr,
                Expr::Unary {
                    operator: UnaryOp::Not,
                    ..
                }
            ));
        } else {
            panic!("Expected unary not");
        }
    }

    #[test]
    fn test_parse_error_carries_line() {
        let err = parse("ken x = 5\nken = 7").unwrap_err();
        assert_eq!(err.line(), Some(2));
    }
}
