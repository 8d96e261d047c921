use logos::Logos;

use crate::error::{SiccarError, SiccarResult};
use crate::token::{Token, TokenKind};

/// The lexer - turns braw source intae tokens
pub struct Lexer<'source> {
    source: &'source str,
    logos: logos::Lexer<'source, TokenKind>,
    line: usize,
    column: usize,
    cursor: usize,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Lexer {
            source,
            logos: TokenKind::lexer(source),
            line: 1,
            column: 1,
            cursor: 0,
        }
    }

    fn advance_to(&mut self, pos: usize) {
        let slice = &self.source[self.cursor..pos];
        for ch in slice.chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.cursor = pos;
    }

    /// Tokenize the whole source intae a vector
    pub fn tokenize(&mut self) -> SiccarResult<Vec<Token>> {
        let mut tokens = Vec::new();

        while let Some(result) = self.logos.next() {
            let span = self.logos.span();
            self.advance_to(span.start);
            let token_line = self.line;
            let token_column = self.column;
            let lexeme = self.logos.slice().to_string();

            match result {
                Ok(kind) => {
                    tokens.push(Token::new(kind, lexeme, token_line, token_column));
                }
                Err(_) => {
                    return Err(SiccarError::UnkentToken {
                        lexeme,
                        line: token_line,
                        column: token_column,
                    });
                }
            }

            self.advance_to(span.end);
        }

        // Add EOF token
        tokens.push(Token::eof(self.line));

        Ok(tokens)
    }
}

/// Convenience function tae lex a string
pub fn lex(source: &str) -> SiccarResult<Vec<Token>> {
    let mut lexer = Lexer::new(source);
    lexer.tokenize()
}
