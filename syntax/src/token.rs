//! Hand-rolled scanner for the grammar dialect (§6b). Grounded on the
//! `ParseInput`/`Peekable` wrapping style used for the reference parser
//! input (peek-then-consume over `Chars`, never building an intermediate
//! `Vec<char>`).

use std::iter::Peekable;
use std::str::Chars;

use crate::error::SyntaxError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A `%whatever` directive keyword, without the `%`.
    Directive(String),
    /// A bare identifier, optionally followed by `(alias)` already split out.
    Ident(String),
    Alias(String),
    Arrow,
    Dot,
    Pipe,
    RParen,
    LBracket,
    RBracket,
    /// Raw text inside a brace-matched `{ ... }` action code block.
    ActionCode(String),
    StringLit(String),
    Eof,
}

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer { chars: source.chars().peekable(), line: 1 }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c == Some('\n') {
            self.line += 1;
        }
        c
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.chars.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let mut clone = self.chars.clone();
                    clone.next();
                    match clone.peek() {
                        Some('/') => {
                            while !matches!(self.chars.peek(), None | Some('\n')) {
                                self.bump();
                            }
                        }
                        Some('*') => {
                            self.bump();
                            self.bump();
                            loop {
                                match self.bump() {
                                    None => break,
                                    Some('*') if self.chars.peek() == Some(&'/') => {
                                        self.bump();
                                        break;
                                    }
                                    _ => {}
                                }
                            }
                        }
                        _ => return,
                    }
                }
                _ => return,
            }
        }
    }

    fn read_action_code(&mut self) -> Result<String, SyntaxError> {
        let start_line = self.line;
        let mut depth = 1;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(SyntaxError::UnterminatedActionCode(start_line)),
                Some('{') => {
                    depth += 1;
                    out.push('{');
                }
                Some('}') => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(out);
                    }
                    out.push('}');
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn read_string(&mut self) -> Result<String, SyntaxError> {
        let start_line = self.line;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(SyntaxError::UnterminatedString(start_line)),
                Some('"') => return Ok(out),
                Some(c) => out.push(c),
            }
        }
    }

    fn read_word(&mut self, first: char) -> String {
        let mut out = String::new();
        out.push(first);
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                out.push(c);
                self.bump();
            } else {
                break;
            }
        }
        out
    }

    /// Returns the next `(token, line it started on)` pair.
    pub fn next_token(&mut self) -> Result<(Token, u32), SyntaxError> {
        self.skip_trivia();
        let line = self.line;
        let c = match self.bump() {
            None => return Ok((Token::Eof, line)),
            Some(c) => c,
        };
        let tok = match c {
            '{' => Token::ActionCode(self.read_action_code()?),
            '"' => Token::StringLit(self.read_string()?),
            '.' => Token::Dot,
            '|' => Token::Pipe,
            '(' => {
                let mut alias = String::new();
                while let Some(&c) = self.chars.peek() {
                    if c == ')' {
                        break;
                    }
                    alias.push(c);
                    self.bump();
                }
                self.bump(); // ')'
                Token::Alias(alias)
            }
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            ':' => {
                // `::=`
                if self.bump() != Some(':') {
                    return Err(SyntaxError::UnexpectedToken { line, found: ":".into() });
                }
                if self.bump() != Some('=') {
                    return Err(SyntaxError::UnexpectedToken { line, found: "::".into() });
                }
                Token::Arrow
            }
            '%' => {
                let first = self.bump().ok_or(SyntaxError::UnexpectedToken { line, found: "%".into() })?;
                Token::Directive(self.read_word(first))
            }
            c if c.is_alphabetic() || c == '_' => Token::Ident(self.read_word(c)),
            other => {
                return Err(SyntaxError::UnexpectedToken { line, found: other.to_string() });
            }
        };
        Ok((tok, line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_tokens(src: &str) -> Vec<Token> {
        let mut lex = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let (tok, _) = lex.next_token().unwrap();
            if tok == Token::Eof {
                break;
            }
            out.push(tok);
        }
        out
    }

    #[test]
    fn lexes_a_simple_rule() {
        let toks = all_tokens("expr(A) ::= expr(B) Plus expr(C). { A = B + C; }");
        assert_eq!(
            toks,
            vec![
                Token::Ident("expr".into()),
                Token::Alias("A".into()),
                Token::Arrow,
                Token::Ident("expr".into()),
                Token::Alias("B".into()),
                Token::Ident("Plus".into()),
                Token::Ident("expr".into()),
                Token::Alias("C".into()),
                Token::Dot,
                Token::ActionCode(" A = B + C; ".into()),
            ]
        );
    }

    #[test]
    fn lexes_nested_braces_in_action_code() {
        let toks = all_tokens("e ::= Id. { if x { y(); } }");
        assert_eq!(toks.last(), Some(&Token::ActionCode(" if x { y(); } ".into())));
    }

    #[test]
    fn skips_line_and_block_comments() {
        let toks = all_tokens("// comment\n%left /* inline */ Plus .");
        assert_eq!(toks, vec![Token::Directive("left".into()), Token::Ident("Plus".into()), Token::Dot]);
    }
}
