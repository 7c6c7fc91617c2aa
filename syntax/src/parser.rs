//! Turns a preprocessed source string into the declaration stream
//! [`gramforge_core::builder::Builder`] consumes, plus the codegen-only
//! [`Pragma`] list.

use gramforge_core::declaration::{Assoc, Declaration};

use crate::error::SyntaxError;
use crate::pragma::Pragma;
use crate::token::{Lexer, Token};

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: (Token, u32),
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Result<Self, SyntaxError> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        Ok(Parser { lexer, current })
    }

    fn line(&self) -> u32 {
        self.current.1
    }

    fn advance(&mut self) -> Result<Token, SyntaxError> {
        let (next, line) = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, (next, line)).0)
    }

    fn expect_ident(&mut self) -> Result<String, SyntaxError> {
        match self.advance()? {
            Token::Ident(s) => Ok(s),
            other => Err(SyntaxError::UnexpectedToken { line: self.line(), found: format!("{other:?}") }),
        }
    }

    fn expect_dot(&mut self) -> Result<(), SyntaxError> {
        match self.advance()? {
            Token::Dot => Ok(()),
            other => Err(SyntaxError::UnexpectedToken { line: self.line(), found: format!("{other:?}") }),
        }
    }

    fn expect_action_code(&mut self) -> Result<String, SyntaxError> {
        match self.advance()? {
            Token::ActionCode(s) => Ok(s),
            other => Err(SyntaxError::UnexpectedToken { line: self.line(), found: format!("{other:?}") }),
        }
    }

    /// `NAME1 NAME2 ... .` (space separated, no aliases).
    fn ident_list_until_dot(&mut self) -> Result<Vec<String>, SyntaxError> {
        let mut out = Vec::new();
        loop {
            match &self.current.0 {
                Token::Dot => {
                    self.advance()?;
                    return Ok(out);
                }
                Token::Ident(_) => out.push(self.expect_ident()?),
                other => return Err(SyntaxError::UnexpectedToken { line: self.line(), found: format!("{other:?}") }),
            }
        }
    }

    /// `NAME1|NAME2|... .`
    fn pipe_list_until_dot(&mut self) -> Result<Vec<String>, SyntaxError> {
        let mut out = Vec::new();
        out.push(self.expect_ident()?);
        loop {
            match &self.current.0 {
                Token::Pipe => {
                    self.advance()?;
                    out.push(self.expect_ident()?);
                }
                Token::Dot => {
                    self.advance()?;
                    return Ok(out);
                }
                other => return Err(SyntaxError::UnexpectedToken { line: self.line(), found: format!("{other:?}") }),
            }
        }
    }

    fn directive(&mut self, name: String, decls: &mut Vec<Declaration>, pragmas: &mut Vec<Pragma>) -> Result<(), SyntaxError> {
        self.advance()?; // consume the Directive token itself
        match name.as_str() {
            "token_class" => {
                let class_name = self.expect_ident()?;
                let constituents = self.pipe_list_until_dot()?;
                decls.push(Declaration::TokenClass { name: class_name, constituents });
            }
            "left" | "right" | "nonassoc" => {
                let assoc = match name.as_str() {
                    "left" => Assoc::Left,
                    "right" => Assoc::Right,
                    _ => Assoc::Nonassoc,
                };
                let terminals = self.ident_list_until_dot()?;
                decls.push(Declaration::PrecedenceBand { assoc, terminals });
            }
            "start_symbol" => {
                let name = self.expect_ident()?;
                self.expect_dot()?;
                decls.push(Declaration::StartSymbol(name));
            }
            "fallback" => {
                let fallback = self.expect_ident()?;
                let terminals = self.ident_list_until_dot()?;
                decls.push(Declaration::Fallback { fallback, terminals });
            }
            "wildcard" => {
                let name = self.expect_ident()?;
                self.expect_dot()?;
                decls.push(Declaration::Wildcard(name));
            }
            "extra_argument" => pragmas.push(Pragma::ExtraArgument(self.expect_action_code()?.trim().to_string())),
            "token_type" => pragmas.push(Pragma::TokenType(self.expect_action_code()?.trim().to_string())),
            "default_type" => pragmas.push(Pragma::DefaultType(self.expect_action_code()?.trim().to_string())),
            "syntax_error" => pragmas.push(Pragma::SyntaxError(self.expect_action_code()?)),
            "parse_failure" => pragmas.push(Pragma::ParseFailure(self.expect_action_code()?)),
            "parse_accept" => pragmas.push(Pragma::ParseAccept(self.expect_action_code()?)),
            "destructor" => {
                let symbol = self.expect_ident()?;
                let code = self.expect_action_code()?;
                pragmas.push(Pragma::Destructor { symbol, code });
            }
            other => {
                return Err(SyntaxError::UnexpectedToken { line: self.line(), found: format!("%{other}") });
            }
        }
        Ok(())
    }

    /// `lhs(alias)? ::= rhs(alias)? ... [PRECSYM]? . { action }?`
    fn rule(&mut self, decls: &mut Vec<Declaration>) -> Result<(), SyntaxError> {
        let lhs = self.expect_ident()?;
        let lhs_alias = self.take_alias()?;
        match self.advance()? {
            Token::Arrow => {}
            other => return Err(SyntaxError::UnexpectedToken { line: self.line(), found: format!("{other:?}") }),
        }
        decls.push(Declaration::RuleStart { lhs, lhs_alias });

        loop {
            match &self.current.0 {
                Token::Ident(_) => {
                    let symbol = self.expect_ident()?;
                    let alias = self.take_alias()?;
                    decls.push(Declaration::RuleAppend { symbol, alias });
                }
                Token::LBracket | Token::Dot => break,
                other => return Err(SyntaxError::UnexpectedToken { line: self.line(), found: format!("{other:?}") }),
            }
        }

        let explicit_prec = if matches!(self.current.0, Token::LBracket) {
            self.advance()?;
            let sym = self.expect_ident()?;
            match self.advance()? {
                Token::RBracket => {}
                other => return Err(SyntaxError::UnexpectedToken { line: self.line(), found: format!("{other:?}") }),
            }
            Some(sym)
        } else {
            None
        };

        self.expect_dot()?;

        let action_code = if matches!(self.current.0, Token::ActionCode(_)) {
            Some(self.expect_action_code()?)
        } else {
            None
        };

        decls.push(Declaration::RuleFinish { action_code, explicit_prec });
        Ok(())
    }

    fn take_alias(&mut self) -> Result<Option<String>, SyntaxError> {
        if matches!(self.current.0, Token::Alias(_)) {
            match self.advance()? {
                Token::Alias(a) => Ok(Some(a)),
                _ => unreachable!(),
            }
        } else {
            Ok(None)
        }
    }

    pub fn parse(mut self) -> Result<(Vec<Declaration>, Vec<Pragma>), SyntaxError> {
        let mut decls = Vec::new();
        let mut pragmas = Vec::new();
        loop {
            match self.current.0.clone() {
                Token::Eof => break,
                Token::Directive(name) => self.directive(name, &mut decls, &mut pragmas)?,
                Token::Ident(_) => self.rule(&mut decls)?,
                other => return Err(SyntaxError::UnexpectedToken { line: self.line(), found: format!("{other:?}") }),
            }
        }
        Ok((decls, pragmas))
    }
}

pub fn parse(source: &str) -> Result<(Vec<Declaration>, Vec<Pragma>), SyntaxError> {
    Parser::new(source)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_precedence_and_two_rules() {
        let src = "%left Plus .\nexpr ::= expr Plus expr. { }\nexpr ::= Id.\n";
        let (decls, pragmas) = parse(src).unwrap();
        assert!(pragmas.is_empty());
        assert!(matches!(decls[0], Declaration::PrecedenceBand { .. }));
        let rule_starts = decls.iter().filter(|d| matches!(d, Declaration::RuleStart { .. })).count();
        assert_eq!(rule_starts, 2);
    }

    #[test]
    fn parses_aliases_and_bracketed_precedence_override() {
        let src = "e(A) ::= Minus e(B) [Uminus]. { A = -B; }\n";
        let (decls, _) = parse(src).unwrap();
        assert!(matches!(&decls[0], Declaration::RuleStart { lhs, lhs_alias } if lhs == "e" && lhs_alias.as_deref() == Some("A")));
        let finish = decls.last().unwrap();
        match finish {
            Declaration::RuleFinish { action_code, explicit_prec } => {
                assert_eq!(explicit_prec.as_deref(), Some("Uminus"));
                assert!(action_code.is_some());
            }
            _ => panic!("expected RuleFinish"),
        }
    }

    #[test]
    fn parses_token_class_and_pragmas() {
        let src = "%token_class number Int|Float.\n%token_type { i64 }\ne ::= number.\n";
        let (decls, pragmas) = parse(src).unwrap();
        assert!(matches!(&decls[0], Declaration::TokenClass { name, constituents } if name == "number" && constituents.len() == 2));
        assert!(matches!(pragmas[0], Pragma::TokenType(ref t) if t == "i64"));
    }
}
