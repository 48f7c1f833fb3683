//! Parser for the prefix formula syntax.
//!
//! The syntax is a Lisp-like prefix notation: `Var "name"`, `Not f`,
//! `And f g`, `Or f g`, `Implies f g`, `Iff f g` and the constants `T` and
//! `F`. Parentheses are allowed around any subformula. Comments run from `#`
//! or `//` to the end of the line. Names are double-quoted identifiers
//! matching `[A-Za-z_][A-Za-z0-9_]*`.
use std::io;

use anyhow::Error;
use thiserror::Error;

use satori_formula::Expr;

/// Possible errors while parsing a prefix formula.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("line {line}: unexpected character: '{unexpected}'")]
    UnexpectedChar { line: usize, unexpected: char },
    #[error("line {line}: invalid variable name")]
    InvalidName { line: usize },
    #[error("line {line}: expected {expected}, found {found}")]
    UnexpectedToken {
        line: usize,
        expected: &'static str,
        found: String,
    },
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("line {line}: trailing input after formula")]
    TrailingInput { line: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    LParen,
    RParen,
    Ident(String),
    Name(String),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::LParen => "'('".to_owned(),
            Token::RParen => "')'".to_owned(),
            Token::Ident(ident) => format!("'{}'", ident),
            Token::Name(name) => format!("\"{}\"", name),
        }
    }
}

/// Tokenize the input, stripping comments and whitespace.
fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, ParserError> {
    let mut tokens = vec![];
    let mut line = 1;
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            '\n' => {
                line += 1;
                chars.next();
            }
            _ if ch.is_whitespace() => {
                chars.next();
            }
            '#' => skip_line(&mut chars),
            '/' => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    skip_line(&mut chars);
                } else {
                    return Err(ParserError::UnexpectedChar {
                        line,
                        unexpected: '/',
                    });
                }
            }
            '(' => {
                tokens.push((line, Token::LParen));
                chars.next();
            }
            ')' => {
                tokens.push((line, Token::RParen));
                chars.next();
            }
            '"' => {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some(ch) if ch == '_' || ch.is_ascii_alphanumeric() => name.push(ch),
                        _ => return Err(ParserError::InvalidName { line }),
                    }
                }
                let starts_ok = name
                    .chars()
                    .next()
                    .map(|ch| ch == '_' || ch.is_ascii_alphabetic())
                    .unwrap_or(false);
                if !starts_ok {
                    return Err(ParserError::InvalidName { line });
                }
                tokens.push((line, Token::Name(name)));
            }
            _ if ch == '_' || ch.is_ascii_alphabetic() => {
                let mut ident = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch == '_' || ch.is_ascii_alphanumeric() {
                        ident.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push((line, Token::Ident(ident)));
            }
            _ => {
                return Err(ParserError::UnexpectedChar {
                    line,
                    unexpected: ch,
                })
            }
        }
    }

    Ok(tokens)
}

/// Skip to the end of the line, leaving the newline for the caller's line
/// accounting.
fn skip_line(chars: &mut std::iter::Peekable<std::str::Chars>) {
    while let Some(&ch) = chars.peek() {
        if ch == '\n' {
            break;
        }
        chars.next();
    }
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    position: usize,
}

impl Parser {
    fn next(&mut self) -> Result<(usize, Token), ParserError> {
        let token = self
            .tokens
            .get(self.position)
            .cloned()
            .ok_or(ParserError::UnexpectedEof)?;
        self.position += 1;
        Ok(token)
    }

    fn expect_rparen(&mut self) -> Result<(), ParserError> {
        match self.next()? {
            (_, Token::RParen) => Ok(()),
            (line, token) => Err(ParserError::UnexpectedToken {
                line,
                expected: "')'",
                found: token.describe(),
            }),
        }
    }

    fn formula(&mut self) -> Result<Expr, ParserError> {
        match self.next()? {
            (_, Token::LParen) => {
                let formula = self.formula()?;
                self.expect_rparen()?;
                Ok(formula)
            }
            (line, Token::Ident(ident)) => match ident.as_str() {
                "Var" => match self.next()? {
                    (_, Token::Name(name)) => Ok(Expr::Var(name)),
                    (line, token) => Err(ParserError::UnexpectedToken {
                        line,
                        expected: "a quoted variable name",
                        found: token.describe(),
                    }),
                },
                "Not" => Ok(Expr::not(self.formula()?)),
                "And" => Ok(Expr::and(self.formula()?, self.formula()?)),
                "Or" => Ok(Expr::or(self.formula()?, self.formula()?)),
                "Implies" => Ok(Expr::implies(self.formula()?, self.formula()?)),
                "Iff" => Ok(Expr::iff(self.formula()?, self.formula()?)),
                "T" => Ok(Expr::Const(true)),
                "F" => Ok(Expr::Const(false)),
                _ => Err(ParserError::UnexpectedToken {
                    line,
                    expected: "a connective, 'Var', 'T' or 'F'",
                    found: format!("'{}'", ident),
                }),
            },
            (line, token) => Err(ParserError::UnexpectedToken {
                line,
                expected: "a formula",
                found: token.describe(),
            }),
        }
    }
}

/// Parse a prefix formula from a string.
pub fn parse_str(input: &str) -> Result<Expr, ParserError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        position: 0,
    };
    let formula = parser.formula()?;
    if let Some((line, _)) = parser.tokens.get(parser.position) {
        return Err(ParserError::TrailingInput { line: *line });
    }
    Ok(formula)
}

/// Parse a prefix formula from a reader.
pub fn parse_prefix(mut input: impl io::Read) -> Result<Expr, Error> {
    let mut text = String::new();
    input.read_to_string(&mut text)?;
    Ok(parse_str(&text)?)
}
