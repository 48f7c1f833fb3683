//! DIMACS CNF parser and writer for the Satori SAT solver.
use std::io;

use anyhow::Error;
use thiserror::Error;

use satori_formula::{CnfFormula, Lit, Var};

/// Possible errors while parsing a DIMACS CNF formula.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("line {line}: invalid header syntax: {header}")]
    InvalidHeader { line: usize, header: String },
    #[error("line {line}: invalid literal: {token}")]
    InvalidLiteral { line: usize, token: String },
    #[error("line {line}: literal index is too large: {token}")]
    LiteralTooLarge { line: usize, token: String },
    #[error("line {line}: unterminated clause")]
    UnterminatedClause { line: usize },
    #[error("formula has {var_count} variables while the header specifies {header_var_count}")]
    VarCount {
        var_count: usize,
        header_var_count: usize,
    },
    #[error("formula has {clause_count} clauses while the header specifies {header_clause_count}")]
    ClauseCount {
        clause_count: usize,
        header_clause_count: usize,
    },
}

/// Variable and clause count of a DIMACS CNF header line.
#[derive(Copy, Clone, Debug)]
pub struct DimacsHeader {
    pub var_count: usize,
    pub clause_count: usize,
}

/// Parser for DIMACS CNF files.
///
/// Lines starting with `c` are comments. An optional `p cnf <vars> <clauses>`
/// header is checked against the parsed formula. Clauses are zero-terminated
/// and may span lines.
#[derive(Default)]
pub struct DimacsParser {
    formula: CnfFormula,
    partial_clause: Vec<Lit>,
    header: Option<DimacsHeader>,
    line_number: usize,
}

impl DimacsParser {
    /// Create a new DIMACS CNF parser.
    pub fn new() -> DimacsParser {
        DimacsParser::default()
    }

    /// Parse the given input and check the header if present.
    pub fn parse(input: impl io::Read) -> Result<CnfFormula, Error> {
        use io::BufRead;

        let mut parser = DimacsParser::new();
        let buffer = io::BufReader::new(input);
        for line in buffer.lines() {
            parser.parse_line(&line?)?;
        }
        parser.eof()?;
        parser.check_header()?;
        Ok(parser.take_formula())
    }

    /// Parse a single line of input.
    pub fn parse_line(&mut self, line: &str) -> Result<(), ParserError> {
        self.line_number += 1;

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('c') {
            return Ok(());
        }
        if trimmed.starts_with('p') {
            return self.parse_header_line(trimmed);
        }

        for token in trimmed.split_whitespace() {
            let number: isize = token.parse().map_err(|_| ParserError::InvalidLiteral {
                line: self.line_number,
                token: token.to_owned(),
            })?;
            if number == 0 {
                let clause = self.partial_clause.drain(..);
                self.formula.add_clause(clause);
            } else {
                if number.unsigned_abs() > Var::max_count() {
                    return Err(ParserError::LiteralTooLarge {
                        line: self.line_number,
                        token: token.to_owned(),
                    });
                }
                self.partial_clause.push(Lit::from_dimacs(number));
            }
        }

        Ok(())
    }

    fn parse_header_line(&mut self, line: &str) -> Result<(), ParserError> {
        let invalid = || ParserError::InvalidHeader {
            line: self.line_number,
            header: line.to_owned(),
        };

        let mut tokens = line.split_whitespace();
        if tokens.next() != Some("p") || tokens.next() != Some("cnf") {
            return Err(invalid());
        }
        let var_count: usize = tokens
            .next()
            .and_then(|token| token.parse().ok())
            .ok_or_else(invalid)?;
        let clause_count: usize = tokens
            .next()
            .and_then(|token| token.parse().ok())
            .ok_or_else(invalid)?;
        if tokens.next().is_some() {
            return Err(invalid());
        }

        self.header = Some(DimacsHeader {
            var_count,
            clause_count,
        });
        self.formula.set_var_count(var_count);
        Ok(())
    }

    /// Finish parsing the input.
    pub fn eof(&mut self) -> Result<(), ParserError> {
        if !self.partial_clause.is_empty() {
            return Err(ParserError::UnterminatedClause {
                line: self.line_number,
            });
        }
        Ok(())
    }

    /// Check the parsed formula against the header, if one was present.
    pub fn check_header(&self) -> Result<(), ParserError> {
        if let Some(header) = self.header {
            if self.formula.var_count() > header.var_count {
                return Err(ParserError::VarCount {
                    var_count: self.formula.var_count(),
                    header_var_count: header.var_count,
                });
            }
            if self.formula.len() != header.clause_count {
                return Err(ParserError::ClauseCount {
                    clause_count: self.formula.len(),
                    header_clause_count: header.clause_count,
                });
            }
        }
        Ok(())
    }

    /// The header line of the input, if present.
    pub fn header(&self) -> Option<DimacsHeader> {
        self.header
    }

    /// Take ownership of the parsed formula.
    pub fn take_formula(&mut self) -> CnfFormula {
        std::mem::take(&mut self.formula)
    }
}

/// Write a formula in DIMACS CNF format.
pub fn write_dimacs(target: &mut impl io::Write, formula: &CnfFormula) -> io::Result<()> {
    target.write_all(b"p cnf ")?;
    itoa::write(&mut *target, formula.var_count())?;
    target.write_all(b" ")?;
    itoa::write(&mut *target, formula.len())?;
    target.write_all(b"\n")?;

    for clause in formula.iter() {
        for &lit in clause {
            itoa::write(&mut *target, lit.to_dimacs())?;
            target.write_all(b" ")?;
        }
        target.write_all(b"0\n")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use satori_formula::cnf::strategy::cnf_formula;
    use satori_formula::cnf_formula;

    #[test]
    fn parse_simple_formula() {
        let input = b"c comment\np cnf 3 2\n1 -2 0\n2 3 0\n" as &[u8];
        let formula = DimacsParser::parse(input).unwrap();
        let expected = cnf_formula![
            1, -2;
            2, 3;
        ];
        assert_eq!(formula, expected);
    }

    #[test]
    fn parse_without_header() {
        let input = b"1 2 0\n-1 0\n" as &[u8];
        let formula = DimacsParser::parse(input).unwrap();
        assert_eq!(formula.len(), 2);
        assert_eq!(formula.var_count(), 2);
    }

    #[test]
    fn clause_spanning_lines() {
        let input = b"p cnf 4 1\n1 2\n3 4 0\n" as &[u8];
        let formula = DimacsParser::parse(input).unwrap();
        assert_eq!(formula.len(), 1);
        assert_eq!(formula.iter().next().unwrap().len(), 4);
    }

    #[test]
    fn rejects_unterminated_clause() {
        let input = b"p cnf 2 1\n1 2\n" as &[u8];
        let result = DimacsParser::parse(input);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("unterminated clause"));
    }

    #[test]
    fn rejects_bad_header() {
        let input = b"p dnf 1 1\n1 0\n" as &[u8];
        assert!(DimacsParser::parse(input).is_err());
    }

    #[test]
    fn rejects_clause_count_mismatch() {
        let input = b"p cnf 2 3\n1 2 0\n" as &[u8];
        assert!(DimacsParser::parse(input).is_err());
    }

    proptest! {
        #[test]
        fn write_parse_roundtrip(formula in cnf_formula(1..100usize, 0..500, 1..10)) {
            let mut written = vec![];
            write_dimacs(&mut written, &formula).unwrap();

            let mut parsed = DimacsParser::parse(&written[..]).unwrap();
            parsed.set_var_count(formula.var_count());
            prop_assert_eq!(parsed, formula);
        }
    }
}
