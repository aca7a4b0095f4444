pub mod graph;

use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
};

use thiserror::Error;

use crate::types::{Lit, Problem};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("line {line}: {kind}")]
    Parse { line: usize, kind: ParseError },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No `p cnf` line before the first clause.
    #[error("missing problem line")]
    MissingHeader,
    /// The problem line is not `p cnf <vars> <clauses>`.
    #[error("malformed problem line `{0}`")]
    Header(String),
    #[error("malformed literal `{0}`")]
    Literal(String),
    /// A literal mentions a variable above the declared count.
    #[error("literal {lit} exceeds the {var_count} declared variables")]
    OutOfRange { lit: Lit, var_count: usize },
    /// The last clause was not terminated by `0`.
    #[error("unterminated clause at end of input")]
    Unterminated,
    #[error("{declared} clauses declared but {found} found")]
    ClauseCount { declared: usize, found: usize },
}

pub fn load_problem(path: &Path) -> Result<Problem, LoadError> {
    let mut file = File::open(path)?;
    read_problem(&mut file)
}

/// Parses `c <var> <name>...` into the variable and its name tokens.
fn name_comment(line: &str) -> Option<(usize, Vec<String>)> {
    let mut words = line.strip_prefix('c')?.split_whitespace();
    let var = words.next()?.parse::<usize>().ok()?;
    let tokens: Vec<String> = words.map(str::to_owned).collect();
    if tokens.is_empty() {
        None
    } else {
        Some((var, tokens))
    }
}

/// Reads a DIMACS CNF formula. Comments naming variables may appear
/// anywhere in the input.
pub fn read_problem(reader: &mut impl Read) -> Result<Problem, LoadError> {
    let mut header: Option<(usize, usize)> = None;
    let mut names = vec![];
    let mut clauses = vec![];
    let mut clause = vec![];

    let parse_error = |line: usize, kind: ParseError| LoadError::Parse { line, kind };

    let mut line_no = 0;
    for line in BufReader::new(reader).lines() {
        let line = line?;
        line_no += 1;
        let trimmed = line.trim_start();

        if trimmed.starts_with('c') {
            if let Some(named) = name_comment(trimmed) {
                names.push(named);
            }
            continue;
        }

        // SATLIB files end with a `%` line
        if trimmed.starts_with('%') {
            break;
        }

        if trimmed.starts_with('p') {
            let parts: Vec<&str> = trimmed.split_whitespace().collect();
            let parsed = match parts[..] {
                ["p", "cnf", vars, count] => vars.parse::<usize>().ok().zip(count.parse().ok()),
                _ => None,
            };
            match parsed {
                Some(counts) if header.is_none() => header = Some(counts),
                _ => return Err(parse_error(line_no, ParseError::Header(line.clone()))),
            }
            continue;
        }

        for word in trimmed.split_whitespace() {
            let Some((var_count, _)) = header else {
                return Err(parse_error(line_no, ParseError::MissingHeader));
            };
            let lit = word
                .parse::<Lit>()
                .map_err(|_| parse_error(line_no, ParseError::Literal(word.to_owned())))?;
            match lit {
                0 => clauses.push(std::mem::take(&mut clause)),
                _ if lit.unsigned_abs() as usize > var_count => {
                    return Err(parse_error(
                        line_no,
                        ParseError::OutOfRange { lit, var_count },
                    ));
                }
                _ => clause.push(lit),
            }
        }
    }

    let Some((var_count, clause_count)) = header else {
        return Err(parse_error(line_no, ParseError::MissingHeader));
    };
    if !clause.is_empty() {
        return Err(parse_error(line_no, ParseError::Unterminated));
    }
    if clause_count != clauses.len() {
        return Err(parse_error(
            line_no,
            ParseError::ClauseCount {
                declared: clause_count,
                found: clauses.len(),
            },
        ));
    }

    let mut problem = Problem::new(var_count, clauses);
    for (var, tokens) in names {
        if (1..=var_count).contains(&var) {
            problem.names[var] = Some(tokens);
        }
    }

    Ok(problem)
}
