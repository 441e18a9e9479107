// Module declarations
mod instruction;
mod common;
mod ddl;
mod dml;
mod queries;
mod transaction;

pub use instruction::{Instruction, Token};

use crate::core::{Error, Result};
use nom::branch::alt;

/// Splits statement text on `;`, ignoring separators inside quotes.
fn split_statements(text: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (idx, c) in text.char_indices() {
        match (quote, c) {
            (None, '\'' | '"' | '`') => quote = Some(c),
            (Some(open), _) if c == open => quote = None,
            (None, ';') => {
                statements.push(&text[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    statements.push(&text[start..]);

    statements
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parses one statement (no terminator) into its instruction tree.
pub fn parse_statement(input: &str) -> Result<Instruction> {
    let input = input.trim();

    let result = alt((
        ddl::create_table,
        ddl::create_database,
        ddl::drop,
        ddl::truncate,
        dml::insert,
        queries::select,
        dml::update,
        dml::delete,
        transaction::begin_transaction,
        transaction::commit_transaction,
        transaction::rollback_transaction,
    ))(input);

    match result {
        Ok((remaining, instruction)) => {
            if remaining.trim().is_empty() {
                Ok(instruction)
            } else {
                Err(Error::Parse(format!("unexpected input '{}'", remaining.trim())))
            }
        }
        Err(_) => Err(Error::Parse(format!("cannot parse '{input}'"))),
    }
}

/// Parses SQL text holding one or more `;`-separated statements.
pub fn parse_instructions(text: &str) -> Result<Vec<Instruction>> {
    let statements = split_statements(text);
    if statements.is_empty() {
        return Err(Error::Parse("empty statement".to_string()));
    }
    statements.into_iter().map(parse_statement).collect()
}
