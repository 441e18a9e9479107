use super::session::{ExecResult, Rows, Session};
use crate::core::{Error, Result, Value};

/// A statement with `$N` or `?` placeholders, bound to a session.
///
/// Arguments are inlined as SQL literals before the text is sent, since the
/// engine only accepts plain SQL.
pub struct Statement<'a> {
    session: &'a Session,
    sql: String,
    inputs: usize,
}

impl<'a> Statement<'a> {
    pub(super) fn new(session: &'a Session, sql: &str) -> Self {
        let inputs = placeholders(sql).into_iter().map(|p| p.index + 1).max().unwrap_or(0);
        Self {
            session,
            sql: sql.to_string(),
            inputs,
        }
    }

    /// Number of arguments `exec` and `query` expect.
    #[must_use]
    pub const fn num_input(&self) -> usize {
        self.inputs
    }

    pub async fn exec(&self, args: &[Value]) -> Result<ExecResult> {
        self.session.exec(&self.bind(args)?).await
    }

    pub async fn query(&self, args: &[Value]) -> Result<Rows> {
        self.session.query(&self.bind(args)?).await
    }

    fn bind(&self, args: &[Value]) -> Result<String> {
        if args.len() != self.inputs {
            return Err(Error::Shape(format!(
                "statement expects {} arguments, got {}",
                self.inputs,
                args.len()
            )));
        }
        Ok(substitute_parameters(&self.sql, args))
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Placeholder {
    start: usize,
    end: usize,
    index: usize,
}

/// Finds `$1..$N` and `?` outside string literals and quoted identifiers.
/// Each `?` takes the next index in order of appearance.
fn placeholders(sql: &str) -> Vec<Placeholder> {
    let bytes = sql.as_bytes();
    let mut found = Vec::new();
    let mut quote: Option<u8> = None;
    let mut next_question = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'\'' | b'"' | b'`' => quote = Some(b),
                b'?' => {
                    found.push(Placeholder { start: i, end: i + 1, index: next_question });
                    next_question += 1;
                }
                b'$' => {
                    let digits = bytes[i + 1..].iter().take_while(|c| c.is_ascii_digit()).count();
                    let number = sql[i + 1..i + 1 + digits].parse::<usize>().unwrap_or(0);
                    if number > 0 {
                        found.push(Placeholder { start: i, end: i + 1 + digits, index: number - 1 });
                        i += digits;
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }
    found
}

/// Substitute parameters in SQL query ($1, $2, ... and ?) with literal values
fn substitute_parameters(sql: &str, args: &[Value]) -> String {
    let mut result = String::with_capacity(sql.len());
    let mut copied = 0;
    for placeholder in placeholders(sql) {
        result.push_str(&sql[copied..placeholder.start]);
        match args.get(placeholder.index) {
            Some(value) => result.push_str(&value.to_sql_literal()),
            None => result.push_str(&sql[placeholder.start..placeholder.end]),
        }
        copied = placeholder.end;
    }
    result.push_str(&sql[copied..]);
    result
}
