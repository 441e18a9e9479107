/// Executor module - interprets instruction trees against relation storage
///
/// Structure:
/// - dispatcher: leading-token dispatch, request and batch handling
/// - conditions: WHERE clause compilation and evaluation
/// - ddl: CREATE/DROP/TRUNCATE
/// - dml: INSERT/UPDATE/DELETE
/// - queries: SELECT

pub mod conditions;
pub mod ddl;
pub mod dispatcher;
pub mod dml;
pub mod queries;

pub use conditions::Predicate;
pub use ddl::DdlExecutor;
pub use dispatcher::Dispatcher;
pub use dml::DmlExecutor;
pub use queries::QueryExecutor;

use crate::core::{Error, Result, Value};
use crate::parser::{Instruction, Token};

/// Converts a literal node into a value.
pub fn literal_value(node: &Instruction) -> Result<Value> {
    match node.token {
        Token::Null => Ok(Value::Null),
        Token::True => Ok(Value::Boolean(true)),
        Token::False => Ok(Value::Boolean(false)),
        Token::String => Ok(Value::Text(node.lexeme.clone())),
        Token::Now => Ok(Value::Timestamp(chrono::Utc::now().naive_utc())),
        Token::Number if node.lexeme.contains('.') => node
            .lexeme
            .parse()
            .map(Value::Real)
            .map_err(|_| Error::Parse(format!("invalid number '{}'", node.lexeme))),
        Token::Number => node
            .lexeme
            .parse()
            .map(Value::Integer)
            .map_err(|_| Error::Parse(format!("invalid number '{}'", node.lexeme))),
        other => Err(Error::Shape(format!("expected a literal, found {other:?}"))),
    }
}

/// Lexeme of a node that must be an identifier.
pub(crate) fn identifier(node: Option<&Instruction>, what: &str) -> Result<String> {
    match node {
        Some(n) if n.token == Token::Identifier => Ok(n.lexeme.clone()),
        _ => Err(Error::Shape(format!("expected {what} name"))),
    }
}
