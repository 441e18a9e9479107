// inmemsql - embeddable in-memory SQL engine
// One single-writer engine per connection string, reached through sessions

// Clippy configuration - allow non-critical warnings
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::float_cmp)]

// Core structures (values, types, relations, errors)
pub mod core;

// SQL parser producing instruction trees
pub mod parser;

// Executors interpreting instruction trees against relation storage
pub mod executor;

// In-process request/reply channel between sessions and engines
pub mod protocol;

// Engine actor: one thread owning one relation namespace
pub mod engine;

// Registry, sessions, prepared statements, transactions
pub mod driver;

// Process configuration (config crate)
pub mod config;

// Re-export commonly used types for convenience
pub use crate::core::{Column, DataType, Database, Error, Relation, Result, Row, Value};
pub use driver::{Driver, ExecResult, Rows, Server, Session, Statement, Transaction, TxOptions};
pub use engine::Engine;
pub use parser::{parse_instructions, parse_statement, Instruction, Token};
