use crate::core::{Database, Error, Result};
use crate::parser::{parse_instructions, Instruction, Token};
use crate::protocol::EngineConn;
use log::{debug, warn};

use super::ddl::DdlExecutor;
use super::dml::DmlExecutor;
use super::queries::QueryExecutor;

/// Routes instruction trees to executors by their leading token.
///
/// Owns the relation storage. Only the engine thread holds a dispatcher, so
/// nothing here needs locking.
#[derive(Debug, Default)]
pub struct Dispatcher {
    db: Database,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.db
    }

    /// Executes one instruction tree, writing its replies to `conn`.
    pub fn execute_query(&mut self, decl: &Instruction, conn: &mut dyn EngineConn) -> Result<()> {
        match decl.token {
            // DDL operations
            Token::Create => DdlExecutor::create(&mut self.db, decl, conn),
            Token::Drop => DdlExecutor::drop(&mut self.db, decl, conn),
            Token::Truncate => DdlExecutor::truncate(&mut self.db, decl, conn),

            // DML operations
            Token::Insert => DmlExecutor::insert(&mut self.db, decl, conn),
            Token::Update => DmlExecutor::update(&mut self.db, decl, conn),
            Token::Delete => DmlExecutor::delete(&mut self.db, decl, conn),

            // Query operations
            Token::Select => QueryExecutor::select(&self.db, decl, conn),

            // Transactions go through the driver, which batches them.
            Token::Begin | Token::Commit | Token::Rollback => {
                Err(Error::Unimplemented(format!("{} statement", decl.lexeme.to_uppercase())))
            }
            other => Err(Error::Shape(format!("unexpected leading instruction {other:?}"))),
        }
    }

    /// Parses and runs SQL text in order, stopping at the first failure.
    ///
    /// Failures are reported to `conn` as an error message. The returned
    /// error is only for replies that could not be written.
    pub fn execute(&mut self, text: &str, conn: &mut dyn EngineConn) -> Result<()> {
        if let Err(err) = self.run(text, conn) {
            debug!("statement failed: {err}");
            conn.write_error(&err)?;
        }
        Ok(())
    }

    fn run(&mut self, text: &str, conn: &mut dyn EngineConn) -> Result<()> {
        for decl in parse_instructions(text)? {
            self.execute_query(&decl, conn)?;
        }
        Ok(())
    }

    /// Runs statements as one unit: all of them apply or none do.
    ///
    /// Replies with a single result: the last non-zero insert id and the sum
    /// of affected rows.
    pub fn execute_batch(&mut self, statements: &[String], conn: &mut dyn EngineConn) -> Result<()> {
        let snapshot = self.db.clone();
        let mut batch = BatchConn::default();

        let outcome = statements
            .iter()
            .try_for_each(|text| self.run(text, &mut batch));

        match outcome {
            Ok(()) => conn.write_result(batch.last_insert_id, batch.rows_affected),
            Err(err) => {
                warn!("batch of {} statements rolled back: {err}", statements.len());
                self.db = snapshot;
                conn.write_error(&err)
            }
        }
    }
}

/// Folds the results of a batch into one; row sets are discarded.
#[derive(Debug, Default)]
struct BatchConn {
    last_insert_id: i64,
    rows_affected: i64,
}

impl EngineConn for BatchConn {
    fn write_result(&mut self, last_insert_id: i64, rows_affected: i64) -> Result<()> {
        if last_insert_id != 0 {
            self.last_insert_id = last_insert_id;
        }
        self.rows_affected += rows_affected;
        Ok(())
    }

    fn write_error(&mut self, err: &Error) -> Result<()> {
        Err(Error::Remote(err.to_string()))
    }

    fn write_row_header(&mut self, _header: Vec<String>) -> Result<()> {
        Ok(())
    }

    fn write_row(&mut self, _row: Vec<Option<String>>) -> Result<()> {
        Ok(())
    }

    fn write_row_end(&mut self) -> Result<()> {
        Ok(())
    }
}
