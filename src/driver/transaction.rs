use super::session::{exec_result, ExecResult, Rows, Session};
use crate::core::{Error, Result};
use crate::parser::{parse_instructions, Token};
use crate::protocol::Request;
use log::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IsolationLevel {
    #[default]
    Default,
    ReadUncommitted,
    ReadCommitted,
    WriteCommitted,
    RepeatableRead,
    Snapshot,
    Serializable,
    Linearizable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxOptions {
    pub isolation: IsolationLevel,
    pub read_only: bool,
}

/// Buffers write statements and applies them together on commit.
///
/// Nothing reaches the engine before `commit`, so reads inside the
/// transaction see committed state only.
pub struct Transaction<'a> {
    session: &'a Session,
    pending: Vec<String>,
}

impl<'a> Transaction<'a> {
    pub(super) const fn new(session: &'a Session) -> Self {
        Self {
            session,
            pending: Vec::new(),
        }
    }

    /// Queues write statements. Syntax errors surface here, not at commit.
    pub fn exec(&mut self, sql: &str) -> Result<()> {
        for decl in parse_instructions(sql)? {
            match decl.token {
                Token::Select => {
                    return Err(Error::Unsupported("SELECT in a transaction buffer, use query".to_string()));
                }
                Token::Begin | Token::Commit | Token::Rollback => {
                    return Err(Error::Unsupported("nested transaction control".to_string()));
                }
                _ => {}
            }
        }
        self.pending.push(sql.to_string());
        Ok(())
    }

    /// Reads committed state; statements queued by `exec` are not visible.
    pub async fn query(&self, sql: &str) -> Result<Rows> {
        self.session.query(sql).await
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Applies every queued statement, or none of them.
    pub async fn commit(self) -> Result<ExecResult> {
        if self.pending.is_empty() {
            return Ok(ExecResult::default());
        }
        let messages = self.session.request(Request::Batch(self.pending)).await?;
        exec_result(messages)
    }

    pub fn rollback(self) -> Result<()> {
        debug!("transaction rolled back, {} statements discarded", self.pending.len());
        Ok(())
    }
}
