use super::statement::Statement;
use super::transaction::{IsolationLevel, Transaction, TxOptions};
use super::Server;
use crate::core::{Error, Result};
use crate::protocol::{DriverConn, Message, Request};
use log::debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Outcome of a write statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub last_insert_id: i64,
    pub rows_affected: i64,
}

/// A row set. NULL cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Rows {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell by row number and column name.
    #[must_use]
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }
}

/// A connection to one engine.
///
/// Statements from one session run one at a time; other sessions on the same
/// engine interleave between them.
pub struct Session {
    conn: DriverConn,
    server: Arc<Server>,
    // Held while a request is in flight.
    busy: Mutex<()>,
    timeout: Option<Duration>,
}

impl Session {
    pub(super) fn new(conn: DriverConn, server: Arc<Server>, timeout: Option<Duration>) -> Self {
        debug!("session {} opened", conn.session());
        Self {
            conn,
            server,
            busy: Mutex::new(()),
            timeout,
        }
    }

    #[must_use]
    pub fn server(&self) -> &Arc<Server> {
        &self.server
    }

    /// Runs write statements and returns the result of the last one.
    pub async fn exec(&self, sql: &str) -> Result<ExecResult> {
        let messages = self.request(Request::Statement(sql.to_string())).await?;
        exec_result(messages)
    }

    /// Runs statements and returns the last row set they produced.
    pub async fn query(&self, sql: &str) -> Result<Rows> {
        let messages = self.request(Request::Statement(sql.to_string())).await?;
        rows(messages)
    }

    #[must_use]
    pub fn prepare(&self, sql: &str) -> Statement<'_> {
        Statement::new(self, sql)
    }

    #[must_use]
    pub fn begin(&self) -> Transaction<'_> {
        debug!("session {}: begin transaction", self.conn.session());
        Transaction::new(self)
    }

    /// Starts a transaction. Only the default options are supported.
    pub fn begin_tx(&self, options: TxOptions) -> Result<Transaction<'_>> {
        if options.isolation != IsolationLevel::Default {
            return Err(Error::Unsupported(format!("isolation level {:?}", options.isolation)));
        }
        if options.read_only {
            return Err(Error::Unsupported("read-only transaction".to_string()));
        }
        Ok(self.begin())
    }

    /// Same as dropping the session.
    pub fn close(self) {}

    /// Sends one request and collects every reply to it.
    pub(super) async fn request(&self, request: Request) -> Result<Vec<Message>> {
        let exchange = async {
            let _busy = self.busy.lock().await;
            let mut replies = self.conn.send(request).await?;
            let mut messages = Vec::new();
            while let Some(message) = replies.next().await {
                messages.push(message);
            }
            Ok::<_, Error>(messages)
        };

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .map_err(|_| Error::Timeout(limit))?,
            None => exchange.await,
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!("session {} closed", self.conn.session());
        self.server.closing_conn();
    }
}

/// An empty reply means the engine dropped the request unanswered.
pub(super) fn exec_result(messages: Vec<Message>) -> Result<ExecResult> {
    if messages.is_empty() {
        return Err(Error::EngineStopped);
    }
    let mut result = ExecResult::default();
    for message in messages {
        match message {
            Message::Result { last_insert_id, rows_affected } => {
                result = ExecResult { last_insert_id, rows_affected };
            }
            Message::Error(err) => return Err(Error::from_remote(err)),
            Message::RowHeader(_) | Message::Row(_) | Message::RowEnd => {}
        }
    }
    Ok(result)
}

fn rows(messages: Vec<Message>) -> Result<Rows> {
    if messages.is_empty() {
        return Err(Error::EngineStopped);
    }
    let mut current = Rows::default();
    let mut last = Rows::default();
    for message in messages {
        match message {
            Message::RowHeader(columns) => {
                current = Rows { columns, rows: Vec::new() };
            }
            Message::Row(row) => current.rows.push(row),
            Message::RowEnd => last = std::mem::take(&mut current),
            Message::Error(err) => return Err(Error::from_remote(err)),
            Message::Result { .. } => {}
        }
    }
    Ok(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_result_takes_last() {
        let messages = vec![
            Message::Result { last_insert_id: 3, rows_affected: 1 },
            Message::Result { last_insert_id: 0, rows_affected: 2 },
        ];
        assert_eq!(
            exec_result(messages).unwrap(),
            ExecResult { last_insert_id: 0, rows_affected: 2 }
        );
    }

    #[test]
    fn test_remote_errors_are_decoded() {
        let messages = vec![
            Message::Result { last_insert_id: 0, rows_affected: 1 },
            Message::Error("relation 'x' not found".into()),
        ];
        assert!(matches!(exec_result(messages), Err(Error::NotFound(name)) if name == "x"));
        assert!(matches!(exec_result(Vec::new()), Err(Error::EngineStopped)));
    }

    #[test]
    fn test_rows_keeps_last_row_set() {
        let messages = vec![
            Message::RowHeader(vec!["a".into()]),
            Message::Row(vec![Some("1".into())]),
            Message::RowEnd,
            Message::RowHeader(vec!["b".into(), "c".into()]),
            Message::Row(vec![Some("2".into()), None]),
            Message::RowEnd,
        ];
        let rows = rows(messages).unwrap();
        assert_eq!(rows.columns, vec!["b", "c"]);
        assert_eq!(rows.get(0, "b"), Some("2"));
        assert_eq!(rows.get(0, "c"), None);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_rows_without_row_set_is_empty() {
        let messages = vec![Message::Result { last_insert_id: 0, rows_affected: 1 }];
        assert!(rows(messages).unwrap().is_empty());
    }
}
