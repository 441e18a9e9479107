/// What a session asks the engine to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// SQL text, possibly several `;`-separated statements.
    Statement(String),
    /// Statements applied all-or-nothing (transaction commit).
    Batch(Vec<String>),
}

/// Engine-to-session reply primitives.
///
/// A row set is always `RowHeader`, zero or more `Row`, then `RowEnd`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Result { last_insert_id: i64, rows_affected: i64 },
    Error(String),
    RowHeader(Vec<String>),
    Row(Vec<Option<String>>),
    RowEnd,
}
