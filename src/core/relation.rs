use super::column::Column;
use super::error::{Error, Result};
use super::row::Row;
use std::collections::HashSet;

/// The sequence value that comes after both `current` and `id`.
pub fn advance_sequence(current: i64, id: i64) -> Result<i64> {
    let next = id
        .checked_add(1)
        .ok_or_else(|| Error::Constraint("autoincrement sequence exhausted".to_string()))?;
    Ok(current.max(next))
}

/// A named table: schema plus rows in insertion order.
#[derive(Debug, Clone)]
pub struct Relation {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    /// Next value handed out to an autoincrement column.
    pub sequence: i64,
}

impl Relation {
    #[must_use]
    pub const fn new(name: String, columns: Vec<Column>) -> Self {
        Self {
            name,
            columns,
            rows: Vec::new(),
            sequence: 1,
        }
    }

    pub fn insert(&mut self, row: Row) -> Result<()> {
        if row.values.len() != self.columns.len() {
            return Err(Error::ColumnCountMismatch);
        }
        self.rows.push(row);
        Ok(())
    }

    /// Appends every row or none of them.
    pub fn insert_all(&mut self, rows: Vec<Row>) -> Result<()> {
        if rows.iter().any(|r| r.values.len() != self.columns.len()) {
            return Err(Error::ColumnCountMismatch);
        }
        self.check_unique(self.rows.iter().chain(rows.iter()))?;
        self.rows.extend(rows);
        Ok(())
    }

    /// Swaps in a full replacement row set after checking constraints.
    pub fn replace_rows(&mut self, rows: Vec<Row>) -> Result<()> {
        self.check_unique(rows.iter())?;
        self.rows = rows;
        Ok(())
    }

    #[must_use]
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.get_column_index(name)
            .ok_or_else(|| Error::Shape(format!("unknown column '{name}' in relation '{}'", self.name)))
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    fn check_unique<'a>(&self, rows: impl Iterator<Item = &'a Row> + Clone) -> Result<()> {
        for (idx, column) in self.columns.iter().enumerate() {
            if !column.is_unique() {
                continue;
            }
            let mut seen = HashSet::new();
            for row in rows.clone() {
                let value = &row.values[idx];
                if value.is_null() {
                    continue;
                }
                if !seen.insert(value.to_sql_literal()) {
                    return Err(Error::Constraint(format!(
                        "duplicate value {value} for unique column '{}'",
                        column.name
                    )));
                }
            }
        }
        Ok(())
    }
}
