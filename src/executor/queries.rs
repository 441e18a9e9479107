/// Query operations (SELECT)

use super::{identifier, Predicate};
use crate::core::{Database, Error, Result, Row, Value};
use crate::parser::{Instruction, Token};
use crate::protocol::EngineConn;
use std::cmp::Ordering;

pub struct QueryExecutor;

enum Output {
    Columns(Vec<usize>),
    Count,
}

impl QueryExecutor {
    /// Execute SELECT statement
    ///
    /// The whole row set is computed before the header is written, so an
    /// evaluation error never leaves a half-sent row set behind.
    pub fn select(db: &Database, decl: &Instruction, conn: &mut dyn EngineConn) -> Result<()> {
        let from = decl
            .find(Token::From)
            .ok_or_else(|| Error::Shape("select needs FROM".to_string()))?;
        let name = identifier(from.single_child(), "table")?;
        let relation = db.relation(&name)?;

        let projection = decl
            .find(Token::Projection)
            .ok_or_else(|| Error::Shape("select needs a projection".to_string()))?;
        let output = match projection.children.first().map(|n| n.token) {
            Some(Token::Star) => Output::Columns((0..relation.columns.len()).collect()),
            Some(Token::Count) => Output::Count,
            Some(Token::Identifier) => Output::Columns(
                projection
                    .children
                    .iter()
                    .map(|c| relation.column_index(&c.lexeme))
                    .collect::<Result<_>>()?,
            ),
            _ => return Err(Error::Shape("unexpected projection".to_string())),
        };

        let predicate = Predicate::from_where(relation, decl.find(Token::Where))?;
        let mut matched: Vec<&Row> = Vec::new();
        for row in &relation.rows {
            if predicate.matches(row)? {
                matched.push(row);
            }
        }

        if let Some(order) = decl.find(Token::Order) {
            let column = order
                .single_child()
                .ok_or_else(|| Error::Shape("unexpected order arguments".to_string()))?;
            let idx = relation.column_index(&column.lexeme)?;
            let descending = column.has(Token::Desc);
            matched.sort_by(|a, b| {
                let ordering = Self::order(&a.values[idx], &b.values[idx]);
                if descending { ordering.reverse() } else { ordering }
            });
        }

        let (header, rows): (Vec<String>, Vec<Vec<Option<String>>>) = match output {
            Output::Count => (
                vec!["COUNT(*)".to_string()],
                vec![vec![Some(matched.len().to_string())]],
            ),
            Output::Columns(indices) => (
                indices.iter().map(|&i| relation.columns[i].name.clone()).collect(),
                matched
                    .iter()
                    .map(|row| indices.iter().map(|&i| row.values[i].to_wire()).collect())
                    .collect(),
            ),
        };

        let offset = Self::count(decl.find(Token::Offset))?.unwrap_or(0);
        let limit = Self::count(decl.find(Token::Limit))?.unwrap_or(usize::MAX);

        conn.write_row_header(header)?;
        for row in rows.into_iter().skip(offset).take(limit) {
            conn.write_row(row)?;
        }
        conn.write_row_end()
    }

    /// NULLs sort first; incomparable values keep their relative order.
    fn order(a: &Value, b: &Value) -> Ordering {
        match (a.is_null(), b.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => a.compare(b).unwrap_or(Ordering::Equal),
        }
    }

    fn count(node: Option<&Instruction>) -> Result<Option<usize>> {
        node.map(|n| {
            let number = n
                .single_child()
                .ok_or_else(|| Error::Shape(format!("{} needs a count", n.lexeme)))?;
            number
                .lexeme
                .parse()
                .map_err(|_| Error::Parse(format!("invalid count '{}'", number.lexeme)))
        })
        .transpose()
    }
}
