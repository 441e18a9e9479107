/// DML (Data Manipulation Language) operations
///
/// INSERT, UPDATE, DELETE. Each statement builds its full result before
/// touching the relation, so a failing row leaves storage as it was.

use super::{identifier, literal_value, Predicate};
use crate::core::{advance_sequence, Column, Database, Error, Relation, Result, Row, Value};
use crate::parser::{Instruction, Token};
use crate::protocol::EngineConn;

pub struct DmlExecutor;

impl DmlExecutor {
    /// Execute INSERT statement
    ///
    /// Replies with the last autoincrement id handed out (0 if none) and the
    /// number of tuples inserted.
    pub fn insert(db: &mut Database, decl: &Instruction, conn: &mut dyn EngineConn) -> Result<()> {
        let into = decl
            .find(Token::Into)
            .and_then(Instruction::single_child)
            .filter(|t| t.token == Token::Identifier)
            .ok_or_else(|| Error::Shape("unexpected insert arguments".to_string()))?;
        let values = decl
            .find(Token::Values)
            .ok_or_else(|| Error::Shape("insert needs VALUES".to_string()))?;

        let relation = db.relation_mut(&into.lexeme)?;
        let targets = Self::target_columns(relation, &into.children)?;

        let mut sequence = relation.sequence;
        let mut last_insert_id = 0;
        let mut rows = Vec::with_capacity(values.children.len());

        for tuple in &values.children {
            if tuple.children.len() != targets.len() {
                return Err(Error::ColumnCountMismatch);
            }

            let mut cells: Vec<Option<Value>> = vec![None; relation.columns.len()];
            for (&idx, literal) in targets.iter().zip(&tuple.children) {
                cells[idx] = Some(relation.columns[idx].data_type.coerce(literal_value(literal)?)?);
            }

            let mut row = Vec::with_capacity(cells.len());
            for (column, cell) in relation.columns.iter().zip(cells) {
                let value = match cell {
                    Some(v) if !(v.is_null() && column.autoincrement) => v,
                    _ if column.autoincrement => {
                        last_insert_id = sequence;
                        Value::Integer(sequence)
                    }
                    _ => column.default.clone().unwrap_or(Value::Null),
                };
                if column.autoincrement {
                    if let Some(id) = value.as_int() {
                        sequence = advance_sequence(sequence, id)?;
                    }
                }
                Self::check_not_null(column, &value)?;
                row.push(value);
            }
            rows.push(Row::new(row));
        }

        let inserted = rows.len() as i64;
        relation.insert_all(rows)?;
        relation.sequence = sequence;
        conn.write_result(last_insert_id, inserted)
    }

    /// Column positions the tuples fill. An empty list means every column
    /// in schema order.
    fn target_columns(relation: &Relation, names: &[Instruction]) -> Result<Vec<usize>> {
        if names.is_empty() {
            return Ok((0..relation.columns.len()).collect());
        }
        let mut targets = Vec::with_capacity(names.len());
        for name in names {
            let idx = relation.column_index(&name.lexeme)?;
            if targets.contains(&idx) {
                return Err(Error::Shape(format!("column '{}' listed twice", name.lexeme)));
            }
            targets.push(idx);
        }
        Ok(targets)
    }

    fn check_not_null(column: &Column, value: &Value) -> Result<()> {
        if value.is_null() && column.is_not_null() {
            return Err(Error::Constraint(format!("column '{}' cannot be NULL", column.name)));
        }
        Ok(())
    }

    /// Execute UPDATE statement
    pub fn update(db: &mut Database, decl: &Instruction, conn: &mut dyn EngineConn) -> Result<()> {
        let name = identifier(decl.children.first(), "table")?;
        let set = decl
            .find(Token::Set)
            .ok_or_else(|| Error::Shape("update needs SET".to_string()))?;

        let relation = db.relation_mut(&name)?;
        let predicate = Predicate::from_where(relation, decl.find(Token::Where))?;

        let mut assignments = Vec::with_capacity(set.children.len());
        for assign in &set.children {
            let (Some(column), Some(literal)) = (assign.children.first(), assign.children.get(1)) else {
                return Err(Error::Shape("unexpected assignment".to_string()));
            };
            let idx = relation.column_index(&column.lexeme)?;
            let target = &relation.columns[idx];
            let value = target.data_type.coerce(literal_value(literal)?)?;
            Self::check_not_null(target, &value)?;
            assignments.push((idx, value));
        }

        let mut updated = 0;
        let mut rows = Vec::with_capacity(relation.rows.len());
        for row in &relation.rows {
            let mut row = row.clone();
            if predicate.matches(&row)? {
                for (idx, value) in &assignments {
                    row.values[*idx] = value.clone();
                }
                updated += 1;
            }
            rows.push(row);
        }

        if updated > 0 {
            let mut sequence = relation.sequence;
            for (idx, value) in &assignments {
                if let (true, Some(id)) = (relation.columns[*idx].autoincrement, value.as_int()) {
                    sequence = advance_sequence(sequence, id)?;
                }
            }
            relation.replace_rows(rows)?;
            relation.sequence = sequence;
        }
        conn.write_result(0, updated)
    }

    /// Execute DELETE statement
    pub fn delete(db: &mut Database, decl: &Instruction, conn: &mut dyn EngineConn) -> Result<()> {
        let from = decl
            .find(Token::From)
            .ok_or_else(|| Error::Shape("delete needs FROM".to_string()))?;
        let name = identifier(from.single_child(), "table")?;

        let relation = db.relation_mut(&name)?;
        let predicate = Predicate::from_where(relation, decl.find(Token::Where))?;

        let mut kept = Vec::with_capacity(relation.rows.len());
        for row in &relation.rows {
            if !predicate.matches(row)? {
                kept.push(row.clone());
            }
        }

        let deleted = (relation.rows.len() - kept.len()) as i64;
        relation.rows = kept;
        conn.write_result(0, deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::testing::RecordingConn;
    use crate::executor::DdlExecutor;
    use crate::parser::parse_statement;

    fn run(db: &mut Database, sql: &str) -> Result<RecordingConn> {
        let decl = parse_statement(sql)?;
        let mut conn = RecordingConn::default();
        match decl.token {
            Token::Create => DdlExecutor::create(db, &decl, &mut conn)?,
            Token::Insert => DmlExecutor::insert(db, &decl, &mut conn)?,
            Token::Update => DmlExecutor::update(db, &decl, &mut conn)?,
            Token::Delete => DmlExecutor::delete(db, &decl, &mut conn)?,
            other => panic!("unexpected statement {other:?}"),
        }
        Ok(conn)
    }

    fn setup() -> Database {
        let mut db = Database::new();
        run(
            &mut db,
            "CREATE TABLE account (id INT PRIMARY KEY AUTOINCREMENT, email TEXT UNIQUE NOT NULL, score REAL DEFAULT 1.5)",
        )
        .unwrap();
        db
    }

    fn cells(db: &Database, column: usize) -> Vec<Value> {
        db.get_relation("account")
            .unwrap()
            .rows
            .iter()
            .map(|r| r.values[column].clone())
            .collect()
    }

    #[test]
    fn test_insert_fills_defaults_and_ids() {
        let mut db = setup();
        let conn = run(&mut db, "INSERT INTO account (email) VALUES ('a@x'), ('b@x')").unwrap();
        assert_eq!(conn.last_result(), Some((2, 2)));
        assert_eq!(cells(&db, 0), vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(cells(&db, 2), vec![Value::Real(1.5), Value::Real(1.5)]);
    }

    #[test]
    fn test_insert_explicit_id_advances_sequence() {
        let mut db = setup();
        run(&mut db, "INSERT INTO account (id, email, score) VALUES (10, 'a@x', 2)").unwrap();
        let conn = run(&mut db, "INSERT INTO account (email) VALUES ('b@x')").unwrap();
        assert_eq!(conn.last_result(), Some((11, 1)));
        assert_eq!(cells(&db, 2)[0], Value::Real(2.0));
    }

    #[test]
    fn test_insert_rejects_id_past_sequence_range() {
        let mut db = setup();
        let err = run(&mut db, "INSERT INTO account (id, email) VALUES (9223372036854775807, 'a@x')").unwrap_err();
        assert_eq!(err.to_string(), "constraint violation: autoincrement sequence exhausted");
        assert!(cells(&db, 0).is_empty());

        let conn = run(&mut db, "INSERT INTO account (id, email) VALUES (9223372036854775806, 'a@x')").unwrap();
        assert_eq!(conn.last_result(), Some((0, 1)));
        assert!(matches!(
            run(&mut db, "INSERT INTO account (email) VALUES ('b@x')"),
            Err(Error::Constraint(_))
        ));
        assert_eq!(cells(&db, 0), vec![Value::Integer(i64::MAX - 1)]);
    }

    #[test]
    fn test_update_rejects_id_past_sequence_range() {
        let mut db = setup();
        run(&mut db, "INSERT INTO account (email) VALUES ('a@x')").unwrap();

        assert!(matches!(
            run(&mut db, "UPDATE account SET id = 9223372036854775807"),
            Err(Error::Constraint(_))
        ));
        assert_eq!(cells(&db, 0), vec![Value::Integer(1)]);
        assert_eq!(db.get_relation("account").unwrap().sequence, 2);
    }

    #[test]
    fn test_insert_without_column_list() {
        let mut db = setup();
        let conn = run(&mut db, "INSERT INTO account VALUES (NULL, 'a@x', NULL)").unwrap();
        assert_eq!(conn.last_result(), Some((1, 1)));
        assert_eq!(cells(&db, 2), vec![Value::Null]);

        assert!(matches!(
            run(&mut db, "INSERT INTO account VALUES ('b@x')"),
            Err(Error::ColumnCountMismatch)
        ));
    }

    #[test]
    fn test_insert_is_all_or_nothing() {
        let mut db = setup();
        let err = run(&mut db, "INSERT INTO account (email) VALUES ('a@x'), ('a@x')").unwrap_err();
        assert!(matches!(err, Error::Constraint(_)));
        assert!(cells(&db, 0).is_empty());

        // The failed statement must not consume ids.
        let conn = run(&mut db, "INSERT INTO account (email) VALUES ('a@x')").unwrap();
        assert_eq!(conn.last_result(), Some((1, 1)));
    }

    #[test]
    fn test_insert_constraint_errors() {
        let mut db = setup();
        assert!(matches!(
            run(&mut db, "INSERT INTO account (email) VALUES (NULL)"),
            Err(Error::Constraint(_))
        ));
        assert!(matches!(
            run(&mut db, "INSERT INTO account (email) VALUES (42)"),
            Err(Error::TypeMismatch)
        ));
        assert!(matches!(
            run(&mut db, "INSERT INTO account (nope) VALUES (1)"),
            Err(Error::Shape(_))
        ));
        assert!(matches!(
            run(&mut db, "INSERT INTO missing VALUES (1)"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_update_matching_rows() {
        let mut db = setup();
        run(&mut db, "INSERT INTO account (email, score) VALUES ('a@x', 1), ('b@x', 5), ('c@x', 9)").unwrap();

        let conn = run(&mut db, "UPDATE account SET score = 0 WHERE score > 2").unwrap();
        assert_eq!(conn.last_result(), Some((0, 2)));
        assert_eq!(cells(&db, 2), vec![Value::Real(1.0), Value::Real(0.0), Value::Real(0.0)]);

        let conn = run(&mut db, "UPDATE account SET score = 3").unwrap();
        assert_eq!(conn.last_result(), Some((0, 3)));
    }

    #[test]
    fn test_update_keeps_rows_on_violation() {
        let mut db = setup();
        run(&mut db, "INSERT INTO account (email) VALUES ('a@x'), ('b@x')").unwrap();

        assert!(matches!(
            run(&mut db, "UPDATE account SET email = 'same'"),
            Err(Error::Constraint(_))
        ));
        assert!(matches!(
            run(&mut db, "UPDATE account SET email = NULL WHERE id = 1"),
            Err(Error::Constraint(_))
        ));
        assert_eq!(
            cells(&db, 1),
            vec![Value::Text("a@x".into()), Value::Text("b@x".into())]
        );
    }

    #[test]
    fn test_delete_with_and_without_filter() {
        let mut db = setup();
        run(&mut db, "INSERT INTO account (email) VALUES ('a@x'), ('b@x'), ('c@y')").unwrap();

        let conn = run(&mut db, "DELETE FROM account WHERE email LIKE '%@x'").unwrap();
        assert_eq!(conn.last_result(), Some((0, 2)));
        assert_eq!(cells(&db, 1), vec![Value::Text("c@y".into())]);

        let conn = run(&mut db, "DELETE FROM account").unwrap();
        assert_eq!(conn.last_result(), Some((0, 1)));
        assert!(cells(&db, 0).is_empty());
    }
}
