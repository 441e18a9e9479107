// Module declarations
pub mod error;
pub mod value;
pub mod data_type;
pub mod column;
pub mod row;
pub mod relation;
pub mod database;

// Re-exports for convenience
pub use error::{Error, Result};
pub use value::Value;
pub use data_type::DataType;
pub use column::Column;
pub use row::Row;
pub use relation::{advance_sequence, Relation};
pub use database::Database;

#[cfg(test)]
mod tests {
    use super::*;

    fn users_columns() -> Vec<Column> {
        let mut id = Column::new("id", DataType::Integer);
        id.primary_key = true;
        vec![id, Column::new("name", DataType::Text)]
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Integer(42).to_string(), "42");
        assert_eq!(Value::Real(3.5).to_string(), "3.5");
        assert_eq!(Value::Text("hello".to_string()).to_string(), "hello");
        assert_eq!(Value::Boolean(true).to_string(), "true");
    }

    #[test]
    fn test_value_as_int() {
        assert_eq!(Value::Integer(42).as_int(), Some(42));
        assert_eq!(Value::Text("hello".to_string()).as_int(), None);
        assert_eq!(Value::Null.as_int(), None);
    }

    #[test]
    fn test_value_wire_form() {
        assert_eq!(Value::Null.to_wire(), None);
        assert_eq!(Value::Integer(7).to_wire(), Some("7".to_string()));
    }

    #[test]
    fn test_value_compare_mixed_numeric() {
        use std::cmp::Ordering;
        assert_eq!(Value::Integer(2).compare(&Value::Real(2.5)), Some(Ordering::Less));
        assert_eq!(Value::Real(3.0).compare(&Value::Integer(3)), Some(Ordering::Equal));
        assert_eq!(Value::Integer(1).compare(&Value::Null), None);
        assert_eq!(Value::Integer(1).compare(&Value::Text("1".into())), None);
    }

    #[test]
    fn test_value_compare_date_with_text() {
        use std::cmp::Ordering;
        let date = DataType::Date.coerce(Value::Text("2024-03-01".into())).unwrap();
        assert_eq!(date.compare(&Value::Text("2024-01-01".into())), Some(Ordering::Greater));
        assert_eq!(Value::Text("2024-01-01".into()).compare(&date), Some(Ordering::Less));
    }

    #[test]
    fn test_sql_literal_escapes_quotes() {
        assert_eq!(Value::Text("O'Brien".into()).to_sql_literal(), "'O''Brien'");
        assert_eq!(Value::Real(2.0).to_sql_literal(), "2.0");
        assert_eq!(Value::Null.to_sql_literal(), "NULL");
    }

    #[test]
    fn test_data_type_from_name() {
        assert_eq!(DataType::from_name("int", None).unwrap(), DataType::Integer);
        assert_eq!(
            DataType::from_name("VARCHAR", Some(10)).unwrap(),
            DataType::Varchar { max_length: 10 }
        );
        assert_eq!(DataType::from_name("varchar", None).unwrap(), DataType::Text);
        assert!(matches!(DataType::from_name("BLOB", None), Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_data_type_coerce() {
        assert_eq!(DataType::Real.coerce(Value::Integer(2)).unwrap(), Value::Real(2.0));
        assert!(matches!(
            DataType::Integer.coerce(Value::Text("x".into())),
            Err(Error::TypeMismatch)
        ));
        assert!(matches!(
            DataType::Varchar { max_length: 2 }.coerce(Value::Text("abc".into())),
            Err(Error::Constraint(_))
        ));
        assert_eq!(DataType::Boolean.coerce(Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_relation_creation() {
        let relation = Relation::new("users".to_string(), users_columns());
        assert_eq!(relation.name, "users");
        assert_eq!(relation.columns.len(), 2);
        assert_eq!(relation.rows.len(), 0);
    }

    #[test]
    fn test_relation_insert() {
        let mut relation = Relation::new("users".to_string(), users_columns());
        let row = Row::new(vec![Value::Integer(1), Value::Text("Alice".to_string())]);

        assert!(relation.insert(row).is_ok());
        assert_eq!(relation.rows.len(), 1);
    }

    #[test]
    fn test_relation_insert_wrong_column_count() {
        let mut relation = Relation::new("users".to_string(), users_columns());
        let row = Row::new(vec![Value::Integer(1)]);

        assert!(matches!(relation.insert(row), Err(Error::ColumnCountMismatch)));
    }

    #[test]
    fn test_relation_insert_all_rejects_duplicate_key() {
        let mut relation = Relation::new("users".to_string(), users_columns());
        let rows = vec![
            Row::new(vec![Value::Integer(1), Value::Text("a".into())]),
            Row::new(vec![Value::Integer(1), Value::Text("b".into())]),
        ];

        assert!(matches!(relation.insert_all(rows), Err(Error::Constraint(_))));
        assert!(relation.rows.is_empty());
    }

    #[test]
    fn test_relation_get_column_index() {
        let relation = Relation::new("users".to_string(), users_columns());
        assert_eq!(relation.get_column_index("id"), Some(0));
        assert_eq!(relation.get_column_index("name"), Some(1));
        assert_eq!(relation.get_column_index("age"), None);
    }

    #[test]
    fn test_advance_sequence() {
        assert_eq!(advance_sequence(1, 1).unwrap(), 2);
        assert_eq!(advance_sequence(1, 10).unwrap(), 11);
        assert_eq!(advance_sequence(11, 3).unwrap(), 11);
        assert_eq!(advance_sequence(5, -7).unwrap(), 5);
        assert!(matches!(advance_sequence(1, i64::MAX), Err(Error::Constraint(_))));
    }

    #[test]
    fn test_database_create_relation() {
        let mut db = Database::new();
        let relation = Relation::new("users".to_string(), users_columns());
        assert!(db.create_relation(relation).is_ok());
        assert_eq!(db.relations.len(), 1);
        assert!(db.get_relation("users").is_some());
    }

    #[test]
    fn test_database_create_duplicate_relation() {
        let mut db = Database::new();
        let first = Relation::new("users".to_string(), users_columns());
        let second = Relation::new("users".to_string(), users_columns());

        assert!(db.create_relation(first).is_ok());
        assert!(matches!(db.create_relation(second), Err(Error::AlreadyExists(_))));
    }

    #[test]
    fn test_database_drop_relation() {
        let mut db = Database::new();
        db.create_relation(Relation::new("users".to_string(), users_columns()))
            .unwrap();

        assert!(db.drop_relation("users").is_ok());
        assert_eq!(db.relations.len(), 0);
    }

    #[test]
    fn test_database_drop_nonexistent_relation() {
        let mut db = Database::new();
        let err = db.drop_relation("users").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(err.to_string(), "relation 'users' not found");
    }

    #[test]
    fn test_error_from_remote() {
        assert!(matches!(
            Error::from_remote("relation 'account' not found".into()),
            Error::NotFound(name) if name == "account"
        ));
        assert!(matches!(
            Error::from_remote("relation 'a' already exists".into()),
            Error::AlreadyExists(_)
        ));
        assert!(matches!(Error::from_remote("boom".into()), Error::Remote(_)));
    }
}
