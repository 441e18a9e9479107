use super::error::{Error, Result};
use super::value::{parse_timestamp, Value, DATE_FORMAT};
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    Integer,
    Serial, // Auto-incrementing INTEGER
    Real,
    Text,
    Varchar { max_length: usize },
    Boolean,
    Date,
    Timestamp,
}

impl DataType {
    /// Maps a declared type name (as written in CREATE TABLE) to a type.
    pub fn from_name(name: &str, length: Option<usize>) -> Result<Self> {
        let ty = match name.to_uppercase().as_str() {
            "INT" | "INTEGER" | "SMALLINT" | "BIGINT" | "TINYINT" => Self::Integer,
            "SERIAL" | "BIGSERIAL" => Self::Serial,
            "REAL" | "FLOAT" | "DOUBLE" | "DECIMAL" | "NUMERIC" => Self::Real,
            "TEXT" => Self::Text,
            "VARCHAR" | "CHAR" | "CHARACTER" => match length {
                Some(max_length) => Self::Varchar { max_length },
                None => Self::Text,
            },
            "BOOL" | "BOOLEAN" => Self::Boolean,
            "DATE" => Self::Date,
            "TIMESTAMP" | "DATETIME" => Self::Timestamp,
            other => return Err(Error::Unsupported(format!("column type '{other}'"))),
        };
        Ok(ty)
    }

    /// Converts a literal into a value of this type, or fails with `TypeMismatch`.
    ///
    /// NULL passes through, nullability is checked by the caller.
    pub fn coerce(&self, value: Value) -> Result<Value> {
        match (self, value) {
            (_, Value::Null) => Ok(Value::Null),
            (Self::Integer | Self::Serial, Value::Integer(i)) => Ok(Value::Integer(i)),
            (Self::Real, Value::Real(r)) => Ok(Value::Real(r)),
            (Self::Real, Value::Integer(i)) => Ok(Value::Real(i as f64)),
            (Self::Text, Value::Text(s)) => Ok(Value::Text(s)),
            (Self::Varchar { max_length }, Value::Text(s)) => {
                if s.chars().count() > *max_length {
                    Err(Error::Constraint(format!(
                        "value too long for VARCHAR({max_length})"
                    )))
                } else {
                    Ok(Value::Text(s))
                }
            }
            (Self::Boolean, Value::Boolean(b)) => Ok(Value::Boolean(b)),
            (Self::Boolean, Value::Integer(i)) if i == 0 || i == 1 => Ok(Value::Boolean(i == 1)),
            (Self::Date, Value::Date(d)) => Ok(Value::Date(d)),
            (Self::Date, Value::Timestamp(t)) => Ok(Value::Date(t.date())),
            (Self::Date, Value::Text(s)) => NaiveDate::parse_from_str(&s, DATE_FORMAT)
                .map(Value::Date)
                .map_err(|_| Error::TypeMismatch),
            (Self::Timestamp, Value::Timestamp(t)) => Ok(Value::Timestamp(t)),
            (Self::Timestamp, Value::Date(d)) => {
                Ok(Value::Timestamp(d.and_time(chrono::NaiveTime::MIN)))
            }
            (Self::Timestamp, Value::Text(s)) => parse_timestamp(&s)
                .map(Value::Timestamp)
                .ok_or(Error::TypeMismatch),
            _ => Err(Error::TypeMismatch),
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer => write!(f, "INTEGER"),
            Self::Serial => write!(f, "SERIAL"),
            Self::Real => write!(f, "REAL"),
            Self::Text => write!(f, "TEXT"),
            Self::Varchar { max_length } => write!(f, "VARCHAR({max_length})"),
            Self::Boolean => write!(f, "BOOLEAN"),
            Self::Date => write!(f, "DATE"),
            Self::Timestamp => write!(f, "TIMESTAMP"),
        }
    }
}
