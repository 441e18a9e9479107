/// Condition evaluation for WHERE clauses
///
/// A `Where` subtree is compiled once per statement against the relation
/// schema, so unknown columns fail before any row is touched. Evaluation then
/// runs per row. Supports =, !=, >, <, >=, <=, LIKE, IN, IS [NOT] NULL, AND, OR.

use super::literal_value;
use crate::core::{Error, Relation, Result, Row, Value};
use crate::parser::{Instruction, Token};
use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub enum Predicate {
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
    Compare { column: usize, op: Token, value: Value },
    Like { column: usize, pattern: String },
    In { column: usize, values: Vec<Value> },
    IsNull(usize),
    IsNotNull(usize),
}

impl Predicate {
    /// Compiles an optional `Where` node. No clause means every row matches.
    pub fn from_where(relation: &Relation, clause: Option<&Instruction>) -> Result<Self> {
        match clause {
            None => Ok(Self::All(Vec::new())),
            Some(clause) => {
                let node = clause
                    .single_child()
                    .ok_or_else(|| Error::Shape("unexpected where arguments".to_string()))?;
                Self::compile(relation, node)
            }
        }
    }

    pub fn compile(relation: &Relation, node: &Instruction) -> Result<Self> {
        match node.token {
            Token::And => Ok(Self::All(Self::compile_all(relation, &node.children)?)),
            Token::Or => Ok(Self::Any(Self::compile_all(relation, &node.children)?)),
            Token::IsNull => Ok(Self::IsNull(Self::column(relation, node)?)),
            Token::IsNotNull => Ok(Self::IsNotNull(Self::column(relation, node)?)),
            Token::In => {
                let column = Self::column(relation, node)?;
                let values = node.children[1..]
                    .iter()
                    .map(|lit| Self::operand(relation, column, lit))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::In { column, values })
            }
            Token::Like => {
                let column = Self::column(relation, node)?;
                match node.children.get(1).map(literal_value).transpose()? {
                    Some(Value::Text(pattern)) => Ok(Self::Like { column, pattern }),
                    _ => Err(Error::TypeMismatch),
                }
            }
            Token::Equal
            | Token::NotEqual
            | Token::Less
            | Token::LessOrEqual
            | Token::Greater
            | Token::GreaterOrEqual => {
                let column = Self::column(relation, node)?;
                let literal = node
                    .children
                    .get(1)
                    .ok_or_else(|| Error::Shape(format!("missing operand for '{}'", node.lexeme)))?;
                let value = Self::operand(relation, column, literal)?;
                Ok(Self::Compare { column, op: node.token, value })
            }
            other => Err(Error::Shape(format!("unexpected predicate {other:?}"))),
        }
    }

    fn compile_all(relation: &Relation, nodes: &[Instruction]) -> Result<Vec<Self>> {
        nodes.iter().map(|n| Self::compile(relation, n)).collect()
    }

    fn column(relation: &Relation, node: &Instruction) -> Result<usize> {
        match node.children.first() {
            Some(ident) if ident.token == Token::Identifier => relation.column_index(&ident.lexeme),
            _ => Err(Error::Shape(format!("expected column in '{}'", node.lexeme))),
        }
    }

    // Literals take the column's type when they convert cleanly, otherwise
    // they are compared as written.
    fn operand(relation: &Relation, column: usize, literal: &Instruction) -> Result<Value> {
        let value = literal_value(literal)?;
        Ok(relation.columns[column]
            .data_type
            .coerce(value.clone())
            .unwrap_or(value))
    }

    pub fn matches(&self, row: &Row) -> Result<bool> {
        match self {
            Self::All(preds) => {
                for p in preds {
                    if !p.matches(row)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Any(preds) => {
                for p in preds {
                    if p.matches(row)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Self::IsNull(column) => Ok(row.values[*column].is_null()),
            Self::IsNotNull(column) => Ok(!row.values[*column].is_null()),
            Self::In { column, values } => {
                let cell = &row.values[*column];
                if cell.is_null() {
                    return Ok(false);
                }
                Ok(values
                    .iter()
                    .any(|v| cell.compare(v) == Some(Ordering::Equal)))
            }
            Self::Like { column, pattern } => match &row.values[*column] {
                Value::Text(text) => Ok(like_match(text, pattern)),
                Value::Null => Ok(false),
                _ => Err(Error::TypeMismatch),
            },
            Self::Compare { column, op, value } => {
                let cell = &row.values[*column];
                if cell.is_null() || value.is_null() {
                    return Ok(false);
                }
                let ordering = cell.compare(value).ok_or(Error::TypeMismatch)?;
                Ok(match op {
                    Token::Equal => ordering == Ordering::Equal,
                    Token::NotEqual => ordering != Ordering::Equal,
                    Token::Less => ordering == Ordering::Less,
                    Token::LessOrEqual => ordering != Ordering::Greater,
                    Token::Greater => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                })
            }
        }
    }
}

/// LIKE matching: `%` is any run of characters, `_` exactly one.
///
/// Iterative with a single backtrack point at the last `%`, so long patterns
/// cannot blow the stack.
fn like_match(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    let (mut ti, mut pi) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while ti < text.len() {
        if pi < pattern.len() && (pattern[pi] == '_' || pattern[pi] == text[ti]) {
            ti += 1;
            pi += 1;
        } else if pi < pattern.len() && pattern[pi] == '%' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((star_pi, star_ti)) = star {
            pi = star_pi + 1;
            ti = star_ti + 1;
            star = Some((star_pi, star_ti + 1));
        } else {
            return false;
        }
    }
    pattern[pi..].iter().all(|&c| c == '%')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Column, DataType};
    use crate::parser::parse_statement;

    fn create_test_relation() -> Relation {
        Relation::new(
            "users".to_string(),
            vec![
                Column::new("id", DataType::Integer),
                Column::new("name", DataType::Text),
                Column::new("score", DataType::Real),
            ],
        )
    }

    fn row(id: i64, name: &str, score: Option<f64>) -> Row {
        Row::new(vec![
            Value::Integer(id),
            Value::Text(name.to_string()),
            score.map_or(Value::Null, Value::Real),
        ])
    }

    fn predicate(sql_where: &str) -> Result<Predicate> {
        let select = parse_statement(&format!("SELECT * FROM users WHERE {sql_where}")).unwrap();
        Predicate::from_where(&create_test_relation(), select.find(Token::Where))
    }

    #[test]
    fn test_equals_and_ordering() {
        let p = predicate("id >= 2 AND id < 4").unwrap();
        assert!(!p.matches(&row(1, "a", None)).unwrap());
        assert!(p.matches(&row(2, "a", None)).unwrap());
        assert!(!p.matches(&row(4, "a", None)).unwrap());
    }

    #[test]
    fn test_integer_literal_against_real_column() {
        let p = predicate("score > 1").unwrap();
        assert!(p.matches(&row(1, "a", Some(1.5))).unwrap());
        assert!(!p.matches(&row(1, "a", None)).unwrap());
    }

    #[test]
    fn test_or_and_in() {
        let p = predicate("name = 'bob' OR id IN (7, 9)").unwrap();
        assert!(p.matches(&row(1, "bob", None)).unwrap());
        assert!(p.matches(&row(9, "x", None)).unwrap());
        assert!(!p.matches(&row(8, "x", None)).unwrap());
    }

    #[test]
    fn test_is_null() {
        let p = predicate("score IS NULL").unwrap();
        assert!(p.matches(&row(1, "a", None)).unwrap());
        let p = predicate("score IS NOT NULL").unwrap();
        assert!(p.matches(&row(1, "a", Some(0.0))).unwrap());
    }

    #[test]
    fn test_unknown_column_fails_at_compile() {
        assert!(matches!(predicate("age = 1"), Err(Error::Shape(_))));
    }

    #[test]
    fn test_type_mismatch() {
        let p = predicate("name > 3").unwrap();
        assert!(matches!(p.matches(&row(1, "a", None)), Err(Error::TypeMismatch)));
    }

    #[test]
    fn test_like_patterns() {
        assert!(like_match("hello", "h%o"));
        assert!(like_match("hello", "_ello"));
        assert!(like_match("hello", "%"));
        assert!(like_match("", "%%"));
        assert!(!like_match("hello", "h_o"));
        assert!(like_match("abcabc", "%abc"));
        assert!(!like_match("abc", "abcd"));
    }
}
