/// DDL (Data Definition Language) operations
///
/// CREATE DATABASE/TABLE, DROP DATABASE/TABLE, TRUNCATE

use super::{identifier, literal_value};
use crate::core::{Column, DataType, Database, Error, Relation, Result};
use crate::parser::{Instruction, Token};
use crate::protocol::EngineConn;
use log::debug;
use std::collections::HashSet;

pub struct DdlExecutor;

impl DdlExecutor {
    /// Execute CREATE statement
    ///
    /// The engine has a single flat namespace, so CREATE DATABASE is
    /// acknowledged without allocating anything.
    pub fn create(db: &mut Database, decl: &Instruction, conn: &mut dyn EngineConn) -> Result<()> {
        let target = decl
            .single_child()
            .ok_or_else(|| Error::Shape("unexpected create arguments".to_string()))?;

        match target.token {
            Token::Database => {
                let name = identifier(target.find(Token::Identifier), "database")?;
                debug!("database '{name}' accepted");
                conn.write_result(0, 1)
            }
            Token::Table => Self::create_table(db, target, conn),
            _ => Err(Error::Shape("unexpected create arguments".to_string())),
        }
    }

    fn create_table(db: &mut Database, table: &Instruction, conn: &mut dyn EngineConn) -> Result<()> {
        let name_node = table
            .find(Token::Identifier)
            .ok_or_else(|| Error::Shape("expected table name".to_string()))?;
        let name = name_node.lexeme.clone();

        if db.contains(&name) {
            if table.has(Token::IfNotExists) {
                debug!("relation '{name}' exists, create skipped");
                return conn.write_result(0, 0);
            }
            return Err(Error::AlreadyExists(name));
        }

        if name_node.children.is_empty() {
            return Err(Error::Shape(format!("table '{name}' needs at least one column")));
        }

        let mut seen = HashSet::new();
        let columns = name_node
            .children
            .iter()
            .map(|def| {
                let column = Self::column(def)?;
                if !seen.insert(column.name.clone()) {
                    return Err(Error::Shape(format!("duplicate column '{}'", column.name)));
                }
                Ok(column)
            })
            .collect::<Result<Vec<Column>>>()?;

        db.create_relation(Relation::new(name.clone(), columns))?;
        debug!("relation '{name}' created");
        conn.write_result(0, 1)
    }

    /// Builds a column from `ColumnDef[TypeName[Number?], constraint*]`.
    fn column(def: &Instruction) -> Result<Column> {
        if def.token != Token::ColumnDef {
            return Err(Error::Shape("expected column definition".to_string()));
        }
        let type_node = def
            .children
            .first()
            .filter(|n| n.token == Token::TypeName)
            .ok_or_else(|| Error::Shape(format!("column '{}' has no type", def.lexeme)))?;
        let length = type_node
            .children
            .first()
            .map(|n| {
                n.lexeme
                    .parse::<usize>()
                    .map_err(|_| Error::Parse(format!("invalid type length '{}'", n.lexeme)))
            })
            .transpose()?;

        let mut column = Column::new(def.lexeme.clone(), DataType::from_name(&type_node.lexeme, length)?);

        for constraint in &def.children[1..] {
            match constraint.token {
                Token::NotNull => column.not_null = true,
                Token::PrimaryKey => column.primary_key = true,
                Token::Unique => column.unique = true,
                Token::AutoIncrement => column.autoincrement = true,
                Token::Default => {
                    let literal = constraint
                        .single_child()
                        .ok_or_else(|| Error::Shape("DEFAULT needs a value".to_string()))?;
                    column.default = Some(column.data_type.coerce(literal_value(literal)?)?);
                }
                other => return Err(Error::Shape(format!("unexpected column constraint {other:?}"))),
            }
        }

        if column.autoincrement && !matches!(column.data_type, DataType::Integer | DataType::Serial) {
            return Err(Error::Shape(format!(
                "AUTOINCREMENT column '{}' must be an integer",
                column.name
            )));
        }
        Ok(column)
    }

    /// Execute DROP statement
    ///
    /// DROP DATABASE always succeeds; there is no per-database container.
    pub fn drop(db: &mut Database, decl: &Instruction, conn: &mut dyn EngineConn) -> Result<()> {
        let target = decl
            .single_child()
            .filter(|t| matches!(t.token, Token::Database | Token::Table) && t.children.len() == 1)
            .ok_or_else(|| Error::Shape("unexpected drop arguments".to_string()))?;

        if target.token == Token::Database {
            return conn.write_result(0, 1);
        }

        let name = &target.children[0].lexeme;
        db.drop_relation(name)?;
        debug!("relation '{name}' dropped");
        conn.write_result(0, 1)
    }

    /// Execute TRUNCATE statement: drops every row, keeps the schema.
    pub fn truncate(db: &mut Database, decl: &Instruction, conn: &mut dyn EngineConn) -> Result<()> {
        let target = decl
            .single_child()
            .filter(|t| t.token == Token::Table)
            .ok_or_else(|| Error::Shape("unexpected truncate arguments".to_string()))?;
        let name = identifier(target.single_child(), "table")?;

        let relation = db.relation_mut(&name)?;
        let removed = relation.rows.len();
        relation.rows.clear();
        conn.write_result(0, removed as i64)
    }
}
