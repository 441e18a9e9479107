use super::common::{identifier, identifier_node, kw, literal, ws};
use super::instruction::{Instruction, Token};
use nom::{
    branch::alt,
    character::complete::{char, digit1},
    combinator::{map, opt},
    multi::{many0, separated_list1},
    sequence::{delimited, preceded, tuple},
    IResult,
};

fn if_not_exists(input: &str) -> IResult<&str, Instruction> {
    map(tuple((kw("IF"), kw("NOT"), kw("EXISTS"))), |_| {
        Instruction::new(Token::IfNotExists, "IF NOT EXISTS")
    })(input)
}

/// Builds a target node, carrying the existence guard whichever side of the
/// name it was written on.
fn target(
    token: Token,
    lexeme: &str,
    guard: Option<Instruction>,
    trailing_guard: Option<Instruction>,
    name: Instruction,
) -> Instruction {
    let mut node = Instruction::new(token, lexeme);
    if let Some(guard) = guard.or(trailing_guard) {
        node.children.push(guard);
    }
    node.with_child(name)
}

// TYPE [(n [, m])] [PRECISION]
fn type_name(input: &str) -> IResult<&str, Instruction> {
    let (input, name) = identifier(input)?;
    let (input, params) = opt(delimited(
        ws(char('(')),
        tuple((
            ws(digit1),
            opt(preceded(ws(char(',')), ws(digit1))),
        )),
        ws(char(')')),
    ))(input)?;
    let (input, _) = opt(kw("PRECISION"))(input)?;

    let mut node = Instruction::new(Token::TypeName, name);
    if let Some((length, _scale)) = params {
        node.children.push(Instruction::new(Token::Number, length));
    }
    Ok((input, node))
}

fn column_constraint(input: &str) -> IResult<&str, Option<Instruction>> {
    alt((
        map(tuple((kw("NOT"), kw("NULL"))), |_| {
            Some(Instruction::new(Token::NotNull, "NOT NULL"))
        }),
        map(tuple((kw("PRIMARY"), kw("KEY"))), |_| {
            Some(Instruction::new(Token::PrimaryKey, "PRIMARY KEY"))
        }),
        map(kw("UNIQUE"), |s| Some(Instruction::new(Token::Unique, s))),
        map(alt((kw("AUTOINCREMENT"), kw("AUTO_INCREMENT"))), |s| {
            Some(Instruction::new(Token::AutoIncrement, s))
        }),
        map(preceded(kw("DEFAULT"), literal), |value| {
            Some(Instruction::new(Token::Default, "DEFAULT").with_child(value))
        }),
        // Explicit NULL is the default nullability
        map(kw("NULL"), |_| None),
    ))(input)
}

fn column_def(input: &str) -> IResult<&str, Instruction> {
    let (input, name) = identifier(input)?;
    let (input, ty) = type_name(input)?;
    let (input, constraints) = many0(column_constraint)(input)?;

    let mut node = Instruction::new(Token::ColumnDef, name).with_child(ty);
    node.children.extend(constraints.into_iter().flatten());
    Ok((input, node))
}

pub fn create_table(input: &str) -> IResult<&str, Instruction> {
    let (input, _) = kw("CREATE")(input)?;
    let (input, lexeme) = kw("TABLE")(input)?;
    let (input, guard) = opt(if_not_exists)(input)?;
    let (input, name) = identifier_node(input)?;
    let (input, columns) = delimited(
        ws(char('(')),
        separated_list1(ws(char(',')), column_def),
        ws(char(')')),
    )(input)?;
    let (input, trailing_guard) = opt(if_not_exists)(input)?;

    let table = target(Token::Table, lexeme, guard, trailing_guard, name.with_children(columns));
    Ok((input, Instruction::new(Token::Create, "CREATE").with_child(table)))
}

pub fn create_database(input: &str) -> IResult<&str, Instruction> {
    let (input, _) = kw("CREATE")(input)?;
    let (input, lexeme) = kw("DATABASE")(input)?;
    let (input, guard) = opt(if_not_exists)(input)?;
    let (input, name) = identifier_node(input)?;
    let (input, trailing_guard) = opt(if_not_exists)(input)?;

    let database = target(Token::Database, lexeme, guard, trailing_guard, name);
    Ok((input, Instruction::new(Token::Create, "CREATE").with_child(database)))
}

pub fn drop(input: &str) -> IResult<&str, Instruction> {
    let (input, _) = kw("DROP")(input)?;
    let (input, kind) = alt((
        map(kw("TABLE"), |s| Instruction::new(Token::Table, s)),
        map(kw("DATABASE"), |s| Instruction::new(Token::Database, s)),
    ))(input)?;
    let (input, name) = identifier_node(input)?;

    Ok((input, Instruction::new(Token::Drop, "DROP").with_child(kind.with_child(name))))
}

pub fn truncate(input: &str) -> IResult<&str, Instruction> {
    let (input, _) = kw("TRUNCATE")(input)?;
    let (input, _) = opt(kw("TABLE"))(input)?;
    let (input, name) = identifier_node(input)?;

    let table = Instruction::new(Token::Table, "TABLE").with_child(name);
    Ok((input, Instruction::new(Token::Truncate, "TRUNCATE").with_child(table)))
}
