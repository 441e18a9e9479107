use super::common::{identifier_node, kw, literal, ws};
use super::instruction::{Instruction, Token};
use super::queries::where_clause;
use nom::{
    character::complete::char,
    combinator::{map, opt},
    multi::separated_list1,
    sequence::{delimited, separated_pair},
    IResult,
};

fn tuple_node(input: &str) -> IResult<&str, Instruction> {
    map(
        delimited(
            ws(char('(')),
            separated_list1(ws(char(',')), literal),
            ws(char(')')),
        ),
        |values| Instruction::new(Token::Tuple, "()").with_children(values),
    )(input)
}

pub fn insert(input: &str) -> IResult<&str, Instruction> {
    let (input, _) = kw("INSERT")(input)?;
    let (input, into) = kw("INTO")(input)?;
    let (input, table) = identifier_node(input)?;
    let (input, columns) = opt(delimited(
        ws(char('(')),
        separated_list1(ws(char(',')), identifier_node),
        ws(char(')')),
    ))(input)?;
    let (input, values) = kw("VALUES")(input)?;
    let (input, tuples) = separated_list1(ws(char(',')), tuple_node)(input)?;

    let table = table.with_children(columns.unwrap_or_default());
    let node = Instruction::new(Token::Insert, "INSERT").with_children(vec![
        Instruction::new(Token::Into, into).with_child(table),
        Instruction::new(Token::Values, values).with_children(tuples),
    ]);
    Ok((input, node))
}

fn assignment(input: &str) -> IResult<&str, Instruction> {
    map(
        separated_pair(identifier_node, ws(char('=')), literal),
        |(column, value)| Instruction::new(Token::Assign, "=").with_children(vec![column, value]),
    )(input)
}

pub fn update(input: &str) -> IResult<&str, Instruction> {
    let (input, _) = kw("UPDATE")(input)?;
    let (input, table) = identifier_node(input)?;
    let (input, set) = kw("SET")(input)?;
    let (input, assignments) = separated_list1(ws(char(',')), assignment)(input)?;
    let (input, filter) = opt(where_clause)(input)?;

    let mut node = Instruction::new(Token::Update, "UPDATE").with_children(vec![
        table,
        Instruction::new(Token::Set, set).with_children(assignments),
    ]);
    node.children.extend(filter);
    Ok((input, node))
}

pub fn delete(input: &str) -> IResult<&str, Instruction> {
    let (input, _) = kw("DELETE")(input)?;
    let (input, from) = kw("FROM")(input)?;
    let (input, table) = identifier_node(input)?;
    let (input, filter) = opt(where_clause)(input)?;

    let mut node = Instruction::new(Token::Delete, "DELETE")
        .with_child(Instruction::new(Token::From, from).with_child(table));
    node.children.extend(filter);
    Ok((input, node))
}
