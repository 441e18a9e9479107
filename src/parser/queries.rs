use super::common::{identifier_node, kw, literal, ws};
use super::instruction::{Instruction, Token};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1},
    combinator::{map, opt},
    multi::separated_list1,
    sequence::{delimited, tuple},
    IResult,
};

// Parse a simple condition (column = value, etc.)
fn condition_term(input: &str) -> IResult<&str, Instruction> {
    alt((
        map(
            tuple((identifier_node, kw("IS"), kw("NOT"), kw("NULL"))),
            |(column, _, _, _)| Instruction::new(Token::IsNotNull, "IS NOT NULL").with_child(column),
        ),
        map(
            tuple((identifier_node, kw("IS"), kw("NULL"))),
            |(column, _, _)| Instruction::new(Token::IsNull, "IS NULL").with_child(column),
        ),
        map(
            tuple((
                identifier_node,
                kw("IN"),
                delimited(
                    ws(char('(')),
                    separated_list1(ws(char(',')), literal),
                    ws(char(')')),
                ),
            )),
            |(column, lexeme, values)| {
                let mut node = Instruction::new(Token::In, lexeme).with_child(column);
                node.children.extend(values);
                node
            },
        ),
        map(
            tuple((identifier_node, kw("LIKE"), literal)),
            |(column, lexeme, pattern)| {
                Instruction::new(Token::Like, lexeme).with_children(vec![column, pattern])
            },
        ),
        // Comparison operators, longest first
        map(
            tuple((
                identifier_node,
                ws(alt((
                    tag(">="),
                    tag("<="),
                    tag("!="),
                    tag("<>"),
                    tag("="),
                    tag(">"),
                    tag("<"),
                ))),
                literal,
            )),
            |(column, op, value)| {
                let token = match op {
                    ">=" => Token::GreaterOrEqual,
                    "<=" => Token::LessOrEqual,
                    "!=" | "<>" => Token::NotEqual,
                    ">" => Token::Greater,
                    "<" => Token::Less,
                    _ => Token::Equal,
                };
                Instruction::new(token, op).with_children(vec![column, value])
            },
        ),
    ))(input)
}

/// Wraps terms in an n-ary node, or returns the single term unwrapped.
fn collapse(token: Token, lexeme: &str, mut terms: Vec<Instruction>) -> Instruction {
    if terms.len() == 1 {
        terms.remove(0)
    } else {
        Instruction::new(token, lexeme).with_children(terms)
    }
}

// AND binds tighter than OR. Both are n-ary, so the tree depth stays fixed
// however long the predicate is.
fn condition_and(input: &str) -> IResult<&str, Instruction> {
    map(separated_list1(kw("AND"), condition_term), |terms| {
        collapse(Token::And, "AND", terms)
    })(input)
}

pub fn condition(input: &str) -> IResult<&str, Instruction> {
    map(separated_list1(kw("OR"), condition_and), |groups| {
        collapse(Token::Or, "OR", groups)
    })(input)
}

pub fn where_clause(input: &str) -> IResult<&str, Instruction> {
    let (input, lexeme) = kw("WHERE")(input)?;
    let (input, predicate) = condition(input)?;
    Ok((input, Instruction::new(Token::Where, lexeme).with_child(predicate)))
}

fn projection(input: &str) -> IResult<&str, Instruction> {
    let (input, items) = alt((
        map(ws(char('*')), |_| vec![Instruction::new(Token::Star, "*")]),
        map(
            tuple((kw("COUNT"), ws(char('(')), ws(char('*')), ws(char(')')))),
            |(lexeme, _, _, _)| vec![Instruction::new(Token::Count, lexeme)],
        ),
        separated_list1(ws(char(',')), identifier_node),
    ))(input)?;
    Ok((input, Instruction::new(Token::Projection, "").with_children(items)))
}

fn order_by(input: &str) -> IResult<&str, Instruction> {
    let (input, lexeme) = kw("ORDER")(input)?;
    let (input, _) = kw("BY")(input)?;
    let (input, column) = identifier_node(input)?;
    let (input, direction) = opt(alt((
        map(kw("ASC"), |s| Instruction::new(Token::Asc, s)),
        map(kw("DESC"), |s| Instruction::new(Token::Desc, s)),
    )))(input)?;

    let direction = direction.unwrap_or_else(|| Instruction::new(Token::Asc, "ASC"));
    Ok((input, Instruction::new(Token::Order, lexeme).with_child(column.with_child(direction))))
}

fn count_clause<'a>(
    keyword: &'static str,
    token: Token,
) -> impl FnMut(&'a str) -> IResult<&'a str, Instruction> {
    map(tuple((kw(keyword), ws(digit1))), move |(lexeme, n)| {
        Instruction::new(token, lexeme).with_child(Instruction::new(Token::Number, n))
    })
}

pub fn select(input: &str) -> IResult<&str, Instruction> {
    let (input, _) = kw("SELECT")(input)?;
    let (input, projection) = projection(input)?;
    let (input, from) = kw("FROM")(input)?;
    let (input, table) = identifier_node(input)?;
    let (input, filter) = opt(where_clause)(input)?;
    let (input, order) = opt(order_by)(input)?;
    let (input, limit) = opt(count_clause("LIMIT", Token::Limit))(input)?;
    let (input, offset) = opt(count_clause("OFFSET", Token::Offset))(input)?;

    let mut node = Instruction::new(Token::Select, "SELECT").with_children(vec![
        projection,
        Instruction::new(Token::From, from).with_child(table),
    ]);
    node.children.extend(filter);
    node.children.extend(order);
    node.children.extend(limit);
    node.children.extend(offset);
    Ok((input, node))
}
