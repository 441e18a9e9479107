use super::instruction::{Instruction, Token};
use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while},
    character::complete::{alpha1, char, digit1, multispace0, none_of, satisfy},
    combinator::{map, not, opt, peek, recognize, verify},
    multi::many0,
    sequence::{delimited, pair, terminated, tuple},
    IResult,
};

// Words that end an identifier position in some clause. Quoting lifts the
// restriction.
const RESERVED: &[&str] = &[
    "SELECT", "FROM", "WHERE", "AND", "OR", "NOT", "NULL", "IS", "IN", "LIKE", "ORDER", "BY",
    "LIMIT", "OFFSET", "SET", "VALUES", "IF", "EXISTS", "ASC", "DESC", "TRUE", "FALSE",
    "PRIMARY", "UNIQUE", "DEFAULT", "AUTOINCREMENT", "AUTO_INCREMENT",
];

pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Case-insensitive keyword that is not a prefix of a longer word.
pub fn kw<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    ws(terminated(
        tag_no_case(word),
        not(peek(satisfy(is_ident_char))),
    ))
}

fn bare_identifier(input: &str) -> IResult<&str, String> {
    map(
        verify(
            recognize(pair(
                alt((alpha1, tag("_"))),
                take_while(is_ident_char),
            )),
            |s: &str| !RESERVED.contains(&s.to_uppercase().as_str()),
        ),
        |s: &str| s.to_string(),
    )(input)
}

fn quoted_identifier(input: &str) -> IResult<&str, String> {
    map(
        alt((
            delimited(char('"'), take_while(|c| c != '"'), char('"')),
            delimited(char('`'), take_while(|c| c != '`'), char('`')),
        )),
        |s: &str| s.to_string(),
    )(input)
}

pub fn identifier(input: &str) -> IResult<&str, String> {
    ws(alt((quoted_identifier, bare_identifier)))(input)
}

pub fn identifier_node(input: &str) -> IResult<&str, Instruction> {
    map(identifier, |name| Instruction::new(Token::Identifier, name))(input)
}

/// Single-quoted string with `''` as an escaped quote.
pub fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        delimited(
            char('\''),
            many0(alt((map(tag("''"), |_| '\''), none_of("'")))),
            char('\''),
        ),
        |chars: Vec<char>| chars.into_iter().collect(),
    )(input)
}

pub fn number(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        opt(char('-')),
        digit1,
        opt(pair(char('.'), digit1)),
    )))(input)
}

pub fn literal(input: &str) -> IResult<&str, Instruction> {
    ws(alt((
        map(kw("NULL"), |s| Instruction::new(Token::Null, s)),
        map(kw("TRUE"), |s| Instruction::new(Token::True, s)),
        map(kw("FALSE"), |s| Instruction::new(Token::False, s)),
        map(
            alt((
                recognize(tuple((tag_no_case("NOW"), ws(char('(')), char(')')))),
                tag_no_case("CURRENT_TIMESTAMP"),
            )),
            |s| Instruction::new(Token::Now, s),
        ),
        map(string_literal, |s| Instruction::new(Token::String, s)),
        map(number, |s| Instruction::new(Token::Number, s)),
    )))(input)
}
