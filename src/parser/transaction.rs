use super::common::kw;
use super::instruction::{Instruction, Token};
use nom::{
    branch::alt,
    combinator::{map, opt},
    sequence::{pair, terminated},
    IResult,
};

pub fn begin_transaction(input: &str) -> IResult<&str, Instruction> {
    map(
        alt((
            terminated(kw("BEGIN"), opt(kw("TRANSACTION"))),
            map(pair(kw("START"), kw("TRANSACTION")), |(start, _)| start),
        )),
        |s| Instruction::new(Token::Begin, s),
    )(input)
}

pub fn commit_transaction(input: &str) -> IResult<&str, Instruction> {
    map(terminated(kw("COMMIT"), opt(kw("TRANSACTION"))), |s| {
        Instruction::new(Token::Commit, s)
    })(input)
}

pub fn rollback_transaction(input: &str) -> IResult<&str, Instruction> {
    map(terminated(kw("ROLLBACK"), opt(kw("TRANSACTION"))), |s| {
        Instruction::new(Token::Rollback, s)
    })(input)
}
