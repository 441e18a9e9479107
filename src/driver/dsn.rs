/// Connection string parsing
///
/// Syntax: `[PROTO:ADDR[,OPT=VAL|OPT]*]*DBNAME/USER/PASSWORD`. The protocol
/// part is optional; every engine is in-process, so it only carries options.
/// Recognized options: `laddr` and `timeout` (a duration such as `300ms`,
/// `1.5s` or `2h45m`).

use crate::core::{Error, Result};
use log::info;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit0, digit1},
    combinator::{all_consuming, map, opt, recognize, value},
    multi::many1,
    sequence::{pair, tuple},
    IResult,
};
use std::time::Duration;

pub const DEFAULT_DSN: &str = "default";

/// The registry key for a connection string: empty means `default`.
#[must_use]
pub fn normalize(dsn: &str) -> &str {
    if dsn.is_empty() { DEFAULT_DSN } else { dsn }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnConfig {
    pub proto: String,
    pub addr: String,
    pub laddr: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub timeout: Option<Duration>,
}

impl ConnConfig {
    /// Parses a connection string. Malformed protocol or database parts are
    /// tolerated and leave their fields empty; bad options are errors.
    pub fn parse(dsn: &str) -> Result<Self> {
        let mut config = Self::default();
        if dsn.is_empty() {
            info!("empty connection string, using '{DEFAULT_DSN}' engine");
        }
        let dsn = normalize(dsn);

        let database_part = match dsn.split_once('*') {
            Some((protocol, rest)) => {
                let Some((proto, address)) = protocol.split_once(':') else {
                    return Ok(config);
                };
                config.proto = proto.to_string();
                let mut options = address.split(',');
                config.addr = options.next().unwrap_or_default().to_string();
                for option in options {
                    let (key, val) = option.split_once('=').unwrap_or((option, "true"));
                    match key {
                        "laddr" => config.laddr = val.to_string(),
                        "timeout" => {
                            let timeout = parse_duration(val)?;
                            config.timeout = (!timeout.is_zero()).then_some(timeout);
                        }
                        _ => return Err(Error::Unsupported(format!("connection option '{key}'"))),
                    }
                }
                rest
            }
            None => dsn,
        };

        let mut parts = database_part.splitn(3, '/');
        if let (Some(database), Some(user), Some(password)) = (parts.next(), parts.next(), parts.next()) {
            config.database = database.to_string();
            config.user = user.to_string();
            config.password = password.to_string();
        }
        Ok(config)
    }
}

fn unit(input: &str) -> IResult<&str, f64> {
    alt((
        value(1.0, tag("ns")),
        value(1e3, alt((tag("us"), tag("µs"), tag("μs")))),
        value(1e6, tag("ms")),
        value(1e9, tag("s")),
        value(60e9, tag("m")),
        value(3600e9, tag("h")),
    ))(input)
}

fn decimal(input: &str) -> IResult<&str, f64> {
    let (input, number) = alt((
        recognize(tuple((digit1, opt(pair(char('.'), digit0))))),
        recognize(pair(char('.'), digit1)),
    ))(input)?;
    // Only digits and one dot were recognized, so this cannot fail.
    Ok((input, number.parse().unwrap_or_default()))
}

fn duration(input: &str) -> IResult<&str, Option<f64>> {
    let (input, negative) = opt(alt((char('-'), char('+'))))(input)?;
    let (input, nanos) = alt((
        map(many1(pair(decimal, unit)), |terms| {
            terms.into_iter().map(|(n, scale)| n * scale).sum::<f64>()
        }),
        value(0.0, char('0')),
    ))(input)?;
    Ok((input, (negative != Some('-') || nanos == 0.0).then_some(nanos)))
}

/// Parses durations like `300ms`, `1.5s`, `2h45m`. Negative values are rejected.
pub fn parse_duration(text: &str) -> Result<Duration> {
    match all_consuming(duration)(text) {
        Ok((_, Some(nanos))) => Ok(Duration::from_nanos(nanos.round() as u64)),
        Ok((_, None)) => Err(Error::Config(format!("negative duration '{text}'"))),
        Err(_) => Err(Error::Config(format!("invalid duration '{text}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_database_part() {
        let config = ConnConfig::parse("shop/admin/secret").unwrap();
        assert_eq!(config.database, "shop");
        assert_eq!(config.user, "admin");
        assert_eq!(config.password, "secret");
        assert!(config.proto.is_empty());
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_password_keeps_slashes() {
        let config = ConnConfig::parse("db/u/p/q").unwrap();
        assert_eq!(config.password, "p/q");
    }

    #[test]
    fn test_protocol_part_with_options() {
        let config = ConnConfig::parse("tcp:10.0.0.1:5432,laddr=1.2.3.4:0,timeout=1.5s*db/u/p").unwrap();
        assert_eq!(config.proto, "tcp");
        assert_eq!(config.addr, "10.0.0.1:5432");
        assert_eq!(config.laddr, "1.2.3.4:0");
        assert_eq!(config.timeout, Some(Duration::from_millis(1500)));
        assert_eq!(config.database, "db");
    }

    #[test]
    fn test_malformed_parts_are_tolerated() {
        let config = ConnConfig::parse("nocolon*db/u/p").unwrap();
        assert_eq!(config, ConnConfig::default());

        let config = ConnConfig::parse("TestDrop").unwrap();
        assert!(config.database.is_empty());

        let config = ConnConfig::parse("").unwrap();
        assert!(config.database.is_empty());
        assert_eq!(normalize(""), "default");
    }

    #[test]
    fn test_option_errors() {
        assert!(matches!(
            ConnConfig::parse("unix:/tmp/s,compress*db/u/p"),
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(
            ConnConfig::parse("unix:/tmp/s,timeout=soon*db/u/p"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("300ms").unwrap(), Duration::from_millis(300));
        assert_eq!(parse_duration("2h45m").unwrap(), Duration::from_secs(2 * 3600 + 45 * 60));
        assert_eq!(parse_duration("1m0.5s").unwrap(), Duration::from_millis(60_500));
        assert_eq!(parse_duration("10us").unwrap(), Duration::from_micros(10));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
        assert!(parse_duration("").is_err());
        assert!(parse_duration("5").is_err());
        assert!(parse_duration("-1s").is_err());
        assert!(parse_duration("1x").is_err());
    }
}
