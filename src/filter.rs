//! Parsing of a single `[-]key:[op]value` token into a [`Filter`].

use crate::ast::{Filter, FilterValue, Operator};
use crate::dates;
use crate::error::{QueryError, Result};
use chrono::NaiveDate;
use tracing::trace;

/// Comparison prefixes, two-character forms first so `<=` never reads as `<`.
const PREFIX_OPERATORS: [(&str, Operator); 4] = [
    ("<=", Operator::Lte),
    (">=", Operator::Gte),
    ("<", Operator::Lt),
    (">", Operator::Gt),
];

/// Parses one filter token.
///
/// Relative dates on date fields resolve against `today`; an expression
/// that is not a relative date is kept as a literal.
pub fn parse_filter(token: &str, today: NaiveDate) -> Result<Filter> {
    let (negate, body) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };

    let Some((key, raw_value)) = body.split_once(':') else {
        return Err(QueryError::InvalidFilterFormat {
            token: token.to_string(),
        });
    };

    let (operator, value) = split_operator(raw_value);

    if let Some(inner) = value.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        let values: Vec<String> = inner.split_whitespace().map(str::to_string).collect();
        return Ok(Filter {
            key: key.to_string(),
            operator: Operator::In,
            value: FilterValue::List(values),
            negate,
        });
    }

    let mut value = unquote(value).to_string();
    if dates::is_date_field(key) {
        match dates::resolve(&value, today) {
            Ok(resolved) => value = resolved,
            Err(_) => trace!(key, value = %value, "not a relative date, keeping literal"),
        }
    }

    Ok(Filter {
        key: key.to_string(),
        operator,
        value: FilterValue::Scalar(value),
        negate,
    })
}

fn split_operator(raw: &str) -> (Operator, &str) {
    PREFIX_OPERATORS
        .iter()
        .find_map(|(prefix, op)| raw.strip_prefix(*prefix).map(|rest| (*op, rest)))
        .unwrap_or((Operator::Eq, raw))
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}
