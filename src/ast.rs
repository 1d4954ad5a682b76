//! The structured query model produced by [`crate::parser::QueryParser`].

use crate::error::QueryError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};
use std::fmt;

/// Root of a parsed saved-view query.
///
/// A `limit` of zero or less means unbounded. The parser seeds it with the
/// configured default, so only hand-built queries start at zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParsedQuery {
    /// Filters in order of appearance; every one is ANDed.
    pub filters: Vec<Filter>,
    pub sort: Option<SortOption>,
    pub group: Option<GroupOption>,
    pub limit: i64,
    #[serde(default)]
    pub view_type: String,
    #[serde(default)]
    pub columns: Vec<String>,
}

/// One `key:value` condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub key: String,
    pub operator: Operator,
    pub value: FilterValue,
    #[serde(default)]
    pub negate: bool,
}

/// Scalar for comparisons, list for `in`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Scalar(String),
    List(Vec<String>),
}

/// Comparison operator of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Operator {
    Eq,    // =
    NotEq, // !=
    Lt,    // <
    Gt,    // >
    Lte,   // <=
    Gte,   // >=
    In,    // in
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Lte => "<=",
            Operator::Gte => ">=",
            Operator::In => "in",
        }
    }

    /// Logical complement of a scalar operator.
    ///
    /// `in` has no single-operator complement and yields `None`.
    pub fn complement(self) -> Option<Operator> {
        match self {
            Operator::Eq => Some(Operator::NotEq),
            Operator::NotEq => Some(Operator::Eq),
            Operator::Lt => Some(Operator::Gte),
            Operator::Gte => Some(Operator::Lt),
            Operator::Gt => Some(Operator::Lte),
            Operator::Lte => Some(Operator::Gt),
            Operator::In => None,
        }
    }

    /// Prefix written in front of a scalar value in query text.
    fn text_prefix(&self) -> &'static str {
        match self {
            Operator::Eq | Operator::In => "",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Operator {
    type Error = QueryError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "=" => Ok(Operator::Eq),
            "!=" => Ok(Operator::NotEq),
            "<" => Ok(Operator::Lt),
            ">" => Ok(Operator::Gt),
            "<=" => Ok(Operator::Lte),
            ">=" => Ok(Operator::Gte),
            "in" => Ok(Operator::In),
            other => Err(QueryError::UnsupportedOperator {
                operator: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Operator {
    type Error = QueryError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Operator::try_from(s.as_str())
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOption {
    pub field: String,
    #[serde(default)]
    pub order: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupOption {
    pub field: String,
}

/// Whether a scalar must be quoted to read back as the same literal.
///
/// Unquoted, a leading `<`/`>` becomes an operator, `(..)` becomes a list
/// and whitespace splits the token.
fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value.chars().any(char::is_whitespace)
        || value.starts_with(['<', '>', '(', '-'])
        || value.ends_with(')')
}

fn write_scalar(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    if needs_quotes(value) {
        write!(f, "\"{}\"", value)
    } else {
        f.write_str(value)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negate {
            f.write_str("-")?;
        }
        write!(f, "{}:", self.key)?;
        match &self.value {
            FilterValue::Scalar(v) => {
                f.write_str(self.operator.text_prefix())?;
                write_scalar(f, v)
            }
            FilterValue::List(values) => write!(f, "({})", values.join(" ")),
        }
    }
}

impl ParsedQuery {
    /// Canonical text of the query, suitable for stable comparison of views.
    ///
    /// Filters keep their order; display options follow in a fixed order.
    pub fn normalized(&self) -> String {
        let mut parts: Vec<String> = self.filters.iter().map(|f| f.to_string()).collect();

        if let Some(sort) = &self.sort {
            parts.push(format!("sort:{}_{}", sort.field, sort.order.as_str()));
        }
        if let Some(group) = &self.group {
            parts.push(format!("group:{}", group.field));
        }
        parts.push(format!("limit:{}", self.limit));
        if !self.view_type.is_empty() {
            parts.push(format!("view:{}", self.view_type));
        }
        if !self.columns.is_empty() {
            parts.push(format!("cols:({})", self.columns.join(" ")));
        }

        parts.join(" ")
    }

    /// Display settings of a saved view as a JSON object.
    ///
    /// Only options that are set appear; `limit` only when positive.
    pub fn presentation(&self) -> JsonValue {
        let mut map = Map::new();
        if let Some(sort) = &self.sort {
            map.insert(
                "sort".to_string(),
                json!(format!("{}_{}", sort.field, sort.order.as_str())),
            );
        }
        if let Some(group) = &self.group {
            map.insert("group".to_string(), json!(group.field));
        }
        if self.limit > 0 {
            map.insert("limit".to_string(), json!(self.limit));
        }
        if !self.columns.is_empty() {
            map.insert("cols".to_string(), json!(self.columns));
        }
        if !self.view_type.is_empty() {
            map.insert("view".to_string(), json!(self.view_type));
        }
        JsonValue::Object(map)
    }
}
