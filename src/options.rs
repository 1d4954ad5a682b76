//! Display options: `sort:`, `group:`, `limit:`, `view:`, `cols:`.

use crate::ast::{GroupOption, SortOption, SortOrder};
use crate::error::{QueryError, Result};

/// A token that shapes presentation instead of filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayOption {
    Sort(SortOption),
    Group(GroupOption),
    Limit(i64),
    View(String),
    Columns(Vec<String>),
}

impl DisplayOption {
    /// Recognizes a display option by its prefix.
    ///
    /// Prefixes are tested in a fixed order and the first match wins.
    /// Returns `None` if the token is not a display option at all.
    pub fn from_token(token: &str) -> Option<Result<DisplayOption>> {
        if let Some(rest) = token.strip_prefix("sort:") {
            return Some(Ok(DisplayOption::Sort(parse_sort(rest))));
        }
        if let Some(rest) = token.strip_prefix("group:") {
            return Some(Ok(DisplayOption::Group(GroupOption {
                field: rest.to_string(),
            })));
        }
        if let Some(rest) = token.strip_prefix("limit:") {
            return Some(parse_limit(token, rest).map(DisplayOption::Limit));
        }
        if let Some(rest) = token.strip_prefix("view:") {
            return Some(Ok(DisplayOption::View(rest.to_string())));
        }
        if let Some(rest) = token.strip_prefix("cols:") {
            return Some(Ok(DisplayOption::Columns(parse_columns(rest))));
        }
        None
    }
}

fn parse_sort(value: &str) -> SortOption {
    let (field, order) = if let Some(field) = value.strip_suffix("_desc") {
        (field, SortOrder::Desc)
    } else if let Some(field) = value.strip_suffix("_asc") {
        (field, SortOrder::Asc)
    } else {
        (value, SortOrder::Asc)
    };
    SortOption {
        field: field.to_string(),
        order,
    }
}

fn parse_limit(token: &str, value: &str) -> Result<i64> {
    value.parse::<i64>().map_err(|_| QueryError::InvalidLimitValue {
        token: token.to_string(),
    })
}

fn parse_columns(value: &str) -> Vec<String> {
    let value = value.strip_prefix('(').unwrap_or(value);
    let value = value.strip_suffix(')').unwrap_or(value);
    value.split_whitespace().map(str::to_string).collect()
}
