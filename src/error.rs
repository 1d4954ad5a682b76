//! Error types for query parsing and compilation.

use thiserror::Error;

/// Everything that can go wrong between raw query text and a compiled statement.
///
/// Most variants describe invalid user input and should surface to clients
/// as validation failures; see [`QueryError::is_client_error`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Token does not have a `key:value` shape
    #[error("invalid filter '{token}': expected key:value")]
    InvalidFilterFormat { token: String },

    /// `limit:` followed by something that is not an integer
    #[error("invalid limit value in '{token}'")]
    InvalidLimitValue { token: String },

    /// Operator text the compiler does not know
    #[error("unsupported operator: {operator}")]
    UnsupportedOperator { operator: String },

    /// Operator and value shape disagree, e.g. `in` with a scalar
    #[error("invalid operand type for '{operator}' on field '{key}'")]
    InvalidOperandType { key: String, operator: String },

    /// Key or sort field outside the column allow-list
    #[error("unknown field: {field}")]
    UnknownField { field: String },

    /// Statement argument of a type the compiler never binds
    #[error("unsupported statement argument: {value}")]
    UnsupportedValue { value: String },

    /// Relative date expression not recognized.
    ///
    /// The filter parser swallows this and keeps the value as a literal.
    #[error("unknown relative date: {expr}")]
    UnknownRelativeDate { expr: String },
}

impl QueryError {
    /// Whether the error is caused by the query text and not by the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            QueryError::UnknownRelativeDate { .. } | QueryError::UnsupportedValue { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;
