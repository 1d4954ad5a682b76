//! The closed set of filterable and sortable task fields.

use crate::error::{QueryError, Result};
use sea_query::Iden;

/// A query key that maps to a known task column.
///
/// Anything that does not map here is rejected; raw keys never reach the
/// statement text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Status,
    Priority,
    Assignee,
    Label,
    Due,
    Start,
    Created,
    Updated,
    Title,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Id,
        Field::Status,
        Field::Priority,
        Field::Assignee,
        Field::Label,
        Field::Due,
        Field::Start,
        Field::Created,
        Field::Updated,
        Field::Title,
    ];

    /// Looks up a query key. `due_date` and `start_date` are accepted
    /// aliases of `due` and `start`.
    pub fn from_key(key: &str) -> Option<Field> {
        match key {
            "id" => Some(Field::Id),
            "status" => Some(Field::Status),
            "priority" => Some(Field::Priority),
            "assignee" => Some(Field::Assignee),
            "label" => Some(Field::Label),
            "due" | "due_date" => Some(Field::Due),
            "start" | "start_date" => Some(Field::Start),
            "created" => Some(Field::Created),
            "updated" => Some(Field::Updated),
            "title" => Some(Field::Title),
            _ => None,
        }
    }

    pub fn resolve(key: &str) -> Result<Field> {
        Field::from_key(key).ok_or_else(|| {
            tracing::warn!(field = key, "rejected field outside the allow-list");
            QueryError::UnknownField {
                field: key.to_string(),
            }
        })
    }

    pub fn key(&self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Status => "status",
            Field::Priority => "priority",
            Field::Assignee => "assignee",
            Field::Label => "label",
            Field::Due => "due",
            Field::Start => "start",
            Field::Created => "created",
            Field::Updated => "updated",
            Field::Title => "title",
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Status => "status",
            Field::Priority => "priority",
            Field::Assignee => "assignees",
            Field::Label => "labels",
            Field::Due => "due_date",
            Field::Start => "start_date",
            Field::Created => "created_at",
            Field::Updated => "updated_at",
            Field::Title => "title",
        }
    }

    /// Array-valued columns use overlap instead of equality for `in`.
    pub fn is_array(&self) -> bool {
        matches!(self, Field::Assignee | Field::Label)
    }
}

impl Iden for Field {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(s, "{}", self.column()).unwrap();
    }
}
