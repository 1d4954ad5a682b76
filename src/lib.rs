//! Saved-view query language: tokenizer, parser and parameterized SQL compiler.
//!
//! ```text
//! "status:open priority:(P0 P1) -assignee:bob due:today sort:priority_desc limit:5"
//!     │ Tokenizer
//!     │ QueryParser  (filters + display options, relative dates)
//!     ▼
//! ParsedQuery
//!     │ SqlCompiler  (allow-listed columns, $n placeholders)
//!     ▼
//! SELECT * FROM "tasks" WHERE "project_id" = $1 AND ... LIMIT $6
//! ```

pub mod ast;
pub mod config;
pub mod dates;
pub mod error;
pub mod fields;
pub mod filter;
pub mod lexer;
pub mod options;
pub mod ordering;
pub mod parser;
pub mod sql_compiler;
pub mod token;
pub mod view;

pub use ast::{Filter, FilterValue, GroupOption, Operator, ParsedQuery, SortOption, SortOrder};
pub use config::{CompilerConfig, ConfigError};
pub use dates::{Clock, FixedClock, SystemClock};
pub use error::{QueryError, Result};
pub use parser::QueryParser;
pub use sql_compiler::{CompiledQuery, QueryArg, SqlCompiler};
pub use view::{CompiledView, SavedViewCompiler};
