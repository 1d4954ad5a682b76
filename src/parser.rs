//! Saved-view query parser.
//!
//! ## Parsing flow
//!
//! ```text
//! parse()
//!   ├─ clock.today()                  (read once per call)
//!   └─ Tokenizer ─ for each token
//!        ├─ DisplayOption::from_token()   sort: group: limit: view: cols:
//!        │     └─ overwrite the matching ParsedQuery field
//!        └─ otherwise parse_filter()
//!              └─ append to ParsedQuery::filters
//! ```
//!
//! Filters are kept in order of appearance, duplicates included. Display
//! options of the same kind overwrite each other, last one wins. The first
//! error aborts the whole parse.
//!
//! ## Examples
//!
//! ```text
//! status:open
//! status:(open in_progress) -assignee:bob
//! due:<today priority:(P0 P1) sort:priority_desc limit:25
//! created:>=-7d group:status view:board cols:(title status due)
//! ```

use crate::ast::ParsedQuery;
use crate::config::CompilerConfig;
use crate::dates::{Clock, SystemClock};
use crate::error::Result;
use crate::filter::parse_filter;
use crate::lexer::Tokenizer;
use crate::options::DisplayOption;
use tracing::{debug, instrument, trace};

pub const DEFAULT_LIMIT: i64 = 100;

#[derive(Debug, Clone)]
pub struct QueryParser<C = SystemClock> {
    clock: C,
    default_limit: i64,
}

impl QueryParser<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for QueryParser<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> QueryParser<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            default_limit: DEFAULT_LIMIT,
        }
    }

    pub fn from_config(config: &CompilerConfig, clock: C) -> Self {
        Self {
            clock,
            default_limit: config.default_limit,
        }
    }

    pub fn with_default_limit(mut self, limit: i64) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    #[instrument(level = "debug", skip(self))]
    pub fn parse(&self, text: &str) -> Result<ParsedQuery> {
        let today = self.clock.today();
        let mut query = ParsedQuery {
            limit: self.default_limit,
            ..Default::default()
        };

        for token in Tokenizer::new(text) {
            let token = token.text.trim();
            if token.is_empty() {
                continue;
            }
            trace!(token, "token");

            if let Some(option) = DisplayOption::from_token(token) {
                match option? {
                    DisplayOption::Sort(sort) => query.sort = Some(sort),
                    DisplayOption::Group(group) => query.group = Some(group),
                    DisplayOption::Limit(limit) => query.limit = limit,
                    DisplayOption::View(view) => query.view_type = view,
                    DisplayOption::Columns(columns) => query.columns = columns,
                }
                continue;
            }

            query.filters.push(parse_filter(token, today)?);
        }

        debug!(
            filters = query.filters.len(),
            sort = ?query.sort,
            limit = query.limit,
            "parsed query"
        );
        Ok(query)
    }
}
