//! One-call compilation of a saved view's raw query text.

use crate::ast::ParsedQuery;
use crate::config::CompilerConfig;
use crate::dates::{Clock, SystemClock};
use crate::error::Result;
use crate::parser::QueryParser;
use crate::sql_compiler::{CompiledQuery, SqlCompiler};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::debug;

/// Everything derived from a saved view's raw query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledView {
    pub parsed: ParsedQuery,
    /// Canonical form stored alongside the raw text
    pub normalized: String,
    /// Display settings (sort, group, limit, cols, view)
    pub presentation: JsonValue,
    pub compiled: CompiledQuery,
}

/// Parser and compiler sharing one config.
#[derive(Debug)]
pub struct SavedViewCompiler<C = SystemClock> {
    parser: QueryParser<C>,
    compiler: SqlCompiler,
}

impl SavedViewCompiler<SystemClock> {
    pub fn new(config: CompilerConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> SavedViewCompiler<C> {
    pub fn with_clock(config: CompilerConfig, clock: C) -> Self {
        Self {
            parser: QueryParser::from_config(&config, clock),
            compiler: SqlCompiler::from_config(config),
        }
    }

    pub fn parser(&self) -> &QueryParser<C> {
        &self.parser
    }

    pub fn compiler(&self) -> &SqlCompiler {
        &self.compiler
    }

    /// Validates a raw query without compiling it, as done when a view is saved.
    pub fn validate(&self, raw_query: &str) -> Result<ParsedQuery> {
        self.parser.parse(raw_query)
    }

    pub fn compile_view(&self, scope_id: &str, raw_query: &str) -> Result<CompiledView> {
        let parsed = self.parser.parse(raw_query)?;
        let compiled = self.compiler.compile(scope_id, &parsed)?;
        let normalized = parsed.normalized();
        debug!(scope_id, normalized = %normalized, "compiled saved view");

        Ok(CompiledView {
            presentation: parsed.presentation(),
            normalized,
            parsed,
            compiled,
        })
    }
}
