//! SQL compiler that turns a [`ParsedQuery`] into a parameterized Postgres
//! statement using sea-query.
//!
//! Every user-supplied value becomes a positional argument; column names
//! come only from the [`Field`] allow-list and the compiler config.
//!
//! Argument order is fixed: scope id, one per filter in filter order, then
//! the limit when it is positive.

use crate::ast::{Filter, FilterValue, Operator, ParsedQuery, SortOption};
use crate::config::CompilerConfig;
use crate::error::{QueryError, Result};
use crate::fields::Field;
use crate::ordering::OrderingRules;
use sea_query::extension::postgres::{PgBinOper, PgFunc};
use sea_query::{
    Alias, ArrayType, Asterisk, Expr, Order, PostgresQueryBuilder, Query, SelectStatement,
    SimpleExpr, Value,
};
use serde::Serialize;
use tracing::{debug, instrument};

/// A value bound to one `$n` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryArg {
    Text(String),
    TextArray(Vec<String>),
    Int(i64),
}

impl From<&str> for QueryArg {
    fn from(s: &str) -> Self {
        QueryArg::Text(s.to_string())
    }
}

impl From<i64> for QueryArg {
    fn from(n: i64) -> Self {
        QueryArg::Int(n)
    }
}

impl From<Vec<&str>> for QueryArg {
    fn from(values: Vec<&str>) -> Self {
        QueryArg::TextArray(values.into_iter().map(str::to_string).collect())
    }
}

/// Statement text plus its positional arguments, `args[i]` binds `$i+1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    pub sql: String,
    pub args: Vec<QueryArg>,
}

/// SQL compiler for saved-view queries.
#[derive(Debug, Default)]
pub struct SqlCompiler {
    config: CompilerConfig,
    ordering: OrderingRules,
}

impl SqlCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: CompilerConfig) -> Self {
        Self {
            config,
            ordering: OrderingRules::default(),
        }
    }

    pub fn with_ordering(mut self, ordering: OrderingRules) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compiles `query` restricted to `scope_id`.
    ///
    /// All or nothing: the first bad filter or sort field aborts compilation.
    #[instrument(level = "debug", skip(self, query), fields(filters = query.filters.len()))]
    pub fn compile(&self, scope_id: &str, query: &ParsedQuery) -> Result<CompiledQuery> {
        let mut select = Query::select();
        select
            .column(Asterisk)
            .from(Alias::new(self.config.table.as_str()))
            .and_where(Expr::col(Alias::new(self.config.scope_column.as_str())).eq(scope_id))
            .and_where(Expr::col(Alias::new(self.config.archived_column.as_str())).is_null());

        for filter in &query.filters {
            select.and_where(self.compile_filter(filter)?);
        }

        self.apply_ordering(&mut select, query.sort.as_ref())?;

        if query.limit > 0 {
            select.limit(query.limit as u64);
        }

        let (sql, values) = select.build(PostgresQueryBuilder);
        let args = values
            .0
            .into_iter()
            .map(value_to_arg)
            .collect::<Result<Vec<_>>>()?;

        debug!(sql = %sql, args = args.len(), "compiled query");
        Ok(CompiledQuery { sql, args })
    }

    /// Compiles one filter into a predicate that binds exactly one argument.
    fn compile_filter(&self, filter: &Filter) -> Result<SimpleExpr> {
        let field = Field::resolve(&filter.key)?;
        let col = Expr::col(field);

        match (filter.operator, &filter.value) {
            (Operator::In, FilterValue::List(values)) => {
                let array = text_array(values);
                if field.is_array() {
                    let overlap = col.binary(PgBinOper::Overlap, array);
                    Ok(if filter.negate { overlap.not() } else { overlap })
                } else if filter.negate {
                    Ok(col.ne(PgFunc::all(array)))
                } else {
                    Ok(col.eq(PgFunc::any(array)))
                }
            }
            (Operator::In, _) | (_, FilterValue::List(_)) => Err(invalid_operand(filter)),
            (op, FilterValue::Scalar(value)) => {
                let op = if filter.negate {
                    op.complement().ok_or_else(|| invalid_operand(filter))?
                } else {
                    op
                };
                compile_comparison(col, op, value.as_str()).ok_or_else(|| invalid_operand(filter))
            }
        }
    }

    fn apply_ordering(&self, select: &mut SelectStatement, sort: Option<&SortOption>) -> Result<()> {
        match sort {
            Some(sort) => {
                let field = Field::resolve(&sort.field)?;
                select.order_by(field, self.ordering.sql_order(field, sort.order));
            }
            None => {
                select.order_by(
                    Alias::new(self.config.default_sort_column.as_str()),
                    Order::Desc,
                );
            }
        }
        Ok(())
    }
}

/// Scalar comparison; `None` for `in`, which has no scalar form.
fn compile_comparison(col: Expr, op: Operator, value: &str) -> Option<SimpleExpr> {
    let expr = match op {
        Operator::Eq => col.eq(value),
        Operator::NotEq => col.ne(value),
        Operator::Lt => col.lt(value),
        Operator::Gt => col.gt(value),
        Operator::Lte => col.lte(value),
        Operator::Gte => col.gte(value),
        Operator::In => return None,
    };
    Some(expr)
}

fn invalid_operand(filter: &Filter) -> QueryError {
    QueryError::InvalidOperandType {
        key: filter.key.clone(),
        operator: filter.operator.to_string(),
    }
}

fn text_array(values: &[String]) -> Value {
    let items: Vec<Value> = values.iter().cloned().map(Value::from).collect();
    Value::Array(ArrayType::String, Some(Box::new(items)))
}

/// Converts a bound sea-query value back into our argument type.
///
/// The compiler only ever binds text, text arrays, and the limit.
fn value_to_arg(value: Value) -> Result<QueryArg> {
    match value {
        Value::String(Some(s)) => Ok(QueryArg::Text(*s)),
        Value::BigInt(Some(n)) => Ok(QueryArg::Int(n)),
        Value::BigUnsigned(Some(n)) => i64::try_from(n)
            .map(QueryArg::Int)
            .map_err(|_| unsupported_value(&Value::BigUnsigned(Some(n)))),
        Value::Array(ArrayType::String, Some(items)) => (*items)
            .into_iter()
            .map(|item| match item {
                Value::String(Some(s)) => Ok(*s),
                other => Err(unsupported_value(&other)),
            })
            .collect::<Result<Vec<_>>>()
            .map(QueryArg::TextArray),
        other => Err(unsupported_value(&other)),
    }
}

fn unsupported_value(value: &Value) -> QueryError {
    QueryError::UnsupportedValue {
        value: format!("{:?}", value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{GroupOption, SortOrder};

    const SCOPE: &str = "project-1";

    fn create_test_compiler() -> SqlCompiler {
        SqlCompiler::new()
    }

    fn scalar(key: &str, op: Operator, value: &str) -> Filter {
        Filter {
            key: key.to_string(),
            operator: op,
            value: FilterValue::Scalar(value.to_string()),
            negate: false,
        }
    }

    fn negated(mut filter: Filter) -> Filter {
        filter.negate = true;
        filter
    }

    fn list(key: &str, values: &[&str]) -> Filter {
        Filter {
            key: key.to_string(),
            operator: Operator::In,
            value: FilterValue::List(values.iter().map(|v| v.to_string()).collect()),
            negate: false,
        }
    }

    fn query(filters: Vec<Filter>) -> ParsedQuery {
        ParsedQuery {
            filters,
            ..Default::default()
        }
    }

    fn compile(q: &ParsedQuery) -> CompiledQuery {
        create_test_compiler().compile(SCOPE, q).unwrap()
    }

    #[test]
    fn test_simple_filter_compilation() {
        let result = compile(&query(vec![scalar("status", Operator::Eq, "open")]));

        assert_eq!(result.args, vec![QueryArg::from(SCOPE), QueryArg::from("open")]);
        assert!(result.sql.starts_with("SELECT * FROM \"tasks\""));
        assert!(result.sql.contains("\"project_id\" = $1"));
        assert!(result.sql.contains("\"archived_at\" IS NULL"));
        assert!(result.sql.contains("\"status\" = $2"));
        assert!(result.sql.contains("ORDER BY \"created_at\" DESC"));
        assert!(!result.sql.contains("LIMIT"));
    }

    #[test]
    fn test_empty_query() {
        let result = compile(&ParsedQuery::default());
        assert_eq!(result.args, vec![QueryArg::from(SCOPE)]);
        assert_eq!(
            result.sql,
            r#"SELECT * FROM "tasks" WHERE "project_id" = $1 AND "archived_at" IS NULL ORDER BY "created_at" DESC"#
        );
    }

    #[test]
    fn test_negated_equality() {
        let result = compile(&query(vec![negated(scalar("status", Operator::Eq, "done"))]));
        assert!(result.sql.contains("\"status\" <> $2"));
        assert_eq!(result.args[1], QueryArg::from("done"));

        let result = compile(&query(vec![negated(scalar("status", Operator::NotEq, "done"))]));
        assert!(result.sql.contains("\"status\" = $2"));
    }

    #[test]
    fn test_comparisons_and_their_negations() {
        let cases = [
            (Operator::Lt, "<", ">="),
            (Operator::Gt, ">", "<="),
            (Operator::Lte, "<=", ">"),
            (Operator::Gte, ">=", "<"),
        ];
        for (op, plain, flipped) in cases {
            let result = compile(&query(vec![scalar("due", op, "2024-01-01")]));
            assert!(
                result.sql.contains(&format!("\"due_date\" {} $2", plain)),
                "{}",
                result.sql
            );

            let result = compile(&query(vec![negated(scalar("due", op, "2024-01-01"))]));
            assert!(
                result.sql.contains(&format!("\"due_date\" {} $2", flipped)),
                "{}",
                result.sql
            );
            assert_eq!(result.args.len(), 2);
        }
    }

    #[test]
    fn test_in_on_array_field_uses_overlap() {
        let result = compile(&query(vec![list("assignee", &["alice", "bob"])]));
        assert!(result.sql.contains("\"assignees\" && $2"), "{}", result.sql);
        assert_eq!(result.args[1], QueryArg::from(vec!["alice", "bob"]));

        let result = compile(&query(vec![negated(list("label", &["bug"]))]));
        assert!(result.sql.contains("NOT"), "{}", result.sql);
        assert!(result.sql.contains("\"labels\" && $2"), "{}", result.sql);
        assert_eq!(result.args.len(), 2);
    }

    #[test]
    fn test_in_on_scalar_field_uses_any() {
        let result = compile(&query(vec![list("status", &["open", "in_progress"])]));
        assert!(result.sql.contains("\"status\" = ANY($2)"), "{}", result.sql);
        assert_eq!(result.args[1], QueryArg::from(vec!["open", "in_progress"]));

        let result = compile(&query(vec![negated(list("status", &["done"]))]));
        assert!(result.sql.contains("\"status\" <> ALL($2)"), "{}", result.sql);
    }

    #[test]
    fn test_one_argument_per_filter() {
        let q = ParsedQuery {
            filters: vec![
                scalar("status", Operator::Eq, "open"),
                list("priority", &["P0", "P1"]),
                negated(scalar("assignee", Operator::Eq, "bob")),
                scalar("due", Operator::Lt, "2024-01-17"),
                negated(list("label", &["wontfix"])),
            ],
            limit: 5,
            ..Default::default()
        };
        let result = compile(&q);
        assert_eq!(
            result.args,
            vec![
                QueryArg::from(SCOPE),
                QueryArg::from("open"),
                QueryArg::from(vec!["P0", "P1"]),
                QueryArg::from("bob"),
                QueryArg::from("2024-01-17"),
                QueryArg::from(vec!["wontfix"]),
                QueryArg::Int(5),
            ]
        );
        assert!(result.sql.contains("LIMIT $7"), "{}", result.sql);
    }

    #[test]
    fn test_duplicate_keys_all_applied() {
        let result = compile(&query(vec![
            scalar("label", Operator::Eq, "bug"),
            scalar("label", Operator::Eq, "ui"),
        ]));
        assert!(result.sql.contains("$2"));
        assert!(result.sql.contains("$3"));
        assert_eq!(result.args.len(), 3);
    }

    #[test]
    fn test_limit_handling() {
        let mut q = query(vec![scalar("status", Operator::Eq, "open")]);
        q.limit = 10;
        let result = compile(&q);
        assert_eq!(result.args.len(), 3);
        assert_eq!(result.args.last(), Some(&QueryArg::Int(10)));
        assert!(result.sql.ends_with("LIMIT $3"), "{}", result.sql);

        q.limit = 0;
        let result = compile(&q);
        assert_eq!(result.args.len(), 2);
        assert!(!result.sql.contains("LIMIT"));

        q.limit = -5;
        let result = compile(&q);
        assert_eq!(result.args.len(), 2);
        assert!(!result.sql.contains("LIMIT"));
    }

    #[test]
    fn test_priority_sort_is_inverted() {
        let mut q = query(vec![]);
        q.sort = Some(SortOption {
            field: "priority".to_string(),
            order: SortOrder::Desc,
        });
        assert!(compile(&q).sql.contains("ORDER BY \"priority\" ASC"));

        q.sort = Some(SortOption {
            field: "priority".to_string(),
            order: SortOrder::Asc,
        });
        assert!(compile(&q).sql.contains("ORDER BY \"priority\" DESC"));
    }

    #[test]
    fn test_other_sorts_are_literal() {
        let mut q = query(vec![]);
        q.sort = Some(SortOption {
            field: "due".to_string(),
            order: SortOrder::Desc,
        });
        assert!(compile(&q).sql.contains("ORDER BY \"due_date\" DESC"));

        q.sort = Some(SortOption {
            field: "updated".to_string(),
            order: SortOrder::Asc,
        });
        let sql = compile(&q).sql;
        assert!(sql.contains("ORDER BY \"updated_at\" ASC"));
        assert!(!sql.contains("created_at"));
    }

    #[test]
    fn test_group_is_not_compiled() {
        let mut q = query(vec![]);
        q.group = Some(GroupOption {
            field: "whatever".to_string(),
        });
        assert!(!compile(&q).sql.contains("GROUP BY"));
    }

    #[test]
    fn test_unknown_filter_key_rejected() {
        let q = query(vec![
            scalar("status", Operator::Eq, "open"),
            scalar("title = '' OR 1=1 --", Operator::Eq, "x"),
        ]);
        assert_eq!(
            create_test_compiler().compile(SCOPE, &q),
            Err(QueryError::UnknownField {
                field: "title = '' OR 1=1 --".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_sort_field_rejected() {
        let mut q = query(vec![]);
        q.sort = Some(SortOption {
            field: "random()".to_string(),
            order: SortOrder::Asc,
        });
        assert!(matches!(
            create_test_compiler().compile(SCOPE, &q),
            Err(QueryError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_operand_shape_mismatch() {
        let bad_in = Filter {
            key: "status".to_string(),
            operator: Operator::In,
            value: FilterValue::Scalar("open".to_string()),
            negate: false,
        };
        assert_eq!(
            create_test_compiler().compile(SCOPE, &query(vec![bad_in])),
            Err(QueryError::InvalidOperandType {
                key: "status".to_string(),
                operator: "in".to_string()
            })
        );

        let bad_eq = Filter {
            key: "status".to_string(),
            operator: Operator::Eq,
            value: FilterValue::List(vec!["open".to_string()]),
            negate: false,
        };
        assert!(matches!(
            create_test_compiler().compile(SCOPE, &query(vec![bad_eq])),
            Err(QueryError::InvalidOperandType { .. })
        ));
    }

    #[test]
    fn test_values_never_inlined() {
        let result = compile(&query(vec![scalar("title", Operator::Eq, "'; DROP TABLE tasks; --")]));
        assert!(!result.sql.contains("DROP"));
        assert_eq!(result.args[1], QueryArg::from("'; DROP TABLE tasks; --"));
    }

    #[test]
    fn test_configured_identifiers() {
        let compiler = SqlCompiler::from_config(CompilerConfig {
            table: "issues".to_string(),
            scope_column: "workspace_id".to_string(),
            archived_column: "deleted_at".to_string(),
            default_sort_column: "inserted_at".to_string(),
            default_limit: 100,
        });
        let result = compiler.compile("ws", &ParsedQuery::default()).unwrap();
        assert_eq!(
            result.sql,
            r#"SELECT * FROM "issues" WHERE "workspace_id" = $1 AND "deleted_at" IS NULL ORDER BY "inserted_at" DESC"#
        );
    }

    #[test]
    fn test_custom_ordering_rules() {
        let mut rules = OrderingRules::empty();
        rules.register(Field::Status, crate::ordering::InvertedRank);
        let compiler = SqlCompiler::new().with_ordering(rules);

        let mut q = query(vec![]);
        q.sort = Some(SortOption {
            field: "priority".to_string(),
            order: SortOrder::Desc,
        });
        assert!(compiler.compile(SCOPE, &q).unwrap().sql.contains("\"priority\" DESC"));

        q.sort = Some(SortOption {
            field: "status".to_string(),
            order: SortOrder::Desc,
        });
        assert!(compiler.compile(SCOPE, &q).unwrap().sql.contains("\"status\" ASC"));
    }
}
