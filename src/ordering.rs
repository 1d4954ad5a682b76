//! Per-field sort direction rules.
//!
//! Most fields sort lexically in the requested direction. Fields whose
//! values are ranks (P0 is more urgent than P4) flip it, so `desc` still
//! means "most important first".

use crate::ast::SortOrder;
use crate::fields::Field;
use sea_query::Order;
use std::collections::HashMap;
use std::fmt;

/// Maps a requested sort order to the SQL order for a field.
pub trait OrderingStrategy: fmt::Debug + Send + Sync {
    fn sql_order(&self, requested: SortOrder) -> Order;
}

/// Requested order is the SQL order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lexical;

impl OrderingStrategy for Lexical {
    fn sql_order(&self, requested: SortOrder) -> Order {
        match requested {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

/// Rank labels where the lexically smallest value ranks highest.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvertedRank;

impl OrderingStrategy for InvertedRank {
    fn sql_order(&self, requested: SortOrder) -> Order {
        match requested {
            SortOrder::Asc => Order::Desc,
            SortOrder::Desc => Order::Asc,
        }
    }
}

/// Strategy registry; unregistered fields fall back to [`Lexical`].
#[derive(Debug)]
pub struct OrderingRules {
    rules: HashMap<Field, Box<dyn OrderingStrategy>>,
}

impl OrderingRules {
    /// Registry with no special fields.
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    pub fn register(&mut self, field: Field, strategy: impl OrderingStrategy + 'static) {
        self.rules.insert(field, Box::new(strategy));
    }

    pub fn strategy_for(&self, field: Field) -> &dyn OrderingStrategy {
        self.rules
            .get(&field)
            .map(|s| s.as_ref())
            .unwrap_or(&Lexical)
    }

    pub fn sql_order(&self, field: Field, requested: SortOrder) -> Order {
        self.strategy_for(field).sql_order(requested)
    }
}

impl Default for OrderingRules {
    /// `priority` ranks P0..P4 with P0 most urgent.
    fn default() -> Self {
        let mut rules = Self::empty();
        rules.register(Field::Priority, InvertedRank);
        rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_asc(order: Order) -> bool {
        matches!(order, Order::Asc)
    }

    #[test]
    fn test_priority_is_inverted() {
        let rules = OrderingRules::default();
        assert!(is_asc(rules.sql_order(Field::Priority, SortOrder::Desc)));
        assert!(!is_asc(rules.sql_order(Field::Priority, SortOrder::Asc)));
    }

    #[test]
    fn test_other_fields_are_literal() {
        let rules = OrderingRules::default();
        for field in Field::ALL.into_iter().filter(|f| *f != Field::Priority) {
            assert!(is_asc(rules.sql_order(field, SortOrder::Asc)));
            assert!(!is_asc(rules.sql_order(field, SortOrder::Desc)));
        }
    }

    #[test]
    fn test_register_custom_rank_field() {
        let mut rules = OrderingRules::empty();
        assert!(is_asc(rules.sql_order(Field::Priority, SortOrder::Asc)));
        rules.register(Field::Status, InvertedRank);
        assert!(is_asc(rules.sql_order(Field::Status, SortOrder::Desc)));
    }
}
