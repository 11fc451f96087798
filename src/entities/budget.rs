// 🎯 Budget Entity
//
// One monthly spending limit per (user, category). Setting a budget for a
// category that already has one replaces the limit.

use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Budget {
    pub user_id: i64,

    /// Matched case-sensitively against Transaction.category
    pub category: String,

    /// Compared against this calendar month's expense total only
    pub limit: Decimal,
}

impl Budget {
    pub fn new(user_id: i64, category: impl Into<String>, limit: Decimal) -> Self {
        Budget {
            user_id,
            category: category.into(),
            limit,
        }
    }
}
