// Store capabilities
//
// The aggregation engine and the CRUD layer only see these traits, so the
// same code runs against SQLite in production and an in-memory fake in tests.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::clock::MonthWindow;
use crate::entities::{
    Budget, NewTransaction, Transaction, TransactionKind, TransactionUpdate, User,
};
use crate::error::Result;

/// Sum of amounts for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
}

impl CategoryTotal {
    pub fn new(category: impl Into<String>, total: Decimal) -> Self {
        CategoryTotal {
            category: category.into(),
            total,
        }
    }
}

/// Read access to the transactions table.
pub trait RecordStore {
    /// Per-category sums for `kind` inside `window`, ordered by category name.
    /// Categories with no matching rows are absent.
    fn category_totals(
        &self,
        user_id: i64,
        kind: TransactionKind,
        window: &MonthWindow,
    ) -> Result<Vec<CategoryTotal>>;

    /// Sum for a single category (exact, case-sensitive match); zero when nothing matches.
    fn category_total(
        &self,
        user_id: i64,
        kind: TransactionKind,
        category: &str,
        window: &MonthWindow,
    ) -> Result<Decimal> {
        Ok(self
            .category_totals(user_id, kind, window)?
            .into_iter()
            .find(|t| t.category == category)
            .map(|t| t.total)
            .unwrap_or(Decimal::ZERO))
    }

    /// All of a user's transactions, newest date first.
    fn transactions_for_user(&self, user_id: i64) -> Result<Vec<Transaction>>;
}

/// Write access to the transactions table (owned by the CRUD layer).
pub trait RecordWriter {
    fn insert_transaction(&self, new: &NewTransaction) -> Result<i64>;

    /// `NotFound` unless a row matches both `id` and `user_id`.
    fn update_transaction(&self, id: i64, user_id: i64, update: &TransactionUpdate) -> Result<()>;

    /// `NotFound` unless a row matches both `id` and `user_id`.
    fn delete_transaction(&self, id: i64, user_id: i64) -> Result<()>;
}

pub trait BudgetStore {
    fn budget_limit(&self, user_id: i64, category: &str) -> Result<Option<Decimal>>;

    /// Every budget of the user, ordered by category name.
    fn budgets_for_user(&self, user_id: i64) -> Result<Vec<Budget>>;

    /// Insert, or replace the limit of the existing (user, category) budget.
    fn upsert_budget(&self, budget: &Budget) -> Result<()>;
}

pub trait UserStore {
    /// `Conflict` when the username is taken.
    fn insert_user(&self, username: &str, password_hash: &str) -> Result<User>;

    fn find_user_by_name(&self, username: &str) -> Result<Option<User>>;
}
