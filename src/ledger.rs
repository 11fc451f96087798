// 📒 Ledger - CRUD over transactions and budgets
//
// Thin service between user input and the stores. Adding an expense runs
// the budget check right away so the caller can warn about overage.

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::aggregation::{AggregationEngine, BudgetCheck};
use crate::clock::Clock;
use crate::entities::transaction::normalize_description;
use crate::entities::{Budget, NewTransaction, Transaction, TransactionKind, TransactionUpdate};
use crate::error::{FinanceError, Result};
use crate::store::{BudgetStore, RecordStore, RecordWriter};

/// Result of recording a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recorded {
    pub id: i64,

    /// Present only for expenses
    pub budget_check: Option<BudgetCheck>,
}

impl Recorded {
    /// Amount over budget, when the new expense pushed the category over
    pub fn overage(&self) -> Option<Decimal> {
        self.budget_check
            .filter(|check| check.is_over_budget)
            .map(|check| check.amount_over)
    }
}

pub struct Ledger<'a, S: ?Sized, C: ?Sized> {
    store: &'a S,
    clock: &'a C,
}

impl<'a, S, C> Ledger<'a, S, C>
where
    S: RecordStore + RecordWriter + BudgetStore + ?Sized,
    C: Clock + ?Sized,
{
    pub fn new(store: &'a S, clock: &'a C) -> Self {
        Ledger { store, clock }
    }

    pub fn engine(&self) -> AggregationEngine<'a, S, C> {
        AggregationEngine::new(self.store, self.clock)
    }

    /// Record a transaction dated today.
    pub fn add_transaction(
        &self,
        user_id: i64,
        kind: TransactionKind,
        category: &str,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<Recorded> {
        let category = require_category(category)?;
        if amount <= Decimal::ZERO {
            warn!(user_id, %kind, %amount, "recording non-positive amount");
        }

        let new = NewTransaction {
            user_id,
            kind,
            category: category.to_string(),
            amount,
            date: self.clock.today(),
            description: normalize_description(description),
        };
        let id = self.store.insert_transaction(&new)?;
        info!(user_id, id, %kind, category, %amount, "transaction recorded");

        let budget_check = match kind {
            TransactionKind::Expense => Some(
                self.engine()
                    .check_spending_against_budget(user_id, category)?,
            ),
            TransactionKind::Income => None,
        };

        Ok(Recorded { id, budget_check })
    }

    /// Newest first.
    pub fn list_transactions(&self, user_id: i64) -> Result<Vec<Transaction>> {
        self.store.transactions_for_user(user_id)
    }

    pub fn update_transaction(
        &self,
        id: i64,
        user_id: i64,
        amount: Decimal,
        category: &str,
        description: Option<String>,
    ) -> Result<()> {
        let category = require_category(category)?;
        if amount <= Decimal::ZERO {
            warn!(user_id, id, %amount, "updating to non-positive amount");
        }

        let update = TransactionUpdate {
            amount,
            category: category.to_string(),
            description: normalize_description(description),
        };
        self.store.update_transaction(id, user_id, &update)?;
        info!(user_id, id, "transaction updated");
        Ok(())
    }

    pub fn delete_transaction(&self, id: i64, user_id: i64) -> Result<()> {
        self.store.delete_transaction(id, user_id)?;
        info!(user_id, id, "transaction deleted");
        Ok(())
    }

    /// Create or replace the monthly limit for a category.
    pub fn set_budget(&self, user_id: i64, category: &str, limit: Decimal) -> Result<()> {
        let category = require_category(category)?;
        if limit <= Decimal::ZERO {
            warn!(user_id, category, %limit, "budget limit is not positive");
        }

        self.store
            .upsert_budget(&Budget::new(user_id, category, limit))?;
        info!(user_id, category, %limit, "budget set");
        Ok(())
    }
}

fn require_category(category: &str) -> Result<&str> {
    let category = category.trim();
    if category.is_empty() {
        return Err(FinanceError::validation("Category cannot be empty."));
    }
    Ok(category)
}
