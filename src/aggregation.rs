// 📊 Aggregation Engine - monthly summaries and budget vs actual
//
// Everything here is derived on demand from the stores: nothing is cached
// and nothing is written. Calling twice with no writes in between gives
// the same answer.
//
//   savings   = income_total - expense_total
//   remaining = limit - spent            (may go negative)
//   over      = spent > limit
//
// Sums and differences go through checked arithmetic and fail with
// `FinanceError::Overflow` instead of panicking.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::clock::{Clock, MonthWindow};
use crate::entities::TransactionKind;
use crate::error::Result;
use crate::money;
use crate::store::{BudgetStore, CategoryTotal, RecordStore};

// ============================================================================
// MONTHLY SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    pub income_total: Decimal,
    pub expense_total: Decimal,
    pub savings: Decimal,

    /// Expense totals per category, largest first; ties by category name
    pub expense_breakdown: Vec<CategoryTotal>,
}

impl MonthlySummary {
    pub fn has_expenses(&self) -> bool {
        !self.expense_breakdown.is_empty()
    }
}

// ============================================================================
// BUDGET STATUS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetStatus {
    pub category: String,
    pub limit: Decimal,

    /// Expense total for the category in the current calendar month
    pub spent: Decimal,

    /// limit - spent, not clamped
    pub remaining: Decimal,
}

impl BudgetStatus {
    pub fn new(category: impl Into<String>, limit: Decimal, spent: Decimal) -> Result<Self> {
        Ok(BudgetStatus {
            category: category.into(),
            limit,
            spent,
            remaining: money::checked_sub(limit, spent)?,
        })
    }

    pub fn is_over(&self) -> bool {
        self.spent > self.limit
    }

    /// spent / limit, or `None` when the limit is zero or negative
    /// (or the ratio does not fit in a Decimal)
    pub fn utilization(&self) -> Option<Decimal> {
        if self.limit <= Decimal::ZERO {
            None
        } else {
            self.spent.checked_div(self.limit)
        }
    }
}

/// Outcome of checking one category against its budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BudgetCheck {
    pub is_over_budget: bool,

    /// spent - limit when over, zero otherwise
    pub amount_over: Decimal,
}

impl BudgetCheck {
    /// No budget configured, or not over it
    pub fn within() -> Self {
        BudgetCheck {
            is_over_budget: false,
            amount_over: Decimal::ZERO,
        }
    }

    pub fn compare(spent: Decimal, limit: Decimal) -> Result<Self> {
        if spent > limit {
            Ok(BudgetCheck {
                is_over_budget: true,
                amount_over: money::checked_sub(spent, limit)?,
            })
        } else {
            Ok(Self::within())
        }
    }
}

// ============================================================================
// AGGREGATION ENGINE
// ============================================================================

pub struct AggregationEngine<'a, S: ?Sized, C: ?Sized> {
    store: &'a S,
    clock: &'a C,
}

impl<'a, S, C> AggregationEngine<'a, S, C>
where
    S: RecordStore + BudgetStore + ?Sized,
    C: Clock + ?Sized,
{
    pub fn new(store: &'a S, clock: &'a C) -> Self {
        AggregationEngine { store, clock }
    }

    /// Month the clock is currently in
    pub fn current_month(&self) -> MonthWindow {
        MonthWindow::containing(self.clock.today())
    }

    /// Income, expenses, savings and per-category expense breakdown for one month.
    ///
    /// Months with no transactions produce zero totals and an empty breakdown.
    /// Fails with `Validation` when `month` is outside 1..=12.
    pub fn compute_monthly_summary(
        &self,
        user_id: i64,
        year: i32,
        month: u32,
    ) -> Result<MonthlySummary> {
        let window = MonthWindow::new(year, month)?;
        self.summary_for(user_id, &window)
    }

    pub fn summary_for(&self, user_id: i64, window: &MonthWindow) -> Result<MonthlySummary> {
        let income = self
            .store
            .category_totals(user_id, TransactionKind::Income, window)?;
        let mut expenses = self
            .store
            .category_totals(user_id, TransactionKind::Expense, window)?;

        let income_total = money::checked_sum(income.iter().map(|t| t.total))?;
        let expense_total = money::checked_sum(expenses.iter().map(|t| t.total))?;
        let savings = money::checked_sub(income_total, expense_total)?;

        expenses.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| a.category.cmp(&b.category))
        });

        debug!(
            user_id,
            month = %window,
            %income_total,
            %expense_total,
            categories = expenses.len(),
            "computed monthly summary"
        );

        Ok(MonthlySummary {
            year: window.year(),
            month: window.month(),
            income_total,
            expense_total,
            savings,
            expense_breakdown: expenses,
        })
    }

    /// Compare this month's spending in `category` with its budget.
    ///
    /// No budget configured means "no constraint": `(false, 0)`.
    pub fn check_spending_against_budget(
        &self,
        user_id: i64,
        category: &str,
    ) -> Result<BudgetCheck> {
        let limit = match self.store.budget_limit(user_id, category)? {
            Some(limit) => limit,
            None => {
                debug!(user_id, category, "no budget configured");
                return Ok(BudgetCheck::within());
            }
        };

        let window = self.current_month();
        let spent = self
            .store
            .category_total(user_id, TransactionKind::Expense, category, &window)?;

        let check = BudgetCheck::compare(spent, limit)?;
        if check.is_over_budget {
            warn!(
                user_id,
                category,
                %spent,
                %limit,
                over = %check.amount_over,
                "budget exceeded"
            );
        }
        Ok(check)
    }

    /// One status per budget, including budgets with no spending this month.
    pub fn get_budgets_with_spending(&self, user_id: i64) -> Result<Vec<BudgetStatus>> {
        let budgets = self.store.budgets_for_user(user_id)?;
        if budgets.is_empty() {
            return Ok(Vec::new());
        }

        let window = self.current_month();
        let spent_by_category: HashMap<String, Decimal> = self
            .store
            .category_totals(user_id, TransactionKind::Expense, &window)?
            .into_iter()
            .map(|t| (t.category, t.total))
            .collect();

        let statuses = budgets
            .into_iter()
            .map(|budget| {
                let spent = spent_by_category
                    .get(&budget.category)
                    .copied()
                    .unwrap_or(Decimal::ZERO);
                BudgetStatus::new(budget.category, budget.limit, spent)
            })
            .collect::<Result<Vec<BudgetStatus>>>()?;

        debug!(user_id, month = %window, budgets = statuses.len(), "computed budget statuses");
        Ok(statuses)
    }
}

// ============================================================================
// TESTS
// ============================================================================
