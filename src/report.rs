// 🧾 Report Formatter - text rendering of ledger and engine output
//
// Pure functions: every renderer returns a String and never touches a store.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::fmt::Write;

use crate::aggregation::{BudgetStatus, MonthlySummary};
use crate::entities::Transaction;
use crate::money::format_money;

pub const BAR_LENGTH: usize = 10;

const RULE_WIDTH: usize = 65;

// ============================================================================
// TRANSACTIONS
// ============================================================================

pub fn transaction_table(transactions: &[Transaction]) -> String {
    if transactions.is_empty() {
        return "No transactions found.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<5}{:<12}{:<10}{:<15}{:>12}  {}",
        "ID", "Date", "Type", "Category", "Amount", "Description"
    );
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
    for tx in transactions {
        let _ = writeln!(
            out,
            "{:<5}{:<12}{:<10}{:<15}{:>12}  {}",
            tx.id,
            tx.date.format("%Y-%m-%d").to_string(),
            tx.kind.as_str(),
            tx.category,
            format_money(tx.amount),
            tx.description.as_deref().unwrap_or("")
        );
    }
    out
}

// ============================================================================
// MONTHLY SUMMARY
// ============================================================================

pub fn monthly_summary(summary: &MonthlySummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "--- Monthly Summary for {}-{:02} ---",
        summary.year, summary.month
    );
    let _ = writeln!(out, "Total Income:   {:>14}", format_money(summary.income_total));
    let _ = writeln!(out, "Total Expenses: {:>14}", format_money(summary.expense_total));
    let _ = writeln!(out, "{}", "-".repeat(30));
    let _ = writeln!(out, "Net Savings:    {:>14}", format_money(summary.savings));
    out.push('\n');

    if summary.has_expenses() {
        let _ = writeln!(out, "--- Expense Breakdown by Category ---");
        for entry in &summary.expense_breakdown {
            let _ = writeln!(out, "{:<20} {:>14}", entry.category, format_money(entry.total));
        }
    } else {
        let _ = writeln!(out, "No expenses to break down for this month.");
    }
    out
}

// ============================================================================
// BUDGETS
// ============================================================================

/// Fraction of the budget used, clamped to [0, 1].
///
/// A zero or negative limit has no meaningful ratio: any spending fills
/// the bar, no spending leaves it empty.
pub fn budget_fill(status: &BudgetStatus) -> f64 {
    match status.utilization() {
        Some(ratio) => ratio.to_f64().unwrap_or(1.0).clamp(0.0, 1.0),
        None if status.spent > Decimal::ZERO => 1.0,
        None => 0.0,
    }
}

pub fn progress_bar(status: &BudgetStatus) -> String {
    let filled = (budget_fill(status) * BAR_LENGTH as f64).floor() as usize;
    let filled = filled.min(BAR_LENGTH);
    format!("[{}{}]", "█".repeat(filled), "-".repeat(BAR_LENGTH - filled))
}

pub fn budget_table(statuses: &[BudgetStatus]) -> String {
    if statuses.is_empty() {
        return "You have not set any budgets yet.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "--- Your Budget Status for this Month ---");
    let _ = writeln!(
        out,
        "{:<20} {:>12} / {:<12} {:>12}",
        "Category", "Spent", "Budget", "Remaining"
    );
    let _ = writeln!(out, "{}", "-".repeat(62));
    for status in statuses {
        let _ = writeln!(
            out,
            "{:<20} {:>12} / {:<12} {:>12}  {}",
            status.category,
            format_money(status.spent),
            format_money(status.limit),
            format_money(status.remaining),
            progress_bar(status)
        );
    }
    out
}

pub fn overage_alert(category: &str, amount_over: Decimal) -> String {
    format!(
        "⚠️  Warning: You have exceeded your budget for '{}' by {} this month.",
        category,
        format_money(amount_over)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::TransactionKind;
    use crate::store::CategoryTotal;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn status(limit: Decimal, spent: Decimal) -> BudgetStatus {
        BudgetStatus::new("A", limit, spent).unwrap()
    }

    #[test]
    fn test_progress_bar_fill() {
        assert_eq!(progress_bar(&status(dec!(100), dec!(0))), "[----------]");
        assert_eq!(progress_bar(&status(dec!(100), dec!(45))), "[████------]");
        assert_eq!(progress_bar(&status(dec!(100), dec!(100))), "[██████████]");
        assert_eq!(progress_bar(&status(dec!(60), dec!(80))), "[██████████]");
        assert_eq!(progress_bar(&status(dec!(100), dec!(-30))), "[----------]");
    }

    #[test]
    fn test_progress_bar_zero_limit_does_not_divide() {
        assert_eq!(progress_bar(&status(dec!(0), dec!(5))), "[██████████]");
        assert_eq!(progress_bar(&status(dec!(0), dec!(0))), "[----------]");
        assert_eq!(budget_fill(&status(dec!(-10), dec!(0))), 0.0);
    }

    #[test]
    fn test_budget_table_rows() {
        let food = BudgetStatus::new("Food", dec!(60), dec!(80)).unwrap();
        let table = budget_table(&[food]);
        assert!(table.contains("Food"));
        assert!(table.contains("$80.00"));
        assert!(table.contains("-$20.00"));
        assert!(budget_table(&[]).contains("not set any budgets"));
    }

    #[test]
    fn test_monthly_summary_text() {
        let summary = MonthlySummary {
            year: 2025,
            month: 6,
            income_total: dec!(1000),
            expense_total: dec!(80),
            savings: dec!(920),
            expense_breakdown: vec![CategoryTotal::new("Food", dec!(80))],
        };
        let text = monthly_summary(&summary);
        assert!(text.starts_with("--- Monthly Summary for 2025-06 ---"));
        assert!(text.contains("$1,000.00"));
        assert!(text.contains("$920.00"));
        assert!(text.contains("Food"));

        let empty = MonthlySummary {
            expense_breakdown: Vec::new(),
            expense_total: dec!(0),
            savings: dec!(1000),
            ..summary
        };
        assert!(monthly_summary(&empty).contains("No expenses to break down for this month."));
    }

    #[test]
    fn test_transaction_table() {
        let tx = Transaction {
            id: 7,
            user_id: 1,
            kind: TransactionKind::Expense,
            category: "Food".to_string(),
            amount: dec!(12.5),
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            description: Some("lunch".to_string()),
        };
        let table = transaction_table(&[tx]);
        let row = table.lines().nth(2).unwrap();
        assert!(row.starts_with("7    2025-06-01  expense   Food"));
        assert!(row.ends_with("$12.50  lunch"));
        assert_eq!(transaction_table(&[]), "No transactions found.\n");
    }

    #[test]
    fn test_overage_alert() {
        assert_eq!(
            overage_alert("Food", dec!(20)),
            "⚠️  Warning: You have exceeded your budget for 'Food' by $20.00 this month."
        );
    }
}
