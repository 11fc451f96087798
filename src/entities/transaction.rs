// 💸 Transaction Entity
//
// Income or expense record owned by a single user. Amount, category and
// description may be updated later; kind, date and owner never change.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// TRANSACTION KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money coming in
    Income,

    /// Money going out; the only kind budgets are checked against
    Expense,
}

impl TransactionKind {
    /// Value stored in the `type` column
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// "Income" / "Expense", for prompts and messages
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(format!("unknown transaction type '{}'", other)),
        }
    }
}

// ============================================================================
// TRANSACTION ROWS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub kind: TransactionKind,
    pub category: String,

    /// Expected positive; not enforced (refunds/adjustments may be zero or negative)
    pub amount: Decimal,

    pub date: NaiveDate,
    pub description: Option<String>,
}

impl Transaction {
    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }
}

/// Input for inserting a transaction; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub user_id: i64,
    pub kind: TransactionKind,
    pub category: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: Option<String>,
}

/// Mutable fields of an existing transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionUpdate {
    pub amount: Decimal,
    pub category: String,
    pub description: Option<String>,
}

/// Blank descriptions are stored as NULL.
pub fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}
