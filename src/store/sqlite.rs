// 🗄️ SQLite store
//
// Table layout stays compatible with existing finance.db files:
//   users(id, username UNIQUE, password_hash)
//   transactions(id, user_id, type, category, amount REAL, date TEXT, description)
//   budgets(id, user_id, category, limit_amount REAL, UNIQUE(user_id, category))
//
// A connection is opened per call and dropped on every exit path.

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{BudgetStore, CategoryTotal, RecordStore, RecordWriter, UserStore};
use crate::clock::MonthWindow;
use crate::entities::{
    Budget, NewTransaction, Transaction, TransactionKind, TransactionUpdate, User,
};
use crate::error::{FinanceError, Result};
use crate::money;

pub fn setup_database(conn: &Connection) -> Result<()> {
    // ==========================================================================
    // Users
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY,
            username TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Transactions ('income' or 'expense', ISO dates)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            type TEXT NOT NULL,
            category TEXT NOT NULL,
            amount REAL NOT NULL,
            date TEXT NOT NULL,
            description TEXT,
            FOREIGN KEY (user_id) REFERENCES users (id)
        )",
        [],
    )?;

    // ==========================================================================
    // Budgets (one per user/category)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS budgets (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            category TEXT NOT NULL,
            limit_amount REAL NOT NULL,
            UNIQUE(user_id, category),
            FOREIGN KEY (user_id) REFERENCES users (id)
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_user_date ON transactions(user_id, date)",
        [],
    )?;

    Ok(())
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Open (creating if needed) the database file and make sure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = SqliteStore {
            path: path.as_ref().to_path_buf(),
        };
        let conn = store.connect()?;
        setup_database(&conn)?;
        info!(path = %store.path.display(), "database initialized");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(conn)
    }

    fn sum_by_category(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<BTreeMap<String, Decimal>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(sql)?;

        let rows = stmt
            .query_map(params, |row| Ok((row.get::<_, String>(0)?, amount_at(row, 1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
        for (category, amount) in rows {
            let total = totals.entry(category).or_insert(Decimal::ZERO);
            *total = money::checked_add(*total, amount)?;
        }
        Ok(totals)
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

/// REAL column -> Decimal, surfacing NaN/inf and out-of-range values as a conversion failure
fn amount_at(row: &Row, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: f64 = row.get(idx)?;
    money::from_real(raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Real,
            format!("amount {} is out of range", raw).into(),
        )
    })
}

fn transaction_from_row(row: &Row) -> rusqlite::Result<Transaction> {
    let kind_str: String = row.get(2)?;
    let kind = kind_str
        .parse::<TransactionKind>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, e.into()))?;

    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind,
        category: row.get(3)?,
        amount: amount_at(row, 4)?,
        date: row.get::<_, NaiveDate>(5)?,
        description: row.get(6)?,
    })
}

// ============================================================================
// RECORD ACCESS
// ============================================================================

impl RecordStore for SqliteStore {
    fn category_totals(
        &self,
        user_id: i64,
        kind: TransactionKind,
        window: &MonthWindow,
    ) -> Result<Vec<CategoryTotal>> {
        debug!(user_id, kind = %kind, month = %window, "summing by category");

        let totals = self.sum_by_category(
            "SELECT category, amount FROM transactions
             WHERE user_id = ?1 AND type = ?2 AND date BETWEEN ?3 AND ?4",
            params![user_id, kind.as_str(), window.first(), window.last()],
        )?;

        Ok(totals
            .into_iter()
            .map(|(category, total)| CategoryTotal { category, total })
            .collect())
    }

    fn category_total(
        &self,
        user_id: i64,
        kind: TransactionKind,
        category: &str,
        window: &MonthWindow,
    ) -> Result<Decimal> {
        debug!(user_id, kind = %kind, category, month = %window, "summing one category");

        let totals = self.sum_by_category(
            "SELECT category, amount FROM transactions
             WHERE user_id = ?1 AND type = ?2 AND category = ?3 AND date BETWEEN ?4 AND ?5",
            params![user_id, kind.as_str(), category, window.first(), window.last()],
        )?;

        money::checked_sum(totals.into_values())
    }

    fn transactions_for_user(&self, user_id: i64) -> Result<Vec<Transaction>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, type, category, amount, date, description
             FROM transactions
             WHERE user_id = ?1
             ORDER BY date DESC, id DESC",
        )?;

        let transactions = stmt
            .query_map([user_id], transaction_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!(user_id, count = transactions.len(), "loaded transactions");
        Ok(transactions)
    }
}

impl RecordWriter for SqliteStore {
    fn insert_transaction(&self, new: &NewTransaction) -> Result<i64> {
        let conn = self.connect()?;
        let result = conn.execute(
            "INSERT INTO transactions (user_id, type, category, amount, date, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                new.user_id,
                new.kind.as_str(),
                new.category,
                money::to_real(new.amount)?,
                new.date,
                new.description,
            ],
        );

        match result {
            Ok(_) => {
                let id = conn.last_insert_rowid();
                info!(
                    id,
                    user_id = new.user_id,
                    kind = %new.kind,
                    category = %new.category,
                    "transaction added"
                );
                Ok(id)
            }
            Err(e) if is_constraint_violation(&e) => Err(FinanceError::not_found(format!(
                "User {} does not exist.",
                new.user_id
            ))),
            Err(e) => Err(e.into()),
        }
    }

    fn update_transaction(&self, id: i64, user_id: i64, update: &TransactionUpdate) -> Result<()> {
        let conn = self.connect()?;
        let changed = conn.execute(
            "UPDATE transactions
             SET amount = ?1, category = ?2, description = ?3
             WHERE id = ?4 AND user_id = ?5",
            params![
                money::to_real(update.amount)?,
                update.category,
                update.description,
                id,
                user_id,
            ],
        )?;

        if changed == 0 {
            return Err(not_owned(id));
        }
        info!(id, user_id, "transaction updated");
        Ok(())
    }

    fn delete_transaction(&self, id: i64, user_id: i64) -> Result<()> {
        let conn = self.connect()?;
        let changed = conn.execute(
            "DELETE FROM transactions WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;

        if changed == 0 {
            return Err(not_owned(id));
        }
        info!(id, user_id, "transaction deleted");
        Ok(())
    }
}

/// Absent and foreign rows look the same through the `id AND user_id` predicate.
fn not_owned(id: i64) -> FinanceError {
    FinanceError::not_found(format!(
        "Transaction ID {} not found or does not belong to you.",
        id
    ))
}

// ============================================================================
// BUDGET ACCESS
// ============================================================================

impl BudgetStore for SqliteStore {
    fn budget_limit(&self, user_id: i64, category: &str) -> Result<Option<Decimal>> {
        let conn = self.connect()?;
        let limit = conn
            .query_row(
                "SELECT limit_amount FROM budgets WHERE user_id = ?1 AND category = ?2",
                params![user_id, category],
                |row| amount_at(row, 0),
            )
            .optional()?;
        Ok(limit)
    }

    fn budgets_for_user(&self, user_id: i64) -> Result<Vec<Budget>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT user_id, category, limit_amount FROM budgets
             WHERE user_id = ?1
             ORDER BY category",
        )?;

        let budgets = stmt
            .query_map([user_id], |row| {
                Ok(Budget {
                    user_id: row.get(0)?,
                    category: row.get(1)?,
                    limit: amount_at(row, 2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(budgets)
    }

    fn upsert_budget(&self, budget: &Budget) -> Result<()> {
        let conn = self.connect()?;
        let result = conn.execute(
            "INSERT INTO budgets (user_id, category, limit_amount) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id, category) DO UPDATE SET limit_amount = excluded.limit_amount",
            params![budget.user_id, budget.category, money::to_real(budget.limit)?],
        );

        match result {
            Ok(_) => {
                info!(
                    user_id = budget.user_id,
                    category = %budget.category,
                    limit = %budget.limit,
                    "budget set"
                );
                Ok(())
            }
            Err(e) if is_constraint_violation(&e) => Err(FinanceError::not_found(format!(
                "User {} does not exist.",
                budget.user_id
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// USER ACCESS
// ============================================================================

impl UserStore for SqliteStore {
    fn insert_user(&self, username: &str, password_hash: &str) -> Result<User> {
        let conn = self.connect()?;
        let result = conn.execute(
            "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
            params![username, password_hash],
        );

        match result {
            Ok(_) => Ok(User {
                id: conn.last_insert_rowid(),
                username: username.to_string(),
                password_hash: password_hash.to_string(),
            }),
            Err(e) if is_constraint_violation(&e) => Err(FinanceError::Conflict(format!(
                "Username '{}' already exists.",
                username
            ))),
            Err(e) => Err(e.into()),
        }
    }

    fn find_user_by_name(&self, username: &str) -> Result<Option<User>> {
        let conn = self.connect()?;
        let user = conn
            .query_row(
                "SELECT id, username, password_hash FROM users WHERE username = ?1",
                [username],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        password_hash: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }
}
