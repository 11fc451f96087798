// 🧪 In-memory store
//
// Same contracts as SqliteStore (ordering, ownership predicate, upsert,
// unique usernames) without touching disk.

use rust_decimal::Decimal;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use super::{BudgetStore, CategoryTotal, RecordStore, RecordWriter, UserStore};
use crate::clock::MonthWindow;
use crate::entities::{
    Budget, NewTransaction, Transaction, TransactionKind, TransactionUpdate, User,
};
use crate::error::{FinanceError, Result};
use crate::money;

#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RefCell<Vec<User>>,
    transactions: RefCell<Vec<Transaction>>,
    budgets: RefCell<Vec<Budget>>,
    next_user_id: Cell<i64>,
    next_transaction_id: Cell<i64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-table sequences, like SQLite rowids
    fn allocate_id(counter: &Cell<i64>) -> i64 {
        let id = counter.get() + 1;
        counter.set(id);
        id
    }

    fn user_exists(&self, user_id: i64) -> bool {
        self.users.borrow().iter().any(|u| u.id == user_id)
    }
}

impl RecordStore for MemoryStore {
    fn category_totals(
        &self,
        user_id: i64,
        kind: TransactionKind,
        window: &MonthWindow,
    ) -> Result<Vec<CategoryTotal>> {
        let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();

        for tx in self.transactions.borrow().iter() {
            if tx.user_id == user_id && tx.kind == kind && window.contains(tx.date) {
                let total = totals.entry(tx.category.clone()).or_insert(Decimal::ZERO);
                *total = money::checked_add(*total, tx.amount)?;
            }
        }

        Ok(totals
            .into_iter()
            .map(|(category, total)| CategoryTotal { category, total })
            .collect())
    }

    fn transactions_for_user(&self, user_id: i64) -> Result<Vec<Transaction>> {
        let mut rows: Vec<Transaction> = self
            .transactions
            .borrow()
            .iter()
            .filter(|tx| tx.user_id == user_id)
            .cloned()
            .collect();

        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(rows)
    }
}

impl RecordWriter for MemoryStore {
    fn insert_transaction(&self, new: &NewTransaction) -> Result<i64> {
        if !self.user_exists(new.user_id) {
            return Err(FinanceError::not_found(format!(
                "User {} does not exist.",
                new.user_id
            )));
        }

        let id = Self::allocate_id(&self.next_transaction_id);
        self.transactions.borrow_mut().push(Transaction {
            id,
            user_id: new.user_id,
            kind: new.kind,
            category: new.category.clone(),
            amount: new.amount,
            date: new.date,
            description: new.description.clone(),
        });
        Ok(id)
    }

    fn update_transaction(&self, id: i64, user_id: i64, update: &TransactionUpdate) -> Result<()> {
        let mut rows = self.transactions.borrow_mut();
        let tx = rows
            .iter_mut()
            .find(|tx| tx.id == id && tx.user_id == user_id)
            .ok_or_else(|| not_owned(id))?;

        tx.amount = update.amount;
        tx.category = update.category.clone();
        tx.description = update.description.clone();
        Ok(())
    }

    fn delete_transaction(&self, id: i64, user_id: i64) -> Result<()> {
        let mut rows = self.transactions.borrow_mut();
        let before = rows.len();
        rows.retain(|tx| !(tx.id == id && tx.user_id == user_id));

        if rows.len() == before {
            return Err(not_owned(id));
        }
        Ok(())
    }
}

fn not_owned(id: i64) -> FinanceError {
    FinanceError::not_found(format!(
        "Transaction ID {} not found or does not belong to you.",
        id
    ))
}

impl BudgetStore for MemoryStore {
    fn budget_limit(&self, user_id: i64, category: &str) -> Result<Option<Decimal>> {
        Ok(self
            .budgets
            .borrow()
            .iter()
            .find(|b| b.user_id == user_id && b.category == category)
            .map(|b| b.limit))
    }

    fn budgets_for_user(&self, user_id: i64) -> Result<Vec<Budget>> {
        let mut budgets: Vec<Budget> = self
            .budgets
            .borrow()
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();

        budgets.sort_by(|a, b| a.category.cmp(&b.category));
        Ok(budgets)
    }

    fn upsert_budget(&self, budget: &Budget) -> Result<()> {
        if !self.user_exists(budget.user_id) {
            return Err(FinanceError::not_found(format!(
                "User {} does not exist.",
                budget.user_id
            )));
        }

        let mut budgets = self.budgets.borrow_mut();
        match budgets
            .iter_mut()
            .find(|b| b.user_id == budget.user_id && b.category == budget.category)
        {
            Some(existing) => existing.limit = budget.limit,
            None => budgets.push(budget.clone()),
        }
        Ok(())
    }
}

impl UserStore for MemoryStore {
    fn insert_user(&self, username: &str, password_hash: &str) -> Result<User> {
        if self.users.borrow().iter().any(|u| u.username == username) {
            return Err(FinanceError::Conflict(format!(
                "Username '{}' already exists.",
                username
            )));
        }

        let user = User {
            id: Self::allocate_id(&self.next_user_id),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        self.users.borrow_mut().push(user.clone());
        Ok(user)
    }

    fn find_user_by_name(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .borrow()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_memory_store_mirrors_sqlite_contracts() {
        let store = MemoryStore::new();
        let alice = store.insert_user("alice", "h").unwrap();
        let bob = store.insert_user("bob", "h").unwrap();
        assert!(matches!(
            store.insert_user("alice", "x"),
            Err(FinanceError::Conflict(_))
        ));

        let id = store
            .insert_transaction(&NewTransaction {
                user_id: alice.id,
                kind: TransactionKind::Expense,
                category: "Food".to_string(),
                amount: dec!(10),
                date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                description: None,
            })
            .unwrap();

        assert!(matches!(
            store.delete_transaction(id, bob.id),
            Err(FinanceError::NotFound(_))
        ));
        store.delete_transaction(id, alice.id).unwrap();

        store.upsert_budget(&Budget::new(alice.id, "Food", dec!(1))).unwrap();
        store.upsert_budget(&Budget::new(alice.id, "Food", dec!(2))).unwrap();
        assert_eq!(store.budgets_for_user(alice.id).unwrap().len(), 1);
        assert_eq!(store.budget_limit(alice.id, "Food").unwrap(), Some(dec!(2)));
    }

    #[test]
    fn test_category_sum_overflow_is_an_error() {
        let store = MemoryStore::new();
        let alice = store.insert_user("alice", "h").unwrap();
        for day in [1, 2] {
            store
                .insert_transaction(&NewTransaction {
                    user_id: alice.id,
                    kind: TransactionKind::Expense,
                    category: "Food".to_string(),
                    amount: Decimal::MAX,
                    date: NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
                    description: None,
                })
                .unwrap();
        }

        let june = MonthWindow::new(2025, 6).unwrap();
        assert!(matches!(
            store.category_totals(alice.id, TransactionKind::Expense, &june),
            Err(FinanceError::Overflow)
        ));
    }
}
