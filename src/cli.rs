// 🖥️ Interactive menu
//
// Line-oriented session over any BufRead/Write pair. Every failed operation
// is reported and control returns to the menu; end of input exits.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::error;

use crate::auth;
use crate::backup::{self, BackupManager};
use crate::clock::Clock;
use crate::entities::{TransactionKind, User};
use crate::error::{FinanceError, Result};
use crate::ledger::Ledger;
use crate::money::{format_money, parse_amount};
use crate::report;
use crate::store::{BudgetStore, RecordStore, RecordWriter, UserStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Logout,
    Exit,
}

pub struct Session<'a, S: ?Sized, C: ?Sized, R, W> {
    store: &'a S,
    clock: &'a C,
    backups: &'a BackupManager,
    input: R,
    output: W,
}

impl<'a, S, C, R, W> Session<'a, S, C, R, W>
where
    S: RecordStore + RecordWriter + BudgetStore + UserStore + ?Sized,
    C: Clock + ?Sized,
    R: BufRead,
    W: Write,
{
    pub fn new(
        store: &'a S,
        clock: &'a C,
        backups: &'a BackupManager,
        input: R,
        output: W,
    ) -> Self {
        Session {
            store,
            clock,
            backups,
            input,
            output,
        }
    }

    fn ledger(&self) -> Ledger<'a, S, C> {
        Ledger::new(self.store, self.clock)
    }

    // ========================================================================
    // MENUS
    // ========================================================================

    /// Top-level menu loop. Returns when the user exits or input ends.
    pub fn run(&mut self) -> Result<()> {
        loop {
            writeln!(self.output, "\nWelcome to your Personal Finance Manager!")?;
            writeln!(self.output, "1. Register")?;
            writeln!(self.output, "2. Login")?;
            writeln!(self.output, "3. Create Backup")?;
            writeln!(self.output, "4. Restore from Backup")?;
            writeln!(self.output, "5. Exit")?;

            let Some(choice) = self.ask("Please choose an option: ")? else {
                break;
            };

            let outcome = match choice.trim() {
                "1" => self.handle_register(),
                "2" => self.handle_login(),
                "3" => self.handle_create_backup(),
                "4" => self.handle_restore(),
                "5" => Ok(Flow::Exit),
                _ => {
                    writeln!(self.output, "Invalid choice, please try again.")?;
                    Ok(Flow::Continue)
                }
            };

            if self.settle(outcome)? == Flow::Exit {
                break;
            }
        }

        writeln!(self.output, "Goodbye! 👋")?;
        Ok(())
    }

    fn logged_in_menu(&mut self, user: &User) -> Result<Flow> {
        loop {
            writeln!(self.output, "\n--- Main Menu (Logged in as {}) ---", user.username)?;
            writeln!(self.output, "1. Add Income")?;
            writeln!(self.output, "2. Add Expense")?;
            writeln!(self.output, "3. View Transactions")?;
            writeln!(self.output, "4. Delete a Transaction")?;
            writeln!(self.output, "5. Update a Transaction")?;
            writeln!(self.output, "6. View Financial Report")?;
            writeln!(self.output, "7. Set Budget")?;
            writeln!(self.output, "8. View Budget")?;
            writeln!(self.output, "9. Logout")?;

            let Some(choice) = self.ask("Please choose an option: ")? else {
                return Ok(Flow::Exit);
            };

            let outcome = match choice.trim() {
                "1" => self.handle_add_transaction(user.id, TransactionKind::Income),
                "2" => self.handle_add_transaction(user.id, TransactionKind::Expense),
                "3" => self.handle_view_transactions(user.id),
                "4" => self.handle_delete_transaction(user.id),
                "5" => self.handle_update_transaction(user.id),
                "6" => self.handle_view_report(user.id),
                "7" => self.handle_set_budget(user.id),
                "8" => self.handle_view_budgets(user.id),
                "9" => Ok(Flow::Logout),
                _ => {
                    writeln!(self.output, "Invalid option.")?;
                    Ok(Flow::Continue)
                }
            };

            match self.settle(outcome)? {
                Flow::Continue => {}
                Flow::Logout => {
                    writeln!(self.output, "You have been logged out.")?;
                    return Ok(Flow::Continue);
                }
                Flow::Exit => return Ok(Flow::Exit),
            }
        }
    }

    /// Report a failed operation and keep the menu running.
    fn settle(&mut self, outcome: Result<Flow>) -> Result<Flow> {
        match outcome {
            Ok(flow) => Ok(flow),
            Err(FinanceError::Io(e)) => Err(FinanceError::Io(e)),
            Err(err) if err.is_user_facing() => {
                writeln!(self.output, "❌ Error: {}", err)?;
                Ok(Flow::Continue)
            }
            Err(err) => {
                error!(error = %err, "operation failed");
                writeln!(self.output, "❌ An error occurred: {}", err)?;
                Ok(Flow::Continue)
            }
        }
    }

    // ========================================================================
    // PROMPTS
    // ========================================================================

    /// Print `prompt` and read one line. `None` at end of input.
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    // ========================================================================
    // ACCOUNT & BACKUP
    // ========================================================================

    fn handle_register(&mut self) -> Result<Flow> {
        let Some(username) = self.ask("Enter a new username: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(password) = self.ask("Enter a password: ")? else {
            return Ok(Flow::Exit);
        };

        let user = auth::register_user(self.store, &username, &password)?;
        writeln!(self.output, "✅ User '{}' registered successfully!", user.username)?;
        Ok(Flow::Continue)
    }

    fn handle_login(&mut self) -> Result<Flow> {
        let Some(username) = self.ask("Enter your username: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(password) = self.ask("Enter your password: ")? else {
            return Ok(Flow::Exit);
        };

        let user = auth::login_user(self.store, &username, &password)?;
        writeln!(self.output, "✅ Login successful! Welcome, {}.", user.username)?;
        self.logged_in_menu(&user)
    }

    fn handle_create_backup(&mut self) -> Result<Flow> {
        let path = self.backups.create_backup(self.clock.now())?;
        writeln!(self.output, "✅ Backup created successfully: {}", path.display())?;
        Ok(Flow::Continue)
    }

    fn handle_restore(&mut self) -> Result<Flow> {
        let backups = self.backups.list_backups()?;
        if backups.is_empty() {
            writeln!(
                self.output,
                "❌ No backup files found in '{}'.",
                self.backups.backup_dir().display()
            )?;
            return Ok(Flow::Continue);
        }

        writeln!(self.output, "\n--- Available Backups ---")?;
        for (i, path) in backups.iter().enumerate() {
            writeln!(self.output, "{}. {}", i + 1, backup::display_name(path))?;
        }

        let prompt = "\nEnter the number of the backup to restore (or 0 to cancel): ";
        let Some(choice) = self.ask(prompt)? else {
            return Ok(Flow::Exit);
        };
        let choice: usize = choice
            .trim()
            .parse()
            .map_err(|_| FinanceError::validation("Invalid input. Please enter a number."))?;
        if choice == 0 {
            writeln!(self.output, "Restore cancelled.")?;
            return Ok(Flow::Continue);
        }
        let selected: &PathBuf = backups
            .get(choice - 1)
            .ok_or_else(|| FinanceError::validation("Invalid choice."))?;
        let name = backup::display_name(selected);

        writeln!(
            self.output,
            "\n⚠️ WARNING: This will overwrite ALL current data with the contents of '{}'.",
            name
        )?;
        let Some(confirm) = self.ask("Are you sure you want to continue? (yes/no): ")? else {
            return Ok(Flow::Exit);
        };

        if confirm.trim().eq_ignore_ascii_case("yes") {
            self.backups.restore(selected)?;
            writeln!(self.output, "✅ Database restored successfully from {}.", name)?;
        } else {
            writeln!(self.output, "Restore cancelled.")?;
        }
        Ok(Flow::Continue)
    }

    // ========================================================================
    // TRANSACTIONS
    // ========================================================================

    fn handle_add_transaction(&mut self, user_id: i64, kind: TransactionKind) -> Result<Flow> {
        let Some(category) = self.ask(&format!(
            "Enter {} category (e.g., Salary, Food, Rent): ",
            kind.as_str()
        ))?
        else {
            return Ok(Flow::Exit);
        };
        let Some(amount) = self.ask("Enter amount: $")? else {
            return Ok(Flow::Exit);
        };
        let amount = parse_amount(&amount)?;
        let Some(description) = self.ask("Enter a brief description (optional): ")? else {
            return Ok(Flow::Exit);
        };

        let recorded = self
            .ledger()
            .add_transaction(user_id, kind, &category, amount, Some(description))?;
        writeln!(
            self.output,
            "✅ {} of {} added successfully.",
            kind.label(),
            format_money(amount)
        )?;
        if let Some(over) = recorded.overage() {
            writeln!(self.output, "{}", report::overage_alert(category.trim(), over))?;
        }
        Ok(Flow::Continue)
    }

    fn handle_view_transactions(&mut self, user_id: i64) -> Result<Flow> {
        let transactions = self.ledger().list_transactions(user_id)?;
        if !transactions.is_empty() {
            writeln!(self.output, "\n--- Your Recent Transactions ---")?;
        }
        write!(self.output, "{}", report::transaction_table(&transactions))?;
        Ok(Flow::Continue)
    }

    /// Show the user's transactions and ask for one ID.
    ///
    /// Outer `None` means end of input; inner `None` means nothing to pick
    /// or the user cancelled with 0.
    fn pick_transaction(&mut self, user_id: i64, action: &str) -> Result<Option<Option<i64>>> {
        let transactions = self.ledger().list_transactions(user_id)?;
        if transactions.is_empty() {
            writeln!(self.output, "\nNo transactions to {}.", action)?;
            return Ok(Some(None));
        }

        writeln!(self.output, "\n--- Select a Transaction to {} ---", capitalize(action))?;
        write!(self.output, "{}", report::transaction_table(&transactions))?;

        let Some(raw) = self.ask(&format!(
            "\nEnter the ID of the transaction to {} (or 0 to cancel): ",
            action
        ))?
        else {
            return Ok(None);
        };
        let id: i64 = raw
            .trim()
            .parse()
            .map_err(|_| FinanceError::validation("Invalid ID. Please enter a number."))?;

        Ok(Some(if id == 0 { None } else { Some(id) }))
    }

    fn handle_delete_transaction(&mut self, user_id: i64) -> Result<Flow> {
        let id = match self.pick_transaction(user_id, "delete")? {
            None => return Ok(Flow::Exit),
            Some(None) => return Ok(Flow::Continue),
            Some(Some(id)) => id,
        };

        self.ledger().delete_transaction(id, user_id)?;
        writeln!(self.output, "✅ Transaction deleted successfully.")?;
        Ok(Flow::Continue)
    }

    fn handle_update_transaction(&mut self, user_id: i64) -> Result<Flow> {
        let id = match self.pick_transaction(user_id, "update")? {
            None => return Ok(Flow::Exit),
            Some(None) => return Ok(Flow::Continue),
            Some(Some(id)) => id,
        };

        writeln!(self.output, "\nEnter the new details:")?;
        let Some(category) = self.ask("Enter new category: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(amount) = self.ask("Enter new amount: $")? else {
            return Ok(Flow::Exit);
        };
        let amount = parse_amount(&amount)?;
        let Some(description) = self.ask("Enter new description: ")? else {
            return Ok(Flow::Exit);
        };

        self.ledger()
            .update_transaction(id, user_id, amount, &category, Some(description))?;
        writeln!(self.output, "✅ Transaction updated successfully.")?;
        Ok(Flow::Continue)
    }

    // ========================================================================
    // REPORTS & BUDGETS
    // ========================================================================

    fn handle_view_report(&mut self, user_id: i64) -> Result<Flow> {
        let Some(year) = self.ask("Enter the year (e.g., 2025): ")? else {
            return Ok(Flow::Exit);
        };
        let Some(month) = self.ask("Enter the month (1-12): ")? else {
            return Ok(Flow::Exit);
        };

        let invalid = || {
            FinanceError::validation("Invalid input. Please enter numbers for year and month.")
        };
        let year: i32 = year.trim().parse().map_err(|_| invalid())?;
        let month: u32 = month.trim().parse().map_err(|_| invalid())?;

        let summary = self
            .ledger()
            .engine()
            .compute_monthly_summary(user_id, year, month)?;
        write!(self.output, "\n{}", report::monthly_summary(&summary))?;
        Ok(Flow::Continue)
    }

    fn handle_set_budget(&mut self, user_id: i64) -> Result<Flow> {
        let prompt = "Enter the category to set a budget for (e.g., Food): ";
        let Some(category) = self.ask(prompt)? else {
            return Ok(Flow::Exit);
        };
        let Some(limit) = self.ask("Enter the budget limit amount: $")? else {
            return Ok(Flow::Exit);
        };
        let limit = parse_amount(&limit)?;

        self.ledger().set_budget(user_id, &category, limit)?;
        writeln!(
            self.output,
            "✅ Budget for '{}' set to {}.",
            category.trim(),
            format_money(limit)
        )?;
        Ok(Flow::Continue)
    }

    fn handle_view_budgets(&mut self, user_id: i64) -> Result<Flow> {
        let statuses = self.ledger().engine().get_budgets_with_spending(user_id)?;
        write!(self.output, "\n{}", report::budget_table(&statuses))?;
        Ok(Flow::Continue)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{FixedClock, MonthWindow};
    use crate::entities::{Budget, NewTransaction, Transaction, TransactionUpdate};
    use crate::store::{CategoryTotal, MemoryStore};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::fs;
    use tempfile::TempDir;

    struct Harness {
        store: MemoryStore,
        clock: FixedClock,
        dir: TempDir,
        backups: BackupManager,
    }

    impl Harness {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let backups =
                BackupManager::new(dir.path().join("finance.db"), dir.path().join("backups"));
            Harness {
                store: MemoryStore::new(),
                clock: FixedClock::on(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()),
                dir,
                backups,
            }
        }

        fn run(&self, script: &str) -> String {
            let mut out = Vec::new();
            Session::new(&self.store, &self.clock, &self.backups, script.as_bytes(), &mut out)
                .run()
                .unwrap();
            String::from_utf8(out).unwrap()
        }
    }

    const LOGIN: &str = "1\nalice\npw\n2\nalice\npw\n";

    #[test]
    fn test_exit_and_eof() {
        let h = Harness::new();
        assert!(h.run("5\n").ends_with("Goodbye! 👋\n"));
        assert!(h.run("").ends_with("Goodbye! 👋\n"));
        assert!(h.run("42\n5\n").contains("Invalid choice, please try again."));
    }

    #[test]
    fn test_register_login_and_overage_warning() {
        let h = Harness::new();
        let script = format!(
            "{LOGIN}7\nFood\n60\n2\nFood\n50\n\n2\nFood\n30\nlunch\n1\nSalary\n1000\n\n9\n5\n"
        );
        let out = h.run(&script);

        assert!(out.contains("✅ User 'alice' registered successfully!"));
        assert!(out.contains("✅ Login successful! Welcome, alice."));
        assert!(out.contains("✅ Budget for 'Food' set to $60.00."));
        assert!(out.contains("✅ Expense of $30.00 added successfully."));
        assert!(out.contains("exceeded your budget for 'Food' by $20.00"));
        assert!(out.contains("✅ Income of $1,000.00 added successfully."));
        assert!(out.contains("You have been logged out."));
        assert_eq!(out.matches("exceeded your budget").count(), 1);
    }

    #[test]
    fn test_report_and_budget_views() {
        let h = Harness::new();
        let script = format!(
            "{LOGIN}7\nFood\n60\n7\nFun\n100\n2\nFood\n80\n\n\
             6\n2025\n6\n8\n6\n2025\n13\n6\nabc\n6\n9\n5\n"
        );
        let out = h.run(&script);

        assert!(out.contains("--- Monthly Summary for 2025-06 ---"));
        assert!(out.contains("--- Your Budget Status for this Month ---"));
        assert!(out.contains("[██████████]"));
        assert!(out.contains("[----------]"));
        assert!(out.contains("❌ Error: Invalid month. Please enter a number between 1 and 12."));
        assert!(out.contains("❌ Error: Invalid input. Please enter numbers for year and month."));
    }

    #[test]
    fn test_invalid_amount_has_no_side_effects() {
        let h = Harness::new();
        let out = h.run(&format!("{LOGIN}2\nFood\nabc\n9\n5\n"));

        assert!(out.contains("❌ Error: Invalid amount. Please enter a number."));
        let user = h.store.find_user_by_name("alice").unwrap().unwrap();
        assert!(h.store.transactions_for_user(user.id).unwrap().is_empty());
    }

    #[test]
    fn test_delete_update_and_cancel() {
        let h = Harness::new();
        let script = format!(
            "{LOGIN}2\nFood\n10\n\n2\nRent\n500\n\n4\n0\n\
             5\n1\nGroceries\n12.5\nweekly\n4\n2\n4\n999\n4\nx\n9\n5\n"
        );
        let out = h.run(&script);

        assert!(out.contains("✅ Transaction updated successfully."));
        assert!(out.contains("✅ Transaction deleted successfully."));
        assert!(out.contains("❌ Error: Transaction ID 999 not found or does not belong to you."));
        assert!(out.contains("❌ Error: Invalid ID. Please enter a number."));

        let user = h.store.find_user_by_name("alice").unwrap().unwrap();
        let rows = h.store.transactions_for_user(user.id).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].category, "Groceries");
        assert_eq!(rows[0].amount, dec!(12.5));
    }

    #[test]
    fn test_duplicate_and_bad_login_return_to_menu() {
        let h = Harness::new();
        let out = h.run("1\nalice\npw\n1\nalice\nother\n2\nalice\nwrong\n5\n");

        assert!(out.contains("❌ Error: Username 'alice' already exists."));
        assert!(out.contains("❌ Error: Invalid username or password."));
        assert!(out.ends_with("Goodbye! 👋\n"));
    }

    #[test]
    fn test_backup_and_restore_flow() {
        let h = Harness::new();
        assert!(h.run("3\n5\n").contains("❌ Error: Database file"));
        assert!(h.run("4\n5\n").contains("No backup files found"));

        fs::write(h.backups.db_path(), b"snapshot").unwrap();
        let out = h.run("3\n5\n");
        assert!(out.contains("✅ Backup created successfully:"));
        assert!(out.contains("finance_backup_2025-06-15_00-00-00.db"));

        fs::write(h.backups.db_path(), b"changed").unwrap();
        assert!(h.run("4\n1\nno\n5\n").contains("Restore cancelled."));
        assert_eq!(fs::read(h.backups.db_path()).unwrap(), b"changed");

        assert!(h.run("4\n7\n5\n").contains("❌ Error: Invalid choice."));

        let out = h.run("4\n1\nyes\n5\n");
        assert!(out.contains(
            "✅ Database restored successfully from finance_backup_2025-06-15_00-00-00.db."
        ));
        assert_eq!(fs::read(h.dir.path().join("finance.db")).unwrap(), b"snapshot");
    }

    #[test]
    fn test_huge_amounts_are_rejected_and_report_still_renders() {
        let h = Harness::new();
        let script = format!(
            "{LOGIN}2\nFood\n50000000000000000000000000000\n\
             2\nFood\n50000000000000000000000000000\n\
             2\nFood\n999999999999.99\n\n2\nFood\n999999999999.99\n\n\
             6\n2025\n6\n9\n5\n"
        );
        let out = h.run(&script);

        let rejected = "❌ Error: Amount is too large. The limit is $999,999,999,999.99.";
        assert_eq!(out.matches(rejected).count(), 2);
        assert!(out.contains("--- Monthly Summary for 2025-06 ---"));
        assert!(out.contains("$1,999,999,999,999.98"));
        assert!(out.ends_with("Goodbye! 👋\n"));
    }

    /// Budgets and users work; every transaction read fails like a broken disk.
    struct FailingReads {
        inner: MemoryStore,
    }

    fn disk_error() -> FinanceError {
        FinanceError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_IOERR),
            Some("disk I/O error".to_string()),
        ))
    }

    impl RecordStore for FailingReads {
        fn category_totals(
            &self,
            _user_id: i64,
            _kind: TransactionKind,
            _window: &MonthWindow,
        ) -> Result<Vec<CategoryTotal>> {
            Err(disk_error())
        }

        fn transactions_for_user(&self, _user_id: i64) -> Result<Vec<Transaction>> {
            Err(disk_error())
        }
    }

    impl RecordWriter for FailingReads {
        fn insert_transaction(&self, new: &NewTransaction) -> Result<i64> {
            self.inner.insert_transaction(new)
        }

        fn update_transaction(
            &self,
            id: i64,
            user_id: i64,
            update: &TransactionUpdate,
        ) -> Result<()> {
            self.inner.update_transaction(id, user_id, update)
        }

        fn delete_transaction(&self, id: i64, user_id: i64) -> Result<()> {
            self.inner.delete_transaction(id, user_id)
        }
    }

    impl BudgetStore for FailingReads {
        fn budget_limit(&self, user_id: i64, category: &str) -> Result<Option<Decimal>> {
            self.inner.budget_limit(user_id, category)
        }

        fn budgets_for_user(&self, user_id: i64) -> Result<Vec<Budget>> {
            self.inner.budgets_for_user(user_id)
        }

        fn upsert_budget(&self, budget: &Budget) -> Result<()> {
            self.inner.upsert_budget(budget)
        }
    }

    impl UserStore for FailingReads {
        fn insert_user(&self, username: &str, password_hash: &str) -> Result<User> {
            self.inner.insert_user(username, password_hash)
        }

        fn find_user_by_name(&self, username: &str) -> Result<Option<User>> {
            self.inner.find_user_by_name(username)
        }
    }

    #[test]
    fn test_store_failure_is_reported_and_menu_continues() {
        let h = Harness::new();
        let store = FailingReads {
            inner: MemoryStore::new(),
        };
        let script = format!("{LOGIN}3\n7\nFood\n60\n6\n2025\n6\n9\n5\n");

        let mut out = Vec::new();
        Session::new(&store, &h.clock, &h.backups, script.as_bytes(), &mut out)
            .run()
            .unwrap();
        let out = String::from_utf8(out).unwrap();

        assert_eq!(out.matches("❌ An error occurred: Database error:").count(), 2);
        assert!(out.contains("disk I/O error"));
        assert!(out.contains("✅ Budget for 'Food' set to $60.00."));
        assert!(out.contains("You have been logged out."));
        assert!(out.ends_with("Goodbye! 👋\n"));

        let user = store.find_user_by_name("alice").unwrap().unwrap();
        assert_eq!(store.budget_limit(user.id, "Food").unwrap(), Some(dec!(60)));
    }

    #[test]
    fn test_eof_inside_logged_in_menu_exits() {
        let h = Harness::new();
        h.store.insert_user("bob", &auth::hash_password("pw")).unwrap();
        let bob = h.store.find_user_by_name("bob").unwrap().unwrap();
        h.store.upsert_budget(&Budget::new(bob.id, "Food", dec!(1))).unwrap();

        let out = h.run("2\nbob\npw\n8\n");
        assert!(out.contains("Food"));
        assert!(out.ends_with("Goodbye! 👋\n"));
    }
}
