// Finance Tracker - Core Library
// Exposes all modules for use in the menu CLI, the dashboard, and tests

pub mod error;
pub mod config;
pub mod money;
pub mod clock;
pub mod entities;
pub mod store;
pub mod aggregation;   // Monthly summaries + budget vs actual
pub mod ledger;        // CRUD over transactions and budgets
pub mod auth;
pub mod backup;
pub mod report;        // Text rendering for the menu
pub mod cli;

// Only compile the dashboard when the TUI feature is enabled
#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use error::{FinanceError, Result};
pub use config::AppConfig;
pub use money::{format_money, parse_amount};
pub use clock::{Clock, FixedClock, MonthWindow, SystemClock};
pub use entities::{
    Budget, NewTransaction, Transaction, TransactionKind, TransactionUpdate, User,
};
pub use store::{
    BudgetStore, CategoryTotal, MemoryStore, RecordStore, RecordWriter, SqliteStore, UserStore,
};
pub use aggregation::{AggregationEngine, BudgetCheck, BudgetStatus, MonthlySummary};
pub use ledger::{Ledger, Recorded};
pub use auth::{hash_password, login_user, register_user};
pub use backup::BackupManager;
pub use cli::Session;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
