// Entity Models
//
// Rows of the three persisted tables (users, transactions, budgets)
// plus the input shapes used to create or change them.

pub mod budget;
pub mod transaction;
pub mod user;

pub use budget::Budget;
pub use transaction::{NewTransaction, Transaction, TransactionKind, TransactionUpdate};
pub use user::User;
