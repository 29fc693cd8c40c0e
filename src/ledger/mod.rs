//! Credit ledger - per-user prepaid balances

pub mod memory;
pub mod traits;

pub use memory::InMemoryLedger;
pub use traits::{CreditAccount, CreditLedger};
