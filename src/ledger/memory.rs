//! In-memory credit ledger

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::error::Result;
use crate::ledger::traits::CreditLedger;

/// Ledger backed by a [`DashMap`]. A debit holds the shard write lock for
/// the account while it checks and decrements.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    accounts: DashMap<String, u32>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger with initial balances
    pub fn with_balances<I, K>(balances: I) -> Self
    where
        I: IntoIterator<Item = (K, u32)>,
        K: Into<String>,
    {
        let accounts = DashMap::new();
        for (user_id, balance) in balances {
            accounts.insert(user_id.into(), balance);
        }
        Self { accounts }
    }
}

#[async_trait]
impl CreditLedger for InMemoryLedger {
    async fn balance(&self, user_id: &str) -> Result<u32> {
        Ok(self.accounts.get(user_id).map(|b| *b).unwrap_or(0))
    }

    async fn try_debit(&self, user_id: &str, amount: u32) -> Result<bool> {
        let debited = match self.accounts.get_mut(user_id) {
            Some(mut balance) if *balance >= amount => {
                *balance -= amount;
                true
            }
            _ => false,
        };
        debug!(user_id, amount, debited, "Debit attempted");
        Ok(debited)
    }

    async fn credit(&self, user_id: &str, amount: u32) -> Result<u32> {
        let mut balance = self.accounts.entry(user_id.to_string()).or_insert(0);
        *balance = balance.saturating_add(amount);
        debug!(user_id, amount, balance = *balance, "Credited account");
        Ok(*balance)
    }
}
