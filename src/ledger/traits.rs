//! Credit ledger interface

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

/// Snapshot of one user's balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditAccount {
    pub user_id: String,
    pub credits: u32,
}

/// Integer credit balances keyed by user id. Unknown users hold zero.
#[async_trait]
pub trait CreditLedger: Send + Sync {
    /// Current balance
    async fn balance(&self, user_id: &str) -> Result<u32>;

    /// Decrement the balance by `amount` if and only if it covers it.
    ///
    /// The check and the decrement happen as one step; returns `false`
    /// without touching the balance when it is short.
    async fn try_debit(&self, user_id: &str, amount: u32) -> Result<bool>;

    /// Add `amount` to the balance, returning the new balance
    async fn credit(&self, user_id: &str, amount: u32) -> Result<u32>;

    async fn account(&self, user_id: &str) -> Result<CreditAccount> {
        Ok(CreditAccount {
            user_id: user_id.to_string(),
            credits: self.balance(user_id).await?,
        })
    }
}
