pub mod cache_keys;
pub mod in_memory;

use crate::core::errors::LedgerError;
use crate::core::models::MemberId;
use crate::core::services::UserBalancesResponse;
use async_trait::async_trait;

/// Cache of computed balance views. A cached view is only valid for the
/// ledger state it was computed from, so writers must invalidate every
/// member the write can affect.
///
/// Each member's entry carries a generation that every invalidation bumps.
/// Readers fetch the generation before taking their snapshot and hand it
/// back on save; a view computed across an invalidation is never stored.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get_user_balances(&self, member: &MemberId) -> Result<Option<UserBalancesResponse>, LedgerError>;
    async fn user_balances_generation(&self, member: &MemberId) -> Result<u64, LedgerError>;
    /// Stores `balances` unless `member` was invalidated after `generation`
    /// was read. Returns whether the view was stored.
    async fn save_user_balances(
        &self,
        member: &MemberId,
        balances: &UserBalancesResponse,
        ttl: std::time::Duration,
        generation: u64,
    ) -> Result<bool, LedgerError>;
    async fn invalidate_user_balances(&self, members: &[MemberId]) -> Result<(), LedgerError>;
}
