use crate::core::errors::LedgerError;
use crate::core::models::MemberId;
use crate::core::services::UserBalancesResponse;
use crate::infrastructure::cache::Cache;
use crate::infrastructure::cache::cache_keys::user_balances_key;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Clone)]
struct CachedBalances {
    view: UserBalancesResponse,
    expires_at: DateTime<Utc>,
}

impl CachedBalances {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Views and generations sit under one lock so the generation check and
/// the insert on save happen together.
#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CachedBalances>,
    generations: HashMap<String, u64>,
}

impl CacheState {
    fn generation(&self, key: &str) -> u64 {
        self.generations.get(key).copied().unwrap_or(0)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryCache {
    state: Arc<RwLock<CacheState>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get_user_balances(&self, member: &MemberId) -> Result<Option<UserBalancesResponse>, LedgerError> {
        let state = self.state.read().await;
        let now = Utc::now();
        Ok(state
            .entries
            .get(&user_balances_key(member))
            .filter(|cached| cached.is_live(now))
            .map(|cached| cached.view.clone()))
    }

    async fn user_balances_generation(&self, member: &MemberId) -> Result<u64, LedgerError> {
        let state = self.state.read().await;
        Ok(state.generation(&user_balances_key(member)))
    }

    async fn save_user_balances(
        &self,
        member: &MemberId,
        balances: &UserBalancesResponse,
        ttl: Duration,
        generation: u64,
    ) -> Result<bool, LedgerError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| LedgerError::CacheError(format!("Failed to convert TTL: {}", e)))?;
        let key = user_balances_key(member);
        let mut state = self.state.write().await;
        if state.generation(&key) != generation {
            return Ok(false);
        }
        let cached = CachedBalances {
            view: balances.clone(),
            expires_at: Utc::now() + ttl,
        };
        state.entries.insert(key, cached);
        Ok(true)
    }

    /// Drops the listed members' views, bumps their generations and prunes
    /// anything already expired.
    async fn invalidate_user_balances(&self, members: &[MemberId]) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        for member in members {
            let key = user_balances_key(member);
            state.entries.remove(&key);
            let generation = state.generations.entry(key).or_insert(0);
            *generation = generation.wrapping_add(1);
        }
        let now = Utc::now();
        state.entries.retain(|_, cached| cached.is_live(now));
        Ok(())
    }
}
