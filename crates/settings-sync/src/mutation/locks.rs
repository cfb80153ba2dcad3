//! Per-scope serialization of mutations.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OwnedMutexGuard;

use crate::cache::ScopeKey;

/// One async lock per scope key.
///
/// Holders of different keys never wait on each other. Entries nobody holds
/// or waits for are pruned on the next acquisition.
#[derive(Debug, Default)]
pub struct ScopeLocks {
    locks: Mutex<HashMap<ScopeKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl ScopeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until the lock for `key` is free and takes it. Waiters are
    /// served in arrival order.
    pub async fn acquire(&self, key: &ScopeKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock();
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(key.clone()).or_default())
        };
        lock.lock_owned().await
    }

    /// Returns true if some `apply` currently holds the lock for `key`.
    pub fn is_locked(&self, key: &ScopeKey) -> bool {
        self.locks
            .lock()
            .get(key)
            .is_some_and(|lock| lock.try_lock().is_err())
    }

    /// Number of keys with a live lock.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use settings_core::Scope;
    use std::time::Duration;

    fn key(account: &str) -> ScopeKey {
        ScopeKey::from_scope(&Scope::new().with_account_id(account))
    }

    #[tokio::test]
    async fn test_same_key_waits() {
        let locks = Arc::new(ScopeLocks::new());
        let guard = locks.acquire(&key("a1")).await;
        assert!(locks.is_locked(&key("a1")));

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire(&key("a1")).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
        assert!(!locks.is_locked(&key("a1")));
    }

    #[tokio::test]
    async fn test_other_keys_do_not_wait() {
        let locks = ScopeLocks::new();
        let _a = locks.acquire(&key("a1")).await;

        let acquired = tokio::time::timeout(Duration::from_millis(100), locks.acquire(&key("a2"))).await;

        assert!(acquired.is_ok());
    }

    #[tokio::test]
    async fn test_released_locks_are_pruned() {
        let locks = ScopeLocks::new();
        drop(locks.acquire(&key("a1")).await);
        drop(locks.acquire(&key("a2")).await);

        let _a3 = locks.acquire(&key("a3")).await;

        assert_eq!(locks.len(), 1);
    }
}
