use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// One async mutex per account id.
///
/// Serialises units of work on the same account while leaving different
/// accounts independent. Entries nobody is holding or waiting on are pruned
/// as new locks are handed out.
#[derive(Default, Clone)]
pub struct AccountLocks {
    locks: Arc<Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, account_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|id, lock| *id == account_id || Arc::strong_count(lock) > 1);
            locks.entry(account_id).or_default().clone()
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_account_is_exclusive() {
        let locks = AccountLocks::new();
        let account = Uuid::new_v4();

        let guard = locks.acquire(account).await;
        let blocked = tokio::time::timeout(Duration::from_millis(50), locks.acquire(account)).await;
        assert!(blocked.is_err());

        drop(guard);
        let reacquired =
            tokio::time::timeout(Duration::from_millis(50), locks.acquire(account)).await;
        assert!(reacquired.is_ok());
    }

    #[tokio::test]
    async fn test_different_accounts_are_independent() {
        let locks = AccountLocks::new();
        let _first = locks.acquire(Uuid::new_v4()).await;
        let second =
            tokio::time::timeout(Duration::from_millis(50), locks.acquire(Uuid::new_v4())).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_released_locks_are_pruned() {
        let locks = AccountLocks::new();
        for _ in 0..10 {
            let _guard = locks.acquire(Uuid::new_v4()).await;
        }
        let _guard = locks.acquire(Uuid::new_v4()).await;
        assert_eq!(locks.locks.lock().await.len(), 1);
    }
}
