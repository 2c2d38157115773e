//! Per-session booking locks
//!
//! Serializes the booking decision for one session while letting bookings
//! on different sessions proceed in parallel. Locks are created lazily on
//! first use and live for the registry's lifetime.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// Registry of per-session mutexes
#[derive(Debug, Default)]
pub struct SessionLocks {
    locks: RwLock<HashMap<i64, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for one session, creating it on first use.
    ///
    /// The returned guard keeps the session locked until dropped.
    pub async fn acquire(&self, session_id: i64) -> OwnedMutexGuard<()> {
        let existing = {
            let locks = self.locks.read().await;
            locks.get(&session_id).cloned()
        };
        let lock = match existing {
            Some(lock) => lock,
            None => {
                let mut locks = self.locks.write().await;
                locks
                    .entry(session_id)
                    .or_insert_with(|| Arc::new(Mutex::new(())))
                    .clone()
            }
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_same_session_serializes() {
        let locks = SessionLocks::new();
        let guard = locks.acquire(1).await;

        let blocked = timeout(Duration::from_millis(50), locks.acquire(1)).await;
        assert!(blocked.is_err(), "second acquire should block while held");

        drop(guard);
        let reacquired = timeout(Duration::from_millis(50), locks.acquire(1)).await;
        assert!(reacquired.is_ok(), "lock should be free after guard drop");
    }

    #[tokio::test]
    async fn test_different_sessions_do_not_block() {
        let locks = SessionLocks::new();
        let _guard = locks.acquire(1).await;

        let other = timeout(Duration::from_millis(50), locks.acquire(2)).await;
        assert!(other.is_ok(), "a different session must not be blocked");
    }

    #[tokio::test]
    async fn test_lock_is_reused_per_session() {
        let locks = SessionLocks::new();
        drop(locks.acquire(7).await);
        drop(locks.acquire(7).await);

        let map = locks.locks.read().await;
        assert_eq!(map.len(), 1);
    }
}
