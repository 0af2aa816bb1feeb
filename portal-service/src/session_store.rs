//! Injected session persistence seam.
//!
//! The platform owns no session storage of its own; it talks to whatever
//! store is wired in through this trait. The store is assumed to provide
//! read-after-write consistency per key and to serialize concurrent writes
//! to the same key. Concurrent requests for one session are last-write-wins;
//! the only in-flight state is a bounded-lifetime OTP.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::models::Session;

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, id: &str) -> Option<Session>;
    async fn put(&self, id: &str, session: Session);
    async fn remove(&self, id: &str);
}

/// Default in-process store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: DashMap<String, Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, id: &str) -> Option<Session> {
        self.inner.get(id).map(|entry| entry.value().clone())
    }

    async fn put(&self, id: &str, session: Session) {
        self.inner.insert(id.to_string(), session);
    }

    async fn remove(&self, id: &str) {
        self.inner.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuthStage;

    #[tokio::test]
    async fn put_get_remove_round_trip() {
        let store = MemorySessionStore::new();
        assert!(store.get("s1").await.is_none());

        let mut session = Session::default();
        session.stage = AuthStage::Authenticated;
        store.put("s1", session.clone()).await;
        assert_eq!(store.get("s1").await, Some(session));

        store.remove("s1").await;
        assert!(store.get("s1").await.is_none());
    }
}
