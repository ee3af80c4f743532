//! Per-session serialization of writes.
//!
//! The middleware itself never locks: concurrent requests carrying the same id
//! race and the last `persist` wins. Wrapping a store in [`SerializedStore`]
//! makes persists for one id run one at a time, which is enough for backends
//! whose write is not atomic on its own.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::Id;
use crate::store::{Error, Record, SessionStore};

#[derive(Clone, Debug)]
pub struct SerializedStore<S: SessionStore> {
    inner: S,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl<S: SessionStore> SerializedStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            locks: Arc::new(DashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: SessionStore> SessionStore for SerializedStore<S> {
    async fn load(&self, session_id: &Id) -> Result<Record, Error> {
        self.inner.load(session_id).await
    }

    async fn persist(&self, record: &Record) -> Result<(), Error> {
        let key = record.id.to_string();
        let lock = self.locks.entry(key.clone()).or_default().clone();

        let result = {
            let _guard = lock.lock().await;
            self.inner.persist(record).await
        };

        drop(lock);
        self.locks
            .remove_if(&key, |_, lock| Arc::strong_count(lock) == 1);

        result
    }
}
