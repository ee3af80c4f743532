use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::Id;
use crate::store::{Error, Record, SessionMap, SessionStore};

#[derive(Debug, Clone)]
struct StoredSession {
    data: HashMap<String, Vec<u8>>,
    expires_at: Option<Instant>,
}

impl StoredSession {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map(|expires| expires > now).unwrap_or(true)
    }
}

/// An in-memory session store implementation.
///
/// Sessions live in a shared [`DashMap`]; clones of the store see the same data.
/// With [`MemoryStore::with_expiry`] a session is dropped once it has not been
/// persisted for the given number of seconds.
///
/// ### Note
///
/// Data does not survive a restart and is not shared between processes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<DashMap<String, StoredSession>>,
    expiry: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expire sessions `seconds` after their last persist. Non-positive values disable expiry.
    pub fn with_expiry(mut self, seconds: i64) -> Self {
        self.expiry = (seconds > 0).then(|| Duration::from_secs(seconds as u64));
        self
    }

    /// Number of live sessions held by the store.
    pub fn len(&self) -> usize {
        self.cleanup_expired();
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cleanup_expired(&self) {
        let now = Instant::now();
        self.data.retain(|_, session| session.is_live(now));
    }
}

impl SessionStore for MemoryStore {
    async fn load(&self, session_id: &Id) -> Result<Record, Error> {
        self.cleanup_expired();

        let record = match self.data.get(session_id.as_str()) {
            Some(stored) if stored.is_live(Instant::now()) => Record::with_data(
                session_id.clone(),
                SessionMap::new(stored.data.clone()),
            ),
            _ => Record::new(session_id.clone()),
        };

        Ok(record)
    }

    async fn persist(&self, record: &Record) -> Result<(), Error> {
        if record.data.is_empty() {
            self.data.remove(record.id.as_str());
            return Ok(());
        }

        let expires_at = self.expiry.map(|expiry| Instant::now() + expiry);
        self.data.insert(
            record.id.to_string(),
            StoredSession {
                data: record.data.as_map().clone(),
                expires_at,
            },
        );

        Ok(())
    }
}
