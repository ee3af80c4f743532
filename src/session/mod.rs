//! Session management for web applications.

use std::fmt;
use std::{result, sync::Arc};

use parking_lot::RwLock;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

mod cookie_options;
pub mod id;

use crate::Flash;
use crate::config::ConfigError;
use crate::store::{self, MemoryStore, Record, SessionStore};
pub use cookie_options::CookieOptions;
pub use id::{Id, IdGenerator};

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] store::Error),
    #[error("failed to gather entropy: {0}")]
    Entropy(String),
    #[error("session id must not be empty")]
    EmptyId,
    #[error("cookies not found in the request extensions")]
    MissingCookies,
}

type Result<T> = result::Result<T, Error>;

/// A loaded session bound to the current request.
///
/// Reads are served from the record loaded when the request started; every
/// mutation is written through to the store before it returns. Clones share
/// the same state, and their writes are persisted one at a time in the order
/// they were applied. Separate requests on the same id are still last write wins.
pub struct Session<S: SessionStore = MemoryStore> {
    inner: Arc<Inner<S>>,
}

struct Inner<S: SessionStore> {
    record: RwLock<Record>,
    flash: Flash,
    store: Arc<S>,
    // Held from snapshot to persist so writes reach the store in mutation order.
    write_lock: tokio::sync::Mutex<()>,
}

impl<S: SessionStore> Clone for Session<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: SessionStore> fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.inner.record.read();
        f.debug_struct("Session")
            .field("id", &record.id)
            .field("keys", &record.data.len())
            .field("flash", &self.inner.flash)
            .finish()
    }
}

impl<S> Session<S>
where
    S: SessionStore,
{
    /// Wraps an already loaded record. No flash draining happens here.
    pub fn new(record: Record, store: Arc<S>) -> Self {
        Self {
            inner: Arc::new(Inner {
                record: RwLock::new(record),
                flash: Flash::default(),
                store,
                write_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Loads the session stored at `id` and drains its pending flash message.
    ///
    /// This is what the middleware runs once per request after resolving the id.
    #[tracing::instrument(name = "establishing session", skip(id, store))]
    pub async fn establish(id: Id, store: Arc<S>) -> Result<Self> {
        let record = store.load(&id).await.map_err(|err| {
            tracing::error!(err = %err, "failed to load session from store");
            err
        })?;

        let session = Self::new(record, store);
        session.drain_flash().await?;

        Ok(session)
    }

    /// Returns the session ID.
    pub fn id(&self) -> Id {
        self.inner.record.read().id.clone()
    }

    /// Returns a copy of the current record.
    pub fn record(&self) -> Record {
        self.inner.record.read().clone()
    }

    /// The request's flash slot.
    pub fn flash_slot(&self) -> &Flash {
        &self.inner.flash
    }

    /// Retrieves the value stored under `key`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use axum::{Router, routing::get};
    /// use sessio::Session;
    /// use sessio::store::MemoryStore;
    ///
    /// let _: Router<()> = Router::new()
    ///     .route("/get", get(|session: Session<MemoryStore>| async move {
    ///         let visits: Option<u32> = session.get("visits").unwrap();
    ///         format!("{visits:?}")
    ///     }));
    /// ```
    pub fn get<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        self.inner.record.read().data.get(key).map_err(|err| {
            tracing::error!(err = %err, key, "failed to decode session value");
            err.into()
        })
    }

    /// Like [`Session::get`], returning `default` when `key` is absent. Never mutates.
    pub fn get_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: DeserializeOwned,
    {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Returns the value under `key`, storing and returning `default` if there is none.
    #[tracing::instrument(name = "getting or setting session value", skip(self, key, default))]
    pub async fn get_or_set<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        if let Some(value) = self.get(key)? {
            return Ok(value);
        }

        self.set(key, &default).await?;
        Ok(default)
    }

    /// Sets `key` to `value` and persists the session.
    ///
    /// # Example
    ///
    /// ```rust
    /// use axum::{Router, routing::get};
    /// use sessio::Session;
    /// use sessio::store::MemoryStore;
    ///
    /// let _: Router<()> = Router::new()
    ///     .route("/set", get(|session: Session<MemoryStore>| async move {
    ///         session.set("theme", &"dark").await.unwrap();
    ///     }));
    /// ```
    #[tracing::instrument(name = "setting session value", skip(self, key, value))]
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<&Self>
    where
        T: Serialize + Sync + ?Sized,
    {
        let _guard = self.inner.write_lock.lock().await;
        let snapshot = {
            let mut record = self.inner.record.write();
            record.data.insert(key, value).map_err(|err| {
                tracing::error!(err = %err, key, "failed to encode session value");
                err
            })?;
            record.clone()
        };

        self.persist(&snapshot).await?;
        Ok(self)
    }

    /// Removes `key` and persists the session.
    ///
    /// Persisting happens even when `key` was absent, so `set` and `remove`
    /// leave the store in the same state as the in-memory record.
    #[tracing::instrument(name = "removing session value", skip(self, key))]
    pub async fn remove(&self, key: &str) -> Result<&Self> {
        let _guard = self.inner.write_lock.lock().await;
        let snapshot = {
            let mut record = self.inner.record.write();
            record.data.remove(key);
            record.clone()
        };

        self.persist(&snapshot).await?;
        Ok(self)
    }

    /// Whether a value is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.record.read().data.contains_key(key)
    }

    async fn persist(&self, snapshot: &Record) -> Result<()> {
        self.inner.store.persist(snapshot).await.map_err(|err| {
            tracing::error!(err = %err, "failed to persist session to store");
            err.into()
        })
    }
}

/// `false` when there is no session or `key` is not set on it.
pub fn is_set<S: SessionStore>(session: Option<&Session<S>>, key: &str) -> bool {
    session.is_some_and(|session| session.contains(key))
}
