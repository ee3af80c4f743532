//! The persistence boundary for session state.
//!
//! A [`SessionStore`] only has to know how to `load` a [`Record`] by id and how to
//! `persist` a record's whole data map. Everything else (expiry, batching, locking)
//! is the backend's business.

use std::collections::HashMap;
use std::future::Future;

use serde::{Serialize, de::DeserializeOwned};

use crate::Id;

pub mod memory;
pub use memory::MemoryStore;

pub mod serialized;
pub use serialized::SerializedStore;

#[cfg(feature = "redis-store")]
pub mod redis;

#[cfg(feature = "postgres-store")]
pub mod postgres;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Encoding failed with: {0}")]
    Encode(String),

    #[error("Decoding failed with: {0}")]
    Decode(String),

    #[error("{0}")]
    Backend(String),
}

#[cfg(feature = "redis-store")]
impl From<fred::error::Error> for Error {
    fn from(err: fred::error::Error) -> Self {
        Error::Backend(err.to_string())
    }
}

#[cfg(feature = "postgres-store")]
impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Backend(err.to_string())
    }
}

#[cfg(feature = "bincode")]
pub(crate) fn serialize_value<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, Error> {
    bincode::serde::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| Error::Encode(e.to_string()))
}

#[cfg(feature = "bincode")]
pub(crate) fn deserialize_value<T: DeserializeOwned>(value: &[u8]) -> Result<T, Error> {
    bincode::serde::decode_from_slice(value, bincode::config::standard())
        .map(|(value, _)| value)
        .map_err(|e| Error::Decode(e.to_string()))
}

#[cfg(all(feature = "messagepack", not(feature = "bincode")))]
pub(crate) fn serialize_value<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, Error> {
    rmp_serde::to_vec(value).map_err(|e| Error::Encode(e.to_string()))
}

#[cfg(all(feature = "messagepack", not(feature = "bincode")))]
pub(crate) fn deserialize_value<T: DeserializeOwned>(value: &[u8]) -> Result<T, Error> {
    rmp_serde::from_slice(value).map_err(|e| Error::Decode(e.to_string()))
}

/// The encoded key/value state of one session. Values are decoded on access.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionMap(HashMap<String, Vec<u8>>);

impl SessionMap {
    pub fn new(map: HashMap<String, Vec<u8>>) -> Self {
        Self(map)
    }

    /// Decodes the value stored under `key`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, Error> {
        self.0
            .get(key)
            .map(|bytes| deserialize_value(bytes))
            .transpose()
    }

    pub fn insert<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), Error> {
        let encoded = serialize_value(value)?;
        self.0.insert(key.to_string(), encoded);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.0.remove(key).is_some()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw `(key, encoded value)` pairs, for stores writing the map out.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<u8>)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &HashMap<String, Vec<u8>> {
        &self.0
    }

    pub fn into_inner(self) -> HashMap<String, Vec<u8>> {
        self.0
    }
}

/// A session as seen by a store: its id and its whole data map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub id: Id,
    pub data: SessionMap,
}

impl Record {
    /// A record with no data, as returned for ids the store has never seen.
    pub fn new(id: Id) -> Self {
        Self {
            id,
            data: SessionMap::default(),
        }
    }

    pub fn with_data(id: Id, data: SessionMap) -> Self {
        Self { id, data }
    }
}

pub trait SessionStore: Clone + Send + Sync + 'static {
    /// Loads the record stored at `session_id`.
    ///
    /// An unknown id is not an error: it yields a [`Record`] with empty data.
    fn load(&self, session_id: &Id) -> impl Future<Output = Result<Record, Error>> + Send;

    /// Replaces everything stored at `record.id` with `record.data`.
    ///
    /// Must be idempotent. An empty data map may be treated as a deletion.
    fn persist(&self, record: &Record) -> impl Future<Output = Result<(), Error>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_map_typed_access() {
        let mut map = SessionMap::default();
        map.insert("count", &3u32).unwrap();
        map.insert("name", "jane").unwrap();

        assert_eq!(map.get::<u32>("count").unwrap(), Some(3));
        assert_eq!(map.get::<String>("name").unwrap().as_deref(), Some("jane"));
        assert_eq!(map.get::<String>("missing").unwrap(), None);

        assert!(map.remove("count"));
        assert!(!map.remove("count"));
        assert_eq!(map.len(), 1);
    }
}
