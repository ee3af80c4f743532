mod lua;

use std::collections::HashMap;
use std::{fmt::Debug, sync::Arc};

use fred::clients::Pool;
use fred::interfaces::{HashesInterface, KeysInterface};
use fred::prelude::LuaInterface;
use fred::types::Value;

use crate::Id;
use crate::store::redis::lua::{PERSIST_SCRIPT, PERSIST_SCRIPT_HASH};
use crate::store::{Error, Record, SessionMap, SessionStore};

/// A redis session store implementation.
///
/// Each session is a Redis Hash keyed by the session id, one hash field per
/// session key. A persist replaces the whole hash in a single Lua script so
/// readers never observe a half-written session.
#[derive(Clone, Debug)]
pub struct RedisStore<C: HashesInterface + KeysInterface + LuaInterface + Clone + Send + Sync = Pool>
{
    client: Arc<C>,
    expiry: Option<i64>,
}

impl<C> RedisStore<C>
where
    C: HashesInterface + KeysInterface + LuaInterface + Clone + Send + Sync,
{
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            expiry: None,
        }
    }

    /// Sets a ttl, refreshed on every persist, on each session hash.
    pub fn with_expiry(mut self, seconds: i64) -> Self {
        self.expiry = (seconds > 0).then_some(seconds);
        self
    }
}

impl<C> SessionStore for RedisStore<C>
where
    C: HashesInterface + KeysInterface + LuaInterface + Clone + Send + Sync + 'static,
{
    async fn load(&self, session_id: &Id) -> Result<Record, Error> {
        let fields = self
            .client
            .hgetall::<Option<HashMap<String, Vec<u8>>>, _>(session_id)
            .await?;

        Ok(match fields {
            Some(fields) => Record::with_data(session_id.clone(), SessionMap::new(fields)),
            None => Record::new(session_id.clone()),
        })
    }

    async fn persist(&self, record: &Record) -> Result<(), Error> {
        let client = &self.client;

        let hash = PERSIST_SCRIPT_HASH
            .get_or_try_init(|| async {
                let hash = fred::util::sha1_hash(PERSIST_SCRIPT);
                if !client.script_exists::<bool, _>(&hash).await? {
                    let _: () = client.script_load(PERSIST_SCRIPT).await?;
                }
                Ok::<String, fred::error::Error>(hash)
            })
            .await?;

        let mut args: Vec<Value> = Vec::with_capacity(record.data.len() * 2 + 1);
        args.push(Value::Integer(self.expiry.unwrap_or(-1)));
        for (field, value) in record.data.iter() {
            args.push(field.as_str().into());
            args.push(value.as_slice().into());
        }

        let result: Result<i64, fred::error::Error> =
            client.evalsha(hash, vec![&record.id], args.clone()).await;

        match result {
            Ok(_) => {}
            // The script cache was flushed or the server restarted.
            Err(err) if err.details().contains("NOSCRIPT") => {
                tracing::warn!("persist script missing from the server, reloading");
                let _: () = client.script_load(PERSIST_SCRIPT).await?;
                let _: i64 = client.evalsha(hash, vec![&record.id], args).await?;
            }
            Err(err) => return Err(err.into()),
        }

        Ok(())
    }
}
