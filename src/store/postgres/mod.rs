use std::collections::HashMap;

use sqlx::PgPool;
use time::OffsetDateTime;

use crate::Id;
use crate::store::{Error, Record, SessionMap, SessionStore, deserialize_value, serialize_value};

// Re-export Duration
pub use tokio::time::Duration;

/// A builder for creating a `PostgresStore`.
///
/// This allows for customizing the table and schema names for session storage.
#[derive(Debug)]
pub struct PostgresStoreBuilder {
    pool: PgPool,
    table_name: String,
    create_table: bool,
    schema_name: Option<String>,
    expiry: Option<i64>,
    cleanup_interval: Option<Duration>,
}

impl PostgresStoreBuilder {
    /// Creates a new builder with a database pool and default settings.
    pub fn new(pool: PgPool, create_table: bool) -> Self {
        Self {
            pool,
            table_name: "t_sessions".to_string(),
            create_table,
            schema_name: None,
            expiry: None,
            cleanup_interval: None,
        }
    }

    /// Sets a custom table name for the session store. Defaults to "t_sessions".
    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Sets a custom schema name for the session store.
    pub fn schema_name(mut self, schema_name: impl Into<String>) -> Self {
        self.schema_name = Some(schema_name.into());
        self
    }

    /// Expire sessions `seconds` after their last persist.
    pub fn expiry(mut self, seconds: i64) -> Self {
        self.expiry = (seconds > 0).then_some(seconds);
        self
    }

    /// Sets the interval for the background task that cleans up expired sessions.
    ///
    /// If this is not set, the cleanup task defaults to running every 5 minutes.
    /// The task is only spawned when an expiry is configured.
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    /// Builds the `PostgresStore`, creating the schema and table if they don't exist.
    pub async fn build(self) -> Result<PostgresStore, sqlx::Error> {
        let table_name = if let Some(schema) = &self.schema_name {
            format!("\"{}\".\"{}\"", schema, self.table_name)
        } else {
            format!("\"{}\"", self.table_name)
        };

        if self.create_table {
            if let Some(schema) = &self.schema_name {
                sqlx::query(&format!("create schema if not exists \"{schema}\""))
                    .execute(&self.pool)
                    .await?;
            }

            sqlx::raw_sql(&format!(
                r#"
                create table if not exists {table_name} (
                    session_id text primary key,
                    data bytea not null,
                    expires_at timestamptz
                );
                create index if not exists idx_{index}_expires_at on {table_name}(expires_at);
                "#,
                index = self.table_name
            ))
            .execute(&self.pool)
            .await?;
        }

        if self.expiry.is_some() {
            let pool = self.pool.clone();
            let table = table_name.clone();
            let interval = self.cleanup_interval.unwrap_or(Duration::from_secs(300));

            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                loop {
                    ticker.tick().await;
                    if let Err(err) = sqlx::query(&format!(
                        "delete from {table} where expires_at is not null and expires_at < now()"
                    ))
                    .execute(&pool)
                    .await
                    {
                        tracing::warn!(err = %err, "failed to clean up expired sessions");
                    }
                }
            });
        }

        Ok(PostgresStore {
            pool: self.pool,
            table_name,
            expiry: self.expiry,
        })
    }
}

/// A Postgres-backed session store.
///
/// One row per session; the data map is stored encoded in a single `bytea` column.
#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: PgPool,
    table_name: String,
    expiry: Option<i64>,
}

impl SessionStore for PostgresStore {
    async fn load(&self, session_id: &Id) -> Result<Record, Error> {
        let query = format!(
            r#"
            select data from {table}
            where session_id = $1
              and (expires_at is null or expires_at > now())
            "#,
            table = self.table_name
        );

        let row: Option<(Vec<u8>,)> = sqlx::query_as(&query)
            .bind(session_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some((data,)) => {
                let map: HashMap<String, Vec<u8>> = deserialize_value(&data)?;
                Ok(Record::with_data(session_id.clone(), SessionMap::new(map)))
            }
            None => Ok(Record::new(session_id.clone())),
        }
    }

    async fn persist(&self, record: &Record) -> Result<(), Error> {
        if record.data.is_empty() {
            sqlx::query(&format!(
                "delete from {table} where session_id = $1",
                table = self.table_name
            ))
            .bind(record.id.as_str())
            .execute(&self.pool)
            .await?;
            return Ok(());
        }

        let data = serialize_value(record.data.as_map())?;
        let expires_at = self
            .expiry
            .map(|seconds| OffsetDateTime::now_utc() + time::Duration::seconds(seconds));

        let query = format!(
            r#"
            insert into {table} (session_id, data, expires_at)
            values ($1, $2, $3)
            on conflict (session_id)
            do update set data = excluded.data, expires_at = excluded.expires_at
            "#,
            table = self.table_name
        );

        sqlx::query(&query)
            .bind(record.id.as_str())
            .bind(data)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
