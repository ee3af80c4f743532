//! # Sessio: cookie-bound sessions with flash messages for tower
//!
//! `sessio` gives every client an unguessable session id, keeps key/value state
//! for that id in a pluggable store, binds the id to the client with a cookie and
//! offers a one-shot flash message channel on top.
//!
//! # Quick Start
//!
//! Here's a basic example with [Axum](https://docs.rs/axum/latest/axum/) and the
//! in-memory store.
//!
//! ```rust,no_run
//! use axum::{Router, routing::get};
//! use sessio::{Environment, Session, SessionConfig, SessionLayer};
//! use sessio::store::MemoryStore;
//! use std::sync::Arc;
//! use tower_cookies::CookieManagerLayer;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Built once at startup, shared by the layer and its cookie binder
//!     let config = SessionConfig::from_env().expect("invalid session configuration");
//!
//!     let session_layer = SessionLayer::new(Arc::new(MemoryStore::new()))
//!         .with_config(Arc::new(config));
//!
//!     let app = Router::new()
//!         .route("/", get(handler))
//!         .layer(session_layer)
//!         .layer(CookieManagerLayer::new()); // CookieManagerLayer must be after
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//!
//! async fn handler(session: Session<MemoryStore>) -> String {
//!     let count: u32 = session.get_or("count", 0).unwrap();
//!     session.set("count", &(count + 1)).await.unwrap();
//!     format!("You've visited this page {} times", count + 1)
//! }
//! ```
//!
//! # Session Management
//!
//! ```rust,no_run
//! use sessio::{Session, is_set};
//! use sessio::store::MemoryStore;
//!
//! async fn handler(session: Session<MemoryStore>) {
//! // Read a value, `None` when absent
//! let theme: Option<String> = session.get("theme").unwrap();
//!
//! // Read with a fallback, never writes
//! let lang: String = session.get_or("lang", "en".to_string()).unwrap();
//!
//! // Read, storing the default when absent
//! let cart: Vec<u32> = session.get_or_set("cart", Vec::new()).await.unwrap();
//!
//! // Every mutation is persisted before it returns
//! session.set("theme", &"dark").await.unwrap();
//! session.remove("theme").await.unwrap();
//!
//! assert!(!is_set(Some(&session), "theme"));
//! # }
//! ```
//!
//! # Flash Messages
//!
//! ```rust,no_run
//! use sessio::{Flash, Session};
//! use sessio::store::MemoryStore;
//!
//! async fn save(session: Session<MemoryStore>) {
//!     // Visible now through `session.flash()` and once more on the next request
//!     session.set_flash("Saved!").await.unwrap();
//! }
//!
//! async fn show(flash: Flash) -> String {
//!     flash.get()
//! }
//! ```
//!
//! # Stores
//!
//! A store implements [`store::SessionStore`]: `load` a record by id and
//! `persist` a record's whole data map. Stores own expiry.
//!
//! - [`store::MemoryStore`] (always available).
//! - `store::redis::RedisStore` with the `redis-store` feature.
//! - `store::postgres::PostgresStore` with the `postgres-store` feature.
//! - [`store::SerializedStore`] wraps any store and serializes writes per session id.
//!
//! ## Serialization
//! Session values are stored encoded with one of:
//!
//! - [`bincode`](https://crates.io/crates/bincode) (default)
//! - [`rmp-serde`](https://crates.io/crates/rmp-serde) (MessagePack)
//!
//! # Important Notes
//!
//! ## Middleware Ordering
//! The `SessionLayer` must be applied **before** the `CookieManagerLayer`.
//!
//! ## Secret Token
//! Ids are derived from the configured secret token. A production
//! [`SessionConfig`] without one is rejected; elsewhere an ephemeral token is
//! generated and a warning is logged.

pub use cookie;

#[cfg(feature = "axum")]
mod extract;

#[cfg(feature = "redis-store")]
pub use fred;

#[cfg(feature = "postgres-store")]
pub use sqlx;

mod config;
pub use config::*;

mod cookie_binder;
pub use cookie_binder::CookieBinder;

mod flash;
pub use flash::{FLASH_KEY, Flash};

mod service;
pub use service::*;

mod session;
pub use session::*;

pub mod store;

pub use tower_cookies;
