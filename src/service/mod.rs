//! Session management middleware for tower applications.
//!
//! This module provides [`SessionLayer`] for integrating
//! session management into tower applications.
//!
//! For every request the service runs two hooks around the inner service:
//! [`start`] before routing, which resolves the id, loads the session, drains
//! the flash message and stores both in the request extensions, and [`finish`]
//! before the response leaves, which writes the final id back to the cookie.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use http::{Request, Response, StatusCode};
use tower::{Layer, Service};
use tower_cookies::Cookies;

use crate::session::Error;
use crate::store::{MemoryStore, SessionStore};
use crate::{CookieBinder, Session, SessionConfig};

/// Pre-routing hook: establishes the session and exposes it to handlers.
///
/// Inserts the [`Session`] and its [`Flash`](crate::Flash) slot into the request
/// extensions and returns the session together with the cookie jar it was bound to.
#[tracing::instrument(name = "starting session", skip_all)]
pub async fn start<S, B>(
    binder: &CookieBinder,
    store: Arc<S>,
    req: &mut Request<B>,
) -> Result<(Session<S>, Cookies), Error>
where
    S: SessionStore,
{
    let cookies = req.extensions().get::<Cookies>().cloned().ok_or_else(|| {
        tracing::error!("cookies not found in the request extensions");
        Error::MissingCookies
    })?;

    let request_id = binder.request_cookie(req.headers());
    let response_id = binder.response_cookie(&cookies);
    let id = binder.resolve_id(request_id.as_deref(), response_id.as_deref())?;

    let session = binder.start(id, &cookies, store).await?;

    req.extensions_mut().insert(session.clone());
    req.extensions_mut().insert(session.flash_slot().clone());

    Ok((session, cookies))
}

/// Pre-response hook: makes sure the response cookie carries the session's id.
pub fn finish<S: SessionStore>(binder: &CookieBinder, session: &Session<S>, cookies: &Cookies) {
    binder.bind(&session.id(), cookies);
}

/// A Tower Middleware to use `Session`.
#[derive(Clone, Debug)]
pub struct SessionService<S, T: SessionStore = MemoryStore> {
    inner: S,
    binder: Arc<CookieBinder>,
    store: Arc<T>,
}

impl<S, T> SessionService<S, T>
where
    T: SessionStore,
{
    fn new(inner: S, binder: Arc<CookieBinder>, store: Arc<T>) -> Self {
        Self {
            inner,
            binder,
            store,
        }
    }
}

impl<ReqBody, ResBody, S, T> Service<Request<ReqBody>> for SessionService<S, T>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Default + Send + 'static,
    T: SessionStore,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    #[inline]
    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        // The ready service is the one we were handed; leave a fresh clone in its place.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let binder = Arc::clone(&self.binder);
        let store = Arc::clone(&self.store);

        Box::pin(async move {
            let (session, cookies) = match start(&binder, store, &mut req).await {
                Ok(started) => started,
                Err(err) => {
                    tracing::error!(err = %err, "failed to establish session");
                    let mut res = Response::new(ResBody::default());
                    *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                    return Ok(res);
                }
            };

            let res = inner.call(req).await?;
            finish(&binder, &session, &cookies);

            Ok::<_, S::Error>(res)
        })
    }
}

/// Layer to apply [`SessionService`] middleware.
///
/// Must be wrapped by [`tower_cookies::CookieManagerLayer`], i.e. added to the
/// router before it.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use sessio::{CookieOptions, Environment, SessionConfig, SessionLayer};
/// use sessio::store::MemoryStore;
///
/// let config = SessionConfig::build()
///     .secret_token("a-long-random-secret")
///     .environment(Environment::Production)
///     .ssl(true)
///     .cookie_options(CookieOptions::build().name("sid").secure(true));
///
/// let session_layer = SessionLayer::new(Arc::new(MemoryStore::new()))
///     .with_config(Arc::new(config));
/// ```
#[derive(Clone, Debug)]
pub struct SessionLayer<T: SessionStore> {
    binder: Arc<CookieBinder>,
    store: Arc<T>,
}

impl<T> SessionLayer<T>
where
    T: SessionStore,
{
    /// Create a new session layer with the default [`SessionConfig`].
    pub fn new(store: Arc<T>) -> Self {
        Self {
            binder: Arc::new(CookieBinder::new(Arc::new(SessionConfig::default()))),
            store,
        }
    }

    /// Set the configuration for the session layer.
    pub fn with_config(mut self, config: Arc<SessionConfig>) -> Self {
        self.binder = Arc::new(CookieBinder::new(config));
        self
    }

    pub fn binder(&self) -> &CookieBinder {
        &self.binder
    }
}

impl<S, T> Layer<S> for SessionLayer<T>
where
    T: SessionStore,
{
    type Service = SessionService<S, T>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionService::new(inner, Arc::clone(&self.binder), Arc::clone(&self.store))
    }
}
