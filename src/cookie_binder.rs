//! Resolving the session id from cookies and writing it back.

use std::sync::Arc;

use cookie::time::Duration;
use http::HeaderMap;
use http::header::COOKIE;
use tower_cookies::{Cookie, Cookies};

use crate::session::Error;
use crate::store::SessionStore;
use crate::{Id, IdGenerator, Session, SessionConfig};

/// Binds session ids to clients through the configured cookie.
#[derive(Debug)]
pub struct CookieBinder {
    config: Arc<SessionConfig>,
    generator: IdGenerator,
}

impl CookieBinder {
    pub fn new(config: Arc<SessionConfig>) -> Self {
        let generator = IdGenerator::from_config(&config);
        Self { config, generator }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn cookie_name(&self) -> &str {
        &self.config.cookie_options.name
    }

    /// The session cookie sent by the client, if it carries a value.
    pub fn request_cookie(&self, headers: &HeaderMap) -> Option<String> {
        let name = self.cookie_name();

        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == name && !cookie.value().is_empty())
            .map(|cookie| cookie.value().to_string())
    }

    /// The session cookie already queued on the response jar, if any.
    ///
    /// The jar also answers with request cookies, so this is only meaningful
    /// once [`CookieBinder::request_cookie`] came back empty.
    pub fn response_cookie(&self, cookies: &Cookies) -> Option<String> {
        cookies
            .get(self.cookie_name())
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Picks the request cookie, then the response cookie, then a fresh id.
    pub fn resolve_id(&self, request: Option<&str>, response: Option<&str>) -> Result<Id, Error> {
        if let Some(id) = request.and_then(Id::parse) {
            return Ok(id);
        }

        if let Some(id) = response.and_then(Id::parse) {
            return Ok(id);
        }

        tracing::debug!("no session cookie present, minting a new id");
        self.generator.generate()
    }

    /// Mints a fresh id without looking at any cookie.
    pub fn new_id(&self) -> Result<Id, Error> {
        self.generator.generate()
    }

    pub fn build_cookie(&self, id: &Id) -> Cookie<'static> {
        let options = &self.config.cookie_options;

        let cookie_builder = Cookie::build((options.name.clone(), id.to_string()))
            .secure(self.config.cookie_secure())
            .http_only(options.http_only)
            .same_site(options.same_site);

        let cookie_builder = if let Some(max_age) = options.max_age {
            cookie_builder.max_age(Duration::seconds(max_age))
        } else {
            cookie_builder
        };

        let cookie_builder = if let Some(domain) = options.domain.clone() {
            cookie_builder.domain(domain)
        } else {
            cookie_builder
        };

        let cookie_builder = if let Some(path) = options.path.clone() {
            cookie_builder.path(path)
        } else {
            cookie_builder
        };

        cookie_builder.build()
    }

    /// Queues the session cookie for `id` on the response.
    pub fn bind(&self, id: &Id, cookies: &Cookies) {
        cookies.add(self.build_cookie(id));
    }

    /// Binds `id` to the response and establishes the session stored under it.
    pub async fn start<S: SessionStore>(
        &self,
        id: Id,
        cookies: &Cookies,
        store: Arc<S>,
    ) -> Result<Session<S>, Error> {
        self.bind(&id, cookies);
        Session::establish(id, store).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::id::ID_LEN;
    use crate::{CookieOptions, Environment};
    use cookie::SameSite;
    use http::HeaderValue;

    fn binder() -> CookieBinder {
        CookieBinder::new(Arc::new(
            SessionConfig::build()
                .secret_token("secret")
                .environment(Environment::Test),
        ))
    }

    #[test]
    fn test_request_cookie_takes_precedence() {
        let id = binder().resolve_id(Some("from-request"), Some("from-response")).unwrap();
        assert_eq!(id.as_str(), "from-request");
    }

    #[test]
    fn test_response_cookie_is_fallback() {
        let binder = binder();
        assert_eq!(
            binder.resolve_id(None, Some("from-response")).unwrap().as_str(),
            "from-response"
        );
        assert_eq!(
            binder.resolve_id(Some(""), Some("from-response")).unwrap().as_str(),
            "from-response"
        );
    }

    #[test]
    fn test_missing_cookies_mint_new_id() {
        let binder = binder();
        let first = binder.resolve_id(None, Some("")).unwrap();
        let second = binder.resolve_id(None, None).unwrap();

        assert_eq!(first.as_str().len(), ID_LEN);
        assert_ne!(first, second);
    }

    #[test]
    fn test_request_cookie_parsing() {
        let binder = binder();
        let mut headers = HeaderMap::new();
        assert_eq!(binder.request_cookie(&headers), None);

        headers.append(COOKIE, HeaderValue::from_static("theme=dark; __geniesid="));
        assert_eq!(binder.request_cookie(&headers), None);

        headers.append(COOKIE, HeaderValue::from_static("lang=en; __geniesid=abc123"));
        assert_eq!(binder.request_cookie(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_build_cookie_attributes() {
        let binder = CookieBinder::new(Arc::new(
            SessionConfig::build().secret_token("secret").ssl(true).cookie_options(
                CookieOptions::build()
                    .name("sid")
                    .secure(true)
                    .same_site(SameSite::Strict)
                    .domain("example.com")
                    .max_age(60),
            ),
        ));
        let cookie = binder.build_cookie(&Id::parse("xyz").unwrap());

        assert_eq!(cookie.name(), "sid");
        assert_eq!(cookie.value(), "xyz");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.domain(), Some("example.com"));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(60)));
    }

    #[test]
    fn test_ssl_sets_secure_when_options_are_replaced() {
        let binder = CookieBinder::new(Arc::new(
            SessionConfig::build()
                .secret_token("secret")
                .environment(Environment::Production)
                .ssl(true)
                .cookie_options(CookieOptions::build().name("sid").max_age(3600)),
        ));
        let cookie = binder.build_cookie(&Id::parse("x").unwrap());

        assert_eq!(cookie.name(), "sid");
        assert_eq!(cookie.secure(), Some(true));
    }
}
