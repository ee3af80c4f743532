use cookie::SameSite;

use crate::config::DEFAULT_COOKIE_NAME;

/// Configuration options for session cookies.
///
/// # Example
///
/// ```rust
/// use sessio::CookieOptions;
///
/// let cookie_options = CookieOptions::build()
///         .name("test_sess")
///         .http_only(true)
///         .same_site(cookie::SameSite::Lax)
///         .secure(true)
///         .max_age(1 * 60)
///         .path("/");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookieOptions {
    pub http_only: bool,
    pub name: String,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub same_site: SameSite,
    /// Explicit `Secure` attribute. `None` follows [`SessionConfig::ssl`](crate::SessionConfig).
    pub secure: Option<bool>,
    /// Cookie lifetime in seconds. `None` makes it a browser-session cookie.
    pub max_age: Option<i64>,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            http_only: true,
            name: DEFAULT_COOKIE_NAME.to_string(),
            domain: None,
            path: Some("/".to_string()),
            same_site: SameSite::Lax,
            secure: None,
            max_age: None,
        }
    }
}

impl CookieOptions {
    /// Creates a new `CookieOptions` with default values.
    pub fn build() -> Self {
        Self::default()
    }

    /// Sets the name of the cookie.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }
}
