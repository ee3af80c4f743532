//! Application-level session configuration.
//!
//! A [`SessionConfig`] is built once at startup and shared by reference into the
//! [`CookieBinder`](crate::CookieBinder) and the [`SessionLayer`](crate::SessionLayer).

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::CookieOptions;

/// Name of the session cookie when none is configured.
pub const DEFAULT_COOKIE_NAME: &str = "__geniesid";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no secret token configured")]
    MissingSecretToken,
    #[error("unknown environment `{0}`")]
    InvalidEnvironment(String),
}

/// The deployment environment the application runs in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "prod" | "production" => Ok(Environment::Production),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        })
    }
}

/// Session settings shared by the cookie binder and the middleware.
///
/// # Example
///
/// ```rust
/// use sessio::{CookieOptions, Environment, SessionConfig};
///
/// let config = SessionConfig::build()
///     .secret_token("a-long-random-secret")
///     .environment(Environment::Production)
///     .ssl(true)
///     .cookie_options(CookieOptions::build().name("sid").max_age(3600));
/// ```
#[derive(Clone)]
pub struct SessionConfig {
    pub secret_token: String,
    pub environment: Environment,
    /// Whether the deployment serves over encrypted transport.
    pub ssl: bool,
    pub cookie_options: CookieOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret_token: String::new(),
            environment: Environment::default(),
            ssl: false,
            cookie_options: CookieOptions::default(),
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret_token", &"[redacted]")
            .field("environment", &self.environment)
            .field("ssl", &self.ssl)
            .field("cookie_options", &self.cookie_options)
            .finish()
    }
}

impl SessionConfig {
    /// Creates a new `SessionConfig` with default values.
    pub fn build() -> Self {
        Self::default()
    }

    pub fn secret_token(mut self, secret_token: impl Into<String>) -> Self {
        self.secret_token = secret_token.into();
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Sets the encrypted-transport flag. The cookie `Secure` attribute follows it
    /// unless the cookie options set one explicitly.
    pub fn ssl(mut self, ssl: bool) -> Self {
        self.ssl = ssl;
        self
    }

    pub fn cookie_options(mut self, cookie_options: CookieOptions) -> Self {
        self.cookie_options = cookie_options;
        self
    }

    /// Reads the configuration from `SESSION_SECRET_TOKEN`, `SESSION_ENV`,
    /// `SESSION_SSL` and `SESSION_COOKIE_NAME`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("SESSION_ENV") {
            Some(value) => value.parse()?,
            None => Environment::default(),
        };
        let ssl = lookup("SESSION_SSL")
            .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let mut config = Self::build()
            .secret_token(lookup("SESSION_SECRET_TOKEN").unwrap_or_default())
            .environment(environment)
            .ssl(ssl);

        if let Some(name) = lookup("SESSION_COOKIE_NAME").filter(|name| !name.is_empty()) {
            config.cookie_options = config.cookie_options.name(name);
        }

        config.validate()?;
        Ok(config)
    }

    /// The `Secure` attribute the session cookie is sent with.
    pub fn cookie_secure(&self) -> bool {
        self.cookie_options.secure.unwrap_or(self.ssl)
    }

    /// Fails when a production deployment has no secret token.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret_token.is_empty() && self.environment.is_production() {
            return Err(ConfigError::MissingSecretToken);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("Production".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!("test".parse::<Environment>().unwrap(), Environment::Test);
        assert_eq!(
            "staging".parse::<Environment>(),
            Err(ConfigError::InvalidEnvironment("staging".to_string()))
        );
    }

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.cookie_options.name, DEFAULT_COOKIE_NAME);
        assert_eq!(config.cookie_options.path.as_deref(), Some("/"));
        assert!(config.cookie_options.http_only);
        assert_eq!(config.cookie_options.secure, None);
        assert!(!config.cookie_secure());
        assert_eq!(config.environment, Environment::Development);
    }

    #[test]
    fn test_ssl_drives_secure_flag() {
        let config = SessionConfig::build().ssl(true);
        assert!(config.cookie_secure());
    }

    #[test]
    fn test_ssl_survives_replaced_cookie_options() {
        let config = SessionConfig::build()
            .ssl(true)
            .cookie_options(CookieOptions::build().name("sid").max_age(3600));
        assert!(config.cookie_secure());

        let config = SessionConfig::build()
            .cookie_options(CookieOptions::build().name("sid"))
            .ssl(true);
        assert!(config.cookie_secure());
    }

    #[test]
    fn test_explicit_secure_overrides_ssl() {
        let config = SessionConfig::build()
            .ssl(true)
            .cookie_options(CookieOptions::build().secure(false));
        assert!(!config.cookie_secure());

        let config = SessionConfig::build().cookie_options(CookieOptions::build().secure(true));
        assert!(config.cookie_secure());
    }

    #[test]
    fn test_from_lookup() {
        let config = SessionConfig::from_lookup(lookup(&[
            ("SESSION_SECRET_TOKEN", "s3cr3t"),
            ("SESSION_ENV", "production"),
            ("SESSION_SSL", "true"),
            ("SESSION_COOKIE_NAME", "sid"),
        ]))
        .unwrap();

        assert_eq!(config.secret_token, "s3cr3t");
        assert!(config.environment.is_production());
        assert!(config.cookie_secure());
        assert_eq!(config.cookie_options.name, "sid");
    }

    #[test]
    fn test_from_lookup_rejects_production_without_secret() {
        let err = SessionConfig::from_lookup(lookup(&[("SESSION_ENV", "prod")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingSecretToken);

        assert!(SessionConfig::from_lookup(lookup(&[])).is_ok());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = SessionConfig::build().secret_token("hunter2");
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
