use std::fmt::{self, Display};
use std::str::FromStr;
use std::sync::OnceLock;

use rand::TryRngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, Environment, SessionConfig};
use crate::session::Error;

/// Length of a generated id: a hex-encoded 32-byte BLAKE3 digest.
pub const ID_LEN: usize = blake3::OUT_LEN * 2;

/// An opaque, non-empty session identifier.
#[derive(Clone, Debug, Deserialize, Serialize, Eq, Hash, PartialEq)]
pub struct Id(String);

impl Id {
    /// Wraps a cookie-supplied value. Returns `None` for an empty string.
    pub fn parse(id: &str) -> Option<Self> {
        if id.is_empty() {
            None
        } else {
            Some(Self(id.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Id {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or(Error::EmptyId)
    }
}

impl AsRef<str> for Id {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "redis-store")]
impl From<&Id> for fred::types::Key {
    fn from(value: &Id) -> Self {
        value.as_str().into()
    }
}

/// Mints session ids by hashing the secret token together with 128 bits of OS randomness.
pub struct IdGenerator {
    secret_token: String,
    environment: Environment,
    ephemeral_token: OnceLock<String>,
}

impl fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdGenerator")
            .field("environment", &self.environment)
            .field("ephemeral", &self.ephemeral_token.get().is_some())
            .finish_non_exhaustive()
    }
}

impl IdGenerator {
    pub fn new(secret_token: impl Into<String>, environment: Environment) -> Self {
        Self {
            secret_token: secret_token.into(),
            environment,
            ephemeral_token: OnceLock::new(),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.secret_token.clone(), config.environment)
    }

    /// Generates a fresh session id.
    ///
    /// Without a secret token this fails in production; elsewhere an ephemeral
    /// token is created once and reused for the lifetime of the generator.
    #[tracing::instrument(name = "generating session id", skip(self))]
    pub fn generate(&self) -> Result<Id, Error> {
        let secret = self.secret()?;

        let mut bytes = [0u8; 16];
        OsRng.try_fill_bytes(&mut bytes).map_err(|err| {
            tracing::error!(err = %err, "failed to read from the OS random source");
            Error::Entropy(err.to_string())
        })?;

        let mut hasher = blake3::Hasher::new();
        hasher.update(secret.as_bytes());
        hasher.update(&bytes);

        Ok(Id(hasher.finalize().to_hex().to_string()))
    }

    fn secret(&self) -> Result<&str, Error> {
        if !self.secret_token.is_empty() {
            return Ok(self.secret_token.as_str());
        }

        if self.environment.is_production() {
            tracing::error!("no secret token configured for a production deployment");
            return Err(ConfigError::MissingSecretToken.into());
        }

        if let Some(token) = self.ephemeral_token.get() {
            return Ok(token.as_str());
        }

        let mut seed = [0u8; 32];
        OsRng.try_fill_bytes(&mut seed).map_err(|err| {
            tracing::error!(err = %err, "failed to read from the OS random source");
            Error::Entropy(err.to_string())
        })?;

        let token = self.ephemeral_token.get_or_init(|| {
            tracing::warn!(
                environment = %self.environment,
                "no secret token configured, using an ephemeral token until restart"
            );
            blake3::hash(&seed).to_hex().to_string()
        });

        Ok(token.as_str())
    }
}
