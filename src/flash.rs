//! One-shot flash messages.
//!
//! A flash message is stored under [`FLASH_KEY`] in the session. When the next
//! request establishes the session it is moved out of the store into that
//! request's [`Flash`] slot, so it is seen exactly once.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::Session;
use crate::session::Error;
use crate::store::SessionStore;

/// Session key reserved for the pending flash message.
pub const FLASH_KEY: &str = ":flash";

/// The flash message visible to the current request.
///
/// Shared between the [`Session`] and the request extensions; an empty string
/// means there is no message.
#[derive(Clone, Debug, Default)]
pub struct Flash {
    message: Arc<RwLock<String>>,
}

impl Flash {
    /// The current message, or an empty string.
    pub fn get(&self) -> String {
        self.message.read().clone()
    }

    pub fn is_set(&self) -> bool {
        !self.message.read().is_empty()
    }

    fn replace(&self, message: String) {
        *self.message.write() = message;
    }
}

impl<S> Session<S>
where
    S: SessionStore,
{
    /// Stores a flash message for the next request and makes it visible to this one.
    #[tracing::instrument(name = "setting flash message", skip(self, value))]
    pub async fn set_flash(&self, value: impl Into<String>) -> Result<String, Error> {
        let value = value.into();
        self.set(FLASH_KEY, &value).await?;
        self.flash_slot().replace(value.clone());
        Ok(value)
    }

    /// The flash message of the current request. Does not read the store.
    pub fn flash(&self) -> String {
        self.flash_slot().get()
    }

    pub fn has_flash(&self) -> bool {
        self.flash_slot().is_set()
    }

    /// Moves a pending flash message from the session into the request slot.
    ///
    /// A value under [`FLASH_KEY`] that does not decode as a string is dropped
    /// so it cannot fail every later request for this session.
    pub(crate) async fn drain_flash(&self) -> Result<(), Error> {
        if !self.contains(FLASH_KEY) {
            self.flash_slot().replace(String::new());
            return Ok(());
        }

        let message = match self.get::<String>(FLASH_KEY) {
            Ok(message) => message.unwrap_or_default(),
            Err(err) => {
                tracing::warn!(err = %err, "discarding undecodable flash message");
                String::new()
            }
        };

        self.remove(FLASH_KEY).await?;
        tracing::debug!("drained pending flash message");
        self.flash_slot().replace(message);

        Ok(())
    }
}
