//! The registered user record.

use crate::error::{RegistryError, RegistryResult};
use serde::{Deserialize, Serialize};

/// One registered end-user.
///
/// Records are never mutated once stored in the registry. Every accessor on
/// [`crate::Registry`] hands out an owned clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserRecord {
    /// Platform-assigned identity (Telegram user id)
    pub user_id: String,

    /// Bearer token authorizing delivery to this user
    pub token: String,

    /// Destination for outbound messages (Telegram chat id)
    pub delivery_address: String,
}

impl UserRecord {
    /// Create a record, rejecting empty fields.
    pub fn new(
        user_id: impl Into<String>,
        token: impl Into<String>,
        delivery_address: impl Into<String>,
    ) -> RegistryResult<Self> {
        let record = Self {
            user_id: user_id.into(),
            token: token.into(),
            delivery_address: delivery_address.into(),
        };
        record.validate().map_err(RegistryError::InvalidArgument)?;
        Ok(record)
    }

    /// Check that no field is empty.
    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        if self.user_id.is_empty() {
            return Err("user_id must not be empty");
        }
        if self.token.is_empty() {
            return Err("token must not be empty");
        }
        if self.delivery_address.is_empty() {
            return Err("delivery_address must not be empty");
        }
        Ok(())
    }
}
