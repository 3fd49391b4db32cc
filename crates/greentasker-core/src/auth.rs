use thiserror::Error;
use tracing::{info, warn};

use crate::storage::StoreError;

pub const DEFAULT_PASSWORD: &str = "greentasker";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Incorrect password. Please try again.")]
    Mismatch,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Shared static secret guarding the list. Not a credential system.
#[derive(Debug, Clone)]
pub struct Gate {
    secret: String,
}

impl Gate {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn check(&self, attempt: &str) -> Result<(), AuthError> {
        if attempt == self.secret {
            info!("password accepted");
            Ok(())
        } else {
            warn!("password rejected");
            Err(AuthError::Mismatch)
        }
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new(DEFAULT_PASSWORD)
    }
}
