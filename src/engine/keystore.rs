//! Roster Keystore Module
//! OS keyring storage for the GitHub org access token

use keyring::Entry;
use thiserror::Error;

const SERVICE_NAME: &str = "roster";
const TOKEN_USER: &str = "github_token";

/// Environment override for headless runs (CI, cron) where no keyring exists.
pub const TOKEN_ENV: &str = "ROSTER_GITHUB_TOKEN";

#[derive(Error, Debug)]
pub enum KeystoreError {
    #[error("Keyring error: {0}")]
    KeyringError(String),
    #[error("GitHub token not set")]
    TokenNotSet,
}

pub struct Keystore;

impl Keystore {
    /// Store the GitHub token in the OS keyring
    pub fn store_github_token(token: &str) -> Result<(), KeystoreError> {
        let entry = Entry::new(SERVICE_NAME, TOKEN_USER)
            .map_err(|e| KeystoreError::KeyringError(e.to_string()))?;
        entry
            .set_password(token)
            .map_err(|e| KeystoreError::KeyringError(e.to_string()))?;
        Ok(())
    }

    /// Retrieve the GitHub token, preferring the environment override
    pub fn get_github_token() -> Result<String, KeystoreError> {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.trim().is_empty() {
                return Ok(token);
            }
        }
        let entry = Entry::new(SERVICE_NAME, TOKEN_USER)
            .map_err(|e| KeystoreError::KeyringError(e.to_string()))?;
        entry.get_password().map_err(|e| match e {
            keyring::Error::NoEntry => KeystoreError::TokenNotSet,
            other => KeystoreError::KeyringError(other.to_string()),
        })
    }

    /// Delete the GitHub token from the OS keyring
    pub fn delete_github_token() -> Result<(), KeystoreError> {
        let entry = Entry::new(SERVICE_NAME, TOKEN_USER)
            .map_err(|e| KeystoreError::KeyringError(e.to_string()))?;
        entry
            .delete_credential()
            .map_err(|e| KeystoreError::KeyringError(e.to_string()))?;
        Ok(())
    }

    /// Whether a token is available from either source
    pub fn has_github_token() -> bool {
        Self::get_github_token().is_ok()
    }
}
