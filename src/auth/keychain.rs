// Keychain storage for authentication data

use keyring::Entry;
use serde::{Deserialize, Serialize};

use crate::error::Result;

const KEYCHAIN_SERVICE: &str = "drivetunes";
const KEYCHAIN_AUTH_KEY: &str = "auth_data";

/// Stored Google Drive credentials
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StoredAuth {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: i64,
}

impl StoredAuth {
    /// True when the access token is still valid for at least `margin_secs`
    pub fn is_fresh(&self, now: i64, margin_secs: i64) -> bool {
        self.expires_at >= now + margin_secs
    }
}

/// Get a value from the system keychain
fn get_keychain_entry(key: &str) -> Option<String> {
    let entry = Entry::new(KEYCHAIN_SERVICE, key).ok()?;
    entry.get_password().ok()
}

/// Set a value in the system keychain
fn set_keychain_entry(key: &str, value: &str) -> Result<()> {
    let entry = Entry::new(KEYCHAIN_SERVICE, key)?;
    entry.set_password(value)?;
    Ok(())
}

/// Delete a value from the system keychain
fn delete_keychain_entry(key: &str) -> Result<()> {
    let entry = Entry::new(KEYCHAIN_SERVICE, key)?;
    // Ignore error if entry doesn't exist
    let _ = entry.delete_password();
    Ok(())
}

/// Save authentication data to the system keychain
pub fn save_auth_to_keychain(auth: &StoredAuth) -> Result<()> {
    let json = serde_json::to_string(auth)?;
    set_keychain_entry(KEYCHAIN_AUTH_KEY, &json)
}

/// Retrieve authentication data from the system keychain
pub fn get_auth_from_keychain() -> Option<StoredAuth> {
    let json = get_keychain_entry(KEYCHAIN_AUTH_KEY)?;
    serde_json::from_str(&json).ok()
}

/// Clear authentication data from the system keychain
pub fn clear_auth_from_keychain() -> Result<()> {
    delete_keychain_entry(KEYCHAIN_AUTH_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_fresh() {
        let auth = StoredAuth {
            access_token: "token".into(),
            refresh_token: None,
            expires_at: 1_000,
        };
        assert!(auth.is_fresh(600, 300));
        assert!(auth.is_fresh(700, 300));
        assert!(!auth.is_fresh(701, 300));
    }
}
