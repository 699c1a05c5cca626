// Google Drive authentication module

pub mod keychain;
pub mod oauth;

// Re-export common types and functions
pub use keychain::{clear_auth_from_keychain, get_auth_from_keychain, save_auth_to_keychain, StoredAuth};
pub use oauth::{
    authorize_immediate, exchange_oauth_code, get_stored_auth, logout, refresh_auth_token,
    start_google_login, wait_for_oauth_callback, OAuthStartResult, DRIVE_SCOPE,
};
