// OAuth 2.0 + PKCE authentication flow for Google Drive

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;
use tiny_http::{Header, Response, Server};
use tracing::{debug, info, warn};
use url::Url;

use super::keychain::{
    clear_auth_from_keychain, get_auth_from_keychain, save_auth_to_keychain, StoredAuth,
};
use crate::error::{Error, Result};

/// OAuth state stored during the authentication flow
#[derive(Debug, Serialize, Deserialize)]
struct OAuthState {
    code_verifier: String,
    state: String,
}

/// Global state for OAuth flow
static OAUTH_STATE: std::sync::LazyLock<Mutex<Option<OAuthState>>> =
    std::sync::LazyLock::new(|| Mutex::new(None));

// OAuth constants
const OAUTH_CALLBACK_PORT: u16 = 8420;
const OAUTH_TIMEOUT_SECS: u64 = 300;
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Read-only access to the user's Drive files
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

/// Seconds of validity required before a stored token is reused
const EXPIRY_MARGIN_SECS: i64 = 300;

/// Result returned when starting the OAuth flow
#[derive(Debug, Serialize, Deserialize)]
pub struct OAuthStartResult {
    pub auth_url: String,
    pub state: String,
}

/// What the loopback server made of one incoming request
#[derive(Debug, PartialEq)]
enum CallbackOutcome {
    Code(String),
    Denied(String),
    StateMismatch,
    NotACallback,
}

// ============================================================================
// PKCE Helper Functions
// ============================================================================

/// Generate a random code verifier for PKCE
fn generate_code_verifier() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..64).map(|_| rng.gen()).collect();
    URL_SAFE_NO_PAD.encode(&bytes)
}

/// Generate a code challenge from a verifier for PKCE
fn generate_code_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    let hash = hasher.finalize();
    URL_SAFE_NO_PAD.encode(hash)
}

/// Generate a random state parameter for CSRF protection
fn generate_state() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..16).map(|_| rng.gen()).collect();
    URL_SAFE_NO_PAD.encode(&bytes)
}

fn redirect_uri() -> String {
    // Google desktop clients require "localhost" rather than 127.0.0.1
    format!("http://localhost:{}/callback", OAUTH_CALLBACK_PORT)
}

fn build_auth_url(client_id: &str, code_challenge: &str, state: &str) -> String {
    format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&\
         code_challenge={}&code_challenge_method=S256&state={}&\
         access_type=offline&prompt=consent",
        AUTHORIZE_URL,
        urlencoding::encode(client_id),
        urlencoding::encode(&redirect_uri()),
        urlencoding::encode(DRIVE_SCOPE),
        code_challenge,
        state
    )
}

fn lock_state() -> Result<std::sync::MutexGuard<'static, Option<OAuthState>>> {
    OAUTH_STATE
        .lock()
        .map_err(|e| Error::OAuth(format!("Lock error: {}", e)))
}

/// Classify a request received on the loopback server
fn parse_callback(request_url: &str, expected_state: Option<&str>) -> CallbackOutcome {
    let Ok(url) = Url::parse(&format!("http://127.0.0.1{}", request_url)) else {
        return CallbackOutcome::NotACallback;
    };
    if url.path() != "/callback" {
        return CallbackOutcome::NotACallback;
    }

    let params: HashMap<String, String> = url
        .query_pairs()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    if let Some(error) = params.get("error") {
        let description = params
            .get("error_description")
            .cloned()
            .unwrap_or_else(|| error.clone());
        return CallbackOutcome::Denied(description);
    }

    match params.get("code") {
        Some(code) => {
            if params.get("state").map(String::as_str) != expected_state {
                return CallbackOutcome::StateMismatch;
            }
            CallbackOutcome::Code(code.clone())
        }
        None => CallbackOutcome::NotACallback,
    }
}

fn html_response(body: String) -> Response<std::io::Cursor<Vec<u8>>> {
    let response = Response::from_string(body);
    match Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..]) {
        Ok(header) => response.with_header(header),
        Err(_) => response,
    }
}

#[derive(Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: i64,
}

impl GoogleTokenResponse {
    fn into_stored(self, previous_refresh: Option<String>) -> StoredAuth {
        StoredAuth {
            access_token: self.access_token,
            // Refresh responses usually omit the refresh token
            refresh_token: self.refresh_token.or(previous_refresh),
            expires_at: chrono::Utc::now().timestamp() + self.expires_in,
        }
    }
}

async fn post_token_form(form: &[(&str, &str)]) -> Result<GoogleTokenResponse> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;

    let response = client.post(TOKEN_URL).form(form).send().await?;
    debug!("Token endpoint responded with {}", response.status());

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Api { status, body });
    }

    Ok(response.json().await?)
}

// ============================================================================
// Public OAuth Functions
// ============================================================================

/// Start the Google OAuth login flow
/// Returns the authorization URL and state for verification
pub fn start_google_login(google_client_id: &str) -> Result<OAuthStartResult> {
    let code_verifier = generate_code_verifier();
    let code_challenge = generate_code_challenge(&code_verifier);
    let state = generate_state();

    *lock_state()? = Some(OAuthState {
        code_verifier,
        state: state.clone(),
    });

    let auth_url = build_auth_url(google_client_id, &code_challenge, &state);
    debug!("Generated auth URL: {}", auth_url);

    Ok(OAuthStartResult { auth_url, state })
}

/// Wait for the OAuth callback from Google
/// Starts a local HTTP server and waits for the authorization code
pub async fn wait_for_oauth_callback() -> Result<String> {
    info!("Waiting for the OAuth callback on port {}", OAUTH_CALLBACK_PORT);

    let server = Server::http(format!("127.0.0.1:{}", OAUTH_CALLBACK_PORT))
        .map_err(|e| Error::OAuth(format!("Failed to start callback server: {}", e)))?;

    let timeout = std::time::Duration::from_secs(OAUTH_TIMEOUT_SECS);
    let start_time = std::time::Instant::now();

    loop {
        if start_time.elapsed() > timeout {
            return Err(Error::OAuth("callback timed out after 5 minutes".to_string()));
        }

        if let Ok(Some(request)) = server.try_recv() {
            let expected_state = lock_state()?.as_ref().map(|s| s.state.clone());
            debug!("Callback server received {}", request.url());

            match parse_callback(request.url(), expected_state.as_deref()) {
                CallbackOutcome::Code(code) => {
                    let page = "<html><body><h1>Signed in to DriveTunes</h1>\
                                <p>You can close this window and return to the terminal.</p>\
                                <script>setTimeout(() => window.close(), 2000);</script>\
                                </body></html>";
                    request.respond(html_response(page.to_string())).ok();
                    info!("Authorization code received");
                    return Ok(code);
                }
                CallbackOutcome::Denied(description) => {
                    request
                        .respond(html_response(format!(
                            "<html><body><h1>Login Failed</h1><p>{}</p></body></html>",
                            description
                        )))
                        .ok();
                    return Err(Error::OAuth(description));
                }
                CallbackOutcome::StateMismatch => {
                    request
                        .respond(html_response(
                            "<html><body><h1>Login Failed</h1><p>Invalid state parameter</p></body></html>"
                                .to_string(),
                        ))
                        .ok();
                    return Err(Error::OAuth("state mismatch".to_string()));
                }
                CallbackOutcome::NotACallback => {
                    request
                        .respond(Response::from_string("Not Found").with_status_code(404))
                        .ok();
                }
            }
        }

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    }
}

/// Exchange the authorization code for tokens and store them in the keychain
pub async fn exchange_oauth_code(
    code: &str,
    google_client_id: &str,
    google_client_secret: &str,
) -> Result<StoredAuth> {
    let code_verifier = lock_state()?
        .as_ref()
        .map(|s| s.code_verifier.clone())
        .ok_or_else(|| Error::OAuth("login flow not started".to_string()))?;

    let redirect_uri = redirect_uri();
    info!("Exchanging authorization code for tokens");
    let tokens = post_token_form(&[
        ("code", code),
        ("client_id", google_client_id),
        ("client_secret", google_client_secret),
        ("redirect_uri", redirect_uri.as_str()),
        ("grant_type", "authorization_code"),
        ("code_verifier", code_verifier.as_str()),
    ])
    .await?;

    let stored_auth = tokens.into_stored(None);
    save_auth_to_keychain(&stored_auth)?;
    *lock_state()? = None;

    info!("Drive credentials saved to keychain");
    Ok(stored_auth)
}

/// Get stored authentication data from keychain
/// Returns None if expired or not found
pub fn get_stored_auth() -> Option<StoredAuth> {
    let auth = get_auth_from_keychain()?;

    if !auth.is_fresh(chrono::Utc::now().timestamp(), EXPIRY_MARGIN_SECS) {
        debug!("Stored auth is expired or about to expire");
        return None;
    }

    Some(auth)
}

/// Refresh the access token using the stored refresh token
pub async fn refresh_auth_token(
    google_client_id: &str,
    google_client_secret: &str,
) -> Result<StoredAuth> {
    let current_auth = get_auth_from_keychain().ok_or(Error::NotAuthorized)?;
    let refresh_token = current_auth.refresh_token.clone().ok_or(Error::NotAuthorized)?;

    info!("Refreshing Drive access token");
    let tokens = match post_token_form(&[
        ("client_id", google_client_id),
        ("client_secret", google_client_secret),
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token.as_str()),
    ])
    .await
    {
        Ok(tokens) => tokens,
        Err(Error::Api { status, body }) => {
            warn!("Refresh rejected ({}), clearing stored credentials", status);
            clear_auth_from_keychain().ok();
            return Err(Error::Api { status, body });
        }
        Err(e) => return Err(e),
    };

    let new_auth = tokens.into_stored(Some(refresh_token));
    save_auth_to_keychain(&new_auth)?;
    Ok(new_auth)
}

/// Non-interactive authorization: a fresh stored token, else a refreshed one
pub async fn authorize_immediate(
    google_client_id: &str,
    google_client_secret: &str,
) -> Option<StoredAuth> {
    if let Some(auth) = get_stored_auth() {
        return Some(auth);
    }
    match refresh_auth_token(google_client_id, google_client_secret).await {
        Ok(auth) => Some(auth),
        Err(e) => {
            debug!("Immediate authorization failed: {}", e);
            None
        }
    }
}

/// Logout the user by clearing stored authentication data
pub fn logout() -> Result<()> {
    info!("Logging out - clearing keychain");
    clear_auth_from_keychain()?;
    *lock_state()? = None;
    Ok(())
}
