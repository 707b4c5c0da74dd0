//! Bearer-token session shared by the remote system clients.
//!
//! Tokens are cached inside the session and refreshed inline when absent
//! or within the refresh margin of their expiry timestamp. The session is
//! owned by its client and passed by reference; there is no module-level
//! token state.

use chrono::{DateTime, Duration, Utc};
use gantry_domain::constants::{DEFAULT_TOKEN_TTL_SECS, TOKEN_REFRESH_MARGIN_SECS};
use gantry_domain::{EndpointConfig, GantryError, Result};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::http::HttpClient;

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Credential holder with an expiry-guarded token cache.
pub struct BearerSession {
    system: &'static str,
    login_url: String,
    username: String,
    password: String,
    database_name: Option<String>,
    token: Mutex<Option<CachedToken>>,
    refresh_margin: Duration,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl BearerSession {
    /// Create a session for `system` logging in at `login_path`.
    pub fn new(system: &'static str, config: &EndpointConfig, login_path: &str) -> Self {
        Self {
            system,
            login_url: format!("{}{}", config.base_url.trim_end_matches('/'), login_path),
            username: config.username.clone(),
            password: config.password.clone(),
            database_name: config.database_name.clone(),
            token: Mutex::new(None),
            refresh_margin: Duration::seconds(TOKEN_REFRESH_MARGIN_SECS),
        }
    }

    /// Current bearer token, re-authenticating when the cached one is
    /// absent or about to expire.
    pub async fn token(&self, http: &HttpClient) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Utc::now() + self.refresh_margin < token.expires_at {
                return Ok(token.value.clone());
            }
            debug!(system = self.system, "session token near expiry; refreshing");
        }

        let mut request = http
            .request(Method::POST, &self.login_url)
            .json(&LoginRequest { username: &self.username, password: &self.password });
        if let Some(database_name) = &self.database_name {
            request = request.query(&[("DatabaseName", database_name.as_str())]);
        }

        let response = http.send(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GantryError::Auth(format!(
                "failed to authenticate with {} (HTTP {})",
                self.system, status
            )));
        }
        let login: LoginResponse = response.json().await.map_err(|err| {
            GantryError::Auth(format!("failed to parse {} login response: {err}", self.system))
        })?;

        let ttl = login.expires_in.unwrap_or(DEFAULT_TOKEN_TTL_SECS);
        let token = CachedToken {
            value: login.token,
            expires_at: Utc::now() + Duration::seconds(ttl),
        };
        info!(system = self.system, "authenticated");
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    /// Drop the cached token so the next call re-authenticates.
    pub async fn invalidate(&self) {
        *self.token.lock().await = None;
    }
}
