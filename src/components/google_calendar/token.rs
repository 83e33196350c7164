use crate::config::Config;
use crate::error::{google_calendar_error, SoonlyResult};
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Seconds before expiry at which a token is already treated as expired
const EXPIRY_MARGIN_SECS: i64 = 60;

/// OAuth token as kept in the token file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unix timestamp
    pub expires_at: i64,
}

impl StoredToken {
    /// Build a token from a token endpoint response.
    ///
    /// Refresh responses usually omit `refresh_token`, so the previous one is
    /// carried over.
    pub fn from_response(response: &Value, previous_refresh: Option<&str>, now: i64) -> SoonlyResult<Self> {
        let access_token = response
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| google_calendar_error("Token response missing 'access_token' field"))?
            .to_string();

        let refresh_token = response
            .get("refresh_token")
            .and_then(|v| v.as_str())
            .or(previous_refresh)
            .map(str::to_string);

        let expires_in = response
            .get("expires_in")
            .and_then(|v| v.as_i64())
            .unwrap_or(3600);

        Ok(Self {
            access_token,
            refresh_token,
            expires_at: now + expires_in,
        })
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at - EXPIRY_MARGIN_SECS <= now
    }
}

#[derive(Clone)]
pub struct TokenManager {
    config: Arc<RwLock<Config>>,
    client: Client,
}

impl TokenManager {
    pub fn new(config: Arc<RwLock<Config>>) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Get a usable access token, refreshing the stored one if it expired
    pub async fn get_token(&self) -> SoonlyResult<StoredToken> {
        let token = self.read_token().await?.ok_or_else(|| {
            google_calendar_error("No token found. Run get_calendar_token to authorize access.")
        })?;

        if token.is_expired_at(Utc::now().timestamp()) {
            return self.refresh_token(&token).await;
        }

        Ok(token)
    }

    /// Refresh an expired token
    async fn refresh_token(&self, token: &StoredToken) -> SoonlyResult<StoredToken> {
        let refresh_token = token
            .refresh_token
            .as_deref()
            .ok_or_else(|| google_calendar_error("No refresh token in token data"))?;

        let (client_id, client_secret) = {
            let config_read = self.config.read().await;
            (
                config_read.google_client_id.clone(),
                config_read.google_client_secret.clone(),
            )
        };

        let params = [
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("refresh_token", refresh_token.to_string()),
            ("grant_type", "refresh_token".to_string()),
        ];

        let response = self
            .client
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to refresh token: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(google_calendar_error(&format!(
                "Failed to refresh token: HTTP {} - {}",
                status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to parse token response: {}", e)))?;

        let new_token =
            StoredToken::from_response(&body, Some(refresh_token), Utc::now().timestamp())?;
        self.set_token(&new_token).await?;
        info!("Refreshed Google Calendar access token");

        Ok(new_token)
    }

    /// Read the token file, `None` if there is none yet
    async fn read_token(&self) -> SoonlyResult<Option<StoredToken>> {
        let path = self.config.read().await.token_file.clone();

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let token = serde_json::from_str(&content)
            .map_err(|e| google_calendar_error(&format!("Failed to parse token file: {}", e)))?;
        Ok(Some(token))
    }

    /// Store a token (used after the authorization flow and after refreshing)
    pub async fn set_token(&self, token: &StoredToken) -> SoonlyResult<()> {
        let path = self.config.read().await.token_file.clone();
        fs::write(&path, serde_json::to_string_pretty(token)?)?;
        Ok(())
    }
}
