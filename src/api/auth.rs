use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{SheetError, SheetResult};
use crate::models::Config;

const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens closer than this to expiry are refreshed before use
const REFRESH_MARGIN_SECS: i64 = 300;

/// Supplies bearer tokens to the sheets client.
///
/// The interactive consent flow lives outside this crate; implementations
/// only hand out (and possibly refresh) tokens that already exist.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> SheetResult<String>;
}

/// Fixed token, e.g. one minted by `gcloud auth print-access-token`
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> SheetResult<String> {
        Ok(self.token.clone())
    }
}

/// Authorized-user token file, as written by the Google auth libraries
#[derive(Debug, Clone, Deserialize, Serialize)]
struct StoredToken {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    token_uri: String,
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    client_secret: Option<String>,
    #[serde(default)]
    scopes: Vec<String>,
    #[serde(default)]
    expiry: Option<DateTime<Utc>>,
    /// Lifetime of a grant obtained in this process, in seconds
    #[serde(skip)]
    lifetime_secs: Option<i64>,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

/// OAuth refresh response
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl StoredToken {
    /// Short-lived grants get at most half their lifetime as margin.
    fn refresh_margin(&self) -> chrono::Duration {
        let secs = match self.lifetime_secs {
            Some(lifetime) => REFRESH_MARGIN_SECS.min(lifetime / 2),
            None => REFRESH_MARGIN_SECS,
        };
        chrono::Duration::seconds(secs)
    }

    fn is_fresh(&self) -> bool {
        if self.token.is_none() {
            return false;
        }
        match self.expiry {
            Some(expiry) => expiry > Utc::now() + self.refresh_margin(),
            // No recorded expiry: let the API decide
            None => true,
        }
    }
}

/// Token provider backed by a JSON token file, refreshing it when stale
pub struct FileTokenProvider {
    client: Client,
    token_path: PathBuf,
    scopes: Vec<String>,
    current: Mutex<Option<StoredToken>>,
}

impl FileTokenProvider {
    pub fn new(client: Client, token_path: impl Into<PathBuf>, scopes: Vec<String>) -> Self {
        Self {
            client,
            token_path: token_path.into(),
            scopes,
            current: Mutex::new(None),
        }
    }

    fn load(&self) -> SheetResult<StoredToken> {
        if !Path::new(&self.token_path).exists() {
            return Err(SheetError::auth(format!(
                "Token file does not exist: {}. Run the authorization step first.",
                self.token_path.display()
            )));
        }

        let content = fs::read_to_string(&self.token_path)?;
        let stored: StoredToken = serde_json::from_str(&content)?;

        let missing: Vec<&String> = self
            .scopes
            .iter()
            .filter(|scope| !stored.scopes.is_empty() && !stored.scopes.contains(*scope))
            .collect();
        if !missing.is_empty() {
            warn!("Stored token does not cover scopes {:?}", missing);
        }

        match stored.expiry {
            Some(expiry) if expiry <= Utc::now() => warn!("Token has expired, will need to refresh"),
            Some(expiry) => info!("Token valid for {} more minutes", (expiry - Utc::now()).num_minutes()),
            None if stored.token.is_none() => info!("Token file has no access token, will need to refresh"),
            None => debug!("Token file has no expiry recorded"),
        }

        info!("Loaded token from {}", self.token_path.display());
        Ok(stored)
    }

    fn save(&self, stored: &StoredToken) -> SheetResult<()> {
        let content = serde_json::to_string_pretty(stored)?;
        fs::write(&self.token_path, content)?;
        info!("Saved refreshed token to {}", self.token_path.display());
        Ok(())
    }

    async fn refresh(&self, stored: &StoredToken) -> SheetResult<StoredToken> {
        let (refresh_token, client_id, client_secret) = match (
            stored.refresh_token.as_deref(),
            stored.client_id.as_deref(),
            stored.client_secret.as_deref(),
        ) {
            (Some(r), Some(id), Some(secret)) => (r, id, secret),
            _ => {
                return Err(SheetError::auth(
                    "Token expired and cannot be refreshed. Run the authorization step again.",
                ))
            }
        };

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ];

        debug!("Refreshing access token via {}", stored.token_uri);
        let response = self.client.post(&stored.token_uri).form(&params).send().await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(SheetError::auth(format!("Token refresh failed: {}", error_text)));
        }

        let refreshed: RefreshResponse = response.json().await?;

        let mut next = stored.clone();
        next.token = Some(refreshed.access_token);
        next.expiry = Some(Utc::now() + chrono::Duration::seconds(refreshed.expires_in));
        next.lifetime_secs = Some(refreshed.expires_in);
        if let Some(rotated) = refreshed.refresh_token {
            next.refresh_token = Some(rotated);
        }
        Ok(next)
    }
}

#[async_trait]
impl TokenProvider for FileTokenProvider {
    async fn access_token(&self) -> SheetResult<String> {
        let mut guard = self.current.lock().await;

        if guard.is_none() {
            *guard = Some(self.load()?);
        }

        let stored = match guard.as_ref() {
            Some(stored) => stored,
            None => return Err(SheetError::auth("No token loaded")),
        };

        if stored.is_fresh() {
            if let Some(token) = &stored.token {
                return Ok(token.clone());
            }
        }

        let refreshed = self.refresh(stored).await?;
        self.save(&refreshed)?;
        let token = refreshed.token.clone().unwrap_or_default();
        *guard = Some(refreshed);
        Ok(token)
    }
}

/// Pick the token source configured for this run.
pub fn provider_from_config(config: &Config, client: Client) -> Arc<dyn TokenProvider> {
    match &config.access_token {
        Some(token) => {
            debug!("Using static access token from environment");
            Arc::new(StaticTokenProvider::new(token.clone()))
        }
        None => Arc::new(FileTokenProvider::new(
            client,
            config.token_path.clone(),
            config.scopes.clone(),
        )),
    }
}
