use async_trait::async_trait;
use reqwest::{Client, header::{HeaderMap, HeaderValue}};
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::error::{SheetError, SheetResult};
use crate::models::{Config, ValueRange};
use super::{provider_from_config, SheetSource, TokenProvider};

/// Google Sheets v4 values client
pub struct SheetsClient {
    client: Client,
    api_base: String,
    spreadsheet_id: String,
    tokens: Arc<dyn TokenProvider>,
}

impl SheetsClient {
    /// Create a new client around an externally supplied token source
    pub fn new(config: &Config, tokens: Arc<dyn TokenProvider>) -> SheetResult<Self> {
        let client = build_http_client(config)?;
        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            tokens,
        })
    }

    /// Create a client using the token source named by the configuration
    pub fn from_config(config: &Config) -> SheetResult<Self> {
        let client = build_http_client(config)?;
        let tokens = provider_from_config(config, client.clone());
        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            tokens,
        })
    }

    fn values_url(&self, range: &str) -> SheetResult<Url> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| SheetError::config(format!("Invalid SHEETS_API_BASE {:?}: {}", self.api_base, e)))?;

        url.path_segments_mut()
            .map_err(|_| SheetError::config(format!("SHEETS_API_BASE cannot be a base URL: {}", self.api_base)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", range]);

        url.query_pairs_mut()
            .append_pair("majorDimension", "ROWS")
            .append_pair("valueRenderOption", "FORMATTED_VALUE");

        Ok(url)
    }
}

fn build_http_client(config: &Config) -> SheetResult<Client> {
    Ok(Client::builder()
        .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
        .user_agent("sheet-invest/0.1")
        .build()?)
}

#[async_trait]
impl SheetSource for SheetsClient {
    fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    async fn fetch(&self, range: &str) -> SheetResult<Vec<Vec<String>>> {
        let url = self.values_url(range)?;
        let access_token = self.tokens.access_token().await?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&format!("Bearer {}", access_token))
                .map_err(|_| SheetError::auth("Access token is not a valid header value"))?,
        );
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        debug!("Making request to: {}", url);

        let response = self.client.get(url).headers(headers).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await?;
            return Err(SheetError::Api { status, body });
        }

        let value_range: ValueRange = response.json().await?;
        let rows = value_range.into_rows();
        debug!("Retrieved {} rows for range {}", rows.len(), range);
        Ok(rows)
    }
}
