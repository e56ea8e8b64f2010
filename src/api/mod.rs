use async_trait::async_trait;

use crate::error::{SheetError, SheetResult};

pub mod auth;
pub mod sheets_client;
pub use auth::{provider_from_config, FileTokenProvider, StaticTokenProvider, TokenProvider};
pub use sheets_client::SheetsClient;

/// Anything that can answer an A1 range query with rows of cell text
#[async_trait]
pub trait SheetSource: Send + Sync {
    fn spreadsheet_id(&self) -> &str;

    /// Fetch the raw rows for `range`. An empty vector means the range holds no data.
    async fn fetch(&self, range: &str) -> SheetResult<Vec<Vec<String>>>;

    /// Like [`fetch`](Self::fetch), but an empty range is a `NoData` error.
    async fn fetch_required(&self, range: &str) -> SheetResult<Vec<Vec<String>>> {
        let rows = self.fetch(range).await?;
        if rows.is_empty() {
            return Err(SheetError::NoData {
                spreadsheet_id: self.spreadsheet_id().to_string(),
                range: range.to_string(),
            });
        }
        Ok(rows)
    }
}
