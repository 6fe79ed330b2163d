// Backend API client for fetching account transfers

use crate::config::BackendSettings;
use anyhow::{anyhow, Context, Result};
use balance_ledger::{AccountAddress, AccountTransfers};
use reqwest::Client;
use std::time::Duration;
use tracing::info;

#[derive(Debug)]
pub struct BackendClient {
    settings: BackendSettings,
    http_client: Client,
}

impl BackendClient {
    pub fn new(settings: BackendSettings) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            settings,
            http_client,
        })
    }

    /// `GET /account/{account}/in` endpoint for an account
    pub fn account_in_url(&self, account: &AccountAddress) -> String {
        format!(
            "{}/account/{}/in",
            self.settings.backend_url.trim_end_matches('/'),
            account
        )
    }

    /// Fetch transfer-in requests and chain transfers for an account
    pub async fn fetch_account_transfers(&self, account: &AccountAddress) -> Result<AccountTransfers> {
        info!("🔌 Fetching transfers for account {}", account);

        let url = self.account_in_url(account);
        let mut request = self.http_client.get(&url);

        if let Some(token) = self.settings.bearer_token() {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Backend returned error: {} for {}",
                response.status(),
                url
            ));
        }

        let transfers: AccountTransfers = response
            .json()
            .await
            .context("Failed to decode account transfers")?;

        info!(
            "✅ Fetched {} transfer-ins and {} chain transfers for account {}",
            transfers.transfers_in.len(),
            transfers.chain_transfers.len(),
            account
        );

        Ok(transfers)
    }
}
