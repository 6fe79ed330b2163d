// Core balance monitoring logic

use crate::backend_client::BackendClient;
use crate::config::Config;
use crate::render::render;
use anyhow::{anyhow, Context, Result};
use balance_ledger::{AccountAddress, BalanceReconciler, Ledger, Metrics};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

#[derive(Clone, Debug)]
pub struct BalanceMonitor {
    config: Arc<Config>,
    accounts: Arc<Vec<AccountAddress>>,
    client: Arc<BackendClient>,
    reconciler: BalanceReconciler,
    latest: Arc<RwLock<HashMap<AccountAddress, Ledger>>>,
}

impl BalanceMonitor {
    pub fn new(config: Config) -> Result<Self> {
        let accounts = config.account_addresses()?;
        let client = BackendClient::new(config.backend.clone())?;
        let metrics = Metrics::new().context("Failed to register metrics")?;

        info!("✅ Balance Monitor initialized with {} accounts", accounts.len());

        Ok(Self {
            config: Arc::new(config),
            accounts: Arc::new(accounts),
            client: Arc::new(client),
            reconciler: BalanceReconciler::new().with_metrics(metrics),
            latest: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    pub fn accounts(&self) -> &[AccountAddress] {
        &self.accounts
    }

    /// Fetch, reconcile and replace the stored ledger for one account
    ///
    /// Returns the new ledger when it differs from the previous one. On any
    /// failure the previous ledger stays in place.
    pub async fn refresh_account(&self, account: &AccountAddress) -> Result<Option<Ledger>> {
        let transfers = self.client.fetch_account_transfers(account).await?;
        let ledger = self
            .reconciler
            .reconcile_account(&transfers)
            .with_context(|| format!("Failed to reconcile account {account}"))?;

        let mut latest = self.latest.write().await;
        let previous = latest.insert(account.clone(), ledger.clone());

        if previous.as_ref() == Some(&ledger) {
            return Ok(None);
        }

        Ok(Some(ledger))
    }

    /// Refresh every monitored account and print changed ledgers
    ///
    /// Fails only when no account could be refreshed.
    pub async fn refresh_all(&self) -> Result<()> {
        let mut failures = 0;

        let accounts = self.accounts();

        for (idx, account) in accounts.iter().enumerate() {
            info!("🔍 Refreshing account {}/{}: {}", idx + 1, accounts.len(), account);

            match self.refresh_account(account).await {
                Ok(Some(ledger)) => {
                    info!("📊 Ledger for {} has {} entries", account, ledger.len());
                    match render(account, &ledger, &self.config.display) {
                        Ok(rendered) => println!("{rendered}"),
                        Err(e) => {
                            failures += 1;
                            error!("Failed to render ledger for {}: {:#}", account, e);
                        }
                    }
                }
                Ok(None) => {
                    info!("Ledger for {} unchanged", account);
                }
                Err(e) => {
                    failures += 1;
                    error!("Failed to refresh account {}: {:#}", account, e);
                }
            }
        }

        if let Err(e) = self.write_metrics().await {
            error!("{:#}", e);
        }

        if failures > 0 && failures == accounts.len() {
            return Err(anyhow!("All {} accounts failed to refresh", failures));
        }

        Ok(())
    }

    #[cfg(test)]
    pub async fn latest_ledger(&self, account: &AccountAddress) -> Option<Ledger> {
        self.latest.read().await.get(account).cloned()
    }

    async fn write_metrics(&self) -> Result<()> {
        let (Some(path), Some(metrics)) = (&self.config.metrics_file, self.reconciler.metrics()) else {
            return Ok(());
        };

        let text = metrics.encode_text()?;
        tokio::fs::write(path, text)
            .await
            .with_context(|| format!("Failed to write metrics to {}", path.display()))
    }
}
