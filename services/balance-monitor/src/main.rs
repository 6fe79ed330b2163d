// Balance Monitor - reconciled account ledgers from the payment backend
// Fetches transfer-in requests and chain transfers, prints running balances

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod backend_client;
mod config;
mod monitor;
mod render;

use config::{Config, LogFormat};
use monitor::BalanceMonitor;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    init_tracing(config.log_format);

    info!("🏦 Balance Monitor starting...");

    let schedule = config.poll_schedule.clone();
    let monitor = BalanceMonitor::new(config)?;

    let Some(schedule) = schedule else {
        return monitor.refresh_all().await;
    };

    if let Err(e) = monitor.refresh_all().await {
        error!("Initial refresh failed: {:#}", e);
    }

    let mut scheduler = start_polling(monitor, &schedule).await?;

    tokio::signal::ctrl_c().await?;

    info!("Shutting down balance monitor");
    scheduler.shutdown().await?;
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }
}

async fn start_polling(monitor: BalanceMonitor, schedule: &str) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let job_poll = Job::new_async(schedule, move |_uuid, _lock| {
        let monitor = monitor.clone();
        Box::pin(async move {
            info!("🔄 Polling backend for account transfers...");
            if let Err(e) = monitor.refresh_all().await {
                error!("Failed to refresh accounts: {:#}", e);
            }
        })
    })?;

    scheduler.add(job_poll).await?;
    scheduler.start().await?;

    info!("✅ Polling scheduled: {}", schedule);

    Ok(scheduler)
}
