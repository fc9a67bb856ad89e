//! Entitlement reconciliation worker process.
//!
//! A pure periodic batch job: no network-facing API is exposed. Each cycle
//! is guarded end-to-end by the cluster-wide lease lock so that any number
//! of instances can run this binary concurrently.

mod config;
mod logging;

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing::{error, info};

use config::Config;
use granta_billing::BillingClient;
use granta_db::{ensure_schema, LeaseLock, PgIdentityStore};
use granta_marketplace::{AccountsClient, MarketplaceConfig, SubscriptionsClient};
use granta_reconciler::{ReconciliationWorker, Reconciler};
use logging::init_logging;

#[tokio::main]
async fn main() {
    // Fail-fast on missing required values, before logging is up.
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config.log_filter);

    if !config.reconciliation_enabled {
        info!("Entitlement reconciliation is disabled; idling until shutdown");
        shutdown_signal().await;
        return;
    }

    let pool = match PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %e, "Failed to connect to database");
            std::process::exit(1);
        }
    };

    if let Err(e) = ensure_schema(&pool).await {
        error!(error = %e, "Failed to ensure schema");
        std::process::exit(1);
    }

    let api_timeout = Duration::from_secs(config.api_timeout_secs);
    let billing = match BillingClient::new(
        &config.billing_api_url,
        &config.billing_api_token,
        api_timeout,
    ) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to build billing client");
            std::process::exit(1);
        }
    };

    let marketplace_config =
        MarketplaceConfig::new(&config.marketplace_api_url, &config.marketplace_api_token)
            .with_timeout(api_timeout);
    let (accounts, subscriptions) = match (
        AccountsClient::new(marketplace_config.clone()),
        SubscriptionsClient::new(marketplace_config),
    ) {
        (Ok(accounts), Ok(subscriptions)) => (accounts, subscriptions),
        (Err(e), _) | (_, Err(e)) => {
            error!(error = %e, "Failed to build marketplace client");
            std::process::exit(1);
        }
    };

    let reconciler = Arc::new(
        Reconciler::new(
            Arc::new(PgIdentityStore::new(pool.clone())),
            Arc::new(accounts),
            Arc::new(billing),
            Arc::new(subscriptions),
        )
        .with_include_orgs(config.worker.include_orgs),
    );

    let worker = Arc::new(ReconciliationWorker::new(
        reconciler,
        Arc::new(LeaseLock::new(pool)),
        config.worker.clone(),
    ));

    let run = {
        let worker = worker.clone();
        tokio::spawn(async move { worker.run().await })
    };

    shutdown_signal().await;
    worker.shutdown();
    let _ = run.await;
    info!("Reconciler exited cleanly");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT"),
        () = terminate => info!("Received SIGTERM"),
    }
}
