use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use avitrack_alarm::engine::AlarmEngine;
use avitrack_alarm::escalation::EscalationEngine;
use avitrack_notify::dispatcher::NotificationDispatcher;
use avitrack_notify::registry::AdapterRegistry;
use avitrack_storage::FarmStore;

use avitrack_server::config::ServerConfig;
use avitrack_server::config_seed;
use avitrack_server::scheduler::{EscalationScheduler, EvaluationScheduler};

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  avitrack-server [config.toml]                Start the server");
    eprintln!("  avitrack-server evaluate <config.toml>       Run one evaluation sweep and exit");
    eprintln!("  avitrack-server init-configs <config.toml>   Create default alarm configurations per farm");
}

#[tokio::main]
async fn main() -> Result<()> {
    avitrack_common::id::init(1, 1);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("avitrack=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("evaluate") => {
            let config_path = args.get(2).ok_or_else(|| {
                print_usage();
                anyhow::anyhow!("evaluate requires a <config.toml> argument")
            })?;
            run_evaluate(config_path).await
        }
        Some("init-configs") => {
            let config_path = args.get(2).ok_or_else(|| {
                print_usage();
                anyhow::anyhow!("init-configs requires a <config.toml> argument")
            })?;
            run_init_configs(config_path).await
        }
        Some("--help" | "-h") => {
            print_usage();
            Ok(())
        }
        _ => {
            let config_path = args
                .get(1)
                .map(|s| s.as_str())
                .unwrap_or("config/server.toml");
            run_server(config_path).await
        }
    }
}

async fn connect(config: &ServerConfig) -> Result<Arc<FarmStore>> {
    if config.database_url.is_none() {
        std::fs::create_dir_all(&config.data_dir)?;
    }
    Ok(Arc::new(FarmStore::connect(&config.database_url()).await?))
}

fn build_dispatcher(
    store: Arc<FarmStore>,
    config: &ServerConfig,
) -> Result<Arc<NotificationDispatcher>> {
    let registry =
        AdapterRegistry::from_settings(config.notify.push.as_ref(), config.notify.email.as_ref())?;
    tracing::info!(adapters = ?registry.adapter_names(), "Notification adapters registered");
    Ok(Arc::new(
        NotificationDispatcher::new(store, registry).with_send_timeout(
            std::time::Duration::from_secs(config.notify.send_timeout_secs),
        ),
    ))
}

async fn run_server(config_path: &str) -> Result<()> {
    let config = ServerConfig::load(config_path)?;
    let store = connect(&config).await?;
    let dispatcher = build_dispatcher(store.clone(), &config)?;

    let alarm_engine = Arc::new(AlarmEngine::new(store.clone(), dispatcher.clone()));
    let escalation_engine = Arc::new(EscalationEngine::new(
        store.clone(),
        dispatcher,
        config.default_escalate_after_hours,
    ));

    let evaluation = EvaluationScheduler::new(alarm_engine, config.evaluation_interval_secs);
    let escalation = EscalationScheduler::new(escalation_engine, config.escalation_interval_secs);

    tokio::spawn(async move { evaluation.run().await });
    tokio::spawn(async move { escalation.run().await });

    tracing::info!("avitrack-server started, press Ctrl+C to stop");
    signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    Ok(())
}

/// One evaluation sweep for cron-style deployments.
async fn run_evaluate(config_path: &str) -> Result<()> {
    let config = ServerConfig::load(config_path)?;
    let store = connect(&config).await?;
    let dispatcher = build_dispatcher(store.clone(), &config)?;
    let engine = AlarmEngine::new(store, dispatcher);

    let report = engine.evaluate_all_farms(Utc::now()).await;
    println!(
        "evaluated {} farms: {} alarms created, {} errors",
        report.farms_evaluated, report.alarms_created, report.errors
    );
    if report.errors > 0 {
        anyhow::bail!("evaluation sweep finished with {} errors", report.errors);
    }
    Ok(())
}

async fn run_init_configs(config_path: &str) -> Result<()> {
    let config = ServerConfig::load(config_path)?;
    let store = connect(&config).await?;

    let report = config_seed::seed_alarm_configs(&store, &config.defaults).await?;
    println!(
        "seeded {} farms: {} configurations created, {} already present",
        report.farms, report.created, report.skipped
    );
    Ok(())
}
