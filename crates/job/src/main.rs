use std::io::Write;

use nudge_common::config::JobConfig;
use nudge_common::db;
use nudge_engine::pipeline::{self, PipelineOutcome};

mod report;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout is reserved for the run report
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "nudge_job=info,nudge_engine=info,nudge_scanner=info".into()
            }),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Nudge batch job starting...");

    let config = JobConfig::from_env()?;
    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;

    let mut notifications = Vec::new();
    let mut failures = Vec::new();
    for flow in &config.flows {
        match pipeline::run_flow(&pool, &config, *flow).await {
            Ok(PipelineOutcome {
                notifications: ready,
                failures: skipped,
            }) => {
                notifications.extend(ready);
                failures.extend(skipped);
            }
            Err(e) => {
                tracing::error!(flow = %flow, error = %e, "Flow pass failed, aborting run");
                return Err(e.into());
            }
        }
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if notifications.is_empty() {
        tracing::info!("No notifications to schedule this run");
    } else {
        report::render_notifications(&mut out, &notifications)?;
    }
    report::render_failures(&mut out, &failures)?;
    out.flush()?;

    tracing::info!(
        scheduled = notifications.len(),
        failures = failures.len(),
        "Nudge batch job complete."
    );
    Ok(())
}
