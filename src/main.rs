// Roster assistant entry point.
//
// Startup sequence:
// 1. Initialize tracing (console, env-filtered)
// 2. Load config
// 3. Run one management cycle (load league, aggregate values, optimize,
//    optionally push the lineup)

use anyhow::Context;
use tracing::info;

use roster_assistant::config;
use roster_assistant::manager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    info!("roster assistant starting up");

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        league = %config.league_id,
        manage_roster = config.manage_roster,
        "config loaded"
    );

    manager::run_cycle(&config).await.context("management cycle failed")?;

    info!("cycle complete");
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("roster_assistant=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
