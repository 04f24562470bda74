// Fantasta entry point.
//
// Startup sequence:
// 1. Initialize tracing
// 2. Load config (copying defaults on first run)
// 3. Ingest the player listing
// 4. Open snapshot stores (SQLite + JSON file)
// 5. Restore the last snapshot, or start a fresh draft
// 6. Serve the HTTP API until Ctrl+C

use std::path::Path;

use fantasta::api::{self, ApiState};
use fantasta::config;
use fantasta::db;
use fantasta::roster;
use fantasta::session::Session;
use fantasta::store::{JsonFileStore, SnapshotStore};

use anyhow::Context;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Fantasta starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: {} credits, targets P{} D{} C{} A{}",
        config.draft.total_budget,
        config.draft.targets.goalkeeper,
        config.draft.targets.defender,
        config.draft.targets.midfielder,
        config.draft.targets.attacker
    );

    // 3. Ingest the player listing
    let listing_path = Path::new(&config.data_paths.roster);
    let players = roster::load_roster(listing_path).context("failed to load player listing")?;

    // 4. Open snapshot stores
    let db = db::Database::open(&config.db_path).context("failed to open database")?;
    info!("Database opened at {}", config.db_path);
    let stores: Vec<Box<dyn SnapshotStore>> = vec![
        Box::new(db),
        Box::new(JsonFileStore::new(&config.data_paths.snapshot)),
    ];

    // 5. Restore or start fresh
    let mut session = Session::new(players, config.draft.clone(), stores);
    if session.restore() {
        info!("Draft state restored from previous session");
    } else {
        session
            .initialize(None)
            .context("failed to initialize draft")?;
        info!("Starting fresh draft session");
    }

    // 6. Serve until Ctrl+C
    let state = ApiState::new(session, listing_path);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
        info!("Shutdown requested");
    };
    api::serve(state, config.server_port, shutdown).await?;

    info!("Fantasta shut down cleanly");
    Ok(())
}

/// Log to stderr; `RUST_LOG` overrides the default filter.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fantasta=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
