use cafe_order::{
    api::HttpCafeApi,
    cli::{self, Cli, CliContext},
    config::{self, database},
    errors::Result,
    storage::SqliteStore,
};
use clap::Parser;
use dotenvy::dotenv;
use std::{io, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible), on stderr so command output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Parse arguments after .env so CAFE_USER_EMAIL can come from it
    let cli = Cli::parse();

    // 4. Load the application configuration
    let app_config = config::load_app_configuration()
        .inspect_err(|e| error!("Critical error loading application configuration: {}", e))?;

    // 5. Open the local state database
    let db = database::init_db(&app_config.database_url)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;
    let store = SqliteStore::new(db);

    // 6. Build the backend client from configuration
    let api = Arc::new(HttpCafeApi::from_config(&app_config)?);

    // 7. Run the command
    let ctx = CliContext::new(&cli, api, &store, &app_config);
    let mut stdout = io::stdout().lock();
    cli::run(cli.command, &ctx, &mut stdout).await
}
