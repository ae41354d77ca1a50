use crate::{
    cli::{commands::database, telemetry},
    store::PgUserStore,
    web,
};
use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub database: database::Options,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let dsn = args.database.dsn()?;

    info!(
        db.host = %args.database.host,
        db.port = args.database.port,
        db.name = %args.database.name,
        "Connecting to database"
    );

    let store = PgUserStore::connect(dsn.expose_secret())
        .await
        .context("Could not open the credential store")?;

    let result = web::new(args.port, Arc::new(store)).await;

    telemetry::shutdown_tracer();

    result
}
