use anyhow::Result;
use sea_orm::Database;
use tracing::{debug, error, info, trace};

use super::initdb::apply_migrations;
use super::serve::run_server;
use crate::config::{AppConfig, build_app_state};

pub async fn migrate_and_serve(config: &AppConfig) -> Result<()> {
    trace!("Entering migrate_and_serve function");
    info!("Applying database migrations and starting server");
    debug!("Configuration: {:?}", config);

    let db = match Database::connect(&config.database_url).await {
        Ok(connection) => {
            info!("Successfully connected to database");
            connection
        }
        Err(e) => {
            error!("Failed to connect to database '{}': {}", config.database_url, e);
            return Err(e.into());
        }
    };

    apply_migrations(&db).await?;

    // The migrated connection is reused so in-memory databases keep their schema
    let state = build_app_state(db, config)?;
    run_server(state, &config.bind_address).await
}
