use crate::auth::{PasswordHasher, TokenSigner};
use crate::schemas::AppState;
use anyhow::{Result, bail};
use sea_orm::{Database, DatabaseConnection};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Minimum accepted length of a configured token secret, in bytes.
const MIN_SECRET_LENGTH: usize = 32;

/// Runtime configuration assembled from the command line and environment
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_address: String,
    /// HMAC key for bearer tokens; a random key is generated when absent
    pub token_secret: Option<String>,
    pub token_ttl: Duration,
    pub password_iterations: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &self.database_url)
            .field("bind_address", &self.bind_address)
            .field("token_secret", &self.token_secret.as_ref().map(|_| "<redacted>"))
            .field("token_ttl", &self.token_ttl)
            .field("password_iterations", &self.password_iterations)
            .finish()
    }
}

impl AppConfig {
    pub fn token_signer(&self) -> Result<TokenSigner> {
        match &self.token_secret {
            Some(secret) if secret.len() < MIN_SECRET_LENGTH => {
                bail!("TOKEN_SECRET must be at least {} bytes long", MIN_SECRET_LENGTH)
            }
            Some(secret) => Ok(TokenSigner::new(secret, self.token_ttl)),
            None => {
                warn!("No TOKEN_SECRET configured, issued tokens will not survive a restart");
                Ok(TokenSigner::with_random_key(self.token_ttl))
            }
        }
    }

    pub fn password_hasher(&self) -> PasswordHasher {
        PasswordHasher::new(self.password_iterations)
    }
}

/// Connect to the configured database and build the shared state
pub async fn initialize_app_state(config: &AppConfig) -> Result<AppState> {
    info!("Connecting to database: {}", config.database_url);
    let db = Database::connect(&config.database_url).await?;
    build_app_state(db, config)
}

/// Build the shared state around an already open connection
pub fn build_app_state(db: DatabaseConnection, config: &AppConfig) -> Result<AppState> {
    let tokens = config.token_signer()?;
    let passwords = config.password_hasher();
    debug!(
        "Tokens live for {}s, passwords hashed with {} iterations",
        tokens.ttl().as_secs(),
        passwords.iterations()
    );
    Ok(AppState { db, passwords, tokens })
}
