//! Keygate server binary.
//!
//! Loads configuration, wires storage and the session registry, seeds the
//! bootstrap admin, then serves HTTP until Ctrl+C.

mod bootstrap;
mod config;
mod observability;
mod routes;
mod server;
mod state;

use std::{env, path::PathBuf, sync::Arc};

use keygate_auth::{
    AuthState, JwtService, MemorySessionRegistry, RevocationService, SessionConfig, SessionIssuer,
    SessionRegistry, UserStorage,
};
use keygate_postgres::PostgresStorage;
use keygate_redis::RedisSessionRegistry;

use crate::config::{AppConfig, loader};
use crate::server::KeygateServer;
use crate::state::AppState;

/// How the configuration path was determined.
#[derive(Debug, Clone, Copy)]
enum ConfigSource {
    /// From --config CLI argument
    CliArgument,
    /// From KEYGATE_CONFIG environment variable
    EnvironmentVariable,
    /// Default path (keygate.toml)
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CliArgument => write!(f, "CLI argument (--config)"),
            Self::EnvironmentVariable => write!(f, "environment variable (KEYGATE_CONFIG)"),
            Self::Default => write!(f, "default"),
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env if present; environment variables may hold the JWT secret
    // and database credentials in local development.
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    // Initialize tracing early with the default level
    observability::init_tracing();

    let (config_path, source) = resolve_config_path();

    let config = match loader::load_config(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    tracing::info!(
        path = %config_path,
        source = %source,
        "Configuration loaded"
    );

    observability::apply_logging_level(&config.logging.level);

    let state = match build_state(&config).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Startup failed: {e}");
            std::process::exit(2);
        }
    };

    if let Err(err) = KeygateServer::new(state, &config).run().await {
        eprintln!("Server error: {err}");
    }
}

/// Connects storage, picks the session registry, and assembles [`AppState`].
async fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let postgres = PostgresStorage::connect(
        &config.storage.connection_url(),
        config.storage.pool_size,
    )
    .await?;
    postgres.create_tables_if_not_exists().await?;
    tracing::info!(database = %config.storage.database, "Database ready");

    let users: Arc<dyn UserStorage> = Arc::new(postgres.users());
    let audit = Arc::new(postgres.login_audit());
    let usage = Arc::new(postgres.usage());

    // The registry is the source of truth for session liveness. When Redis
    // is configured, an unreachable instance is fatal: falling back to an
    // empty in-memory index would resurrect revoked sessions.
    let registry: Arc<dyn SessionRegistry> = if config.redis.enabled {
        let redis = RedisSessionRegistry::connect(
            &config.redis.url,
            config.redis.pool_size,
            config.redis.timeout_ms,
        )
        .await?;
        tracing::info!(url = %config.redis.url, "Session registry backed by Redis");
        Arc::new(redis)
    } else {
        tracing::warn!(
            "session registry is in-memory; sessions will not survive a restart \
             and cannot be shared between instances"
        );
        Arc::new(MemorySessionRegistry::new())
    };

    let jwt = Arc::new(JwtService::new(
        config.auth.secret.as_bytes(),
        &config.auth.issuer,
    ));
    let session_config = SessionConfig::new(&config.auth.issuer)
        .with_token_ttl(time::Duration::seconds(config.auth.token_ttl_secs));

    let issuer = Arc::new(SessionIssuer::new(
        jwt.clone(),
        users.clone(),
        registry.clone(),
        audit,
        session_config,
    ));
    let revocation = Arc::new(RevocationService::new(registry.clone(), users.clone()));

    bootstrap::seed_admin_user(&users, &config.bootstrap).await?;

    Ok(AppState {
        auth: AuthState::new(jwt, registry),
        issuer,
        revocation,
        users,
        usage,
        client_config_path: PathBuf::from(&config.client_config.path),
    })
}

/// Resolve the configuration file path.
///
/// Priority order:
/// 1. CLI argument: --config <path>
/// 2. Environment variable: KEYGATE_CONFIG
/// 3. Default: keygate.toml
fn resolve_config_path() -> (String, ConfigSource) {
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            if let Some(path) = args.next() {
                return (path, ConfigSource::CliArgument);
            }
        }
    }

    if let Ok(path) = env::var("KEYGATE_CONFIG") {
        if !path.is_empty() {
            return (path, ConfigSource::EnvironmentVariable);
        }
    }

    ("keygate.toml".to_string(), ConfigSource::Default)
}
