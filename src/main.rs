use learnhub::{
    AppState, AuthLayer,
    auth::{TokenGate, TokenVerifier},
    config::{AppConfig, Env},
    create_router,
    identity::{IdentityState, PostgresIdentityStore},
    policy,
    repository::{PostgresRepository, RepositoryState},
};
use sqlx::postgres::PgPoolOptions;
use std::{process::ExitCode, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Startup order: configuration, logging, rule table validation, database, server.
/// Anything wrong before the listener is up ends the process with a non-zero exit code.
#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    // Logging is not up yet, so configuration errors go to stderr.
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "learnhub=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // A misordered or malformed rule table must never serve traffic.
    let rules = match policy::platform_rule_table() {
        Ok(rules) => rules,
        Err(e) => {
            tracing::error!(error = %e, "route rule table rejected");
            return ExitCode::FAILURE;
        }
    };
    for rule in rules.rules() {
        tracing::debug!(%rule, "route rule");
    }

    let pool = match PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to Postgres, check DATABASE_URL");
            return ExitCode::FAILURE;
        }
    };

    let identities = Arc::new(PostgresIdentityStore::new(pool.clone())) as IdentityState;
    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    let gate = TokenGate::new(TokenVerifier::from_config(&config), identities);
    let auth = AuthLayer::new(rules, gate);

    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState { repo, auth, config });

    let listener = match TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %bind_addr, "failed to bind HTTP listener");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at: http://{}/swagger-ui", bind_addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server terminated");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
