use std::sync::Arc;

use secrecy::SecretString;
use tower_http::cors::CorsLayer;

use market_identity::account::LifecycleManager;
use market_identity::auth::{AuthRouteState, AuthService, auth_routes};
use market_identity::config::IdentityConfig;
use market_identity::notify::NotificationAddressUpdater;
use market_identity::otp::{ChallengeGate, StoredChallengeGate};
use market_identity::session::{JwtSigner, SessionIssuer};
use market_identity::store::{AccountStore, ChallengeStore, LibSqlBackend, ProfileStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // Session signing secret must come from the environment
    let signing_secret = std::env::var("MARKET_IDENTITY_SIGNING_SECRET").unwrap_or_else(|_| {
        eprintln!("Error: MARKET_IDENTITY_SIGNING_SECRET not set");
        eprintln!("  export MARKET_IDENTITY_SIGNING_SECRET=<random secret>");
        std::process::exit(1);
    });

    let config = IdentityConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    eprintln!("🛍  {} v{}", config.name, env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://0.0.0.0:{}/api/auth", config.listen_port);
    eprintln!("   Database: {}", config.db_path);

    // ── Database ─────────────────────────────────────────────────────────
    let db_path = std::path::Path::new(&config.db_path);
    let backend = Arc::new(LibSqlBackend::new_local(db_path).await.unwrap_or_else(|e| {
        eprintln!("Error: Failed to open database at {}: {}", config.db_path, e);
        std::process::exit(1);
    }));

    // ── Service wiring ──────────────────────────────────────────────────
    let accounts: Arc<dyn AccountStore> = backend.clone();
    let profiles: Arc<dyn ProfileStore> = backend.clone();
    let challenges: Arc<dyn ChallengeStore> = backend.clone();

    let lifecycle = LifecycleManager::new(Arc::clone(&accounts));
    let gate: Arc<dyn ChallengeGate> = Arc::new(StoredChallengeGate::new(
        challenges,
        config.challenge_ttl,
        config.challenge_digits,
    ));
    let issuer = SessionIssuer::new(
        Arc::new(JwtSigner::new(&SecretString::from(signing_secret))),
        config.session_ttl,
    );
    let notifier = NotificationAddressUpdater::new(Arc::clone(&accounts));

    let service = Arc::new(AuthService::new(
        lifecycle, profiles, gate, issuer, notifier,
    ));

    let app = auth_routes(AuthRouteState { service }).layer(CorsLayer::permissive());

    let listener =
        tokio::net::TcpListener::bind(("0.0.0.0", config.listen_port)).await?;
    tracing::info!(port = config.listen_port, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}
