use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use personal_blog::adapters::auth::{JwtSessionValidator, SupabaseAuthClient};
use personal_blog::adapters::engagement::{PostgrestCommentStore, PostgrestLikeStore};
use personal_blog::adapters::http::{app_router, SiteAppState};
use personal_blog::adapters::profile::PostgrestProfileStore;
use personal_blog::adapters::supabase::PostgrestClient;
use personal_blog::adapters::views::PostgrestViewRecorder;
use personal_blog::application::{BackgroundTasks, Engagement, RoleResolver, ViewTracker};
use personal_blog::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let addr = config.server.socket_addr()?;
    let mut rest = PostgrestClient::new(config.backend.supabase())?;
    if config.backend.use_service_role {
        rest = rest
            .as_service_role()
            .ok_or("service-role access requested without BACKEND__SERVICE_ROLE_KEY")?;
        tracing::warn!("Table calls bypass row-level security with the service-role key");
    }
    let auth = Arc::new(SupabaseAuthClient::new(config.backend.supabase())?);
    let background = Arc::new(BackgroundTasks::new());

    let resolver = RoleResolver::new(
        Arc::new(PostgrestProfileStore::new(rest.clone())),
        background.clone(),
    );
    let views = ViewTracker::new(
        Arc::new(PostgrestViewRecorder::new(rest.clone())),
        background.clone(),
    );
    let engagement = Engagement::new(
        resolver.clone(),
        Arc::new(PostgrestLikeStore::new(rest.clone())),
        Arc::new(PostgrestCommentStore::new(rest)),
    );
    let validator = Arc::new(JwtSessionValidator::new(&config.backend.jwt_secret));

    let state = SiteAppState::new(
        resolver,
        views,
        auth,
        engagement,
        config.server.base_path.clone(),
    );
    let app = app_router(state, validator, &config.server);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        base_path = %config.server.base_path,
        environment = ?config.server.environment,
        "Server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(pending = background.len(), "Waiting for background tasks");
    background.drain().await;
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
