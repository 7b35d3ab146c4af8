use std::sync::Arc;

use axum::http::{HeaderValue, Method, header};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use vidtube::core::auth::{AuthApiState, AuthService, JwtService, user_api_router};
use vidtube::core::config::Config;
use vidtube::core::db::{DbConfig, PgUserStore, create_pool_with_migrations};

#[tokio::main]
async fn main() {
    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load application config from environment variables
    let config = Config::from_env();

    let db_config = DbConfig::from_env().expect("database configuration");
    let pool = create_pool_with_migrations(&db_config)
        .await
        .expect("database connection and migrations");

    let jwt = JwtService::from_env().expect("token configuration");
    let store = Arc::new(PgUserStore::new(pool));
    let auth_service = AuthService::new(store, jwt);

    let mut app = user_api_router(AuthApiState { auth_service });

    // Credentialed CORS requires a concrete origin; without one the API
    // stays same-origin only.
    if let Some(origin) = &config.cors_origin {
        let cors = CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>().expect("valid CORS_ORIGIN"))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true);
        app = app.layer(cors);
    }

    let app = app.layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("bind listen address");

    tracing::info!("listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("server error");
}
