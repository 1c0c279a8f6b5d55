use anyhow::Context;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use uems::{
    config::{BootstrapAdminConfig, Config},
    controllers, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting UEMS API");

    let port = config.app.port;

    // Соединение с БД и миграции внутри AppState::new
    let app_state = AppState::new(config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to initialize application state: {e}"))?;
    info!("Database connected");

    // Первый суперадмин, если задан в окружении
    if let Some(admin) = app_state.config.bootstrap_admin.clone() {
        bootstrap_admin(&app_state, &admin).await?;
    }

    // --- Start the web server ---

    // Create the main router
    let app = Router::new()
        .route("/", get(|| async { "UEMS API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        // Mount the routes from the controllers module
        .nest("/api", controllers::routes())
        // Pass the application state to the router
        .with_state(app_state.clone())
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind listener")?;
    axum::serve(listener, app.into_make_service())
        .await
        .context("server error")?;

    Ok(())
}

// Создаёт учётку superadmin, если её ещё нет
async fn bootstrap_admin(state: &AppState, admin: &BootstrapAdminConfig) -> anyhow::Result<()> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)"
    )
    .bind(&admin.username)
    .fetch_one(&state.db.pool)
    .await
    .context("failed to check bootstrap admin")?;

    if exists {
        info!("Bootstrap admin already exists, skipping creation");
        return Ok(());
    }

    let password_hash = bcrypt::hash(&admin.password, state.config.security.bcrypt_cost)
        .context("failed to hash bootstrap admin password")?;

    sqlx::query(
        "INSERT INTO users (username, email, password_hash, role, is_staff, is_superuser)
         VALUES ($1, $2, $3, 'superadmin', TRUE, TRUE)"
    )
    .bind(&admin.username)
    .bind(&admin.email)
    .bind(&password_hash)
    .execute(&state.db.pool)
    .await
    .context("failed to create bootstrap admin")?;

    info!("Bootstrap admin '{}' created", admin.username);
    Ok(())
}
