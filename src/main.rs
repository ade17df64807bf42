use std::sync::Arc;

use moviedex::{
    AppState, build_router,
    config::Config,
    db,
    service::{MovieService, PageLimits},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,moviedex=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    let db = db::connect_and_migrate(&config.database_url).await?;
    if config.seed_defaults {
        db::seed_defaults(&db).await?;
    }

    let limits = PageLimits {
        default_page_size: config.default_page_size,
        max_page_size: config.max_page_size,
    };
    let state = Arc::new(AppState { movies: MovieService::new(db, limits) });

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
