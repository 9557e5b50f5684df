use crate::config::AppConfig;
use crate::error::StackTrace;
use crate::handler::AppModule;
use crate::route::{BookRouter, HealthRouter, LoanRouter, UserRouter};
use error_stack::ResultExt;
use kernel::KernelError;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

mod config;
mod controller;
mod error;
mod extractor;
mod handler;
mod route;

#[tokio::main]
async fn main() -> Result<(), StackTrace> {
    let config = AppConfig::from_env()?;

    let appender = tracing_appender::rolling::daily(&config.log_dir, "debug.log");
    let (non_blocking_appender, _guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_filter(tracing_subscriber::EnvFilter::new(
                    std::env::var("RUST_LOG").unwrap_or_else(|_| {
                        "driver=debug,application=debug,lending_server=debug,tower_http=debug,sqlx=warn".into()
                    }),
                ))
                .with_filter(tracing_subscriber::filter::LevelFilter::DEBUG),
        )
        .with(
            tracing_subscriber::fmt::Layer::default()
                .with_writer(non_blocking_appender)
                .with_ansi(false)
                .with_filter(tracing_subscriber::filter::LevelFilter::DEBUG),
        )
        .init();

    let bind = config.bind;
    let app = AppModule::new(config).await?;

    let router = axum::Router::new()
        .route_book()
        .route_loan()
        .route_user()
        .route_health()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new())
        .with_state(app);

    let tcp = TcpListener::bind(bind)
        .await
        .change_context_lazy(|| KernelError::Internal)
        .attach_printable_lazy(|| format!("Failed to listen on {bind}"))?;
    tracing::info!("Listening on {bind}");

    axum::serve(tcp, router.into_make_service())
        .await
        .change_context_lazy(|| KernelError::Internal)?;

    Ok(())
}
