use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware,
    middleware::Next,
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use counsel_desk::config::AppConfig;
use counsel_desk::handlers::{
    auth::{login, session},
    inquiries::{
        delete_inquiry, export_inquiries_csv, get_inquiry, get_stats, inquiry_report,
        list_inquiries, stream_inquiries, update_notes, update_status,
    },
    site::{health_check, service_catalog, sitemap, submit_inquiry},
};
use counsel_desk::middleware::{
    auth_middleware,
    login_limiter::{login_rate_limit_middleware, RateLimitConfig, RateLimiter},
};

pub fn create_app(config: AppConfig) -> Router {
    let login_rate_limiter = Arc::new(RateLimiter::new(RateLimitConfig::login()));

    let cors_origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(header_value) => Some(header_value),
            Err(err) => {
                tracing::error!("Invalid CORS origin '{}': {}", origin, err);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(cors_origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        // Public surface
        .route("/api/health", get(health_check))
        .route("/sitemap.xml", get(sitemap))
        .route("/api/services", get(service_catalog))
        .route("/api/inquiries", post(submit_inquiry))
        .nest(
            "/api/auth",
            Router::new()
                .route("/login", post(login))
                .layer(middleware::from_fn(login_rate_limit_middleware))
                .layer(axum::Extension(login_rate_limiter))
                .merge(
                    Router::new()
                        .route("/session", get(session))
                        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware)),
                ),
        )
        .nest(
            "/api/admin/inquiries",
            Router::new()
                .route("/", get(list_inquiries))
                .route("/stream", get(stream_inquiries))
                .route("/stats", get(get_stats))
                .route("/export", get(export_inquiries_csv))
                .route("/report", get(inquiry_report))
                .route("/:id", get(get_inquiry).delete(delete_inquiry))
                .route("/:id/status", put(update_status))
                .route("/:id/notes", put(update_notes))
                .layer(middleware::from_fn_with_state(config.clone(), auth_middleware)),
        )
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(config)
        .layer(middleware::from_fn(
            |req: Request, next: Next| async move {
                tracing::info!("{} {}", req.method(), req.uri());
                let response = next.run(req).await;
                tracing::info!("Response status: {}", response.status());
                response
            },
        ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "counsel_desk=info,tower_http=info,sqlx=warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().await?;
    let app = create_app(config.clone());

    let addr: SocketAddr = config.server_address().parse()?;
    tracing::info!("Starting counsel-desk server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
