use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use applicant_portal_backend::{
    config::{get_config, init_config},
    middleware, routes, AppState,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let app_state = AppState::new();

    {
        let notifications = app_state.notifications.clone();
        tokio::spawn(async move {
            loop {
                match notifications.run_once().await {
                    Ok(true) => {}
                    Ok(false) => {
                        tokio::time::sleep(Duration::from_millis(1000)).await;
                    }
                    Err(e) => {
                        tracing::error!(error = ?e, "Webhook worker error");
                        tokio::time::sleep(Duration::from_secs(2)).await;
                    }
                }
            }
        });
    }

    {
        let tokens = app_state.download_tokens.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(60)).await;
                let removed = tokens.sweep();
                if removed > 0 {
                    tracing::debug!(removed, "Swept expired download tokens");
                }
            }
        });
    }

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let public_api = Router::new()
        .route(
            "/api/applications",
            post(routes::application_routes::submit_application),
        )
        .route(
            "/api/applications/:email",
            get(routes::application_routes::get_application),
        )
        .route(
            "/api/applications/:email/status",
            get(routes::application_routes::get_application_status),
        )
        .route(
            "/api/applications/:email/attachments/:kind/acknowledge",
            post(routes::application_routes::acknowledge_attachment),
        )
        .route(
            "/api/editing/:email",
            post(routes::editing_routes::create_editing_request)
                .get(routes::editing_routes::get_editing_request),
        )
        .route(
            "/api/editing/:email/payments",
            post(routes::editing_routes::record_payment),
        )
        .route(
            "/api/editing/:email/download-token",
            post(routes::editing_routes::create_download_token),
        )
        .route(
            "/api/editing/download/:token",
            get(routes::editing_routes::download_deliverable),
        )
        .layer(axum::middleware::from_fn_with_state(
            middleware::rate_limit::new_rps_state(config.public_rps),
            middleware::rate_limit::rps_middleware,
        ));

    let admin_api = Router::new()
        .route(
            "/api/admin/applications",
            get(routes::admin_routes::list_applications),
        )
        .route(
            "/api/admin/applications/export",
            get(routes::admin_routes::export_applications),
        )
        .route(
            "/api/admin/applications/:email",
            get(routes::admin_routes::get_application)
                .delete(routes::admin_routes::delete_application),
        )
        .route(
            "/api/admin/applications/:email/documents/:kind/review",
            post(routes::admin_routes::review_document),
        )
        .route(
            "/api/admin/applications/:email/reupload-requests",
            post(routes::admin_routes::create_reupload_request),
        )
        .route(
            "/api/admin/applications/:email/status",
            post(routes::admin_routes::update_status),
        )
        .route(
            "/api/admin/applications/:email/payments/verify",
            post(routes::admin_routes::verify_payment),
        )
        .route(
            "/api/admin/applications/:email/attachments/:kind",
            post(routes::admin_routes::upload_attachment),
        )
        .route(
            "/api/admin/editing/:email/files",
            post(routes::editing_routes::upload_edited_files),
        )
        .route(
            "/api/admin/editing/:email/payments/verify",
            post(routes::editing_routes::verify_payment),
        )
        .layer(axum::middleware::from_fn(
            middleware::auth::require_staff,
        ))
        .layer(axum::middleware::from_fn_with_state(
            middleware::rate_limit::new_rps_state(config.admin_rps),
            middleware::rate_limit::rps_middleware,
        ));

    let app = base_routes
        .merge(public_api)
        .merge(admin_api)
        .with_state(app_state)
        .layer(middleware::cors::permissive_cors())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
