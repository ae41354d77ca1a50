use crate::store::{password, UserStore};
use anyhow::Result;
use axum::{
    body::Body,
    extract::{Extension, MatchedPath},
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::{any, get, post},
    Router,
};
use std::{sync::Arc, time::Duration};
use tokio::{net::TcpListener, signal, sync::oneshot};
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, info_span, warn, Span};
use ulid::Ulid;

pub mod handlers;
pub mod pages;
pub mod session;


/// Credential store shared by every request.
pub type SharedStore = Arc<dyn UserStore>;

/// In-flight requests get this long to finish once shutdown starts.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the application router.
///
/// `/index.html` sits behind the `require_session` guard; everything that
/// matches no route gets a plain 404.
pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/", any(handlers::landing))
        .route(
            "/login",
            post(handlers::login).fallback(handlers::not_found),
        )
        .route(
            "/register",
            get(handlers::show_register)
                .head(handlers::method_not_allowed)
                .post(handlers::register)
                .fallback(handlers::method_not_allowed),
        )
        .route("/logout", any(handlers::logout))
        .route(
            "/index.html",
            any(handlers::index).layer(middleware::from_fn(session::require_session)),
        )
        .fallback(handlers::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(store)),
        )
}

/// Start the server
/// # Errors
/// Return error if the listener cannot bind or the server fails
pub async fn new(port: u16, store: SharedStore) -> Result<()> {
    let app = router(store);

    // Build the decoy hash up front so the first unknown-email login pays
    // only for a verification.
    tokio::task::spawn_blocking(password::decoy_hash).await?;

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    let (tx, rx) = oneshot::channel::<()>();

    let mut server = tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            result??;
            return Ok(());
        }
        () = shutdown_signal() => {}
    }

    info!("Starting graceful shutdown");

    let _ = tx.send(());

    match tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut server).await {
        Ok(result) => result??,
        Err(_) => {
            warn!(
                "Graceful shutdown did not complete in {:?}, closing",
                SHUTDOWN_TIMEOUT
            );
            server.abort();
        }
    }

    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Got signal: SIGINT"),
        () = terminate => info!("Got signal: SIGTERM"),
    }
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
