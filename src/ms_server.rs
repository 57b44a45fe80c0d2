// HTTP server assembly and serving
// Plain HTTP outside development; TLS from the configured key/cert files in
// development, where missing files stop the server before it binds.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::body::Body;
use axum::extract::Request;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use hyper::body::Incoming;
use hyper_util::rt::{TokioExecutor, TokioIo};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tower::ServiceExt;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;

use crate::ms_api::{AppState, api_router};
use crate::ms_settings::{BuildMode, ServerSettings};
use crate::ms_store::Store;
use crate::ms_tls::load_server_config;

const ACCEPT_BACKOFF: Duration = Duration::from_secs(1);

/// The whole application: API, static UI bundle, CORS and the HTTPS
/// redirect for production deployments behind a proxy.
pub fn build_app(settings: &ServerSettings, store: Arc<Store>) -> Router {
    let secure = settings.mode != BuildMode::Test;
    let mut app = api_router(AppState::new(store, secure)).merge(static_router(settings));

    if let Some(cors) = cors_layer(&settings.cors_origins) {
        app = app.layer(cors);
    }
    if settings.mode == BuildMode::Production {
        app = app.layer(axum::middleware::from_fn(redirect_to_https));
    }
    app
}

fn static_router(settings: &ServerSettings) -> Router {
    let assets = ServeDir::new(&settings.static_dir);
    match settings.public_path.trim_end_matches('/') {
        // nesting at the root is not allowed, the bundle becomes the fallback
        "" => Router::new().fallback_service(assets),
        prefix => Router::new().nest_service(prefix, assets),
    }
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                log::warn!("ignoring invalid CORS origin {o:?}");
                None
            }
        })
        .collect();
    if allowed.is_empty() {
        return None;
    }
    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true),
    )
}

/// Trust the proxy's `X-Forwarded-Proto` and send plain requests to https.
async fn redirect_to_https(req: Request, next: Next) -> Response {
    let forwarded_plain = req
        .headers()
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|proto| proto.eq_ignore_ascii_case("http"));
    if !forwarded_plain {
        return next.run(req).await;
    }

    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let path = req
        .uri()
        .path_and_query()
        .map(|p| p.as_str())
        .unwrap_or("/");
    match HeaderValue::from_str(&format!("https://{host}{path}")) {
        Ok(location) => (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response(),
        Err(_) => (StatusCode::BAD_REQUEST, Body::empty()).into_response(),
    }
}

/// Bind and serve until Ctrl-C.
pub async fn serve(settings: ServerSettings, store: Arc<Store>) -> anyhow::Result<()> {
    // Read TLS material first: a missing file must stop us before binding
    let tls = match &settings.dev_server {
        Some(dev) => Some(load_server_config(&dev.tls).context("cannot set up the development server")?),
        None => None,
    };

    let app = build_app(&settings, store);
    let addr = format!("{}:{}", settings.bind_host(), settings.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;

    log::info!(
        "serving {} build on {}://{} (assets {} under {})",
        settings.mode.name(),
        if tls.is_some() { "https" } else { "http" },
        addr,
        settings.static_dir.display(),
        settings.public_path
    );

    match tls {
        None => axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server error")?,
        Some(config) => serve_tls(listener, app, config).await?,
    }
    log::info!("server stopped");
    Ok(())
}

async fn serve_tls(listener: TcpListener, app: Router, config: rustls::ServerConfig) -> anyhow::Result<()> {
    let acceptor = TlsAcceptor::from(Arc::new(config));
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        let accepted = tokio::select! {
            accepted = listener.accept() => accepted,
            _ = &mut shutdown => return Ok(()),
        };
        let Some((stream, peer)) = settle_accept(accepted, ACCEPT_BACKOFF).await else {
            continue;
        };
        let acceptor = acceptor.clone();
        let app = app.clone();

        tokio::spawn(async move {
            let stream = match acceptor.accept(stream).await {
                Ok(s) => s,
                Err(e) => {
                    log::warn!("TLS handshake with {peer} failed: {e}");
                    return;
                }
            };
            let service = hyper::service::service_fn(move |req: hyper::Request<Incoming>| {
                app.clone().oneshot(req)
            });
            if let Err(e) = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                log::debug!("connection with {peer} ended: {e}");
            }
        });
    }
}

/// A failed accept (out of descriptors, connection reset before accept) is
/// logged and waited out; the listener stays up.
async fn settle_accept<T>(accepted: std::io::Result<T>, backoff: Duration) -> Option<T> {
    match accepted {
        Ok(conn) => Some(conn),
        Err(e) => {
            log::error!("accept failed: {e}");
            tokio::time::sleep(backoff).await;
            None
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[tokio::test]
    async fn accept_errors_do_not_stop_the_listener() {
        let emfile = io::Error::from_raw_os_error(24);
        assert_eq!(settle_accept::<u8>(Err(emfile), Duration::ZERO).await, None);
        let aborted = io::Error::from(io::ErrorKind::ConnectionAborted);
        assert_eq!(settle_accept::<u8>(Err(aborted), Duration::ZERO).await, None);
        assert_eq!(settle_accept(Ok(7u8), Duration::ZERO).await, Some(7));
    }
}
