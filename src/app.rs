use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::{AppState, MlState};
use crate::{analysis, auth, scans};

pub fn build_web_app(state: AppState) -> Router {
    let app = Router::new()
        .merge(auth::router())
        .merge(scans::router())
        .route("/health", get(analysis::handlers::health))
        .with_state(state);
    with_http_layers(app)
}

pub fn build_ml_app(state: MlState) -> Router {
    let app = analysis::router().with_state(state);
    with_http_layers(app)
}

fn with_http_layers(app: Router) -> Router {
    app.layer(CorsLayer::permissive()).layer(
        TraceLayer::new_for_http()
            .make_span_with(|req: &axum::http::Request<_>| {
                let method = req.method().clone();
                let uri = req.uri().clone();
                tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
            })
            .on_response(
                |res: &axum::http::Response<_>,
                 latency: std::time::Duration,
                 span: &tracing::Span| {
                    let status = res.status();
                    span.record("status", tracing::field::display(status));
                    let latency_ms = latency.as_millis() as u64;
                    if status.is_server_error() {
                        tracing::error!(%status, latency_ms, "response");
                    } else {
                        tracing::info!(%status, latency_ms, "response");
                    }
                },
            ),
    )
}

pub async fn serve(addr: SocketAddr, app: Router) -> anyhow::Result<()> {
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
