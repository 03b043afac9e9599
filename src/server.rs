// src/server.rs

//! HTTP endpoint serving `/api/gen`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderName, HeaderValue, Method, Request, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::{AllowMethods, Any, CorsLayer};

use crate::dispatch::{Dispatcher, options_headers};
use crate::error::Result;

/// Router with `GET`/`HEAD`/`OPTIONS /api/gen`.
pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(AllowMethods::list([Method::GET, Method::HEAD, Method::OPTIONS]));

    Router::new()
        .route("/api/gen", get(generate))
        .layer(cors)
        .layer(axum::middleware::from_fn(answer_options))
        .with_state(dispatcher)
}

/// Bind `addr` and serve until the process stops.
pub async fn serve(dispatcher: Arc<Dispatcher>, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(dispatcher)).await?;
    Ok(())
}

async fn generate(
    State(dispatcher): State<Arc<Dispatcher>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let answer = dispatcher.handle(&params).await;
    let status = StatusCode::from_u16(answer.status).unwrap_or(StatusCode::OK);
    (status, Json(answer.body)).into_response()
}

/// `OPTIONS` is answered here, before the CORS layer sees it.
async fn answer_options(request: Request<Body>, next: Next) -> Response {
    if request.method() != Method::OPTIONS {
        return next.run(request).await;
    }

    let headers = request.headers();
    let preflight = [
        header::ORIGIN,
        header::ACCESS_CONTROL_REQUEST_METHOD,
        header::ACCESS_CONTROL_REQUEST_HEADERS,
    ]
    .iter()
    .all(|name| headers.contains_key(name));

    let mut response = StatusCode::OK.into_response();
    for (name, value) in options_headers(preflight) {
        if let Ok(name) = HeaderName::from_bytes(name.as_bytes()) {
            response
                .headers_mut()
                .insert(name, HeaderValue::from_static(value));
        }
    }
    response
}
