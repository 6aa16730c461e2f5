use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::error::AppError;
use crate::state::SharedState;
use crate::submission::pipeline::{self, Mode, Outcome};
use crate::submission::{metadata, parser};

pub async fn submit(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    handle(&state, addr, &headers, body, Mode::Normal).await
}

/// Resubmission from the intermediate page after a failed CAPTCHA.
pub async fn submit_anyway(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    tracing::info!("Forced resubmission requested");
    handle(&state, addr, &headers, body, Mode::Force).await
}

async fn handle(
    state: &SharedState,
    addr: SocketAddr,
    headers: &HeaderMap,
    body: Bytes,
    mode: Mode,
) -> Result<Response, AppError> {
    let form = parser::parse(headers, body)
        .await
        .map_err(AppError::BadRequest)?;

    let ip = metadata::client_ip(headers, addr.ip(), &state.config.trusted_proxies);
    let location = match pipeline::run(state, form, ip, mode).await? {
        Outcome::Recorded {
            record_id,
            status,
            redirect_url,
        } => {
            tracing::info!("Submission stored as {record_id} (turnstile_status={status})");
            redirect_url
        }
        Outcome::Unverified { redirect_url } => redirect_url,
    };

    Ok(found(&location))
}

/// 302 to `location`. `Redirect::to` answers 303, which the landing pages don't expect.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

pub async fn preflight() -> Response {
    (
        StatusCode::NO_CONTENT,
        [(header::ACCESS_CONTROL_MAX_AGE, "86400")],
    )
        .into_response()
}

pub async fn method_not_allowed(method: Method) -> Response {
    tracing::info!("Method not allowed: {method}");
    (
        [(header::ALLOW, "POST, OPTIONS")],
        AppError::MethodNotAllowed,
    )
        .into_response()
}
