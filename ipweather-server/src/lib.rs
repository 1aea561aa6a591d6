//! HTTP surface of the `ipweather` service.
//!
//! `GET /` answers `{"temperature": <f64>}` (200) or `{"message": <string>}` (500)
//! for the IP carried in `X-Forwarded-For`.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::get,
};
use ipweather_core::{FORWARDED_FOR_HEADER, TemperatureReply, TemperatureService};

pub fn router(service: TemperatureService) -> Router {
    Router::new().route("/", get(temperature)).with_state(service)
}

async fn temperature(
    State(service): State<TemperatureService>,
    headers: HeaderMap,
) -> (StatusCode, Json<TemperatureReply>) {
    // Non-UTF-8 header values are treated as absent.
    let forwarded_for = headers.get(FORWARDED_FOR_HEADER).and_then(|v| v.to_str().ok());

    let reply = TemperatureReply::from(service.temperature_for(forwarded_for).await);
    let status = if reply.is_success() { StatusCode::OK } else { StatusCode::INTERNAL_SERVER_ERROR };

    (status, Json(reply))
}
