//! Talks to the public IP echo service and to the `ipweather` server.

use anyhow::{Context, Result, anyhow, bail};
use ipweather_core::{FORWARDED_FOR_HEADER, TemperatureReply};
use reqwest::Client;
use tracing::debug;

/// Asks a plain-text "what is my IP" service for our public address.
pub async fn discover_public_ip(http: &Client, echo_url: &str) -> Result<String> {
    let res = http
        .get(echo_url)
        .send()
        .await
        .with_context(|| format!("Failed to reach IP echo service {echo_url}"))?;

    let status = res.status();
    let body = res.text().await.context("Failed to read IP echo response body")?;

    if !status.is_success() {
        bail!("{echo_url} returned a status code {}", status.as_u16());
    }

    let ip = body.trim();
    if ip.is_empty() {
        bail!("{echo_url} returned an empty response");
    }

    debug!(ip, "discovered public IP");
    Ok(ip.to_string())
}

/// Requests the temperature for `client_ip` from the server at `server_url`.
///
/// A `message` reply from the server becomes the error text.
pub async fn request_temperature(http: &Client, server_url: &str, client_ip: &str) -> Result<f64> {
    let res = http
        .get(server_url)
        .header(FORWARDED_FOR_HEADER, client_ip)
        .send()
        .await
        .with_context(|| format!("Failed to reach weather server {server_url}"))?;

    let status = res.status();
    let body = res.text().await.context("Failed to read weather server response body")?;

    let reply: TemperatureReply = serde_json::from_str(&body).with_context(|| {
        format!("Weather server returned an unexpected body (status {}): {body}", status.as_u16())
    })?;

    match reply {
        TemperatureReply::Temperature { temperature } if status.is_success() => Ok(temperature),
        TemperatureReply::Message { message } => Err(anyhow!(message)),
        TemperatureReply::Temperature { .. } => {
            bail!("Weather server returned status {}", status.as_u16())
        }
    }
}
