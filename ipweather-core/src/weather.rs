use reqwest::Url;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::{
    Config, ServiceId,
    error::{LookupError, Outcome},
    http::{HttpFetch, decode_object, display_url, fetch, parse_endpoint},
    model::Coordinate,
};

/// Looks up the current temperature (°C) at a coordinate via OpenWeather.
#[derive(Debug, Clone)]
pub struct TemperatureResolver {
    endpoint: String,
    api_key: Option<String>,
    http: Arc<dyn HttpFetch>,
}

impl TemperatureResolver {
    pub fn new(endpoint: String, api_key: Option<String>, http: Arc<dyn HttpFetch>) -> Self {
        Self { endpoint, api_key, http }
    }

    pub fn from_config(config: &Config, http: Arc<dyn HttpFetch>) -> Self {
        Self::new(
            config.endpoints.openweather.clone(),
            config.api_key(ServiceId::OpenWeather).map(str::to_owned),
            http,
        )
    }

    /// Fails with a missing-configuration error, without any request, when no key is set.
    pub async fn resolve(&self, coordinate: &Coordinate) -> Outcome<f64> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(LookupError::MissingConfig { key: ServiceId::OpenWeather.env_var() })?;

        let mut url = parse_endpoint(&self.endpoint)?;
        url.query_pairs_mut()
            .append_pair("units", "metric")
            .append_pair("lat", &coordinate.latitude)
            .append_pair("lon", &coordinate.longitude)
            .append_pair("appid", api_key);

        let reply = fetch(self.http.as_ref(), &url).await?;

        let temperature = parse_temperature(&url, &reply.body)?;
        info!(temperature, "resolved temperature");

        Ok(temperature)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: Option<OwMain>,
}

fn parse_temperature(url: &Url, body: &str) -> Outcome<f64> {
    let parsed: OwCurrentResponse = decode_object(url, body)?;

    parsed
        .main
        .ok_or_else(|| LookupError::malformed(display_url(url), "missing `main` object"))?
        .temp
        .ok_or_else(|| LookupError::malformed(display_url(url), "missing `main.temp`"))
}
