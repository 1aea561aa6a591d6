use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::{
    Config,
    error::Outcome,
    http::HttpFetch,
    model::ClientIp,
    provider::select_provider,
    weather::TemperatureResolver,
};

/// Drives client IP -> coordinates -> temperature for one request at a time.
///
/// Holds no per-request state; clones share the config and HTTP client.
#[derive(Debug, Clone)]
pub struct TemperatureService {
    config: Arc<Config>,
    http: Arc<dyn HttpFetch>,
}

impl TemperatureService {
    pub fn new(config: Config, http: Arc<dyn HttpFetch>) -> Self {
        Self { config: Arc::new(config), http }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Temperature at the location of the IP carried by the forwarding header.
    ///
    /// Errors from the coordinate provider and the resolver are returned as-is.
    #[instrument(skip(self))]
    pub async fn temperature_for(&self, forwarded_for: Option<&str>) -> Outcome<f64> {
        let outcome = self.lookup(forwarded_for).await;
        if let Err(err) = &outcome {
            warn!(kind = ?err.kind(), "temperature lookup failed: {err}");
        }
        outcome
    }

    async fn lookup(&self, forwarded_for: Option<&str>) -> Outcome<f64> {
        let client_ip = ClientIp::from_header(forwarded_for)?;
        info!(client_ip = %client_ip, "client IP");

        let provider = select_provider(&self.config, self.http.clone());
        debug!(provider = %provider.id(), "selected coordinate provider");

        let coordinate = provider.resolve(&client_ip).await?;

        TemperatureResolver::from_config(&self.config, self.http.clone())
            .resolve(&coordinate)
            .await
    }
}
