use crate::{
    Config, ServiceId,
    error::Outcome,
    http::HttpFetch,
    model::{ClientIp, Coordinate},
    provider::{ipapi::IpApiProvider, ipify::IpifyProvider},
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod ipapi;
pub mod ipify;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    IpApi,
    Ipify,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::IpApi => "ipapi",
            ProviderId::Ipify => "ipify",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::IpApi, ProviderId::Ipify]
    }

    /// Ipify when its API key is configured, the free ipapi lookup otherwise.
    pub fn select(config: &Config) -> Self {
        if config.is_service_configured(ServiceId::Ipify) {
            ProviderId::Ipify
        } else {
            ProviderId::IpApi
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "ipapi" => Ok(ProviderId::IpApi),
            "ipify" => Ok(ProviderId::Ipify),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: ipapi, ipify."
            )),
        }
    }
}

/// Resolves an IP address to the coordinates it is registered at.
#[async_trait]
pub trait CoordinateProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    async fn resolve(&self, client_ip: &ClientIp) -> Outcome<Coordinate>;
}

/// Construct the provider [`ProviderId::select`] picks for this config.
pub fn select_provider(config: &Config, http: Arc<dyn HttpFetch>) -> Box<dyn CoordinateProvider> {
    match ProviderId::select(config) {
        ProviderId::Ipify => Box::new(IpifyProvider::new(
            config.endpoints.ipify.clone(),
            config.api_key(ServiceId::Ipify).unwrap_or_default().to_owned(),
            http,
        )),
        ProviderId::IpApi => Box::new(IpApiProvider::new(config.endpoints.ipapi.clone(), http)),
    }
}
