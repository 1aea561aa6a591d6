use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::{
    error::{LookupError, Outcome},
    http::{HttpFetch, decode_object, display_url, fetch, parse_endpoint},
    model::{ClientIp, Coordinate},
};

use super::{CoordinateProvider, ProviderId};

/// Key-gated geolocation: `GET {base}?apiKey=..&ipAddress=..`, answering JSON
/// with a `location.lat` / `location.lng` pair.
#[derive(Debug, Clone)]
pub struct IpifyProvider {
    base_url: String,
    api_key: String,
    http: Arc<dyn HttpFetch>,
}

impl IpifyProvider {
    pub fn new(base_url: String, api_key: String, http: Arc<dyn HttpFetch>) -> Self {
        Self { base_url, api_key, http }
    }

    fn lookup_url(&self, client_ip: &ClientIp) -> Outcome<Url> {
        let mut url = parse_endpoint(&self.base_url)?;
        url.query_pairs_mut()
            .append_pair("apiKey", &self.api_key)
            .append_pair("ipAddress", client_ip.as_str());
        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
struct IpifyLocation {
    lat: Option<f64>,
    lng: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct IpifyResponse {
    location: Option<IpifyLocation>,
}

fn parse_location(url: &Url, body: &str) -> Outcome<Coordinate> {
    let parsed: IpifyResponse = decode_object(url, body)?;

    let location = parsed
        .location
        .ok_or_else(|| LookupError::malformed(display_url(url), "missing `location` object"))?;

    match (location.lat, location.lng) {
        (Some(lat), Some(lng)) => Ok(Coordinate::from_degrees(lat, lng)),
        _ => Err(LookupError::malformed(display_url(url), "missing `location.lat` or `location.lng`")),
    }
}

#[async_trait]
impl CoordinateProvider for IpifyProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Ipify
    }

    async fn resolve(&self, client_ip: &ClientIp) -> Outcome<Coordinate> {
        let url = self.lookup_url(client_ip)?;
        let reply = fetch(self.http.as_ref(), &url).await?;

        let coordinate = parse_location(&url, &reply.body)?;
        info!(provider = %self.id(), coordinate = %coordinate, "resolved coordinates");

        Ok(coordinate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorKind, http::testing::ScriptedFetch};

    const BASE: &str = "https://geo.ipify.org/api/v1";

    fn ip() -> ClientIp {
        ClientIp::from_header(Some("203.0.113.5")).unwrap()
    }

    fn provider(http: Arc<ScriptedFetch>) -> IpifyProvider {
        IpifyProvider::new(BASE.into(), "IPIFY_KEY".into(), http)
    }

    #[tokio::test]
    async fn resolves_nested_location() {
        let body = r#"{"ip":"203.0.113.5","location":{"country":"US","lat":12.5,"lng":-7.25}}"#;
        let http = Arc::new(ScriptedFetch::new().reply(200, body));

        let coord = provider(http.clone()).resolve(&ip()).await.unwrap();

        assert_eq!(coord, Coordinate::new("12.500000", "-7.250000"));

        let requested = &http.requested()[0];
        let pairs: Vec<(String, String)> = requested.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("apiKey".to_string(), "IPIFY_KEY".to_string()),
                ("ipAddress".to_string(), "203.0.113.5".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn formatted_values_round_to_six_decimals() {
        let body = r#"{"location":{"lat":40.712776,"lng":-74.005974}}"#;
        let http = Arc::new(ScriptedFetch::new().reply(200, body));

        let coord = provider(http).resolve(&ip()).await.unwrap();

        assert_eq!(coord, Coordinate::new("40.712776", "-74.005974"));
    }

    #[tokio::test]
    async fn integer_coordinates_are_accepted() {
        let http = Arc::new(ScriptedFetch::new().reply(200, r#"{"location":{"lat":10,"lng":0}}"#));

        let coord = provider(http).resolve(&ip()).await.unwrap();

        assert_eq!(coord, Coordinate::new("10.000000", "0.000000"));
    }

    #[tokio::test]
    async fn missing_or_mistyped_location_is_malformed() {
        for body in [
            "",
            "null",
            "{}",
            r#"{"ip":"203.0.113.5"}"#,
            r#"{"location":"nowhere"}"#,
            r#"{"location":{"lat":1.0}}"#,
            r#"{"location":{"lat":"1.0","lng":"2.0"}}"#,
        ] {
            let http = Arc::new(ScriptedFetch::new().reply(200, body));

            let err = provider(http).resolve(&ip()).await.unwrap_err();

            assert_eq!(err.kind(), ErrorKind::MalformedResponse, "body {body:?}");
        }
    }

    #[tokio::test]
    async fn error_messages_never_leak_the_api_key() {
        let http = Arc::new(ScriptedFetch::new().reply(403, r#"{"code":403,"messages":"Access restricted"}"#));

        let err = provider(http).resolve(&ip()).await.unwrap_err();

        let msg = err.to_string();
        assert!(msg.starts_with("https://geo.ipify.org/api/v1 returned a status code 403"));
        assert!(!msg.contains("IPIFY_KEY"));
    }
}
