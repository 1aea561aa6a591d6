use async_trait::async_trait;
use reqwest::Url;
use std::sync::Arc;
use tracing::info;

use crate::{
    error::{LookupError, Outcome},
    http::{HttpFetch, display_url, fetch, parse_endpoint},
    model::{ClientIp, Coordinate},
};

use super::{CoordinateProvider, ProviderId};

/// Free-tier lookup answering `GET {base}/{ip}/latlong/` with `"<lat>,<lon>"`.
///
/// Rate limited aggressively on the free plan; 429s surface as upstream errors.
#[derive(Debug, Clone)]
pub struct IpApiProvider {
    base_url: String,
    http: Arc<dyn HttpFetch>,
}

impl IpApiProvider {
    pub fn new(base_url: String, http: Arc<dyn HttpFetch>) -> Self {
        Self { base_url, http }
    }

    fn lookup_url(&self, client_ip: &ClientIp) -> Outcome<Url> {
        // `push` silently drops dot segments, which would turn the request into
        // `{base}/latlong/`, i.e. a lookup of this server's own address.
        if matches!(client_ip.as_str(), "." | "..") {
            return Err(LookupError::InvalidClientIp { value: client_ip.as_str().to_string() });
        }

        let mut url = parse_endpoint(&self.base_url)?;

        url.path_segments_mut()
            .map_err(|()| LookupError::InvalidEndpoint {
                url: self.base_url.clone(),
                reason: "cannot be a base URL".to_string(),
            })?
            .pop_if_empty()
            .push(client_ip.as_str())
            .push("latlong")
            .push("");

        Ok(url)
    }
}

/// Splits `"<lat>,<lon>"`; anything past the second field is ignored.
fn parse_latlong(url: &Url, body: &str) -> Outcome<Coordinate> {
    let mut fields = body.trim().split(',').map(str::trim);

    match (fields.next(), fields.next()) {
        (Some(lat), Some(lon)) if !lat.is_empty() && !lon.is_empty() => {
            Ok(Coordinate::new(lat, lon))
        }
        (_, None) if body.trim().is_empty() => {
            Err(LookupError::EmptyResponse { url: display_url(url) })
        }
        _ => Err(LookupError::malformed(
            display_url(url),
            format!("expected \"<lat>,<lon>\", got {body:?}"),
        )),
    }
}

#[async_trait]
impl CoordinateProvider for IpApiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::IpApi
    }

    async fn resolve(&self, client_ip: &ClientIp) -> Outcome<Coordinate> {
        let url = self.lookup_url(client_ip)?;
        let reply = fetch(self.http.as_ref(), &url).await?;

        let coordinate = parse_latlong(&url, &reply.body)?;
        info!(provider = %self.id(), coordinate = %coordinate, "resolved coordinates");

        Ok(coordinate)
    }
}
