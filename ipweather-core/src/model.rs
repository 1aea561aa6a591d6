use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{LookupError, Outcome};

/// Header carrying the caller's claimed public IP.
///
/// The value is trusted verbatim: anyone can claim any address, which is
/// acceptable only on a private network or behind a proxy that overwrites it.
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Caller's public IP address as claimed by the forwarding header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(String);

impl ClientIp {
    /// Accepts any non-blank header value; surrounding whitespace is dropped.
    pub fn from_header(value: Option<&str>) -> Outcome<Self> {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| ClientIp(v.to_owned()))
            .ok_or(LookupError::MissingClientIp)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Latitude/longitude as decimal text, exactly as the weather query will carry them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinate {
    pub latitude: String,
    pub longitude: String,
}

impl Coordinate {
    pub fn new(latitude: impl Into<String>, longitude: impl Into<String>) -> Self {
        Self { latitude: latitude.into(), longitude: longitude.into() }
    }

    /// Fixed six-decimal notation for providers that report numbers.
    pub fn from_degrees(latitude: f64, longitude: f64) -> Self {
        Self::new(format!("{latitude:.6}"), format!("{longitude:.6}"))
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// JSON body returned to callers: `{"temperature": ..}` or `{"message": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemperatureReply {
    Temperature { temperature: f64 },
    Message { message: String },
}

impl TemperatureReply {
    pub fn is_success(&self) -> bool {
        matches!(self, TemperatureReply::Temperature { .. })
    }
}

impl From<Outcome<f64>> for TemperatureReply {
    fn from(outcome: Outcome<f64>) -> Self {
        match outcome {
            Ok(temperature) => TemperatureReply::Temperature { temperature },
            Err(err) => TemperatureReply::Message { message: err.to_string() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_ip_requires_non_blank_header() {
        assert_eq!(ClientIp::from_header(None), Err(LookupError::MissingClientIp));
        assert_eq!(ClientIp::from_header(Some("")), Err(LookupError::MissingClientIp));
        assert_eq!(ClientIp::from_header(Some("  \n")), Err(LookupError::MissingClientIp));

        let ip = ClientIp::from_header(Some(" 203.0.113.5\n")).expect("ip should be accepted");
        assert_eq!(ip.as_str(), "203.0.113.5");
    }

    #[test]
    fn client_ip_is_opaque() {
        let ip = ClientIp::from_header(Some("2001:db8::1")).expect("ipv6 text is passed through");
        assert_eq!(ip.to_string(), "2001:db8::1");
    }

    #[test]
    fn from_degrees_uses_six_decimals() {
        let coord = Coordinate::from_degrees(12.5, -7.25);
        assert_eq!(coord.latitude, "12.500000");
        assert_eq!(coord.longitude, "-7.250000");
    }

    #[test]
    fn reply_serializes_success_shape() {
        let reply = TemperatureReply::from(Ok(21.3));

        assert!(reply.is_success());
        assert_eq!(serde_json::to_string(&reply).unwrap(), r#"{"temperature":21.3}"#);
    }

    #[test]
    fn reply_serializes_error_shape() {
        let reply = TemperatureReply::from(Err(LookupError::MissingClientIp));

        assert!(!reply.is_success());
        assert_eq!(
            serde_json::to_string(&reply).unwrap(),
            r#"{"message":"Could not identify the client's IP"}"#
        );
    }

    #[test]
    fn reply_deserializes_both_shapes() {
        let ok: TemperatureReply = serde_json::from_str(r#"{"temperature":-3.5}"#).unwrap();
        assert_eq!(ok, TemperatureReply::Temperature { temperature: -3.5 });

        let err: TemperatureReply = serde_json::from_str(r#"{"message":"boom"}"#).unwrap();
        assert_eq!(err, TemperatureReply::Message { message: "boom".into() });
    }
}
