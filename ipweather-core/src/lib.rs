//! Core library for the `ipweather` server and CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The outbound HTTP capability and its `reqwest` implementation
//! - Interchangeable coordinate providers and the policy choosing between them
//! - Temperature lookup and the request orchestration tying it all together
//!
//! Every lookup layer reports failures through [`Outcome`] instead of panicking.

pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod provider;
pub mod service;
pub mod weather;

pub use config::{Config, Endpoints, ServiceConfig, ServiceId};
pub use error::{ErrorKind, LookupError, Outcome};
pub use http::{HttpFetch, HttpReply, ReqwestFetcher};
pub use model::{ClientIp, Coordinate, FORWARDED_FOR_HEADER, TemperatureReply};
pub use provider::{CoordinateProvider, ProviderId, select_provider};
pub use service::TemperatureService;
pub use weather::TemperatureResolver;
