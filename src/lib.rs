//! Rate-limited client for a document creation API.
//!
//! [`DocumentApi`] admits at most `capacity` submissions per fixed window and
//! suspends callers until a slot frees up instead of rejecting them.

pub mod config;
pub mod document_service;
pub mod errors;
pub mod models;
pub mod rate_limiter;
pub mod transport;

pub use config::GateConfig;
pub use document_service::DocumentApi;
pub use errors::{ApiError, TransportError};
pub use models::CreateDocumentRequest;
pub use rate_limiter::{RateLimiter, TimeUnit};
pub use transport::{DocumentTransport, HttpTransport};
