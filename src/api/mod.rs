//! Backend access: HTTP transport, endpoints, normalization and mutations.

pub mod client;
pub mod download;
pub mod error;
pub mod mutations;
pub mod normalize;
pub mod urls;

pub use client::ApiClient;
pub use error::{Error, ErrorInfo, Result};
pub use urls::Endpoint;
