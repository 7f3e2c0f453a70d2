//! HTTP/1.x framing for captured streams.

mod body;
pub mod dispatch;
pub mod types;

pub use dispatch::{dispatch, HttpHandler};
pub use types::{DecodedRequest, DecodedResponse, Headers};
