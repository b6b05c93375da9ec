//! HTTP asset fetching: blocking requests with progress, error and
//! completion notifications, plus existence checks.

mod error;
mod request;
mod tls;
mod url;

#[cfg(test)]
mod tests;

pub use error::RequestError;
pub use request::{HttpRequest, RequestObserver};
pub use url::encode_url;
