pub mod endpoints;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use endpoints::*;
pub use types::{ApiTransport, FailurePolicy, FetchError};
