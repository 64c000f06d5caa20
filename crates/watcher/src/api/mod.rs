//! Order service client
//!
//! Plain HTTP+JSON request/response pairs against the order service: list
//! the account's certificate orders, trigger a renewal, download the renewed
//! certificate artifacts. One attempt per call, no retries; authentication
//! is a static bearer credential composed from the configured token and
//! username.

mod client;
mod models;

pub use client::{ApiError, OrderClient};
pub use models::{CertificateBundle, Order};
