//! Certwatch Library
//!
//! A certificate order expiry watcher: resolves "now" by racing independent
//! network time sources, compares it against a configured order's expiry,
//! and renews and downloads the certificate when expiry is imminent.
//!
//! This library provides:
//!
//! - **Time Sources**: pluggable network time endpoints, one HTTP GET each
//! - **Time Resolution**: a bounded race adopting the first source to answer,
//!   with a local-clock fallback
//! - **Order Client**: list, renew and download over the order service API
//! - **Certificate Storage**: the downloaded pair written under a per-mark
//!   directory
//! - **Localization**: embedded message catalogs for user-facing output
//!
//! # Example
//!
//! ```ignore
//! use certwatch::{TimeResolver, WorldTimeSource, WorldClockSource};
//! use std::sync::Arc;
//!
//! let client = certwatch::timesource::source_client()?;
//! let resolver = TimeResolver::new();
//! let outcome = resolver
//!     .resolve(vec![
//!         Arc::new(WorldTimeSource::new(client.clone())),
//!         Arc::new(WorldClockSource::new(client)),
//!     ])
//!     .await;
//! println!("now = {} (via {})", outcome.timestamp, outcome.origin);
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

pub mod api;
pub mod i18n;
pub mod logging;
pub mod resolver;
pub mod store;
pub mod timesource;
pub mod watcher;

// ============================================================================
// Public API Re-exports
// ============================================================================

// Order service
pub use api::{ApiError, CertificateBundle, Order, OrderClient};

// Time resolution
pub use resolver::{RaceOutcome, TimeOrigin, TimeResolver, DEFAULT_RACE_DEADLINE};

// Certificate storage
pub use store::{CertificateStore, SavedPair, StoreError};

// Time sources
pub use timesource::{
    ApiHzSource, SourceResult, SourceUnavailable, TimeSource, WorldClockSource, WorldTimeSource,
    SOURCE_TIMEOUT,
};

// Orchestration
pub use watcher::{WatchReport, Watcher};
