//! Watch-and-renew orchestration
//!
//! Wires the time race, the order client and the certificate store into one
//! pass: resolve "now", fetch the watched order, report the remaining time,
//! and renew, download and save when expiry is close enough.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info, warn};

use certwatch_common::{remaining_until, RemainingTime};
use certwatch_config::Config;

use crate::api::OrderClient;
use crate::i18n::Catalog;
use crate::resolver::{RaceOutcome, TimeOrigin, TimeResolver};
use crate::store::{CertificateStore, SavedPair};
use crate::timesource::{self, ApiHzSource, TimeSource, WorldClockSource, WorldTimeSource};

/// Timeout for order service calls. Time sources carry their own hard timeout.
const ORDER_CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Report of one watch pass.
#[derive(Debug)]
pub struct WatchReport {
    /// Where "now" came from.
    pub origin: TimeOrigin,
    /// Signed time remaining until the order's expiry.
    pub remaining: RemainingTime,
    /// Paths written if a renewal ran.
    pub renewed: Option<SavedPair>,
}

/// One-shot watcher over the configured order.
pub struct Watcher {
    config: Config,
    catalog: Catalog,
    resolver: TimeResolver,
}

impl Watcher {
    pub fn new(config: Config, catalog: Catalog) -> Self {
        Self {
            config,
            catalog,
            resolver: TimeResolver::new(),
        }
    }

    /// Run one pass. With `renew` false the pass only reports.
    pub async fn run(&self, renew: bool) -> Result<WatchReport> {
        let started = Instant::now();

        let outcome = self.resolve_now().await?;

        info!("{}", self.catalog.get("making_request"));
        let order_client = OrderClient::new(
            reqwest::Client::builder()
                .timeout(ORDER_CLIENT_TIMEOUT)
                .build()
                .context("failed to build HTTP client")?,
            &self.config.api_url,
            &self.config.token,
            &self.config.username,
        );

        let orders = order_client
            .list_orders()
            .await
            .map_err(|err| anyhow!("{}", self.catalog.format("api_error", &[&err])))?;
        let order = OrderClient::find_order(&orders, &self.config.target_mark).map_err(|_| {
            anyhow!(
                "{}",
                self.catalog
                    .format("mark_not_found", &[&self.config.target_mark])
            )
        })?;

        let remaining = remaining_until(&order.time_end, &outcome.timestamp)
            .context("order expiry timestamp is malformed")?;
        info!(
            "{}",
            self.catalog.format(
                "time_remaining",
                &[
                    &remaining.days,
                    &remaining.hours,
                    &remaining.minutes,
                    &remaining.seconds
                ]
            )
        );

        let domains = if order.domains.is_empty() {
            "N/A".to_string()
        } else {
            order.domains.join(", ")
        };
        info!(
            "{}",
            self.catalog
                .format("certificate_info", &[&domains, &order.time_end])
        );

        let mut renewed = None;
        if remaining.days < self.config.renew_before_days {
            if renew {
                renewed = Some(self.renew_and_store(&order_client, &order.id).await?);
            } else {
                info!(
                    order_id = %order.id,
                    remaining_days = remaining.days,
                    "Renewal due, skipped in check mode"
                );
            }
        } else {
            info!(
                "{}",
                self.catalog
                    .format("renewal_not_needed", &[&self.config.renew_before_days])
            );
        }

        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Watch pass finished"
        );
        Ok(WatchReport {
            origin: outcome.origin,
            remaining,
            renewed,
        })
    }

    /// Race the stock sources for the current time.
    async fn resolve_now(&self) -> Result<RaceOutcome> {
        info!("{}", self.catalog.get("fetching_network_time"));
        let client = timesource::source_client().context("failed to build HTTP client")?;
        let sources: Vec<Arc<dyn TimeSource>> = vec![
            Arc::new(WorldTimeSource::new(client.clone())),
            Arc::new(WorldClockSource::new(client.clone())),
            Arc::new(ApiHzSource::new(
                client,
                &self.config.apihz_id,
                &self.config.apihz_key,
            )),
        ];

        let outcome = self.resolver.resolve(sources).await;
        match outcome.origin {
            TimeOrigin::Source(name) => {
                info!("{}", self.catalog.get(&format!("{name}_api_success")));
            }
            TimeOrigin::LocalFallback => {
                warn!("{}", self.catalog.get("network_time_error"));
            }
        }
        Ok(outcome)
    }

    /// Renew, download and persist the certificate pair.
    async fn renew_and_store(&self, order_client: &OrderClient, order_id: &str) -> Result<SavedPair> {
        info!(
            "{}",
            self.catalog.format(
                "renewing_order",
                &[&self.config.renew_before_days, &order_id]
            )
        );
        let renewed_id = order_client
            .renew(order_id)
            .await
            .map_err(|err| anyhow!("{}", self.catalog.format("api_error", &[&err])))?;
        info!("{}", self.catalog.format("renew_success", &[&renewed_id]));

        info!(
            "{}",
            self.catalog
                .format("downloading_certificate", &[&renewed_id])
        );
        let bundle = order_client
            .download_certificate(&renewed_id)
            .await
            .map_err(|err| anyhow!("{}", self.catalog.format("api_error", &[&err])))?;

        let store = CertificateStore::new(&self.config.output_dir);
        let saved = store.save(&self.config.target_mark, &bundle)?;
        info!(
            "{}",
            self.catalog.format(
                "certificate_saved",
                &[&saved.cert_path.display(), &saved.key_path.display()]
            )
        );
        Ok(saved)
    }
}
