//! Fixed-interval refresh of admin views, exposed as streams of snapshots.
//!
//! Consumers only see a [`SnapshotFeed`]. [`PollingFeed`] re-fetches the full collection on a
//! timer; a push-based transport can implement the same trait without changing consumers.
//! Dropping a stream cancels its timer.

use crate::{
    api::CafeApi,
    config::AppConfig,
    core::admin::{DashboardStats, OrderRecord},
    errors::Result,
};
use futures::stream::BoxStream;
use std::{future::Future, sync::Arc, time::Duration};
use tokio::time::MissedTickBehavior;
use tracing::trace;

/// A stream of fetch results, one per refresh.
pub type SnapshotStream<T> = BoxStream<'static, Result<T>>;

/// Calls `fetch` immediately and then once every `period`, yielding each result.
///
/// Failed fetches are yielded like any other result and do not end the stream. The next
/// fetch starts only after the previous result was consumed, so refreshes never overlap.
pub fn poll<T, F, Fut>(period: Duration, mut fetch: F) -> SnapshotStream<T>
where
    T: Send + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let period = period.max(Duration::from_millis(1));
    Box::pin(async_stream::stream! {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            trace!("Polling tick");
            yield fetch().await;
        }
    })
}

/// Source of live admin data.
pub trait SnapshotFeed: Send + Sync {
    /// Full order list, refreshed continuously.
    fn orders(&self) -> SnapshotStream<Vec<OrderRecord>>;

    /// Dashboard aggregates, refreshed continuously.
    fn stats(&self) -> SnapshotStream<DashboardStats>;
}

/// [`SnapshotFeed`] that polls the REST API.
pub struct PollingFeed<A: ?Sized> {
    api: Arc<A>,
    order_period: Duration,
    stats_period: Duration,
}

impl<A: CafeApi + ?Sized + 'static> PollingFeed<A> {
    /// Polls `api` with the given periods.
    pub const fn new(api: Arc<A>, order_period: Duration, stats_period: Duration) -> Self {
        Self {
            api,
            order_period,
            stats_period,
        }
    }

    /// Polls `api` with the periods from configuration.
    pub fn from_config(api: Arc<A>, config: &AppConfig) -> Self {
        Self::new(api, config.order_poll_interval(), config.stats_poll_interval())
    }
}

impl<A: CafeApi + ?Sized + 'static> SnapshotFeed for PollingFeed<A> {
    fn orders(&self) -> SnapshotStream<Vec<OrderRecord>> {
        let api = Arc::clone(&self.api);
        poll(self.order_period, move || {
            let api = Arc::clone(&api);
            async move { api.list_orders().await }
        })
    }

    fn stats(&self) -> SnapshotStream<DashboardStats> {
        let api = Arc::clone(&self.api);
        poll(self.stats_period, move || {
            let api = Arc::clone(&api);
            async move { api.admin_stats().await }
        })
    }
}
