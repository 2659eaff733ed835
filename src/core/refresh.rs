//! Periodic fetch-and-aggregate pipeline publishing dashboard state.

use crate::core::analytics::{self, EnrichedHolding, PortfolioTotals, SectorRollup};
use crate::core::error::CycleError;
use crate::core::fetcher::MarketDataFetcher;
use crate::core::portfolio::Holding;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

/// Everything a presentation layer needs to render the dashboard.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub holdings: Vec<EnrichedHolding>,
    pub sectors: Vec<SectorRollup>,
    pub totals: PortfolioTotals,
    pub loading: bool,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleTrigger {
    Initial,
    Scheduled,
    Manual,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Completed,
    /// Another cycle was already in flight; this request was dropped.
    Coalesced,
    Failed(CycleError),
}

/// Releases the in-flight flag and clears `loading` when a cycle ends or its
/// future is dropped, as happens when the scheduler is stopped mid-cycle.
struct InFlightGuard<'a> {
    in_flight: &'a AtomicBool,
    state: &'a watch::Sender<DashboardState>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.state.send_if_modified(|state| std::mem::replace(&mut state.loading, false));
        self.in_flight.store(false, Ordering::Release);
    }
}

struct CycleResult {
    holdings: Vec<EnrichedHolding>,
    sectors: Vec<SectorRollup>,
    totals: PortfolioTotals,
}

pub struct RefreshPipeline {
    fetcher: Arc<MarketDataFetcher>,
    holdings: Vec<Holding>,
    state: watch::Sender<DashboardState>,
    in_flight: AtomicBool,
}

impl RefreshPipeline {
    pub fn new(fetcher: Arc<MarketDataFetcher>, holdings: Vec<Holding>) -> Self {
        let (state, _) = watch::channel(DashboardState {
            loading: true,
            ..Default::default()
        });
        Self {
            fetcher,
            holdings,
            state,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Runs one fetch-aggregate cycle and publishes the result.
    ///
    /// At most one cycle runs at a time; a request arriving while one is in
    /// flight returns [`CycleOutcome::Coalesced`] without doing anything. On
    /// failure the previously published holdings stay in place and only the
    /// error message changes.
    pub async fn run_cycle(&self, trigger: CycleTrigger) -> CycleOutcome {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            debug!(?trigger, "Refresh already in flight, coalescing");
            return CycleOutcome::Coalesced;
        }
        let _guard = InFlightGuard {
            in_flight: &self.in_flight,
            state: &self.state,
        };

        if trigger != CycleTrigger::Scheduled {
            self.state.send_modify(|state| state.loading = true);
        }
        info!(?trigger, holdings = self.holdings.len(), "Refresh cycle started");

        match self.refresh().await {
            Ok(result) => {
                self.state.send_modify(|state| {
                    state.holdings = result.holdings;
                    state.sectors = result.sectors;
                    state.totals = result.totals;
                    state.loading = false;
                    state.error = None;
                    state.last_updated = Some(Utc::now());
                });
                info!(?trigger, "Refresh cycle finished");
                CycleOutcome::Completed
            }
            Err(e) => {
                error!(?trigger, error = %e, "Refresh cycle failed");
                self.state.send_modify(|state| {
                    state.loading = false;
                    state.error = Some(format!("Failed to fetch portfolio data: {e}"));
                });
                CycleOutcome::Failed(e)
            }
        }
    }

    async fn refresh(&self) -> Result<CycleResult, CycleError> {
        for holding in &self.holdings {
            holding.validate()?;
        }

        let fetcher = Arc::clone(&self.fetcher);
        let holdings = self.holdings.clone();
        let updated = tokio::spawn(async move { fetcher.fetch_all(&holdings).await })
            .await
            .map_err(|e| CycleError::Aborted(e.to_string()))?;

        let enriched = analytics::compute_metrics(&updated);
        let sectors = analytics::group_by_sector(&enriched);
        let totals = analytics::portfolio_totals(&enriched);
        Ok(CycleResult {
            holdings: enriched,
            sectors,
            totals,
        })
    }
}

/// Drives a [`RefreshPipeline`] from a cancellable repeating timer.
pub struct RefreshScheduler {
    pipeline: Arc<RefreshPipeline>,
    interval: Duration,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshScheduler {
    pub fn new(pipeline: Arc<RefreshPipeline>, interval: Duration) -> Self {
        Self {
            pipeline,
            interval,
            timer: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.pipeline.subscribe()
    }

    /// Runs a cycle right away, then one every `interval`. Calling `start`
    /// again replaces the running timer.
    pub async fn start(&self) {
        let mut timer = self.timer.lock().await;
        if let Some(handle) = timer.take() {
            debug!("Clearing existing update interval");
            handle.abort();
        }

        let pipeline = Arc::clone(&self.pipeline);
        let period = self.interval;
        *timer = Some(tokio::spawn(async move {
            pipeline.run_cycle(CycleTrigger::Initial).await;

            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                pipeline.run_cycle(CycleTrigger::Scheduled).await;
            }
        }));
        info!(interval = ?period, "Real-time updates started");
    }

    pub async fn stop(&self) {
        if let Some(handle) = self.timer.lock().await.take() {
            handle.abort();
            info!("Real-time updates stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.timer
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Runs a cycle now unless one is already in flight.
    pub async fn trigger_now(&self) -> CycleOutcome {
        info!("Manual refresh triggered");
        self.pipeline.run_cycle(CycleTrigger::Manual).await
    }
}
