//! Route analyzer: ingest, summarize and rank provider alternatives.

use busmate_core::error::BusmateError;
use serde_json::Value;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::criterion::Criterion;
use crate::summary::RouteSummary;
use crate::types::ingest_route;

/// Converts raw directions alternatives into ranked [`RouteSummary`] values.
///
/// The analyzer is pure apart from reading its clock, which is only used for
/// the wait-time field. Inject a [`crate::FixedClock`] for reproducible output.
#[derive(Debug, Clone, Default)]
pub struct RouteAnalyzer<C = SystemClock> {
    clock: C,
}

impl RouteAnalyzer<SystemClock> {
    pub fn new() -> Self {
        Self { clock: SystemClock }
    }
}

impl<C: Clock> RouteAnalyzer<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Summarize and rank every well-formed route in `raw_routes`.
    ///
    /// Malformed routes are logged and skipped, so the output is never longer
    /// than the input. An empty input yields an empty output.
    pub fn analyze(&self, raw_routes: &[Value], criterion: Criterion) -> Vec<RouteSummary> {
        if raw_routes.is_empty() {
            debug!("No routes to analyze");
            return Vec::new();
        }

        let now = self.clock.now();
        let mut summaries: Vec<RouteSummary> = raw_routes
            .iter()
            .enumerate()
            .filter_map(|(index, value)| match ingest_route(index, value) {
                Ok(leg) => Some(RouteSummary::from_leg(leg, now)),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed route");
                    None
                }
            })
            .collect();

        rank(&mut summaries, criterion);

        debug!(
            received = raw_routes.len(),
            kept = summaries.len(),
            criterion = %criterion,
            "Routes analyzed"
        );
        summaries
    }

    /// Like [`analyze`](Self::analyze), but takes the provider's result
    /// directly. A provider failure yields no routes.
    pub fn analyze_response(
        &self,
        response: &Result<Vec<Value>, BusmateError>,
        criterion: Criterion,
    ) -> Vec<RouteSummary> {
        match response {
            Ok(routes) => self.analyze(routes, criterion),
            Err(e) => {
                debug!(error = %e, "Provider failed, treating as no routes");
                Vec::new()
            }
        }
    }

    /// The top-ranked route, if any survived ingestion.
    pub fn best(&self, raw_routes: &[Value], criterion: Criterion) -> Option<RouteSummary> {
        self.analyze(raw_routes, criterion).into_iter().next()
    }
}

/// Stable ascending sort on the single key chosen by `criterion`.
///
/// Routes with equal keys keep the provider's order.
pub fn rank(summaries: &mut [RouteSummary], criterion: Criterion) {
    summaries.sort_by_key(|s| criterion.sort_key(s));
}
