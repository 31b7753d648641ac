//! Comparable per-route summaries.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{Leg, Step, TravelMode};

/// Prefix of the display label ("Xe" = bus).
const LABEL_PREFIX: &str = "Xe";

/// A ranked, display-ready digest of one route's primary leg.
///
/// Built once from a [`Leg`] and never mutated afterwards; ranking only
/// reorders collections of summaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
    summary: String,
    duration_seconds: u64,
    duration_text: String,
    walking_meters: u64,
    walking_text: String,
    transfer_count: u32,
    wait_minutes: u32,
    steps: Vec<Step>,
}

impl RouteSummary {
    /// Summarize a leg, measuring the wait for the first bus against `now`.
    pub fn from_leg(leg: Leg, now: DateTime<Utc>) -> Self {
        let mut walking_meters = 0u64;
        let mut transfer_count = 0u32;
        let mut lines: Vec<&str> = Vec::new();

        for step in &leg.steps {
            match (step.travel_mode, &step.transit_details) {
                (TravelMode::Walking, _) => {
                    walking_meters = walking_meters.saturating_add(step.distance.value)
                }
                (TravelMode::Transit, Some(details)) => {
                    transfer_count = transfer_count.saturating_add(1);
                    lines.push(details.line.label());
                }
                _ => {}
            }
        }

        let wait_minutes = first_departure(&leg.steps)
            .map(|departure| minutes_until(departure, now))
            .unwrap_or(0);

        let summary = format!("{} {}", LABEL_PREFIX, lines.join(", "));

        Self {
            summary,
            duration_seconds: leg.duration.value,
            duration_text: leg.duration.text,
            walking_meters,
            walking_text: format!("{}m", walking_meters),
            transfer_count,
            wait_minutes,
            steps: leg.steps,
        }
    }

    /// Display label, e.g. `"Xe 08, 102"`.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn duration_seconds(&self) -> u64 {
        self.duration_seconds
    }

    pub fn duration_text(&self) -> &str {
        &self.duration_text
    }

    pub fn walking_meters(&self) -> u64 {
        self.walking_meters
    }

    pub fn walking_text(&self) -> &str {
        &self.walking_text
    }

    /// Number of transit boardings.
    pub fn transfer_count(&self) -> u32 {
        self.transfer_count
    }

    /// Whole minutes until the first bus leaves, never negative.
    pub fn wait_minutes(&self) -> u32 {
        self.wait_minutes
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

/// Departure epoch of the first TRANSIT step in leg order.
fn first_departure(steps: &[Step]) -> Option<i64> {
    steps
        .iter()
        .find(|s| s.is_transit())
        .and_then(|s| s.transit_details.as_ref())
        .map(|d| d.departure_time.value)
}

/// Minutes from `now` to `departure`, truncated, clamped to `0..=u32::MAX`.
///
/// Computed in `i128` so any pair of epoch values is representable.
fn minutes_until(departure: i64, now: DateTime<Utc>) -> u32 {
    let delta_ms = i128::from(departure) * 1000 - i128::from(now.timestamp_millis());
    let minutes = (delta_ms / 60_000).max(0);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}
