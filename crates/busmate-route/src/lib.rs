//! Transit route analysis for Busmate.
//!
//! Turns the raw alternatives returned by a directions provider into
//! comparable [`RouteSummary`] values and ranks them under a user-chosen
//! [`Criterion`]. The crate never computes routes itself; the
//! [`DirectionsProvider`] trait is the seam to whoever does.

pub mod analyzer;
pub mod clock;
pub mod criterion;
pub mod error;
pub mod provider;
pub mod summary;
pub mod types;

pub use analyzer::RouteAnalyzer;
pub use clock::{Clock, FixedClock, SystemClock};
pub use criterion::Criterion;
pub use error::RouteError;
pub use provider::{DirectionsProvider, FileDirections, GoogleDirectionsClient, StaticDirections};
pub use summary::RouteSummary;
pub use types::{Leg, Measure, RawRoute, Step, TimePoint, TransitDetails, TransitLine, TravelMode};
