//! Ranking criteria.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RouteError;
use crate::summary::RouteSummary;

/// The single key routes are ranked by, ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// Order by total leg duration.
    #[default]
    ShortestTime,
    /// Order by total walking distance.
    LeastWalking,
    /// Order by number of transit boardings.
    FewestTransfers,
}

impl Criterion {
    pub const ALL: [Criterion; 3] = [
        Criterion::ShortestTime,
        Criterion::LeastWalking,
        Criterion::FewestTransfers,
    ];

    /// The value a summary is sorted by under this criterion.
    pub fn sort_key(&self, route: &RouteSummary) -> u64 {
        match self {
            Criterion::ShortestTime => route.duration_seconds(),
            Criterion::LeastWalking => route.walking_meters(),
            Criterion::FewestTransfers => u64::from(route.transfer_count()),
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::ShortestTime => write!(f, "shortest time"),
            Criterion::LeastWalking => write!(f, "least walking"),
            Criterion::FewestTransfers => write!(f, "fewest transfers"),
        }
    }
}

impl FromStr for Criterion {
    type Err = RouteError;

    /// Accepts the English labels (any case, with spaces, dashes or
    /// underscores) and the Vietnamese labels of the original picker.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c == '_' { ' ' } else { c })
            .collect();

        match normalized.as_str() {
            "shortest time" | "time" | "thời gian ngắn nhất" => Ok(Criterion::ShortestTime),
            "least walking" | "walking" | "ít đi bộ nhất" => Ok(Criterion::LeastWalking),
            "fewest transfers" | "transfers" | "ít chuyển tuyến nhất" => {
                Ok(Criterion::FewestTransfers)
            }
            _ => Err(RouteError::UnknownCriterion(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_english_labels() {
        assert_eq!(
            "shortest time".parse::<Criterion>().unwrap(),
            Criterion::ShortestTime
        );
        assert_eq!(
            "Least Walking".parse::<Criterion>().unwrap(),
            Criterion::LeastWalking
        );
        assert_eq!(
            "fewest-transfers".parse::<Criterion>().unwrap(),
            Criterion::FewestTransfers
        );
        assert_eq!(
            " fewest_transfers ".parse::<Criterion>().unwrap(),
            Criterion::FewestTransfers
        );
    }

    #[test]
    fn test_parse_vietnamese_labels() {
        assert_eq!(
            "Thời gian ngắn nhất".parse::<Criterion>().unwrap(),
            Criterion::ShortestTime
        );
        assert_eq!(
            "Ít đi bộ nhất".parse::<Criterion>().unwrap(),
            Criterion::LeastWalking
        );
        assert_eq!(
            "Ít chuyển tuyến nhất".parse::<Criterion>().unwrap(),
            Criterion::FewestTransfers
        );
    }

    #[test]
    fn test_parse_unknown() {
        let err = "cheapest".parse::<Criterion>().unwrap_err();
        assert!(matches!(err, RouteError::UnknownCriterion(ref s) if s == "cheapest"));
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        for criterion in Criterion::ALL {
            assert_eq!(criterion.to_string().parse::<Criterion>().unwrap(), criterion);
        }
    }

    #[test]
    fn test_default_is_shortest_time() {
        assert_eq!(Criterion::default(), Criterion::ShortestTime);
    }
}
