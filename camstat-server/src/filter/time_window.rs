//! Start-time window filter.

use chrono::NaiveDateTime;

use crate::domain::{Journey, timestamp_format};
use crate::route::FinePass;

use super::{CoarsePredicate, Filter};

/// Keep journeys starting in `[from, to)`.
///
/// Applied after a route filter this tests the start of the derived
/// journey, which can be later than the start of the stored row. Only the
/// upper bound is therefore safe to push down to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindowFilter {
    from: Option<NaiveDateTime>,
    to: Option<NaiveDateTime>,
}

impl TimeWindowFilter {
    pub fn new(from: Option<NaiveDateTime>, to: Option<NaiveDateTime>) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.from.is_none_or(|from| ts >= from) && self.to.is_none_or(|to| ts < to)
    }
}

impl Filter for TimeWindowFilter {
    fn coarse_predicate(&self) -> CoarsePredicate {
        CoarsePredicate {
            to: self.to,
            ..CoarsePredicate::default()
        }
    }

    fn refine(&self, mut journeys: Vec<Journey>) -> FinePass {
        journeys.retain(|j| self.contains(j.start()));
        FinePass {
            journeys,
            errors: Vec::new(),
        }
    }

    fn describe(&self) -> String {
        let show = |t: Option<NaiveDateTime>| {
            t.map_or_else(
                || "..".to_string(),
                |t| t.format(timestamp_format::FORMAT).to_string(),
            )
        };
        format!("start in [{}, {})", show(self.from), show(self.to))
    }
}
