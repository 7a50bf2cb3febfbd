//! Coarse predicates pushed down to the journey store.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;

use crate::domain::{RawJourney, SITE_SEPARATOR, SiteCode, VehicleClass};

/// A cheap, conservative row filter a journey store can apply before
/// anything is decoded.
///
/// Every row a later refine step could keep must pass the predicate; rows
/// that pass may still be dropped later.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoarsePredicate {
    /// Sites a row's chain must visit, in any order.
    pub required_sites: BTreeSet<SiteCode>,

    /// Allowed vehicle classes; `None` allows all.
    pub classes: Option<BTreeSet<VehicleClass>>,

    /// Rows must start at or after this time.
    pub from: Option<NaiveDateTime>,

    /// Rows must start before this time.
    pub to: Option<NaiveDateTime>,
}

impl CoarsePredicate {
    /// A predicate that admits every row.
    pub fn all() -> Self {
        Self::default()
    }

    /// Require every one of `sites`.
    pub fn with_sites(sites: BTreeSet<SiteCode>) -> Self {
        Self {
            required_sites: sites,
            ..Self::default()
        }
    }

    /// Combine two predicates; a row must satisfy both.
    pub fn and(mut self, other: CoarsePredicate) -> Self {
        self.required_sites.extend(other.required_sites);

        self.classes = match (self.classes, other.classes) {
            (Some(a), Some(b)) => Some(a.intersection(&b).cloned().collect()),
            (a, b) => a.or(b),
        };

        self.from = match (self.from, other.from) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };

        self.to = match (self.to, other.to) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };

        self
    }

    /// True if the predicate admits every row.
    pub fn is_unrestricted(&self) -> bool {
        *self == Self::default()
    }

    pub fn admits_class(&self, class: &VehicleClass) -> bool {
        self.classes.as_ref().is_none_or(|c| c.contains(class))
    }

    pub fn admits_time(&self, ts: NaiveDateTime) -> bool {
        self.from.is_none_or(|from| ts >= from) && self.to.is_none_or(|to| ts < to)
    }

    /// Checks required sites against undecoded chain text.
    ///
    /// Segments that do not parse are ignored here; they surface as record
    /// errors when the row is decoded.
    pub fn admits_chain_text(&self, chain: &str) -> bool {
        if self.required_sites.is_empty() {
            return true;
        }
        let visited: BTreeSet<SiteCode> = chain
            .trim()
            .split(SITE_SEPARATOR)
            .filter_map(|s| SiteCode::parse(s).ok())
            .collect();
        self.required_sites.is_subset(&visited)
    }

    /// Full check of a stored row.
    pub fn admits(&self, raw: &RawJourney) -> bool {
        self.admits_class(&raw.class)
            && self.admits_time(raw.timestamp)
            && self.admits_chain_text(&raw.chain)
    }
}
