//! Two-phase journey filters.
//!
//! Each filter contributes a [`CoarsePredicate`] the store can evaluate on
//! raw rows, and a refine step run on decoded journeys. Refinement may drop
//! journeys, or replace one journey with several derived ones.

mod class_filter;
mod predicate;
mod route_filter;
mod time_window;

pub use class_filter::ClassFilter;
pub use predicate::CoarsePredicate;
pub use route_filter::RouteFilter;
pub use time_window::TimeWindowFilter;

use crate::domain::Journey;
use crate::route::FinePass;

/// A pluggable filter stage.
pub trait Filter: Send + Sync {
    /// Conservative row predicate for the store.
    fn coarse_predicate(&self) -> CoarsePredicate;

    /// Precise filtering of decoded journeys.
    ///
    /// Records that cannot be processed go in the returned `errors` and do
    /// not affect the rest of the batch.
    fn refine(&self, journeys: Vec<Journey>) -> FinePass;

    /// Short human readable summary, used in logs.
    fn describe(&self) -> String;
}

impl<F: Filter + ?Sized> Filter for Box<F> {
    fn coarse_predicate(&self) -> CoarsePredicate {
        (**self).coarse_predicate()
    }

    fn refine(&self, journeys: Vec<Journey>) -> FinePass {
        (**self).refine(journeys)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
