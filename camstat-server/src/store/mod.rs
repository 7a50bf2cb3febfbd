//! Journey storage.
//!
//! A [`JourneyStore`] answers coarse queries over stored rows and knows
//! which sites it has seen. Decoding and precise filtering happen later, on
//! the rows it returns.

mod error;
mod memory;

pub use error::StoreError;
pub use memory::MemoryStore;

use crate::domain::{RawJourney, SiteCode};
use crate::filter::CoarsePredicate;
use crate::route::SiteIndex;

/// Backend holding journey rows.
pub trait JourneyStore: SiteIndex + Send + Sync {
    /// Rows admitted by `predicate`, in storage order.
    fn journeys(&self, predicate: &CoarsePredicate) -> Result<Vec<RawJourney>, StoreError>;

    /// Every site appearing in any stored chain, sorted.
    fn sites(&self) -> Vec<SiteCode>;
}
