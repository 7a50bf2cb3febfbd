//! Domain types for camera journey analysis.
//!
//! This module contains the core domain model types that represent
//! validated journey data. All types enforce their invariants at construction
//! time, so code that receives these types can trust their validity.

mod chain;
mod error;
mod journey;
mod site;
mod time_chain;

pub use chain::{Chain, SITE_SEPARATOR};
pub use error::{ChainError, RecordError, RecordErrorKind};
pub use journey::{
    Journey, JourneyId, RawJourney, VehicleClass, minutes_to_duration, offset_by_minutes,
    timestamp_format,
};
pub use site::{Direction, InvalidSiteCode, SiteCode};
pub use time_chain::{OffsetMode, TimeChainFormat, TimeOffsetChain, TimedSite};
