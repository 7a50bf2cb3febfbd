//! Route matching and sub-route extraction.
//!
//! A [`RouteSpec`] names a start site, an end site and an ordered list of
//! via sites. Compiled into a [`RoutePattern`], it finds every matching
//! stretch of a journey's site chain; each match is then projected into a
//! journey of its own with times recomputed for just that stretch.

mod matcher;
mod project;
mod spec;

pub use matcher::{MatchState, RouteMatch, find_matches};
pub use project::{FinePass, extract_routes, fine_pass, project, refine_journeys};
pub use spec::{PatternKind, RouteError, RoutePattern, RouteSpec, SiteIndex, required_sites};
