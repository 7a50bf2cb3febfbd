//! Keep journeys that follow a route, cut down to just that route.

use crate::domain::Journey;
use crate::route::{FinePass, RouteError, RoutePattern, RouteSpec, SiteIndex, refine_journeys};

use super::{CoarsePredicate, Filter};

/// Filters journeys by route shape.
///
/// The coarse pass requires every route site to be visited. The refine pass
/// replaces each journey with one derived journey per matching sub-route,
/// dropping journeys with no match.
#[derive(Debug, Clone)]
pub struct RouteFilter {
    spec: RouteSpec,
    pattern: RoutePattern,
}

impl RouteFilter {
    /// Build a filter, checking every route site against `index`.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::UnknownSite`] naming the first site `index`
    /// does not know.
    pub fn new(spec: RouteSpec, index: &impl SiteIndex) -> Result<Self, RouteError> {
        let pattern = spec.compile_checked(index)?;
        Ok(Self { spec, pattern })
    }

    pub fn spec(&self) -> &RouteSpec {
        &self.spec
    }

    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }
}

impl Filter for RouteFilter {
    fn coarse_predicate(&self) -> CoarsePredicate {
        CoarsePredicate::with_sites(self.pattern.required_sites())
    }

    fn refine(&self, journeys: Vec<Journey>) -> FinePass {
        refine_journeys(&journeys, &self.pattern)
    }

    fn describe(&self) -> String {
        let mut out = format!("route {}", self.spec.start);
        for via in &self.spec.via {
            out.push_str(&format!(" via {via}"));
        }
        out.push_str(&format!(" to {}", self.spec.end));
        if !self.spec.indirect_allowed {
            out.push_str(" (direct)");
        }
        out
    }
}
