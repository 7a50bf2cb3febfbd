//! Route specifications and their compiled form.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::SiteCode;

/// Error from building a route search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// A requested site has never been seen by the journey store
    #[error("unknown site: {0}")]
    UnknownSite(SiteCode),
}

/// Anything that can say whether a site is known.
///
/// Implemented by journey stores so route requests can be checked before
/// they are compiled.
pub trait SiteIndex {
    fn contains_site(&self, site: &SiteCode) -> bool;
}

impl SiteIndex for HashSet<SiteCode> {
    fn contains_site(&self, site: &SiteCode) -> bool {
        self.contains(site)
    }
}

impl SiteIndex for BTreeSet<SiteCode> {
    fn contains_site(&self, site: &SiteCode) -> bool {
        self.contains(site)
    }
}

fn default_indirect() -> bool {
    true
}

/// A route request: where journeys start and end, which sites they must
/// pass on the way, and whether other sites may appear in between.
///
/// # Examples
///
/// ```
/// use camstat_server::domain::SiteCode;
/// use camstat_server::route::RouteSpec;
///
/// let site = |s| SiteCode::parse(s).unwrap();
/// let spec = RouteSpec::new(site("05_N"), site("20_S"))
///     .with_via(vec![site("12_E")])
///     .indirect(false);
///
/// assert_eq!(spec.required_sites().len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteSpec {
    pub start: SiteCode,
    pub end: SiteCode,

    /// Sites that must be passed, in this order.
    #[serde(default)]
    pub via: Vec<SiteCode>,

    /// Whether unlisted sites may appear between the listed ones.
    #[serde(default = "default_indirect")]
    pub indirect_allowed: bool,
}

impl RouteSpec {
    /// A route from `start` to `end`, no via sites, detours allowed.
    pub fn new(start: SiteCode, end: SiteCode) -> Self {
        Self {
            start,
            end,
            via: Vec::new(),
            indirect_allowed: true,
        }
    }

    /// Set the ordered via sites.
    pub fn with_via(mut self, via: Vec<SiteCode>) -> Self {
        self.via = via;
        self
    }

    /// Set whether detours are allowed.
    pub fn indirect(mut self, allowed: bool) -> Self {
        self.indirect_allowed = allowed;
        self
    }

    /// True for a route that starts and ends at the same site with no via
    /// sites, which matches everything from the first visit onwards.
    pub fn is_open_ended(&self) -> bool {
        self.start == self.end && self.via.is_empty()
    }

    /// Sites every matching journey must visit.
    pub fn required_sites(&self) -> BTreeSet<SiteCode> {
        required_sites(
            [Some(self.start), Some(self.end)]
                .into_iter()
                .chain(self.via.iter().copied().map(Some)),
        )
    }

    /// Check every requested site against `index`.
    ///
    /// Sites are checked in request order (start, end, then via), so the
    /// error names the first unknown one.
    pub fn validate(&self, index: &impl SiteIndex) -> Result<(), RouteError> {
        std::iter::once(&self.start)
            .chain(std::iter::once(&self.end))
            .chain(self.via.iter())
            .find(|site| !index.contains_site(site))
            .map_or(Ok(()), |site| Err(RouteError::UnknownSite(*site)))
    }

    /// Compile into a matcher.
    pub fn compile(&self) -> RoutePattern {
        if self.is_open_ended() {
            return RoutePattern {
                kind: PatternKind::OpenEnded,
                anchors: vec![self.start],
            };
        }

        let mut anchors = Vec::with_capacity(self.via.len() + 2);
        anchors.push(self.start);
        anchors.extend(self.via.iter().copied());
        anchors.push(self.end);

        let kind = if self.indirect_allowed {
            PatternKind::Indirect
        } else {
            PatternKind::Contiguous
        };

        RoutePattern { kind, anchors }
    }

    /// Validate against `index`, then compile.
    pub fn compile_checked(&self, index: &impl SiteIndex) -> Result<RoutePattern, RouteError> {
        self.validate(index)?;
        Ok(self.compile())
    }
}

/// Collect the distinct sites from a list of optional site slots.
///
/// Empty slots impose no requirement and are skipped.
pub fn required_sites<I>(slots: I) -> BTreeSet<SiteCode>
where
    I: IntoIterator<Item = Option<SiteCode>>,
{
    slots.into_iter().flatten().collect()
}

/// The shape of a compiled route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// From the first visit to the start site through to the end of the chain.
    OpenEnded,
    /// The anchors back to back, nothing in between.
    Contiguous,
    /// The anchors in order, anything in between.
    Indirect,
}

/// A compiled route, ready to be matched against many chains.
///
/// Immutable and cheap to share across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    kind: PatternKind,
    /// Start, then via sites, then end. Just the start when open-ended.
    anchors: Vec<SiteCode>,
}

impl RoutePattern {
    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    pub fn anchors(&self) -> &[SiteCode] {
        &self.anchors
    }

    pub fn start(&self) -> SiteCode {
        self.anchors[0]
    }

    /// Sites every matching chain must visit.
    pub fn required_sites(&self) -> BTreeSet<SiteCode> {
        required_sites(self.anchors.iter().copied().map(Some))
    }
}
