//! The search pipeline: coarse store query, decode, refine, group, stats.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::aggregate::{Grouper, Groups, Stat, StatTree};
use crate::domain::{Journey, RawJourney, RecordError, TimeChainFormat};
use crate::filter::{CoarsePredicate, Filter, RouteFilter};
use crate::route::{FinePass, RouteError, RouteSpec, SiteIndex};
use crate::store::{JourneyStore, StoreError};

/// Error from a search.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The store could not answer the coarse query
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The route could not be built
    #[error(transparent)]
    Route(#[from] RouteError),
}

/// Outcome of a full search.
#[derive(Debug, Clone)]
pub struct SearchReport {
    /// Grouping headers, outermost first, then one per stat value.
    pub headers: Vec<&'static str>,

    /// Journeys left after every filter.
    pub matched: usize,

    /// Records dropped because they could not be decoded or refined.
    pub rejected: Vec<RecordError>,

    pub results: StatTree,
}

/// A configured search: filters, groupers and stats, applied in the order
/// they were added.
pub struct Searcher {
    filters: Vec<Box<dyn Filter>>,
    groupers: Vec<Box<dyn Grouper>>,
    stats: Vec<Box<dyn Stat>>,
    format: TimeChainFormat,
}

impl Searcher {
    pub fn new(format: TimeChainFormat) -> Self {
        Self {
            filters: Vec::new(),
            groupers: Vec::new(),
            stats: Vec::new(),
            format,
        }
    }

    /// A searcher with a single route filter.
    ///
    /// # Errors
    ///
    /// [`SearchError::Route`] if a route site is not in `index`.
    pub fn for_route(
        spec: RouteSpec,
        index: &impl SiteIndex,
        format: TimeChainFormat,
    ) -> Result<Self, SearchError> {
        Ok(Self::new(format).filter(RouteFilter::new(spec, index)?))
    }

    pub fn filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn group_by(mut self, grouper: impl Grouper + 'static) -> Self {
        self.groupers.push(Box::new(grouper));
        self
    }

    pub fn stat(mut self, stat: impl Stat + 'static) -> Self {
        self.stats.push(Box::new(stat));
        self
    }

    pub fn format(&self) -> TimeChainFormat {
        self.format
    }

    /// Conjunction of every filter's coarse predicate.
    pub fn coarse_predicate(&self) -> CoarsePredicate {
        self.filters
            .iter()
            .fold(CoarsePredicate::all(), |acc, f| acc.and(f.coarse_predicate()))
    }

    /// Decode stored rows in parallel, keeping input order.
    pub fn decode(&self, raws: &[RawJourney]) -> FinePass {
        let results: Vec<_> = raws
            .par_iter()
            .map(|raw| Journey::decode(raw, self.format))
            .collect();

        let mut pass = FinePass::default();
        for result in results {
            match result {
                Ok(journey) => pass.journeys.push(journey),
                Err(e) => pass.errors.push(e),
            }
        }
        pass
    }

    /// Run the coarse query, decode, then refine with each filter in turn.
    pub fn get_and_filter<S>(&self, store: &S) -> Result<FinePass, SearchError>
    where
        S: JourneyStore + ?Sized,
    {
        let predicate = self.coarse_predicate();
        let raws = store.journeys(&predicate)?;
        debug!(rows = raws.len(), "coarse query");

        let FinePass {
            mut journeys,
            mut errors,
        } = self.decode(&raws);

        for filter in &self.filters {
            let before = journeys.len();
            let pass = filter.refine(journeys);
            debug!(
                filter = %filter.describe(),
                before,
                after = pass.journeys.len(),
                rejected = pass.errors.len(),
                "refined"
            );
            journeys = pass.journeys;
            errors.extend(pass.errors);
        }

        if !errors.is_empty() {
            warn!(count = errors.len(), "records rejected during search");
            for e in &errors {
                debug!(error = %e, "rejected record");
            }
        }

        Ok(FinePass { journeys, errors })
    }

    /// Apply each grouper in order; the first gives the outermost level.
    pub fn group(&self, journeys: Vec<Journey>) -> Groups {
        self.groupers
            .iter()
            .fold(Groups::Rows(journeys), |groups, g| g.group(groups))
    }

    /// Headers for grouping levels then stat values.
    pub fn stat_headers(&self) -> Vec<&'static str> {
        self.groupers
            .iter()
            .map(|g| g.describe())
            .chain(self.stats.iter().flat_map(|s| s.describe().iter().copied()))
            .collect()
    }

    pub fn apply_stats(&self, groups: &Groups) -> StatTree {
        StatTree::build(groups, self.stats.as_slice())
    }

    /// Filter, group and compute stats in one go.
    pub fn combined<S>(&self, store: &S) -> Result<SearchReport, SearchError>
    where
        S: JourneyStore + ?Sized,
    {
        let FinePass { journeys, errors } = self.get_and_filter(store)?;
        let matched = journeys.len();
        let groups = self.group(journeys);

        Ok(SearchReport {
            headers: self.stat_headers(),
            matched,
            rejected: errors,
            results: self.apply_stats(&groups),
        })
    }
}

impl std::fmt::Debug for Searcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let filters: Vec<String> = self.filters.iter().map(|x| x.describe()).collect();
        f.debug_struct("Searcher")
            .field("filters", &filters)
            .field("headers", &self.stat_headers())
            .field("format", &self.format)
            .finish()
    }
}
