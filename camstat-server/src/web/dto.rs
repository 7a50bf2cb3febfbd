//! Data transfer objects for web requests and responses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::{ClassShare, RouteStats, StatTree};
use crate::domain::{JourneyId, RecordError, VehicleClass};
use crate::export::JourneyRow;
use crate::route::FinePass;
use crate::search::SearchReport;

fn default_indirect() -> bool {
    true
}

/// Route and filter part of every route request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteQueryRequest {
    /// First site of the route (e.g. "05_N")
    pub start: String,

    /// Last site of the route
    pub end: String,

    /// Sites to pass through, in order
    #[serde(default)]
    pub via: Vec<String>,

    /// Whether other sites may appear between route sites
    #[serde(default = "default_indirect")]
    pub indirect_allowed: bool,

    /// Vehicle classes to keep; empty keeps all
    #[serde(default)]
    pub classes: Vec<String>,

    /// Earliest route start, inclusive
    pub from: Option<String>,

    /// Latest route start, exclusive
    pub to: Option<String>,
}

/// One grouping level.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum GroupBy {
    Hour,
    Class,
    StartSite,
    VisitedSite {
        /// Only count sites from the first visit of this one
        #[serde(default)]
        from: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    Count,
    TripTime,
}

/// Request for grouped route statistics.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteSearchRequest {
    #[serde(flatten)]
    pub route: RouteQueryRequest,

    /// Grouping levels, outermost first
    #[serde(default)]
    pub group_by: Vec<GroupBy>,

    /// Statistics per group; empty means all
    #[serde(default)]
    pub stats: Vec<StatKind>,
}

/// Known sites.
#[derive(Debug, Serialize)]
pub struct SitesResponse {
    pub sites: Vec<String>,
}

/// A record dropped during a search.
#[derive(Debug, Serialize)]
pub struct RejectedRecord {
    pub journey_id: JourneyId,
    pub error: String,
}

impl From<&RecordError> for RejectedRecord {
    fn from(e: &RecordError) -> Self {
        Self {
            journey_id: e.id,
            error: e.kind.to_string(),
        }
    }
}

fn rejected(errors: &[RecordError]) -> Vec<RejectedRecord> {
    errors.iter().map(RejectedRecord::from).collect()
}

/// Grouped statistics.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub headers: Vec<String>,
    pub matched: usize,
    pub rejected: Vec<RejectedRecord>,
    pub results: StatTree,
}

impl From<&SearchReport> for SearchResponse {
    fn from(r: &SearchReport) -> Self {
        Self {
            headers: r.headers.iter().map(|h| h.to_string()).collect(),
            matched: r.matched,
            rejected: rejected(&r.rejected),
            results: r.results.clone(),
        }
    }
}

/// Route journeys.
#[derive(Debug, Serialize)]
pub struct JourneysResponse {
    pub journeys: Vec<JourneyRow>,
    pub rejected: Vec<RejectedRecord>,
}

impl From<&FinePass> for JourneysResponse {
    fn from(pass: &FinePass) -> Self {
        Self {
            journeys: pass.journeys.iter().map(JourneyRow::from).collect(),
            rejected: rejected(&pass.errors),
        }
    }
}

/// Summary statistics of route journeys.
#[derive(Debug, Serialize)]
pub struct RouteStatsResponse {
    pub count: usize,
    pub classes: BTreeMap<VehicleClass, ClassShare>,

    /// Mean trip time in whole seconds; absent with no journeys
    pub average_trip_secs: Option<i64>,

    pub rejected: Vec<RejectedRecord>,
}

impl RouteStatsResponse {
    pub fn new(stats: RouteStats, errors: &[RecordError]) -> Self {
        Self {
            count: stats.count,
            classes: stats.classes,
            average_trip_secs: stats.average.map(|d| d.num_seconds()),
            rejected: rejected(errors),
        }
    }
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}
