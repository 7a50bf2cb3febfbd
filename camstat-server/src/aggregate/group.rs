//! Nested grouping of journeys.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Serialize, Serializer};

use crate::domain::{Journey, SiteCode, VehicleClass};

/// Key of one grouping level.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    Hour(u32),
    Class(VehicleClass),
    Site(SiteCode),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Hour(h) => write!(f, "{h}"),
            GroupKey::Class(c) => write!(f, "{c}"),
            GroupKey::Site(s) => write!(f, "{s}"),
        }
    }
}

// Keys become JSON object keys, so they serialize as strings.
impl Serialize for GroupKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Journeys, either as a flat list or nested one level per grouper.
#[derive(Debug, Clone, PartialEq)]
pub enum Groups {
    Rows(Vec<Journey>),
    Nested(BTreeMap<GroupKey, Groups>),
}

impl Groups {
    /// Number of rows across all leaves. A row counted under several keys
    /// is counted once per key.
    pub fn row_count(&self) -> usize {
        match self {
            Groups::Rows(rows) => rows.len(),
            Groups::Nested(map) => map.values().map(Groups::row_count).sum(),
        }
    }

    /// Nesting depth; a flat list has depth 0.
    pub fn depth(&self) -> usize {
        match self {
            Groups::Rows(_) => 0,
            Groups::Nested(map) => 1 + map.values().map(Groups::depth).max().unwrap_or(0),
        }
    }
}

/// One grouping level.
pub trait Grouper: Send + Sync {
    /// Partition a flat list of rows.
    fn group_rows(&self, rows: Vec<Journey>) -> BTreeMap<GroupKey, Vec<Journey>>;

    /// Header describing this level's keys.
    fn describe(&self) -> &'static str;

    /// Apply this grouper beneath every existing level, so each leaf list
    /// becomes a mapping of its own.
    fn group(&self, groups: Groups) -> Groups {
        match groups {
            Groups::Rows(rows) => Groups::Nested(
                self.group_rows(rows)
                    .into_iter()
                    .map(|(k, v)| (k, Groups::Rows(v)))
                    .collect(),
            ),
            Groups::Nested(map) => {
                Groups::Nested(map.into_iter().map(|(k, v)| (k, self.group(v))).collect())
            }
        }
    }
}

impl<G: Grouper + ?Sized> Grouper for Box<G> {
    fn group_rows(&self, rows: Vec<Journey>) -> BTreeMap<GroupKey, Vec<Journey>> {
        (**self).group_rows(rows)
    }

    fn describe(&self) -> &'static str {
        (**self).describe()
    }

    fn group(&self, groups: Groups) -> Groups {
        (**self).group(groups)
    }
}

/// Bucket rows by a single key each, keeping input order within a bucket.
pub fn bucket_by<F>(rows: Vec<Journey>, key: F) -> BTreeMap<GroupKey, Vec<Journey>>
where
    F: Fn(&Journey) -> GroupKey,
{
    let mut out: BTreeMap<GroupKey, Vec<Journey>> = BTreeMap::new();
    for row in rows {
        out.entry(key(&row)).or_default().push(row);
    }
    out
}

/// Group by hour of the start time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByHour;

impl Grouper for ByHour {
    fn group_rows(&self, rows: Vec<Journey>) -> BTreeMap<GroupKey, Vec<Journey>> {
        bucket_by(rows, |j| GroupKey::Hour(j.start_hour()))
    }

    fn describe(&self) -> &'static str {
        "Hour"
    }
}

/// Group by vehicle class.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByClass;

impl Grouper for ByClass {
    fn group_rows(&self, rows: Vec<Journey>) -> BTreeMap<GroupKey, Vec<Journey>> {
        bucket_by(rows, |j| GroupKey::Class(j.class().clone()))
    }

    fn describe(&self) -> &'static str {
        "Vehicle class"
    }
}

/// Group by the first site of the chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByStartSite;

impl Grouper for ByStartSite {
    fn group_rows(&self, rows: Vec<Journey>) -> BTreeMap<GroupKey, Vec<Journey>> {
        bucket_by(rows, |j| GroupKey::Site(j.chain().first()))
    }

    fn describe(&self) -> &'static str {
        "Start site"
    }
}

/// Group by every site a journey visits.
///
/// A journey lands under each distinct site it visits, once per site. With
/// `start_filter` set, only sites from the first visit of that site onwards
/// count, and journeys that never visit it are left out.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByVisitedSite {
    pub start_filter: Option<SiteCode>,
}

impl ByVisitedSite {
    pub fn from_site(site: SiteCode) -> Self {
        Self {
            start_filter: Some(site),
        }
    }

    fn visited(&self, journey: &Journey) -> Option<BTreeSet<SiteCode>> {
        let sites = journey.chain().sites();
        let from = match self.start_filter {
            Some(site) => journey.chain().position(&site)?,
            None => 0,
        };
        Some(sites[from..].iter().copied().collect())
    }
}

impl Grouper for ByVisitedSite {
    fn group_rows(&self, rows: Vec<Journey>) -> BTreeMap<GroupKey, Vec<Journey>> {
        let mut out: BTreeMap<GroupKey, Vec<Journey>> = BTreeMap::new();
        for row in rows {
            let Some(visited) = self.visited(&row) else {
                continue;
            };
            for site in visited {
                out.entry(GroupKey::Site(site)).or_default().push(row.clone());
            }
        }
        out
    }

    fn describe(&self) -> &'static str {
        "Site"
    }
}
