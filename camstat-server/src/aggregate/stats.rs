//! Statistics over groups of journeys.

use std::collections::BTreeMap;

use chrono::Duration;
use serde::Serialize;
use thiserror::Error;

use crate::domain::{Journey, VehicleClass};

use super::group::{GroupKey, Groups};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StatsError {
    #[error("cannot aggregate an empty set of journeys")]
    EmptyAggregation,
}

/// Share of one vehicle class within a group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassShare {
    pub percent: f64,
    pub count: usize,
}

/// One computed statistic.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatValue {
    Count(usize),
    Classes(BTreeMap<VehicleClass, ClassShare>),
    /// Whole seconds; `None` for an empty group.
    Seconds(Option<i64>),
}

/// A statistic producing one or more values per group.
pub trait Stat: Send + Sync {
    fn compute(&self, rows: &[Journey]) -> Vec<StatValue>;

    /// One header per value returned by [`Stat::compute`].
    fn describe(&self) -> &'static [&'static str];
}

impl<S: Stat + ?Sized> Stat for Box<S> {
    fn compute(&self, rows: &[Journey]) -> Vec<StatValue> {
        (**self).compute(rows)
    }

    fn describe(&self) -> &'static [&'static str] {
        (**self).describe()
    }
}

/// Journey count and per-class breakdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountStats;

impl Stat for CountStats {
    fn compute(&self, rows: &[Journey]) -> Vec<StatValue> {
        vec![
            StatValue::Count(rows.len()),
            StatValue::Classes(class_breakdown(rows)),
        ]
    }

    fn describe(&self) -> &'static [&'static str] {
        &["No. journeys", "Journeys by class (percentage, No. journeys)"]
    }
}

/// Minimum, maximum and mean trip time.
#[derive(Debug, Clone, Copy, Default)]
pub struct TripTimeStats;

impl Stat for TripTimeStats {
    fn compute(&self, rows: &[Journey]) -> Vec<StatValue> {
        let min = rows.iter().map(Journey::duration).min();
        let max = rows.iter().map(Journey::duration).max();
        let mean = mean_trip_time(rows).ok();
        [min, max, mean]
            .into_iter()
            .map(|d| StatValue::Seconds(d.map(|d| d.num_seconds())))
            .collect()
    }

    fn describe(&self) -> &'static [&'static str] {
        &["Min trip time(s)", "Max trip time(s)", "Avg. trip time(s)"]
    }
}

/// Count of each vehicle class, with its percentage of `rows`.
pub fn class_breakdown(rows: &[Journey]) -> BTreeMap<VehicleClass, ClassShare> {
    let mut counts: BTreeMap<VehicleClass, usize> = BTreeMap::new();
    for row in rows {
        *counts.entry(row.class().clone()).or_default() += 1;
    }
    let total = rows.len() as f64;
    counts
        .into_iter()
        .map(|(class, count)| {
            let share = ClassShare {
                percent: 100.0 * count as f64 / total,
                count,
            };
            (class, share)
        })
        .collect()
}

/// Mean duration of `rows`.
///
/// # Errors
///
/// [`StatsError::EmptyAggregation`] if `rows` is empty.
pub fn mean_trip_time(rows: &[Journey]) -> Result<Duration, StatsError> {
    if rows.is_empty() {
        return Err(StatsError::EmptyAggregation);
    }
    let total_ms: i128 = rows
        .iter()
        .map(|j| i128::from(j.duration().num_milliseconds()))
        .sum();
    // A mean of i64 values is itself in i64 range.
    let mean_ms = (total_ms / rows.len() as i128) as i64;
    Ok(Duration::milliseconds(mean_ms))
}

/// Summary of a set of route journeys.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteStats {
    pub count: usize,
    pub classes: BTreeMap<VehicleClass, ClassShare>,
    /// `None` when there are no journeys.
    pub average: Option<Duration>,
}

pub fn routes_stats(rows: &[Journey]) -> RouteStats {
    RouteStats {
        count: rows.len(),
        classes: class_breakdown(rows),
        average: mean_trip_time(rows).ok(),
    }
}

/// Statistic values mirroring the shape of a [`Groups`] tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatTree {
    Leaf(Vec<StatValue>),
    Nested(BTreeMap<GroupKey, StatTree>),
}

impl StatTree {
    /// Run every stat on every leaf of `groups`, concatenating their values.
    pub fn build<S: Stat>(groups: &Groups, stats: &[S]) -> Self {
        match groups {
            Groups::Rows(rows) => {
                StatTree::Leaf(stats.iter().flat_map(|s| s.compute(rows)).collect())
            }
            Groups::Nested(map) => StatTree::Nested(
                map.iter()
                    .map(|(k, v)| (k.clone(), StatTree::build(v, stats)))
                    .collect(),
            ),
        }
    }
}
