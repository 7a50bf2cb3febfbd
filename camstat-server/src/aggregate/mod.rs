//! Grouping and statistics over filtered journeys.

mod group;
mod stats;

pub use group::{ByClass, ByHour, ByStartSite, ByVisitedSite, GroupKey, Grouper, Groups, bucket_by};
pub use stats::{
    ClassShare, CountStats, RouteStats, Stat, StatTree, StatValue, StatsError, TripTimeStats,
    class_breakdown, mean_trip_time, routes_stats,
};
