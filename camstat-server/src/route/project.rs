//! Turning route matches into journeys of their own.
//!
//! A matched sub-route becomes a new journey record: same id and vehicle
//! class, but with start and end times recomputed from the offsets of the
//! first and last matched sites, and a time chain rebased to start at zero.

use rayon::prelude::*;

use crate::domain::{
    ChainError, Journey, RawJourney, RecordError, RecordErrorKind, TimeChainFormat,
    offset_by_minutes,
};

use super::matcher::RouteMatch;
use super::spec::RoutePattern;

/// Project one match of `source` into a derived journey.
///
/// # Errors
///
/// - `NegativeDuration` if the end offset precedes the start offset
/// - `OffsetOutOfRange` if an offset moves past the representable timestamps
/// - `Misaligned` if the match does not fit the source's time chain
pub fn project(source: &Journey, m: &RouteMatch) -> Result<Journey, RecordError> {
    let times = source.times();
    let misaligned = || {
        RecordError::new(
            source.id(),
            ChainError::Misaligned(format!(
                "match {}..={} outside time chain of {} sites",
                m.start,
                m.end,
                times.len()
            )),
        )
    };

    let start_offset = times.offset(m.start).ok_or_else(misaligned)?;
    let end_offset = times.offset(m.end).ok_or_else(misaligned)?;

    if end_offset < start_offset {
        return Err(RecordError::new(
            source.id(),
            RecordErrorKind::NegativeDuration {
                start_offset,
                end_offset,
            },
        ));
    }

    let sub_times = times.slice_rebased(m.start, m.end).ok_or_else(misaligned)?;
    let shifted = |offset_mins: f64| {
        offset_by_minutes(source.start(), offset_mins).ok_or_else(|| {
            RecordError::new(source.id(), RecordErrorKind::OffsetOutOfRange { offset_mins })
        })
    };
    let start = shifted(start_offset)?;
    let end = shifted(end_offset)?;

    Ok(Journey::from_parts(
        source.id(),
        start,
        source.class().clone(),
        m.sub_chain.clone(),
        sub_times,
        end,
    ))
}

/// Project every match of `pattern` in `source`.
///
/// A journey with `k` matches yields `k` derived journeys, in chain order.
pub fn extract_routes(source: &Journey, pattern: &RoutePattern) -> Result<Vec<Journey>, RecordError> {
    pattern
        .find_matches(source.chain())
        .iter()
        .map(|m| project(source, m))
        .collect()
}

/// Derived journeys from a batch, next to the records that failed.
#[derive(Debug, Default)]
pub struct FinePass {
    pub journeys: Vec<Journey>,
    pub errors: Vec<RecordError>,
}

impl FinePass {
    fn collect(results: Vec<Result<Vec<Journey>, RecordError>>) -> Self {
        let mut pass = Self::default();
        for result in results {
            match result {
                Ok(journeys) => pass.journeys.extend(journeys),
                Err(e) => pass.errors.push(e),
            }
        }
        pass
    }
}

/// Extract matching sub-routes from already decoded journeys.
///
/// Journeys are processed in parallel; output order follows input order.
pub fn refine_journeys(journeys: &[Journey], pattern: &RoutePattern) -> FinePass {
    let results: Vec<_> = journeys
        .par_iter()
        .map(|j| extract_routes(j, pattern))
        .collect();
    FinePass::collect(results)
}

/// Decode stored rows and extract matching sub-routes.
///
/// A row that fails to decode or project is reported in `errors` and does
/// not affect the rest of the batch.
pub fn fine_pass(raws: &[RawJourney], pattern: &RoutePattern, format: TimeChainFormat) -> FinePass {
    let results: Vec<_> = raws
        .par_iter()
        .map(|raw| Journey::decode(raw, format).and_then(|j| extract_routes(&j, pattern)))
        .collect();
    FinePass::collect(results)
}
