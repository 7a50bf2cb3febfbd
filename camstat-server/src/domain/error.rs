//! Domain error types.
//!
//! These errors represent malformed journey data. They are distinct from
//! storage and request errors: a bad record aborts processing of that record
//! only, never the batch it arrived in.

use super::JourneyId;
use super::site::InvalidSiteCode;

/// Errors decoding chain or time-chain text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChainError {
    /// A chain segment does not match the site code grammar
    #[error("malformed chain segment {segment:?}: {reason}")]
    MalformedChain {
        segment: String,
        reason: &'static str,
    },

    /// A time-chain segment's offset is missing or not numeric
    #[error("malformed offset segment {segment:?}")]
    MalformedOffset { segment: String },

    /// The time chain does not line up with the site chain
    #[error("time chain misaligned with site chain: {0}")]
    Misaligned(String),
}

impl ChainError {
    pub(crate) fn malformed_site(segment: &str, err: &InvalidSiteCode) -> Self {
        ChainError::MalformedChain {
            segment: segment.to_string(),
            reason: err.reason(),
        }
    }

    pub(crate) fn malformed_offset(segment: &str) -> Self {
        ChainError::MalformedOffset {
            segment: segment.to_string(),
        }
    }
}

/// What went wrong with a single journey record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordErrorKind {
    /// Chain or time-chain text could not be decoded
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// A derived journey would end before it starts
    #[error("negative duration: end offset {end_offset} min precedes start offset {start_offset} min")]
    NegativeDuration { start_offset: f64, end_offset: f64 },

    /// A minute offset moves a timestamp outside the representable range
    #[error("offset {offset_mins} min is out of range")]
    OffsetOutOfRange { offset_mins: f64 },
}

/// A per-record failure, carrying the id of the offending journey.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("journey {id}: {kind}")]
pub struct RecordError {
    pub id: JourneyId,
    pub kind: RecordErrorKind,
}

impl RecordError {
    pub fn new(id: JourneyId, kind: impl Into<RecordErrorKind>) -> Self {
        Self {
            id,
            kind: kind.into(),
        }
    }
}
