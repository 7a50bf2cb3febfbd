//! CSV export of journeys.

use std::io::Write;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::{Journey, JourneyId, VehicleClass, timestamp_format};

/// One exported journey, flattened for tabular output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JourneyRow {
    pub id: JourneyId,

    #[serde(with = "timestamp_format")]
    pub start: NaiveDateTime,

    pub class: VehicleClass,

    /// Whole seconds.
    pub duration_secs: i64,

    pub chain: String,

    /// Full time chain, first site included.
    pub time_chain: String,

    #[serde(with = "timestamp_format")]
    pub end: NaiveDateTime,
}

impl From<&Journey> for JourneyRow {
    fn from(j: &Journey) -> Self {
        Self {
            id: j.id(),
            start: j.start(),
            class: j.class().clone(),
            duration_secs: j.duration().num_seconds(),
            chain: j.chain().to_string(),
            time_chain: j.times().to_string(),
            end: j.end(),
        }
    }
}

/// Write `journeys` as CSV with a header line.
pub fn write_journeys_csv<W: Write>(journeys: &[Journey], writer: W) -> Result<(), csv::Error> {
    let mut csv = csv::Writer::from_writer(writer);
    for journey in journeys {
        csv.serialize(JourneyRow::from(journey))?;
    }
    csv.flush()?;
    Ok(())
}
