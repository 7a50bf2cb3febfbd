//! Journey records.
//!
//! A [`RawJourney`] is a row as the journey store holds it: chain and time
//! text still undecoded. A [`Journey`] is the decoded form every later stage
//! works with, and is also what route extraction produces for each matched
//! sub-route.

use std::fmt;

use chrono::{Duration, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use super::chain::Chain;
use super::error::{RecordError, RecordErrorKind};
use super::time_chain::{TimeChainFormat, TimeOffsetChain};

/// Store-assigned journey identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JourneyId(pub u64);

impl fmt::Display for JourneyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Vehicle class label as recorded by the cameras (e.g. "Car", "LGV").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleClass(String);

impl VehicleClass {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A journey row as stored, one per vehicle sighting sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawJourney {
    #[serde(rename = "journey_id")]
    pub id: JourneyId,

    /// When the vehicle was seen at the first site.
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,

    pub class: VehicleClass,

    /// Total trip time in minutes.
    #[serde(rename = "total_trip_time")]
    pub total_trip_mins: f64,

    /// Site chain text, e.g. `05_N>12_E>20_S`.
    pub chain: String,

    /// Time chain text for every site after the first.
    #[serde(rename = "trip_destinations_and_time", default)]
    pub leg_times: String,

    /// End of the journey; derived from the total trip time when absent.
    #[serde(
        rename = "journey_end_time",
        default,
        with = "timestamp_format::option"
    )]
    pub end_time: Option<NaiveDateTime>,
}

/// A decoded journey, either as stored or derived from a matched sub-route.
///
/// # Invariants
///
/// - `chain` and `times` list the same sites in the same order
#[derive(Debug, Clone, PartialEq)]
pub struct Journey {
    id: JourneyId,
    start: NaiveDateTime,
    class: VehicleClass,
    duration: Duration,
    chain: Chain,
    times: TimeOffsetChain,
    end: NaiveDateTime,
}

impl Journey {
    /// Decode a stored row.
    ///
    /// # Errors
    ///
    /// Returns a [`RecordError`] naming the row's id if the chain or time
    /// text is malformed, or if the total trip time does not fit a
    /// timestamp.
    pub fn decode(raw: &RawJourney, format: TimeChainFormat) -> Result<Self, RecordError> {
        let (chain, times) = TimeOffsetChain::decode_text(&raw.chain, &raw.leg_times, format)
            .map_err(|e| RecordError::new(raw.id, e))?;

        let out_of_range = || {
            RecordError::new(
                raw.id,
                RecordErrorKind::OffsetOutOfRange {
                    offset_mins: raw.total_trip_mins,
                },
            )
        };
        let duration = minutes_to_duration(raw.total_trip_mins).ok_or_else(out_of_range)?;
        let end = match raw.end_time {
            Some(end) => end,
            None => raw
                .timestamp
                .checked_add_signed(duration)
                .ok_or_else(out_of_range)?,
        };

        Ok(Self {
            id: raw.id,
            start: raw.timestamp,
            class: raw.class.clone(),
            duration,
            chain,
            times,
            end,
        })
    }

    /// Assemble a derived journey. Callers guarantee the chain invariant.
    pub(crate) fn from_parts(
        id: JourneyId,
        start: NaiveDateTime,
        class: VehicleClass,
        chain: Chain,
        times: TimeOffsetChain,
        end: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            start,
            class,
            duration: end - start,
            chain,
            times,
            end,
        }
    }

    pub fn id(&self) -> JourneyId {
        self.id
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Hour of day (0-23) the journey started in.
    pub fn start_hour(&self) -> u32 {
        self.start.hour()
    }

    pub fn class(&self) -> &VehicleClass {
        &self.class
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn times(&self) -> &TimeOffsetChain {
        &self.times
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }
}

/// Convert fractional minutes to a duration, rounded to the millisecond.
///
/// Returns `None` for non-finite input or a duration chrono cannot hold.
pub fn minutes_to_duration(mins: f64) -> Option<Duration> {
    let ms = (mins * 60_000.0).round();
    if !ms.is_finite() || ms.abs() >= i64::MAX as f64 {
        return None;
    }
    Duration::try_milliseconds(ms as i64)
}

/// `start` moved on by `mins` minutes, or `None` if that leaves the
/// representable range.
pub fn offset_by_minutes(start: NaiveDateTime, mins: f64) -> Option<NaiveDateTime> {
    start.checked_add_signed(minutes_to_duration(mins)?)
}

/// Timestamp (de)serialization for stored rows.
///
/// Accepts ISO-8601 with a space or `T` separator and the day-first
/// spreadsheet layout; writes `YYYY-MM-DD HH:MM:SS`.
pub mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";
    const READ_FORMATS: [&str; 3] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%d/%m/%Y %H:%M:%S",
    ];

    /// Parse a timestamp in any of the accepted layouts.
    pub fn parse(s: &str) -> Option<NaiveDateTime> {
        let s = s.trim();
        READ_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    }

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&ts.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {s:?}")))
    }

    pub mod option {
        use chrono::NaiveDateTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            ts: &Option<NaiveDateTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => super::serialize(ts, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDateTime>, D::Error> {
            let s: Option<String> = Option::deserialize(deserializer)?;
            match s.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(s) => super::parse(s).map(Some).ok_or_else(|| {
                    serde::de::Error::custom(format!("invalid timestamp: {s:?}"))
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChainError, RecordErrorKind};
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn raw(chain: &str, leg_times: &str) -> RawJourney {
        RawJourney {
            id: JourneyId(1),
            timestamp: ts(8, 0),
            class: VehicleClass::new("Car"),
            total_trip_mins: 25.0,
            chain: chain.into(),
            leg_times: leg_times.into(),
            end_time: None,
        }
    }

    #[test]
    fn decode_fills_end_from_total_trip_time() {
        let journey = Journey::decode(
            &raw("05_N>12_E>20_S", "12_E(10.0)>20_S(25.0)"),
            TimeChainFormat::default(),
        )
        .unwrap();

        assert_eq!(journey.id(), JourneyId(1));
        assert_eq!(journey.start(), ts(8, 0));
        assert_eq!(journey.start_hour(), 8);
        assert_eq!(journey.duration(), Duration::minutes(25));
        assert_eq!(journey.end(), ts(8, 25));
        assert_eq!(journey.chain().len(), 3);
        assert_eq!(journey.times().len(), 3);
    }

    #[test]
    fn decode_keeps_stored_end_time() {
        let mut row = raw("05_N>12_E", "12_E(10.0)");
        row.end_time = Some(ts(9, 0));
        let journey = Journey::decode(&row, TimeChainFormat::default()).unwrap();
        assert_eq!(journey.end(), ts(9, 0));
    }

    #[test]
    fn decode_error_names_journey() {
        let mut row = raw("05_N>1_E", "1_E(10.0)");
        row.id = JourneyId(99);
        let err = Journey::decode(&row, TimeChainFormat::default()).unwrap_err();
        assert_eq!(err.id, JourneyId(99));
        assert!(matches!(
            err.kind,
            RecordErrorKind::Chain(ChainError::MalformedChain { .. })
        ));
    }

    #[test]
    fn huge_total_trip_time_is_a_record_error() {
        let mut row = raw("05_N>12_E", "12_E(10.0)");
        row.total_trip_mins = 1e15;
        let err = Journey::decode(&row, TimeChainFormat::default()).unwrap_err();
        assert_eq!(err.id, JourneyId(1));
        assert_eq!(
            err.kind,
            RecordErrorKind::OffsetOutOfRange { offset_mins: 1e15 }
        );
    }

    #[test]
    fn offset_past_calendar_end_is_none() {
        assert_eq!(offset_by_minutes(ts(8, 0), 30.0), Some(ts(8, 30)));
        assert_eq!(offset_by_minutes(NaiveDateTime::MAX, 1.0), None);
        assert_eq!(offset_by_minutes(ts(8, 0), 1e14), None);
    }

    #[test]
    fn fractional_minutes_round_to_millis() {
        assert_eq!(minutes_to_duration(0.5), Some(Duration::seconds(30)));
        assert_eq!(minutes_to_duration(12.25), Some(Duration::milliseconds(735_000)));
        assert_eq!(minutes_to_duration(f64::NAN), None);
        assert_eq!(minutes_to_duration(f64::INFINITY), None);
        assert_eq!(minutes_to_duration(1e300), None);
    }

    #[test]
    fn timestamp_layouts() {
        let expected = ts(8, 0);
        assert_eq!(timestamp_format::parse("2017-03-01 08:00:00"), Some(expected));
        assert_eq!(timestamp_format::parse("2017-03-01T08:00:00"), Some(expected));
        assert_eq!(
            timestamp_format::parse("2017-03-01 08:00:00.000"),
            Some(expected)
        );
        assert_eq!(timestamp_format::parse("01/03/2017 08:00:00"), Some(expected));
        assert_eq!(timestamp_format::parse("yesterday"), None);
    }

    #[test]
    fn raw_journey_json_roundtrip() {
        let row = raw("05_N>12_E", "12_E(10.0)");
        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("\"journey_id\":1"));
        assert!(json.contains("\"timestamp\":\"2017-03-01 08:00:00\""));
        let back: RawJourney = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }
}
