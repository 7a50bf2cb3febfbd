//! Time-offset chains: when each site of a journey was reached.
//!
//! Raw time text records `SiteCode(minutes)` segments for every site after
//! the first, e.g. `12_E(10.0)>20_S(25.0)` for the chain `05_N>12_E>20_S`.
//! The first site is implicit and always sits at offset zero.

use std::fmt;

use serde::Deserialize;

use super::chain::{Chain, SITE_SEPARATOR};
use super::error::ChainError;
use super::site::SiteCode;

/// How the minute values in raw time text are to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OffsetMode {
    /// Each value is minutes since the journey started.
    #[default]
    Cumulative,
    /// Each value is minutes since the previous site.
    PerLeg,
}

/// Layout of raw time text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeChainFormat {
    /// How offsets are measured.
    pub offsets: OffsetMode,

    /// Whether the first site is omitted from the text (and so sits at zero).
    pub first_site_implicit: bool,
}

impl Default for TimeChainFormat {
    fn default() -> Self {
        Self {
            offsets: OffsetMode::Cumulative,
            first_site_implicit: true,
        }
    }
}

/// A site together with the minutes elapsed since the journey started.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedSite {
    pub site: SiteCode,
    pub offset_mins: f64,
}

/// The sites of a journey, each with its cumulative offset in minutes.
///
/// # Invariants
///
/// - At least one entry
/// - The first entry's offset is zero
///
/// Offsets are expected to be non-decreasing, but that is only checked when
/// a sub-journey is projected, where a violation is reported per record.
///
/// # Examples
///
/// ```
/// use camstat_server::domain::{Chain, TimeChainFormat, TimeOffsetChain};
///
/// let chain = Chain::decode("05_N>12_E>20_S").unwrap();
/// let times = TimeOffsetChain::decode(&chain, "12_E(10.0)>20_S(25.0)", TimeChainFormat::default())
///     .unwrap();
///
/// assert_eq!(times.offset(0), Some(0.0));
/// assert_eq!(times.offset(2), Some(25.0));
/// assert_eq!(times.to_string(), "05_N(0.0)>12_E(10.0)>20_S(25.0)");
/// assert_eq!(times.encode_legs(), "12_E(10.0)>20_S(25.0)");
/// ```
#[derive(Clone, PartialEq)]
pub struct TimeOffsetChain {
    entries: Vec<TimedSite>,
}

impl TimeOffsetChain {
    /// Decode raw time text against the journey's site chain.
    ///
    /// The decoded chain has the same length and site order as `chain`.
    pub fn decode(chain: &Chain, text: &str, format: TimeChainFormat) -> Result<Self, ChainError> {
        let text = text.trim();

        let mut raw = Vec::with_capacity(chain.len());
        if format.first_site_implicit {
            raw.push(TimedSite {
                site: chain.first(),
                offset_mins: 0.0,
            });
        }

        // Stored text sometimes keeps the separator that followed the
        // omitted first site.
        let text = if format.first_site_implicit {
            text.strip_prefix(SITE_SEPARATOR).unwrap_or(text)
        } else {
            text
        };
        if !text.is_empty() {
            for segment in text.split(SITE_SEPARATOR) {
                raw.push(parse_segment(segment)?);
            }
        }

        if raw.len() != chain.len() {
            return Err(ChainError::Misaligned(format!(
                "{} timed sites for {} chain sites",
                raw.len(),
                chain.len()
            )));
        }

        for (i, (entry, site)) in raw.iter().zip(chain.sites()).enumerate() {
            if entry.site != *site {
                return Err(ChainError::Misaligned(format!(
                    "position {i} is {} in time chain but {site} in site chain",
                    entry.site
                )));
            }
        }

        if raw[0].offset_mins != 0.0 {
            return Err(ChainError::Misaligned(format!(
                "first site offset is {} rather than zero",
                raw[0].offset_mins
            )));
        }

        if format.offsets == OffsetMode::PerLeg {
            let mut total = 0.0;
            for entry in &mut raw {
                total += entry.offset_mins;
                entry.offset_mins = total;
            }
        }

        Ok(Self { entries: raw })
    }

    /// Decode site text and time text together.
    pub fn decode_text(
        site_text: &str,
        time_text: &str,
        format: TimeChainFormat,
    ) -> Result<(Chain, Self), ChainError> {
        let chain = Chain::decode(site_text)?;
        let times = Self::decode(&chain, time_text, format)?;
        Ok((chain, times))
    }

    /// Returns all entries in visiting order.
    pub fn entries(&self) -> &[TimedSite] {
        &self.entries
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: a time chain holds at least one entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the offset in minutes of the site at `index`.
    pub fn offset(&self, index: usize) -> Option<f64> {
        self.entries.get(index).map(|e| e.offset_mins)
    }

    /// Returns the inclusive span `start..=end` with offsets shifted so the
    /// span starts at zero.
    ///
    /// Returns `None` if the range is out of bounds or reversed.
    pub fn slice_rebased(&self, start: usize, end: usize) -> Option<Self> {
        if start > end || end >= self.entries.len() {
            return None;
        }
        let base = self.entries[start].offset_mins;
        let entries = self.entries[start..=end]
            .iter()
            .map(|e| TimedSite {
                site: e.site,
                offset_mins: e.offset_mins - base,
            })
            .collect();
        Some(Self { entries })
    }

    /// Encode in the raw stored layout: cumulative offsets, first site omitted.
    pub fn encode_legs(&self) -> String {
        let mut out = String::new();
        for (i, entry) in self.entries.iter().skip(1).enumerate() {
            if i > 0 {
                out.push(SITE_SEPARATOR);
            }
            push_entry(&mut out, entry);
        }
        out
    }
}

/// Parse one `SiteCode(minutes)` segment.
fn parse_segment(segment: &str) -> Result<TimedSite, ChainError> {
    let open = segment
        .find('(')
        .ok_or_else(|| ChainError::malformed_offset(segment))?;
    let site_text = &segment[..open];
    let number = segment[open + 1..]
        .strip_suffix(')')
        .ok_or_else(|| ChainError::malformed_offset(segment))?;

    let site = SiteCode::parse(site_text).map_err(|e| ChainError::malformed_site(segment, &e))?;
    let offset_mins = parse_minutes(number).ok_or_else(|| ChainError::malformed_offset(segment))?;

    Ok(TimedSite { site, offset_mins })
}

/// Parse `\d+(\.\d+)?`; signs, exponents and special values are rejected.
fn parse_minutes(s: &str) -> Option<f64> {
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (s, None),
    };
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if let Some(frac) = frac {
        if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }
    s.parse().ok()
}

/// Format minutes so whole values keep a trailing `.0`.
fn format_minutes(mins: f64) -> String {
    if mins.fract() == 0.0 && mins.abs() < 1e15 {
        format!("{mins:.1}")
    } else {
        format!("{mins}")
    }
}

fn push_entry(out: &mut String, entry: &TimedSite) {
    out.push_str(&entry.site.to_string());
    out.push('(');
    out.push_str(&format_minutes(entry.offset_mins));
    out.push(')');
}

impl fmt::Debug for TimeOffsetChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimeOffsetChain({self})")
    }
}

/// Full layout, first site included.
impl fmt::Display for TimeOffsetChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                out.push(SITE_SEPARATOR);
            }
            push_entry(&mut out, entry);
        }
        f.write_str(&out)
    }
}
