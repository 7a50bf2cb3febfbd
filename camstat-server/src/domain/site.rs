//! Camera site codes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when parsing an invalid site code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid site code {input:?}: {reason}")]
pub struct InvalidSiteCode {
    input: String,
    reason: &'static str,
}

impl InvalidSiteCode {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }

    /// Returns why the input was rejected.
    pub fn reason(&self) -> &'static str {
        self.reason
    }
}

/// Direction or role of a camera at a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
    Out,
    In,
}

impl Direction {
    /// Parse the suffix that follows the underscore.
    fn parse(s: &str) -> Option<Self> {
        match s {
            "N" => Some(Direction::North),
            "E" => Some(Direction::East),
            "S" => Some(Direction::South),
            "W" => Some(Direction::West),
            "OUT" => Some(Direction::Out),
            "IN" => Some(Direction::In),
            _ => None,
        }
    }

    /// Returns the suffix as written in chain text.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::North => "N",
            Direction::East => "E",
            Direction::South => "S",
            Direction::West => "W",
            Direction::Out => "OUT",
            Direction::In => "IN",
        }
    }
}

/// A camera site code such as `05_N`, `12_OUT` or `35A_IN`.
///
/// The code is two digits naming the camera, an optional letter that
/// disambiguates co-located cameras, and a direction suffix. Any
/// `SiteCode` value matches `\d\d[A-Za-z]?_(N|E|S|W|OUT|IN)` by construction.
///
/// # Examples
///
/// ```
/// use camstat_server::domain::SiteCode;
///
/// let site = SiteCode::parse("35A_OUT").unwrap();
/// assert_eq!(site.camera(), 35);
/// assert_eq!(site.to_string(), "35A_OUT");
///
/// assert!(SiteCode::parse("5_N").is_err());
/// assert!(SiteCode::parse("05_NE").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SiteCode {
    camera: u8,
    variant: Option<u8>,
    direction: Direction,
}

impl SiteCode {
    /// Parse a site code from its textual form.
    pub fn parse(s: &str) -> Result<Self, InvalidSiteCode> {
        let bytes = s.as_bytes();

        if bytes.len() < 4 {
            return Err(InvalidSiteCode::new(s, "too short"));
        }

        if !bytes[0].is_ascii_digit() || !bytes[1].is_ascii_digit() {
            return Err(InvalidSiteCode::new(s, "must start with two digits"));
        }
        let camera = (bytes[0] - b'0') * 10 + (bytes[1] - b'0');

        let (variant, rest) = if bytes[2].is_ascii_alphabetic() {
            (Some(bytes[2]), &s[3..])
        } else {
            (None, &s[2..])
        };

        let suffix = rest
            .strip_prefix('_')
            .ok_or_else(|| InvalidSiteCode::new(s, "missing underscore before direction"))?;

        let direction = Direction::parse(suffix)
            .ok_or_else(|| InvalidSiteCode::new(s, "direction must be N, E, S, W, OUT or IN"))?;

        Ok(Self {
            camera,
            variant,
            direction,
        })
    }

    /// Returns the two-digit camera number.
    pub fn camera(&self) -> u8 {
        self.camera
    }

    /// Returns the disambiguating letter, if any.
    pub fn variant(&self) -> Option<char> {
        self.variant.map(char::from)
    }

    /// Returns the direction suffix.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns the key the journey store indexes this site under.
    pub fn index_key(&self) -> String {
        format!("s{self}")
    }
}

impl FromStr for SiteCode {
    type Err = InvalidSiteCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for SiteCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SiteCode({self})")
    }
}

impl fmt::Display for SiteCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.camera)?;
        if let Some(letter) = self.variant {
            write!(f, "{}", char::from(letter))?;
        }
        write!(f, "_{}", self.direction.as_str())
    }
}

impl Serialize for SiteCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SiteCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        SiteCode::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_sites() {
        let site = SiteCode::parse("05_N").unwrap();
        assert_eq!(site.camera(), 5);
        assert_eq!(site.variant(), None);
        assert_eq!(site.direction(), Direction::North);

        assert!(SiteCode::parse("12_E").is_ok());
        assert!(SiteCode::parse("20_S").is_ok());
        assert!(SiteCode::parse("96_W").is_ok());
    }

    #[test]
    fn parse_role_suffixes() {
        assert_eq!(
            SiteCode::parse("07_OUT").unwrap().direction(),
            Direction::Out
        );
        assert_eq!(SiteCode::parse("07_IN").unwrap().direction(), Direction::In);
    }

    #[test]
    fn parse_co_located_variants() {
        let a = SiteCode::parse("35A_N").unwrap();
        let b = SiteCode::parse("35B_N").unwrap();
        assert_eq!(a.variant(), Some('A'));
        assert_eq!(b.variant(), Some('B'));
        assert_ne!(a, b);

        // Lowercase letters are allowed and preserved
        assert_eq!(SiteCode::parse("35a_N").unwrap().to_string(), "35a_N");
    }

    #[test]
    fn reject_bad_camera_numbers() {
        assert!(SiteCode::parse("5_N").is_err());
        assert!(SiteCode::parse("X5_N").is_err());
        assert!(SiteCode::parse("005_N").is_err());
    }

    #[test]
    fn reject_bad_suffixes() {
        assert!(SiteCode::parse("05N").is_err());
        assert!(SiteCode::parse("05_").is_err());
        assert!(SiteCode::parse("05_n").is_err());
        assert!(SiteCode::parse("05_NE").is_err());
        assert!(SiteCode::parse("05_OUTS").is_err());
        assert!(SiteCode::parse("05AB_N").is_err());
    }

    #[test]
    fn error_names_input_and_reason() {
        let err = SiteCode::parse("05_Q").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid site code \"05_Q\": direction must be N, E, S, W, OUT or IN"
        );
    }

    #[test]
    fn display_pads_camera() {
        let site = SiteCode::parse("01_W").unwrap();
        assert_eq!(site.to_string(), "01_W");
        assert_eq!(format!("{:?}", site), "SiteCode(01_W)");
    }

    #[test]
    fn index_key_has_prefix() {
        let site = SiteCode::parse("35B_OUT").unwrap();
        assert_eq!(site.index_key(), "s35B_OUT");
    }

    #[test]
    fn serde_as_string() {
        let site = SiteCode::parse("12_E").unwrap();
        let json = serde_json::to_string(&site).unwrap();
        assert_eq!(json, "\"12_E\"");

        let back: SiteCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, site);

        assert!(serde_json::from_str::<SiteCode>("\"bogus\"").is_err());
    }
}
