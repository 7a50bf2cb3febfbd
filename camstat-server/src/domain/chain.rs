//! Site chains: the ordered sites a journey was seen at.

use std::fmt;

use super::error::ChainError;
use super::site::SiteCode;

/// Separator between sites in chain text.
pub const SITE_SEPARATOR: char = '>';

/// The sites a single journey passed, in visiting order.
///
/// # Invariants
///
/// - At least one site
///
/// # Examples
///
/// ```
/// use camstat_server::domain::Chain;
///
/// let chain = Chain::decode("05_N>12_E>20_S").unwrap();
/// assert_eq!(chain.len(), 3);
/// assert_eq!(chain.to_string(), "05_N>12_E>20_S");
///
/// assert!(Chain::decode("05_N>>20_S").is_err());
/// assert!(Chain::decode("").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Chain {
    sites: Vec<SiteCode>,
}

impl Chain {
    /// Constructs a chain from already-parsed sites.
    ///
    /// Returns `None` if `sites` is empty.
    pub fn new(sites: Vec<SiteCode>) -> Option<Self> {
        if sites.is_empty() {
            None
        } else {
            Some(Self { sites })
        }
    }

    /// Decode chain text such as `05_N>12_E>20_S`.
    ///
    /// Every segment must be a well-formed site code.
    pub fn decode(text: &str) -> Result<Self, ChainError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChainError::MalformedChain {
                segment: String::new(),
                reason: "chain is empty",
            });
        }

        let sites = text
            .split(SITE_SEPARATOR)
            .map(|segment| {
                SiteCode::parse(segment).map_err(|e| ChainError::malformed_site(segment, &e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { sites })
    }

    /// Returns all sites in visiting order.
    pub fn sites(&self) -> &[SiteCode] {
        &self.sites
    }

    /// Returns the number of sites.
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Always false: a chain holds at least one site.
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Returns the first site visited.
    pub fn first(&self) -> SiteCode {
        self.sites[0]
    }

    /// Returns the last site visited.
    pub fn last(&self) -> SiteCode {
        self.sites[self.sites.len() - 1]
    }

    /// Returns the index of the first visit to `site`.
    pub fn position(&self, site: &SiteCode) -> Option<usize> {
        self.sites.iter().position(|s| s == site)
    }

    /// Returns true if the chain visits `site` at least once.
    pub fn visits(&self, site: &SiteCode) -> bool {
        self.sites.contains(site)
    }

    /// Returns the inclusive sub-chain `start..=end`.
    ///
    /// Returns `None` if the range is out of bounds or reversed.
    pub fn slice(&self, start: usize, end: usize) -> Option<Self> {
        if start > end || end >= self.sites.len() {
            return None;
        }
        Some(Self {
            sites: self.sites[start..=end].to_vec(),
        })
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Chain({self})")
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, site) in self.sites.iter().enumerate() {
            if i > 0 {
                write!(f, "{SITE_SEPARATOR}")?;
            }
            write!(f, "{site}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(s: &str) -> SiteCode {
        SiteCode::parse(s).unwrap()
    }

    #[test]
    fn decode_single_site() {
        let chain = Chain::decode("05_N").unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.first(), site("05_N"));
        assert_eq!(chain.last(), site("05_N"));
    }

    #[test]
    fn decode_multi_site() {
        let chain = Chain::decode("05_N>07_OUT>35A_IN>20_S").unwrap();
        assert_eq!(
            chain.sites(),
            &[site("05_N"), site("07_OUT"), site("35A_IN"), site("20_S")]
        );
    }

    #[test]
    fn decode_trims_surrounding_whitespace() {
        let chain = Chain::decode("  05_N>12_E \n").unwrap();
        assert_eq!(chain.to_string(), "05_N>12_E");
    }

    #[test]
    fn decode_rejects_bad_segment() {
        let err = Chain::decode("05_N>12-E>20_S").unwrap_err();
        assert!(matches!(
            err,
            ChainError::MalformedChain { ref segment, .. } if segment == "12-E"
        ));
    }

    #[test]
    fn decode_rejects_empty_segments() {
        assert!(Chain::decode("05_N>").is_err());
        assert!(Chain::decode(">05_N").is_err());
        assert!(Chain::decode("   ").is_err());
    }

    #[test]
    fn position_is_first_visit() {
        let chain = Chain::decode("05_N>12_E>05_N>20_S").unwrap();
        assert_eq!(chain.position(&site("05_N")), Some(0));
        assert_eq!(chain.position(&site("20_S")), Some(3));
        assert_eq!(chain.position(&site("99_W")), None);
        assert!(chain.visits(&site("12_E")));
    }

    #[test]
    fn slice_is_inclusive() {
        let chain = Chain::decode("05_N>12_E>20_S>21_W").unwrap();
        assert_eq!(chain.slice(1, 2).unwrap().to_string(), "12_E>20_S");
        assert_eq!(chain.slice(3, 3).unwrap().to_string(), "21_W");
        assert!(chain.slice(2, 1).is_none());
        assert!(chain.slice(0, 4).is_none());
    }

    #[test]
    fn new_rejects_empty() {
        assert!(Chain::new(vec![]).is_none());
        assert!(Chain::new(vec![site("05_N")]).is_some());
    }
}
