//! In-memory journey store loaded from CSV.

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::domain::{RawJourney, SITE_SEPARATOR, SiteCode};
use crate::filter::CoarsePredicate;
use crate::route::SiteIndex;

use super::JourneyStore;
use super::error::StoreError;

/// Journey rows held in memory, with a per-site index.
///
/// The index maps each site's key (`s05_N`) to the positions of the rows
/// whose chain visits it, in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Vec<RawJourney>,
    by_site: HashMap<String, Vec<usize>>,
    sites: BTreeSet<SiteCode>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: impl IntoIterator<Item = RawJourney>) -> Self {
        let mut store = Self::new();
        for row in rows {
            store.insert(row);
        }
        store
    }

    /// Load rows from CSV with a header line.
    ///
    /// Rows that fail to deserialize are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Csv`] if the underlying reader fails.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, StoreError> {
        let mut csv = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut store = Self::new();
        let mut skipped = 0usize;
        for result in csv.deserialize::<RawJourney>() {
            match result {
                Ok(row) => store.insert(row),
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    skipped += 1;
                    warn!(error = %e, "skipping unreadable journey row");
                }
            }
        }

        info!(
            rows = store.len(),
            sites = store.sites.len(),
            skipped,
            "loaded journey store"
        );
        Ok(store)
    }

    /// Load rows from a CSV file.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv_reader(BufReader::new(file))
    }

    /// Add a row and index the sites its chain visits.
    pub fn insert(&mut self, row: RawJourney) {
        let pos = self.rows.len();
        let mut visited = BTreeSet::new();
        for segment in row.chain.trim().split(SITE_SEPARATOR) {
            match SiteCode::parse(segment) {
                Ok(site) => {
                    visited.insert(site);
                }
                Err(e) => debug!(journey = %row.id, error = %e, "unindexed chain segment"),
            }
        }
        for site in visited {
            self.by_site.entry(site.index_key()).or_default().push(pos);
            self.sites.insert(site);
        }
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Positions of rows visiting every site in `sites`.
    fn candidates(&self, sites: &BTreeSet<SiteCode>) -> Vec<usize> {
        if sites.is_empty() {
            return (0..self.rows.len()).collect();
        }

        let mut lists = Vec::with_capacity(sites.len());
        for site in sites {
            match self.by_site.get(&site.index_key()) {
                Some(list) => lists.push(list),
                None => return Vec::new(),
            }
        }
        lists.sort_by_key(|l| l.len());

        let Some((shortest, rest)) = lists.split_first() else {
            return Vec::new();
        };
        shortest
            .iter()
            .copied()
            .filter(|pos| rest.iter().all(|l| l.binary_search(pos).is_ok()))
            .collect()
    }
}

impl SiteIndex for MemoryStore {
    fn contains_site(&self, site: &SiteCode) -> bool {
        self.by_site.contains_key(&site.index_key())
    }
}

impl JourneyStore for MemoryStore {
    fn journeys(&self, predicate: &CoarsePredicate) -> Result<Vec<RawJourney>, StoreError> {
        let rows: Vec<RawJourney> = self
            .candidates(&predicate.required_sites)
            .into_iter()
            .map(|pos| &self.rows[pos])
            .filter(|row| predicate.admits_class(&row.class) && predicate.admits_time(row.timestamp))
            .cloned()
            .collect();
        debug!(matched = rows.len(), total = self.rows.len(), "coarse pass");
        Ok(rows)
    }

    fn sites(&self) -> Vec<SiteCode> {
        self.sites.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{JourneyId, VehicleClass};
    use chrono::{NaiveDate, NaiveDateTime};
    use std::io::Write;

    const CSV: &str = "\
journey_id,timestamp,class,total_trip_time,chain,trip_destinations_and_time,journey_end_time
1,2017-03-01 08:00:00,Car,25.0,05_N>12_E>20_S,12_E(10.0)>20_S(25.0),
2,2017-03-01 09:15:00,LGV,5.0,12_E>20_S,20_S(5.0),2017-03-01 09:20:00
3,2017-03-01 10:00:00,Car,3.0,20_S>07_OUT,07_OUT(3.0),
4,not a time,Car,1.0,05_N,,
";

    fn site(s: &str) -> SiteCode {
        SiteCode::parse(s).unwrap()
    }

    fn ts(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 3, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn ids(rows: &[RawJourney]) -> Vec<u64> {
        rows.iter().map(|r| r.id.0).collect()
    }

    #[test]
    fn loads_csv_and_skips_bad_rows() {
        let store = MemoryStore::from_csv_reader(CSV.as_bytes()).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(
            store.sites(),
            vec![site("05_N"), site("07_OUT"), site("12_E"), site("20_S")]
        );
    }

    #[test]
    fn parses_optional_end_time() {
        let store = MemoryStore::from_csv_reader(CSV.as_bytes()).unwrap();
        let rows = store.journeys(&CoarsePredicate::all()).unwrap();
        assert_eq!(rows[0].end_time, None);
        assert_eq!(
            rows[1].end_time,
            Some(ts(9) + chrono::Duration::minutes(20))
        );
    }

    #[test]
    fn index_intersects_required_sites() {
        let store = MemoryStore::from_csv_reader(CSV.as_bytes()).unwrap();
        let p = CoarsePredicate::with_sites([site("12_E"), site("20_S")].into_iter().collect());
        assert_eq!(ids(&store.journeys(&p).unwrap()), vec![1, 2]);

        let p = CoarsePredicate::with_sites([site("05_N"), site("07_OUT")].into_iter().collect());
        assert!(store.journeys(&p).unwrap().is_empty());
    }

    #[test]
    fn unknown_site_yields_nothing() {
        let store = MemoryStore::from_csv_reader(CSV.as_bytes()).unwrap();
        assert!(!store.contains_site(&site("99_W")));
        let p = CoarsePredicate::with_sites([site("99_W")].into_iter().collect());
        assert!(store.journeys(&p).unwrap().is_empty());
    }

    #[test]
    fn class_and_time_are_applied() {
        let store = MemoryStore::from_csv_reader(CSV.as_bytes()).unwrap();
        let p = CoarsePredicate {
            classes: Some([VehicleClass::new("Car")].into_iter().collect()),
            to: Some(ts(10)),
            ..CoarsePredicate::default()
        };
        assert_eq!(ids(&store.journeys(&p).unwrap()), vec![1]);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();

        let store = MemoryStore::from_csv_path(file.path()).unwrap();
        assert_eq!(store.len(), 3);
        assert!(store.contains_site(&site("07_OUT")));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = MemoryStore::from_csv_path(dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn unparseable_segments_are_not_indexed() {
        let row = RawJourney {
            id: JourneyId(9),
            timestamp: ts(8),
            class: VehicleClass::new("Car"),
            total_trip_mins: 1.0,
            chain: "05_N>junk".into(),
            leg_times: String::new(),
            end_time: None,
        };
        let store = MemoryStore::from_rows([row]);
        assert_eq!(store.sites(), vec![site("05_N")]);
    }
}
