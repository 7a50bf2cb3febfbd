//! Vehicle class filter.

use std::collections::BTreeSet;

use crate::domain::{Journey, VehicleClass};
use crate::route::FinePass;

use super::{CoarsePredicate, Filter};

/// Keep journeys whose vehicle class is in a given set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFilter {
    classes: BTreeSet<VehicleClass>,
}

impl ClassFilter {
    pub fn new(classes: impl IntoIterator<Item = VehicleClass>) -> Self {
        Self {
            classes: classes.into_iter().collect(),
        }
    }

    pub fn classes(&self) -> &BTreeSet<VehicleClass> {
        &self.classes
    }
}

impl Filter for ClassFilter {
    fn coarse_predicate(&self) -> CoarsePredicate {
        CoarsePredicate {
            classes: Some(self.classes.clone()),
            ..CoarsePredicate::default()
        }
    }

    // The store normally applies the class check already; this keeps the
    // result correct for stores that ignore the predicate.
    fn refine(&self, mut journeys: Vec<Journey>) -> FinePass {
        journeys.retain(|j| self.classes.contains(j.class()));
        FinePass {
            journeys,
            errors: Vec::new(),
        }
    }

    fn describe(&self) -> String {
        let names: Vec<&str> = self.classes.iter().map(VehicleClass::as_str).collect();
        format!("class in [{}]", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{JourneyId, RawJourney, TimeChainFormat};
    use chrono::NaiveDate;

    fn journey(id: u64, class: &str) -> Journey {
        let raw = RawJourney {
            id: JourneyId(id),
            timestamp: NaiveDate::from_ymd_opt(2017, 3, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            class: VehicleClass::new(class),
            total_trip_mins: 5.0,
            chain: "05_N>12_E".into(),
            leg_times: "12_E(5.0)".into(),
            end_time: None,
        };
        Journey::decode(&raw, TimeChainFormat::default()).unwrap()
    }

    #[test]
    fn coarse_predicate_carries_classes() {
        let filter = ClassFilter::new([VehicleClass::new("Car"), VehicleClass::new("LGV")]);
        let p = filter.coarse_predicate();
        assert_eq!(p.classes.as_ref().map(BTreeSet::len), Some(2));
        assert!(p.required_sites.is_empty());
    }

    #[test]
    fn refine_keeps_only_listed_classes() {
        let filter = ClassFilter::new([VehicleClass::new("Car")]);
        let pass = filter.refine(vec![journey(1, "Car"), journey(2, "HGV"), journey(3, "Car")]);
        let ids: Vec<_> = pass.journeys.iter().map(|j| j.id().0).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn describe_lists_classes_sorted() {
        let filter = ClassFilter::new([VehicleClass::new("LGV"), VehicleClass::new("Car")]);
        assert_eq!(filter.describe(), "class in [Car, LGV]");
    }
}
