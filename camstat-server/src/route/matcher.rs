//! Matching compiled routes against site chains.
//!
//! Matching runs a small automaton from a visit to the route's start site.
//! Each run walks forward through the chain looking for the next anchor (via
//! sites in order, then the end site). In a contiguous route any other site
//! kills the run; in an indirect route other sites are skipped.
//!
//! Matches never overlap: after a match, scanning resumes at the site after
//! its end. An indirect match is greedy and runs to the last visit to the end
//! site, so a chain holds at most one indirect match.

use crate::domain::{Chain, SiteCode};

use super::spec::{PatternKind, RoutePattern};

/// Where a single matching run has got to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    AwaitingStart,
    /// Waiting for the via site with this index.
    AwaitingVia(usize),
    AwaitingEnd,
    Done,
}

/// Outcome of feeding one site to a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Advance(MatchState),
    Hold,
    Reject,
}

/// A matched sub-chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// Index of the first matched site (inclusive).
    pub start: usize,
    /// Index of the last matched site (inclusive).
    pub end: usize,
    /// The matched sites.
    pub sub_chain: Chain,
}

impl RouteMatch {
    /// Number of sites in the match.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Always false: a match covers at least one site.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl RoutePattern {
    /// The state after anchor `k` has been seen.
    fn after_anchor(&self, k: usize) -> MatchState {
        let last = self.anchors().len() - 1;
        if k >= last {
            MatchState::Done
        } else if k + 1 == last {
            MatchState::AwaitingEnd
        } else {
            MatchState::AwaitingVia(k)
        }
    }

    /// The anchor a run in `state` is waiting for, and its index.
    fn expected(&self, state: MatchState) -> Option<(usize, SiteCode)> {
        let anchors = self.anchors();
        let k = match state {
            MatchState::AwaitingStart => 0,
            MatchState::AwaitingVia(i) => i + 1,
            MatchState::AwaitingEnd => anchors.len() - 1,
            MatchState::Done => return None,
        };
        Some((k, anchors[k]))
    }

    fn step(&self, state: MatchState, site: &SiteCode) -> Step {
        let Some((k, anchor)) = self.expected(state) else {
            return Step::Reject;
        };

        if *site == anchor {
            Step::Advance(self.after_anchor(k))
        } else if state == MatchState::AwaitingStart {
            Step::Reject
        } else if self.kind() == PatternKind::Indirect {
            Step::Hold
        } else {
            Step::Reject
        }
    }

    /// Run the automaton from `from`; returns the index of the end site.
    fn run_from(&self, sites: &[SiteCode], from: usize) -> Option<usize> {
        let mut state = MatchState::AwaitingStart;
        for (i, site) in sites.iter().enumerate().skip(from) {
            match self.step(state, site) {
                Step::Advance(MatchState::Done) => return Some(self.extend(sites, i)),
                Step::Advance(next) => state = next,
                Step::Hold => {}
                Step::Reject => return None,
            }
        }
        None
    }

    /// Stretch a completed indirect run from `done` to the last visit to the
    /// end site. Any later end visit also completes the route, since an
    /// indirect route may pass any site in between.
    fn extend(&self, sites: &[SiteCode], done: usize) -> usize {
        if self.kind() != PatternKind::Indirect {
            return done;
        }
        let end = self.anchors()[self.anchors().len() - 1];
        sites[done..]
            .iter()
            .rposition(|s| *s == end)
            .map_or(done, |p| done + p)
    }

    /// Returns the inclusive `(start, end)` span of every match, in chain order.
    ///
    /// Spans are leftmost and non-overlapping: each one starts after the
    /// previous one ends.
    pub fn match_spans(&self, sites: &[SiteCode]) -> Vec<(usize, usize)> {
        if sites.is_empty() {
            return Vec::new();
        }

        let start = self.start();

        if self.kind() == PatternKind::OpenEnded {
            return sites
                .iter()
                .position(|s| *s == start)
                .map(|i| vec![(i, sites.len() - 1)])
                .unwrap_or_default();
        }

        let mut spans = Vec::new();
        let mut from = 0;
        while let Some(i) = sites[from..].iter().position(|s| *s == start) {
            let i = from + i;
            match self.run_from(sites, i) {
                Some(end) => {
                    spans.push((i, end));
                    from = end + 1;
                }
                None => from = i + 1,
            }
        }
        spans
    }

    /// Find every match in `chain`.
    pub fn find_matches(&self, chain: &Chain) -> Vec<RouteMatch> {
        self.match_spans(chain.sites())
            .into_iter()
            .filter_map(|(start, end)| {
                chain.slice(start, end).map(|sub_chain| RouteMatch {
                    start,
                    end,
                    sub_chain,
                })
            })
            .collect()
    }

    /// True if `chain` contains at least one match.
    pub fn is_match(&self, chain: &Chain) -> bool {
        let sites = chain.sites();
        match self.kind() {
            PatternKind::OpenEnded => chain.visits(&self.start()),
            _ => sites
                .iter()
                .enumerate()
                .any(|(i, s)| *s == self.start() && self.run_from(sites, i).is_some()),
        }
    }
}

/// Find every match of `pattern` in `chain`.
pub fn find_matches(chain: &Chain, pattern: &RoutePattern) -> Vec<RouteMatch> {
    pattern.find_matches(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::RouteSpec;

    fn site(s: &str) -> SiteCode {
        SiteCode::parse(s).unwrap()
    }

    fn chain(s: &str) -> Chain {
        Chain::decode(s).unwrap()
    }

    fn spans(pattern: &RoutePattern, c: &str) -> Vec<(usize, usize)> {
        pattern
            .find_matches(&chain(c))
            .iter()
            .map(|m| (m.start, m.end))
            .collect()
    }

    #[test]
    fn indirect_route_without_via_spans_whole_chain() {
        let pattern = RouteSpec::new(site("05_N"), site("20_S")).compile();
        let matches = pattern.find_matches(&chain("05_N>12_E>20_S"));

        assert_eq!(matches.len(), 1);
        assert_eq!((matches[0].start, matches[0].end), (0, 2));
        assert_eq!(matches[0].len(), 3);
        assert_eq!(matches[0].sub_chain.to_string(), "05_N>12_E>20_S");
    }

    #[test]
    fn contiguous_route_rejects_detour() {
        let pattern = RouteSpec::new(site("05_N"), site("20_S"))
            .with_via(vec![site("12_E")])
            .indirect(false)
            .compile();

        assert!(spans(&pattern, "05_N>07_OUT>12_E>20_S").is_empty());
        assert!(!pattern.is_match(&chain("05_N>07_OUT>12_E>20_S")));
        assert_eq!(spans(&pattern, "05_N>12_E>20_S"), vec![(0, 2)]);
    }

    #[test]
    fn indirect_route_allows_detour() {
        let pattern = RouteSpec::new(site("05_N"), site("20_S"))
            .with_via(vec![site("12_E")])
            .compile();

        assert_eq!(spans(&pattern, "05_N>07_OUT>12_E>20_S"), vec![(0, 3)]);
        assert!(pattern.is_match(&chain("05_N>07_OUT>12_E>20_S")));
    }

    #[test]
    fn via_sites_must_appear_in_order() {
        let pattern = RouteSpec::new(site("05_N"), site("20_S"))
            .with_via(vec![site("12_E"), site("14_W")])
            .compile();

        assert!(spans(&pattern, "05_N>14_W>12_E>20_S").is_empty());
        assert_eq!(spans(&pattern, "05_N>14_W>12_E>14_W>20_S"), vec![(0, 4)]);
    }

    #[test]
    fn end_before_via_does_not_complete() {
        let pattern = RouteSpec::new(site("05_N"), site("20_S"))
            .with_via(vec![site("12_E")])
            .compile();

        assert_eq!(spans(&pattern, "05_N>20_S>12_E>20_S"), vec![(0, 3)]);
    }

    #[test]
    fn indirect_match_runs_to_last_end_visit() {
        let pattern = RouteSpec::new(site("05_N"), site("20_S")).compile();
        assert_eq!(spans(&pattern, "05_N>20_S>12_E>20_S"), vec![(0, 3)]);
        assert_eq!(spans(&pattern, "05_N>20_S>12_E>20_S>21_W"), vec![(0, 3)]);
    }

    #[test]
    fn start_inside_a_match_does_not_begin_another() {
        let pattern = RouteSpec::new(site("05_N"), site("20_S")).compile();
        assert_eq!(spans(&pattern, "05_N>12_E>05_N>20_S"), vec![(0, 3)]);
        assert_eq!(spans(&pattern, "05_N>20_S>12_E>05_N>20_S"), vec![(0, 4)]);
    }

    #[test]
    fn failed_run_moves_on_to_next_start() {
        let pattern = RouteSpec::new(site("05_N"), site("20_S"))
            .with_via(vec![site("12_E")])
            .indirect(false)
            .compile();
        assert_eq!(spans(&pattern, "05_N>05_N>12_E>20_S"), vec![(1, 3)]);
    }

    #[test]
    fn repeated_route_yields_separate_matches() {
        let pattern = RouteSpec::new(site("05_N"), site("20_S"))
            .indirect(false)
            .compile();
        assert_eq!(
            spans(&pattern, "05_N>20_S>12_E>05_N>20_S"),
            vec![(0, 1), (3, 4)]
        );
    }

    #[test]
    fn open_ended_uses_first_visit_only() {
        let pattern = RouteSpec::new(site("12_E"), site("12_E")).compile();
        assert_eq!(spans(&pattern, "05_N>12_E>20_S>12_E>21_W"), vec![(1, 4)]);
        assert_eq!(spans(&pattern, "12_E"), vec![(0, 0)]);
        assert!(spans(&pattern, "05_N>20_S").is_empty());
    }

    #[test]
    fn round_trip_with_via_equal_to_start() {
        // start == end with a via site is an ordinary bounded route
        let pattern = RouteSpec::new(site("05_N"), site("05_N"))
            .with_via(vec![site("12_E")])
            .compile();
        assert_eq!(spans(&pattern, "05_N>12_E>20_S>05_N>21_W"), vec![(0, 3)]);
        assert!(spans(&pattern, "05_N>20_S>05_N").is_empty());
    }

    #[test]
    fn start_must_precede_end() {
        let pattern = RouteSpec::new(site("05_N"), site("20_S")).compile();
        assert!(spans(&pattern, "20_S>05_N").is_empty());
        assert!(spans(&pattern, "05_N").is_empty());
    }

    #[test]
    fn empty_site_list_has_no_spans() {
        let pattern = RouteSpec::new(site("05_N"), site("20_S")).compile();
        assert!(pattern.match_spans(&[]).is_empty());

        let open = RouteSpec::new(site("05_N"), site("05_N")).compile();
        assert!(open.match_spans(&[]).is_empty());
    }

    #[test]
    fn automaton_states() {
        let pattern = RouteSpec::new(site("05_N"), site("20_S"))
            .with_via(vec![site("12_E"), site("14_W")])
            .indirect(false)
            .compile();

        assert_eq!(
            pattern.step(MatchState::AwaitingStart, &site("05_N")),
            Step::Advance(MatchState::AwaitingVia(0))
        );
        assert_eq!(
            pattern.step(MatchState::AwaitingVia(0), &site("12_E")),
            Step::Advance(MatchState::AwaitingVia(1))
        );
        assert_eq!(
            pattern.step(MatchState::AwaitingVia(1), &site("14_W")),
            Step::Advance(MatchState::AwaitingEnd)
        );
        assert_eq!(
            pattern.step(MatchState::AwaitingEnd, &site("20_S")),
            Step::Advance(MatchState::Done)
        );
        assert_eq!(
            pattern.step(MatchState::AwaitingEnd, &site("99_N")),
            Step::Reject
        );
        assert_eq!(pattern.step(MatchState::Done, &site("20_S")), Step::Reject);

        let indirect = RouteSpec::new(site("05_N"), site("20_S")).compile();
        assert_eq!(
            indirect.step(MatchState::AwaitingStart, &site("05_N")),
            Step::Advance(MatchState::AwaitingEnd)
        );
        assert_eq!(
            indirect.step(MatchState::AwaitingEnd, &site("99_N")),
            Step::Hold
        );
        assert_eq!(
            indirect.step(MatchState::AwaitingStart, &site("99_N")),
            Step::Reject
        );
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::route::RouteSpec;
    use proptest::prelude::*;

    const SITES: [&str; 4] = ["05_N", "07_OUT", "12_E", "20_S"];

    /// Sites drawn from a small alphabet so that routes match often.
    fn site_strategy() -> impl Strategy<Value = SiteCode> {
        (0..SITES.len()).prop_map(|i| SiteCode::parse(SITES[i]).unwrap())
    }

    fn chain_strategy() -> impl Strategy<Value = Chain> {
        proptest::collection::vec(site_strategy(), 1..12).prop_map(|s| Chain::new(s).unwrap())
    }

    fn spec_strategy() -> impl Strategy<Value = RouteSpec> {
        (
            site_strategy(),
            site_strategy(),
            proptest::collection::vec(site_strategy(), 0..3),
            any::<bool>(),
        )
            .prop_map(|(start, end, via, indirect)| {
                RouteSpec::new(start, end).with_via(via).indirect(indirect)
            })
    }

    /// True if `needle` occurs in order (not necessarily adjacent) in `hay`.
    fn is_subsequence(needle: &[SiteCode], hay: &[SiteCode]) -> bool {
        let mut it = hay.iter();
        needle.iter().all(|n| it.any(|h| h == n))
    }

    proptest! {
        /// Direct matches are exactly start, via..., end
        #[test]
        fn contiguous_matches_are_exact(c in chain_strategy(), spec in spec_strategy()) {
            let spec = spec.indirect(false);
            prop_assume!(!spec.is_open_ended());
            let pattern = spec.compile();
            for m in pattern.find_matches(&c) {
                prop_assert_eq!(m.end - m.start, spec.via.len() + 1);
                prop_assert_eq!(m.sub_chain.sites(), pattern.anchors());
            }
        }

        /// Indirect matches start and end on the route's sites and pass the via sites in order
        #[test]
        fn indirect_matches_respect_anchors(c in chain_strategy(), spec in spec_strategy()) {
            let spec = spec.indirect(true);
            prop_assume!(!spec.is_open_ended());
            let pattern = spec.compile();
            for m in pattern.find_matches(&c) {
                prop_assert!(m.end > m.start);
                prop_assert_eq!(m.sub_chain.first(), spec.start);
                prop_assert_eq!(m.sub_chain.last(), spec.end);
                prop_assert!(is_subsequence(pattern.anchors(), m.sub_chain.sites()));
                prop_assert_eq!(&c.slice(m.start, m.end).unwrap(), &m.sub_chain);
                prop_assert!(!c.sites()[m.end + 1..].contains(&spec.end));
            }
        }

        /// An indirect route matches at most once
        #[test]
        fn indirect_matches_at_most_once(c in chain_strategy(), spec in spec_strategy()) {
            let pattern = spec.indirect(true).compile();
            prop_assert!(pattern.find_matches(&c).len() <= 1);
        }

        /// Open-ended routes match once, from the first visit to the end of the chain
        #[test]
        fn open_ended_matches_once(c in chain_strategy(), start in site_strategy()) {
            let pattern = RouteSpec::new(start, start).compile();
            let matches = pattern.find_matches(&c);
            match c.position(&start) {
                Some(first) => {
                    prop_assert_eq!(matches.len(), 1);
                    prop_assert_eq!(matches[0].start, first);
                    prop_assert_eq!(matches[0].end, c.len() - 1);
                }
                None => prop_assert!(matches.is_empty()),
            }
        }

        /// Matches come in chain order without overlapping, and is_match agrees
        #[test]
        fn matches_ordered_and_disjoint(c in chain_strategy(), spec in spec_strategy()) {
            let pattern = spec.compile();
            let spans = pattern.match_spans(c.sites());
            for pair in spans.windows(2) {
                prop_assert!(pair[0].1 < pair[1].0);
            }
            prop_assert_eq!(pattern.is_match(&c), !spans.is_empty());
        }
    }
}
