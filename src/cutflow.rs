//! Bookkeeping of named cut results for cut-flow reporting
//!
//! The selection reports every intermediate decision (object-level cuts,
//! category rules, event gates) to a recorder, but never depends on what the
//! recorder does with it.

/// Sink for named selection decisions
pub trait CutFlowRecorder {
    /// Record the outcome of a named cut
    ///
    /// `mask` holds one decision per candidate, which may be an event or a
    /// physics object depending on the cut.
    ///
    fn record(&mut self, name: &str, mask: &[bool]);
}

/// Recorder which throws everything away
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCutFlow;
//
impl CutFlowRecorder for NoCutFlow {
    fn record(&mut self, _name: &str, _mask: &[bool]) {}
}

/// Tally of one named cut
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CutTally {
    /// Name of the cut
    pub name: String,
    /// Number of candidates which were tested
    pub num_tested: usize,
    /// Number of candidates which passed
    pub num_passed: usize,
}
//
impl CutTally {
    /// Fraction of candidates which passed (zero if none was tested)
    pub fn efficiency(&self) -> f64 {
        if self.num_tested == 0 {
            0.
        } else {
            self.num_passed as f64 / self.num_tested as f64
        }
    }
}

/// Recorder which accumulates per-cut pass counts
///
/// Cuts are kept in the order in which they were first recorded. Results from
/// several chunks of events can be merged, which yields the same tallies as
/// processing all events at once.
///
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CutFlow {
    tallies: Vec<CutTally>,
}
//
impl CutFlow {
    /// Start with no recorded cut
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded tallies, in order of first appearance
    pub fn tallies(&self) -> &[CutTally] {
        &self.tallies
    }

    /// Look up the tally of one cut
    pub fn get(&self, name: &str) -> Option<&CutTally> {
        self.tallies.iter().find(|tally| tally.name == name)
    }

    /// Integrate the tallies of another chunk of events
    pub fn merge(&mut self, other: CutFlow) {
        for tally in other.tallies {
            self.add(&tally.name, tally.num_tested, tally.num_passed);
        }
    }

    fn add(&mut self, name: &str, num_tested: usize, num_passed: usize) {
        match self.tallies.iter_mut().find(|tally| tally.name == name) {
            Some(tally) => {
                tally.num_tested += num_tested;
                tally.num_passed += num_passed;
            }
            None => self.tallies.push(CutTally {
                name: name.to_owned(),
                num_tested,
                num_passed,
            }),
        }
    }
}
//
impl CutFlowRecorder for CutFlow {
    fn record(&mut self, name: &str, mask: &[bool]) {
        let num_passed = mask.iter().filter(|&&keep| keep).count();
        self.add(name, mask.len(), num_passed);
    }
}
