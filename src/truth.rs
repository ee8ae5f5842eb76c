//! Generator-level truth: decay-mode partitioning and W→qq quarks
//!
//! Simulated signal events carry the generator particle record, where each
//! particle points to its mother by index within the same event. Nothing in
//! here may run on collision data or on non-signal samples: callers must gate
//! it through [`GenInfo::enabled`], and the particle record is checked before
//! anything is read from it.

use crate::{
    error::Result,
    event::{Column, EventTable, ObjectCollection, ETA, GEN_PART, PHI, PT},
    jagged::Jagged,
    numeric::Float,
    ranking,
};
use prefix_num_ops::real::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// PDG identifier attribute of generator particles
pub const PDG_ID: &str = "pdgId";

/// Mother index attribute of generator particles (-1 if none)
pub const MOTHER: &str = "genPartIdxMother";

/// Per-event field holding the decay-mode label (0 when unlabeled)
pub const GEN_DECAY_MODE: &str = "gen_decay_mode";

/// Attributes which generator-level logic reads
const GEN_ATTRIBUTES: [&str; 5] = [PDG_ID, MOTHER, PT, ETA, PHI];

/// |PDG id| of the W boson
const W_BOSON: i64 = 24;

/// Number of W→qq quarks in a fully hadronic HH→WWγγ decay
pub const NUM_W_QUARKS: usize = 4;

/// Whether generator-level information should be used
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenInfo {
    /// The sample is simulated signal
    #[serde(alias = "is_Signal", skip_serializing_if = "std::ops::Not::not")]
    pub is_signal: bool,
}
//
impl GenInfo {
    /// Truth that generator-level logic may run
    pub fn enabled(&self, is_data: bool) -> bool {
        !is_data && self.is_signal
    }
}

/// Final state of the leptonically decaying W
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DecayMode {
    Electron = 1,
    Muon = 2,
    Tau = 3,
}
//
impl DecayMode {
    /// Every decay mode, in label order
    pub const ALL: [DecayMode; 3] = [Self::Electron, Self::Muon, Self::Tau];

    /// Value stored in the `gen_decay_mode` field
    pub fn code(self) -> i64 {
        self as i64
    }

    /// Short name, used to build field names
    pub fn label(self) -> &'static str {
        match self {
            Self::Electron => "ele",
            Self::Muon => "muon",
            Self::Tau => "tau",
        }
    }

    /// Decay mode associated with a charged lepton PDG id
    fn from_pdg_id(pdg_id: i64) -> Option<Self> {
        match pdg_id.abs() {
            11 => Some(Self::Electron),
            13 => Some(Self::Muon),
            15 => Some(Self::Tau),
            _ => None,
        }
    }
}

/// Number of events carrying each label
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartitionCounts {
    pub electron: usize,
    pub muon: usize,
    pub tau: usize,
    /// Events left in the default bucket
    pub unlabeled: usize,
}
//
impl PartitionCounts {
    /// Number of events carrying a given label
    pub fn get(&self, mode: DecayMode) -> usize {
        match mode {
            DecayMode::Electron => self.electron,
            DecayMode::Muon => self.muon,
            DecayMode::Tau => self.tau,
        }
    }

    /// Integrate the counts of another chunk of events
    pub fn merge(&mut self, other: &Self) {
        self.electron += other.electron;
        self.muon += other.muon;
        self.tau += other.tau;
        self.unlabeled += other.unlabeled;
    }

    fn increment(&mut self, mode: Option<DecayMode>) {
        match mode {
            Some(DecayMode::Electron) => self.electron += 1,
            Some(DecayMode::Muon) => self.muon += 1,
            Some(DecayMode::Tau) => self.tau += 1,
            None => self.unlabeled += 1,
        }
    }
}

/// Disjoint decay-mode subsets of an event table
#[derive(Clone, Debug, Default)]
pub struct Partition {
    pub counts: PartitionCounts,
    /// One table per label, holding exactly the events which carry it.
    /// Empty when generator-level logic is disabled.
    pub subsets: BTreeMap<DecayMode, EventTable>,
}

/// Check that the generator particle record can be used
pub fn check_schema(events: &EventTable) -> Result<&ObjectCollection> {
    let genpart = events.collection(GEN_PART)?;
    genpart.require(&GEN_ATTRIBUTES)?;
    Ok(genpart)
}

/// Decay-mode label of each event
///
/// An event is labeled iff exactly one charged lepton in its record has a W
/// boson as mother. Events with no such lepton (fully hadronic decays) or
/// several of them are left unlabeled.
///
pub fn decay_modes(genpart: &ObjectCollection) -> Result<Vec<Option<DecayMode>>> {
    let pdg_ids = genpart.attribute(PDG_ID)?;
    let mothers = genpart.attribute(MOTHER)?;
    Ok(genpart
        .offsets()
        .ranges()
        .map(|range| {
            let mut found = range.clone().filter_map(|idx| {
                let mode = DecayMode::from_pdg_id(pdg_ids[idx] as i64)?;
                from_w(pdg_ids, mothers, range.start, range.len(), idx).then_some(mode)
            });
            match (found.next(), found.next()) {
                (Some(mode), None) => Some(mode),
                _ => None,
            }
        })
        .collect())
}

/// Split events into disjoint decay-mode subsets
///
/// The table is annotated with the `gen_decay_mode` label of each event. If
/// generator-level logic is disabled, nothing is read or annotated and all
/// events stay in the default bucket.
///
pub fn partition(events: &mut EventTable, gen_info: &GenInfo, is_data: bool) -> Result<Partition> {
    if !gen_info.enabled(is_data) {
        debug!(is_data, is_signal = gen_info.is_signal, "Generator-level partitioning disabled");
        return Ok(Partition {
            counts: PartitionCounts {
                unlabeled: events.num_events(),
                ..Default::default()
            },
            subsets: BTreeMap::new(),
        });
    }

    let modes = decay_modes(check_schema(events)?)?;
    let mut counts = PartitionCounts::default();
    let mut members: BTreeMap<DecayMode, Vec<usize>> =
        DecayMode::ALL.iter().map(|&mode| (mode, Vec::new())).collect();
    for (event, &mode) in modes.iter().enumerate() {
        counts.increment(mode);
        if let Some(mode) = mode {
            members
                .get_mut(&mode)
                .expect("All decay modes have a member list")
                .push(event);
        }
    }

    let labels = modes
        .iter()
        .map(|mode| mode.map_or(0, DecayMode::code))
        .collect();
    events.add_field(GEN_DECAY_MODE, Column::Int(labels))?;
    info!(
        num_events = events.num_events(),
        electron = counts.electron,
        muon = counts.muon,
        tau = counts.tau,
        unlabeled = counts.unlabeled,
        "Partitioned events by decay mode"
    );

    let subsets = members
        .into_iter()
        .map(|(mode, indices)| (mode, events.take(&indices)))
        .collect();
    Ok(Partition { counts, subsets })
}

/// Quarks from W decays, by decreasing pt, at most four per event
pub fn w_quarks(genpart: &ObjectCollection) -> Result<ObjectCollection> {
    let pdg_ids = genpart.attribute(PDG_ID)?;
    let mothers = genpart.attribute(MOTHER)?;
    let is_w_quark = genpart.offsets().ranges().flat_map(|range| {
        range.clone().map(move |idx| {
            let light = (1..=5).contains(&(abs(pdg_ids[idx]) as i64));
            light && from_w(pdg_ids, mothers, range.start, range.len(), idx)
        })
    });
    let mask = Jagged::new(genpart.offsets().clone(), is_w_quark.collect());
    let quarks = genpart.filter(&mask);

    let order = ranking::argsort_descending(&quarks, PT)?;
    let truncated = Jagged::from_nested(
        order
            .iter_events()
            .map(|local| local.iter().copied().take(NUM_W_QUARKS).collect())
            .collect(),
    );
    Ok(quarks.reorder(&truncated))
}

/// Truth that the mother of particle `idx` is a W boson
fn from_w(pdg_ids: &[Float], mothers: &[Float], start: usize, len: usize, idx: usize) -> bool {
    let mother = mothers[idx];
    mother >= 0.
        && (mother as usize) < len
        && (pdg_ids[start + mother as usize] as i64).abs() == W_BOSON
}
