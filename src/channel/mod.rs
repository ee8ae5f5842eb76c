//! Analysis channels
//!
//! A channel wires object selection, ranking, truth partitioning and the
//! category cascade together for one final state. Each channel is exposed as a
//! [`Tagger`], whose `select` operation consumes a chunk of events and returns
//! the augmented table together with the per-event pass/fail decision.
//!
//! Every name which a channel adds to the event table can be namespaced with a
//! per-channel prefix, so that several channels may augment the same table.

mod fhsl;
mod semileptonic;

pub use self::{
    fhsl::{FhslOptions, FhslTagger, FhslWidths},
    semileptonic::{SemileptonicOptions, SemileptonicTagger, SemileptonicWidths},
};

use crate::{
    cascade::{Categorization, Gating, NamedMask},
    config::Configuration,
    cutflow::CutFlowRecorder,
    error::{DegenerateEvents, Result},
    event::{Column, Diphoton, EventTable, ObjectCollection, ETA, PHI, PT},
    kinematics::delta_r,
    numeric::{is_dummy, Float, DUMMY_VALUE},
    truth::{DecayMode, PartitionCounts},
};
use std::{collections::BTreeMap, fmt, str::FromStr};
use tracing::debug;

// ### NAMES OF CASCADE INPUTS ###

/// Number of selected electrons
pub const N_ELECTRONS: &str = "n_electrons";

/// Number of selected muons
pub const N_MUONS: &str = "n_muons";

/// Number of selected electrons and muons
pub const N_LEPTONS: &str = "n_leptons";

/// Number of selected small-radius jets
pub const N_JETS: &str = "n_jets";

/// Number of selected large-radius jets
pub const N_FATJETS: &str = "n_fatjets";

/// Number of W-tagged large-radius jets
pub const N_FATJETS_W: &str = "n_fatjets_W";

/// Number of H-tagged large-radius jets
pub const N_FATJETS_H: &str = "n_fatjets_H";

/// 1 if the diphoton candidate's pt is above the channel threshold
pub const DIPHOTON_HIGH_PT: &str = "diphoton_high_pt";

/// 1 if both photons pass the identification threshold
pub const PHOTON_ID: &str = "photon_id";

// ### NAMES OF GATES ###

/// Both photons pass the identification threshold
pub const PHOTON_ID_SELECTION: &str = "Photon id Selection";

/// Exactly one selected lepton
pub const LEPTON_SELECTION: &str = "Lepton Selection";

/// Category code reaches the configured minimum
pub const CATEGORY_SELECTION: &str = "Category Selection";

/// One analysis channel
pub trait Tagger: Sync {
    /// Name of the channel
    fn name(&self) -> &'static str;

    /// Select and categorize a chunk of events
    ///
    /// Configuration and schema problems abort the whole chunk: no partially
    /// augmented table is ever returned.
    ///
    fn select(
        &self,
        events: EventTable,
        recorder: &mut dyn CutFlowRecorder,
    ) -> Result<TaggedEvents>;
}

/// Available channels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    /// One lepton, two photons and jets (HH → WWγγ → ℓνqqγγ)
    Semileptonic,
    /// Combined fully hadronic and boosted semileptonic channel
    Fhsl,
}
//
impl Channel {
    /// Set up the tagger of this channel
    pub fn tagger(self, config: &Configuration) -> Result<Box<dyn Tagger>> {
        Ok(match self {
            Self::Semileptonic => Box::new(SemileptonicTagger::new(
                config.semileptonic.clone(),
                config.is_data,
            )?),
            Self::Fhsl => Box::new(FhslTagger::new(config.fhsl.clone(), config.is_data)?),
        })
    }
}
//
impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Semileptonic => write!(f, "semileptonic"),
            Self::Fhsl => write!(f, "fhsl"),
        }
    }
}
//
impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s {
            "semileptonic" => Ok(Self::Semileptonic),
            "fhsl" => Ok(Self::Fhsl),
            other => Err(format!("unknown channel `{other}`")),
        }
    }
}

/// Outcome of running a channel on some events
#[derive(Clone, Debug, Default)]
pub struct TaggedEvents {
    /// Overall decision of each event
    pub pass: Vec<bool>,
    /// Input events, augmented with the channel's collections and fields
    pub events: EventTable,
    /// Category code of each event
    pub category: Vec<i64>,
    /// Mask of each category rule, in declaration order
    pub rule_masks: Vec<NamedMask>,
    /// Mask of each gate, in the order they were applied
    pub gates: Vec<NamedMask>,
    /// Decay-mode label counts
    pub partition: PartitionCounts,
    /// Augmented decay-mode subsets (empty when truth logic is disabled)
    pub subsets: BTreeMap<DecayMode, EventTable>,
    /// Collections that some events had no object of (sorted by name once
    /// chunks are reassembled)
    pub degenerate: Vec<DegenerateEvents>,
}
//
impl TaggedEvents {
    /// Assemble the final result and report the decisions to the recorder
    fn new(
        events: EventTable,
        categorization: Categorization,
        gating: Gating,
        partition: PartitionCounts,
        subsets: BTreeMap<DecayMode, EventTable>,
        degenerate: Vec<DegenerateEvents>,
        recorder: &mut dyn CutFlowRecorder,
    ) -> Self {
        let Categorization {
            category,
            rule_masks,
        } = categorization;
        let (pass, gates) = gating.into_parts();
        for gate in &gates {
            recorder.record(&gate.name, &gate.mask);
        }
        for rule in &rule_masks {
            recorder.record(&format!("category_{}", rule.name), &rule.mask);
        }
        Self {
            pass,
            events,
            category,
            rule_masks,
            gates,
            partition,
            subsets,
            degenerate,
        }
    }

    /// Number of events which passed the selection
    pub fn num_passed(&self) -> usize {
        self.pass.iter().filter(|&&pass| pass).count()
    }

    /// Number of passing events in each category
    pub fn category_yields(&self) -> BTreeMap<i64, usize> {
        let mut yields = BTreeMap::new();
        for (&category, &pass) in self.category.iter().zip(&self.pass) {
            if pass {
                *yields.entry(category).or_insert(0) += 1;
            }
        }
        yields
    }

    /// Reassemble the results of consecutive chunks of events
    pub fn concat(parts: Vec<Self>) -> Self {
        let mut merged = Self::default();
        let mut tables = Vec::with_capacity(parts.len());
        let mut subsets: BTreeMap<DecayMode, Vec<EventTable>> = BTreeMap::new();
        for part in parts {
            merged.pass.extend(part.pass);
            merged.category.extend(part.category);
            concat_masks(&mut merged.rule_masks, part.rule_masks);
            concat_masks(&mut merged.gates, part.gates);
            merged.partition.merge(&part.partition);
            for report in part.degenerate {
                match merged
                    .degenerate
                    .iter_mut()
                    .find(|r| r.collection == report.collection)
                {
                    Some(r) => r.num_events += report.num_events,
                    None => merged.degenerate.push(report),
                }
            }
            tables.push(part.events);
            for (mode, subset) in part.subsets {
                subsets.entry(mode).or_default().push(subset);
            }
        }
        merged
            .degenerate
            .sort_by(|a, b| a.collection.cmp(&b.collection));
        merged.events = EventTable::concat(&tables);
        merged.subsets = subsets
            .into_iter()
            .map(|(mode, parts)| (mode, EventTable::concat(&parts)))
            .collect();
        merged
    }
}

fn concat_masks(into: &mut Vec<NamedMask>, from: Vec<NamedMask>) {
    if into.is_empty() {
        *into = from;
        return;
    }
    assert_eq!(into.len(), from.len(), "Chunks must report the same masks");
    for (acc, part) in into.iter_mut().zip(from) {
        assert_eq!(acc.name, part.name, "Chunks must report the same masks");
        acc.mask.extend(part.mask);
    }
}

// ### BUILDING BLOCKS SHARED BY THE CHANNELS ###

/// Apply the channel's namespace to a collection or field name
fn prefixed(prefix: &str, name: &str) -> String {
    format!("{prefix}{name}")
}

/// Check that the raw collections a channel reads exist and are usable
fn check_sources(events: &EventTable, collections: &[&str]) -> Result<()> {
    for &name in collections {
        events.collection(name)?.require(&[PT, ETA, PHI])?;
    }
    Ok(())
}

/// Register a selected collection, returning it under its new name
fn register(
    events: &mut EventTable,
    name: &str,
    objects: ObjectCollection,
) -> Result<ObjectCollection> {
    let objects = objects.renamed(name);
    debug!(
        name,
        num_objects = objects.offsets().num_objects(),
        "Registering selected objects"
    );
    events.add_collection(name, objects.clone())?;
    Ok(objects)
}

/// Register an object count as an integer field
fn add_count(events: &mut EventTable, name: &str, counts: &[usize]) -> Result<()> {
    let counts = counts.iter().map(|&n| n as i64).collect();
    events.add_field(name, Column::Int(counts))
}

/// Both photons of the diphoton candidate pass the identification threshold
fn photon_id_mask(diphoton: &Diphoton, min_mva_id: Float) -> Vec<bool> {
    diphoton
        .lead
        .mva_id
        .iter()
        .zip(&diphoton.sublead.mva_id)
        .map(|(&lead, &sublead)| lead > min_mva_id && sublead > min_mva_id)
        .collect()
}

/// Attach to each object its ΔR to one reference object per event
///
/// Events whose reference is missing (dummy η) get the dummy value.
///
fn add_delta_r(
    objects: &mut ObjectCollection,
    attribute: &str,
    ref_eta: &[Float],
    ref_phi: &[Float],
) -> Result<()> {
    assert_eq!(ref_eta.len(), objects.num_events());
    assert_eq!(ref_phi.len(), objects.num_events());
    let values = {
        let eta = objects.attribute(ETA)?;
        let phi = objects.attribute(PHI)?;
        let mut values = Vec::with_capacity(eta.len());
        for (event, range) in objects.offsets().ranges().enumerate() {
            let (r_eta, r_phi) = (ref_eta[event], ref_phi[event]);
            values.extend(range.map(|idx| {
                if is_dummy(r_eta) {
                    DUMMY_VALUE
                } else {
                    delta_r(eta[idx], phi[idx], r_eta, r_phi)
                }
            }));
        }
        values
    };
    objects.insert(attribute, values);
    Ok(())
}

/// Report the events where a collection the cascade depends on is empty
fn degenerate_events(collection: &str, counts: &[usize]) -> Option<DegenerateEvents> {
    let num_events = counts.iter().filter(|&&n| n == 0).count();
    (num_events > 0).then(|| {
        debug!(collection, num_events, "Events without any selected object");
        DegenerateEvents {
            collection: collection.to_owned(),
            num_events,
        }
    })
}

/// Per-event sum of two object counts
fn sum_counts(a: &[usize], b: &[usize]) -> Vec<usize> {
    a.iter().zip(b).map(|(&a, &b)| a + b).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        event::{EventRecord, JetRecord, Kinematics, JET},
        jagged::Offsets,
    };
    use approx::assert_relative_eq;

    #[test]
    fn delta_r_to_missing_reference_is_dummy() {
        let mut jets = ObjectCollection::new("jets", Offsets::from_counts([2, 1]))
            .with(ETA, vec![0., 1., 0.])
            .with(PHI, vec![0., 0., 3.]);
        add_delta_r(&mut jets, "dr", &[0., DUMMY_VALUE], &[1., DUMMY_VALUE]).unwrap();
        let dr = jets.attribute("dr").unwrap();
        assert_relative_eq!(dr[0], 1.);
        assert_relative_eq!(dr[1], (2.0 as Float).sqrt());
        assert_eq!(dr[2], DUMMY_VALUE);
    }

    #[test]
    fn photon_id_needs_both_photons() {
        let mut diphoton = Diphoton::default();
        diphoton.lead.mva_id = vec![0.5, -0.95, 0.5, -0.9];
        diphoton.sublead.mva_id = vec![0.5, 0.5, -0.95, 0.];
        assert_eq!(
            photon_id_mask(&diphoton, -0.9),
            vec![true, false, false, false]
        );
    }

    #[test]
    fn sources_are_checked_up_front() {
        let events = EventTable::from_records(&[EventRecord {
            event: 1,
            jets: vec![JetRecord {
                p4: Kinematics {
                    pt: 30.,
                    eta: 0.,
                    phi: 0.,
                    mass: 0.,
                },
                ..Default::default()
            }],
            ..Default::default()
        }]);
        assert!(check_sources(&events, &[JET]).is_ok());
        let err = check_sources(&events, &["Tau"]).unwrap_err();
        assert_eq!(err.to_string(), "event table has no collection `Tau`");
    }

    #[test]
    fn channel_names_round_trip() {
        for channel in [Channel::Semileptonic, Channel::Fhsl] {
            assert_eq!(channel.to_string().parse::<Channel>(), Ok(channel));
        }
        assert!("dilepton".parse::<Channel>().is_err());
    }

    #[test]
    fn degenerate_events_are_counted() {
        assert_eq!(degenerate_events("jets", &[1, 2]), None);
        assert_eq!(
            degenerate_events("jets", &[0, 2, 0]),
            Some(DegenerateEvents {
                collection: "jets".to_owned(),
                num_events: 2
            })
        );
    }
}
