//! This module defines the properties and storage of collision events
//!
//! Events are stored column-wise. Each object collection (electrons, muons,
//! jets...) is a set of attribute columns sharing one jagged offset table,
//! the diphoton candidate is a fixed-cardinality record, and per-event
//! results of the selection are named scalar columns.
//!
//! The table only ever grows: augmentations add new named collections and
//! fields, and collections which were ingested from the event source can
//! never be replaced.

use crate::{
    error::{Result, SelectionError},
    jagged::{Jagged, Mask, Offsets},
    numeric::Float,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::Path,
};
use tracing::debug;

/// Name of the raw electron collection
pub const ELECTRON: &str = "Electron";

/// Name of the raw muon collection
pub const MUON: &str = "Muon";

/// Name of the raw small-radius jet collection
pub const JET: &str = "Jet";

/// Name of the raw large-radius jet collection
pub const FATJET: &str = "FatJet";

/// Name of the raw photon collection
pub const PHOTON: &str = "Photon";

/// Name of the generator-level particle collection
pub const GEN_PART: &str = "GenPart";

/// Name of the diphoton candidate record
pub const DIPHOTON: &str = "Diphoton";

/// Name under which the two photons of the diphoton candidate are exposed
pub const DIPHOTON_PHOTONS: &str = "Diphoton.Photon";

/// Transverse momentum attribute
pub const PT: &str = "pt";

/// Pseudorapidity attribute
pub const ETA: &str = "eta";

/// Azimuthal angle attribute
pub const PHI: &str = "phi";

/// Mass attribute
pub const MASS: &str = "mass";

/// Photon identification score attribute
pub const MVA_ID: &str = "mvaID";

// ### COLUMNAR STORAGE ###

/// Jagged collection of physics objects, stored attribute by attribute
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectCollection {
    /// Name used when reporting missing attributes
    name: String,

    /// Per-event object boundaries, shared by all attribute columns
    offsets: Offsets,

    /// Attribute columns, all of which have `offsets.num_objects()` entries
    columns: BTreeMap<String, Vec<Float>>,
}
//
impl ObjectCollection {
    /// Start a collection with the given event structure and no attribute
    pub fn new(name: impl Into<String>, offsets: Offsets) -> Self {
        Self {
            name: name.into(),
            offsets,
            columns: BTreeMap::new(),
        }
    }

    /// Builder-style version of `insert`
    pub fn with(mut self, attribute: &str, values: Vec<Float>) -> Self {
        self.insert(attribute, values);
        self
    }

    /// Add or replace an attribute column
    pub fn insert(&mut self, attribute: &str, values: Vec<Float>) {
        assert_eq!(
            values.len(),
            self.offsets.num_objects(),
            "Attribute column must hold one value per object"
        );
        self.columns.insert(attribute.to_owned(), values);
    }

    /// Add or replace an attribute column given as a jagged sequence
    pub fn insert_jagged(&mut self, attribute: &str, values: Jagged<Float>) {
        assert_eq!(
            values.offsets(),
            &self.offsets,
            "Attribute must share the collection's event structure"
        );
        self.insert(attribute, values.into_parts().1);
    }

    /// Name of the collection
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Per-event object boundaries
    pub fn offsets(&self) -> &Offsets {
        &self.offsets
    }

    /// Number of events
    pub fn num_events(&self) -> usize {
        self.offsets.num_events()
    }

    /// Number of objects in each event
    pub fn counts(&self) -> Vec<usize> {
        self.offsets.counts()
    }

    /// Names of the attribute columns
    pub fn attributes(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.keys().map(String::as_str)
    }

    /// Truth that the collection carries a given attribute
    pub fn has_attribute(&self, attribute: &str) -> bool {
        self.columns.contains_key(attribute)
    }

    /// Flat column of one attribute
    pub fn attribute(&self, attribute: &str) -> Result<&[Float]> {
        self.columns
            .get(attribute)
            .map(Vec::as_slice)
            .ok_or_else(|| SelectionError::missing_attribute(&self.name, attribute))
    }

    /// Check that the collection carries all listed attributes
    pub fn require(&self, attributes: &[&str]) -> Result<()> {
        attributes
            .iter()
            .try_for_each(|attribute| self.attribute(attribute).map(|_| ()))
    }

    /// Jagged view of one attribute (copied out of the collection)
    pub fn jagged(&self, attribute: &str) -> Result<Jagged<Float>> {
        Ok(Jagged::new(
            self.offsets.clone(),
            self.attribute(attribute)?.to_vec(),
        ))
    }

    /// Rename the collection
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Keep only the objects selected by a mask
    ///
    /// The source collection is left untouched: this produces a new, filtered
    /// view whose events hold the surviving objects in their original order.
    ///
    pub fn filter(&self, mask: &Mask) -> Self {
        assert_eq!(
            mask.offsets(),
            &self.offsets,
            "Mask must share the collection's event structure"
        );
        let offsets = Offsets::from_counts(mask.count_true());
        let kept = mask.selected_indices();
        self.gather(offsets, &kept)
    }

    /// Reorder the objects of each event
    ///
    /// `order` gives, for each event, the local indices of the objects in the
    /// desired order. It may drop objects but must not go out of bounds.
    ///
    pub fn reorder(&self, order: &Jagged<usize>) -> Self {
        assert_eq!(order.num_events(), self.num_events());
        let mut flat = Vec::with_capacity(order.values().len());
        for (range, local) in self.offsets.ranges().zip(order.iter_events()) {
            flat.extend(local.iter().map(|&idx| {
                assert!(idx < range.len(), "Reordering index out of bounds");
                range.start + idx
            }));
        }
        self.gather(order.offsets().clone(), &flat)
    }

    /// Select a subset of events (in the given order)
    pub fn take_events(&self, events: &[usize]) -> Self {
        let (offsets, flat) = self.offsets.take(events);
        self.gather(offsets, &flat)
    }

    /// Concatenate consecutive event chunks of the same collection
    pub fn concat(parts: &[&ObjectCollection]) -> Self {
        let first = parts.first().expect("Cannot concatenate zero chunks");
        let offsets = Offsets::concat(parts.iter().map(|part| &part.offsets));
        let columns = first
            .columns
            .keys()
            .map(|attribute| {
                let values = parts
                    .iter()
                    .flat_map(|part| {
                        part.columns
                            .get(attribute)
                            .expect("Chunks must carry the same attributes")
                            .iter()
                            .copied()
                    })
                    .collect();
                (attribute.clone(), values)
            })
            .collect();
        Self {
            name: first.name.clone(),
            offsets,
            columns,
        }
    }

    /// Build a collection with a new structure from arena indices into self
    fn gather(&self, offsets: Offsets, flat: &[usize]) -> Self {
        debug_assert_eq!(offsets.num_objects(), flat.len());
        let columns = self
            .columns
            .iter()
            .map(|(attribute, values)| {
                (
                    attribute.clone(),
                    flat.iter().map(|&idx| values[idx]).collect(),
                )
            })
            .collect();
        Self {
            name: self.name.clone(),
            offsets,
            columns,
        }
    }
}

/// Per-event photon record, stored column-wise
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhotonColumns {
    pub pt: Vec<Float>,
    pub eta: Vec<Float>,
    pub phi: Vec<Float>,
    pub mass: Vec<Float>,
    /// Photon identification MVA score
    pub mva_id: Vec<Float>,
}
//
impl PhotonColumns {
    fn push(&mut self, photon: &PhotonRecord) {
        self.pt.push(photon.p4.pt);
        self.eta.push(photon.p4.eta);
        self.phi.push(photon.p4.phi);
        self.mass.push(photon.p4.mass);
        self.mva_id.push(photon.mva_id);
    }

    fn take(&self, events: &[usize]) -> Self {
        let pick = |column: &[Float]| events.iter().map(|&e| column[e]).collect();
        Self {
            pt: pick(&self.pt),
            eta: pick(&self.eta),
            phi: pick(&self.phi),
            mass: pick(&self.mass),
            mva_id: pick(&self.mva_id),
        }
    }

    fn extend(&mut self, other: &Self) {
        self.pt.extend_from_slice(&other.pt);
        self.eta.extend_from_slice(&other.eta);
        self.phi.extend_from_slice(&other.phi);
        self.mass.extend_from_slice(&other.mass);
        self.mva_id.extend_from_slice(&other.mva_id);
    }
}

/// Diphoton candidate: exactly one per event, with its two photons
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Diphoton {
    pub pt: Vec<Float>,
    pub eta: Vec<Float>,
    pub phi: Vec<Float>,
    pub mass: Vec<Float>,
    /// Leading photon
    pub lead: PhotonColumns,
    /// Subleading photon
    pub sublead: PhotonColumns,
}
//
impl Diphoton {
    /// The two photons of each candidate, as a jagged collection
    ///
    /// Every event holds exactly two entries: leading photon first.
    ///
    pub fn photons(&self) -> ObjectCollection {
        let num_events = self.pt.len();
        let interleave = |lead: &[Float], sublead: &[Float]| {
            lead.iter()
                .zip(sublead)
                .flat_map(|(&l, &s)| [l, s])
                .collect::<Vec<_>>()
        };
        ObjectCollection::new(
            DIPHOTON_PHOTONS,
            Offsets::from_counts(std::iter::repeat(2).take(num_events)),
        )
        .with(PT, interleave(&self.lead.pt, &self.sublead.pt))
        .with(ETA, interleave(&self.lead.eta, &self.sublead.eta))
        .with(PHI, interleave(&self.lead.phi, &self.sublead.phi))
        .with(MASS, interleave(&self.lead.mass, &self.sublead.mass))
        .with(MVA_ID, interleave(&self.lead.mva_id, &self.sublead.mva_id))
    }

    fn push(&mut self, record: &DiphotonRecord) {
        self.pt.push(record.p4.pt);
        self.eta.push(record.p4.eta);
        self.phi.push(record.p4.phi);
        self.mass.push(record.p4.mass);
        self.lead.push(&record.lead_photon);
        self.sublead.push(&record.sublead_photon);
    }

    fn take(&self, events: &[usize]) -> Self {
        let pick = |column: &[Float]| events.iter().map(|&e| column[e]).collect();
        Self {
            pt: pick(&self.pt),
            eta: pick(&self.eta),
            phi: pick(&self.phi),
            mass: pick(&self.mass),
            lead: self.lead.take(events),
            sublead: self.sublead.take(events),
        }
    }

    fn extend(&mut self, other: &Self) {
        self.pt.extend_from_slice(&other.pt);
        self.eta.extend_from_slice(&other.eta);
        self.phi.extend_from_slice(&other.phi);
        self.mass.extend_from_slice(&other.mass);
        self.lead.extend(&other.lead);
        self.sublead.extend(&other.sublead);
    }
}

/// Per-event scalar field added by the selection
#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    Float(Vec<Float>),
    Int(Vec<i64>),
    Bool(Vec<bool>),
}
//
impl Column {
    /// Number of events
    pub fn len(&self) -> usize {
        match self {
            Self::Float(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Bool(v) => v.len(),
        }
    }

    /// Truth that the column holds no event
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Access floating-point contents
    pub fn as_float(&self) -> Option<&[Float]> {
        match self {
            Self::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Access integer contents
    pub fn as_int(&self) -> Option<&[i64]> {
        match self {
            Self::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Access boolean contents
    pub fn as_bool(&self) -> Option<&[bool]> {
        match self {
            Self::Bool(v) => Some(v),
            _ => None,
        }
    }

    fn take(&self, events: &[usize]) -> Self {
        fn pick<T: Copy>(column: &[T], events: &[usize]) -> Vec<T> {
            events.iter().map(|&e| column[e]).collect()
        }
        match self {
            Self::Float(v) => Self::Float(pick(v, events)),
            Self::Int(v) => Self::Int(pick(v, events)),
            Self::Bool(v) => Self::Bool(pick(v, events)),
        }
    }

    fn extend(&mut self, other: &Self) {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => a.extend_from_slice(b),
            (Self::Int(a), Self::Int(b)) => a.extend_from_slice(b),
            (Self::Bool(a), Self::Bool(b)) => a.extend_from_slice(b),
            _ => panic!("Chunks must carry fields of the same type"),
        }
    }
}

/// Ordered sequence of events with their object collections
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventTable {
    /// Event identifiers, one per event
    event_ids: Vec<u64>,

    /// Diphoton candidate of each event
    diphoton: Diphoton,

    /// Jagged object collections, by name
    collections: BTreeMap<String, ObjectCollection>,

    /// Per-event scalar fields, by name
    fields: BTreeMap<String, Column>,

    /// Names of the collections that were ingested rather than derived
    sources: BTreeSet<String>,

    /// Channel in charge of the augmentations currently being made
    writer: String,

    /// Channel which wrote each derived collection or field
    written_by: BTreeMap<String, String>,
}
//
impl EventTable {
    // ### CONSTRUCTION ###

    /// Start a table from event identifiers and diphoton candidates
    pub fn new(event_ids: Vec<u64>, diphoton: Diphoton) -> Self {
        assert_eq!(event_ids.len(), diphoton.pt.len());
        Self {
            event_ids,
            diphoton,
            ..Self::default()
        }
    }

    /// Register a collection ingested from the event source
    pub fn add_source(&mut self, collection: ObjectCollection) {
        assert_eq!(collection.num_events(), self.num_events());
        let name = collection.name().to_owned();
        self.sources.insert(name.clone());
        self.collections.insert(name, collection);
    }

    /// Convert per-event records into a columnar table
    pub fn from_records(records: &[EventRecord]) -> Self {
        let mut diphoton = Diphoton::default();
        for record in records {
            diphoton.push(&record.diphoton);
        }
        let mut table = Self::new(records.iter().map(|r| r.event).collect(), diphoton);
        table.add_source(collect_objects(ELECTRON, records, |r| &r.electrons));
        table.add_source(collect_objects(MUON, records, |r| &r.muons));
        table.add_source(collect_objects(JET, records, |r| &r.jets));
        table.add_source(collect_objects(FATJET, records, |r| &r.fatjets));
        table.add_source(collect_objects(PHOTON, records, |r| &r.photons));
        if records.iter().any(|r| r.gen_particles.is_some()) {
            table.add_source(collect_objects(GEN_PART, records, |r| {
                r.gen_particles.as_deref().unwrap_or_default()
            }));
        }
        table
    }

    /// Load per-event records from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| SelectionError::Io {
            path: path.to_owned(),
            source,
        })?;
        let records: Vec<EventRecord> =
            serde_json::from_str(&contents).map_err(|source| SelectionError::EventSyntax {
                path: path.to_owned(),
                source,
            })?;
        debug!(path = %path.display(), num_events = records.len(), "Loaded event records");
        Ok(Self::from_records(&records))
    }

    // ### ACCESS ###

    /// Number of events
    pub fn num_events(&self) -> usize {
        self.event_ids.len()
    }

    /// Event identifiers
    pub fn event_ids(&self) -> &[u64] {
        &self.event_ids
    }

    /// Diphoton candidates
    pub fn diphoton(&self) -> &Diphoton {
        &self.diphoton
    }

    /// Look up an object collection
    pub fn collection(&self, name: &str) -> Result<&ObjectCollection> {
        self.collections
            .get(name)
            .ok_or_else(|| SelectionError::missing_collection(name))
    }

    /// Truth that an object collection exists
    pub fn has_collection(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    /// Names of all object collections
    pub fn collection_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.collections.keys().map(String::as_str)
    }

    /// Look up a per-event field
    pub fn field(&self, name: &str) -> Result<&Column> {
        self.fields
            .get(name)
            .ok_or_else(|| SelectionError::MissingField {
                name: name.to_owned(),
            })
    }

    /// Names of all per-event fields
    pub fn field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.keys().map(String::as_str)
    }

    // ### AUGMENTATION ###

    /// Attribute the upcoming augmentations to a channel
    ///
    /// A channel may replace what it wrote itself, but not what another
    /// channel wrote.
    ///
    pub fn set_writer(&mut self, writer: &str) {
        self.writer = writer.to_owned();
    }

    /// Channel which wrote a derived collection or field, if any
    pub fn writer_of(&self, name: &str) -> Option<&str> {
        self.written_by.get(name).map(String::as_str)
    }

    /// Check that a derived name may be (re)written, and claim it
    fn claim(&mut self, name: &str) -> Result<()> {
        if self.sources.contains(name) {
            return Err(SelectionError::ReservedName {
                name: name.to_owned(),
            });
        }
        match self.written_by.get(name) {
            Some(owner) if *owner != self.writer => Err(SelectionError::NameCollision {
                name: name.to_owned(),
                owner: owner.clone(),
                writer: self.writer.clone(),
            }),
            Some(_) => Ok(()),
            None => {
                self.written_by.insert(name.to_owned(), self.writer.clone());
                Ok(())
            }
        }
    }

    /// Register a derived collection under a new name
    ///
    /// Source collections can never be replaced, nor can the outputs of
    /// another channel. Derived collections which the current writer already
    /// produced are replaced, so that re-running a selection on its own
    /// output is idempotent.
    ///
    pub fn add_collection(&mut self, name: &str, collection: ObjectCollection) -> Result<()> {
        assert_eq!(collection.num_events(), self.num_events());
        self.claim(name)?;
        if self.collections.contains_key(name) {
            debug!(name, "Replacing existing derived collection");
        }
        self.collections
            .insert(name.to_owned(), collection.renamed(name));
        Ok(())
    }

    /// Register a per-event field
    ///
    /// Same replacement rules as `add_collection`.
    ///
    pub fn add_field(&mut self, name: &str, column: Column) -> Result<()> {
        assert_eq!(column.len(), self.num_events());
        self.claim(name)?;
        if self.fields.insert(name.to_owned(), column).is_some() {
            debug!(name, "Replaced existing field");
        }
        Ok(())
    }

    // ### RESHAPING ###

    /// Select a subset of events (in the given order)
    pub fn take(&self, events: &[usize]) -> Self {
        Self {
            event_ids: events.iter().map(|&e| self.event_ids[e]).collect(),
            diphoton: self.diphoton.take(events),
            collections: self
                .collections
                .iter()
                .map(|(name, c)| (name.clone(), c.take_events(events)))
                .collect(),
            fields: self
                .fields
                .iter()
                .map(|(name, f)| (name.clone(), f.take(events)))
                .collect(),
            sources: self.sources.clone(),
            writer: self.writer.clone(),
            written_by: self.written_by.clone(),
        }
    }

    /// Split the table into consecutive chunks of at most `chunk_size` events
    pub fn chunks(&self, chunk_size: usize) -> Vec<Self> {
        assert!(chunk_size > 0, "Chunks must hold at least one event");
        let num_events = self.num_events();
        (0..num_events)
            .step_by(chunk_size)
            .map(|start| {
                let end = (start + chunk_size).min(num_events);
                self.take(&(start..end).collect::<Vec<_>>())
            })
            .collect()
    }

    /// Reassemble consecutive chunks produced by the same processing
    pub fn concat(parts: &[Self]) -> Self {
        let Some(first) = parts.first() else {
            return Self::default();
        };
        let mut diphoton = Diphoton::default();
        let mut event_ids = Vec::new();
        for part in parts {
            diphoton.extend(&part.diphoton);
            event_ids.extend_from_slice(&part.event_ids);
        }
        let collections = first
            .collections
            .keys()
            .map(|name| {
                let chunks = parts
                    .iter()
                    .map(|part| {
                        part.collections
                            .get(name)
                            .expect("Chunks must carry the same collections")
                    })
                    .collect::<Vec<_>>();
                (name.clone(), ObjectCollection::concat(&chunks))
            })
            .collect();
        let fields = first
            .fields
            .iter()
            .map(|(name, column)| {
                let mut column = column.clone();
                for part in &parts[1..] {
                    column.extend(
                        part.fields
                            .get(name)
                            .expect("Chunks must carry the same fields"),
                    );
                }
                (name.clone(), column)
            })
            .collect();
        Self {
            event_ids,
            diphoton,
            collections,
            fields,
            sources: first.sources.clone(),
            writer: first.writer.clone(),
            written_by: first.written_by.clone(),
        }
    }
}

// ### RECORD-ORIENTED INPUT ###

/// Kinematic attributes shared by all physics objects
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    pub pt: Float,
    pub eta: Float,
    pub phi: Float,
    #[serde(default)]
    pub mass: Float,
}

/// Reconstructed electron
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ElectronRecord {
    #[serde(flatten)]
    pub p4: Kinematics,
    pub dxy: Float,
    pub dz: Float,
    #[serde(rename = "mvaFall17V2Iso_WP80")]
    pub mva_wp80: bool,
    #[serde(rename = "mvaFall17V2Iso_WP90")]
    pub mva_wp90: bool,
}

/// Reconstructed muon
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MuonRecord {
    #[serde(flatten)]
    pub p4: Kinematics,
    pub dxy: Float,
    pub dz: Float,
    #[serde(rename = "looseId")]
    pub loose_id: bool,
    #[serde(rename = "mediumId")]
    pub medium_id: bool,
    #[serde(rename = "tightId")]
    pub tight_id: bool,
    #[serde(rename = "pfRelIso03_all")]
    pub rel_iso: Float,
    #[serde(rename = "isGlobal")]
    pub is_global: bool,
}

/// Reconstructed small-radius jet
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JetRecord {
    #[serde(flatten)]
    pub p4: Kinematics,
    #[serde(rename = "jetId")]
    pub jet_id: i32,
    #[serde(rename = "btagDeepFlavB", default)]
    pub btag: Float,
}

/// Reconstructed large-radius jet
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FatJetRecord {
    #[serde(flatten)]
    pub p4: Kinematics,
    /// W-boson versus QCD discriminant
    #[serde(rename = "deepTagMD_WvsQCD", default)]
    pub w_vs_qcd: Float,
    /// H→WW→4q/3q versus QCD discriminant
    #[serde(rename = "inclParTMDV1_HWW4q3qvsQCD", default)]
    pub hww_vs_qcd: Float,
}

/// Reconstructed photon
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotonRecord {
    #[serde(flatten)]
    pub p4: Kinematics,
    #[serde(rename = "mvaID")]
    pub mva_id: Float,
}

/// Diphoton candidate with its two photons
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DiphotonRecord {
    #[serde(flatten)]
    pub p4: Kinematics,
    #[serde(rename = "LeadPhoton")]
    pub lead_photon: PhotonRecord,
    #[serde(rename = "SubleadPhoton")]
    pub sublead_photon: PhotonRecord,
}

/// Generator-level particle
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenParticleRecord {
    #[serde(flatten)]
    pub p4: Kinematics,
    #[serde(rename = "pdgId")]
    pub pdg_id: i32,
    /// Index of the mother particle within the same event (-1 if none)
    #[serde(rename = "genPartIdxMother")]
    pub mother: i32,
}

/// One event, as produced by the upstream event source
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event: u64,
    #[serde(default)]
    pub electrons: Vec<ElectronRecord>,
    #[serde(default)]
    pub muons: Vec<MuonRecord>,
    #[serde(default)]
    pub jets: Vec<JetRecord>,
    #[serde(default)]
    pub fatjets: Vec<FatJetRecord>,
    #[serde(default)]
    pub photons: Vec<PhotonRecord>,
    pub diphoton: DiphotonRecord,
    /// Absent for collision data and for samples without truth information
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gen_particles: Option<Vec<GenParticleRecord>>,
}

/// A record type that can be stored in an `ObjectCollection`
pub trait ObjectRecord {
    /// Attribute names, in the order used by `values()`
    const ATTRIBUTES: &'static [&'static str];

    /// Attribute values, integer and boolean identifiers encoded as Float
    fn values(&self) -> Vec<Float>;
}

fn flag(b: bool) -> Float {
    if b {
        1.
    } else {
        0.
    }
}

impl ObjectRecord for ElectronRecord {
    const ATTRIBUTES: &'static [&'static str] = &[
        PT,
        ETA,
        PHI,
        MASS,
        "dxy",
        "dz",
        "mvaFall17V2Iso_WP80",
        "mvaFall17V2Iso_WP90",
    ];

    fn values(&self) -> Vec<Float> {
        let p = &self.p4;
        vec![
            p.pt,
            p.eta,
            p.phi,
            p.mass,
            self.dxy,
            self.dz,
            flag(self.mva_wp80),
            flag(self.mva_wp90),
        ]
    }
}

impl ObjectRecord for MuonRecord {
    const ATTRIBUTES: &'static [&'static str] = &[
        PT,
        ETA,
        PHI,
        MASS,
        "dxy",
        "dz",
        "looseId",
        "mediumId",
        "tightId",
        "pfRelIso03_all",
        "isGlobal",
    ];

    fn values(&self) -> Vec<Float> {
        let p = &self.p4;
        vec![
            p.pt,
            p.eta,
            p.phi,
            p.mass,
            self.dxy,
            self.dz,
            flag(self.loose_id),
            flag(self.medium_id),
            flag(self.tight_id),
            self.rel_iso,
            flag(self.is_global),
        ]
    }
}

impl ObjectRecord for JetRecord {
    const ATTRIBUTES: &'static [&'static str] = &[PT, ETA, PHI, MASS, "jetId", "btagDeepFlavB"];

    fn values(&self) -> Vec<Float> {
        let p = &self.p4;
        vec![p.pt, p.eta, p.phi, p.mass, self.jet_id as Float, self.btag]
    }
}

impl ObjectRecord for FatJetRecord {
    const ATTRIBUTES: &'static [&'static str] = &[
        PT,
        ETA,
        PHI,
        MASS,
        "deepTagMD_WvsQCD",
        "inclParTMDV1_HWW4q3qvsQCD",
    ];

    fn values(&self) -> Vec<Float> {
        let p = &self.p4;
        vec![p.pt, p.eta, p.phi, p.mass, self.w_vs_qcd, self.hww_vs_qcd]
    }
}

impl ObjectRecord for PhotonRecord {
    const ATTRIBUTES: &'static [&'static str] = &[PT, ETA, PHI, MASS, MVA_ID];

    fn values(&self) -> Vec<Float> {
        let p = &self.p4;
        vec![p.pt, p.eta, p.phi, p.mass, self.mva_id]
    }
}

impl ObjectRecord for GenParticleRecord {
    const ATTRIBUTES: &'static [&'static str] =
        &[PT, ETA, PHI, MASS, "pdgId", "genPartIdxMother"];

    fn values(&self) -> Vec<Float> {
        let p = &self.p4;
        vec![
            p.pt,
            p.eta,
            p.phi,
            p.mass,
            self.pdg_id as Float,
            self.mother as Float,
        ]
    }
}

/// Gather one kind of object from per-event records into a collection
fn collect_objects<R: ObjectRecord>(
    name: &str,
    records: &[EventRecord],
    objects: impl Fn(&EventRecord) -> &[R],
) -> ObjectCollection {
    let offsets = Offsets::from_counts(records.iter().map(|r| objects(r).len()));
    let mut columns = vec![Vec::with_capacity(offsets.num_objects()); R::ATTRIBUTES.len()];
    for object in records.iter().flat_map(|r| objects(r)) {
        for (column, value) in columns.iter_mut().zip(object.values()) {
            column.push(value);
        }
    }
    R::ATTRIBUTES
        .iter()
        .zip(columns)
        .fold(ObjectCollection::new(name, offsets), |c, (attr, values)| {
            c.with(attr, values)
        })
}
