//! Semileptonic channel: one isolated lepton, a diphoton and hadronic W decay
//!
//! Events are categorized by whether the hadronically decaying W is resolved
//! into two small-radius jets or reconstructed as one W-tagged large-radius
//! jet, and by whether the diphoton candidate is boosted. On signal samples,
//! the events are also partitioned by the flavour of the lepton from the W,
//! and leptons are re-selected within each of these subsets.

use super::{
    add_count, add_delta_r, check_sources, degenerate_events, photon_id_mask, prefixed,
    register, sum_counts, TaggedEvents, Tagger, CATEGORY_SELECTION, DIPHOTON_HIGH_PT,
    LEPTON_SELECTION, N_ELECTRONS, N_FATJETS, N_FATJETS_W, N_JETS, N_LEPTONS, N_MUONS,
    PHOTON_ID, PHOTON_ID_SELECTION,
};
use crate::{
    cascade::{Cascade, CategoryRule, Gating, Quantities, Requirement},
    cleaning::CleaningRef,
    config::{check_finite, check_non_negative, check_width},
    cutflow::CutFlowRecorder,
    error::Result,
    event::{Column, EventTable, ObjectCollection, ELECTRON, FATJET, JET, MUON, PT},
    numeric::Float,
    ranking,
    selection::{
        select_electrons, select_fatjets, select_jets, select_muons, tag_fatjets,
        ElectronOptions, FatJetOptions, FatJetTagOptions, JetOptions, MuonOptions,
    },
    truth::{self, DecayMode, GenInfo},
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Configuration key of this channel
const KEY: &str = "semileptonic";

/// Quantities which category rules may refer to
const INPUTS: [&str; 8] = [
    N_ELECTRONS,
    N_MUONS,
    N_LEPTONS,
    N_JETS,
    N_FATJETS,
    N_FATJETS_W,
    DIPHOTON_HIGH_PT,
    PHOTON_ID,
];

/// Number of ranked slots exposed per collection
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SemileptonicWidths {
    pub electrons: usize,
    pub muons: usize,
    #[serde(rename = "fatjets_W")]
    pub fatjets_w: usize,
    pub jets: usize,
}
//
impl Default for SemileptonicWidths {
    fn default() -> Self {
        Self {
            electrons: 7,
            muons: 7,
            fatjets_w: 1,
            jets: 7,
        }
    }
}

/// Configuration of the semileptonic channel
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SemileptonicOptions {
    pub electrons: ElectronOptions,
    pub muons: MuonOptions,
    pub jets: JetOptions,
    pub fatjets: FatJetOptions,
    /// W tagging of the selected large-radius jets
    #[serde(rename = "fatjets_W")]
    pub fatjets_w: FatJetTagOptions,
    /// Minimal identification score of both photons
    pub photon_id: Float,
    /// Diphoton pt above which the candidate counts as boosted (GeV)
    pub diphoton_pt: Float,
    /// Smallest category code which passes the "Category Selection" gate
    pub min_category: i64,
    /// Category rules, in override order
    pub categories: Vec<CategoryRule>,
    pub widths: SemileptonicWidths,
    pub gen_info: GenInfo,
    /// Prepended to every collection and field name which the channel adds
    pub field_prefix: String,
}
//
impl Default for SemileptonicOptions {
    fn default() -> Self {
        Self {
            electrons: ElectronOptions::default(),
            muons: MuonOptions {
                eta: 2.5,
                ..Default::default()
            },
            jets: JetOptions {
                pt: 25.,
                eta: 2.5,
                ..Default::default()
            },
            fatjets: FatJetOptions::default(),
            fatjets_w: FatJetTagOptions::w_tag(),
            photon_id: -0.9,
            diphoton_pt: 100.,
            min_category: 0,
            categories: default_categories(),
            widths: SemileptonicWidths::default(),
            gen_info: GenInfo::default(),
            field_prefix: String::new(),
        }
    }
}
//
impl SemileptonicOptions {
    /// Check the configuration before any event is processed
    pub fn validate(&self, key: &str) -> Result<()> {
        self.electrons.validate(&format!("{key}.electrons"))?;
        self.muons.validate(&format!("{key}.muons"))?;
        self.jets.validate(&format!("{key}.jets"))?;
        self.fatjets.validate(&format!("{key}.fatjets"))?;
        self.fatjets_w.validate(&format!("{key}.fatjets_W"))?;
        check_finite(&format!("{key}.photon_id"), self.photon_id)?;
        check_non_negative(&format!("{key}.diphoton_pt"), self.diphoton_pt)?;
        let widths = &self.widths;
        check_width(&format!("{key}.widths.electrons"), widths.electrons)?;
        check_width(&format!("{key}.widths.muons"), widths.muons)?;
        check_width(&format!("{key}.widths.fatjets_W"), widths.fatjets_w)?;
        check_width(&format!("{key}.widths.jets"), widths.jets)?;
        let categories_key = format!("{key}.categories");
        Cascade::new(self.categories.clone(), &categories_key)?
            .check_inputs(&INPUTS, &categories_key)
    }
}

/// Resolved/boosted W, crossed with low/high diphoton pt
fn default_categories() -> Vec<CategoryRule> {
    let one_lepton = || Requirement::eq(N_LEPTONS, 1);
    let boosted_w = || Requirement::at_least(N_FATJETS_W, 1);
    let resolved_w = || Requirement::at_least(N_JETS, 2);
    let high_pt = |is| Requirement::flag(DIPHOTON_HIGH_PT, is);
    vec![
        CategoryRule::new("p4", 4, vec![one_lepton(), boosted_w(), high_pt(false)]),
        CategoryRule::new("p3", 3, vec![one_lepton(), resolved_w(), high_pt(false)]),
        CategoryRule::new("p2", 2, vec![one_lepton(), resolved_w(), high_pt(true)]),
        CategoryRule::new("p1", 1, vec![one_lepton(), boosted_w(), high_pt(true)]),
    ]
}

/// Names under which selected leptons are registered
struct LeptonNames {
    electrons: String,
    muons: String,
    electron_fields: String,
    muon_fields: String,
}
//
impl LeptonNames {
    /// Leptons of the whole event table
    fn inclusive(prefix: &str) -> Self {
        Self {
            electrons: prefixed(prefix, "SelectedElectron_from_event"),
            muons: prefixed(prefix, "SelectedMuon_from_event"),
            electron_fields: prefixed(prefix, "electron"),
            muon_fields: prefixed(prefix, "muon"),
        }
    }

    /// Leptons of the events from one decay mode
    fn matched(prefix: &str, mode: DecayMode) -> Self {
        // Tau-matched collections are spelled in lower case downstream
        let (electrons, muons) = match mode {
            DecayMode::Electron => (
                "SelectedElectron_from_electron",
                "SelectedMuon_from_electron",
            ),
            DecayMode::Muon => ("SelectedElectron_from_muon", "SelectedMuon_from_muon"),
            DecayMode::Tau => ("Selectedelectron_from_tau", "Selectedmuon_from_tau"),
        };
        let label = mode.label();
        Self {
            electrons: prefixed(prefix, electrons),
            muons: prefixed(prefix, muons),
            electron_fields: prefixed(prefix, &format!("electron_from_gen{label}matched")),
            muon_fields: prefixed(prefix, &format!("muon_from_gen{label}matched")),
        }
    }
}

/// Tagger of the semileptonic channel
#[derive(Clone, Debug)]
pub struct SemileptonicTagger {
    options: SemileptonicOptions,
    cascade: Cascade,
    is_data: bool,
}
//
impl SemileptonicTagger {
    /// Set up the channel, failing on invalid configuration
    pub fn new(options: SemileptonicOptions, is_data: bool) -> Result<Self> {
        options.validate(KEY)?;
        let cascade = Cascade::new(options.categories.clone(), &format!("{KEY}.categories"))?;
        Ok(Self {
            options,
            cascade,
            is_data,
        })
    }

    /// Configuration in use
    pub fn options(&self) -> &SemileptonicOptions {
        &self.options
    }

    /// Select electrons and muons cleaned against the diphoton's photons
    fn select_leptons(
        &self,
        events: &mut EventTable,
        names: &LeptonNames,
        recorder: &mut dyn CutFlowRecorder,
    ) -> Result<(ObjectCollection, ObjectCollection)> {
        let options = &self.options;
        let photons = events.diphoton().photons();

        let electrons = {
            let raw = events.collection(ELECTRON)?;
            let clean = [CleaningRef::new(
                "photons",
                &photons,
                options.electrons.dr_photons,
            )];
            let mask =
                select_electrons(raw, &options.electrons, &clean, &names.electrons, recorder)?;
            raw.filter(&mask)
        };
        let electrons = register(events, &names.electrons, electrons)?;
        ranking::rank_and_pad(
            events,
            &names.electron_fields,
            &electrons,
            PT,
            options.widths.electrons,
        )?;

        let muons = {
            let raw = events.collection(MUON)?;
            let clean = [CleaningRef::new("photons", &photons, options.muons.dr_photons)];
            let mask = select_muons(raw, &options.muons, &clean, &names.muons, recorder)?;
            raw.filter(&mask)
        };
        let muons = register(events, &names.muons, muons)?;
        ranking::rank_and_pad(events, &names.muon_fields, &muons, PT, options.widths.muons)?;

        Ok((electrons, muons))
    }
}
//
impl Tagger for SemileptonicTagger {
    fn name(&self) -> &'static str {
        KEY
    }

    fn select(
        &self,
        mut events: EventTable,
        recorder: &mut dyn CutFlowRecorder,
    ) -> Result<TaggedEvents> {
        let options = &self.options;
        let prefix = options.field_prefix.as_str();
        check_sources(&events, &[ELECTRON, MUON, JET, FATJET])?;
        events.set_writer(KEY);

        // Truth partitioning sees the events as they were ingested
        let partition = truth::partition(&mut events, &options.gen_info, self.is_data)?;

        let (electrons, muons) =
            self.select_leptons(&mut events, &LeptonNames::inclusive(prefix), recorder)?;
        let photons = events.diphoton().photons();

        // Large-radius jets, then the W-tagged subset
        let fatjet_name = prefixed(prefix, "SelectedFatJet_from_event");
        let fatjets = {
            let raw = events.collection(FATJET)?;
            let o = &options.fatjets;
            let clean = [
                CleaningRef::new("photons", &photons, o.dr_photons),
                CleaningRef::new("electrons", &electrons, o.dr_electrons),
                CleaningRef::new("muons", &muons, o.dr_muons),
            ];
            raw.filter(&select_fatjets(raw, o, &clean, &fatjet_name, recorder)?)
        };
        let fatjets = register(&mut events, &fatjet_name, fatjets)?;

        let fatjet_w_name = prefixed(prefix, "SelectedFatJet_W_from_event");
        let w_mask = tag_fatjets(&fatjets, &options.fatjets_w, &fatjet_w_name, recorder)?;
        let fatjets_w = register(&mut events, &fatjet_w_name, fatjets.filter(&w_mask))?;
        ranking::rank_and_pad(
            &mut events,
            &prefixed(prefix, "fatjet_W"),
            &fatjets_w,
            &options.fatjets_w.discriminant.attribute,
            options.widths.fatjets_w,
        )?;

        // Small-radius jets, with their distance to each photon
        let jet_name = prefixed(prefix, "SelectedJet_from_event");
        let mut jets = {
            let raw = events.collection(JET)?;
            let o = &options.jets;
            let clean = [
                CleaningRef::new("photons", &photons, o.dr_photons),
                CleaningRef::new("electrons", &electrons, o.dr_electrons),
                CleaningRef::new("muons", &muons, o.dr_muons),
            ];
            raw.filter(&select_jets(raw, o, &clean, &jet_name, recorder)?)
        };
        let diphoton = events.diphoton();
        add_delta_r(&mut jets, "deltaR_pho1", &diphoton.lead.eta, &diphoton.lead.phi)?;
        add_delta_r(
            &mut jets,
            "deltaR_pho2",
            &diphoton.sublead.eta,
            &diphoton.sublead.phi,
        )?;
        let jets = register(&mut events, &jet_name, jets)?;
        ranking::rank_and_pad(
            &mut events,
            &prefixed(prefix, "jet"),
            &jets,
            PT,
            options.widths.jets,
        )?;

        // Leptons of each truth-matched subset
        let mut subsets = partition.subsets;
        for (&mode, subset) in subsets.iter_mut() {
            self.select_leptons(subset, &LeptonNames::matched(prefix, mode), recorder)?;
        }

        // Event-level quantities
        let num_events = events.num_events();
        let n_electrons = electrons.counts();
        let n_muons = muons.counts();
        let n_leptons = sum_counts(&n_electrons, &n_muons);
        let n_jets = jets.counts();
        let n_fatjets = fatjets.counts();
        let n_fatjets_w = fatjets_w.counts();
        add_count(&mut events, &prefixed(prefix, "nGoodAK4jets"), &n_jets)?;
        let photon_id = photon_id_mask(events.diphoton(), options.photon_id);
        let high_pt = events
            .diphoton()
            .pt
            .iter()
            .map(|&pt| pt > options.diphoton_pt)
            .collect::<Vec<_>>();

        let mut quantities = Quantities::new(num_events);
        quantities.insert_count(N_ELECTRONS, &n_electrons);
        quantities.insert_count(N_MUONS, &n_muons);
        quantities.insert_count(N_LEPTONS, &n_leptons);
        quantities.insert_count(N_JETS, &n_jets);
        quantities.insert_count(N_FATJETS, &n_fatjets);
        quantities.insert_count(N_FATJETS_W, &n_fatjets_w);
        quantities.insert_flag(DIPHOTON_HIGH_PT, &high_pt);
        quantities.insert_flag(PHOTON_ID, &photon_id);

        let categorization = self.cascade.evaluate(&quantities)?;
        events.add_field(
            &prefixed(prefix, "category"),
            Column::Int(categorization.category.clone()),
        )?;

        let mut gating = Gating::new(num_events);
        gating.require(&prefixed(prefix, PHOTON_ID_SELECTION), photon_id);
        gating.require(
            &prefixed(prefix, LEPTON_SELECTION),
            n_leptons.iter().map(|&n| n == 1).collect(),
        );
        gating.require(
            &prefixed(prefix, CATEGORY_SELECTION),
            categorization
                .category
                .iter()
                .map(|&c| c >= options.min_category)
                .collect(),
        );

        let degenerate = [
            ("leptons", &n_leptons),
            (jet_name.as_str(), &n_jets),
            (fatjet_w_name.as_str(), &n_fatjets_w),
        ]
        .into_iter()
        .filter_map(|(name, counts)| degenerate_events(name, counts))
        .collect();

        let tagged = TaggedEvents::new(
            events,
            categorization,
            gating,
            partition.counts,
            subsets,
            degenerate,
            recorder,
        );
        info!(
            channel = KEY,
            num_events,
            num_passed = tagged.num_passed(),
            "Selected events"
        );
        Ok(tagged)
    }
}
