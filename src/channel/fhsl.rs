//! Combined fully hadronic and boosted semileptonic channel
//!
//! Here both W bosons may decay hadronically. Events are categorized by the
//! number of isolated leptons, by the presence of a large-radius jet tagged as
//! the whole H→WW system, and by the number of resolved small-radius jets.

use super::{
    add_count, add_delta_r, check_sources, degenerate_events, photon_id_mask, prefixed,
    register, sum_counts, TaggedEvents, Tagger, N_ELECTRONS, N_FATJETS, N_FATJETS_H, N_JETS,
    N_LEPTONS, N_MUONS, PHOTON_ID, PHOTON_ID_SELECTION,
};
use crate::{
    cascade::{Cascade, CategoryRule, Gating, Quantities, Requirement},
    cleaning::CleaningRef,
    config::{check_finite, check_width},
    cutflow::CutFlowRecorder,
    error::Result,
    event::{Column, EventTable, ELECTRON, ETA, FATJET, JET, MUON, PHI, PT},
    numeric::{Float, DUMMY_VALUE},
    ranking,
    selection::{
        select_electrons, select_fatjets, select_jets, select_muons, DiscriminantCut,
        ElectronOptions, FatJetOptions, JetOptions, MuonOptions, HWW_VS_QCD,
    },
    truth::{self, GenInfo, NUM_W_QUARKS},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Configuration key of this channel
const KEY: &str = "fhsl";

/// Quantities which category rules may refer to
const INPUTS: [&str; 7] = [
    N_ELECTRONS,
    N_MUONS,
    N_LEPTONS,
    N_JETS,
    N_FATJETS,
    N_FATJETS_H,
    PHOTON_ID,
];

/// Number of exposed slots per collection
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FhslWidths {
    pub fatjets: usize,
    #[serde(rename = "fatjets_H")]
    pub fatjets_h: usize,
    pub jets: usize,
}
//
impl Default for FhslWidths {
    fn default() -> Self {
        Self {
            fatjets: 3,
            fatjets_h: 1,
            jets: 7,
        }
    }
}

/// Configuration of the FHSL channel
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FhslOptions {
    pub electrons: ElectronOptions,
    pub muons: MuonOptions,
    pub jets: JetOptions,
    pub fatjets: FatJetOptions,
    /// Large-radius jets compatible with a full H→WW decay
    #[serde(rename = "fatjets_H")]
    pub fatjets_h: FatJetOptions,
    /// Minimal identification score of both photons
    pub photon_id: Float,
    /// Category rules, in override order
    pub categories: Vec<CategoryRule>,
    pub widths: FhslWidths,
    pub gen_info: GenInfo,
    /// Prepended to every collection and field name which the channel adds
    pub field_prefix: String,
}
//
impl Default for FhslOptions {
    fn default() -> Self {
        Self {
            electrons: ElectronOptions::default(),
            muons: MuonOptions::default(),
            jets: JetOptions {
                pt: 20.,
                eta: 2.4,
                ..Default::default()
            },
            fatjets: FatJetOptions {
                discriminant: Some(DiscriminantCut::new(HWW_VS_QCD, DUMMY_VALUE)),
                ..Default::default()
            },
            fatjets_h: FatJetOptions {
                pt: 300.,
                discriminant: Some(DiscriminantCut::new(HWW_VS_QCD, 0.2)),
                ..Default::default()
            },
            photon_id: -0.9,
            categories: default_categories(),
            widths: FhslWidths::default(),
            gen_info: GenInfo::default(),
            field_prefix: String::new(),
        }
    }
}
//
impl FhslOptions {
    /// Check the configuration before any event is processed
    pub fn validate(&self, key: &str) -> Result<()> {
        self.electrons.validate(&format!("{key}.electrons"))?;
        self.muons.validate(&format!("{key}.muons"))?;
        self.jets.validate(&format!("{key}.jets"))?;
        self.fatjets.validate(&format!("{key}.fatjets"))?;
        self.fatjets_h.validate(&format!("{key}.fatjets_H"))?;
        check_finite(&format!("{key}.photon_id"), self.photon_id)?;
        check_width(&format!("{key}.widths.fatjets"), self.widths.fatjets)?;
        check_width(&format!("{key}.widths.fatjets_H"), self.widths.fatjets_h)?;
        check_width(&format!("{key}.widths.jets"), self.widths.jets)?;
        let categories_key = format!("{key}.categories");
        Cascade::new(self.categories.clone(), &categories_key)?
            .check_inputs(&INPUTS, &categories_key)
    }
}

/// The boosted rule comes last and wins when it overlaps with the resolved one
fn default_categories() -> Vec<CategoryRule> {
    let h_fatjet = || Requirement::at_least(N_FATJETS_H, 1);
    vec![
        CategoryRule::new(
            "SL_cat1",
            3,
            vec![Requirement::eq(N_LEPTONS, 1), h_fatjet()],
        ),
        CategoryRule::new(
            "FH_cat2",
            2,
            vec![Requirement::eq(N_LEPTONS, 0), Requirement::at_least(N_JETS, 4)],
        ),
        CategoryRule::new(
            "SL_FH_cat1",
            1,
            vec![Requirement::eq(N_LEPTONS, 0), h_fatjet()],
        ),
    ]
}

/// Tagger of the FHSL channel
#[derive(Clone, Debug)]
pub struct FhslTagger {
    options: FhslOptions,
    cascade: Cascade,
    is_data: bool,
}
//
impl FhslTagger {
    /// Set up the channel, failing on invalid configuration
    pub fn new(options: FhslOptions, is_data: bool) -> Result<Self> {
        options.validate(KEY)?;
        let cascade = Cascade::new(options.categories.clone(), &format!("{KEY}.categories"))?;
        Ok(Self {
            options,
            cascade,
            is_data,
        })
    }

    /// Configuration in use
    pub fn options(&self) -> &FhslOptions {
        &self.options
    }
}
//
impl Tagger for FhslTagger {
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

        // Generator-level quarks from the W decays, on signal only
        let quarks = if options.gen_info.enabled(self.is_data) {
            Some(truth::w_quarks(truth::check_schema(&events)?)?)
        } else {
            None
        };
        let photons = events.diphoton().photons();

        let electron_name = prefixed(prefix, "SelectedElectron");
        let electrons = {
            let raw = events.collection(ELECTRON)?;
            let o = &options.electrons;
            let clean = [CleaningRef::new("photons", &photons, o.dr_photons)];
            raw.filter(&select_electrons(raw, o, &clean, &electron_name, recorder)?)
        };
        let electrons = register(&mut events, &electron_name, electrons)?;

        let muon_name = prefixed(prefix, "SelectedMuon");
        let muons = {
            let raw = events.collection(MUON)?;
            let o = &options.muons;
            let clean = [CleaningRef::new("photons", &photons, o.dr_photons)];
            raw.filter(&select_muons(raw, o, &clean, &muon_name, recorder)?)
        };
        let muons = register(&mut events, &muon_name, muons)?;

        let jet_name = prefixed(prefix, "SelectedJet");
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
        if let Some(quarks) = &quarks {
            for rank in 0..NUM_W_QUARKS {
                let eta = ranking::padded_column(quarks, ETA, rank, DUMMY_VALUE)?;
                let phi = ranking::padded_column(quarks, PHI, rank, DUMMY_VALUE)?;
                add_delta_r(&mut jets, &format!("deltaR_q{}", rank + 1), &eta, &phi)?;
            }
        }
        let jets = register(&mut events, &jet_name, jets)?;
        ranking::rank_and_pad(
            &mut events,
            &prefixed(prefix, "jet"),
            &jets,
            PT,
            options.widths.jets,
        )?;

        // Both large-radius jet selections start from the raw collection
        let mut select_fatjets_as = |name: &str, o: &FatJetOptions| -> Result<_> {
            let raw = events.collection(FATJET)?;
            let clean = [
                CleaningRef::new("photons", &photons, o.dr_photons),
                CleaningRef::new("electrons", &electrons, o.dr_electrons),
                CleaningRef::new("muons", &muons, o.dr_muons),
            ];
            let selected = raw.filter(&select_fatjets(raw, o, &clean, name, recorder)?);
            register(&mut events, name, selected)
        };
        let fatjet_name = prefixed(prefix, "SelectedFatJet");
        let fatjets = select_fatjets_as(&fatjet_name, &options.fatjets)?;
        let fatjet_h_name = prefixed(prefix, "SelectedFatJet_H");
        let fatjets_h = select_fatjets_as(&fatjet_h_name, &options.fatjets_h)?;
        ranking::rank_and_pad(
            &mut events,
            &prefixed(prefix, "fatjet"),
            &fatjets,
            PT,
            options.widths.fatjets,
        )?;
        let h_score = options
            .fatjets_h
            .discriminant
            .as_ref()
            .map_or(PT, |cut| cut.attribute.as_str());
        ranking::rank_and_pad(
            &mut events,
            &prefixed(prefix, "fatjet_H"),
            &fatjets_h,
            h_score,
            options.widths.fatjets_h,
        )?;

        // Event-level quantities
        let num_events = events.num_events();
        let n_electrons = electrons.counts();
        let n_muons = muons.counts();
        let n_leptons = sum_counts(&n_electrons, &n_muons);
        let n_jets = jets.counts();
        let n_fatjets = fatjets.counts();
        let n_fatjets_h = fatjets_h.counts();
        add_count(&mut events, &prefixed(prefix, "nGoodAK4jets"), &n_jets)?;
        add_count(&mut events, &prefixed(prefix, "nGood_H_fatjets"), &n_fatjets_h)?;
        let photon_id = photon_id_mask(events.diphoton(), options.photon_id);

        let mut quantities = Quantities::new(num_events);
        quantities.insert_count(N_ELECTRONS, &n_electrons);
        quantities.insert_count(N_MUONS, &n_muons);
        quantities.insert_count(N_LEPTONS, &n_leptons);
        quantities.insert_count(N_JETS, &n_jets);
        quantities.insert_count(N_FATJETS, &n_fatjets);
        quantities.insert_count(N_FATJETS_H, &n_fatjets_h);
        quantities.insert_flag(PHOTON_ID, &photon_id);

        let categorization = self.cascade.evaluate(&quantities)?;
        events.add_field(
            &prefixed(prefix, "category"),
            Column::Int(categorization.category.clone()),
        )?;

        // Only the photon identification gates this channel
        let mut gating = Gating::new(num_events);
        gating.require(&prefixed(prefix, PHOTON_ID_SELECTION), photon_id);

        let degenerate = [
            ("leptons", &n_leptons),
            (jet_name.as_str(), &n_jets),
            (fatjet_h_name.as_str(), &n_fatjets_h),
        ]
        .into_iter()
        .filter_map(|(name, counts)| degenerate_events(name, counts))
        .collect();

        let tagged = TaggedEvents::new(
            events,
            categorization,
            gating,
            truth::PartitionCounts {
                unlabeled: num_events,
                ..Default::default()
            },
            BTreeMap::new(),
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
