//! Selection of electrons and muons

use super::object::Selection;
use crate::{
    cleaning::CleaningRef,
    config::{check_finite, check_non_negative, check_positive},
    cutflow::CutFlowRecorder,
    error::Result,
    event::{ObjectCollection, ETA, PT},
    jagged::Mask,
    numeric::Float,
};
use prefix_num_ops::real::*;
use serde::{Deserialize, Serialize};

/// Pseudorapidity range of the ECAL barrel/endcap transition region
const ECAL_CRACK: (Float, Float) = (1.4442, 1.566);

/// Electron identification working point
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElectronId {
    /// MVA isolation working point with 80% signal efficiency
    #[serde(rename = "WP80")]
    Wp80,
    /// MVA isolation working point with 90% signal efficiency
    #[serde(rename = "WP90")]
    Wp90,
    /// No identification requirement
    #[serde(rename = "none")]
    Disabled,
}

/// Electron selection criteria
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElectronOptions {
    /// Minimal transverse momentum (GeV)
    pub pt: Float,
    /// Maximal absolute pseudorapidity
    pub eta: Float,
    /// Maximal absolute transverse impact parameter (cm)
    pub dxy: Float,
    /// Maximal absolute longitudinal impact parameter (cm)
    pub dz: Float,
    /// Identification working point
    pub id: ElectronId,
    /// Reject electrons in the ECAL barrel/endcap transition region
    pub rm_ecal_crack: bool,
    /// Minimal ΔR to the diphoton candidate's photons
    pub dr_photons: Float,
}
//
impl Default for ElectronOptions {
    fn default() -> Self {
        Self {
            pt: 10.,
            eta: 2.5,
            dxy: 0.045,
            dz: 0.2,
            id: ElectronId::Wp90,
            rm_ecal_crack: true,
            dr_photons: 0.4,
        }
    }
}
//
impl ElectronOptions {
    /// Check that the criteria make sense
    pub fn validate(&self, key: &str) -> Result<()> {
        check_non_negative(&format!("{key}.pt"), self.pt)?;
        check_positive(&format!("{key}.eta"), self.eta)?;
        check_positive(&format!("{key}.dxy"), self.dxy)?;
        check_positive(&format!("{key}.dz"), self.dz)?;
        check_non_negative(&format!("{key}.dr_photons"), self.dr_photons)
    }
}

/// Select electrons passing kinematic, identification and cleaning cuts
pub fn select_electrons(
    electrons: &ObjectCollection,
    options: &ElectronOptions,
    clean: &[CleaningRef],
    name: &str,
    recorder: &mut dyn CutFlowRecorder,
) -> Result<Mask> {
    let mut selection = Selection::new(electrons, name)
        .above(PT, options.pt)?
        .abs_below(ETA, options.eta)?
        .abs_below("dxy", options.dxy)?
        .abs_below("dz", options.dz)?;
    selection = match options.id {
        ElectronId::Wp80 => selection.flag("mvaFall17V2Iso_WP80")?,
        ElectronId::Wp90 => selection.flag("mvaFall17V2Iso_WP90")?,
        ElectronId::Disabled => selection,
    };
    if options.rm_ecal_crack {
        let (low, high) = ECAL_CRACK;
        selection = selection.threshold("ecal_crack", ETA, |eta| {
            abs(eta) < low || abs(eta) > high
        })?;
    }
    Ok(selection.clean(clean)?.finish(recorder))
}

/// Muon identification working point
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MuonId {
    Loose,
    Medium,
    Tight,
    /// No identification requirement
    #[serde(rename = "none")]
    Disabled,
}

/// Muon selection criteria
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MuonOptions {
    /// Minimal transverse momentum (GeV)
    pub pt: Float,
    /// Maximal absolute pseudorapidity
    pub eta: Float,
    /// Maximal absolute transverse impact parameter (cm)
    pub dxy: Float,
    /// Maximal absolute longitudinal impact parameter (cm)
    pub dz: Float,
    /// Identification working point
    pub id: MuonId,
    /// Maximal relative PF isolation in a ΔR < 0.3 cone
    #[serde(rename = "pfRelIso03_all")]
    pub rel_iso: Float,
    /// Require global muons
    pub global: bool,
    /// Minimal ΔR to the diphoton candidate's photons
    pub dr_photons: Float,
}
//
impl Default for MuonOptions {
    fn default() -> Self {
        Self {
            pt: 10.,
            eta: 2.4,
            dxy: 0.02,
            dz: 0.04,
            id: MuonId::Medium,
            rel_iso: 0.3,
            global: true,
            dr_photons: 0.4,
        }
    }
}
//
impl MuonOptions {
    /// Check that the criteria make sense
    pub fn validate(&self, key: &str) -> Result<()> {
        check_non_negative(&format!("{key}.pt"), self.pt)?;
        check_positive(&format!("{key}.eta"), self.eta)?;
        check_positive(&format!("{key}.dxy"), self.dxy)?;
        check_positive(&format!("{key}.dz"), self.dz)?;
        check_finite(&format!("{key}.pfRelIso03_all"), self.rel_iso)?;
        check_non_negative(&format!("{key}.dr_photons"), self.dr_photons)
    }
}

/// Select muons passing kinematic, identification, isolation and cleaning cuts
pub fn select_muons(
    muons: &ObjectCollection,
    options: &MuonOptions,
    clean: &[CleaningRef],
    name: &str,
    recorder: &mut dyn CutFlowRecorder,
) -> Result<Mask> {
    let mut selection = Selection::new(muons, name)
        .above(PT, options.pt)?
        .abs_below(ETA, options.eta)?
        .abs_below("dxy", options.dxy)?
        .abs_below("dz", options.dz)?;
    selection = match options.id {
        MuonId::Loose => selection.flag("looseId")?,
        MuonId::Medium => selection.flag("mediumId")?,
        MuonId::Tight => selection.flag("tightId")?,
        MuonId::Disabled => selection,
    };
    selection = selection.below("pfRelIso03_all", options.rel_iso)?;
    if options.global {
        selection = selection.flag("isGlobal")?;
    }
    Ok(selection.clean(clean)?.finish(recorder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cutflow::{CutFlow, NoCutFlow},
        event::{
            DiphotonRecord, ElectronRecord, EventRecord, EventTable, Kinematics, MuonRecord,
            ELECTRON, MUON,
        },
    };

    fn electron(pt: Float, eta: Float, wp90: bool) -> ElectronRecord {
        ElectronRecord {
            p4: Kinematics {
                pt,
                eta,
                phi: 0.,
                mass: 0.,
            },
            dxy: 0.01,
            dz: 0.01,
            mva_wp80: false,
            mva_wp90: wp90,
        }
    }

    fn muon(pt: Float, rel_iso: Float) -> MuonRecord {
        MuonRecord {
            p4: Kinematics {
                pt,
                eta: 1.,
                phi: 2.,
                mass: 0.106,
            },
            dxy: 0.001,
            dz: 0.001,
            loose_id: true,
            medium_id: true,
            tight_id: false,
            rel_iso,
            is_global: true,
        }
    }

    fn table() -> EventTable {
        let mut diphoton = DiphotonRecord::default();
        diphoton.lead_photon.p4.phi = 2.;
        diphoton.sublead_photon.p4.eta = 1.;
        diphoton.sublead_photon.p4.phi = 2.;
        EventTable::from_records(&[EventRecord {
            event: 1,
            electrons: vec![
                electron(25., 0.5, true),
                electron(25., 1.5, true),
                electron(25., 0.5, false),
                electron(8., 0.5, true),
                electron(25., 2.6, true),
            ],
            muons: vec![muon(30., 0.1), muon(30., 0.5)],
            diphoton,
            ..Default::default()
        }])
    }

    #[test]
    fn electron_cuts() {
        let table = table();
        let electrons = table.collection(ELECTRON).unwrap();
        let mut flow = CutFlow::new();
        let mask = select_electrons(
            electrons,
            &ElectronOptions::default(),
            &[],
            "SelectedElectron",
            &mut flow,
        )
        .unwrap();
        assert_eq!(mask.values(), &[true, false, false, false, false]);
        assert_eq!(flow.get("SelectedElectron_ecal_crack").unwrap().num_passed, 4);
        assert_eq!(
            flow.get("SelectedElectron_mvaFall17V2Iso_WP90").unwrap().num_passed,
            4
        );

        let loose = ElectronOptions {
            id: ElectronId::Disabled,
            rm_ecal_crack: false,
            ..Default::default()
        };
        let mask = select_electrons(electrons, &loose, &[], "E", &mut NoCutFlow).unwrap();
        assert_eq!(mask.values(), &[true, true, true, false, false]);
    }

    #[test]
    fn muon_isolation_and_cleaning() {
        let table = table();
        let muons = table.collection(MUON).unwrap();
        let photons = table.diphoton().photons();
        let options = MuonOptions::default();
        let mask = select_muons(muons, &options, &[], "SelectedMuon", &mut NoCutFlow).unwrap();
        assert_eq!(mask.values(), &[true, false]);

        // The subleading photon sits right on top of the muons
        let clean = [CleaningRef::new("photons", &photons, options.dr_photons)];
        let mask = select_muons(muons, &options, &clean, "SelectedMuon", &mut NoCutFlow).unwrap();
        assert_eq!(mask.values(), &[false, false]);
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: MuonOptions = toml::from_str(
            r#"
            pt = 5.0
            eta = 2.5
            dxy = 0.02
            dz = 0.04
            id = "tight"
            pfRelIso03_all = 0.15
            global = false
            dr_photons = 0.3
            "#,
        )
        .unwrap();
        assert_eq!(options.id, MuonId::Tight);
        assert_eq!(options.rel_iso, 0.15);
        assert!(options.validate("muons").is_ok());

        let bad = MuonOptions {
            eta: 0.,
            ..Default::default()
        };
        assert!(bad.validate("muons").is_err());
    }
}
