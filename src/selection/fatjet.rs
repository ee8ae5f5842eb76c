//! Selection of large-radius jets

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
use serde::{Deserialize, Serialize};

/// Name of the W-boson versus QCD discriminant
pub const W_VS_QCD: &str = "deepTagMD_WvsQCD";

/// Name of the H→WW→4q/3q versus QCD discriminant
pub const HWW_VS_QCD: &str = "inclParTMDV1_HWW4q3qvsQCD";

/// Lower bound on a substructure discriminant
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiscriminantCut {
    /// Attribute holding the discriminant
    pub attribute: String,
    /// The discriminant must be strictly above this value
    pub min: Float,
}
//
impl DiscriminantCut {
    /// Require `attribute > min`
    pub fn new(attribute: &str, min: Float) -> Self {
        Self {
            attribute: attribute.to_owned(),
            min,
        }
    }
}

/// Large-radius jet selection criteria
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FatJetOptions {
    /// Minimal transverse momentum (GeV)
    pub pt: Float,
    /// Maximal absolute pseudorapidity
    pub eta: Float,
    /// Optional substructure requirement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminant: Option<DiscriminantCut>,
    /// Minimal ΔR to the diphoton candidate's photons
    pub dr_photons: Float,
    /// Minimal ΔR to selected electrons
    pub dr_electrons: Float,
    /// Minimal ΔR to selected muons
    pub dr_muons: Float,
}
//
impl Default for FatJetOptions {
    fn default() -> Self {
        Self {
            pt: 200.,
            eta: 2.4,
            discriminant: None,
            dr_photons: 0.8,
            dr_electrons: 0.8,
            dr_muons: 0.8,
        }
    }
}
//
impl FatJetOptions {
    /// Check that the criteria make sense
    pub fn validate(&self, key: &str) -> Result<()> {
        check_non_negative(&format!("{key}.pt"), self.pt)?;
        check_positive(&format!("{key}.eta"), self.eta)?;
        if let Some(cut) = &self.discriminant {
            check_finite(&format!("{key}.discriminant.min"), cut.min)?;
        }
        check_non_negative(&format!("{key}.dr_photons"), self.dr_photons)?;
        check_non_negative(&format!("{key}.dr_electrons"), self.dr_electrons)?;
        check_non_negative(&format!("{key}.dr_muons"), self.dr_muons)
    }
}

/// Select large-radius jets passing kinematic, substructure and cleaning cuts
pub fn select_fatjets(
    fatjets: &ObjectCollection,
    options: &FatJetOptions,
    clean: &[CleaningRef],
    name: &str,
    recorder: &mut dyn CutFlowRecorder,
) -> Result<Mask> {
    let mut selection = Selection::new(fatjets, name)
        .above(PT, options.pt)?
        .abs_below(ETA, options.eta)?;
    if let Some(cut) = &options.discriminant {
        selection = selection.above(&cut.attribute, cut.min)?;
    }
    Ok(selection.clean(clean)?.finish(recorder))
}

/// Tagging criteria applied on top of an existing large-radius jet selection
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FatJetTagOptions {
    /// Minimal transverse momentum (GeV)
    pub pt: Float,
    /// Substructure requirement
    pub discriminant: DiscriminantCut,
}
//
impl FatJetTagOptions {
    /// W-boson tagging working point
    pub fn w_tag() -> Self {
        Self {
            pt: 200.,
            discriminant: DiscriminantCut::new(W_VS_QCD, 0.4),
        }
    }

    /// Check that the criteria make sense
    pub fn validate(&self, key: &str) -> Result<()> {
        check_non_negative(&format!("{key}.pt"), self.pt)?;
        check_finite(&format!("{key}.discriminant.min"), self.discriminant.min)
    }
}

/// Tag already selected large-radius jets
pub fn tag_fatjets(
    fatjets: &ObjectCollection,
    options: &FatJetTagOptions,
    name: &str,
    recorder: &mut dyn CutFlowRecorder,
) -> Result<Mask> {
    Ok(Selection::new(fatjets, name)
        .above(PT, options.pt)?
        .above(&options.discriminant.attribute, options.discriminant.min)?
        .finish(recorder))
}
