//! Selection of small-radius jets

use super::object::Selection;
use crate::{
    cleaning::CleaningRef,
    config::{check_non_negative, check_positive},
    cutflow::CutFlowRecorder,
    error::Result,
    event::{ObjectCollection, ETA, PT},
    jagged::Mask,
    numeric::Float,
};
use serde::{Deserialize, Serialize};

/// Small-radius jet selection criteria
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JetOptions {
    /// Minimal transverse momentum (GeV)
    pub pt: Float,
    /// Maximal absolute pseudorapidity
    pub eta: Float,
    /// Require the loose jet identification (`jetId > 0`)
    #[serde(rename = "looseID")]
    pub loose_id: bool,
    /// Minimal ΔR to the diphoton candidate's photons
    pub dr_photons: Float,
    /// Minimal ΔR to selected electrons
    pub dr_electrons: Float,
    /// Minimal ΔR to selected muons
    pub dr_muons: Float,
}
//
impl Default for JetOptions {
    fn default() -> Self {
        Self {
            pt: 25.,
            eta: 2.4,
            loose_id: true,
            dr_photons: 0.4,
            dr_electrons: 0.4,
            dr_muons: 0.4,
        }
    }
}
//
impl JetOptions {
    /// Check that the criteria make sense
    pub fn validate(&self, key: &str) -> Result<()> {
        check_non_negative(&format!("{key}.pt"), self.pt)?;
        check_positive(&format!("{key}.eta"), self.eta)?;
        check_non_negative(&format!("{key}.dr_photons"), self.dr_photons)?;
        check_non_negative(&format!("{key}.dr_electrons"), self.dr_electrons)?;
        check_non_negative(&format!("{key}.dr_muons"), self.dr_muons)
    }
}

/// Select jets passing kinematic, identification and cleaning cuts
pub fn select_jets(
    jets: &ObjectCollection,
    options: &JetOptions,
    clean: &[CleaningRef],
    name: &str,
    recorder: &mut dyn CutFlowRecorder,
) -> Result<Mask> {
    let mut selection = Selection::new(jets, name)
        .above(PT, options.pt)?
        .abs_below(ETA, options.eta)?;
    if options.loose_id {
        selection = selection.above("jetId", 0.)?;
    }
    Ok(selection.clean(clean)?.finish(recorder))
}
