//! Generic object selection: threshold cuts combined with cleaning
//!
//! Lower bounds are strict (`x > min`) and upper bounds are strict
//! (`|x| < max`) for every object type. Each individual cut is reported to the
//! cut-flow recorder as `<selection name>_<cut name>`.

use crate::{
    cleaning::{self, CleaningRef},
    cutflow::CutFlowRecorder,
    error::Result,
    event::ObjectCollection,
    jagged::{Mask, Offsets},
    numeric::Float,
};
use prefix_num_ops::real::*;

/// Builder of the combined selection mask of one object collection
pub struct Selection<'a> {
    /// Objects being selected
    objects: &'a ObjectCollection,

    /// Name of the selection, used as prefix of the cut names
    name: &'a str,

    /// Individual cuts, in the order they were applied
    cuts: Vec<(String, Mask)>,
}
//
impl<'a> Selection<'a> {
    /// Start selecting objects from a collection
    pub fn new(objects: &'a ObjectCollection, name: &'a str) -> Self {
        Self {
            objects,
            name,
            cuts: Vec::new(),
        }
    }

    /// Require `attribute > min`
    pub fn above(self, attribute: &str, min: Float) -> Result<Self> {
        self.threshold(attribute, attribute, |x| x > min)
    }

    /// Require `attribute < max`
    pub fn below(self, attribute: &str, max: Float) -> Result<Self> {
        self.threshold(attribute, attribute, |x| x < max)
    }

    /// Require `|attribute| < max`
    pub fn abs_below(self, attribute: &str, max: Float) -> Result<Self> {
        self.threshold(attribute, attribute, |x| abs(x) < max)
    }

    /// Require a boolean identifier to be set
    pub fn flag(self, attribute: &str) -> Result<Self> {
        self.threshold(attribute, attribute, |x| x != 0.)
    }

    /// Apply an arbitrary per-value test to an attribute, under a custom name
    pub fn threshold(
        mut self,
        cut_name: &str,
        attribute: &str,
        keep: impl Fn(Float) -> bool,
    ) -> Result<Self> {
        let mask = self.objects.jagged(attribute)?.map(|&x| keep(x));
        self.cuts.push((cut_name.to_owned(), mask));
        Ok(self)
    }

    /// Require the objects to be clean with respect to reference collections
    pub fn clean(mut self, references: &[CleaningRef]) -> Result<Self> {
        for &reference in references {
            let mask = cleaning::clean(self.objects, reference)?;
            self.cuts.push((format!("dr_{}", reference.label), mask));
        }
        Ok(self)
    }

    /// Combine all cuts, reporting each of them to the recorder
    pub fn finish(self, recorder: &mut dyn CutFlowRecorder) -> Mask {
        let offsets: &Offsets = self.objects.offsets();
        let mut combined = Mask::full(offsets, true);
        for (cut_name, mask) in &self.cuts {
            recorder.record(&format!("{}_{}", self.name, cut_name), mask.values());
            combined.and_assign(mask);
        }
        recorder.record(&format!("{}_all", self.name), combined.values());
        combined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cutflow::CutFlow,
        event::{ETA, PHI, PT},
    };

    fn jets() -> ObjectCollection {
        ObjectCollection::new("Jet", Offsets::from_counts([3, 0, 1]))
            .with(PT, vec![30., 20., 25., 40.])
            .with(ETA, vec![0., 2.4, -2.5, 1.])
            .with(PHI, vec![0., 1., 2., 3.])
    }

    #[test]
    fn bounds_are_strict() {
        let jets = jets();
        let mut flow = CutFlow::new();
        let mask = Selection::new(&jets, "SelectedJet")
            .above(PT, 25.)
            .unwrap()
            .abs_below(ETA, 2.4)
            .unwrap()
            .finish(&mut flow);
        assert_eq!(mask.values(), &[true, false, false, true]);
        assert_eq!(mask.counts(), jets.counts());

        let pt_tally = flow.get("SelectedJet_pt").unwrap();
        assert_eq!((pt_tally.num_tested, pt_tally.num_passed), (4, 2));
        let eta_tally = flow.get("SelectedJet_eta").unwrap();
        assert_eq!(eta_tally.num_passed, 2);
        assert_eq!(flow.get("SelectedJet_all").unwrap().num_passed, 2);
    }

    #[test]
    fn no_cut_keeps_everything() {
        let jets = jets();
        let mut flow = CutFlow::new();
        let mask = Selection::new(&jets, "AllJets").finish(&mut flow);
        assert!(mask.values().iter().all(|&keep| keep));
    }

    #[test]
    fn missing_attribute_is_an_error() {
        let jets = jets();
        assert!(Selection::new(&jets, "SelectedJet").flag("jetId").is_err());
    }

    #[test]
    fn cleaning_cuts_are_named_after_their_reference() {
        let jets = jets();
        let photons = ObjectCollection::new("Photon", Offsets::from_counts([1, 0, 0]))
            .with(ETA, vec![0.])
            .with(PHI, vec![0.]);
        let mut flow = CutFlow::new();
        let mask = Selection::new(&jets, "SelectedJet")
            .clean(&[CleaningRef::new("photons", &photons, 0.4)])
            .unwrap()
            .finish(&mut flow);
        assert_eq!(mask.values(), &[false, true, true, true]);
        assert_eq!(flow.get("SelectedJet_dr_photons").unwrap().num_passed, 3);
    }
}
