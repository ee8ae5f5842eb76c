//! Cross-collection cleaning based on angular separation
//!
//! An object is "clean" with respect to a reference collection if it lies at
//! least a minimal ΔR away from every reference object of the same event.

use crate::{
    error::Result,
    event::{ObjectCollection, ETA, PHI},
    jagged::Mask,
    kinematics::delta_r,
    numeric::Float,
};

/// Reference collection that candidates must be separated from
#[derive(Clone, Copy, Debug)]
pub struct CleaningRef<'a> {
    /// Label of the reference, used to name the corresponding cut
    pub label: &'a str,

    /// Reference objects
    pub objects: &'a ObjectCollection,

    /// Minimal angular separation to any reference object
    pub min_dr: Float,
}
//
impl<'a> CleaningRef<'a> {
    /// Set up a cleaning reference
    pub fn new(label: &'a str, objects: &'a ObjectCollection, min_dr: Float) -> Self {
        Self {
            label,
            objects,
            min_dr,
        }
    }
}

/// Decide, for every candidate, whether it is clean against a reference
///
/// A candidate passes iff its ΔR to every reference object of the same event
/// is at least `min_dr`. Events without reference objects keep all their
/// candidates, and events without candidates produce no decision at all.
///
pub fn clean(candidates: &ObjectCollection, reference: CleaningRef) -> Result<Mask> {
    assert_eq!(
        candidates.num_events(),
        reference.objects.num_events(),
        "Cleaning operands must cover the same events"
    );
    let cand_eta = candidates.attribute(ETA)?;
    let cand_phi = candidates.attribute(PHI)?;
    let ref_eta = reference.objects.attribute(ETA)?;
    let ref_phi = reference.objects.attribute(PHI)?;

    let mut decisions = Vec::with_capacity(cand_eta.len());
    for (cand_range, ref_range) in candidates
        .offsets()
        .ranges()
        .zip(reference.objects.offsets().ranges())
    {
        for c in cand_range {
            let isolated = ref_range.clone().all(|r| {
                delta_r(cand_eta[c], cand_phi[c], ref_eta[r], ref_phi[r]) >= reference.min_dr
            });
            decisions.push(isolated);
        }
    }
    Ok(Mask::new(candidates.offsets().clone(), decisions))
}

/// Clean candidates against several references at once (logical AND)
pub fn clean_all(candidates: &ObjectCollection, references: &[CleaningRef]) -> Result<Mask> {
    let mut mask = Mask::full(candidates.offsets(), true);
    for &reference in references {
        mask.and_assign(&clean(candidates, reference)?);
    }
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{event::PT, jagged::Offsets};
    use proptest::prelude::*;

    fn collection(name: &str, events: &[&[(Float, Float)]]) -> ObjectCollection {
        let offsets = Offsets::from_counts(events.iter().map(|e| e.len()));
        let flat = events.iter().flat_map(|e| e.iter().copied());
        let (eta, phi): (Vec<_>, Vec<_>) = flat.unzip();
        let pt = vec![10.; eta.len()];
        ObjectCollection::new(name, offsets)
            .with(PT, pt)
            .with(ETA, eta)
            .with(PHI, phi)
    }

    #[test]
    fn overlapping_objects_are_removed() {
        let jets = collection("Jet", &[&[(0., 0.), (1., 1.)], &[(0., 3.1)]]);
        let photons = collection("Photon", &[&[(0.1, 0.1)], &[(0., -3.1)]]);
        let mask = clean(&jets, CleaningRef::new("photons", &photons, 0.4)).unwrap();
        // The second event's objects are close across the phi = ±π boundary
        assert_eq!(mask.values(), &[false, true, false]);
    }

    #[test]
    fn separation_exactly_at_threshold_passes() {
        let jets = collection("Jet", &[&[(0.5, 0.)]]);
        let photons = collection("Photon", &[&[(0., 0.)]]);
        let mask = clean(&jets, CleaningRef::new("photons", &photons, 0.5)).unwrap();
        assert_eq!(mask.values(), &[true]);
    }

    #[test]
    fn empty_operands() {
        let jets = collection("Jet", &[&[], &[(0., 0.)]]);
        let photons = collection("Photon", &[&[(0., 0.)], &[]]);
        let mask = clean(&jets, CleaningRef::new("photons", &photons, 0.4)).unwrap();
        assert_eq!(mask.counts(), vec![0, 1]);
        assert_eq!(mask.values(), &[true]);
    }

    #[test]
    fn several_references_combine() {
        let jets = collection("Jet", &[&[(0., 0.), (1., 0.), (2., 0.)]]);
        let electrons = collection("Electron", &[&[(0., 0.)]]);
        let muons = collection("Muon", &[&[(2., 0.)]]);
        let mask = clean_all(
            &jets,
            &[
                CleaningRef::new("electrons", &electrons, 0.4),
                CleaningRef::new("muons", &muons, 0.4),
            ],
        )
        .unwrap();
        assert_eq!(mask.values(), &[false, true, false]);
    }

    fn object_list() -> impl Strategy<Value = Vec<(Float, Float)>> {
        prop::collection::vec((-2.5 as Float..2.5, -3.14 as Float..3.14), 0..6)
    }

    proptest! {
        #[test]
        fn empty_reference_keeps_everything(
            events in prop::collection::vec(object_list(), 0..8)
        ) {
            let nested: Vec<&[(Float, Float)]> = events.iter().map(Vec::as_slice).collect();
            let candidates = collection("Jet", &nested);
            let nothing: Vec<&[(Float, Float)]> = vec![&[]; events.len()];
            let empty = collection("Photon", &nothing);
            let mask = clean(&candidates, CleaningRef::new("empty", &empty, 0.4)).unwrap();
            prop_assert_eq!(mask.counts(), candidates.counts());
            prop_assert!(mask.values().iter().all(|&keep| keep));
        }

        #[test]
        fn extra_references_only_remove(
            events in prop::collection::vec((object_list(), object_list()), 0..8)
        ) {
            let nested: Vec<&[(Float, Float)]> =
                events.iter().map(|e| e.0.as_slice()).collect();
            let ref_nested: Vec<&[(Float, Float)]> =
                events.iter().map(|e| e.1.as_slice()).collect();
            let candidates = collection("Jet", &nested);
            let reference = collection("Photon", &ref_nested);
            let by_reference = CleaningRef::new("reference", &reference, 0.4);
            let one = clean_all(&candidates, &[by_reference]).unwrap();
            let two = clean_all(
                &candidates,
                &[by_reference, CleaningRef::new("candidates", &candidates, 0.1)],
            )
            .unwrap();
            for (&a, &b) in one.values().iter().zip(two.values()) {
                prop_assert!(a || !b);
            }
        }
    }
}
