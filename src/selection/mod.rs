//! Per-object-type selection predicates
//!
//! Each selector computes one combined per-object mask: the kinematic and
//! identification thresholds of its object type, AND the outcome of cleaning
//! against every requested reference collection. Selectors never modify the
//! collection they are given. Applying the mask and registering the filtered
//! collection under a new name is left to the caller.

mod fatjet;
mod jet;
mod lepton;
mod object;

pub use self::{
    fatjet::{
        select_fatjets, tag_fatjets, DiscriminantCut, FatJetOptions, FatJetTagOptions,
        HWW_VS_QCD, W_VS_QCD,
    },
    jet::{select_jets, JetOptions},
    lepton::{select_electrons, select_muons, ElectronId, ElectronOptions, MuonId, MuonOptions},
    object::Selection,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cleaning::CleaningRef,
        cutflow::NoCutFlow,
        error::Result,
        event::{EventTable, ObjectCollection, ELECTRON, FATJET, JET, MUON},
        evgen::EventGenerator,
        jagged::Mask,
        numeric::Float,
    };
    use proptest::prelude::*;

    /// Selecting among the selected objects must keep every one of them
    fn check_idempotent(
        objects: &ObjectCollection,
        select: impl Fn(&ObjectCollection) -> Result<Mask>,
    ) -> std::result::Result<(), TestCaseError> {
        let selected = objects.filter(&select(objects).unwrap());
        let again = select(&selected).unwrap();
        prop_assert_eq!(again.counts(), selected.counts());
        prop_assert!(again.values().iter().all(|&keep| keep));
        prop_assert_eq!(&selected.filter(&again), &selected);
        Ok(())
    }

    fn electron_id() -> impl Strategy<Value = ElectronId> {
        prop_oneof![
            Just(ElectronId::Wp80),
            Just(ElectronId::Wp90),
            Just(ElectronId::Disabled)
        ]
    }

    fn muon_id() -> impl Strategy<Value = MuonId> {
        prop_oneof![
            Just(MuonId::Loose),
            Just(MuonId::Medium),
            Just(MuonId::Tight),
            Just(MuonId::Disabled)
        ]
    }

    proptest! {
        #[test]
        fn selecting_twice_changes_nothing(
            seed in any::<u64>(),
            num_events in 0usize..30,
            pt in (0.0 as Float)..80.0,
            min_dr in (0.0 as Float)..1.0,
            electron_id in electron_id(),
            muon_id in muon_id(),
            rm_ecal_crack in any::<bool>(),
        ) {
            let records = EventGenerator::new(seed).generate(num_events);
            let table = EventTable::from_records(&records);
            let photons = table.diphoton().photons();
            let clean = [CleaningRef::new("photons", &photons, min_dr)];

            let electrons = ElectronOptions {
                pt,
                id: electron_id,
                rm_ecal_crack,
                ..Default::default()
            };
            check_idempotent(table.collection(ELECTRON).unwrap(), |objects| {
                select_electrons(objects, &electrons, &clean, "E", &mut NoCutFlow)
            })?;

            let muons = MuonOptions {
                pt,
                id: muon_id,
                ..Default::default()
            };
            check_idempotent(table.collection(MUON).unwrap(), |objects| {
                select_muons(objects, &muons, &clean, "M", &mut NoCutFlow)
            })?;

            let jets = JetOptions {
                pt,
                ..Default::default()
            };
            check_idempotent(table.collection(JET).unwrap(), |objects| {
                select_jets(objects, &jets, &clean, "J", &mut NoCutFlow)
            })?;

            let fatjets = FatJetOptions {
                pt: 4. * pt,
                discriminant: Some(DiscriminantCut::new(HWW_VS_QCD, 0.2)),
                ..Default::default()
            };
            check_idempotent(table.collection(FATJET).unwrap(), |objects| {
                select_fatjets(objects, &fatjets, &clean, "F", &mut NoCutFlow)
            })?;
            check_idempotent(table.collection(FATJET).unwrap(), |objects| {
                tag_fatjets(objects, &FatJetTagOptions::w_tag(), "W", &mut NoCutFlow)
            })?;
        }
    }
}
