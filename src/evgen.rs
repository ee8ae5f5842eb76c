//! This module provides toy event generation facilities
//!
//! Generated events are not meant to be physically accurate. They only need to
//! exercise every branch of the selection: empty and crowded collections,
//! objects which fail each kind of cut, photons which fail identification,
//! and (optionally) a generator record with the W decay chain of HH→WWγγ.

use crate::{
    event::{
        DiphotonRecord, ElectronRecord, EventRecord, FatJetRecord, GenParticleRecord,
        JetRecord, Kinematics, MuonRecord, PhotonRecord,
    },
    numeric::{reals::consts::PI, Float},
    random::RandomGenerator,
};
use prefix_num_ops::real::*;

/// Largest generated |η|
const MAX_ETA: Float = 3.;

/// PDG id of the W⁺ boson
const W_PLUS: i32 = 24;

/// Generator of toy HH→WWγγ-like events
pub struct EventGenerator {
    /// Source of randomness
    rng: RandomGenerator,

    /// Whether generator-level particles should be produced
    with_truth: bool,

    /// Identifier of the next event
    next_event: u64,
}
//
impl EventGenerator {
    // ### CONSTRUCTION ###

    /// Set up a generator with a given seed, without generator-level record
    pub fn new(seed: u64) -> Self {
        Self {
            rng: RandomGenerator::with_seed(seed),
            with_truth: false,
            next_event: 0,
        }
    }

    /// Also produce the generator-level particle record
    pub fn with_truth(mut self, with_truth: bool) -> Self {
        self.with_truth = with_truth;
        self
    }

    // ### EVENT GENERATION ###

    /// Generate a number of events
    pub fn generate(&mut self, num_events: usize) -> Vec<EventRecord> {
        (0..num_events).map(|_| self.generate_event()).collect()
    }

    /// Generate one event
    pub fn generate_event(&mut self) -> EventRecord {
        let event = self.next_event;
        self.next_event += 1;

        let num_electrons = self.rng.count(2);
        let num_muons = self.rng.count(2);
        let num_jets = self.rng.count(8);
        let num_fatjets = self.rng.count(3);
        let num_photons = 2 + self.rng.count(1);
        EventRecord {
            event,
            electrons: (0..num_electrons).map(|_| self.electron()).collect(),
            muons: (0..num_muons).map(|_| self.muon()).collect(),
            jets: (0..num_jets).map(|_| self.jet()).collect(),
            fatjets: (0..num_fatjets).map(|_| self.fatjet()).collect(),
            photons: (0..num_photons).map(|_| self.photon(20.)).collect(),
            diphoton: self.diphoton(),
            gen_particles: self.with_truth.then(|| self.gen_particles()),
        }
    }

    /// Momentum with exponentially falling pt above `min_pt`
    fn kinematics(&mut self, min_pt: Float, pt_scale: Float, mass: Float) -> Kinematics {
        // 1 - random() lies in (0, 1], so its logarithm is finite
        let pt = min_pt - pt_scale * ln(1. - self.rng.random());
        Kinematics {
            pt,
            eta: self.rng.uniform(-MAX_ETA, MAX_ETA),
            phi: self.rng.uniform(-PI, PI),
            mass,
        }
    }

    fn electron(&mut self) -> ElectronRecord {
        let mva_wp80 = self.rng.chance(0.7);
        ElectronRecord {
            p4: self.kinematics(5., 20., 0.000511),
            dxy: self.rng.uniform(-0.06, 0.06),
            dz: self.rng.uniform(-0.25, 0.25),
            mva_wp80,
            mva_wp90: mva_wp80 || self.rng.chance(0.5),
        }
    }

    fn muon(&mut self) -> MuonRecord {
        let tight_id = self.rng.chance(0.6);
        let medium_id = tight_id || self.rng.chance(0.5);
        MuonRecord {
            p4: self.kinematics(5., 20., 0.106),
            dxy: self.rng.uniform(-0.03, 0.03),
            dz: self.rng.uniform(-0.05, 0.05),
            loose_id: medium_id || self.rng.chance(0.5),
            medium_id,
            tight_id,
            rel_iso: -0.2 * ln(1. - self.rng.random()),
            is_global: self.rng.chance(0.9),
        }
    }

    fn jet(&mut self) -> JetRecord {
        JetRecord {
            p4: self.kinematics(15., 40., 10.),
            jet_id: if self.rng.chance(0.95) { 6 } else { 0 },
            btag: self.rng.random(),
        }
    }

    fn fatjet(&mut self) -> FatJetRecord {
        FatJetRecord {
            p4: self.kinematics(150., 150., 80.),
            w_vs_qcd: self.rng.random(),
            hww_vs_qcd: self.rng.random(),
        }
    }

    fn photon(&mut self, min_pt: Float) -> PhotonRecord {
        PhotonRecord {
            p4: self.kinematics(min_pt, 30., 0.),
            mva_id: self.rng.uniform(-1., 1.),
        }
    }

    /// Diphoton candidate, whose momentum is the sum of its photons'
    fn diphoton(&mut self) -> DiphotonRecord {
        let mut lead_photon = self.photon(35.);
        let mut sublead_photon = self.photon(25.);
        if sublead_photon.p4.pt > lead_photon.p4.pt {
            std::mem::swap(&mut lead_photon, &mut sublead_photon);
        }
        let (lead, sublead) = (&lead_photon.p4, &sublead_photon.p4);
        let px = lead.pt * cos(lead.phi) + sublead.pt * cos(sublead.phi);
        let py = lead.pt * sin(lead.phi) + sublead.pt * sin(sublead.phi);
        let pt = sqrt(px * px + py * py);
        let p4 = Kinematics {
            pt,
            eta: (lead.eta + sublead.eta) / 2.,
            phi: py.atan2(px),
            mass: self.rng.uniform(100., 180.),
        };
        DiphotonRecord {
            p4,
            lead_photon,
            sublead_photon,
        }
    }

    /// W⁺W⁻ pair, then the W decay products pointing to their mother
    ///
    /// The W⁻ always decays into quarks, the W⁺ into a charged lepton and a
    /// neutrino most of the time, and into quarks otherwise.
    ///
    fn gen_particles(&mut self) -> Vec<GenParticleRecord> {
        let mut particles = vec![
            self.gen_particle(W_PLUS, -1, 80.4),
            self.gen_particle(-W_PLUS, -1, 80.4),
        ];
        let (w_plus, w_minus) = (0, 1);
        if self.rng.chance(0.75) {
            let lepton = [-11, -13, -15][self.rng.count(2)];
            particles.push(self.gen_particle(lepton, w_plus, 0.));
            particles.push(self.gen_particle(1 - lepton, w_plus, 0.));
        } else {
            particles.push(self.gen_particle(2, w_plus, 0.));
            particles.push(self.gen_particle(-1, w_plus, 0.));
        }
        particles.push(self.gen_particle(1, w_minus, 0.));
        particles.push(self.gen_particle(-2, w_minus, 0.));
        particles
    }

    fn gen_particle(&mut self, pdg_id: i32, mother: i32, mass: Float) -> GenParticleRecord {
        GenParticleRecord {
            p4: self.kinematics(10., 50., mass),
            pdg_id,
            mother,
        }
    }
}
