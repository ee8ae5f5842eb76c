//! hhww_select: event selection and categorization for HH → WWγγ searches
//!
//!
//! # Introduction (for the physicist)
//!
//! This library selects and categorizes collision events in searches for
//! Higgs boson pair production, where one Higgs boson decays into two photons
//! and the other into two W bosons (HH → WWγγ).
//!
//! Every event comes with one diphoton candidate. On top of it, the library
//! selects isolated electrons and muons, small-radius jets and large-radius
//! jets, removes objects which overlap with each other in (η, φ) space, and
//! assigns each event to an analysis category depending on how the W bosons
//! decayed and on how boosted they are. Two final states are supported: the
//! semileptonic one (one W → ℓν, one W → qq) and a combined fully hadronic /
//! boosted semileptonic one.
//!
//! On simulated signal, the generator-level record is also used to tell which
//! lepton flavour the W decayed into, and where the quarks from W decays went.
//!
//!
//! # Introduction (for the numerical guy)
//!
//! Nothing fancy here: the computations are comparisons, counts and ΔR
//! distances. The only numerical subtlety is that ΔR must wrap azimuthal
//! differences around ±π, and that the ordering of objects must be stable so
//! that results are reproducible.
//!
//!
//! # Introduction (for the computer guy)
//!
//! Events are stored column-wise, as jagged arrays of per-object attributes
//! with one offset table per collection. A selection proceeds in stages:
//!
//! * check that the input collections carry the attributes that will be read
//! * optionally partition the events by generator-level decay mode
//! * select each object type, cleaning it against the previously selected ones
//! * rank the selected objects and expose the leading ones as flat fields
//! * evaluate the category cascade and the event-level gates
//!
//! Each stage adds named collections and fields to the event table, which is
//! passed by value from one stage to the next. Event chunks are independent,
//! so they can be processed in parallel and reassembled in order.

#![warn(missing_docs)]

pub mod cascade;
pub mod channel;
pub mod cleaning;
pub mod config;
pub mod cutflow;
pub mod error;
pub mod event;
pub mod evgen;
pub mod jagged;
pub mod kinematics;
pub mod numeric;
pub mod output;
pub mod random;
pub mod ranking;
pub mod scheduling;
pub mod selection;
pub mod truth;

pub use crate::{
    channel::{Channel, TaggedEvents, Tagger},
    config::Configuration,
    error::{Result, SelectionError},
    event::EventTable,
    scheduling::{run_selection, SelectionOutput},
};
