//! Random number generation module, used by the toy event generator

mod standard;

pub use self::standard::RandGenerator as RandomGenerator;
