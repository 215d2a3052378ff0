//! Simulated adapters that run on virtual time.

pub mod clock;

pub use clock::SimulatedClock;
