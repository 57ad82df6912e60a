//! # Equipment interface module
//!
//! Defines the messages exchanged with equipment external to the flight
//! software, currently only the physics/simulation host.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod phys;

// ------------------------------------------------------------------------------------------------
// REEXPORTS
// ------------------------------------------------------------------------------------------------

pub use phys::*;
