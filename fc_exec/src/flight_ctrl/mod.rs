//! # Flight control module
//!
//! FlightCtrl converts velocity/position commands and the measured state of
//! the vehicle body into a force and torque to apply to that body, once per
//! control tick. The controller is a bank of twelve filtered PID controllers
//! evaluated as a cascade, with two selectable cascade policies (see
//! [`CascadePolicy`]).
//!
//! Commands arrive asynchronously through the [`CommandChannel`] and
//! are consumed once at the start of each tick. The controller is idle until
//! engaged, either by an explicit trigger or automatically when a climb is
//! commanded, and disengages on a shutdown trigger. While idle no wrench is
//! produced and a configurable subset of the controllers is held reset.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod bank;
mod calc_pos_cascade;
mod calc_rate_from_vel;
mod cmd;
pub mod frames;
mod params;
mod pid;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use bank::*;
pub use cmd::*;
pub use params::*;
pub use pid::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Commanded altitude above which the controller auto-engages from idle.
///
/// Units: meters
pub const AUTO_ENGAGE_ALT_THRESHOLD_M: f64 = 0.1;

/// Extra margin allowed on the vertical force component beyond `max_force_n`
/// under the position-cascade policy, so that gravity compensation is not
/// starved by the actuator bound.
///
/// Units: newtons
pub const VERT_FORCE_SAT_MARGIN_N: f64 = 10.0;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during FlightCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum FlightCtrlError {
    #[error(
        "Cannot run the control law, the body properties (mass/inertia) \
        have not been set"
    )]
    NoBodyProps
}
