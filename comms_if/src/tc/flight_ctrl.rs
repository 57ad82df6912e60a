//! # Flight control telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};
use structopt::StructOpt;

use super::Tc;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A six degree-of-freedom command or measurement.
///
/// Used both for velocity commands (linear velocity + angular rates) and for
/// position commands (position + attitude angles), as well as for velocity
/// telemetry.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize)]
pub struct Twist {
    /// Linear components.
    ///
    /// Units: meters or meters/second (world frame)
    pub linear: [f64; 3],

    /// Angular components.
    ///
    /// Units: radians or radians/second, ordered roll, pitch, yaw
    pub angular: [f64; 3]
}

/// A runtime retune request for a single flight controller.
///
/// The `axis` selector identifies the controller to retune. The numbering is
/// fixed for ground-segment compatibility:
///
/// | axis | controller | axis | controller |
/// |------|------------|------|------------|
/// | 1    | velocity-x | 7    | roll-rate  |
/// | 2    | position-x | 8    | roll       |
/// | 3    | velocity-y | 9    | pitch-rate |
/// | 4    | position-y | 10   | pitch      |
/// | 5    | velocity-z | 11   | yaw-rate   |
/// | 6    | position-z | 12   | yaw        |
///
/// Selectors outside 1..=12 are ignored by the vehicle.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, StructOpt)]
pub struct GainTune {
    /// The controller selector (1 to 12).
    pub axis: i32,

    /// New proportional gain.
    pub gain_p: f64,

    /// New derivative gain.
    pub gain_d: f64,

    /// New integral gain.
    pub gain_i: f64,

    /// New input filter time constant in seconds.
    pub time_constant: f64
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A flight command as entered on a ground console.
///
/// This is the command-line friendly (flat-argument) form of the flight
/// control TCs, converted into a [`Tc`] before being sent to the vehicle.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, StructOpt)]
pub enum FlightCmd {
    /// Command a target velocity.
    #[structopt(name = "vel")]
    Velocity {
        /// Linear velocity demand along world X in meters/second.
        vx: f64,

        /// Linear velocity demand along world Y in meters/second.
        vy: f64,

        /// Linear velocity demand along world Z in meters/second.
        vz: f64,

        /// Roll rate demand in radians/second.
        wx: f64,

        /// Pitch rate demand in radians/second.
        wy: f64,

        /// Yaw rate demand in radians/second.
        wz: f64
    },

    /// Command a target position and attitude.
    #[structopt(name = "pos")]
    Position {
        /// Position demand along world X in meters.
        x: f64,

        /// Position demand along world Y in meters.
        y: f64,

        /// Position demand along world Z (altitude) in meters.
        ///
        /// Commanding an altitude above the auto-engage threshold will start
        /// the motors if auto-engage is enabled on the vehicle.
        z: f64,

        /// Roll angle demand in radians.
        roll: f64,

        /// Pitch angle demand in radians.
        pitch: f64,

        /// Yaw angle demand in radians.
        yaw: f64
    },

    /// Retune one of the flight controllers.
    #[structopt(name = "tune")]
    GainTune(GainTune),

    /// Engage the motors.
    #[structopt(name = "engage")]
    Engage,

    /// Shut the motors down.
    #[structopt(name = "shutdown")]
    Shutdown
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl From<FlightCmd> for Tc {
    fn from(cmd: FlightCmd) -> Self {
        match cmd {
            FlightCmd::Velocity { vx, vy, vz, wx, wy, wz } => Tc::Velocity(Twist {
                linear: [vx, vy, vz],
                angular: [wx, wy, wz]
            }),
            FlightCmd::Position { x, y, z, roll, pitch, yaw } => Tc::Position(Twist {
                linear: [x, y, z],
                angular: [roll, pitch, yaw]
            }),
            FlightCmd::GainTune(tune) => Tc::GainTune(tune),
            FlightCmd::Engage => Tc::Engage,
            FlightCmd::Shutdown => Tc::Shutdown
        }
    }
}
