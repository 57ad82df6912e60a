//! # Telecommand module
//!
//! This module provides telecommand functionality to the communications
//! interface. A telecommand is an instruction sent to the flight software by
//! the ground station (or replayed from a flight script).

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod flight_ctrl;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Serialize, Deserialize};
use serde_json;
use thiserror::Error;

// Internal
use flight_ctrl::{GainTune, Twist};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the vehicle by the ground
/// station.
///
/// TCs are serialised as JSON on the wire, with the variant name acting as
/// the command type identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Tc {
    /// Link-check command, no action is taken.
    Heartbeat,

    /// Set the target velocity (3 linear + 3 angular components).
    Velocity(Twist),

    /// Set the target position (3 linear components + 3 attitude angles).
    Position(Twist),

    /// Retune one of the flight controllers at runtime.
    GainTune(GainTune),

    /// Engage the motors.
    Engage,

    /// Shut the motors down.
    Shutdown
}

/// Response to a telecommand sent back to the ground station.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TcResponse {
    /// The TC was valid and has been handed to the software.
    Ok,

    /// The TC was valid but cannot be executed at this time.
    CannotExecute,

    /// The TC could not be parsed.
    Invalid
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {

    /// Parse a new TC from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        serde_json::from_str(json_str)
            .map_err(TcParseError::InvalidJson)
    }

    /// Serialise the TC into a JSON packet
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tc_json_round() {
        let tc = Tc::GainTune(GainTune {
            axis: 3,
            gain_p: 2.0,
            gain_d: 0.1,
            gain_i: 0.01,
            time_constant: 0.05
        });

        let json = tc.to_json().unwrap();
        let parsed = Tc::from_json(&json).unwrap();

        match parsed {
            Tc::GainTune(t) => {
                assert_eq!(t.axis, 3);
                assert_eq!(t.gain_p, 2.0);
            },
            _ => panic!("Wrong TC variant after parsing")
        }
    }

    #[test]
    fn test_tc_invalid_json() {
        assert!(Tc::from_json("{not valid json").is_err());
        assert!(Tc::from_json("{\"NoSuchTc\": 1}").is_err());
    }
}
