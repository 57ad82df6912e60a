//! # Controller bank
//!
//! The bank holds the twelve single-axis controllers making up the cascade,
//! addressed by the [`CtrlAxis`] enum. Retune requests coming over the wire
//! carry a numeric selector which maps onto exactly one axis, the numbering
//! is fixed for ground-segment compatibility (see
//! `comms_if::tc::flight_ctrl::GainTune`).

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use serde::{Deserialize, Serialize};

// Internal
use super::params::Params;
use super::pid::FilteredPid;
use comms_if::tc::flight_ctrl::GainTune;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Identifies one of the twelve flight controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CtrlAxis {
    VelocityX,
    PositionX,
    VelocityY,
    PositionY,
    VelocityZ,
    PositionZ,
    RollRate,
    Roll,
    PitchRate,
    Pitch,
    YawRate,
    Yaw
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The bank of twelve flight controllers.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ControllerBank {
    pub velocity_x: FilteredPid,
    pub velocity_y: FilteredPid,
    pub velocity_z: FilteredPid,
    pub position_x: FilteredPid,
    pub position_y: FilteredPid,
    pub position_z: FilteredPid,
    pub roll_rate: FilteredPid,
    pub pitch_rate: FilteredPid,
    pub yaw_rate: FilteredPid,
    pub roll: FilteredPid,
    pub pitch: FilteredPid,
    pub yaw: FilteredPid
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CtrlAxis {

    /// All twelve axes.
    pub const ALL: [CtrlAxis; 12] = [
        CtrlAxis::VelocityX,
        CtrlAxis::PositionX,
        CtrlAxis::VelocityY,
        CtrlAxis::PositionY,
        CtrlAxis::VelocityZ,
        CtrlAxis::PositionZ,
        CtrlAxis::RollRate,
        CtrlAxis::Roll,
        CtrlAxis::PitchRate,
        CtrlAxis::Pitch,
        CtrlAxis::YawRate,
        CtrlAxis::Yaw
    ];

    /// Map a wire selector onto an axis.
    ///
    /// Selectors outside 1..=12 map to `None`.
    pub fn from_selector(selector: i32) -> Option<Self> {
        match selector {
            1 => Some(CtrlAxis::VelocityX),
            2 => Some(CtrlAxis::PositionX),
            3 => Some(CtrlAxis::VelocityY),
            4 => Some(CtrlAxis::PositionY),
            5 => Some(CtrlAxis::VelocityZ),
            6 => Some(CtrlAxis::PositionZ),
            7 => Some(CtrlAxis::RollRate),
            8 => Some(CtrlAxis::Roll),
            9 => Some(CtrlAxis::PitchRate),
            10 => Some(CtrlAxis::Pitch),
            11 => Some(CtrlAxis::YawRate),
            12 => Some(CtrlAxis::Yaw),
            _ => None
        }
    }

    /// Get the wire selector for this axis.
    pub fn selector(&self) -> i32 {
        match self {
            CtrlAxis::VelocityX => 1,
            CtrlAxis::PositionX => 2,
            CtrlAxis::VelocityY => 3,
            CtrlAxis::PositionY => 4,
            CtrlAxis::VelocityZ => 5,
            CtrlAxis::PositionZ => 6,
            CtrlAxis::RollRate => 7,
            CtrlAxis::Roll => 8,
            CtrlAxis::PitchRate => 9,
            CtrlAxis::Pitch => 10,
            CtrlAxis::YawRate => 11,
            CtrlAxis::Yaw => 12
        }
    }
}

impl ControllerBank {

    /// Create a new bank with each controller configured from the parameters.
    pub fn from_params(params: &Params) -> Self {
        Self {
            velocity_x: FilteredPid::new(params.velocity_x),
            velocity_y: FilteredPid::new(params.velocity_y),
            velocity_z: FilteredPid::new(params.velocity_z),
            position_x: FilteredPid::new(params.position_x),
            position_y: FilteredPid::new(params.position_y),
            position_z: FilteredPid::new(params.position_z),
            roll_rate: FilteredPid::new(params.roll_rate),
            pitch_rate: FilteredPid::new(params.pitch_rate),
            yaw_rate: FilteredPid::new(params.yaw_rate),
            roll: FilteredPid::new(params.roll),
            pitch: FilteredPid::new(params.pitch),
            yaw: FilteredPid::new(params.yaw)
        }
    }

    /// Get a reference to the controller for the given axis.
    pub fn get(&self, axis: CtrlAxis) -> &FilteredPid {
        match axis {
            CtrlAxis::VelocityX => &self.velocity_x,
            CtrlAxis::VelocityY => &self.velocity_y,
            CtrlAxis::VelocityZ => &self.velocity_z,
            CtrlAxis::PositionX => &self.position_x,
            CtrlAxis::PositionY => &self.position_y,
            CtrlAxis::PositionZ => &self.position_z,
            CtrlAxis::RollRate => &self.roll_rate,
            CtrlAxis::PitchRate => &self.pitch_rate,
            CtrlAxis::YawRate => &self.yaw_rate,
            CtrlAxis::Roll => &self.roll,
            CtrlAxis::Pitch => &self.pitch,
            CtrlAxis::Yaw => &self.yaw
        }
    }

    /// Get a mutable reference to the controller for the given axis.
    pub fn get_mut(&mut self, axis: CtrlAxis) -> &mut FilteredPid {
        match axis {
            CtrlAxis::VelocityX => &mut self.velocity_x,
            CtrlAxis::VelocityY => &mut self.velocity_y,
            CtrlAxis::VelocityZ => &mut self.velocity_z,
            CtrlAxis::PositionX => &mut self.position_x,
            CtrlAxis::PositionY => &mut self.position_y,
            CtrlAxis::PositionZ => &mut self.position_z,
            CtrlAxis::RollRate => &mut self.roll_rate,
            CtrlAxis::PitchRate => &mut self.pitch_rate,
            CtrlAxis::YawRate => &mut self.yaw_rate,
            CtrlAxis::Roll => &mut self.roll,
            CtrlAxis::Pitch => &mut self.pitch,
            CtrlAxis::Yaw => &mut self.yaw
        }
    }

    /// Apply a retune request to the bank.
    ///
    /// Exactly the selected controller has its gains replaced. Requests with
    /// a selector outside the valid range are ignored and `false` is
    /// returned.
    pub fn apply_tune(&mut self, tune: &GainTune) -> bool {
        match CtrlAxis::from_selector(tune.axis) {
            Some(axis) => {
                debug!(
                    "Retuning {:?}: p = {}, d = {}, i = {}, time constant = {}",
                    axis, tune.gain_p, tune.gain_d, tune.gain_i, tune.time_constant
                );

                self.get_mut(axis).update_gains(
                    tune.gain_p,
                    tune.gain_d,
                    tune.gain_i,
                    tune.time_constant
                );
                true
            },
            None => {
                warn!(
                    "Retune request for unknown controller selector {}, ignored",
                    tune.axis
                );
                false
            }
        }
    }

    /// Reset the runtime state of the given axes.
    pub fn reset_axes(&mut self, axes: &[CtrlAxis]) {
        for axis in axes {
            self.get_mut(*axis).reset();
        }
    }

    /// Reset the runtime state of all twelve controllers.
    pub fn reset_all(&mut self) {
        self.reset_axes(&CtrlAxis::ALL);
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_selector_mapping_total_and_disjoint() {
        // Every axis maps to its selector and back
        for axis in CtrlAxis::ALL.iter() {
            assert_eq!(CtrlAxis::from_selector(axis.selector()), Some(*axis));
        }

        // Out of range selectors map to nothing
        assert_eq!(CtrlAxis::from_selector(0), None);
        assert_eq!(CtrlAxis::from_selector(13), None);
        assert_eq!(CtrlAxis::from_selector(-1), None);
    }

    #[test]
    fn test_tune_updates_exactly_one_controller() {
        let params = Params::default();
        let mut bank = ControllerBank::from_params(&params);
        let reference = ControllerBank::from_params(&params);

        // Selector 3 is velocity-y
        let applied = bank.apply_tune(&GainTune {
            axis: 3,
            gain_p: 2.0,
            gain_d: 0.1,
            gain_i: 0.01,
            time_constant: 0.05
        });
        assert!(applied);

        let tuned = bank.velocity_y.config();
        assert_eq!(tuned.gain_p, 2.0);
        assert_eq!(tuned.gain_d, 0.1);
        assert_eq!(tuned.gain_i, 0.01);
        assert_eq!(tuned.time_constant, 0.05);

        // The other eleven controllers are untouched
        for axis in CtrlAxis::ALL.iter() {
            if *axis == CtrlAxis::VelocityY {
                continue;
            }
            assert_eq!(
                bank.get(*axis).config(),
                reference.get(*axis).config(),
                "controller {:?} was modified by an unrelated tune",
                axis
            );
        }
    }

    #[test]
    fn test_tune_out_of_range_ignored() {
        let params = Params::default();
        let mut bank = ControllerBank::from_params(&params);
        let reference = ControllerBank::from_params(&params);

        let applied = bank.apply_tune(&GainTune {
            axis: 42,
            gain_p: 9.0,
            gain_d: 9.0,
            gain_i: 9.0,
            time_constant: 9.0
        });
        assert!(!applied);

        for axis in CtrlAxis::ALL.iter() {
            assert_eq!(bank.get(*axis).config(), reference.get(*axis).config());
        }
    }
}
