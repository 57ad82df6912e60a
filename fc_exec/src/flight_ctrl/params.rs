//! Parameters structure for FlightCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::bank::CtrlAxis;
use super::pid::PidConfig;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The cascade strategy evaluated while the controller is running.
///
/// Exactly one policy is active for a deployment, selected here at
/// configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadePolicy {
    /// Horizontal velocity error produces a tilt-angle demand, tilt PIDs
    /// produce torque, the vertical velocity PID produces thrust.
    RateFromVelocity,

    /// Full position cascade: position PIDs produce velocity demands,
    /// velocity PIDs produce force, attitude PIDs produce rate demands, rate
    /// PIDs produce torque.
    PositionCascade
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for flight control.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {

    // ---- CONTROL LOOP ----

    /// Target interval between executions of the control law. The control
    /// law runs on the first cycle on which at least this much (sim) time
    /// has elapsed since its last execution. Zero runs the law every cycle.
    ///
    /// Units: seconds
    pub control_period_s: f64,

    /// The cascade policy to evaluate while running.
    pub policy: CascadePolicy,

    /// If true the controller engages automatically from idle when the
    /// commanded altitude exceeds the engage threshold.
    pub auto_engage: bool,

    // ---- CAPABILITIES ----

    /// Maximum force the actuators can produce along any axis. Values of
    /// zero or below mean unbounded.
    ///
    /// Units: newtons
    pub max_force_n: f64,

    /// Maximum torque the actuators can produce about any axis. Values of
    /// zero or below mean unbounded.
    ///
    /// Units: newton meters
    pub max_torque_nm: f64,

    // ---- ENVIRONMENT ----

    /// The world gravity vector.
    ///
    /// Units: meters/second^2,
    /// Frame: world
    pub gravity_mss: [f64; 3],

    // ---- MEASUREMENT SOURCES ----

    /// If true an external odometry feed overrides the internally queried
    /// physics state for pose, velocities and acceleration.
    pub use_odom_feed: bool,

    /// If true an external IMU feed overrides orientation and angular
    /// velocity. Takes precedence over the odometry feed for those
    /// quantities.
    pub use_imu_feed: bool,

    // ---- RESET BEHAVIOUR ----

    /// The controllers whose runtime state is cleared on every idle cycle.
    ///
    /// Historically only the attitude, rate and velocity controllers are
    /// cleared while the position controllers keep their integrators across
    /// disengagement. The set is a parameter so that deployments can opt
    /// into a full reset instead.
    pub idle_reset_axes: Vec<CtrlAxis>,

    // ---- CONTROLLER GAINS ----

    pub velocity_x: PidConfig,
    pub velocity_y: PidConfig,
    pub velocity_z: PidConfig,
    pub position_x: PidConfig,
    pub position_y: PidConfig,
    pub position_z: PidConfig,
    pub roll_rate: PidConfig,
    pub pitch_rate: PidConfig,
    pub yaw_rate: PidConfig,
    pub roll: PidConfig,
    pub pitch: PidConfig,
    pub yaw: PidConfig
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            control_period_s: 0.0,
            policy: CascadePolicy::RateFromVelocity,
            auto_engage: true,
            max_force_n: -1.0,
            max_torque_nm: -1.0,
            gravity_mss: [0.0, 0.0, -9.81],
            use_odom_feed: false,
            use_imu_feed: false,
            idle_reset_axes: Self::default_idle_reset_axes(),
            velocity_x: PidConfig::default(),
            velocity_y: PidConfig::default(),
            velocity_z: PidConfig::default(),
            position_x: PidConfig::default(),
            position_y: PidConfig::default(),
            position_z: PidConfig::default(),
            roll_rate: PidConfig::default(),
            pitch_rate: PidConfig::default(),
            yaw_rate: PidConfig::default(),
            roll: PidConfig::default(),
            pitch: PidConfig::default(),
            yaw: PidConfig::default()
        }
    }
}

impl Params {
    /// The historical idle-reset set: attitude, rate and velocity
    /// controllers, position controllers untouched.
    pub fn default_idle_reset_axes() -> Vec<CtrlAxis> {
        vec![
            CtrlAxis::Roll,
            CtrlAxis::Pitch,
            CtrlAxis::Yaw,
            CtrlAxis::RollRate,
            CtrlAxis::PitchRate,
            CtrlAxis::YawRate,
            CtrlAxis::VelocityX,
            CtrlAxis::VelocityY,
            CtrlAxis::VelocityZ
        ]
    }
}
