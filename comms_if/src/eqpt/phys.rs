//! # Physics host equipment messages
//!
//! The physics host (the simulation server) publishes the state of the
//! simulated vehicle body and accepts wrench demands to apply to it. The
//! interface is defined here as the server may not be written in rust.
//!
//! All vectors are `[x, y, z]` triples and all quaternions are `[w, x, y, z]`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// State of a rigid body as queried from the physics engine.
///
/// Published by the physics host every simulation step for each registered
/// link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigidBodyState {
    /// Name of the link this state belongs to.
    pub link_name: String,

    /// Position of the link origin in the world frame.
    ///
    /// Units: meters
    pub position_m: [f64; 3],

    /// Attitude of the body in the world frame.
    pub attitude_q: [f64; 4],

    /// Linear velocity in the world frame.
    ///
    /// Units: meters/second
    pub lin_vel_ms: [f64; 3],

    /// Angular velocity in the world frame.
    ///
    /// Units: radians/second
    pub ang_vel_rads: [f64; 3],

    /// Angular acceleration in the world frame.
    ///
    /// Units: radians/second^2
    pub ang_acc_radss: [f64; 3],

    /// Simulation time the state was sampled at.
    ///
    /// Units: seconds
    pub sim_time_s: f64
}

/// An odometry sample from an external state estimator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OdomSample {
    /// Position in the world frame.
    ///
    /// Units: meters
    pub position_m: [f64; 3],

    /// Attitude in the world frame.
    pub attitude_q: [f64; 4],

    /// Linear velocity in the world frame.
    ///
    /// Units: meters/second
    pub lin_vel_ms: [f64; 3],

    /// Angular velocity in the world frame.
    ///
    /// Units: radians/second
    pub ang_vel_rads: [f64; 3],

    /// Time the sample was taken at.
    ///
    /// Units: seconds
    pub timestamp_s: f64
}

/// An attitude sample from an IMU.
///
/// IMUs provide orientation and body-frame angular rates only, no position
/// or linear velocity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ImuSample {
    /// Attitude in the world frame.
    pub attitude_q: [f64; 4],

    /// Angular velocity in the body frame.
    ///
    /// Units: radians/second
    pub ang_vel_rads: [f64; 3]
}

/// Inertial properties of a rigid body.
///
/// Published by the physics host on request so that controllers can scale
/// their outputs by the body's mass and inertia.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyProps {
    /// Name of the link these properties belong to.
    pub link_name: String,

    /// Mass of the body.
    ///
    /// Units: kilograms
    pub mass_kg: f64,

    /// Principal moments of inertia about the body axes.
    ///
    /// Units: kilogram meters^2
    pub principal_inertia_kgm2: [f64; 3],

    /// Offset of the centre of gravity from the link origin.
    ///
    /// Units: meters,
    /// Frame: body
    pub cog_m: [f64; 3]
}

/// Wrench demand sent from the flight software to the physics host.
///
/// The force is applied at the link origin and the torque is applied as a
/// body-relative torque. The lever arm between the link origin and the
/// centre of gravity has already been corrected for by the sender.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WrenchDems {
    /// Force to apply to the body.
    ///
    /// Units: newtons
    pub force_n: [f64; 3],

    /// Relative torque to apply to the body.
    ///
    /// Units: newton meters,
    /// Frame: body
    pub torque_nm: [f64; 3]
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Data published by the physics host on its state feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PhysData {
    /// The current state of a rigid body.
    RigidBody(RigidBodyState),

    /// An odometry sample from the external state estimator.
    Odom(OdomSample),

    /// An attitude sample from the simulated IMU.
    Imu(ImuSample),

    /// The inertial properties of a link.
    BodyProps(BodyProps)
}

/// Response from the physics host to a wrench demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PhysDemsResponse {
    /// Demands were valid and will be applied
    DemsOk,

    /// Demands were invalid and have been rejected
    DemsInvalid,

    /// The demanded link is not registered so demands cannot be applied
    LinkInvalid
}
