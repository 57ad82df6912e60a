//! # Vehicle state module
//!
//! This module caches the latest known rigid-body state of the vehicle and
//! implements the measurement-source policy. Three sources exist, in
//! priority order:
//!
//! 1. an external odometry feed (pose, velocities, stamped for acceleration
//!    estimation),
//! 2. an external IMU feed (orientation and angular velocity only),
//! 3. the internally queried physics state.
//!
//! A quantity is only ever taken from one source within a tick: enabling a
//! feed disables the corresponding physics-state fallback for the quantities
//! that feed provides.
//!
//! Linear acceleration is not measured directly by any source and is instead
//! estimated by finite differencing consecutive velocity samples.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Quaternion, UnitQuaternion, Vector3};

// Internal
use comms_if::eqpt::phys::{ImuSample, OdomSample, RigidBodyState};
use crate::flight_ctrl::frames;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Selects which external feeds override the internally queried physics
/// state.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceConfig {
    /// The odometry feed provides pose, velocities and the acceleration
    /// estimate.
    pub use_odom: bool,

    /// The IMU feed provides orientation and angular velocity, taking
    /// precedence over the odometry feed for those quantities.
    pub use_imu: bool
}

/// The latest known state of the vehicle body.
#[derive(Debug, Clone)]
pub struct VehicleState {
    /// Position of the body in the world frame.
    ///
    /// Units: meters
    pub position_m: Vector3<f64>,

    /// Attitude of the body in the world frame.
    pub attitude_q: UnitQuaternion<f64>,

    /// Euler angles (roll, pitch, yaw) of the attitude.
    ///
    /// Units: radians
    pub euler_rad: Vector3<f64>,

    /// Linear velocity in the world frame.
    ///
    /// Units: meters/second
    pub lin_vel_ms: Vector3<f64>,

    /// Angular velocity in the world frame.
    ///
    /// Units: radians/second
    pub ang_vel_rads: Vector3<f64>,

    /// Angular acceleration in the world frame.
    ///
    /// Units: radians/second^2
    pub ang_acc_radss: Vector3<f64>,

    /// Linear acceleration estimate in the world frame.
    ///
    /// Zero until two velocity samples separated by a positive time
    /// interval have been seen.
    ///
    /// Units: meters/second^2
    pub lin_acc_mss: Vector3<f64>,

    /// Timestamp of the last odometry sample used for the acceleration
    /// estimate.
    last_odom_stamp_s: Option<f64>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for VehicleState {
    fn default() -> Self {
        Self {
            position_m: Vector3::zeros(),
            attitude_q: UnitQuaternion::identity(),
            euler_rad: Vector3::zeros(),
            lin_vel_ms: Vector3::zeros(),
            ang_vel_rads: Vector3::zeros(),
            ang_acc_radss: Vector3::zeros(),
            lin_acc_mss: Vector3::zeros(),
            last_odom_stamp_s: None
        }
    }
}

impl VehicleState {

    /// Refresh the state from whatever sources are configured and have new
    /// data this tick.
    ///
    /// `dt` is the control interval, used for the finite-difference
    /// acceleration estimate when no odometry feed is configured. Must be
    /// positive (guaranteed by the caller's rate decimation).
    pub fn refresh(
        &mut self,
        imu: Option<&ImuSample>,
        odom: Option<&OdomSample>,
        body: Option<&RigidBodyState>,
        dt: f64,
        config: SourceConfig
    ) {
        if config.use_imu {
            if let Some(sample) = imu {
                self.update_from_imu(sample);
            }
        }

        if config.use_odom {
            if let Some(sample) = odom {
                self.update_from_odom(sample, config);
            }
        }

        if let Some(state) = body {
            self.update_from_body(state, dt, config);
        }
    }

    /// Apply an IMU sample: orientation and angular velocity only.
    fn update_from_imu(&mut self, sample: &ImuSample) {
        self.attitude_q = quaternion_from_wire(&sample.attitude_q);
        self.euler_rad = euler_vector(&self.attitude_q);

        // The IMU reports body-frame rates, rotate them into the world frame
        self.ang_vel_rads = frames::rotate_vector(
            &self.attitude_q,
            &Vector3::from(sample.ang_vel_rads)
        );
    }

    /// Apply an odometry sample.
    ///
    /// Pose and angular velocity are only taken when no IMU feed is
    /// configured. Linear velocity always comes from the sample, and the
    /// acceleration estimate is finite-differenced over the sample
    /// timestamps.
    fn update_from_odom(&mut self, sample: &OdomSample, config: SourceConfig) {
        let prev_vel = self.lin_vel_ms;

        if !config.use_imu {
            self.attitude_q = quaternion_from_wire(&sample.attitude_q);
            self.euler_rad = euler_vector(&self.attitude_q);
            self.ang_vel_rads = Vector3::from(sample.ang_vel_rads);
        }

        self.position_m = Vector3::from(sample.position_m);
        self.lin_vel_ms = Vector3::from(sample.lin_vel_ms);

        // Finite-difference acceleration over the sample timestamps. Until
        // two stamped samples exist the acceleration is zero.
        let sample_dt = match self.last_odom_stamp_s {
            Some(last) => sample.timestamp_s - last,
            None => 0.0
        };
        self.last_odom_stamp_s = Some(sample.timestamp_s);

        if sample_dt > 0.0 {
            self.lin_acc_mss = (self.lin_vel_ms - prev_vel) / sample_dt;
        }
        else {
            self.lin_acc_mss = Vector3::zeros();
        }
    }

    /// Apply the internally queried physics state, skipping the quantities
    /// provided by a configured feed.
    fn update_from_body(
        &mut self,
        state: &RigidBodyState,
        dt: f64,
        config: SourceConfig
    ) {
        if !config.use_imu && !config.use_odom {
            self.attitude_q = quaternion_from_wire(&state.attitude_q);
            self.euler_rad = euler_vector(&self.attitude_q);
            self.ang_vel_rads = Vector3::from(state.ang_vel_rads);
        }

        if !config.use_odom {
            self.position_m = Vector3::from(state.position_m);

            let new_vel = Vector3::from(state.lin_vel_ms);

            if dt > 0.0 {
                self.lin_acc_mss = (new_vel - self.lin_vel_ms) / dt;
            }

            self.lin_vel_ms = new_vel;
        }

        // The physics query is the only source measuring angular
        // acceleration
        self.ang_acc_radss = Vector3::from(state.ang_acc_radss);
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Build a unit quaternion from a `[w, x, y, z]` wire quaternion.
fn quaternion_from_wire(q: &[f64; 4]) -> UnitQuaternion<f64> {
    UnitQuaternion::from_quaternion(Quaternion::new(q[0], q[1], q[2], q[3]))
}

/// Get the (roll, pitch, yaw) euler angles of an attitude as a vector.
fn euler_vector(attitude_q: &UnitQuaternion<f64>) -> Vector3<f64> {
    let (roll, pitch, yaw) = attitude_q.euler_angles();
    Vector3::new(roll, pitch, yaw)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn body_state(vel: [f64; 3], time: f64) -> RigidBodyState {
        RigidBodyState {
            link_name: "base_link".into(),
            position_m: [0.0; 3],
            attitude_q: [1.0, 0.0, 0.0, 0.0],
            lin_vel_ms: vel,
            ang_vel_rads: [0.0; 3],
            ang_acc_radss: [0.0; 3],
            sim_time_s: time
        }
    }

    fn odom_sample(vel: [f64; 3], stamp: f64) -> OdomSample {
        OdomSample {
            position_m: [1.0, 2.0, 3.0],
            attitude_q: [1.0, 0.0, 0.0, 0.0],
            lin_vel_ms: vel,
            ang_vel_rads: [0.0; 3],
            timestamp_s: stamp
        }
    }

    #[test]
    fn test_body_query_finite_difference() {
        let mut state = VehicleState::default();
        let config = SourceConfig::default();

        state.refresh(None, None, Some(&body_state([0.0; 3], 0.0)), 0.1, config);
        state.refresh(None, None, Some(&body_state([1.0, 0.0, 0.0], 0.1)), 0.1, config);

        assert!((state.lin_acc_mss.x - 10.0).abs() < 1e-12);
        assert!((state.lin_vel_ms.x - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_odom_acceleration_needs_two_samples() {
        let mut state = VehicleState::default();
        let config = SourceConfig { use_odom: true, use_imu: false };

        // One sample gives velocity but no acceleration
        state.refresh(None, Some(&odom_sample([2.0, 0.0, 0.0], 1.0)), None, 0.1, config);
        assert_eq!(state.lin_acc_mss, Vector3::zeros());
        assert!((state.lin_vel_ms.x - 2.0).abs() < 1e-12);

        // A second stamped sample enables the estimate
        state.refresh(None, Some(&odom_sample([3.0, 0.0, 0.0], 1.5)), None, 0.1, config);
        assert!((state.lin_acc_mss.x - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_odom_overrides_body_velocity() {
        let mut state = VehicleState::default();
        let config = SourceConfig { use_odom: true, use_imu: false };

        state.refresh(
            None,
            Some(&odom_sample([5.0, 0.0, 0.0], 1.0)),
            Some(&body_state([9.0, 0.0, 0.0], 1.0)),
            0.1,
            config
        );

        // Velocity comes from the odometry feed, not the physics query
        assert!((state.lin_vel_ms.x - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_imu_overrides_attitude_only() {
        let mut state = VehicleState::default();
        let config = SourceConfig { use_odom: false, use_imu: true };

        // IMU reporting a 90 degree yaw
        let half = std::f64::consts::FRAC_PI_4;
        let imu = ImuSample {
            attitude_q: [half.cos(), 0.0, 0.0, half.sin()],
            ang_vel_rads: [0.0; 3]
        };

        state.refresh(
            Some(&imu),
            None,
            Some(&body_state([1.0, 0.0, 0.0], 0.5)),
            0.1,
            config
        );

        // Attitude from the IMU
        assert!((state.euler_rad.z - std::f64::consts::FRAC_PI_2).abs() < 1e-9);

        // Linear velocity still from the physics query
        assert!((state.lin_vel_ms.x - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_imu_rates_rotated_to_world() {
        let mut state = VehicleState::default();
        let config = SourceConfig { use_odom: false, use_imu: true };

        // Body rolled 90 degrees about X, IMU measures a body-frame yaw rate
        let half = std::f64::consts::FRAC_PI_4;
        let imu = ImuSample {
            attitude_q: [half.cos(), half.sin(), 0.0, 0.0],
            ang_vel_rads: [0.0, 0.0, 1.0]
        };

        state.refresh(Some(&imu), None, None, 0.1, config);

        // The body Z rate appears about the world -Y axis
        assert!((state.ang_vel_rads.y - (-1.0)).abs() < 1e-9);
        assert!(state.ang_vel_rads.z.abs() < 1e-9);
    }
}
