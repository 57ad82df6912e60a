//! # Frame transform helpers
//!
//! Stateless helpers for the coordinate frames relevant to control:
//!
//! - the world frame, in which commands, position and velocities live,
//! - the body frame, rotated by the full attitude quaternion,
//! - the heading frame, rotated by yaw only, which decouples horizontal
//!   translation control from roll and pitch.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Quaternion, UnitQuaternion, Vector3};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Gravity as seen from the vehicle body.
#[derive(Debug, Clone, Copy)]
pub struct GravityBody {
    /// The gravity vector rotated into the body frame.
    ///
    /// Units: meters/second^2
    pub vector: Vector3<f64>,

    /// The magnitude of gravity.
    ///
    /// Units: meters/second^2
    pub magnitude: f64,

    /// Ratio between the gravity magnitude and its projection along the
    /// body's vertical axis. This scales the hover thrust needed to
    /// counteract gravity as the vehicle tilts: 1.0 when level, growing with
    /// tilt.
    ///
    /// The ratio is undefined when the body's vertical axis is perpendicular
    /// to gravity (90 degrees of tilt), in which case the division yields an
    /// infinite or NaN value which is deliberately not masked here.
    pub load_factor: f64
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the quaternion rotating by the given yaw angle about the vertical
/// axis only.
pub fn heading_quaternion(yaw_rad: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_quaternion(Quaternion::new(
        (yaw_rad / 2.0).cos(),
        0.0,
        0.0,
        (yaw_rad / 2.0).sin()
    ))
}

/// Express a world-frame vector in the heading frame.
pub fn heading_frame_vector(
    heading_q: &UnitQuaternion<f64>,
    vector_w: &Vector3<f64>
) -> Vector3<f64> {
    heading_q.inverse_transform_vector(vector_w)
}

/// Express a world-frame vector in the body frame.
pub fn body_frame_vector(
    attitude_q: &UnitQuaternion<f64>,
    vector_w: &Vector3<f64>
) -> Vector3<f64> {
    attitude_q.inverse_transform_vector(vector_w)
}

/// Rotate a vector by the given attitude quaternion.
pub fn rotate_vector(
    attitude_q: &UnitQuaternion<f64>,
    vector: &Vector3<f64>
) -> Vector3<f64> {
    attitude_q.transform_vector(vector)
}

/// Project gravity into the body frame and compute the load factor.
pub fn gravity_in_body(
    attitude_q: &UnitQuaternion<f64>,
    gravity_w: &Vector3<f64>
) -> GravityBody {
    let vector = rotate_vector(attitude_q, gravity_w);
    let magnitude = vector.norm();

    GravityBody {
        vector,
        magnitude,
        load_factor: magnitude * magnitude / gravity_w.dot(&vector)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const GRAVITY: f64 = 9.81;

    fn gravity_w() -> Vector3<f64> {
        Vector3::new(0.0, 0.0, -GRAVITY)
    }

    #[test]
    fn test_heading_quaternion_rotates_about_vertical() {
        let q = heading_quaternion(FRAC_PI_2);

        // Rotating world X by +90 degrees of yaw gives world Y
        let rotated = rotate_vector(&q, &Vector3::x());
        assert!((rotated - Vector3::y()).norm() < 1e-12);

        // Expressing world X in the heading frame gives -Y
        let in_heading = heading_frame_vector(&q, &Vector3::x());
        assert!((in_heading - Vector3::new(0.0, -1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_body_frame_inverse_of_rotate() {
        let q = UnitQuaternion::from_euler_angles(0.3, -0.2, 1.1);
        let v = Vector3::new(1.0, -2.0, 0.5);

        let round = body_frame_vector(&q, &rotate_vector(&q, &v));
        assert!((round - v).norm() < 1e-12);
    }

    #[test]
    fn test_load_factor_level() {
        let level = UnitQuaternion::identity();
        let gravity = gravity_in_body(&level, &gravity_w());

        assert!((gravity.magnitude - GRAVITY).abs() < 1e-12);
        assert!((gravity.load_factor - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_load_factor_grows_with_tilt() {
        // At 60 degrees of roll the vertical projection halves, so twice the
        // hover thrust is needed
        let tilted = UnitQuaternion::from_euler_angles(60f64.to_radians(), 0.0, 0.0);
        let gravity = gravity_in_body(&tilted, &gravity_w());

        assert!((gravity.load_factor - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_load_factor_singular_at_ninety_degrees() {
        // With the body's vertical axis perpendicular to gravity the
        // projection denominator vanishes. The division is deliberately
        // unguarded, so the load factor blows up (to infinity when the
        // denominator underflows to exactly zero).
        let side = UnitQuaternion::from_euler_angles(FRAC_PI_2, 0.0, 0.0);
        let gravity = gravity_in_body(&side, &gravity_w());

        assert!(gravity.load_factor.abs() > 1e6 || !gravity.load_factor.is_finite());
    }
}
