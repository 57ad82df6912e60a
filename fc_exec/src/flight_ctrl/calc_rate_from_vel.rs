//! Rate-from-velocity cascade policy
//!
//! Horizontal velocity errors, expressed in the heading frame, are turned
//! into tilt-angle demands for the attitude controllers, whose outputs become
//! torque after inertia scaling. Yaw is rate-controlled directly from the
//! commanded yaw rate. The vertical velocity controller produces thrust with
//! gravity compensation scaled by the load factor, bounded above by the
//! actuator limit and floored at zero as the rotors cannot push downwards.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector3;

// Internal
use super::state::{FlightCtrl, TickData};
use super::FlightCtrlError;
use comms_if::tc::flight_ctrl::Twist;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FlightCtrl {

    /// Evaluate the rate-from-velocity cascade for one tick.
    ///
    /// Returns the force, the torque, and the effective velocity demands
    /// (the operator's velocity command, which this policy consumes
    /// directly).
    pub(super) fn calc_rate_from_velocity(
        &mut self,
        tick: &TickData
    ) -> Result<(Vector3<f64>, Vector3<f64>, Twist), FlightCtrlError> {

        let body = self.body_params()?;
        let dt = tick.dt;
        let g = tick.gravity.magnitude;

        let mut force = Vector3::zeros();
        let mut torque = Vector3::zeros();

        // Horizontal velocity errors produce tilt demands. Dividing by
        // gravity converts the acceleration demand into a small-angle tilt.
        let pitch_dem = self.bank.velocity_x.update(
            self.velocity_command.linear[0],
            tick.velocity_hf.x,
            tick.accel_hf.x,
            dt
        ) / g;

        let roll_dem = -self.bank.velocity_y.update(
            self.velocity_command.linear[1],
            tick.velocity_hf.y,
            tick.accel_hf.y,
            dt
        ) / g;

        // Tilt demands through the attitude controllers, scaled by the
        // principal inertia
        torque.x = body.inertia_kgm2.x * self.bank.roll.update(
            roll_dem,
            self.vehicle.euler_rad.x,
            tick.ang_vel_body.x,
            dt
        );
        torque.y = body.inertia_kgm2.y * self.bank.pitch.update(
            pitch_dem,
            self.vehicle.euler_rad.y,
            tick.ang_vel_body.y,
            dt
        );

        // Yaw is rate-controlled directly
        torque.z = body.inertia_kgm2.z * self.bank.yaw.update(
            self.velocity_command.angular[2],
            self.vehicle.ang_vel_rads.z,
            0.0,
            dt
        );

        // Vertical velocity control with gravity compensation
        force.z = body.mass_kg * (
            self.bank.velocity_z.update(
                self.velocity_command.linear[2],
                self.vehicle.lin_vel_ms.z,
                self.vehicle.lin_acc_mss.z,
                dt
            )
            + tick.gravity.load_factor * g
        );

        // Cap the thrust at the actuator bound and floor it at zero, no
        // downward thrust is possible
        if self.params.max_force_n > 0.0 && force.z > self.params.max_force_n {
            force.z = self.params.max_force_n;
            self.report.force_limited[2] = true;
        }
        if force.z < 0.0 {
            force.z = 0.0;
            self.report.force_limited[2] = true;
        }

        Ok((force, torque, self.velocity_command))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::super::cmd::EngageCmd;
    use super::super::params::Params;
    use super::super::pid::PidConfig;
    use super::super::state::{FlightCtrl, InputData};
    use comms_if::eqpt::phys::{BodyProps, RigidBodyState};
    use comms_if::tc::flight_ctrl::Twist;
    use util::module::State;

    const MASS_KG: f64 = 1.5;
    const GRAVITY: f64 = 9.81;

    fn test_props() -> BodyProps {
        BodyProps {
            link_name: "base_link".into(),
            mass_kg: MASS_KG,
            principal_inertia_kgm2: [0.02, 0.02, 0.04],
            cog_m: [0.0; 3]
        }
    }

    fn input_at(time: f64) -> InputData {
        InputData {
            sim_time_s: time,
            body: Some(RigidBodyState {
                link_name: "base_link".into(),
                position_m: [0.0; 3],
                attitude_q: [1.0, 0.0, 0.0, 0.0],
                lin_vel_ms: [0.0; 3],
                ang_vel_rads: [0.0; 3],
                ang_acc_radss: [0.0; 3],
                sim_time_s: time
            }),
            odom: None,
            imu: None
        }
    }

    fn engaged_controller(params: Params) -> FlightCtrl {
        let mut fc = FlightCtrl::with_params(params);
        fc.set_body_props(&test_props());
        fc.cmd_channel().post_engage(EngageCmd::Engage);
        fc.proc(&input_at(0.0)).unwrap();
        fc
    }

    #[test]
    fn test_hover_thrust_is_gravity_compensation() {
        // With all gains zero the only output is the gravity compensation
        // term: mass * load_factor * g, and the load factor is 1 when level
        let mut fc = engaged_controller(Params::default());

        let (out, _) = fc.proc(&input_at(0.02)).unwrap();

        assert!((out.force_n[2] - MASS_KG * GRAVITY).abs() < 1e-9);
        assert_eq!(out.force_n[0], 0.0);
        assert_eq!(out.force_n[1], 0.0);
        assert_eq!(out.torque_nm, [0.0; 3]);
    }

    #[test]
    fn test_thrust_capped_at_max_force() {
        let mut params = Params::default();
        params.max_force_n = 10.0;

        let mut fc = engaged_controller(params);

        // Hover demand is ~14.7 N, above the 10 N bound
        let (out, report) = fc.proc(&input_at(0.02)).unwrap();

        assert_eq!(out.force_n[2], 10.0);
        assert!(report.force_limited[2]);
    }

    #[test]
    fn test_thrust_floored_at_zero() {
        let mut params = Params::default();
        params.velocity_z = PidConfig {
            gain_p: 10.0,
            ..Default::default()
        };

        let mut fc = engaged_controller(params);

        // A hard descent demand drives the velocity controller well below
        // the gravity compensation term, but no downward thrust exists
        fc.cmd_channel().post_velocity(Twist {
            linear: [0.0, 0.0, -100.0],
            angular: [0.0; 3]
        });

        let (out, _) = fc.proc(&input_at(0.02)).unwrap();

        assert_eq!(out.force_n[2], 0.0);
    }

    #[test]
    fn test_velocity_demands_passed_through() {
        let mut fc = engaged_controller(Params::default());

        let cmd = Twist {
            linear: [1.0, 2.0, 3.0],
            angular: [0.0, 0.0, 0.4]
        };
        fc.cmd_channel().post_velocity(cmd);

        // This policy consumes the operator's velocity command directly, so
        // it is reported unchanged as the effective demand
        let (out, _) = fc.proc(&input_at(0.02)).unwrap();

        assert_eq!(out.velocity_dems.linear, cmd.linear);
        assert_eq!(out.velocity_dems.angular, cmd.angular);
    }
}
