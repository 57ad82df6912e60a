//! Position cascade policy
//!
//! The full cascade: position controllers produce velocity demands, velocity
//! controllers produce force (mass-scaled, with gravity compensation on the
//! vertical axis), attitude controllers produce angular-rate demands, and
//! rate controllers produce torque (inertia-scaled, against the measured
//! angular acceleration). Forces and torques are saturated component-wise to
//! the actuator bounds, with an extra margin on the vertical force band so
//! gravity compensation is not starved.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector3;

// Internal
use super::state::{FlightCtrl, TickData};
use super::{FlightCtrlError, VERT_FORCE_SAT_MARGIN_N};
use comms_if::tc::flight_ctrl::Twist;
use util::maths::clamp_abs;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FlightCtrl {

    /// Evaluate the position cascade for one tick.
    ///
    /// Returns the force, the torque, and the effective velocity demands
    /// produced by the position and attitude loops.
    pub(super) fn calc_pos_cascade(
        &mut self,
        tick: &TickData
    ) -> Result<(Vector3<f64>, Vector3<f64>, Twist), FlightCtrlError> {

        let body = self.body_params()?;
        let dt = tick.dt;
        let g = tick.gravity.magnitude;

        let mut vel_dems = Twist::default();

        // Position loop: position error to velocity demand
        vel_dems.linear[0] = self.bank.position_x.update(
            self.position_command.linear[0],
            self.vehicle.position_m.x,
            self.vehicle.lin_vel_ms.x,
            dt
        );
        vel_dems.linear[1] = self.bank.position_y.update(
            self.position_command.linear[1],
            self.vehicle.position_m.y,
            self.vehicle.lin_vel_ms.y,
            dt
        );
        vel_dems.linear[2] = self.bank.position_z.update(
            self.position_command.linear[2],
            self.vehicle.position_m.z,
            self.vehicle.lin_vel_ms.z,
            dt
        );

        // Velocity loop: velocity demand to force, gravity compensated on
        // the vertical axis
        let mut force = Vector3::zeros();
        force.x = body.mass_kg * self.bank.velocity_x.update(
            vel_dems.linear[0],
            self.vehicle.lin_vel_ms.x,
            self.vehicle.lin_acc_mss.x,
            dt
        );
        force.y = body.mass_kg * self.bank.velocity_y.update(
            vel_dems.linear[1],
            self.vehicle.lin_vel_ms.y,
            self.vehicle.lin_acc_mss.y,
            dt
        );
        force.z = body.mass_kg * (
            self.bank.velocity_z.update(
                vel_dems.linear[2],
                self.vehicle.lin_vel_ms.z,
                self.vehicle.lin_acc_mss.z,
                dt
            )
            + tick.gravity.load_factor * g
        );

        // Attitude loop: commanded angles to angular-rate demands
        vel_dems.angular[0] = self.bank.roll.update(
            self.position_command.angular[0],
            self.vehicle.euler_rad.x,
            self.vehicle.ang_vel_rads.x,
            dt
        );
        vel_dems.angular[1] = self.bank.pitch.update(
            self.position_command.angular[1],
            self.vehicle.euler_rad.y,
            self.vehicle.ang_vel_rads.y,
            dt
        );
        vel_dems.angular[2] = self.bank.yaw.update(
            self.position_command.angular[2],
            self.vehicle.euler_rad.z,
            self.vehicle.ang_vel_rads.z,
            dt
        );

        // Rate loop: angular-rate demands to torque, against the measured
        // angular acceleration
        let mut torque = Vector3::zeros();
        torque.x = body.inertia_kgm2.x * self.bank.roll_rate.update(
            vel_dems.angular[0],
            self.vehicle.ang_vel_rads.x,
            self.vehicle.ang_acc_radss.x,
            dt
        );
        torque.y = body.inertia_kgm2.y * self.bank.pitch_rate.update(
            vel_dems.angular[1],
            self.vehicle.ang_vel_rads.y,
            self.vehicle.ang_acc_radss.y,
            dt
        );
        torque.z = body.inertia_kgm2.z * self.bank.yaw_rate.update(
            vel_dems.angular[2],
            self.vehicle.ang_vel_rads.z,
            self.vehicle.ang_acc_radss.z,
            dt
        );

        // Saturate the force demands. The vertical component gets an extra
        // margin over the bound so the hover thrust survives saturation.
        if self.params.max_force_n > 0.0 {
            let vert_bound = self.params.max_force_n + VERT_FORCE_SAT_MARGIN_N;

            let clamped = clamp_abs(force.z, vert_bound);
            if clamped != force.z {
                force.z = clamped;
                self.report.force_limited[2] = true;
            }

            for i in 0..2 {
                let clamped = clamp_abs(force[i], self.params.max_force_n);
                if clamped != force[i] {
                    force[i] = clamped;
                    self.report.force_limited[i] = true;
                }
            }
        }

        // Saturate the torque demands
        if self.params.max_torque_nm > 0.0 {
            for i in 0..3 {
                let clamped = clamp_abs(torque[i], self.params.max_torque_nm);
                if clamped != torque[i] {
                    torque[i] = clamped;
                    self.report.torque_limited[i] = true;
                }
            }
        }

        Ok((force, torque, vel_dems))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::super::cmd::EngageCmd;
    use super::super::params::{CascadePolicy, Params};
    use super::super::pid::PidConfig;
    use super::super::state::{FlightCtrl, InputData};
    use comms_if::eqpt::phys::{BodyProps, RigidBodyState};
    use comms_if::tc::flight_ctrl::Twist;
    use util::module::State;

    const MASS_KG: f64 = 1.5;

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

    fn aggressive_params() -> Params {
        let mut params = Params::default();
        params.policy = CascadePolicy::PositionCascade;
        params.auto_engage = false;

        let hot = PidConfig {
            gain_p: 1000.0,
            ..Default::default()
        };
        params.position_x = hot;
        params.position_y = hot;
        params.position_z = hot;
        params.velocity_x = hot;
        params.velocity_y = hot;
        params.velocity_z = hot;
        params.roll = hot;
        params.pitch = hot;
        params.yaw = hot;
        params.roll_rate = hot;
        params.pitch_rate = hot;
        params.yaw_rate = hot;

        params
    }

    fn engaged_controller(params: Params) -> FlightCtrl {
        let mut fc = FlightCtrl::with_params(params);
        fc.set_body_props(&test_props());
        fc.cmd_channel().post_engage(EngageCmd::Engage);
        fc.proc(&input_at(0.0)).unwrap();
        fc
    }

    #[test]
    fn test_force_saturation_bounds() {
        let mut params = aggressive_params();
        params.max_force_n = 10.0;

        let mut fc = engaged_controller(params);

        // An enormous position error drives every loop deep into saturation
        fc.cmd_channel().post_position(Twist {
            linear: [100.0, -100.0, 100.0],
            angular: [0.0; 3]
        });

        let (out, report) = fc.proc(&input_at(0.02)).unwrap();

        // Horizontal components bounded by max_force, the vertical
        // component by max_force plus the documented 10 N margin
        assert!(out.force_n[0].abs() <= 10.0);
        assert!(out.force_n[1].abs() <= 10.0);
        assert!(out.force_n[2].abs() <= 20.0);
        assert!(report.force_limited.iter().all(|&f| f));
    }

    #[test]
    fn test_torque_saturation_bounds() {
        let mut params = aggressive_params();
        params.max_torque_nm = 5.0;

        let mut fc = engaged_controller(params);

        fc.cmd_channel().post_position(Twist {
            linear: [0.0; 3],
            angular: [3.0, -3.0, 3.0]
        });

        let (out, report) = fc.proc(&input_at(0.02)).unwrap();

        for i in 0..3 {
            assert!(out.torque_nm[i].abs() <= 5.0);
            assert!(report.torque_limited[i]);
        }
    }

    #[test]
    fn test_unbounded_when_limits_non_positive() {
        // max_force <= 0 means unbounded
        let params = aggressive_params();
        let mut fc = engaged_controller(params);

        fc.cmd_channel().post_position(Twist {
            linear: [100.0, 0.0, 0.0],
            angular: [0.0; 3]
        });

        let (out, report) = fc.proc(&input_at(0.02)).unwrap();

        assert!(out.force_n[0].abs() > 1000.0);
        assert!(!report.force_limited[0]);
    }

    #[test]
    fn test_cascade_produces_velocity_demands() {
        let mut params = Params::default();
        params.policy = CascadePolicy::PositionCascade;
        params.auto_engage = false;
        params.position_x = PidConfig {
            gain_p: 2.0,
            ..Default::default()
        };

        let mut fc = engaged_controller(params);

        fc.cmd_channel().post_position(Twist {
            linear: [3.0, 0.0, 0.0],
            angular: [0.0; 3]
        });

        let (out, _) = fc.proc(&input_at(0.02)).unwrap();

        // Position error of 3 m through a pure P controller with gain 2
        assert!((out.velocity_dems.linear[0] - 6.0).abs() < 1e-9);
    }
}
