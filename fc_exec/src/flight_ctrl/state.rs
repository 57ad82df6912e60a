//! Implementations for the FlightCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::info;
use nalgebra::Vector3;
use serde::Serialize;

// Internal
use super::{
    frames,
    bank::ControllerBank,
    cmd::{CommandChannel, EngageCmd},
    frames::GravityBody,
    params::{CascadePolicy, Params},
    FlightCtrlError, AUTO_ENGAGE_ALT_THRESHOLD_M};
use crate::state_est::{SourceConfig, VehicleState};
use comms_if::eqpt::phys::{BodyProps, ImuSample, OdomSample, RigidBodyState};
use comms_if::tc::flight_ctrl::Twist;
use util::{
    params,
    module::State,
    session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Flight control module state
#[derive(Default)]
pub struct FlightCtrl {

    pub(crate) params: Params,

    /// The bank of twelve axis controllers
    pub(crate) bank: ControllerBank,

    /// The command cells written by the TC processor
    cmd_channel: CommandChannel,

    /// The latest known state of the vehicle body
    pub(crate) vehicle: VehicleState,

    /// Mass and inertia of the controlled body, set once the body has been
    /// resolved against the physics host
    pub(crate) body: Option<BodyParams>,

    engage_state: EngageState,

    /// Most recent velocity command, kept across ticks
    pub(crate) velocity_command: Twist,

    /// Most recent position command, kept across ticks
    pub(crate) position_command: Twist,

    decimator: RateDecimator,

    /// The output of the last executed control tick, re-emitted on cycles on
    /// which the control law is decimated out
    last_output: OutputData,

    pub(crate) report: StatusReport
}

/// Input data to flight control.
#[derive(Clone, Default)]
pub struct InputData {
    /// Current simulation time in seconds.
    pub sim_time_s: f64,

    /// The internally queried state of the body, if the physics host has
    /// published one.
    pub body: Option<RigidBodyState>,

    /// A new odometry sample, or `None` if no new sample arrived this cycle.
    pub odom: Option<OdomSample>,

    /// A new IMU sample, or `None` if no new sample arrived this cycle.
    pub imu: Option<ImuSample>
}

/// Output wrench and telemetry from flight control.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct OutputData {
    /// Force to apply to the body at the link origin.
    ///
    /// Units: newtons
    pub force_n: [f64; 3],

    /// Torque to apply to the body, before the centre-of-gravity lever arm
    /// correction.
    ///
    /// Units: newton meters,
    /// Frame: body
    pub torque_nm: [f64; 3],

    /// The measured velocity of the body (world linear + world angular).
    pub real_velocity: Twist,

    /// The effective velocity command after the cascade. Under the position
    /// cascade policy this is the output of the position controllers, under
    /// the rate-from-velocity policy it is the operator's velocity command.
    pub velocity_dems: Twist
}

/// Status report for FlightCtrl processing.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct StatusReport {
    /// True if the controller is engaged (running).
    pub engaged: bool,

    /// True if the control law executed this cycle (the rate decimator
    /// fired).
    pub control_active: bool,

    /// The load factor computed this tick. Unbounded near 90 degrees of
    /// tilt.
    pub load_factor: f64,

    /// Per-component flags raised when the force demand hit its bound.
    pub force_limited: [bool; 3],

    /// Per-component flags raised when the torque demand hit its bound.
    pub torque_limited: [bool; 3]
}

/// Mass and inertia of the controlled body.
#[derive(Debug, Clone, Copy)]
pub struct BodyParams {
    /// Mass of the body.
    ///
    /// Units: kilograms
    pub mass_kg: f64,

    /// Principal moments of inertia about the body axes.
    ///
    /// Units: kilogram meters^2
    pub inertia_kgm2: Vector3<f64>
}

/// Per-tick frame-relative quantities handed to the cascade policies.
pub(crate) struct TickData {
    /// Control interval, always positive.
    pub dt: f64,

    /// Gravity projected into the body frame, with the load factor.
    pub gravity: GravityBody,

    /// Linear velocity expressed in the heading frame.
    pub velocity_hf: Vector3<f64>,

    /// Linear acceleration expressed in the heading frame.
    pub accel_hf: Vector3<f64>,

    /// Angular velocity expressed in the body frame.
    pub ang_vel_body: Vector3<f64>
}

/// Decimates the control law to its own rate, independent of the host's
/// cycle rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RateDecimator {
    period_s: f64,
    last_exec_s: Option<f64>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Engagement state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EngageState {
    /// Motors off, no wrench is produced.
    Idle,

    /// Motors on, the cascade is evaluated every control tick.
    Running
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for EngageState {
    fn default() -> Self {
        EngageState::Idle
    }
}

impl RateDecimator {

    /// Create a decimator with the given minimum interval between
    /// executions. A zero period executes on every cycle with advancing
    /// time.
    pub fn new(period_s: f64) -> Self {
        Self {
            period_s,
            last_exec_s: None
        }
    }

    /// Report the elapsed interval since the last execution if the control
    /// law is due, or `None` if this cycle is decimated out.
    ///
    /// The first call only primes the decimator. Non-advancing time never
    /// fires.
    pub fn update(&mut self, now_s: f64) -> Option<f64> {
        match self.last_exec_s {
            None => {
                self.last_exec_s = Some(now_s);
                None
            },
            Some(last) => {
                let dt = now_s - last;

                if dt > 0.0 && dt >= self.period_s {
                    self.last_exec_s = Some(now_s);
                    Some(dt)
                }
                else {
                    None
                }
            }
        }
    }
}

impl State for FlightCtrl {
    type InitData = &'static str;
    type InitError = params::LoadError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = FlightCtrlError;

    /// Initialise the FlightCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, _session: &Session)
        -> Result<(), Self::InitError>
    {
        // Load the parameters
        let params: Params = match params::load(init_data) {
            Ok(p) => p,
            Err(e) => return Err(e)
        };

        self.apply_params(params);

        Ok(())
    }

    /// Perform cyclic processing of flight control.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        // Clear the status report
        self.report = StatusReport::default();

        // Consume the command cells. Commands, retunes and engage triggers
        // are applied on every cycle, even those on which the control law is
        // decimated out.
        let snapshot = self.cmd_channel.snapshot();

        if let Some(cmd) = snapshot.velocity {
            self.velocity_command = cmd;
        }
        if let Some(cmd) = snapshot.position {
            self.position_command = cmd;
        }
        if let Some(tune) = snapshot.gain_tune {
            self.bank.apply_tune(&tune);
        }
        match snapshot.engage {
            Some(EngageCmd::Engage) => {
                info!("Engaging motors!");
                self.engage_state = EngageState::Running;
            },
            Some(EngageCmd::Shutdown) => {
                info!("Shutting down motors!");
                self.engage_state = EngageState::Idle;
            },
            None => ()
        }

        // Rate decimation. On cycles where the control law is not due the
        // previous wrench carries over unchanged (zero on a fresh
        // deployment).
        let dt = match self.decimator.update(input_data.sim_time_s) {
            Some(dt) => dt,
            None => {
                self.report.engaged = self.engage_state == EngageState::Running;
                return Ok((self.last_output, self.report));
            }
        };
        self.report.control_active = true;

        // Refresh the vehicle state from the configured sources
        let source_config = SourceConfig {
            use_odom: self.params.use_odom_feed,
            use_imu: self.params.use_imu_feed
        };
        self.vehicle.refresh(
            input_data.imu.as_ref(),
            input_data.odom.as_ref(),
            input_data.body.as_ref(),
            dt,
            source_config
        );

        // Compute the frame-relative quantities for this tick
        let gravity_w = Vector3::from(self.params.gravity_mss);
        let gravity = frames::gravity_in_body(&self.vehicle.attitude_q, &gravity_w);
        self.report.load_factor = gravity.load_factor;

        let heading_q = frames::heading_quaternion(self.vehicle.euler_rad.z);

        let tick = TickData {
            dt,
            velocity_hf: frames::heading_frame_vector(
                &heading_q, &self.vehicle.lin_vel_ms),
            accel_hf: frames::heading_frame_vector(
                &heading_q, &self.vehicle.lin_acc_mss),
            ang_vel_body: frames::body_frame_vector(
                &self.vehicle.attitude_q, &self.vehicle.ang_vel_rads),
            gravity
        };

        // Auto engage from idle when a climb is commanded
        if self.params.auto_engage
            && self.engage_state == EngageState::Idle
            && self.position_command.linear[2] > AUTO_ENGAGE_ALT_THRESHOLD_M
        {
            info!("Engaging motors!");
            self.engage_state = EngageState::Running;
        }
        self.report.engaged = self.engage_state == EngageState::Running;

        // Evaluate the cascade, or hold the reset set cleared while idle
        let (force, torque, velocity_dems) = match self.engage_state {
            EngageState::Running => {
                match self.params.policy {
                    CascadePolicy::RateFromVelocity =>
                        self.calc_rate_from_velocity(&tick)?,
                    CascadePolicy::PositionCascade =>
                        self.calc_pos_cascade(&tick)?
                }
            },
            EngageState::Idle => {
                self.bank.reset_axes(&self.params.idle_reset_axes);

                (Vector3::zeros(), Vector3::zeros(), self.velocity_command)
            }
        };

        // Assemble the output
        let output = OutputData {
            force_n: force.into(),
            torque_nm: torque.into(),
            real_velocity: Twist {
                linear: self.vehicle.lin_vel_ms.into(),
                angular: self.vehicle.ang_vel_rads.into()
            },
            velocity_dems
        };

        self.last_output = output;

        Ok((output, self.report))
    }
}

impl FlightCtrl {

    /// Create a FlightCtrl directly from a parameter struct, without going
    /// through a parameter file. Used by tests and benchmarks.
    pub fn with_params(params: Params) -> Self {
        let mut fc = Self::default();
        fc.apply_params(params);
        fc
    }

    /// Set the mass and inertia of the controlled body.
    ///
    /// Must be called once the body has been resolved against the physics
    /// host, before the controller can be engaged.
    pub fn set_body_props(&mut self, props: &BodyProps) {
        self.body = Some(BodyParams {
            mass_kg: props.mass_kg,
            inertia_kgm2: Vector3::from(props.principal_inertia_kgm2)
        });
    }

    /// Get the writing end of the command channel.
    pub fn cmd_channel(&self) -> CommandChannel {
        self.cmd_channel.clone()
    }

    /// Get the current engagement state.
    pub fn engage_state(&self) -> EngageState {
        self.engage_state
    }

    /// Get the controller bank.
    pub fn bank(&self) -> &ControllerBank {
        &self.bank
    }

    /// Get the body parameters, or an error if they have not been set.
    pub(crate) fn body_params(&self) -> Result<BodyParams, FlightCtrlError> {
        self.body.ok_or(FlightCtrlError::NoBodyProps)
    }

    /// Wire the parameter struct into the module.
    fn apply_params(&mut self, params: Params) {
        self.bank = ControllerBank::from_params(&params);
        self.decimator = RateDecimator::new(params.control_period_s);
        self.params = params;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use super::super::params::CascadePolicy;
    use super::super::pid::PidConfig;
    use crate::flight_ctrl::CtrlAxis;

    fn test_props() -> BodyProps {
        BodyProps {
            link_name: "base_link".into(),
            mass_kg: 1.5,
            principal_inertia_kgm2: [0.02, 0.02, 0.04],
            cog_m: [0.0; 3]
        }
    }

    fn body_state(time: f64) -> RigidBodyState {
        RigidBodyState {
            link_name: "base_link".into(),
            position_m: [0.0; 3],
            attitude_q: [1.0, 0.0, 0.0, 0.0],
            lin_vel_ms: [0.0; 3],
            ang_vel_rads: [0.0; 3],
            ang_acc_radss: [0.0; 3],
            sim_time_s: time
        }
    }

    fn input_at(time: f64) -> InputData {
        InputData {
            sim_time_s: time,
            body: Some(body_state(time)),
            odom: None,
            imu: None
        }
    }

    fn integrating_config() -> PidConfig {
        PidConfig {
            gain_p: 1.0,
            gain_d: 0.0,
            gain_i: 1.0,
            time_constant: 0.0,
            limit: -1.0
        }
    }

    /// Params with every controller integrating, so that runtime state
    /// accumulates quickly in tests.
    fn integrating_params(policy: CascadePolicy) -> Params {
        let mut params = Params::default();
        params.policy = policy;
        params.auto_engage = false;

        for axis in CtrlAxis::ALL.iter() {
            let cfg = integrating_config();
            match axis {
                CtrlAxis::VelocityX => params.velocity_x = cfg,
                CtrlAxis::VelocityY => params.velocity_y = cfg,
                CtrlAxis::VelocityZ => params.velocity_z = cfg,
                CtrlAxis::PositionX => params.position_x = cfg,
                CtrlAxis::PositionY => params.position_y = cfg,
                CtrlAxis::PositionZ => params.position_z = cfg,
                CtrlAxis::RollRate => params.roll_rate = cfg,
                CtrlAxis::PitchRate => params.pitch_rate = cfg,
                CtrlAxis::YawRate => params.yaw_rate = cfg,
                CtrlAxis::Roll => params.roll = cfg,
                CtrlAxis::Pitch => params.pitch = cfg,
                CtrlAxis::Yaw => params.yaw = cfg
            }
        }

        params
    }

    #[test]
    fn test_decimator() {
        let mut dec = RateDecimator::new(0.1);

        // First call only primes
        assert_eq!(dec.update(0.0), None);

        // Sub-period intervals are decimated out
        assert_eq!(dec.update(0.05), None);

        // Once the period has elapsed the full interval is reported
        let dt = dec.update(0.15).unwrap();
        assert!((dt - 0.15).abs() < 1e-12);

        // Non-advancing time never fires
        assert_eq!(dec.update(0.15), None);
        assert_eq!(dec.update(0.10), None);
    }

    #[test]
    fn test_decimator_zero_period() {
        let mut dec = RateDecimator::new(0.0);

        assert_eq!(dec.update(0.0), None);
        assert!(dec.update(0.01).is_some());
        assert_eq!(dec.update(0.01), None);
    }

    #[test]
    fn test_engage_and_shutdown_triggers() {
        let mut fc = FlightCtrl::with_params(Params::default());

        assert_eq!(fc.engage_state(), EngageState::Idle);

        fc.cmd_channel().post_engage(EngageCmd::Engage);
        fc.proc(&input_at(0.0)).unwrap();
        assert_eq!(fc.engage_state(), EngageState::Running);

        fc.cmd_channel().post_engage(EngageCmd::Shutdown);
        fc.proc(&input_at(0.0)).unwrap();
        assert_eq!(fc.engage_state(), EngageState::Idle);
    }

    #[test]
    fn test_auto_engage_on_commanded_climb() {
        let mut params = Params::default();
        params.auto_engage = true;

        let mut fc = FlightCtrl::with_params(params);
        fc.set_body_props(&test_props());

        fc.cmd_channel().post_position(Twist {
            linear: [0.0, 0.0, 0.15],
            angular: [0.0; 3]
        });

        // First cycle only primes the decimator, no transition yet
        fc.proc(&input_at(0.0)).unwrap();
        assert_eq!(fc.engage_state(), EngageState::Idle);

        // First executed control tick auto-engages
        let (_, report) = fc.proc(&input_at(0.02)).unwrap();
        assert_eq!(fc.engage_state(), EngageState::Running);
        assert!(report.engaged);
    }

    #[test]
    fn test_no_auto_engage_below_threshold() {
        let mut params = Params::default();
        params.auto_engage = true;

        let mut fc = FlightCtrl::with_params(params);
        fc.set_body_props(&test_props());

        fc.cmd_channel().post_position(Twist {
            linear: [0.0, 0.0, 0.05],
            angular: [0.0; 3]
        });

        fc.proc(&input_at(0.0)).unwrap();
        fc.proc(&input_at(0.02)).unwrap();
        assert_eq!(fc.engage_state(), EngageState::Idle);
    }

    #[test]
    fn test_shutdown_resets_only_configured_axes() {
        let mut fc = FlightCtrl::with_params(
            integrating_params(CascadePolicy::PositionCascade));
        fc.set_body_props(&test_props());

        fc.cmd_channel().post_engage(EngageCmd::Engage);
        fc.cmd_channel().post_position(Twist {
            linear: [1.0, 2.0, 3.0],
            angular: [0.1, 0.2, 0.3]
        });

        // Accumulate integrator state over a few control ticks
        fc.proc(&input_at(0.0)).unwrap();
        fc.proc(&input_at(0.02)).unwrap();
        fc.proc(&input_at(0.04)).unwrap();

        assert!(fc.bank().position_x.integral() != 0.0);
        assert!(fc.bank().velocity_z.integral() != 0.0);

        // Shut down and run the next tick
        fc.cmd_channel().post_engage(EngageCmd::Shutdown);
        fc.proc(&input_at(0.06)).unwrap();
        assert_eq!(fc.engage_state(), EngageState::Idle);

        // The idle-reset set is cleared
        for axis in Params::default_idle_reset_axes() {
            assert_eq!(
                fc.bank().get(axis).integral(),
                0.0,
                "axis {:?} should have been reset",
                axis
            );
        }

        // The position controllers keep their integrators
        assert!(fc.bank().position_x.integral() != 0.0);
        assert!(fc.bank().position_y.integral() != 0.0);
        assert!(fc.bank().position_z.integral() != 0.0);
    }

    #[test]
    fn test_output_carries_over_when_decimated() {
        let mut params = integrating_params(CascadePolicy::RateFromVelocity);
        params.control_period_s = 0.1;

        let mut fc = FlightCtrl::with_params(params);
        fc.set_body_props(&test_props());

        fc.cmd_channel().post_engage(EngageCmd::Engage);
        fc.cmd_channel().post_velocity(Twist {
            linear: [1.0, 0.0, 1.0],
            angular: [0.0, 0.0, 0.5]
        });

        // Fresh deployment: nothing has executed, the wrench is zero
        let (out, report) = fc.proc(&input_at(0.0)).unwrap();
        assert!(!report.control_active);
        assert_eq!(out.force_n, [0.0; 3]);
        assert_eq!(out.torque_nm, [0.0; 3]);

        // A control tick produces a non-zero wrench
        let (out_exec, report) = fc.proc(&input_at(0.15)).unwrap();
        assert!(report.control_active);
        assert!(out_exec.force_n[2] != 0.0);

        // The next cycle is decimated out and carries the wrench over
        let (out_carry, report) = fc.proc(&input_at(0.2)).unwrap();
        assert!(!report.control_active);
        assert_eq!(out_carry.force_n, out_exec.force_n);
        assert_eq!(out_carry.torque_nm, out_exec.torque_nm);
    }

    #[test]
    fn test_running_without_body_props_errors() {
        let mut fc = FlightCtrl::with_params(Params::default());

        fc.cmd_channel().post_engage(EngageCmd::Engage);
        fc.proc(&input_at(0.0)).unwrap();

        assert!(fc.proc(&input_at(0.02)).is_err());
    }
}
