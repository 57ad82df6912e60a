//! # Filtered PID controller
//!
//! This module provides the single-axis controller used by FlightCtrl. On top
//! of the usual proportional/derivative/integral terms the controller runs an
//! exponential low-pass filter over its setpoint, so that step commands are
//! smoothed before the error terms are computed. The filter time constant and
//! an optional symmetric setpoint limit are part of the configuration.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Configuration of a single [`FilteredPid`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidConfig {
    /// Proportional gain
    #[serde(default)]
    pub gain_p: f64,

    /// Derivative gain
    #[serde(default)]
    pub gain_d: f64,

    /// Integral gain
    #[serde(default)]
    pub gain_i: f64,

    /// Setpoint filter time constant.
    ///
    /// A value of zero disables the filter, in which case the setpoint is
    /// passed through unsmoothed.
    ///
    /// Units: seconds
    #[serde(default)]
    pub time_constant: f64,

    /// Symmetric limit applied to the setpoint before filtering.
    ///
    /// Values of zero or below mean the setpoint is unlimited.
    #[serde(default = "default_limit")]
    pub limit: f64
}

/// A single-axis filtered PID controller.
///
/// The runtime state (filter state, integral accumulation and last output) is
/// zeroed on construction and only ever cleared again by an explicit call to
/// [`FilteredPid::reset`]. Gains may be replaced at any time without touching
/// the runtime state.
#[derive(Debug, Default, Clone, Serialize)]
pub struct FilteredPid {
    /// Controller configuration
    config: PidConfig,

    /// Low-pass filtered setpoint
    filtered_input: f64,

    /// Derivative of the filtered setpoint
    filtered_dinput: f64,

    /// Integral error accumulation.
    ///
    /// The integral is accumulated unconditionally, there is no anti-windup.
    integral: f64,

    /// The output computed on the last update
    last_output: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            gain_p: 0.0,
            gain_d: 0.0,
            gain_i: 0.0,
            time_constant: 0.0,
            limit: default_limit()
        }
    }
}

impl FilteredPid {

    /// Create a new controller with the given configuration and zeroed
    /// runtime state.
    pub fn new(config: PidConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Replace the full configuration of the controller.
    ///
    /// The runtime state is not modified.
    pub fn configure(&mut self, config: PidConfig) {
        self.config = config;
    }

    /// Replace the controller gains and filter time constant.
    ///
    /// This is the runtime retune path. The setpoint limit and the runtime
    /// state are not modified.
    pub fn update_gains(
        &mut self,
        gain_p: f64,
        gain_d: f64,
        gain_i: f64,
        time_constant: f64
    ) {
        self.config.gain_p = gain_p;
        self.config.gain_d = gain_d;
        self.config.gain_i = gain_i;
        self.config.time_constant = time_constant;
    }

    /// Advance the controller by one tick and return the new output.
    ///
    /// # Inputs
    /// - `setpoint`: the demanded value for the controlled quantity
    /// - `measured`: the measured value of the controlled quantity
    /// - `measured_derivative`: the measured derivative of the controlled
    ///   quantity
    /// - `dt`: the elapsed time since the last update, must be positive
    ///   (guaranteed by the caller's rate decimation)
    pub fn update(
        &mut self,
        setpoint: f64,
        measured: f64,
        measured_derivative: f64,
        dt: f64
    ) -> f64 {
        let mut setpoint = setpoint;

        // Limit the setpoint
        if self.config.limit > 0.0 && setpoint.abs() > self.config.limit {
            setpoint = setpoint.signum() * self.config.limit;
        }

        // Filter the setpoint. If the filter would divide by zero it holds
        // its previous value instead.
        let filter_div = dt + self.config.time_constant;
        if filter_div > 0.0 {
            self.filtered_dinput = (setpoint - self.filtered_input) / filter_div;
            self.filtered_input =
                (dt * setpoint + self.config.time_constant * self.filtered_input)
                / filter_div;
        }

        // Compute the error terms. The integral is accumulated
        // unconditionally.
        let p = self.filtered_input - measured;
        let d = self.filtered_dinput - measured_derivative;
        self.integral += dt * p;

        self.last_output =
            self.config.gain_p * p
            + self.config.gain_d * d
            + self.config.gain_i * self.integral;

        self.last_output
    }

    /// Zero the runtime state of the controller.
    ///
    /// The configuration is not modified.
    pub fn reset(&mut self) {
        self.filtered_input = 0.0;
        self.filtered_dinput = 0.0;
        self.integral = 0.0;
        self.last_output = 0.0;
    }

    /// Get the current configuration of the controller.
    pub fn config(&self) -> &PidConfig {
        &self.config
    }

    /// Get the current integral accumulation.
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// Get the output computed on the last update.
    pub fn last_output(&self) -> f64 {
        self.last_output
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn default_limit() -> f64 {
    -1.0
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn config(gain_p: f64, gain_d: f64, gain_i: f64, time_constant: f64, limit: f64)
        -> PidConfig
    {
        PidConfig { gain_p, gain_d, gain_i, time_constant, limit }
    }

    #[test]
    fn test_update_deterministic() {
        let cfg = config(1.5, 0.2, 0.1, 0.05, -1.0);

        let mut ctrl_a = FilteredPid::new(cfg);
        let mut ctrl_b = FilteredPid::new(cfg);

        // Two controllers in the same state given the same inputs produce the
        // same outputs, tick after tick
        for _ in 0..20 {
            let out_a = ctrl_a.update(1.2, 0.4, 0.1, 0.01);
            let out_b = ctrl_b.update(1.2, 0.4, 0.1, 0.01);
            assert_eq!(out_a, out_b);
        }
    }

    #[test]
    fn test_zero_gains_zero_output() {
        let mut ctrl = FilteredPid::new(config(0.0, 0.0, 0.0, 0.1, -1.0));

        for _ in 0..10 {
            assert_eq!(ctrl.update(3.0, -2.0, 5.0, 0.01), 0.0);
        }
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut ctrl = FilteredPid::new(config(0.0, 0.0, 0.0, 0.1, -1.0));

        // Pollute the runtime state
        for _ in 0..10 {
            ctrl.update(5.0, 1.0, 0.5, 0.01);
        }

        ctrl.reset();

        // With zero gains the output must be zero, and the internal state
        // must match a freshly constructed controller
        assert_eq!(ctrl.update(0.0, 0.0, 0.0, 0.01), 0.0);

        let fresh = FilteredPid::new(config(0.0, 0.0, 0.0, 0.1, -1.0));
        assert_eq!(ctrl.filtered_input, fresh.filtered_input);
        assert_eq!(ctrl.filtered_dinput, fresh.filtered_dinput);
        assert_eq!(ctrl.integral, fresh.integral);
        assert_eq!(ctrl.last_output, fresh.last_output);
    }

    #[test]
    fn test_setpoint_saturation() {
        let cfg = config(2.0, 0.5, 0.1, 0.05, 2.0);

        let mut ctrl_limited = FilteredPid::new(cfg);
        let mut ctrl_direct = FilteredPid::new(cfg);

        // A setpoint beyond the limit behaves exactly as if the limit itself
        // had been commanded
        for _ in 0..20 {
            let out_limited = ctrl_limited.update(5.0, 0.3, 0.0, 0.01);
            let out_direct = ctrl_direct.update(2.0, 0.3, 0.0, 0.01);
            assert_eq!(out_limited, out_direct);
        }
    }

    #[test]
    fn test_integral_accumulation() {
        // Pure integral controller, constant error of 1.0
        let mut ctrl = FilteredPid::new(config(0.0, 0.0, 1.0, 0.0, -1.0));

        let mut output = 0.0;
        for _ in 0..10 {
            output = ctrl.update(1.0, 0.0, 0.0, 0.02);
        }

        // integral = 10 * 0.02 * 1.0 = 0.2
        assert!((output - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_integral_no_windup_clamp() {
        // The integral keeps accumulating even while the setpoint saturates,
        // there is no anti-windup
        let mut ctrl = FilteredPid::new(config(1.0, 0.0, 1.0, 0.0, 2.0));

        for _ in 0..100 {
            ctrl.update(100.0, 0.0, 0.0, 0.01);
        }

        // Error is clamped to 2.0 each tick: integral = 100 * 0.01 * 2.0
        assert!((ctrl.integral() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_filter_holds_on_zero_divisor() {
        // dt = 0 and time_constant = 0 makes the filter divisor zero, in
        // which case the filter state must hold
        let mut ctrl = FilteredPid::new(config(1.0, 0.0, 0.0, 0.0, -1.0));

        ctrl.update(4.0, 0.0, 0.0, 0.01);
        let held_input = ctrl.filtered_input;

        ctrl.update(9.0, 0.0, 0.0, 0.0);
        assert_eq!(ctrl.filtered_input, held_input);
    }

    #[test]
    fn test_update_gains_preserves_state_and_limit() {
        let mut ctrl = FilteredPid::new(config(1.0, 0.0, 1.0, 0.0, 2.0));

        for _ in 0..5 {
            ctrl.update(1.0, 0.0, 0.0, 0.01);
        }
        let integral = ctrl.integral();

        ctrl.update_gains(3.0, 0.4, 0.2, 0.1);

        assert_eq!(ctrl.integral(), integral);
        assert_eq!(ctrl.config().gain_p, 3.0);
        assert_eq!(ctrl.config().limit, 2.0);
    }
}
