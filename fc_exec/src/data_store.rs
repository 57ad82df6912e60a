//! # Data Store

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::flight_ctrl;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// Time used to clock the control law. Taken from the physics host when
    /// its state feed is alive, from the session clock otherwise.
    pub sim_time_s: f64,

    // FlightCtrl
    pub flight_ctrl: flight_ctrl::FlightCtrl,
    pub flight_ctrl_input: flight_ctrl::InputData,
    pub flight_ctrl_output: flight_ctrl::OutputData,
    pub flight_ctrl_status_rpt: flight_ctrl::StatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Number of consecutive physics client receive errors
    pub num_consec_phys_recv_errors: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle.
    pub fn cycle_start(&mut self) {
        self.flight_ctrl_input = flight_ctrl::InputData::default();
        self.flight_ctrl_output = flight_ctrl::OutputData::default();
        self.flight_ctrl_status_rpt = flight_ctrl::StatusReport::default();

        self.sim_time_s = util::session::get_elapsed_seconds();
    }
}
