//! # Telecommand processor module
//!
//! The telecommand processor handles TCs coming from any source, routing
//! them into the command cells consumed by flight control.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;

// Internal
use comms_if::tc::Tc;
use fc_lib::data_store::DataStore;
use fc_lib::flight_ctrl::EngageCmd;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
///
/// Posts commands into the flight control command channel.
pub(crate) fn exec(ds: &mut DataStore, tc: &Tc) {

    let channel = ds.flight_ctrl.cmd_channel();

    // Handle different Tcs
    match tc {
        Tc::Heartbeat => {
            debug!("Received Heartbeat command");
        },
        Tc::Velocity(cmd) => {
            channel.post_velocity(*cmd);
        },
        Tc::Position(cmd) => {
            channel.post_position(*cmd);
        },
        Tc::GainTune(tune) => {
            debug!("Received GainTune command for selector {}", tune.axis);
            channel.post_gain_tune(*tune);
        },
        Tc::Engage => {
            debug!("Received Engage command");
            channel.post_engage(EngageCmd::Engage);
        },
        Tc::Shutdown => {
            debug!("Received Shutdown command");
            channel.post_engage(EngageCmd::Shutdown);
        }
    }

}
