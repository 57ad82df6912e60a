//! Main flight-control executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - System input acquisition:
//!             - Physics state feed (body state, odometry, IMU)
//!         - Telecommand processing and handling
//!         - Flight control processing
//!         - Wrench demand dispatch to the physics host
//!         - Telemetry output
//!
//! # Modules
//!
//! All modules (e.g. `flight_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.
//!

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use fc_lib::{
    data_store::DataStore,
    params::FcExecParams,
    phys_client::{PhysClient, PhysClientError},
    tc_server::{TcServer, TcServerError},
    tm_server::TmServer
};

mod tc_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{Report, eyre::{WrapErr, eyre}};
use comms_if::eqpt::phys::PhysDemsResponse;
use comms_if::tc::TcResponse;
use log::{debug, info, warn};
use std::env;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use util::{
    raise_error,
    module::State,
    logger::{logger_init, LevelFilter},
    session::Session,
    script_interpreter::{ScriptInterpreter, PendingTcs},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.01;

/// Limit of the number of consecutive receive errors from the physics host
/// before giving up on the demand link for this execution.
const MAX_PHYS_RECV_ERROR_LIMIT: u64 = 5;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "fc_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Kestrel Flight Control Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: FcExecParams = util::params::load(
        "fc_exec.toml"
    ).wrap_err("Could not load exec params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE TC SOURCE ----

    // TC source is used to determine whether we're getting TCs from a script
    // or from the ground.
    let mut tc_source = TcSource::None;
    let mut use_tc_server = false;

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    // If we have a single argument use it as the script path
    if args.len() == 2 {

        info!("Loading script from \"{}\"", &args[1]);

        // Load the script interpreter
        let si = ScriptInterpreter::new(
            &args[1]).wrap_err("Failed to load script")?;

        // Display some info
        info!(
            "Loaded script lasts {:.02} s and contains {} TCs\n",
            si.get_duration(),
            si.get_num_tcs()
        );

        // Set the interpreter in the source
        tc_source = TcSource::Script(si);
    }
    // If no arguments then setup the tc server
    else if args.len() == 1 {

        info!("No script provided, remote control via the TcServer will be used\n");
        use_tc_server = true;

    }
    else {
        return Err(eyre!(
            "Expected either zero or one argument, found {}", args.len() - 1)
        );
    }

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    ds.flight_ctrl.init("flight_ctrl.toml", &session)
        .wrap_err("Failed to initialise FlightCtrl")?;
    info!("FlightCtrl init complete");

    info!("Module initialisation complete\n");

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = comms_if::net::zmq::Context::new();

    if use_tc_server {
        tc_source = TcSource::Remote(
            TcServer::new(&zmq_ctx, &exec_params)
                .wrap_err("Failed to initialise the TcServer")?
        );
        info!("TcServer initialised");
    }

    let mut phys_client = {
        let c = PhysClient::new(&zmq_ctx, &exec_params)
            .wrap_err("Failed to initialise PhysClient")?;
        info!("PhysClient initialised");
        c
    };

    let mut tm_server = {
        let s = TmServer::new(&zmq_ctx, &exec_params)
            .wrap_err("Failed to initialise TmServer")?;
        info!("TmServer initialised");
        s
    };

    info!("Network initialisation complete");

    // ---- RESOLVE THE CONTROLLED BODY ----

    // The controller must not run against an unresolved body, so a failure
    // here aborts the whole exec before any ticks execute.
    let body_props = phys_client
        .wait_for_body_props(exec_params.link_resolve_timeout_s)
        .wrap_err("Could not resolve the controlled body")?;

    info!(
        "Link \"{}\" resolved: mass {} kg, inertia {:?} kg m^2",
        body_props.link_name,
        body_props.mass_kg,
        body_props.principal_inertia_kgm2
    );

    ds.flight_ctrl.set_body_props(&body_props);

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start();

        // ---- DATA INPUT ----

        let body_state = phys_client.body_state();

        // Clock the control law on sim time when the physics feed is alive
        if let Some(ref state) = body_state {
            ds.sim_time_s = state.sim_time_s;
        }

        ds.flight_ctrl_input = fc_lib::flight_ctrl::InputData {
            sim_time_s: ds.sim_time_s,
            body: body_state,
            odom: phys_client.take_odom(),
            imu: phys_client.take_imu()
        };

        // ---- TELECOMMAND PROCESSING ----

        // Branch depending on the source
        match tc_source {
            // If no source no point in continuing so break
            TcSource::None => raise_error!("No TC source present"),

            TcSource::Remote(ref server) => {
                // Get commands until none remain
                loop {
                    match server.receive_tc() {
                        Ok(Some(tc)) => {
                            // Process the TC
                            tc_processor::exec(&mut ds, &tc);

                            // Send response
                            match server.send_response(TcResponse::Ok) {
                                Ok(_) => (),
                                Err(e) => warn!("Could not respond to TC: {}", e)
                            }
                        },
                        Ok(None) => {
                            break
                        },
                        Err(TcServerError::TcParseError(e)) => {
                            warn!("Could not parse received TC: {}", e);
                            break;
                        },
                        Err(TcServerError::NonUtf8Tc) => {
                            warn!("Received a non UTF-8 TC, ignored");
                            break;
                        },
                        Err(e) => return Err(e)
                            .wrap_err("An error occured while receiving TCs")
                    }
                }
            },

            TcSource::Script(ref mut si) =>
                match si.get_pending_tcs() {
                    PendingTcs::None => (),
                    PendingTcs::Some(tc_vec) => {
                        for tc in tc_vec.iter() {
                            tc_processor::exec(&mut ds, tc);
                        }
                    }
                    // Exit if end of script reached
                    PendingTcs::EndOfScript => {
                        info!("End of TC script reached, stopping");
                        break
                    }
                }
        };

        // ---- CONTROL ALGORITHM PROCESSING ----

        // FlightCtrl processing
        match ds.flight_ctrl.proc(&ds.flight_ctrl_input) {
            Ok((o, r)) => {
                ds.flight_ctrl_output = o;
                ds.flight_ctrl_status_rpt = r;
            },
            Err(e) => {
                // FlightCtrl errors shouldn't bring the exec down, issue the
                // warning and continue with the zeroed output.
                warn!("Error during FlightCtrl processing: {}", e)
            }
        };

        // ---- DEMAND DISPATCH ----

        // Send the wrench to the physics host
        match phys_client.send_wrench(&ds.flight_ctrl_output) {
            Ok(PhysDemsResponse::DemsOk) => {
                // Reset the receive error counter
                ds.num_consec_phys_recv_errors = 0;
            },
            Ok(r) => warn!(
                "Received non-nominal response from the physics host: {:?}",
                r
            ),
            Err(PhysClientError::NotConnected) => {
                warn!("Connection to the physics host lost");
            }
            Err(PhysClientError::RecvError(_)) => {
                ds.num_consec_phys_recv_errors += 1;

                if ds.num_consec_phys_recv_errors > MAX_PHYS_RECV_ERROR_LIMIT {
                    raise_error!(
                        "Maximum number of physics host receive errors ({}) \
                        has been exceeded",
                        MAX_PHYS_RECV_ERROR_LIMIT
                    );
                }
            },
            Err(e) => warn!("PhysClient processing error: {}", e)
        }

        // ---- TELEMETRY ----

        match tm_server.send(&ds) {
            Ok(_) => (),
            Err(e) => warn!("TmServer error: {}", e)
        };

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S)
            .checked_sub(cycle_dur)
        {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            },
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64()
                        - Duration::from_secs_f64(CYCLE_PERIOD_S).as_secs_f64()
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    // Dump the final controller status into the session for tuning analysis
    session.save("flight_ctrl/final_status.json", ds.flight_ctrl_status_rpt);
    session.save("flight_ctrl/final_output.json", ds.flight_ctrl_output);

    info!("End of execution");

    session.exit();

    Ok(())
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Various sources for the telecommands incoming to the exec.
#[allow(dead_code)]
enum TcSource {
    None,
    Remote(TcServer),
    Script(ScriptInterpreter)
}
