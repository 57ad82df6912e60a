//! # TC sender
//!
//! Small ground-side console tool which builds a single telecommand from
//! command line arguments and sends it to the flight exec's TC endpoint,
//! printing the response.
//!
//! Example:
//!
//! ```text
//! tc_send pos 0.0 0.0 2.0 0.0 0.0 0.0
//! tc_send tune 3 2.0 0.1 0.01 0.05
//! tc_send shutdown
//! ```

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use structopt::StructOpt;

use comms_if::net::{zmq, MonitoredSocket, SocketOptions};
use comms_if::tc::{flight_ctrl::FlightCmd, Tc, TcResponse};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Send a single telecommand to the flight exec.
#[derive(Debug, StructOpt)]
#[structopt(name = "tc_send")]
struct Opts {
    /// The exec's TC endpoint.
    #[structopt(long, default_value = "tcp://localhost:5020")]
    endpoint: String,

    /// The command to send.
    #[structopt(subcommand)]
    cmd: FlightCmd
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn main() {
    let opts = Opts::from_args();

    // Build the TC from the command
    let tc: Tc = opts.cmd.into();
    let tc_json = match tc.to_json() {
        Ok(j) => j,
        Err(e) => {
            eprintln!("Could not serialise the TC: {}", e);
            std::process::exit(1);
        }
    };

    // Connect to the exec
    let socket_options = SocketOptions {
        connect_timeout: 1000,
        recv_timeout: 1000,
        send_timeout: 1000,
        linger: 1,
        req_correlate: true,
        req_relaxed: true,
        ..Default::default()
    };

    let ctx = zmq::Context::new();
    let socket = match MonitoredSocket::new(&ctx, zmq::REQ, socket_options, &opts.endpoint) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Could not connect to the exec at {}: {}", opts.endpoint, e);
            std::process::exit(1);
        }
    };

    // Send the TC and wait for the response
    if let Err(e) = socket.send(&tc_json, 0) {
        eprintln!("Could not send the TC: {}", e);
        std::process::exit(1);
    }

    match socket.recv_string(0) {
        Ok(Ok(s)) => match serde_json::from_str::<TcResponse>(&s) {
            Ok(r) => println!("{:?}", r),
            Err(e) => eprintln!("Could not parse the exec's response: {}", e)
        },
        Ok(Err(_)) => eprintln!("The exec sent a non UTF-8 response"),
        Err(e) => eprintln!("No response from the exec: {}", e)
    }
}
