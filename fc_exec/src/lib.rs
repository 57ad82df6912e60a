//! # Kestrel flight control library
//!
//! This library holds the modules making up the flight control executable:
//!
//! - [`flight_ctrl`]: the cascaded PID flight controller
//! - [`state_est`]: the vehicle state cache and measurement-source policy
//! - [`phys_client`]: the client talking to the physics/simulation host
//! - [`tc_server`]: the telecommand server
//! - [`tm_server`]: the telemetry server
//! - [`data_store`]: the exec's global data store

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod data_store;
pub mod flight_ctrl;
pub mod params;
pub mod phys_client;
pub mod state_est;
pub mod tc_server;
pub mod tm_server;
