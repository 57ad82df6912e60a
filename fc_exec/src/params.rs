//! Parameters structure for the flight control executable

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the executable itself: network endpoints and the body to
/// control.
#[derive(Debug, Clone, Deserialize)]
pub struct FcExecParams {

    // ---- NETWORK ----

    /// Endpoint the TC server binds to.
    pub tc_endpoint: String,

    /// Endpoint the TM server binds to.
    pub tm_endpoint: String,

    /// Endpoint of the physics host's state feed.
    pub phys_state_endpoint: String,

    /// Endpoint of the physics host's demands server.
    pub phys_dems_endpoint: String,

    // ---- BODY ----

    /// Name of the link to control. Must be resolvable against the physics
    /// host at initialisation, otherwise the exec aborts.
    pub link_name: String,

    /// How long to wait for the physics host to publish the properties of
    /// the controlled link before declaring it unresolvable.
    ///
    /// Units: seconds
    pub link_resolve_timeout_s: f64
}
