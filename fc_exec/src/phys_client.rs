//! # Physics Client
//!
//! The PhysClient connects the flight software to the physics/simulation
//! host. Two links exist:
//!
//! - a subscription to the host's state feed, on which the host publishes
//!   rigid-body states, odometry and IMU samples, and body properties. The
//!   feed is consumed on a background thread into latest-value cells.
//! - a request socket over which wrench demands are sent each cycle, one
//!   request per cycle with an acknowledgement response.
//!
//! The wrench demand applies the force at the link origin, so the torque is
//! corrected here for the lever arm between the link origin and the body's
//! centre of gravity before being sent.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{Arc, Mutex, atomic::{AtomicBool, Ordering}},
    thread,
    time::{Duration, Instant}};

use log::{error, warn};
use nalgebra::Vector3;

use comms_if::{
    eqpt::phys::{
        BodyProps, ImuSample, OdomSample, PhysData, PhysDemsResponse,
        RigidBodyState, WrenchDems},
    net::{zmq, MonitoredSocket, MonitoredSocketError, SocketOptions}
};

use crate::flight_ctrl::OutputData;
use crate::params::FcExecParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct PhysClient {
    dems_socket: MonitoredSocket,

    bg_run: Arc<AtomicBool>,

    body_state: Arc<Mutex<Option<RigidBodyState>>>,
    odom: Arc<Mutex<Option<OdomSample>>>,
    imu: Arc<Mutex<Option<ImuSample>>>,
    body_props: Arc<Mutex<Option<BodyProps>>>,

    /// Name of the controlled link.
    link_name: String,

    /// Centre of gravity offset of the resolved link, available after
    /// `wait_for_body_props` has succeeded.
    cog_m: Option<[f64; 3]>
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PhysClientError {

    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("The client is not connected to the physics host")]
    NotConnected,

    #[error("Could not send demands to the physics host: {0}")]
    SendError(zmq::Error),

    #[error("Could not subscribe to the physics host's state feed: {0}")]
    SubscribeError(zmq::Error),

    #[error("Could not receive a message from the physics host: {0}")]
    RecvError(zmq::Error),

    #[error("Could not serialize the data: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not deserialize the response from the physics host: {0}")]
    DeserializeError(serde_json::Error),

    #[error(
        "The physics host did not publish properties for link \"{0}\" within \
        the timeout, the link cannot be resolved"
    )]
    LinkNotResolved(String)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PhysClient {
    /// Create a new instance of the physics client.
    ///
    /// The state feed subscription starts immediately on a background
    /// thread. Only messages for the link named in the parameters are kept.
    pub fn new(ctx: &zmq::Context, params: &FcExecParams) -> Result<Self, PhysClientError> {
        // Create the socket options
        let state_socket_options = SocketOptions {
            block_on_first_connect: false,
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: 10,
            send_timeout: 10,
            ..Default::default()
        };
        let dems_socket_options = SocketOptions {
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: 10,
            send_timeout: 10,
            req_correlate: true,
            req_relaxed: true,
            ..Default::default()
        };

        // Connect the sockets
        let state_socket = MonitoredSocket::new(
            ctx,
            zmq::SUB,
            state_socket_options,
            &params.phys_state_endpoint
        ).map_err(PhysClientError::SocketError)?;

        state_socket.set_subscribe(&[])
            .map_err(PhysClientError::SubscribeError)?;

        let dems_socket = MonitoredSocket::new(
            ctx,
            zmq::REQ,
            dems_socket_options,
            &params.phys_dems_endpoint
        ).map_err(PhysClientError::SocketError)?;

        // Create the shared cells
        let bg_run = Arc::new(AtomicBool::new(true));
        let body_state = Arc::new(Mutex::new(None));
        let odom = Arc::new(Mutex::new(None));
        let imu = Arc::new(Mutex::new(None));
        let body_props = Arc::new(Mutex::new(None));

        // Start the feed thread
        {
            let bg_run = bg_run.clone();
            let body_state = body_state.clone();
            let odom = odom.clone();
            let imu = imu.clone();
            let body_props = body_props.clone();
            let link_name = params.link_name.clone();

            thread::spawn(move || bg_thread(
                state_socket,
                bg_run,
                link_name,
                body_state,
                odom,
                imu,
                body_props
            ));
        }

        Ok(Self {
            dems_socket,
            bg_run,
            body_state,
            odom,
            imu,
            body_props,
            link_name: params.link_name.clone(),
            cog_m: None
        })
    }

    /// Block until the physics host has published the properties of the
    /// controlled link, or the timeout expires.
    ///
    /// Failure here means the configured link does not exist on the host,
    /// which is fatal: the controller must not run against an unresolved
    /// body.
    pub fn wait_for_body_props(&mut self, timeout_s: f64)
        -> Result<BodyProps, PhysClientError>
    {
        let start = Instant::now();

        loop {
            {
                let props = self.body_props.lock()
                    .expect("PhysClient: body_props mutex poisoned");

                if let Some(ref p) = *props {
                    self.cog_m = Some(p.cog_m);
                    return Ok(p.clone())
                }
            }

            if start.elapsed().as_secs_f64() > timeout_s {
                return Err(PhysClientError::LinkNotResolved(self.link_name.clone()))
            }

            thread::sleep(Duration::from_millis(10));
        }
    }

    /// Get the latest published state of the controlled body.
    pub fn body_state(&self) -> Option<RigidBodyState> {
        self.body_state.lock()
            .expect("PhysClient: body_state mutex poisoned")
            .clone()
    }

    /// Take the latest odometry sample, if a new one has arrived.
    ///
    /// Samples are consumed so that the finite-difference acceleration
    /// estimate never sees the same stamped sample twice.
    pub fn take_odom(&self) -> Option<OdomSample> {
        self.odom.lock()
            .expect("PhysClient: odom mutex poisoned")
            .take()
    }

    /// Take the latest IMU sample, if a new one has arrived.
    pub fn take_imu(&self) -> Option<ImuSample> {
        self.imu.lock()
            .expect("PhysClient: imu mutex poisoned")
            .take()
    }

    /// Send the wrench from the given control output to the physics host.
    ///
    /// The torque is corrected for the centre-of-gravity lever arm before
    /// sending.
    pub fn send_wrench(&mut self, output: &OutputData)
        -> Result<PhysDemsResponse, PhysClientError>
    {
        // If not connected return now
        if !self.dems_socket.connected() {
            return Err(PhysClientError::NotConnected)
        }

        let cog_m = self.cog_m.unwrap_or([0.0; 3]);
        let dems = make_wrench_dems(&output.force_n, &output.torque_nm, &cog_m);

        // Serialize the demands
        let dems_str = serde_json::to_string(&dems)
            .map_err(PhysClientError::SerializationError)?;

        // Send the demands to the host
        self.dems_socket.send(&dems_str, 0)
            .map_err(PhysClientError::SendError)?;

        // Receive response back from the host
        let msg = self.dems_socket.recv_msg(0);

        match msg {
            Ok(m) => {
                serde_json::from_str(m.as_str().unwrap_or(""))
                    .map_err(PhysClientError::DeserializeError)
            },
            Err(e) => {
                Err(PhysClientError::RecvError(e))
            }
        }
    }
}

impl Drop for PhysClient {
    fn drop(&mut self) {
        self.bg_run.store(false, Ordering::Relaxed);
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build the wrench demand for the physics host.
///
/// The controller computes its torque about the centre of gravity, while the
/// host applies the force at the link origin. The applied relative torque is
/// therefore `torque - cog x force`, correcting for the lever arm between
/// the two points.
pub fn make_wrench_dems(
    force_n: &[f64; 3],
    torque_nm: &[f64; 3],
    cog_m: &[f64; 3]
) -> WrenchDems {
    let force = Vector3::from(*force_n);
    let torque = Vector3::from(*torque_nm);
    let cog = Vector3::from(*cog_m);

    WrenchDems {
        force_n: *force_n,
        torque_nm: (torque - cog.cross(&force)).into()
    }
}

/// Background thread, updates the cells when the host publishes something
/// new.
fn bg_thread(
    socket: MonitoredSocket,
    run: Arc<AtomicBool>,
    link_name: String,
    body_state: Arc<Mutex<Option<RigidBodyState>>>,
    odom: Arc<Mutex<Option<OdomSample>>>,
    imu: Arc<Mutex<Option<ImuSample>>>,
    body_props: Arc<Mutex<Option<BodyProps>>>
) {

    // While instructed to run
    while run.load(Ordering::Relaxed) {
        // Read string from the socket
        let msg = match socket.recv_string(0) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => {
                warn!("Non UTF-8 message from the physics host");
                continue
            },
            Err(zmq::Error::EAGAIN) => continue,
            Err(e) => {
                error!("Error receiving message from the physics host: {:?}", e);
                break
            }
        };

        // Deserialize the message
        let data: PhysData = match serde_json::from_str(&msg) {
            Ok(d) => d,
            Err(e) => {
                warn!("Error deserialising message from the physics host: {:?}", e);
                continue
            }
        };

        // Parse the data and set the cells, keeping only messages for the
        // controlled link
        match data {
            PhysData::RigidBody(state) => {
                if state.link_name == link_name {
                    *body_state.lock()
                        .expect("PhysClient: body_state mutex poisoned") = Some(state);
                }
            },
            PhysData::Odom(sample) => {
                *odom.lock()
                    .expect("PhysClient: odom mutex poisoned") = Some(sample);
            },
            PhysData::Imu(sample) => {
                *imu.lock()
                    .expect("PhysClient: imu mutex poisoned") = Some(sample);
            },
            PhysData::BodyProps(props) => {
                if props.link_name == link_name {
                    *body_props.lock()
                        .expect("PhysClient: body_props mutex poisoned") = Some(props);
                }
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_wrench_cog_correction() {
        let force = [0.0, 0.0, 12.0];
        let torque = [0.5, -0.2, 0.1];
        let cog = [0.05, -0.02, 0.0];

        let dems = make_wrench_dems(&force, &torque, &cog);

        // The applied torque differs from the raw controller torque by
        // exactly -(cog x force)
        let cog_v = Vector3::from(cog);
        let force_v = Vector3::from(force);
        let expected = Vector3::from(torque) - cog_v.cross(&force_v);

        assert_eq!(dems.force_n, force);
        for i in 0..3 {
            assert!((dems.torque_nm[i] - expected[i]).abs() < 1e-15);
        }

        // And concretely, the lever arm shows up about X and Y
        assert!((dems.torque_nm[0] - (0.5 - (-0.02 * 12.0))).abs() < 1e-12);
        assert!((dems.torque_nm[1] - (-0.2 + 0.05 * 12.0)).abs() < 1e-12);
    }

    #[test]
    fn test_wrench_no_cog_no_correction() {
        let dems = make_wrench_dems(&[1.0, 2.0, 3.0], &[0.1, 0.2, 0.3], &[0.0; 3]);

        assert_eq!(dems.torque_nm, [0.1, 0.2, 0.3]);
    }
}
