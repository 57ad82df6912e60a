//! # Telecommand Server
//!
//! The TC server is the exec's end of the ground command link. Ground tools
//! (such as `tc_send`) connect with REQ sockets, the server binds a REP
//! socket, receives one TC per request and acknowledges it with a
//! [`TcResponse`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    net::{zmq, MonitoredSocket, SocketOptions, MonitoredSocketError},
    tc::{Tc, TcResponse}
};

use crate::params::FcExecParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Telecommand server
pub struct TcServer {
    socket: MonitoredSocket
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TcServerError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not send a response to the client: {0}")]
    SendError(zmq::Error),

    #[error("Could not receive a message from the client: {0}")]
    RecvError(zmq::Error),

    #[error("Could not serialize the response: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not parse the received telecommand: {0}")]
    TcParseError(comms_if::tc::TcParseError),

    #[error("The client sent a message which was not valid UTF-8")]
    NonUtf8Tc
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TcServer {

    /// Create a new instance of the TC server.
    ///
    /// This function will not block waiting for clients.
    pub fn new(ctx: &zmq::Context, params: &FcExecParams) -> Result<Self, TcServerError> {
        // Create the socket options
        let socket_options = SocketOptions {
            bind: true,
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

        // Bind the socket
        let socket = MonitoredSocket::new(
            ctx,
            zmq::REP,
            socket_options,
            &params.tc_endpoint
        ).map_err(TcServerError::SocketError)?;

        // Create self
        Ok(Self {
            socket
        })
    }

    /// Receive a single TC from a client.
    ///
    /// The protocol is to call this in a loop until `Ok(None)` is returned,
    /// indicating that there are no more pending TCs right now. After
    /// receiving a valid TC the caller must send a response using
    /// `.send_response()` before attempting to receive another TC. If the TC
    /// cannot be parsed the `Invalid` response is sent automatically by this
    /// function.
    pub fn receive_tc(&self) -> Result<Option<Tc>, TcServerError> {
        // Attempt to read a string from the socket
        let tc_str = match self.socket.recv_string(0) {
            // Valid message
            Ok(Ok(s)) => s,
            // Non UTF-8 message
            Ok(Err(_)) => {
                self.send_response(TcResponse::Invalid)?;

                return Err(TcServerError::NonUtf8Tc)
            },
            // No message in timeout
            Err(zmq::Error::EAGAIN) => return Ok(None),
            // Receive error, no response possible
            Err(e) => return Err(TcServerError::RecvError(e))
        };

        // Parse the TC
        Tc::from_json(&tc_str)
            .map_err(|e| {
                // Tell the client its TC was invalid
                self.send_response(TcResponse::Invalid).ok();

                TcServerError::TcParseError(e)
            })
            .map(Some)
    }

    /// Send the given response back to the client.
    ///
    /// This function must be called after receiving a TC.
    pub fn send_response(&self, response: TcResponse) -> Result<(), TcServerError> {
        // Serialise the response
        let response_str = serde_json::to_string(&response)
            .map_err(TcServerError::SerializationError)?;

        // Send the response
        self.socket.send(&response_str, 0)
            .map_err(TcServerError::SendError)
    }
}
