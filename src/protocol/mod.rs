//! Control RPC wire format between the controller and agents.
//!
//! Messages travel as one JSON object per line over a plain TCP connection.
//! The controller sends exactly one [`TransferRequest`] per call and the
//! agent answers with one [`TransferResponse`] before the connection is
//! dropped.
mod message;


pub use message::{
    ControlOperation, TransferRequest, TransferResponse, WireMessage, read_message, send_message,
};
