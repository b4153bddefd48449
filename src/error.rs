//! Unified error type for engine operations

use crate::protocol::types::{DecodeError, NotificationId, ProtocolError};
use crate::transport::TransportError;
use thiserror::Error;

/// Any failure surfaced by the ANCS engine
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AncsError {
    /// Malformed bytes arrived from the device
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// A response does not match the outstanding request
    #[error("protocol desynchronised: {0}")]
    Protocol(#[from] ProtocolError),

    /// The underlying stream failed
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The bounded wait on the Data Source expired
    #[error("timed out waiting for the data source")]
    Timeout,

    /// Operation on a notification already cleared on the device
    #[error("notification {0} was removed")]
    StaleNotification(NotificationId),

    /// Operation on an id the registry does not hold
    #[error("notification {0} is not active")]
    UnknownNotification(NotificationId),

    /// Writing to the caller's formatter failed
    #[error("formatting failed")]
    Format,
}

impl From<core::fmt::Error> for AncsError {
    fn from(_: core::fmt::Error) -> Self {
        Self::Format
    }
}
