//! ANCS wire protocol
//!
//! Split by direction: `parser` decodes bytes notified by the device,
//! `serialiser` encodes commands for the Control Point, and `types` holds
//! the message and field definitions shared by both.

pub mod parser;
pub mod serialiser;
pub mod types;

pub use parser::{EventParser, ResponseParser};
pub use serialiser::CommandSerialiser;
pub use types::{
    ActionId, AppAttribute, Category, CommandId, DecodeError, EventFlags, EventId, EventMessage,
    NotificationAttribute, NotificationId, ProtocolError,
};
