//! Parsers for bytes notified by the device
//!
//! The Notification Source and the Data Source are independent streams
//! with different layouts, so each gets its own parser. Both are strict:
//! anything that fails here means the stream is corrupt or desynchronised,
//! never that more bytes are needed (callers read exact lengths first).

use crate::config::protocol::{ATTRIBUTE_HEADER_LEN, EVENT_MESSAGE_LEN, RESPONSE_HEADER_LEN};
use crate::error::AncsError;
use crate::protocol::types::{
    Category, CommandId, DecodeError, EventFlags, EventId, EventMessage, NotificationId,
    ProtocolError,
};

/// Parser for Notification Source event messages
pub struct EventParser;

impl EventParser {
    /// Create a new event parser
    pub fn new() -> Self {
        Self
    }

    /// Parse one event message
    ///
    /// Layout: `[event_id][event_flags][category_id][category_count][notification_id: u32 LE]`
    pub fn parse(&self, data: &[u8]) -> Result<EventMessage, DecodeError> {
        if data.len() < EVENT_MESSAGE_LEN {
            return Err(DecodeError::Truncated {
                needed: EVENT_MESSAGE_LEN,
                got: data.len(),
            });
        }

        let event_id = EventId::from_byte(data[0]).ok_or(DecodeError::InvalidEventId(data[0]))?;

        Ok(EventMessage {
            event_id,
            flags: EventFlags::from_bits_retain(data[1]),
            category: Category::from_id(data[2]),
            category_count: data[3],
            notification_id: u32::from_le_bytes([data[4], data[5], data[6], data[7]]),
        })
    }
}

impl Default for EventParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parser for Data Source attribute responses
///
/// A response echoes the command it answers, so every check takes the
/// identifiers of the outstanding request and refuses anything else.
pub struct ResponseParser;

impl ResponseParser {
    /// Create a new response parser
    pub fn new() -> Self {
        Self
    }

    /// Validate the echoed command id and notification id.
    ///
    /// Layout: `[command_id][notification_id: u32 LE]`
    pub fn check_response_header(
        &self,
        data: &[u8],
        expected_command: CommandId,
        expected_id: NotificationId,
    ) -> Result<(), AncsError> {
        if data.len() < RESPONSE_HEADER_LEN {
            return Err(DecodeError::Truncated {
                needed: RESPONSE_HEADER_LEN,
                got: data.len(),
            }
            .into());
        }

        if data[0] != expected_command as u8 {
            return Err(ProtocolError::CommandMismatch {
                expected: expected_command as u8,
                actual: data[0],
            }
            .into());
        }

        let actual_id = u32::from_le_bytes([data[1], data[2], data[3], data[4]]);
        if actual_id != expected_id {
            return Err(ProtocolError::NotificationMismatch {
                expected: expected_id,
                actual: actual_id,
            }
            .into());
        }

        Ok(())
    }

    /// Validate the echoed attribute id and extract the value length.
    ///
    /// Layout: `[attribute_id][length: u16 LE]`
    pub fn check_attribute_header(
        &self,
        data: &[u8],
        expected_attribute: u8,
    ) -> Result<u16, AncsError> {
        if data.len() < ATTRIBUTE_HEADER_LEN {
            return Err(DecodeError::Truncated {
                needed: ATTRIBUTE_HEADER_LEN,
                got: data.len(),
            }
            .into());
        }

        if data[0] != expected_attribute {
            return Err(ProtocolError::AttributeMismatch {
                expected: expected_attribute,
                actual: data[0],
            }
            .into());
        }

        Ok(u16::from_le_bytes([data[1], data[2]]))
    }

    /// Decode an attribute value as UTF-8 text
    pub fn decode_value<'a>(&self, data: &'a [u8]) -> Result<&'a str, DecodeError> {
        core::str::from_utf8(data).map_err(|_| DecodeError::InvalidUtf8)
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}
