//! Serialiser for Control Point commands
//!
//! Builds command frames into fixed-capacity buffers and returns them by
//! value. Serialisation cannot fail: every input is a pre-validated
//! enumeration and the buffers are sized for the longest layout.

use crate::config::protocol::{
    APP_IDENTIFIER_MAX, EVENT_MESSAGE_LEN, GET_APP_ATTRIBUTES_MAX, GET_ATTRIBUTE_COMMAND_MAX,
    PERFORM_ACTION_LEN, TEXT_ATTRIBUTE_MAX_LENGTH,
};
use crate::protocol::types::{
    ActionId, AppAttribute, CommandId, EventMessage, NotificationAttribute, NotificationId,
};
use heapless::Vec;

/// Serialiser for Control Point command frames
pub struct CommandSerialiser;

impl CommandSerialiser {
    /// Create a new command serialiser
    pub fn new() -> Self {
        Self
    }

    /// Serialise a Get Notification Attributes command
    ///
    /// Frame format: `[0x00][notification_id: u32 LE][attribute_id]([max_length: u16 LE])`
    ///
    /// The `max_length` field is appended only for the free-text attributes,
    /// requesting up to 255 bytes.
    pub fn serialise_get_attribute(
        &self,
        id: NotificationId,
        attribute: NotificationAttribute,
    ) -> Vec<u8, GET_ATTRIBUTE_COMMAND_MAX> {
        let mut command: Vec<u8, GET_ATTRIBUTE_COMMAND_MAX> = Vec::new();

        let _ = command.push(CommandId::GetNotificationAttributes as u8);
        let _ = command.extend_from_slice(&id.to_le_bytes());
        let _ = command.push(attribute as u8);

        if attribute.is_length_bounded() {
            let _ = command.extend_from_slice(&TEXT_ATTRIBUTE_MAX_LENGTH.to_le_bytes());
        }

        command
    }

    /// Serialise a Perform Notification Action command
    ///
    /// Frame format: `[0x02][notification_id: u32 LE][action_id]`
    pub fn serialise_perform_action(
        &self,
        id: NotificationId,
        action: ActionId,
    ) -> [u8; PERFORM_ACTION_LEN] {
        let mut command = [0u8; PERFORM_ACTION_LEN];
        command[0] = CommandId::PerformNotificationAction as u8;
        command[1..5].copy_from_slice(&id.to_le_bytes());
        command[5] = action as u8;
        command
    }

    /// Serialise a Get App Attributes command for the display name
    ///
    /// Frame format: `[0x01][app_identifier][0x00][attribute_id]`
    ///
    /// The app identifier is NUL-terminated on the wire. Identifiers longer
    /// than [`APP_IDENTIFIER_MAX`] are truncated; Apple caps bundle ids well
    /// below that bound.
    pub fn serialise_get_app_attributes(&self, app_id: &str) -> Vec<u8, GET_APP_ATTRIBUTES_MAX> {
        let mut command: Vec<u8, GET_APP_ATTRIBUTES_MAX> = Vec::new();

        let bytes = app_id.as_bytes();
        let take = bytes.len().min(APP_IDENTIFIER_MAX);

        let _ = command.push(CommandId::GetAppAttributes as u8);
        let _ = command.extend_from_slice(&bytes[..take]);
        let _ = command.push(0x00);
        let _ = command.push(AppAttribute::DisplayName as u8);

        command
    }
}

impl Default for CommandSerialiser {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialise an event message (for building test streams and fixtures)
pub fn serialise_event(event: &EventMessage) -> [u8; EVENT_MESSAGE_LEN] {
    let mut data = [0u8; EVENT_MESSAGE_LEN];
    data[0] = event.event_id as u8;
    data[1] = event.flags.bits();
    data[2] = event.category.id();
    data[3] = event.category_count;
    data[4..8].copy_from_slice(&event.notification_id.to_le_bytes());
    data
}
