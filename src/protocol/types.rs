//! Message and field types for the ANCS wire protocol
//!
//! # Message Formats
//!
//! All multi-byte integers are little-endian.
//!
//! Event message, published by the Notification Source (8 bytes):
//! ```text
//! [event_id: u8][event_flags: u8][category_id: u8][category_count: u8][notification_id: u32 LE]
//! ```
//!
//! Get Notification Attributes command, written to the Control Point:
//! ```text
//! [0x00][notification_id: u32 LE][attribute_id: u8]([max_length: u16 LE])
//! ```
//! The `max_length` field is present only for the free-text attributes
//! (title, subtitle, message).
//!
//! Attribute response, published by the Data Source:
//! ```text
//! [0x00][notification_id: u32 LE][attribute_id: u8][length: u16 LE][value: [u8; length]]
//! ```
//! The value is UTF-8 text.
//!
//! Perform Notification Action command (6 bytes):
//! ```text
//! [0x02][notification_id: u32 LE][action_id: u8]
//! ```

use bitflags::bitflags;
use thiserror::Error;

/// Identifier a paired device assigns to one notification.
///
/// Unique among the currently active notifications; the device may reuse
/// the id of a removed notification later.
pub type NotificationId = u32;

/// Event kinds delivered by the Notification Source
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventId {
    /// A notification appeared (0x00)
    Added = 0x00,

    /// An existing notification changed its content (0x01)
    Modified = 0x01,

    /// A notification was cleared on the device (0x02)
    Removed = 0x02,
}

impl EventId {
    /// Try to convert a byte to an EventId
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Added),
            0x01 => Some(Self::Modified),
            0x02 => Some(Self::Removed),
            _ => None,
        }
    }
}

bitflags! {
    /// Event-flags field of an event message
    ///
    /// Bits 5-7 are reserved by Apple. They are retained as received so
    /// messages re-encode bit-exact.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EventFlags: u8 {
        /// Arrived without sound or vibration
        const SILENT = 1 << 0;
        /// Marked important by the device
        const IMPORTANT = 1 << 1;
        /// Existed before this connection was established
        const PREEXISTING = 1 << 2;
        /// A positive action is available, e.g. answer
        const POSITIVE_ACTION = 1 << 3;
        /// A negative action is available, e.g. decline
        const NEGATIVE_ACTION = 1 << 4;
    }
}

/// Notification category
///
/// Thirteen categories are published by Apple. Any other id is carried
/// through as [`Category::Reserved`] with its raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Anything without a more specific category (0)
    Other,
    /// Ringing call (1)
    IncomingCall,
    /// Call that was not answered (2)
    MissedCall,
    /// New voicemail (3)
    Voicemail,
    /// Social network activity (4)
    Social,
    /// Calendar and reminders (5)
    Schedule,
    /// New mail (6)
    Email,
    /// News updates (7)
    News,
    /// Health and fitness updates (8)
    HealthAndFitness,
    /// Business and finance updates (9)
    BusinessAndFinance,
    /// Location events (10)
    Location,
    /// Entertainment updates (11)
    Entertainment,
    /// Call in progress (12)
    ActiveCall,
    /// Category id outside the published range
    Reserved(u8),
}

impl Category {
    /// Map a raw category id
    pub fn from_id(id: u8) -> Self {
        match id {
            0 => Self::Other,
            1 => Self::IncomingCall,
            2 => Self::MissedCall,
            3 => Self::Voicemail,
            4 => Self::Social,
            5 => Self::Schedule,
            6 => Self::Email,
            7 => Self::News,
            8 => Self::HealthAndFitness,
            9 => Self::BusinessAndFinance,
            10 => Self::Location,
            11 => Self::Entertainment,
            12 => Self::ActiveCall,
            other => Self::Reserved(other),
        }
    }

    /// Raw wire id
    pub fn id(&self) -> u8 {
        match self {
            Self::Other => 0,
            Self::IncomingCall => 1,
            Self::MissedCall => 2,
            Self::Voicemail => 3,
            Self::Social => 4,
            Self::Schedule => 5,
            Self::Email => 6,
            Self::News => 7,
            Self::HealthAndFitness => 8,
            Self::BusinessAndFinance => 9,
            Self::Location => 10,
            Self::Entertainment => 11,
            Self::ActiveCall => 12,
            Self::Reserved(id) => *id,
        }
    }

    /// Display name, `"Reserved"` for ids outside the published range
    pub fn name(&self) -> &'static str {
        match self {
            Self::Other => "Other",
            Self::IncomingCall => "IncomingCall",
            Self::MissedCall => "MissedCall",
            Self::Voicemail => "Voicemail",
            Self::Social => "Social",
            Self::Schedule => "Schedule",
            Self::Email => "Email",
            Self::News => "News",
            Self::HealthAndFitness => "HealthAndFitness",
            Self::BusinessAndFinance => "BusinessAndFinance",
            Self::Location => "Location",
            Self::Entertainment => "Entertainment",
            Self::ActiveCall => "ActiveCall",
            Self::Reserved(_) => "Reserved",
        }
    }
}

/// Attribute kinds fetchable for one notification
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAttribute {
    /// Bundle id of the posting app, e.g. `com.apple.mobilephone` (0x00)
    AppIdentifier = 0x00,

    /// Title line (0x01)
    Title = 0x01,

    /// Subtitle line (0x02)
    Subtitle = 0x02,

    /// Message body (0x03)
    Message = 0x03,

    /// Total size of the message as decimal text (0x04)
    MessageSize = 0x04,

    /// Timestamp in `yyyyMMdd'T'HHmmSS` form (0x05)
    Date = 0x05,

    /// Label of the positive action (0x06)
    PositiveActionLabel = 0x06,

    /// Label of the negative action (0x07)
    NegativeActionLabel = 0x07,
}

impl NotificationAttribute {
    /// Try to convert a byte to a NotificationAttribute
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::AppIdentifier),
            0x01 => Some(Self::Title),
            0x02 => Some(Self::Subtitle),
            0x03 => Some(Self::Message),
            0x04 => Some(Self::MessageSize),
            0x05 => Some(Self::Date),
            0x06 => Some(Self::PositiveActionLabel),
            0x07 => Some(Self::NegativeActionLabel),
            _ => None,
        }
    }

    /// Whether a request for this attribute carries a `max_length` field.
    ///
    /// Apple requires one for the free-text attributes and rejects it on
    /// the fixed-form ones.
    pub fn is_length_bounded(&self) -> bool {
        matches!(self, Self::Title | Self::Subtitle | Self::Message)
    }
}

/// Attribute kinds fetchable for an app
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAttribute {
    /// Localized display name of the app (0x00)
    DisplayName = 0x00,
}

/// Control Point command ids
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandId {
    /// Fetch attributes of one notification (0x00)
    GetNotificationAttributes = 0x00,

    /// Fetch attributes of an app by bundle id (0x01)
    GetAppAttributes = 0x01,

    /// Perform an action on one notification (0x02)
    PerformNotificationAction = 0x02,
}

impl CommandId {
    /// Try to convert a byte to a CommandId
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::GetNotificationAttributes),
            0x01 => Some(Self::GetAppAttributes),
            0x02 => Some(Self::PerformNotificationAction),
            _ => None,
        }
    }
}

/// Action polarity for a Perform Notification Action command
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionId {
    /// Accept, answer or open (0x00)
    Positive = 0x00,

    /// Dismiss, decline or hang up (0x01)
    Negative = 0x01,
}

/// One decoded Notification Source event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventMessage {
    /// What happened
    pub event_id: EventId,
    /// Flag bits, reserved bits included
    pub flags: EventFlags,
    /// Category of the affected notification
    pub category: Category,
    /// Number of active notifications in that category
    pub category_count: u8,
    /// Id of the affected notification
    pub notification_id: NotificationId,
}

/// Structurally malformed bytes
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Fewer bytes than the fixed layout requires
    #[error("truncated message: needed {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },

    /// Event id outside the published range
    #[error("unknown event id {0:#04x}")]
    InvalidEventId(u8),

    /// Attribute value bytes are not valid UTF-8
    #[error("attribute value is not valid UTF-8")]
    InvalidUtf8,

    /// Declared value length exceeds the storage bound
    #[error("attribute value of {length} bytes exceeds the storage bound")]
    OversizedValue {
        /// Length declared in the attribute header
        length: u16,
    },
}

/// Well-formed response that does not match the outstanding request.
///
/// Any of these means the Data Source stream is desynchronised and the
/// connection should be considered unreliable.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Response echoes a different command id
    #[error("response echoes command {actual:#04x}, expected {expected:#04x}")]
    CommandMismatch { expected: u8, actual: u8 },

    /// Response echoes a different notification id
    #[error("response echoes notification {actual}, expected {expected}")]
    NotificationMismatch {
        expected: NotificationId,
        actual: NotificationId,
    },

    /// Response carries a different attribute id
    #[error("response carries attribute {actual:#04x}, expected {expected:#04x}")]
    AttributeMismatch { expected: u8, actual: u8 },
}
