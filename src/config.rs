//! Protocol constants and capacity limits for the ANCS client

/// ANCS GATT identifiers
///
/// Fixed identifiers published by Apple; an iOS device only talks ANCS
/// over characteristics with exactly these UUIDs.
pub mod gatt {
    /// Apple Notification Center Service
    pub const SERVICE_UUID: u128 = 0x7905F431_B5CE_4E99_A40F_4B1E122D00D0;

    /// Notification Source characteristic (notify), carries event messages
    pub const NOTIFICATION_SOURCE_UUID: u128 = 0x9FBF120D_6301_42D9_8C58_25E699A21DBD;

    /// Control Point characteristic (write), accepts commands
    pub const CONTROL_POINT_UUID: u128 = 0x69D1D8F3_45E1_49A8_9821_9BBDFDAAD9D9;

    /// Data Source characteristic (notify), carries attribute responses
    pub const DATA_SOURCE_UUID: u128 = 0x22EAC6E9_24D6_4BB5_BE44_B36ACE7C7BFB;

    /// Service solicitation list for advertising payloads, little-endian.
    /// iOS initiates the ANCS exchange only towards peripherals that
    /// solicit the service.
    pub const SOLICITED_SERVICES: [[u8; 16]; 1] = [SERVICE_UUID.to_le_bytes()];

    /// Suggested Notification Source buffer size (100 events)
    pub const NOTIFICATION_SOURCE_BUFFER: usize = 8 * 100;

    /// Suggested Data Source buffer size
    pub const DATA_SOURCE_BUFFER: usize = 1024;
}

/// Wire-format sizes and bounds
pub mod protocol {
    /// Size of one Notification Source event message
    pub const EVENT_MESSAGE_LEN: usize = 8;

    /// Command id plus notification id header echoed by the Data Source
    pub const RESPONSE_HEADER_LEN: usize = 5;

    /// Attribute id plus value length header
    pub const ATTRIBUTE_HEADER_LEN: usize = 3;

    /// Longest Get Notification Attributes command (with a max length field)
    pub const GET_ATTRIBUTE_COMMAND_MAX: usize = 8;

    /// Size of a Perform Notification Action command
    pub const PERFORM_ACTION_LEN: usize = 6;

    /// Max length requested for the free-text attributes
    pub const TEXT_ATTRIBUTE_MAX_LENGTH: u16 = 255;

    /// Storage bound for one attribute value
    pub const ATTRIBUTE_VALUE_MAX: usize = 255;

    /// Number of notification attribute kinds
    pub const ATTRIBUTE_KINDS: usize = 8;

    /// Longest app identifier accepted in app-attribute exchanges.
    /// Apple caps bundle identifiers at 155 bytes.
    pub const APP_IDENTIFIER_MAX: usize = 160;

    /// Longest Get App Attributes command
    pub const GET_APP_ATTRIBUTES_MAX: usize = APP_IDENTIFIER_MAX + 3;
}

/// Capacity limits
pub mod limits {
    /// Maximum tracked notifications (must be a power of two)
    pub const MAX_ACTIVE_NOTIFICATIONS: usize = 16;
}

/// Default timing
pub mod defaults {
    use embassy_time::Duration;

    /// Wait bound on the Data Source during an attribute fetch
    pub const ATTRIBUTE_TIMEOUT: Duration = Duration::from_millis(1_000);
}
