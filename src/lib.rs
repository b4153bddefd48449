//! Client side of the Apple Notification Center Service (ANCS) over BLE.
//!
//! The engine is transport-agnostic: bind the three ANCS characteristics
//! (Notification Source, Control Point, Data Source) through the
//! [`transport`] traits and drive an [`AncsClient`] from a single task.
//! GATT identifiers and advertising data for the binding live in
//! [`config::gatt`].

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod error;
pub mod fetcher;
pub mod notifications;
pub mod protocol;
pub mod service;
pub mod transport;

pub use error::AncsError;
pub use fetcher::AttributeFetcher;
pub use notifications::{
    AttributeValue, NewNotifications, Notification, NotificationRegistry, PendingEvents,
    Transition,
};
pub use protocol::{
    ActionId, AppAttribute, Category, EventFlags, EventId, EventMessage, NotificationAttribute,
    NotificationId,
};
pub use service::AncsClient;
pub use transport::{ByteSink, ByteSource, TransportError};
