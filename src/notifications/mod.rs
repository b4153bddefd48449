//! Notification state: the entity and the registry that owns it

pub mod entity;
pub mod registry;

pub use entity::{AttributeValue, Notification};
pub use registry::{NewNotifications, NotificationRegistry, PendingEvents, Transition};
