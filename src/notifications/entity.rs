//! Notification entity
//!
//! One notification on the paired device: identity, classification,
//! derived flags and the lazily filled attribute cache. Entities are
//! created and retired by the registry; attribute values are filled in
//! by the fetcher on demand.

use crate::config::protocol::{ATTRIBUTE_KINDS, ATTRIBUTE_VALUE_MAX};
use crate::error::AncsError;
use crate::protocol::serialiser::CommandSerialiser;
use crate::protocol::types::{
    ActionId, Category, EventFlags, NotificationAttribute, NotificationId,
};
use crate::transport::ByteSink;
use heapless::{LinearMap, String};

/// One fetched attribute value
pub type AttributeValue = String<ATTRIBUTE_VALUE_MAX>;

/// Flag summary labels, in bit order
static FLAG_LABELS: [(EventFlags, &str); 5] = [
    (EventFlags::SILENT, "silent"),
    (EventFlags::IMPORTANT, "important"),
    (EventFlags::PREEXISTING, "preexisting"),
    (EventFlags::POSITIVE_ACTION, "positive_action"),
    (EventFlags::NEGATIVE_ACTION, "negative_action"),
];

/// One notification in the device's notification center
#[derive(Debug, Clone)]
pub struct Notification {
    id: NotificationId,
    category: Category,
    category_count: u8,
    flags: EventFlags,
    removed: bool,
    cache: LinearMap<NotificationAttribute, AttributeValue, ATTRIBUTE_KINDS>,
}

impl Notification {
    /// Create an entity from the fields of an Added event
    pub fn new(
        id: NotificationId,
        flags: EventFlags,
        category: Category,
        category_count: u8,
    ) -> Self {
        Self {
            id,
            category,
            category_count,
            flags,
            removed: false,
            cache: LinearMap::new(),
        }
    }

    /// Identifier assigned by the device
    pub fn id(&self) -> NotificationId {
        self.id
    }

    /// Classification category
    pub fn category(&self) -> Category {
        self.category
    }

    /// Number of active notifications in the same category
    pub fn category_count(&self) -> u8 {
        self.category_count
    }

    /// Raw event flags, reserved bits included
    pub fn flags(&self) -> EventFlags {
        self.flags
    }

    /// True once the device reported this notification cleared.
    ///
    /// A stale entity refuses attribute fetches and actions.
    pub fn removed(&self) -> bool {
        self.removed
    }

    /// Arrived without sound or vibration
    pub fn silent(&self) -> bool {
        self.flags.contains(EventFlags::SILENT)
    }

    /// Marked important by the device
    pub fn important(&self) -> bool {
        self.flags.contains(EventFlags::IMPORTANT)
    }

    /// Existed before this connection was established
    pub fn preexisting(&self) -> bool {
        self.flags.contains(EventFlags::PREEXISTING)
    }

    /// A positive action can be sent back, e.g. answering a call
    pub fn has_positive_action(&self) -> bool {
        self.flags.contains(EventFlags::POSITIVE_ACTION)
    }

    /// A negative action can be sent back, e.g. declining a call
    pub fn has_negative_action(&self) -> bool {
        self.flags.contains(EventFlags::NEGATIVE_ACTION)
    }

    /// Apply the fields of a Modified event.
    ///
    /// The attribute cache is cleared: the same id now carries new content
    /// and previously fetched values no longer describe it.
    pub fn apply_event(&mut self, flags: EventFlags, category: Category, category_count: u8) {
        self.flags = flags;
        self.category = category;
        self.category_count = category_count;
        self.cache.clear();
    }

    pub(crate) fn mark_removed(&mut self) {
        self.removed = true;
    }

    /// Cached value of an attribute, if it has been fetched
    pub fn cached(&self, attribute: NotificationAttribute) -> Option<&str> {
        self.cache.get(&attribute).map(|value| value.as_str())
    }

    /// Whether an attribute has been fetched since the last content change
    pub fn is_cached(&self, attribute: NotificationAttribute) -> bool {
        self.cache.contains_key(&attribute)
    }

    pub(crate) fn insert_cached(
        &mut self,
        attribute: NotificationAttribute,
        value: AttributeValue,
    ) {
        let _ = self.cache.insert(attribute, value);
    }

    /// Labels of the flags currently set, in bit order
    pub fn flag_labels(&self) -> impl Iterator<Item = &'static str> {
        let flags = self.flags;
        FLAG_LABELS
            .iter()
            .filter(move |(flag, _)| flags.contains(*flag))
            .map(|(_, label)| *label)
    }

    /// Send an action for this notification over the Control Point.
    ///
    /// Fire and forget: ANCS acknowledges actions with no response. Stale
    /// entities are refused before any bytes are written.
    pub async fn send_action<C: ByteSink>(
        &self,
        action: ActionId,
        control_point: &mut C,
    ) -> Result<(), AncsError> {
        if self.removed {
            return Err(AncsError::StaleNotification(self.id));
        }

        let command = CommandSerialiser::new().serialise_perform_action(self.id, action);
        control_point.write_all(&command).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockStream;

    fn call_notification() -> Notification {
        Notification::new(
            42,
            EventFlags::SILENT | EventFlags::POSITIVE_ACTION | EventFlags::NEGATIVE_ACTION,
            Category::IncomingCall,
            3,
        )
    }

    #[test]
    fn test_flag_accessors() {
        let notification = call_notification();

        assert_eq!(notification.id(), 42);
        assert_eq!(notification.category(), Category::IncomingCall);
        assert_eq!(notification.category_count(), 3);
        assert!(notification.silent());
        assert!(!notification.important());
        assert!(!notification.preexisting());
        assert!(notification.has_positive_action());
        assert!(notification.has_negative_action());
        assert!(!notification.removed());
    }

    #[test]
    fn test_flag_labels_in_bit_order() {
        let notification = call_notification();

        let labels: heapless::Vec<&str, 5> = notification.flag_labels().collect();
        assert_eq!(
            labels.as_slice(),
            &["silent", "positive_action", "negative_action"]
        );
    }

    #[test]
    fn test_apply_event_clears_cache() {
        let mut notification = call_notification();
        let mut title = AttributeValue::new();
        let _ = title.push_str("Mum");
        notification.insert_cached(NotificationAttribute::Title, title);

        assert!(notification.is_cached(NotificationAttribute::Title));
        assert_eq!(notification.cached(NotificationAttribute::Title), Some("Mum"));

        notification.apply_event(EventFlags::IMPORTANT, Category::MissedCall, 1);

        assert!(!notification.is_cached(NotificationAttribute::Title));
        assert_eq!(notification.cached(NotificationAttribute::Title), None);
        assert_eq!(notification.category(), Category::MissedCall);
        assert!(notification.important());
        assert!(!notification.silent());
    }

    #[test]
    fn test_send_positive_action_writes_command() {
        let notification = call_notification();
        let mut control_point = MockStream::new();

        futures::executor::block_on(async {
            notification
                .send_action(ActionId::Positive, &mut control_point)
                .await
                .expect("Should send");
        });

        assert_eq!(
            control_point.written().as_slice(),
            &[0x02, 0x2A, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_send_action_refused_when_removed() {
        let mut notification = call_notification();
        notification.mark_removed();
        let mut control_point = MockStream::new();

        futures::executor::block_on(async {
            let result = notification
                .send_action(ActionId::Negative, &mut control_point)
                .await;
            assert_eq!(result, Err(AncsError::StaleNotification(42)));
        });

        // Nothing reaches the wire for a stale entity
        assert!(control_point.written().is_empty());
    }
}
