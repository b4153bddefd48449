//! Notification registry and event drain
//!
//! The registry owns the live set of notifications keyed by id and applies
//! Notification Source events to it as explicit transitions. Draining is a
//! non-blocking poll over the buffered stream: it consumes whole event
//! messages that have already arrived and never suspends waiting for more.

use crate::config::limits::MAX_ACTIVE_NOTIFICATIONS;
use crate::config::protocol::EVENT_MESSAGE_LEN;
use crate::error::AncsError;
use crate::notifications::entity::Notification;
use crate::protocol::parser::EventParser;
use crate::protocol::types::{DecodeError, EventId, EventMessage, NotificationId};
use crate::transport::ByteSource;
use embassy_time::{Duration, Instant};
use heapless::FnvIndexMap;
use log::{debug, warn};

/// Outcome of applying one event message to the registry
#[derive(Debug, Clone)]
pub enum Transition {
    /// A notification was inserted. Also reported when the device modifies
    /// an id the registry never saw and an entry is synthesised for it.
    Added(NotificationId),

    /// An existing notification changed content; its cache was cleared
    Modified(NotificationId),

    /// A notification was cleared on the device. The detached entity is
    /// handed over with `removed()` set; it refuses fetches and actions
    /// from here on.
    Removed(Notification),

    /// An Added event arrived while the registry was full
    Dropped(NotificationId),
}

/// Live notifications keyed by id
pub struct NotificationRegistry {
    entries: FnvIndexMap<NotificationId, Notification, MAX_ACTIVE_NOTIFICATIONS>,
    parser: EventParser,
}

impl NotificationRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: FnvIndexMap::new(),
            parser: EventParser::new(),
        }
    }

    /// Apply one decoded event message.
    ///
    /// Pure state transition, no I/O. Returns `None` only for a Removed
    /// event naming an id the registry does not hold.
    pub fn apply_event(&mut self, event: EventMessage) -> Option<Transition> {
        let id = event.notification_id;

        match event.event_id {
            EventId::Added => self.insert(event),
            EventId::Modified => match self.entries.get_mut(&id) {
                Some(notification) => {
                    notification.apply_event(event.flags, event.category, event.category_count);
                    debug!("notification {} modified ({})", id, event.category.name());
                    Some(Transition::Modified(id))
                }
                None => {
                    // Content change for an id we never saw, e.g. its Added
                    // event predates the connection. Track it from here.
                    warn!("modified event for unknown notification {}", id);
                    self.insert(event)
                }
            },
            EventId::Removed => match self.entries.remove(&id) {
                Some(mut notification) => {
                    notification.mark_removed();
                    debug!("notification {} removed", id);
                    Some(Transition::Removed(notification))
                }
                None => {
                    warn!("removed event for unknown notification {}", id);
                    None
                }
            },
        }
    }

    fn insert(&mut self, event: EventMessage) -> Option<Transition> {
        let id = event.notification_id;
        let notification =
            Notification::new(id, event.flags, event.category, event.category_count);

        match self.entries.insert(id, notification) {
            Ok(previous) => {
                if previous.is_some() {
                    debug!("notification {} re-added over a stale entry", id);
                } else {
                    debug!("notification {} added ({})", id, event.category.name());
                }
                Some(Transition::Added(id))
            }
            Err(_) => {
                warn!("registry full, dropping notification {}", id);
                Some(Transition::Dropped(id))
            }
        }
    }

    /// Decode and apply buffered events until one produces a transition.
    ///
    /// Returns `Ok(None)` exactly when fewer than 8 bytes remain buffered.
    /// Events that produce no transition (a Removed for an unknown id, an
    /// unknown event kind) are consumed and skipped.
    pub async fn poll_event<S: ByteSource>(
        &mut self,
        source: &mut S,
    ) -> Result<Option<Transition>, AncsError> {
        loop {
            if source.available() < EVENT_MESSAGE_LEN {
                return Ok(None);
            }

            let mut data = [0u8; EVENT_MESSAGE_LEN];
            source.read_exact(&mut data).await?;

            match self.parser.parse(&data) {
                Ok(event) => {
                    if let Some(transition) = self.apply_event(event) {
                        return Ok(Some(transition));
                    }
                }
                Err(DecodeError::InvalidEventId(id)) => {
                    // Skip rather than fail so one unknown event kind does
                    // not wedge the drain.
                    warn!("skipping event with unknown id {:#04x}", id);
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    /// Lazy sequence over pending transitions
    pub fn drain_pending_events<'a, S: ByteSource>(
        &'a mut self,
        source: &'a mut S,
    ) -> PendingEvents<'a, S> {
        PendingEvents {
            registry: self,
            source,
        }
    }

    /// Pull sequence over newly added notification ids.
    ///
    /// With a timeout the sequence additionally ends once the deadline
    /// passes; `None` lets it run until nothing is pending.
    pub fn wait_for_new_notifications<'a, S: ByteSource>(
        &'a mut self,
        source: &'a mut S,
        timeout: Option<Duration>,
    ) -> NewNotifications<'a, S> {
        NewNotifications {
            deadline: timeout.map(|timeout| Instant::now() + timeout),
            events: self.drain_pending_events(source),
        }
    }

    /// Current live notifications keyed by id.
    ///
    /// This is the registry's own storage; later drains mutate it in place.
    pub fn active(
        &self,
    ) -> &FnvIndexMap<NotificationId, Notification, MAX_ACTIVE_NOTIFICATIONS> {
        &self.entries
    }

    /// A live notification by id
    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.entries.get(&id)
    }

    /// Mutable access to a live notification, for attribute fetches
    pub fn get_mut(&mut self, id: NotificationId) -> Option<&mut Notification> {
        self.entries.get_mut(&id)
    }

    /// Number of live notifications
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no notifications are live
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget all notifications, e.g. after a disconnect
    pub fn clear(&mut self) {
        debug!("registry cleared ({} entries)", self.entries.len());
        self.entries.clear();
    }
}

impl Default for NotificationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazy drain over pending Notification Source events
///
/// Created by [`NotificationRegistry::drain_pending_events`]. Each `next`
/// call applies buffered events until one produces a transition.
pub struct PendingEvents<'a, S: ByteSource> {
    registry: &'a mut NotificationRegistry,
    source: &'a mut S,
}

impl<S: ByteSource> PendingEvents<'_, S> {
    /// Next pending transition; `Ok(None)` once fewer than 8 bytes remain
    /// buffered. Never suspends.
    pub async fn next(&mut self) -> Result<Option<Transition>, AncsError> {
        self.registry.poll_event(self.source).await
    }
}

/// Pull sequence over newly added notifications
///
/// Created by [`NotificationRegistry::wait_for_new_notifications`]. Other
/// transitions are applied to the registry as they are drained but not
/// reported here.
pub struct NewNotifications<'a, S: ByteSource> {
    events: PendingEvents<'a, S>,
    deadline: Option<Instant>,
}

impl<S: ByteSource> NewNotifications<'_, S> {
    /// Next newly added notification id; `Ok(None)` once the deadline has
    /// passed or nothing is pending.
    pub async fn next(&mut self) -> Result<Option<NotificationId>, AncsError> {
        loop {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    return Ok(None);
                }
            }

            match self.events.next().await? {
                Some(Transition::Added(id)) => return Ok(Some(id)),
                Some(_) => continue,
                None => return Ok(None),
            }
        }
    }
}
