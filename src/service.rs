//! ANCS client facade
//!
//! Binds the three GATT streams to the engine: the registry consumes the
//! Notification Source, the fetcher drives the Control Point and Data
//! Source. Every operation takes `&mut self`; the engine is single-consumer
//! by construction, which is what keeps the registry and the attribute
//! cache coherent without locks.

use crate::config::limits::MAX_ACTIVE_NOTIFICATIONS;
use crate::error::AncsError;
use crate::fetcher::AttributeFetcher;
use crate::notifications::entity::{AttributeValue, Notification};
use crate::notifications::registry::{NewNotifications, NotificationRegistry, PendingEvents};
use crate::protocol::types::{ActionId, NotificationAttribute, NotificationId};
use crate::transport::{ByteSink, ByteSource};
use core::fmt;
use embassy_time::Duration;
use heapless::FnvIndexMap;

/// Client side of the Apple Notification Center Service
pub struct AncsClient<N, C, D> {
    notification_source: N,
    control_point: C,
    data_source: D,
    registry: NotificationRegistry,
    fetcher: AttributeFetcher,
}

impl<N, C, D> AncsClient<N, C, D>
where
    N: ByteSource,
    C: ByteSink,
    D: ByteSource,
{
    /// Bind the three ANCS characteristic streams
    pub fn new(notification_source: N, control_point: C, data_source: D) -> Self {
        Self {
            notification_source,
            control_point,
            data_source,
            registry: NotificationRegistry::new(),
            fetcher: AttributeFetcher::new(),
        }
    }

    /// Bound on each Data Source wait during attribute fetches
    pub fn set_attribute_timeout(&mut self, timeout: Duration) {
        self.fetcher.set_timeout(timeout);
    }

    /// Lazy sequence over pending event transitions
    pub fn drain_pending_events(&mut self) -> PendingEvents<'_, N> {
        self.registry
            .drain_pending_events(&mut self.notification_source)
    }

    /// Pull sequence over newly added notification ids, optionally bounded
    /// by a deadline
    pub fn wait_for_new_notifications(
        &mut self,
        timeout: Option<Duration>,
    ) -> NewNotifications<'_, N> {
        self.registry
            .wait_for_new_notifications(&mut self.notification_source, timeout)
    }

    /// Drain all pending events, then return the live set keyed by id.
    ///
    /// The map is the registry's own storage; later drains mutate it in
    /// place.
    pub async fn active_notifications(
        &mut self,
    ) -> Result<&FnvIndexMap<NotificationId, Notification, MAX_ACTIVE_NOTIFICATIONS>, AncsError>
    {
        let mut pending = self.drain_pending_events();
        while pending.next().await?.is_some() {}
        Ok(self.registry.active())
    }

    /// A live notification by id
    pub fn notification(&self, id: NotificationId) -> Option<&Notification> {
        self.registry.get(id)
    }

    /// Number of live notifications
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether no notifications are live
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Fetch one attribute of a live notification, cache first
    pub async fn attribute(
        &mut self,
        id: NotificationId,
        attribute: NotificationAttribute,
    ) -> Result<AttributeValue, AncsError> {
        let notification = self
            .registry
            .get_mut(id)
            .ok_or(AncsError::UnknownNotification(id))?;

        self.fetcher
            .fetch(
                &mut self.control_point,
                &mut self.data_source,
                notification,
                attribute,
            )
            .await
    }

    /// Fetch the localised display name of an app by bundle identifier
    pub async fn app_display_name(&mut self, app_id: &str) -> Result<AttributeValue, AncsError> {
        self.fetcher
            .fetch_app_display_name(&mut self.control_point, &mut self.data_source, app_id)
            .await
    }

    /// Send an action for a live notification
    pub async fn perform_action(
        &mut self,
        id: NotificationId,
        action: ActionId,
    ) -> Result<(), AncsError> {
        let notification = self
            .registry
            .get(id)
            .ok_or(AncsError::UnknownNotification(id))?;

        notification
            .send_action(action, &mut self.control_point)
            .await
    }

    /// Accept a notification's positive action, e.g. answer the call
    pub async fn send_positive_action(&mut self, id: NotificationId) -> Result<(), AncsError> {
        self.perform_action(id, ActionId::Positive).await
    }

    /// Send a notification's negative action, e.g. decline or hang up
    pub async fn send_negative_action(&mut self, id: NotificationId) -> Result<(), AncsError> {
        self.perform_action(id, ActionId::Negative).await
    }

    /// Render a one-line summary of a notification into `out`.
    ///
    /// Layout: category, flag labels, app identifier, title, subtitle and
    /// message, space separated. The four attributes are fetched if they
    /// are not cached yet, so this can suspend on the Data Source like any
    /// fetch.
    pub async fn write_summary<W: fmt::Write>(
        &mut self,
        id: NotificationId,
        out: &mut W,
    ) -> Result<(), AncsError> {
        let notification = self
            .registry
            .get(id)
            .ok_or(AncsError::UnknownNotification(id))?;

        out.write_str(notification.category().name())?;
        out.write_char(' ')?;
        let mut first = true;
        for label in notification.flag_labels() {
            if !first {
                out.write_char(' ')?;
            }
            out.write_str(label)?;
            first = false;
        }

        for attribute in [
            NotificationAttribute::AppIdentifier,
            NotificationAttribute::Title,
            NotificationAttribute::Subtitle,
            NotificationAttribute::Message,
        ] {
            let value = self.attribute(id, attribute).await?;
            out.write_char(' ')?;
            out.write_str(&value)?;
        }

        Ok(())
    }

    /// Forget all notifications, e.g. after a disconnect
    pub fn reset(&mut self) {
        self.registry.clear();
    }

    /// Tear the client down and hand the streams back
    pub fn into_parts(self) -> (N, C, D) {
        (
            self.notification_source,
            self.control_point,
            self.data_source,
        )
    }
}
