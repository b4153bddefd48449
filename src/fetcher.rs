//! Attribute fetcher
//!
//! Drives the Control Point / Data Source request-response exchange: one
//! round-trip per uncached attribute. ANCS answers strictly in request
//! order on a dedicated stream, so the fetcher reads one complete response
//! per command, bounded by a timeout, and validates every echoed field
//! against the outstanding request.

use crate::config::defaults;
use crate::config::protocol::{
    APP_IDENTIFIER_MAX, ATTRIBUTE_HEADER_LEN, ATTRIBUTE_VALUE_MAX, RESPONSE_HEADER_LEN,
};
use crate::error::AncsError;
use crate::notifications::entity::{AttributeValue, Notification};
use crate::protocol::parser::ResponseParser;
use crate::protocol::serialiser::CommandSerialiser;
use crate::protocol::types::{
    AppAttribute, CommandId, DecodeError, NotificationAttribute, NotificationId, ProtocolError,
};
use crate::transport::{ByteSink, ByteSource};
use embassy_time::{with_timeout, Duration};
use log::trace;

/// Performs attribute exchanges over the Control Point and Data Source
pub struct AttributeFetcher {
    serialiser: CommandSerialiser,
    parser: ResponseParser,
    timeout: Duration,
}

impl AttributeFetcher {
    /// Create a fetcher with the default response timeout
    pub fn new() -> Self {
        Self::with_timeout(defaults::ATTRIBUTE_TIMEOUT)
    }

    /// Create a fetcher with an explicit response timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            serialiser: CommandSerialiser::new(),
            parser: ResponseParser::new(),
            timeout,
        }
    }

    /// Change the response timeout
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Fetch one attribute of a notification, consulting its cache first.
    ///
    /// A cache hit returns without touching the transport, so repeated
    /// fetches of the same attribute cost one round-trip in total. On a
    /// miss the decoded value is cached before returning; a failed fetch
    /// caches nothing.
    pub async fn fetch<C: ByteSink, D: ByteSource>(
        &self,
        control_point: &mut C,
        data_source: &mut D,
        notification: &mut Notification,
        attribute: NotificationAttribute,
    ) -> Result<AttributeValue, AncsError> {
        if notification.removed() {
            return Err(AncsError::StaleNotification(notification.id()));
        }

        if let Some(value) = notification.cached(attribute) {
            trace!(
                "attribute {:?} of notification {} served from cache",
                attribute,
                notification.id()
            );
            return Ok(to_value(value));
        }

        let command = self
            .serialiser
            .serialise_get_attribute(notification.id(), attribute);
        control_point.write_all(&command).await?;
        trace!(
            "requested attribute {:?} of notification {}",
            attribute,
            notification.id()
        );

        let value = match with_timeout(
            self.timeout,
            self.read_attribute(data_source, notification.id(), attribute),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => return Err(AncsError::Timeout),
        };

        notification.insert_cached(attribute, value.clone());
        Ok(value)
    }

    /// Fetch the localised display name of an app by bundle identifier.
    ///
    /// App attributes are app-level rather than notification-level, so no
    /// cache is involved. A bundle id the device does not know is answered
    /// with an empty attribute list, which surfaces here as a timeout.
    pub async fn fetch_app_display_name<C: ByteSink, D: ByteSource>(
        &self,
        control_point: &mut C,
        data_source: &mut D,
        app_id: &str,
    ) -> Result<AttributeValue, AncsError> {
        let command = self.serialiser.serialise_get_app_attributes(app_id);
        control_point.write_all(&command).await?;
        trace!("requested display name of {}", app_id);

        match with_timeout(self.timeout, self.read_app_attribute(data_source)).await {
            Ok(result) => result,
            Err(_) => Err(AncsError::Timeout),
        }
    }

    /// Read and validate one Get Notification Attributes response
    async fn read_attribute<D: ByteSource>(
        &self,
        data_source: &mut D,
        id: NotificationId,
        attribute: NotificationAttribute,
    ) -> Result<AttributeValue, AncsError> {
        let mut header = [0u8; RESPONSE_HEADER_LEN];
        data_source.read_exact(&mut header).await?;
        self.parser
            .check_response_header(&header, CommandId::GetNotificationAttributes, id)?;

        let mut attribute_header = [0u8; ATTRIBUTE_HEADER_LEN];
        data_source.read_exact(&mut attribute_header).await?;
        let length = self
            .parser
            .check_attribute_header(&attribute_header, attribute as u8)?;

        self.read_value(data_source, length).await
    }

    /// Read and validate one Get App Attributes response
    async fn read_app_attribute<D: ByteSource>(
        &self,
        data_source: &mut D,
    ) -> Result<AttributeValue, AncsError> {
        let mut command_echo = [0u8; 1];
        data_source.read_exact(&mut command_echo).await?;
        if command_echo[0] != CommandId::GetAppAttributes as u8 {
            return Err(ProtocolError::CommandMismatch {
                expected: CommandId::GetAppAttributes as u8,
                actual: command_echo[0],
            }
            .into());
        }

        // Echoed app identifier, NUL-terminated. Bounded so a
        // desynchronised stream cannot spin here.
        let mut byte = [0u8; 1];
        let mut seen: usize = 0;
        loop {
            data_source.read_exact(&mut byte).await?;
            if byte[0] == 0x00 {
                break;
            }
            seen += 1;
            if seen > APP_IDENTIFIER_MAX {
                return Err(DecodeError::OversizedValue {
                    length: seen as u16,
                }
                .into());
            }
        }

        let mut attribute_header = [0u8; ATTRIBUTE_HEADER_LEN];
        data_source.read_exact(&mut attribute_header).await?;
        let length = self
            .parser
            .check_attribute_header(&attribute_header, AppAttribute::DisplayName as u8)?;

        self.read_value(data_source, length).await
    }

    /// Read a length-prefixed value.
    ///
    /// An oversized value is consumed in full before the error returns so
    /// the stream stays aligned for the next exchange.
    async fn read_value<D: ByteSource>(
        &self,
        data_source: &mut D,
        length: u16,
    ) -> Result<AttributeValue, AncsError> {
        if length as usize > ATTRIBUTE_VALUE_MAX {
            self.discard(data_source, length as usize).await?;
            return Err(DecodeError::OversizedValue { length }.into());
        }

        let mut data = [0u8; ATTRIBUTE_VALUE_MAX];
        let value_bytes = &mut data[..length as usize];
        data_source.read_exact(value_bytes).await?;

        let text = self.parser.decode_value(value_bytes)?;
        Ok(to_value(text))
    }

    async fn discard<D: ByteSource>(
        &self,
        data_source: &mut D,
        length: usize,
    ) -> Result<(), AncsError> {
        let mut scratch = [0u8; 32];
        let mut remaining = length;
        while remaining > 0 {
            let take = remaining.min(scratch.len());
            data_source.read_exact(&mut scratch[..take]).await?;
            remaining -= take;
        }
        Ok(())
    }
}

impl Default for AttributeFetcher {
    fn default() -> Self {
        Self::new()
    }
}

fn to_value(text: &str) -> AttributeValue {
    let mut value = AttributeValue::new();
    let _ = value.push_str(text);
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::{Category, EventFlags};
    use crate::transport::mock::MockStream;
    use heapless::Vec;

    fn call_notification() -> Notification {
        Notification::new(42, EventFlags::empty(), Category::IncomingCall, 3)
    }

    /// Build one Get Notification Attributes response
    fn attribute_response(id: u32, attribute: u8, value: &[u8]) -> Vec<u8, 512> {
        let mut data = Vec::new();
        data.push(0x00).unwrap();
        data.extend_from_slice(&id.to_le_bytes()).unwrap();
        data.push(attribute).unwrap();
        data.extend_from_slice(&(value.len() as u16).to_le_bytes())
            .unwrap();
        data.extend_from_slice(value).unwrap();
        data
    }

    #[test]
    fn test_fetch_title() {
        let fetcher = AttributeFetcher::new();
        let mut notification = call_notification();
        let mut control_point = MockStream::new();
        let mut data_source = MockStream::new();
        data_source.queue(&attribute_response(42, 0x01, b"Hello"));

        futures::executor::block_on(async {
            let value = fetcher
                .fetch(
                    &mut control_point,
                    &mut data_source,
                    &mut notification,
                    NotificationAttribute::Title,
                )
                .await
                .expect("Should fetch");

            assert_eq!(value.as_str(), "Hello");
        });

        // Command on the wire: [cmd][id LE][attribute][max_length LE]
        assert_eq!(
            control_point.written().as_slice(),
            &[0x00, 0x2A, 0x00, 0x00, 0x00, 0x01, 0xFF, 0x00]
        );
        assert!(notification.is_cached(NotificationAttribute::Title));
        assert_eq!(
            notification.cached(NotificationAttribute::Title),
            Some("Hello")
        );
    }

    #[test]
    fn test_fetch_is_idempotent() {
        let fetcher = AttributeFetcher::new();
        let mut notification = call_notification();
        let mut control_point = MockStream::new();
        let mut data_source = MockStream::new();
        // One response queued; the second fetch must not need another
        data_source.queue(&attribute_response(42, 0x00, b"com.apple.mobilephone"));

        futures::executor::block_on(async {
            let first = fetcher
                .fetch(
                    &mut control_point,
                    &mut data_source,
                    &mut notification,
                    NotificationAttribute::AppIdentifier,
                )
                .await
                .expect("Should fetch");

            let second = fetcher
                .fetch(
                    &mut control_point,
                    &mut data_source,
                    &mut notification,
                    NotificationAttribute::AppIdentifier,
                )
                .await
                .expect("Should hit the cache");

            assert_eq!(first, second);
        });

        // Exactly one command was written
        assert_eq!(control_point.written().len(), 6);
        assert_eq!(data_source.available(), 0);
    }

    #[test]
    fn test_fetch_refused_for_removed_notification() {
        let fetcher = AttributeFetcher::new();
        let mut notification = call_notification();
        notification.mark_removed();
        let mut control_point = MockStream::new();
        let mut data_source = MockStream::new();

        futures::executor::block_on(async {
            let result = fetcher
                .fetch(
                    &mut control_point,
                    &mut data_source,
                    &mut notification,
                    NotificationAttribute::Title,
                )
                .await;

            assert_eq!(result, Err(AncsError::StaleNotification(42)));
        });

        assert!(control_point.written().is_empty());
    }

    #[test]
    fn test_fetch_detects_attribute_mismatch() {
        let fetcher = AttributeFetcher::new();
        let mut notification = call_notification();
        let mut control_point = MockStream::new();
        let mut data_source = MockStream::new();
        // Response carries Subtitle instead of the requested Title
        data_source.queue(&attribute_response(42, 0x02, b"Hello"));

        futures::executor::block_on(async {
            let result = fetcher
                .fetch(
                    &mut control_point,
                    &mut data_source,
                    &mut notification,
                    NotificationAttribute::Title,
                )
                .await;

            assert_eq!(
                result,
                Err(AncsError::Protocol(ProtocolError::AttributeMismatch {
                    expected: 0x01,
                    actual: 0x02,
                }))
            );
        });

        assert!(!notification.is_cached(NotificationAttribute::Title));
    }

    #[test]
    fn test_fetch_detects_notification_mismatch() {
        let fetcher = AttributeFetcher::new();
        let mut notification = call_notification();
        let mut control_point = MockStream::new();
        let mut data_source = MockStream::new();
        data_source.queue(&attribute_response(7, 0x01, b"Hello"));

        futures::executor::block_on(async {
            let result = fetcher
                .fetch(
                    &mut control_point,
                    &mut data_source,
                    &mut notification,
                    NotificationAttribute::Title,
                )
                .await;

            assert_eq!(
                result,
                Err(AncsError::Protocol(ProtocolError::NotificationMismatch {
                    expected: 42,
                    actual: 7,
                }))
            );
        });
    }

    #[test]
    fn test_fetch_rejects_invalid_utf8() {
        let fetcher = AttributeFetcher::new();
        let mut notification = call_notification();
        let mut control_point = MockStream::new();
        let mut data_source = MockStream::new();
        data_source.queue(&attribute_response(42, 0x01, &[0xFF, 0xFE, 0xFD]));

        futures::executor::block_on(async {
            let result = fetcher
                .fetch(
                    &mut control_point,
                    &mut data_source,
                    &mut notification,
                    NotificationAttribute::Title,
                )
                .await;

            assert_eq!(result, Err(AncsError::Decode(DecodeError::InvalidUtf8)));
        });

        assert!(!notification.is_cached(NotificationAttribute::Title));
    }

    #[test]
    fn test_fetch_times_out_without_response() {
        let fetcher = AttributeFetcher::with_timeout(Duration::from_millis(10));
        let mut notification = call_notification();
        let mut control_point = MockStream::new();
        let mut data_source = MockStream::new();

        futures::executor::block_on(async {
            let result = fetcher
                .fetch(
                    &mut control_point,
                    &mut data_source,
                    &mut notification,
                    NotificationAttribute::Title,
                )
                .await;

            assert_eq!(result, Err(AncsError::Timeout));
        });

        // The command went out before the wait began
        assert_eq!(control_point.written().len(), 8);
    }

    #[test]
    fn test_oversized_value_is_drained() {
        let fetcher = AttributeFetcher::new();
        let mut notification = call_notification();
        let mut control_point = MockStream::new();
        let mut data_source = MockStream::new();

        let oversized = [0x41u8; 300];
        data_source.queue(&attribute_response(42, 0x03, &oversized));
        data_source.queue(&attribute_response(42, 0x01, b"Hello"));

        futures::executor::block_on(async {
            let result = fetcher
                .fetch(
                    &mut control_point,
                    &mut data_source,
                    &mut notification,
                    NotificationAttribute::Message,
                )
                .await;
            assert_eq!(
                result,
                Err(AncsError::Decode(DecodeError::OversizedValue {
                    length: 300
                }))
            );

            // The stream stayed aligned for the next exchange
            let value = fetcher
                .fetch(
                    &mut control_point,
                    &mut data_source,
                    &mut notification,
                    NotificationAttribute::Title,
                )
                .await
                .expect("Should fetch");
            assert_eq!(value.as_str(), "Hello");
        });
    }

    #[test]
    fn test_fetch_app_display_name() {
        let fetcher = AttributeFetcher::new();
        let mut control_point = MockStream::new();
        let mut data_source = MockStream::new();

        let mut response: Vec<u8, 512> = Vec::new();
        response.push(0x01).unwrap();
        response.extend_from_slice(b"com.apple.mobilephone").unwrap();
        response.push(0x00).unwrap();
        response.push(0x00).unwrap(); // DisplayName
        response.extend_from_slice(&5u16.to_le_bytes()).unwrap();
        response.extend_from_slice(b"Phone").unwrap();
        data_source.queue(&response);

        futures::executor::block_on(async {
            let value = fetcher
                .fetch_app_display_name(
                    &mut control_point,
                    &mut data_source,
                    "com.apple.mobilephone",
                )
                .await
                .expect("Should fetch");

            assert_eq!(value.as_str(), "Phone");
        });

        let written = control_point.written();
        assert_eq!(written[0], 0x01);
        assert_eq!(&written[1..22], b"com.apple.mobilephone");
        assert_eq!(written[22], 0x00);
        assert_eq!(written[23], 0x00);
    }

    #[test]
    fn test_fetch_app_display_name_detects_command_mismatch() {
        let fetcher = AttributeFetcher::new();
        let mut control_point = MockStream::new();
        let mut data_source = MockStream::new();
        // Echoes Get Notification Attributes instead
        data_source.queue(&attribute_response(42, 0x00, b"Phone"));

        futures::executor::block_on(async {
            let result = fetcher
                .fetch_app_display_name(&mut control_point, &mut data_source, "com.x")
                .await;

            assert_eq!(
                result,
                Err(AncsError::Protocol(ProtocolError::CommandMismatch {
                    expected: 0x01,
                    actual: 0x00,
                }))
            );
        });
    }
}
