//! Transport traits for the three ANCS GATT streams
//!
//! ANCS exposes three characteristics: the Notification Source and the
//! Data Source notify bytes to us, the Control Point accepts written
//! commands. These traits abstract the buffered characteristic streams so
//! the engine runs over any BLE stack, or over mocks in tests.

use core::future::Future;
use thiserror::Error;

/// Errors surfaced by the underlying stream
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The BLE link dropped
    #[error("link disconnected")]
    Disconnected,
    /// Read from a characteristic failed
    #[error("read failed")]
    ReadFailed,
    /// Write to a characteristic failed
    #[error("write failed")]
    WriteFailed,
    /// A transport-side buffer overflowed
    #[error("buffer overflow")]
    BufferOverflow,
}

/// Read side of a buffered notify stream (Notification Source, Data Source)
pub trait ByteSource {
    /// Number of bytes buffered and readable without waiting
    fn available(&self) -> usize;

    /// Read exactly `buf.len()` bytes, waiting for them to arrive
    fn read_exact(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<(), TransportError>>;
}

/// Write side of a stream (Control Point)
pub trait ByteSink {
    /// Write all of `data`
    fn write_all(&mut self, data: &[u8]) -> impl Future<Output = Result<(), TransportError>>;
}
