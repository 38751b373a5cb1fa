//! Serial channel abstraction for AT-command radio modules
//!
//! The channel is a plain byte duplex: no framing and no buffering
//! guarantees beyond what the underlying UART provides. Discarding stale
//! input is the caller's job, not the channel's.

use core::future::Future;

use embedded_io::{Read, ReadReady};

/// Byte-oriented duplex link to a radio module
///
/// # Example Implementation
/// ```ignore
/// struct Loopback { rx: heapless::Deque<u8, 64> }
///
/// impl SerialChannel for Loopback {
///     type Error = core::convert::Infallible;
///     fn bytes_available(&mut self) -> Result<usize, Self::Error> { Ok(self.rx.len()) }
///     fn read_byte(&mut self) -> Result<Option<u8>, Self::Error> { Ok(self.rx.pop_front()) }
///     async fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> { /* ... */ Ok(()) }
/// }
/// ```
pub trait SerialChannel {
    /// Error reported by the underlying device
    type Error: embedded_io::Error;

    /// Number of bytes that can be read without blocking
    ///
    /// Adapters that cannot count report a lower bound (0 or 1).
    fn bytes_available(&mut self) -> Result<usize, Self::Error>;

    /// Read one byte if one is already buffered, never blocking
    fn read_byte(&mut self) -> Result<Option<u8>, Self::Error>;

    /// Write every byte of `bytes` to the link
    fn write_all(&mut self, bytes: &[u8]) -> impl Future<Output = Result<(), Self::Error>>;
}

/// UART parity setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Fixed serial line configuration
///
/// Supplied at startup, never negotiated with the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineConfig {
    /// Baud rate in bits per second
    pub baud_rate: u32,
    /// Data bits per frame
    pub data_bits: u8,
    /// Parity bit
    pub parity: Parity,
    /// Stop bits per frame
    pub stop_bits: u8,
}

impl Default for LineConfig {
    /// 115200 8N1
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: 1,
        }
    }
}

/// Adapter from `embedded-io` devices to [`SerialChannel`]
///
/// Works with any device that offers blocking reads plus a readiness
/// query, and async writes, such as embassy's `BufferedUart`. Reads are
/// only issued after `read_ready()` returns true, so they never block.
pub struct IoChannel<T> {
    io: T,
}

impl<T> IoChannel<T> {
    /// Wrap an already-configured device
    pub fn new(io: T) -> Self {
        Self { io }
    }

    /// Release the wrapped device
    pub fn into_inner(self) -> T {
        self.io
    }
}

impl<T> SerialChannel for IoChannel<T>
where
    T: Read + ReadReady + embedded_io_async::Write,
{
    type Error = T::Error;

    fn bytes_available(&mut self) -> Result<usize, Self::Error> {
        Ok(usize::from(self.io.read_ready()?))
    }

    fn read_byte(&mut self) -> Result<Option<u8>, Self::Error> {
        if !self.io.read_ready()? {
            return Ok(None);
        }
        let mut byte = [0u8; 1];
        match self.io.read(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    async fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        embedded_io_async::Write::write_all(&mut self.io, bytes).await?;
        embedded_io_async::Write::flush(&mut self.io).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embassy_futures::block_on;
    use std::collections::VecDeque;
    use std::vec::Vec;

    /// In-memory device: reads drain `rx`, writes append to `tx`
    #[derive(Default)]
    struct FakeUart {
        rx: VecDeque<u8>,
        tx: Vec<u8>,
        flushes: usize,
    }

    impl embedded_io::ErrorType for FakeUart {
        type Error = Infallible;
    }

    impl Read for FakeUart {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            let mut n = 0;
            while n < buf.len() {
                match self.rx.pop_front() {
                    Some(b) => {
                        buf[n] = b;
                        n += 1;
                    }
                    None => break,
                }
            }
            Ok(n)
        }
    }

    impl ReadReady for FakeUart {
        fn read_ready(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.rx.is_empty())
        }
    }

    impl embedded_io_async::Write for FakeUart {
        async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            self.tx.extend_from_slice(buf);
            Ok(buf.len())
        }

        async fn flush(&mut self) -> Result<(), Self::Error> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_default_line_config_is_115200_8n1() {
        let line = LineConfig::default();
        assert_eq!(line.baud_rate, 115_200);
        assert_eq!(line.data_bits, 8);
        assert_eq!(line.parity, Parity::None);
        assert_eq!(line.stop_bits, 1);
    }

    #[test]
    fn test_read_byte_returns_none_when_idle() {
        let mut channel = IoChannel::new(FakeUart::default());
        assert_eq!(channel.bytes_available().unwrap(), 0);
        assert_eq!(channel.read_byte().unwrap(), None);
    }

    #[test]
    fn test_read_byte_drains_in_order() {
        let mut uart = FakeUart::default();
        uart.rx.extend(b"OK");
        let mut channel = IoChannel::new(uart);

        assert_eq!(channel.bytes_available().unwrap(), 1);
        assert_eq!(channel.read_byte().unwrap(), Some(b'O'));
        assert_eq!(channel.read_byte().unwrap(), Some(b'K'));
        assert_eq!(channel.read_byte().unwrap(), None);
    }

    #[test]
    fn test_write_all_flushes() {
        let mut channel = IoChannel::new(FakeUart::default());
        block_on(channel.write_all(b"AT\r\n")).unwrap();

        let uart = channel.into_inner();
        assert_eq!(uart.tx, b"AT\r\n");
        assert_eq!(uart.flushes, 1);
    }

    /// Device whose every operation fails, the way a UART with a framing
    /// error reports through `embedded_io`
    struct FaultyUart;

    impl embedded_io::ErrorType for FaultyUart {
        type Error = embedded_io::ErrorKind;
    }

    impl Read for FaultyUart {
        fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> {
            Err(embedded_io::ErrorKind::InvalidData)
        }
    }

    impl ReadReady for FaultyUart {
        fn read_ready(&mut self) -> Result<bool, Self::Error> {
            Err(embedded_io::ErrorKind::InvalidData)
        }
    }

    impl embedded_io_async::Write for FaultyUart {
        async fn write(&mut self, _buf: &[u8]) -> Result<usize, Self::Error> {
            Err(embedded_io::ErrorKind::BrokenPipe)
        }
    }

    fn exchange<C: SerialChannel>(channel: &mut C) -> Result<Option<u8>, C::Error> {
        block_on(channel.write_all(b"AT\r\n"))?;
        channel.read_byte()
    }

    #[test]
    fn test_io_channel_adapts_embedded_io_device() {
        let mut uart = FakeUart::default();
        uart.rx.extend(b"OK\r\n");
        let mut channel = IoChannel::new(uart);

        assert_eq!(exchange(&mut channel), Ok(Some(b'O')));
        assert_eq!(channel.into_inner().tx, b"AT\r\n");
    }

    #[test]
    fn test_io_channel_passes_device_errors_through() {
        let mut channel = IoChannel::new(FaultyUart);

        assert_eq!(
            channel.bytes_available(),
            Err(embedded_io::ErrorKind::InvalidData)
        );
        assert_eq!(channel.read_byte(), Err(embedded_io::ErrorKind::InvalidData));
        assert_eq!(
            exchange(&mut channel),
            Err(embedded_io::ErrorKind::BrokenPipe)
        );
    }
}
