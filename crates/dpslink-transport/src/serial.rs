use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use serialport::{DataBits, Parity, SerialPort, StopBits};
use tracing::info;

use crate::error::{Result, TransportError};
use crate::traits::DeviceChannel;

/// Read timeout used to emulate a non-blocking byte read.
const POLL_TIMEOUT: Duration = Duration::from_millis(1);

/// The serial-attached device channel.
pub struct SerialDevice {
    port: Box<dyn SerialPort>,
    path: String,
}

impl std::fmt::Debug for SerialDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialDevice")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SerialDevice {
    /// Open a serial port at 8N1 with the given baud rate.
    pub fn open(path: &str, baud: u32) -> Result<Self> {
        let port = serialport::new(path, baud)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .parity(Parity::None)
            .timeout(POLL_TIMEOUT)
            .open()
            .map_err(|source| TransportError::Serial {
                port: path.to_string(),
                source,
            })?;
        info!(port = path, baud, "opened serial device");
        Ok(Self {
            port,
            path: path.to_string(),
        })
    }

    /// The device path this channel is attached to.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl DeviceChannel for SerialDevice {
    fn send(&mut self, frame: &[u8]) -> std::io::Result<()> {
        self.port.write_all(frame)?;
        self.port.flush()
    }

    fn recv_byte(&mut self) -> std::io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        match self.port.read(&mut byte) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(byte[0])),
            Err(err) if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
