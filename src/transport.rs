use serialport::SerialPort;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Serial port error: {0}")]
    SerialPort(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Blocking byte-stream connection to the instrument.
///
/// A single `receive_up_to` call is not guaranteed to return all requested
/// bytes; callers loop until they have what they need. There is no internal
/// buffering or retry at this layer.
pub trait Transport {
    /// Write the whole buffer. A short or failed write is an error.
    fn send_all(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Read at most `buf.len()` bytes, returning how many were read.
    fn receive_up_to(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;
}

/// Transport over a USB Test-and-Measurement character device such as
/// `/dev/usbtmc0`. The kernel driver handles message framing; this layer is
/// plain read/write on the device file.
#[derive(Debug)]
pub struct UsbtmcTransport {
    device: File,
}

impl UsbtmcTransport {
    /// Open the device special file in read-write mode.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TransportError> {
        let device = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self { device })
    }
}

impl Transport for UsbtmcTransport {
    fn send_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.device.write_all(bytes)?;
        Ok(())
    }

    fn receive_up_to(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        Ok(self.device.read(buf)?)
    }
}

/// Transport over a serial port, for instruments attached through an
/// RS232/USB-serial bridge instead of usbtmc.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    const READ_TIMEOUT: Duration = Duration::from_millis(100);

    pub fn open(port: &str, baud_rate: u32) -> Result<Self, TransportError> {
        let port = serialport::new(port, baud_rate)
            .timeout(Self::READ_TIMEOUT)
            .open()?;
        Ok(Self { port })
    }
}

impl Transport for SerialTransport {
    fn send_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.port.write_all(bytes)?;
        Ok(())
    }

    fn receive_up_to(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        // A timed-out read means "no data yet"; accumulation loops keep going.
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::{Transport, TransportError};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    #[derive(Default)]
    struct Script {
        written: Vec<Vec<u8>>,
        replies: VecDeque<Vec<u8>>,
    }

    /// Scripted transport for driving the session in tests. Cloning shares
    /// the underlying script, so a test can keep a handle after handing the
    /// transport to the scope.
    #[derive(Clone, Default)]
    pub struct MockTransport {
        state: Rc<RefCell<Script>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue one reply chunk; each chunk is delivered by one read call.
        pub fn push_reply(&self, bytes: impl Into<Vec<u8>>) {
            self.state.borrow_mut().replies.push_back(bytes.into());
        }

        /// Everything written so far, one entry per `send_all`, trailing
        /// newlines stripped.
        pub fn written_lines(&self) -> Vec<String> {
            self.state
                .borrow()
                .written
                .iter()
                .map(|w| String::from_utf8_lossy(w).trim_end().to_string())
                .collect()
        }

        pub fn count_written(&self, line: &str) -> usize {
            self.written_lines().iter().filter(|l| *l == line).count()
        }

        pub fn pending_replies(&self) -> usize {
            self.state.borrow().replies.len()
        }
    }

    impl Transport for MockTransport {
        fn send_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
            self.state.borrow_mut().written.push(bytes.to_vec());
            Ok(())
        }

        fn receive_up_to(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
            let mut state = self.state.borrow_mut();
            let Some(mut chunk) = state.replies.pop_front() else {
                return Ok(0);
            };
            if chunk.len() > buf.len() {
                let rest = chunk.split_off(buf.len());
                state.replies.push_front(rest);
            }
            buf[..chunk.len()].copy_from_slice(&chunk);
            Ok(chunk.len())
        }
    }
}
