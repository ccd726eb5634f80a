use crate::transport::{Transport, TransportError};

/// Reply budget for numeric scalar queries, matching the instrument's short
/// ASCII replies.
pub const NUMERIC_REPLY_BYTES: usize = 20;

/// Reply budget for the `*IDN?` identity string.
pub const IDN_REPLY_BYTES: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Reply is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Reply to '{query}' is not {expected}: '{reply}'")]
    Parse {
        query: String,
        expected: &'static str,
        reply: String,
    },
}

/// ASCII command/query channel over a [`Transport`].
///
/// Commands go out newline-terminated; replies come back as raw bytes or as
/// trimmed text, with typed helpers for the numeric scalars the instrument
/// returns.
pub struct CommandChannel<T: Transport> {
    transport: T,
}

impl<T: Transport> CommandChannel<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Send one command. A single `\n` terminator is appended here; callers
    /// never include one.
    pub fn send(&mut self, command: &str) -> Result<(), CommandError> {
        let line = format!("{command}\n");
        self.transport.send_all(line.as_bytes())?;
        Ok(())
    }

    /// One bounded read of at most `max_bytes`, returned raw.
    pub fn read_reply(&mut self, max_bytes: usize) -> Result<Vec<u8>, CommandError> {
        let mut buf = vec![0u8; max_bytes];
        let n = self.transport.receive_up_to(&mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }

    /// Send a query and return its reply as trimmed text.
    pub fn query(&mut self, command: &str, max_reply: usize) -> Result<String, CommandError> {
        self.send(command)?;
        let raw = self.read_reply(max_reply)?;
        let text = String::from_utf8(raw)?;
        Ok(text.trim().to_string())
    }

    pub fn query_f64(&mut self, command: &str) -> Result<f64, CommandError> {
        let reply = self.query(command, NUMERIC_REPLY_BYTES)?;
        reply.parse().map_err(|_| CommandError::Parse {
            query: command.to_string(),
            expected: "a decimal number",
            reply,
        })
    }

    pub fn query_i32(&mut self, command: &str) -> Result<i32, CommandError> {
        let reply = self.query(command, NUMERIC_REPLY_BYTES)?;
        reply.parse().map_err(|_| CommandError::Parse {
            query: command.to_string(),
            expected: "an integer",
            reply,
        })
    }

    pub fn query_u64(&mut self, command: &str) -> Result<u64, CommandError> {
        let reply = self.query(command, NUMERIC_REPLY_BYTES)?;
        reply.parse().map_err(|_| CommandError::Parse {
            query: command.to_string(),
            expected: "an unsigned integer",
            reply,
        })
    }

    pub fn query_usize(&mut self, command: &str) -> Result<usize, CommandError> {
        let reply = self.query(command, NUMERIC_REPLY_BYTES)?;
        reply.parse().map_err(|_| CommandError::Parse {
            query: command.to_string(),
            expected: "an unsigned integer",
            reply,
        })
    }

    /// Accumulate exactly `len` bytes across as many transport reads as it
    /// takes. Zero-length reads just loop; there is no timeout here, so a
    /// device that stops delivering blocks the caller.
    pub fn read_exact_total(&mut self, len: usize) -> Result<Vec<u8>, CommandError> {
        let mut buf = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            let n = self.transport.receive_up_to(&mut buf[filled..])?;
            filled += n;
        }
        Ok(buf)
    }
}
