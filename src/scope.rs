use crate::command::{CommandChannel, CommandError, IDN_REPLY_BYTES, NUMERIC_REPLY_BYTES};
use crate::transport::{SerialTransport, Transport, TransportError, UsbtmcTransport};
use crate::waveform::{
    decode_samples, parse_block_length, Channel, ChannelCalibration, CurveError, SampleWidth,
};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Curve error: {0}")]
    Curve(#[from] CurveError),

    #[error("No channel synchronized yet; fetch a trace or call sync_parameters first")]
    Unsynced,

    #[error("Acquisition still running after {0:?}")]
    AcquisitionTimeout(Duration),
}

/// Which channel the cached calibration belongs to. The calibration record
/// exists exactly when a channel is synced, so a half-updated cache is
/// unrepresentable. Transitions happen only in [`TekScope::sync_parameters`].
#[derive(Debug, Clone, PartialEq)]
enum SyncState {
    Unsynced,
    Synced {
        channel: Channel,
        calibration: ChannelCalibration,
    },
}

/// One session with a Tektronix oscilloscope.
///
/// Owns the transport exclusively; all operations are blocking calls on the
/// calling thread. Wrap the session in a mutex if it must be shared.
pub struct TekScope<T: Transport> {
    commands: CommandChannel<T>,
    width: SampleWidth,
    idn: String,
    sync: SyncState,
}

impl TekScope<UsbtmcTransport> {
    /// Open a session on a usbtmc character device such as `/dev/usbtmc0`.
    pub fn open(path: impl AsRef<Path>, width: SampleWidth) -> Result<Self, ScopeError> {
        let transport = UsbtmcTransport::open(path)?;
        Self::with_transport(transport, width)
    }
}

impl TekScope<SerialTransport> {
    /// Open a session on a serial port.
    pub fn open_serial(port: &str, baud_rate: u32, width: SampleWidth) -> Result<Self, ScopeError> {
        let transport = SerialTransport::open(port, baud_rate)?;
        Self::with_transport(transport, width)
    }
}

impl<T: Transport> TekScope<T> {
    const POLL_INTERVAL: Duration = Duration::from_millis(10);

    /// Build a session over an already-open transport and run the
    /// initialization sequence.
    pub fn with_transport(transport: T, width: SampleWidth) -> Result<Self, ScopeError> {
        let mut commands = CommandChannel::new(transport);

        let idn = commands.query("*IDN?", IDN_REPLY_BYTES)?;
        log::info!("Instrument identity: {idn}");

        // Event-register setup; without it the scope truncates transfers
        // above 100,000 points. Keep the three commands and their order.
        commands.send("DESE 1")?;
        commands.send("*ESE 1")?;
        commands.send("*SRE 32")?;

        // Binary transfer encoding instead of the default ASCII.
        commands.send("DAT INIT")?;

        commands.send(&format!("WFMO:BYT_N {}", width.scpi_arg()))?;
        log::debug!("Sample width set to {} byte(s)", width.byte_count());

        // MSB first keeps the decode independent of host endianness.
        commands.send("WFMO:BYT_O MSB")?;

        Ok(Self {
            commands,
            width,
            idn,
            sync: SyncState::Unsynced,
        })
    }

    /// Identity string the instrument returned to `*IDN?` at session start.
    pub fn idn(&self) -> &str {
        &self.idn
    }

    pub fn sample_width(&self) -> SampleWidth {
        self.width
    }

    /// Channel whose calibration is currently cached, if any.
    pub fn synced_channel(&self) -> Option<Channel> {
        match &self.sync {
            SyncState::Synced { channel, .. } => Some(*channel),
            SyncState::Unsynced => None,
        }
    }

    /// Calibration of the most recently synced channel.
    pub fn calibration(&self) -> Result<&ChannelCalibration, ScopeError> {
        match &self.sync {
            SyncState::Synced { calibration, .. } => Ok(calibration),
            SyncState::Unsynced => Err(ScopeError::Unsynced),
        }
    }

    /// Select `channel` on the instrument and re-read its calibration.
    ///
    /// The record is committed together with the channel only after every
    /// reply parsed; on any failure the previous state stays untouched, so a
    /// retry re-attempts a full sync.
    pub fn sync_parameters(&mut self, channel: Channel) -> Result<(), ScopeError> {
        self.commands.send(&format!("DATA:SOURCE {channel}"))?;

        let calibration = ChannelCalibration {
            y_multiplier: self.commands.query_f64("WFMO:YMU?")?,
            y_offset: self.commands.query_f64("WFMO:YOFF?")?,
            y_unit: self.commands.query("WFMO:YUN?", NUMERIC_REPLY_BYTES)?,
            x_increment: self.commands.query_f64("WFMO:XIN?")?,
            x_origin: self.commands.query_f64("WFMO:XZE?")?,
            record_length: self.commands.query_usize("HOR:DIG:RECO:MAI?")?,
        };
        log::debug!("Synced {channel}: {calibration:?}");

        self.sync = SyncState::Synced {
            channel,
            calibration,
        };
        Ok(())
    }

    /// Fetch one calibrated trace, in the channel's vertical unit.
    ///
    /// Re-syncs calibration only when `channel` differs from the last synced
    /// one. The binary block is accumulated to its declared length across as
    /// many transport reads as needed.
    pub fn get_trace(&mut self, channel: Channel) -> Result<Vec<f64>, ScopeError> {
        let in_sync = matches!(
            &self.sync,
            SyncState::Synced { channel: synced, .. } if *synced == channel
        );
        if !in_sync {
            self.sync_parameters(channel)?;
        }

        self.commands.send("CURV?")?;
        let header = self.commands.read_reply(NUMERIC_REPLY_BYTES)?;
        let declared = parse_block_length(&header)?;
        let payload = self.commands.read_exact_total(declared)?;
        let raw = decode_samples(&payload, self.width)?;

        let calibration = self.calibration()?;
        if raw.len() != calibration.record_length {
            // The record length can change on the instrument between sync
            // and fetch; the decoded length wins.
            log::warn!(
                "Decoded {} samples but the synced record length is {}",
                raw.len(),
                calibration.record_length
            );
        }

        Ok(raw
            .into_iter()
            .map(|s| calibration.volts_from_raw(f64::from(s)))
            .collect())
    }

    /// Sample timestamps for the most recently synced channel.
    pub fn time_axis(&self) -> Result<Vec<f64>, ScopeError> {
        Ok(self.calibration()?.time_axis())
    }

    /// Stop after one complete acquisition sequence.
    pub fn set_single_acquisition(&mut self) -> Result<(), ScopeError> {
        self.commands.send("ACQ:STOPA SEQ")?;
        Ok(())
    }

    /// True once the instrument reports acquisition state 0 (idle).
    pub fn is_acquisition_finished(&mut self) -> Result<bool, ScopeError> {
        Ok(self.commands.query_i32("ACQ:STATE?")? == 0)
    }

    /// Poll every 10 ms until the acquisition finishes. Blocks indefinitely
    /// on an unresponsive instrument; see
    /// [`wait_for_acquisition_timeout`](Self::wait_for_acquisition_timeout)
    /// for a bounded wait.
    pub fn wait_for_acquisition(&mut self) -> Result<(), ScopeError> {
        loop {
            if self.is_acquisition_finished()? {
                return Ok(());
            }
            thread::sleep(Self::POLL_INTERVAL);
        }
    }

    /// Like [`wait_for_acquisition`](Self::wait_for_acquisition), but gives
    /// up with [`ScopeError::AcquisitionTimeout`] once `timeout` has passed.
    pub fn wait_for_acquisition_timeout(&mut self, timeout: Duration) -> Result<(), ScopeError> {
        let start = Instant::now();
        loop {
            if self.is_acquisition_finished()? {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(ScopeError::AcquisitionTimeout(timeout));
            }
            thread::sleep(Self::POLL_INTERVAL);
        }
    }

    /// Number of acquisitions since the instrument started acquiring.
    pub fn acquisition_count(&mut self) -> Result<u64, ScopeError> {
        Ok(self.commands.query_u64("ACQ:NUMAC?")?)
    }

    /// Current record length on the instrument, independent of any cached
    /// calibration.
    pub fn record_length(&mut self) -> Result<usize, ScopeError> {
        Ok(self.commands.query_usize("HOR:DIG:RECO:MAI?")?)
    }
}
