//! # TekScope RS
//!
//! A Rust driver for retrieving waveform traces from Tektronix oscilloscopes
//! over a usbtmc character device or a serial port.
//!
//! The driver speaks the instrument's ASCII command set, keeps a per-channel
//! calibration cache that is re-synced only when the selected channel
//! changes, and streams the length-prefixed binary curve block into
//! calibrated physical units (volts against a derived time axis).
//!
//! ## Features
//!
//! - **Pluggable transport**: usbtmc device files and `serialport` ports
//!   behind one blocking [`Transport`] trait
//! - **Binary curve transfer**: 8-bit or 16-bit big-endian samples,
//!   accumulated across partial reads to the declared block length
//! - **Calibration cache**: atomic per-channel sync of scale, offset, unit,
//!   time increment, time origin and record length
//! - **Acquisition control**: single-sequence capture with completion
//!   polling, unbounded or with an opt-in timeout
//! - **Type safety**: closed channel/width enums and error handling
//!   throughout
//!
//! ## Examples
//!
//! ### Grab a trace
//!
//! ```rust,no_run
//! use tekscope_rs::{Channel, SampleWidth, TekScope};
//!
//! let mut scope = TekScope::open("/dev/usbtmc0", SampleWidth::Bits16)?;
//! println!("Connected to {}", scope.idn());
//!
//! scope.set_single_acquisition()?;
//! scope.wait_for_acquisition()?;
//!
//! let volts = scope.get_trace(Channel::Ch1)?;
//! let time = scope.time_axis()?;
//! println!("Captured {} samples", volts.len());
//! # Ok::<(), tekscope_rs::ScopeError>(())
//! ```
//!
//! ### Bounded acquisition wait
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use tekscope_rs::{SampleWidth, TekScope};
//!
//! let mut scope = TekScope::open("/dev/usbtmc0", SampleWidth::Bits8)?;
//! scope.set_single_acquisition()?;
//! scope.wait_for_acquisition_timeout(Duration::from_secs(5))?;
//! # Ok::<(), tekscope_rs::ScopeError>(())
//! ```
//!
//! ### Custom transport
//!
//! Any blocking byte stream can carry the session; implement [`Transport`]
//! and pass it to [`TekScope::with_transport`].

pub mod command;
pub mod scope;
pub mod transport;
pub mod waveform;

// Re-export the main types for convenience
pub use command::{CommandChannel, CommandError};

pub use scope::{ScopeError, TekScope};

pub use transport::{SerialTransport, Transport, TransportError, UsbtmcTransport};

pub use waveform::{Channel, ChannelCalibration, CurveError, SampleWidth};
