use std::fmt;
use std::str::FromStr;

/// Fixed header bytes preceding the ASCII length field of a `CURV?` reply.
pub const CURVE_HEADER_BYTES: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum CurveError {
    #[error("Curve header too short: got {0} bytes")]
    TruncatedHeader(usize),

    #[error("Curve length field is not a decimal byte count: '{0}'")]
    LengthField(String),

    #[error("Curve payload of {len} bytes is not a multiple of the {width}-byte sample width")]
    TrailingBytes { len: usize, width: usize },
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown channel '{0}', expected one of CH1..CH4, REFA, REFB")]
pub struct UnknownChannel(String);

/// Waveform sources the instrument exposes: the four analog inputs and the
/// two stored reference waveforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Ch1,
    Ch2,
    Ch3,
    Ch4,
    RefA,
    RefB,
}

impl Channel {
    pub const ALL: [Self; 6] = [
        Self::Ch1,
        Self::Ch2,
        Self::Ch3,
        Self::Ch4,
        Self::RefA,
        Self::RefB,
    ];

    /// SCPI token for this channel.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ch1 => "CH1",
            Self::Ch2 => "CH2",
            Self::Ch3 => "CH3",
            Self::Ch4 => "CH4",
            Self::RefA => "REFA",
            Self::RefB => "REFB",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = UnknownChannel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| UnknownChannel(s.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown sample width '{0}', expected '8bit' or '16bit'")]
pub struct UnknownWidth(String);

/// Per-session transfer width of one raw sample. Fixed at construction and
/// never renegotiated per fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleWidth {
    Bits8,
    Bits16,
}

impl SampleWidth {
    pub fn byte_count(&self) -> usize {
        match self {
            Self::Bits8 => 1,
            Self::Bits16 => 2,
        }
    }

    /// Argument for the `WFMO:BYT_N` command.
    pub fn scpi_arg(&self) -> &'static str {
        match self {
            Self::Bits8 => "1",
            Self::Bits16 => "2",
        }
    }
}

impl FromStr for SampleWidth {
    type Err = UnknownWidth;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "8bit" => Ok(Self::Bits8),
            "16bit" => Ok(Self::Bits16),
            other => Err(UnknownWidth(other.to_string())),
        }
    }
}

/// Calibration of one channel, read from the instrument in a single sync.
///
/// All fields belong together; the record is only ever replaced as a whole,
/// never field by field.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelCalibration {
    pub y_multiplier: f64,
    pub y_offset: f64,
    pub y_unit: String,
    pub x_increment: f64,
    pub x_origin: f64,
    pub record_length: usize,
}

impl ChannelCalibration {
    /// Convert one raw sample to physical units.
    pub fn volts_from_raw(&self, raw: f64) -> f64 {
        (raw - self.y_offset) * self.y_multiplier
    }

    /// Sample timestamps for the synced record.
    pub fn time_axis(&self) -> Vec<f64> {
        (0..self.record_length)
            .map(|i| self.x_origin + i as f64 * self.x_increment)
            .collect()
    }
}

/// Parse the declared byte count from a `CURV?` reply header: two fixed
/// bytes to skip, then an ASCII decimal length field.
pub fn parse_block_length(header: &[u8]) -> Result<usize, CurveError> {
    if header.len() <= CURVE_HEADER_BYTES {
        return Err(CurveError::TruncatedHeader(header.len()));
    }
    let digits = String::from_utf8_lossy(&header[CURVE_HEADER_BYTES..]);
    let digits = digits.trim();
    digits
        .parse()
        .map_err(|_| CurveError::LengthField(digits.to_string()))
}

/// Decode a binary curve payload into signed raw samples. 16-bit samples are
/// most-significant-byte-first, as selected at session setup.
pub fn decode_samples(payload: &[u8], width: SampleWidth) -> Result<Vec<i32>, CurveError> {
    match width {
        SampleWidth::Bits8 => Ok(payload
            .iter()
            .map(|&b| i32::from(i8::from_be_bytes([b])))
            .collect()),
        SampleWidth::Bits16 => {
            if payload.len() % 2 != 0 {
                return Err(CurveError::TrailingBytes {
                    len: payload.len(),
                    width: 2,
                });
            }
            Ok(payload
                .chunks_exact(2)
                .map(|pair| i32::from(i16::from_be_bytes([pair[0], pair[1]])))
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_tokens_round_trip() {
        for channel in Channel::ALL {
            assert_eq!(channel.as_str().parse::<Channel>().unwrap(), channel);
        }
        assert_eq!("ch3".parse::<Channel>().unwrap(), Channel::Ch3);
        assert!("CH5".parse::<Channel>().is_err());
    }

    #[test]
    fn width_tokens_parse() {
        assert_eq!("8bit".parse::<SampleWidth>().unwrap(), SampleWidth::Bits8);
        assert_eq!("16bit".parse::<SampleWidth>().unwrap(), SampleWidth::Bits16);
        assert!("24bit".parse::<SampleWidth>().is_err());
    }

    #[test]
    fn decode_16bit_big_endian() {
        let raw = [0x01i16, -2, 0x7fff, i16::MIN];
        let mut payload = Vec::new();
        for v in raw {
            payload.extend_from_slice(&v.to_be_bytes());
        }

        let decoded = decode_samples(&payload, SampleWidth::Bits16).unwrap();
        assert_eq!(decoded, vec![1, -2, 32767, -32768]);
    }

    #[test]
    fn decode_8bit_signed() {
        let payload = [0x00u8, 0x7f, 0x80, 0xff];
        let decoded = decode_samples(&payload, SampleWidth::Bits8).unwrap();
        assert_eq!(decoded, vec![0, 127, -128, -1]);
    }

    #[test]
    fn decode_rejects_odd_16bit_payload() {
        let err = decode_samples(&[0u8; 5], SampleWidth::Bits16).unwrap_err();
        assert!(matches!(err, CurveError::TrailingBytes { len: 5, width: 2 }));
    }

    #[test]
    fn block_length_skips_fixed_header() {
        assert_eq!(parse_block_length(b"#5100000").unwrap(), 100_000);
        assert_eq!(parse_block_length(b"#14\n").unwrap(), 4);
    }

    #[test]
    fn block_length_rejects_garbage() {
        assert!(matches!(
            parse_block_length(b"#1ab"),
            Err(CurveError::LengthField(_))
        ));
        assert!(matches!(
            parse_block_length(b"#5"),
            Err(CurveError::TruncatedHeader(2))
        ));
    }

    #[test]
    fn calibration_is_affine() {
        let cal = ChannelCalibration {
            y_multiplier: 1.0,
            y_offset: 0.0,
            y_unit: "\"V\"".to_string(),
            x_increment: 1.0,
            x_origin: 0.0,
            record_length: 3,
        };
        assert_eq!(cal.volts_from_raw(-7.0), -7.0);
        assert_eq!(cal.volts_from_raw(42.0), 42.0);

        let cal = ChannelCalibration {
            y_multiplier: 0.5,
            y_offset: 10.0,
            ..cal
        };
        assert_eq!(cal.volts_from_raw(14.0), 2.0);
    }

    #[test]
    fn time_axis_derivation() {
        let cal = ChannelCalibration {
            y_multiplier: 1.0,
            y_offset: 0.0,
            y_unit: "\"V\"".to_string(),
            x_increment: 1e-6,
            x_origin: 0.0,
            record_length: 5,
        };
        assert_eq!(cal.time_axis(), vec![0.0, 1e-6, 2e-6, 3e-6, 4e-6]);
    }
}
