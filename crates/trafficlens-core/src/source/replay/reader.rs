use std::io::{Read, Seek};

use pcap_parser::Linktype;
use time::OffsetDateTime;

use super::layout;
use crate::source::SourceError;

/// Container format of a capture file, judged from its first block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureFormat {
    Legacy,
    PcapNg,
}

/// Peek at the leading magic and leave the reader where it started.
///
/// # Errors
/// Returns `SourceError::Io` when the file holds fewer than four bytes or
/// cannot be rewound.
pub fn sniff_format<R: Read + Seek>(reader: &mut R) -> Result<CaptureFormat, SourceError> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    reader.rewind()?;
    Ok(if magic == layout::PCAPNG_MAGIC {
        CaptureFormat::PcapNg
    } else {
        CaptureFormat::Legacy
    })
}

/// Ticks per second of a capture clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickRate(u64);

impl TickRate {
    pub const MICROS: TickRate = TickRate(1_000_000);
    pub const NANOS: TickRate = TickRate(1_000_000_000);

    /// Decode a pcapng `if_tsresol` value: the low seven bits are a negative
    /// exponent of 10, or of 2 when the high bit is set.
    pub fn from_tsresol(tsresol: u8) -> Option<Self> {
        let exponent = u32::from(tsresol & !layout::TSRESOL_BASE2_FLAG);
        let base: u64 = if tsresol & layout::TSRESOL_BASE2_FLAG == 0 {
            10
        } else {
            2
        };
        base.checked_pow(exponent).map(TickRate)
    }

    /// Instant at `seconds` plus `ticks` of this clock past the Unix epoch.
    pub fn instant(self, seconds: i64, ticks: u64) -> Option<OffsetDateTime> {
        let fraction = i128::from(ticks) * 1_000_000_000 / i128::from(self.0);
        let nanos = i128::from(seconds) * 1_000_000_000 + fraction;
        OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()
    }

    /// Instant of a 64-bit tick counter split into high and low words.
    pub fn instant_from_counter(
        self,
        high: u32,
        low: u32,
        offset_seconds: i64,
    ) -> Option<OffsetDateTime> {
        let counter = (u64::from(high) << 32) | u64::from(low);
        let seconds = i64::try_from(counter / self.0).ok()?.checked_add(offset_seconds)?;
        self.instant(seconds, counter % self.0)
    }
}

/// Link type and clock of one capture interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceClock {
    pub linktype: Linktype,
    pub rate: TickRate,
    /// `if_tsoffset`: seconds added to every timestamp.
    pub offset_seconds: i64,
}

impl Default for InterfaceClock {
    fn default() -> Self {
        Self {
            linktype: Linktype::ETHERNET,
            rate: TickRate::MICROS,
            offset_seconds: 0,
        }
    }
}

impl InterfaceClock {
    /// Clock of a pcapng interface. An unusable `if_tsresol` falls back to
    /// microseconds.
    pub fn pcapng(linktype: Linktype, tsresol: u8, offset_seconds: i64) -> Self {
        Self {
            linktype,
            rate: TickRate::from_tsresol(tsresol).unwrap_or(TickRate::MICROS),
            offset_seconds,
        }
    }

    /// Clock of a legacy pcap file, from its header.
    pub fn legacy(linktype: Linktype, nanosecond: bool) -> Self {
        Self {
            linktype,
            rate: if nanosecond { TickRate::NANOS } else { TickRate::MICROS },
            offset_seconds: 0,
        }
    }
}

/// Interface a pcapng packet refers to. Unknown ids get the default clock.
pub fn interface_clock(interfaces: &[InterfaceClock], if_id: u32) -> InterfaceClock {
    usize::try_from(if_id)
        .ok()
        .and_then(|index| interfaces.get(index))
        .copied()
        .unwrap_or_default()
}
