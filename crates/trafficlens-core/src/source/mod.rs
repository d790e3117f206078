//! Frame sources: the boundary to the packet-capture engine.
//!
//! The rest of the crate only sees "next frame, timeout, or end" through
//! `FrameSource`, and "list interfaces / open one" through `CaptureBackend`.
//! Two backends exist: pcap/pcapng file replay and live libpcap capture
//! (the latter behind the `live` feature).

mod live;
mod replay;

pub use live::{LiveCaptureBackend, LiveSource};
pub use replay::{PcapFileSource, PcapReplayBackend};

use std::time::Duration;

use pcap_parser::Linktype;
use thiserror::Error;
use time::OffsetDateTime;

/// One captured link-layer frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Capture time reported by the engine, when available.
    pub timestamp: Option<OffsetDateTime>,
    pub linktype: Linktype,
    pub data: Vec<u8>,
}

/// Outcome of a single blocking read.
#[derive(Debug, Clone)]
pub enum FrameEvent {
    Frame(Frame),
    /// No frame arrived within the read window. Expected on quiet links.
    Timeout,
    /// The source has no more frames (end of file, closed handle).
    Exhausted,
}

pub trait FrameSource {
    fn next_frame(&mut self) -> Result<FrameEvent, SourceError>;
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn next_frame(&mut self) -> Result<FrameEvent, SourceError> {
        (**self).next_frame()
    }
}

/// A capture-capable interface as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub description: Option<String>,
}

/// Parameters used when opening a device.
///
/// # Examples
/// ```
/// use trafficlens_core::CaptureSettings;
///
/// let settings = CaptureSettings::default();
/// assert_eq!(settings.snaplen, 65_536);
/// assert!(settings.promiscuous);
/// assert_eq!(settings.read_timeout.as_secs(), 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    /// Maximum bytes captured per frame.
    pub snaplen: u32,
    pub promiscuous: bool,
    /// Read window for one `next_frame` call.
    pub read_timeout: Duration,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            snaplen: 65_536,
            promiscuous: true,
            read_timeout: Duration::from_secs(10),
        }
    }
}

/// Device enumeration and opening.
pub trait CaptureBackend {
    type Source: FrameSource;

    fn list_interfaces(&self) -> Result<Vec<DeviceInfo>, SourceError>;

    fn open(
        &self,
        device: &DeviceInfo,
        settings: &CaptureSettings,
    ) -> Result<Self::Source, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("capture file error ({context}): {message}")]
    Pcap {
        context: &'static str,
        message: String,
    },
    #[error("cannot open device '{device}': {message}")]
    Open { device: String, message: String },
    #[error("cannot enumerate capture devices: {0}")]
    Enumerate(String),
    #[error("capture error: {0}")]
    Capture(String),
    #[error("live capture support was not compiled in")]
    LiveUnavailable,
}

/// Convert a seconds/microseconds pair into a UTC timestamp.
#[cfg(any(feature = "live", test))]
pub(crate) fn timestamp_from_micros(seconds: i64, micros: i64) -> Option<OffsetDateTime> {
    let nanos = i128::from(seconds) * 1_000_000_000 + i128::from(micros) * 1_000;
    OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()
}

#[cfg(test)]
mod tests {
    use super::timestamp_from_micros;
    use time::macros::datetime;

    #[test]
    fn timestamp_from_micros_builds_utc_instant() {
        let ts = timestamp_from_micros(1_704_067_200, 500_000).unwrap();
        assert_eq!(ts, datetime!(2024-01-01 00:00:00.5 UTC));
    }

    #[test]
    fn timestamp_from_micros_rejects_out_of_range() {
        assert!(timestamp_from_micros(i64::MAX, 0).is_none());
    }
}
