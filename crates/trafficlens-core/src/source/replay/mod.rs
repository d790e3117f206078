//! PCAP/PCAPNG replay source.
//!
//! Replays a capture file through the same `FrameSource` interface as a live
//! interface, so capture mode can run offline and without privileges. The
//! replay backend exposes the file as a single pseudo-device.

pub mod layout;
pub mod parser;
pub mod reader;

use std::path::{Path, PathBuf};

pub use parser::PcapFileSource;

use super::{CaptureBackend, CaptureSettings, DeviceInfo, SourceError};

/// Backend that "captures" from a recorded file.
#[derive(Debug, Clone)]
pub struct PcapReplayBackend {
    path: PathBuf,
}

impl PcapReplayBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CaptureBackend for PcapReplayBackend {
    type Source = PcapFileSource;

    fn list_interfaces(&self) -> Result<Vec<DeviceInfo>, SourceError> {
        Ok(vec![DeviceInfo {
            name: self.path.display().to_string(),
            description: Some("capture file replay".to_string()),
        }])
    }

    fn open(
        &self,
        _device: &DeviceInfo,
        _settings: &CaptureSettings,
    ) -> Result<PcapFileSource, SourceError> {
        PcapFileSource::open(&self.path)
    }
}
