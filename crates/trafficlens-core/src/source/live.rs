//! Live interface capture through libpcap.
//!
//! Compiled only with the `live` feature; without it the backend still exists
//! but every operation reports `SourceError::LiveUnavailable`, so callers do
//! not need their own feature gates.

use super::{CaptureBackend, CaptureSettings, DeviceInfo, FrameEvent, FrameSource, SourceError};

/// Backend over the host's capture-capable interfaces.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiveCaptureBackend;

#[cfg(feature = "live")]
mod imp {
    use pcap::{Active, Capture, Device};
    use pcap_parser::Linktype;
    use tracing::info;

    use super::*;
    use crate::source::{Frame, timestamp_from_micros};

    /// Open libpcap handle. Dropping it closes the handle.
    pub struct LiveSource {
        capture: Capture<Active>,
        linktype: Linktype,
        device: String,
    }

    impl CaptureBackend for LiveCaptureBackend {
        type Source = LiveSource;

        fn list_interfaces(&self) -> Result<Vec<DeviceInfo>, SourceError> {
            let devices = Device::list().map_err(|e| SourceError::Enumerate(e.to_string()))?;
            Ok(devices
                .into_iter()
                .map(|device| DeviceInfo {
                    name: device.name,
                    description: device.desc,
                })
                .collect())
        }

        fn open(
            &self,
            device: &DeviceInfo,
            settings: &CaptureSettings,
        ) -> Result<LiveSource, SourceError> {
            let open_error = |e: pcap::Error| SourceError::Open {
                device: device.name.clone(),
                message: e.to_string(),
            };
            let timeout_ms = i32::try_from(settings.read_timeout.as_millis()).unwrap_or(i32::MAX);
            let snaplen = i32::try_from(settings.snaplen).unwrap_or(i32::MAX);

            let capture = Capture::from_device(device.name.as_str())
                .map_err(open_error)?
                .snaplen(snaplen)
                .promisc(settings.promiscuous)
                .timeout(timeout_ms)
                .open()
                .map_err(open_error)?;
            let linktype = Linktype(capture.get_datalink().0);
            info!(device = %device.name, linktype = linktype.0, "capture handle opened");

            Ok(LiveSource {
                capture,
                linktype,
                device: device.name.clone(),
            })
        }
    }

    impl FrameSource for LiveSource {
        fn next_frame(&mut self) -> Result<FrameEvent, SourceError> {
            match self.capture.next_packet() {
                Ok(packet) => {
                    let ts = packet.header.ts;
                    Ok(FrameEvent::Frame(Frame {
                        timestamp: timestamp_from_micros(ts.tv_sec as i64, ts.tv_usec as i64),
                        linktype: self.linktype,
                        data: packet.data.to_vec(),
                    }))
                }
                Err(pcap::Error::TimeoutExpired) => Ok(FrameEvent::Timeout),
                Err(pcap::Error::NoMorePackets) => Ok(FrameEvent::Exhausted),
                Err(e) => Err(SourceError::Capture(e.to_string())),
            }
        }
    }

    impl Drop for LiveSource {
        fn drop(&mut self) {
            info!(device = %self.device, "capture handle closed");
        }
    }
}

#[cfg(not(feature = "live"))]
mod imp {
    use super::*;

    /// Placeholder handle; never constructed without the `live` feature.
    #[derive(Debug)]
    pub struct LiveSource {
        _private: (),
    }

    impl CaptureBackend for LiveCaptureBackend {
        type Source = LiveSource;

        fn list_interfaces(&self) -> Result<Vec<DeviceInfo>, SourceError> {
            Err(SourceError::LiveUnavailable)
        }

        fn open(
            &self,
            _device: &DeviceInfo,
            _settings: &CaptureSettings,
        ) -> Result<LiveSource, SourceError> {
            Err(SourceError::LiveUnavailable)
        }
    }

    impl FrameSource for LiveSource {
        fn next_frame(&mut self) -> Result<FrameEvent, SourceError> {
            Err(SourceError::LiveUnavailable)
        }
    }
}

pub use imp::LiveSource;

#[cfg(all(test, not(feature = "live")))]
mod tests {
    use super::*;

    #[test]
    fn backend_reports_missing_support() {
        let err = LiveCaptureBackend.list_interfaces().unwrap_err();
        assert!(matches!(err, SourceError::LiveUnavailable));
    }
}
