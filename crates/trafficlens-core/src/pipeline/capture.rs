use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::decode::decode;
use crate::source::{CaptureBackend, CaptureSettings, DeviceInfo, FrameEvent, FrameSource, SourceError};
use crate::store::{RecordLogOptions, RecordWriter, StoreError};

pub const DEFAULT_MAX_PACKETS: u64 = 10;
pub const DEFAULT_MAX_CONSECUTIVE_WRITE_FAILURES: u32 = 5;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no capture devices found")]
    NoDevicesFound,
    #[error("invalid device index {index} ({available} devices available)")]
    InvalidSelection { index: usize, available: usize },
    #[error("unknown interface '{0}'")]
    UnknownInterface(String),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// How the capture device is chosen from the enumerated list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSelector {
    /// Zero-based position in the enumeration order.
    Index(usize),
    Name(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Stop after this many stored records; `None` runs until stopped or the
    /// source runs dry.
    pub max_packets: Option<u64>,
    /// Abort once this many appends in a row have failed.
    pub max_consecutive_write_failures: u32,
    pub settings: CaptureSettings,
    pub log: RecordLogOptions,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            max_packets: Some(DEFAULT_MAX_PACKETS),
            max_consecutive_write_failures: DEFAULT_MAX_CONSECUTIVE_WRITE_FAILURES,
            settings: CaptureSettings::default(),
            log: RecordLogOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Records decoded and stored.
    pub captured: u64,
    /// Read windows that elapsed without a frame.
    pub timeouts: u64,
    pub write_failures: u64,
}

/// Pick the capture device.
///
/// # Examples
/// ```
/// use trafficlens_core::{DeviceInfo, DeviceSelector, select_device};
///
/// let devices = vec![
///     DeviceInfo { name: "lo".to_string(), description: None },
///     DeviceInfo { name: "eth0".to_string(), description: None },
/// ];
/// let device = select_device(&devices, &DeviceSelector::Index(1)).unwrap();
/// assert_eq!(device.name, "eth0");
/// assert!(select_device(&devices, &DeviceSelector::Index(2)).is_err());
/// ```
pub fn select_device<'a>(
    devices: &'a [DeviceInfo],
    selector: &DeviceSelector,
) -> Result<&'a DeviceInfo, CaptureError> {
    if devices.is_empty() {
        return Err(CaptureError::NoDevicesFound);
    }
    match selector {
        DeviceSelector::Index(index) => {
            devices
                .get(*index)
                .ok_or(CaptureError::InvalidSelection {
                    index: *index,
                    available: devices.len(),
                })
        }
        DeviceSelector::Name(name) => devices
            .iter()
            .find(|d| d.name == *name)
            .ok_or_else(|| CaptureError::UnknownInterface(name.clone())),
    }
}

/// Pull frames from `source` into `writer` until the packet limit, the end of
/// the source, or `stop` is raised.
///
/// The stop flag is checked once per iteration, so a raised flag is noticed
/// after at most one read timeout.
pub fn run_capture<S: FrameSource>(
    source: &mut S,
    writer: &mut RecordWriter,
    options: &CaptureOptions,
    stop: &AtomicBool,
) -> Result<CaptureStats, CaptureError> {
    let mut stats = CaptureStats::default();
    let mut consecutive_failures = 0u32;

    loop {
        if options.max_packets.is_some_and(|max| stats.captured >= max) {
            debug!(captured = stats.captured, "packet limit reached");
            break;
        }
        if stop.load(Ordering::SeqCst) {
            info!(captured = stats.captured, "capture stopped");
            break;
        }

        let frame = match source.next_frame()? {
            FrameEvent::Frame(frame) => frame,
            FrameEvent::Timeout => {
                stats.timeouts += 1;
                debug!("no frame within read timeout, still waiting");
                continue;
            }
            FrameEvent::Exhausted => {
                info!(captured = stats.captured, "capture source exhausted");
                break;
            }
        };

        let record = decode(&frame);
        match writer.append(&record) {
            Ok(()) => {
                consecutive_failures = 0;
                stats.captured += 1;
                debug!(
                    src = record.source_address(),
                    dst = record.dest_address(),
                    protocol = record.protocol(),
                    length = record.length(),
                    "captured"
                );
            }
            Err(err) => {
                stats.write_failures += 1;
                consecutive_failures += 1;
                warn!(error = %err, consecutive_failures, "failed to store record");
                if consecutive_failures >= options.max_consecutive_write_failures {
                    return Err(CaptureError::Store(err));
                }
            }
        }
    }

    Ok(stats)
}

/// Select a device on `backend`, open it, and store its frames at
/// `store_path`.
///
/// The device is opened before the store, so a device that cannot be opened
/// leaves no store behind. Both handles are dropped on every return path.
pub fn capture_to_store<B: CaptureBackend>(
    backend: &B,
    selector: &DeviceSelector,
    store_path: &Path,
    options: &CaptureOptions,
    stop: &AtomicBool,
) -> Result<CaptureStats, CaptureError> {
    let devices = backend.list_interfaces()?;
    let device = select_device(&devices, selector)?;
    info!(device = %device.name, "device selected");

    let mut source = backend.open(device, &options.settings)?;
    let mut writer = RecordWriter::open(store_path, &options.log)?;
    info!(
        device = %device.name,
        store = %store_path.display(),
        "capture started"
    );

    let stats = run_capture(&mut source, &mut writer, options, stop)?;
    info!(
        captured = stats.captured,
        timeouts = stats.timeouts,
        write_failures = stats.write_failures,
        "capture finished"
    );
    Ok(stats)
}
