use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

const STORE_TIMESTAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]");

const STORE_TIMESTAMP_LENIENT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]");

const NANOS_PER_MICRO: i128 = 1_000;

/// Normalized header fields of one captured frame.
///
/// Records are immutable: fields are set at construction and only exposed
/// through accessors. Ports come as a pair, so a record either carries both
/// or neither.
///
/// # Examples
/// ```
/// use time::macros::datetime;
/// use trafficlens_core::PacketRecord;
///
/// let record = PacketRecord::new(
///     datetime!(2024-01-01 00:00:00 UTC),
///     "10.0.0.1",
///     "10.0.0.2",
///     "TCP",
///     1500,
/// )
/// .with_ports(40000, 443);
/// assert_eq!(record.dest_port(), Some(443));
/// assert!(record.has_ipv4());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketRecord {
    timestamp: OffsetDateTime,
    source_address: String,
    dest_address: String,
    protocol: String,
    length: u32,
    ports: Option<(u16, u16)>,
}

impl PacketRecord {
    pub fn new(
        timestamp: OffsetDateTime,
        source_address: impl Into<String>,
        dest_address: impl Into<String>,
        protocol: impl Into<String>,
        length: u32,
    ) -> Self {
        Self {
            timestamp: truncate_to_micros(timestamp),
            source_address: source_address.into(),
            dest_address: dest_address.into(),
            protocol: protocol.into(),
            length,
            ports: None,
        }
    }

    /// Record for a frame that carried no IPv4 layer.
    pub fn empty(timestamp: OffsetDateTime) -> Self {
        Self::new(timestamp, "", "", "", 0)
    }

    pub fn with_ports(self, source_port: u16, dest_port: u16) -> Self {
        Self {
            ports: Some((source_port, dest_port)),
            ..self
        }
    }

    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    pub fn source_address(&self) -> &str {
        &self.source_address
    }

    pub fn dest_address(&self) -> &str {
        &self.dest_address
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn source_port(&self) -> Option<u16> {
        self.ports.map(|(source, _)| source)
    }

    pub fn dest_port(&self) -> Option<u16> {
        self.ports.map(|(_, dest)| dest)
    }

    pub fn has_ipv4(&self) -> bool {
        !self.source_address.is_empty() || !self.dest_address.is_empty()
    }
}

/// Format a timestamp in the store encoding (`yyyy-MM-ddTHH:mm:ss.SSSSSS`, UTC).
///
/// # Examples
/// ```
/// use time::macros::datetime;
/// use trafficlens_core::format_timestamp;
///
/// let text = format_timestamp(datetime!(2024-01-01 00:00:00.5 UTC)).unwrap();
/// assert_eq!(text, "2024-01-01T00:00:00.500000");
/// ```
///
/// # Errors
/// Returns `time::error::Format` when the year cannot be represented.
pub fn format_timestamp(timestamp: OffsetDateTime) -> Result<String, time::error::Format> {
    timestamp
        .to_offset(time::UtcOffset::UTC)
        .format(STORE_TIMESTAMP)
}

/// Parse a store timestamp.
///
/// Accepts the store encoding with any number of fractional digits (or none),
/// an optional trailing `Z`, and full RFC3339 values with explicit offsets.
///
/// # Examples
/// ```
/// use trafficlens_core::parse_timestamp;
///
/// let a = parse_timestamp("2024-01-01T00:00:00.500000").unwrap();
/// let b = parse_timestamp("2024-01-01T00:00:00.5Z").unwrap();
/// assert_eq!(a, b);
/// ```
pub fn parse_timestamp(text: &str) -> Option<OffsetDateTime> {
    let bare = text.strip_suffix(['Z', 'z']).unwrap_or(text);
    if let Ok(naive) = PrimitiveDateTime::parse(bare, STORE_TIMESTAMP_LENIENT) {
        return Some(truncate_to_micros(naive.assume_utc()));
    }
    OffsetDateTime::parse(text, &Rfc3339)
        .ok()
        .map(|ts| truncate_to_micros(ts.to_offset(time::UtcOffset::UTC)))
}

pub(crate) fn truncate_to_micros(timestamp: OffsetDateTime) -> OffsetDateTime {
    let nanos = timestamp.unix_timestamp_nanos();
    OffsetDateTime::from_unix_timestamp_nanos(nanos - nanos.rem_euclid(NANOS_PER_MICRO))
        .unwrap_or(timestamp)
}
