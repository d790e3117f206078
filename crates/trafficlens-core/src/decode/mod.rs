//! Frame decoding into `PacketRecord`s.
//!
//! `parse_layers` resolves the IPv4 and TCP/UDP layers of a frame once and
//! returns them as plain tagged data; `decode` maps that onto a record.
//! Decoding is pure and never fails: anything that cannot be sliced, or that
//! carries no IPv4 header, becomes the empty record.

pub mod error;
pub mod layers;
pub mod layout;
pub mod parser;

pub use error::DecodeError;
pub use layers::{FrameLayers, Ipv4Layer, TransportLayer};
pub use parser::parse_layers;

use time::OffsetDateTime;
use tracing::debug;

use crate::record::PacketRecord;
use crate::source::Frame;

/// Decode one frame. Frames without a timestamp are stamped with the current
/// UTC time.
pub fn decode(frame: &Frame) -> PacketRecord {
    let timestamp = frame.timestamp.unwrap_or_else(OffsetDateTime::now_utc);
    match parse_layers(frame.linktype, &frame.data) {
        Ok(layers) => record_from_layers(timestamp, &layers),
        Err(err) => {
            debug!(error = %err, bytes = frame.data.len(), "frame has no decodable IPv4 layer");
            PacketRecord::empty(timestamp)
        }
    }
}

/// Ports are attached only when the IPv4 protocol number agrees with the
/// transport layer that was sliced.
pub(crate) fn record_from_layers(timestamp: OffsetDateTime, layers: &FrameLayers) -> PacketRecord {
    let Some(ipv4) = layers.ipv4 else {
        return PacketRecord::empty(timestamp);
    };

    let record = PacketRecord::new(
        timestamp,
        ipv4.source.to_string(),
        ipv4.destination.to_string(),
        ipv4.protocol_name(),
        u32::from(ipv4.total_len),
    );

    match layers.transport {
        Some(TransportLayer::Tcp {
            source_port,
            destination_port,
        }) if ipv4.protocol == layout::IP_PROTO_TCP => {
            record.with_ports(source_port, destination_port)
        }
        Some(TransportLayer::Udp {
            source_port,
            destination_port,
        }) if ipv4.protocol == layout::IP_PROTO_UDP => {
            record.with_ports(source_port, destination_port)
        }
        _ => record,
    }
}
