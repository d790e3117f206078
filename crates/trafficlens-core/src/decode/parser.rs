use etherparse::{LaxNetSlice, LaxSlicedPacket, TransportSlice};
use pcap_parser::Linktype;

use super::error::DecodeError;
use super::layers::{FrameLayers, Ipv4Layer, TransportLayer};
use super::layout;

/// Slice a link-layer frame and keep the IPv4/TCP/UDP header fields.
///
/// Slicing is lax: an IPv4 header is kept even when the capture cut off
/// part of its payload, and a transport header that was cut short is left
/// out. Missing layers show up as `None`; only frames whose link or IP
/// header cannot be read return an error.
///
/// # Examples
/// ```
/// use etherparse::PacketBuilder;
/// use pcap_parser::Linktype;
/// use trafficlens_core::{TransportLayer, parse_layers};
///
/// let builder = PacketBuilder::ethernet2([1; 6], [2; 6])
///     .ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64)
///     .udp(5353, 53);
/// let mut frame = Vec::new();
/// builder.write(&mut frame, &[0u8; 4]).unwrap();
///
/// let layers = parse_layers(Linktype::ETHERNET, &frame).unwrap();
/// assert_eq!(layers.ipv4.unwrap().total_len, 32);
/// assert!(matches!(layers.transport, Some(TransportLayer::Udp { .. })));
/// ```
pub fn parse_layers(linktype: Linktype, data: &[u8]) -> Result<FrameLayers, DecodeError> {
    let sliced = match linktype {
        Linktype::ETHERNET => {
            LaxSlicedPacket::from_ethernet(data).map_err(|e| DecodeError::Slice(e.to_string()))?
        }
        lt if lt == Linktype::RAW || lt.0 == layout::LINKTYPE_IPV4 => {
            LaxSlicedPacket::from_ip(data).map_err(|e| DecodeError::Slice(e.to_string()))?
        }
        other => return Err(DecodeError::UnsupportedLinktype(other.0)),
    };

    let ipv4 = match &sliced.net {
        Some(LaxNetSlice::Ipv4(ipv4)) => {
            let header = ipv4.header();
            Some(Ipv4Layer {
                source: header.source_addr(),
                destination: header.destination_addr(),
                protocol: header.protocol().0,
                total_len: header.total_len(),
            })
        }
        _ => None,
    };

    let transport = match &sliced.transport {
        Some(TransportSlice::Tcp(tcp)) => Some(TransportLayer::Tcp {
            source_port: tcp.source_port(),
            destination_port: tcp.destination_port(),
        }),
        Some(TransportSlice::Udp(udp)) => Some(TransportLayer::Udp {
            source_port: udp.source_port(),
            destination_port: udp.destination_port(),
        }),
        _ => None,
    };

    Ok(FrameLayers { ipv4, transport })
}
