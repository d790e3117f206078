use std::borrow::Cow;
use std::net::Ipv4Addr;

use super::layout;

/// IPv4 header fields kept from a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Layer {
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    /// IANA protocol number of the payload.
    pub protocol: u8,
    /// Total length field of the IPv4 header, in bytes.
    pub total_len: u16,
}

impl Ipv4Layer {
    /// Uppercase IANA keyword for the payload protocol.
    ///
    /// # Examples
    /// ```
    /// use std::net::Ipv4Addr;
    /// use trafficlens_core::Ipv4Layer;
    ///
    /// let layer = Ipv4Layer {
    ///     source: Ipv4Addr::LOCALHOST,
    ///     destination: Ipv4Addr::LOCALHOST,
    ///     protocol: 17,
    ///     total_len: 28,
    /// };
    /// assert_eq!(layer.protocol_name(), "UDP");
    /// ```
    pub fn protocol_name(&self) -> Cow<'static, str> {
        protocol_name(self.protocol)
    }
}

/// Transport header fields kept from a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportLayer {
    Tcp {
        source_port: u16,
        destination_port: u16,
    },
    Udp {
        source_port: u16,
        destination_port: u16,
    },
}

impl TransportLayer {
    pub fn ports(&self) -> (u16, u16) {
        match *self {
            TransportLayer::Tcp {
                source_port,
                destination_port,
            }
            | TransportLayer::Udp {
                source_port,
                destination_port,
            } => (source_port, destination_port),
        }
    }
}

/// Recognized layers of one frame, resolved once at parse time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameLayers {
    pub ipv4: Option<Ipv4Layer>,
    pub transport: Option<TransportLayer>,
}

pub(crate) fn protocol_name(number: u8) -> Cow<'static, str> {
    let keyword = match number {
        layout::IP_PROTO_ICMP => "ICMP",
        layout::IP_PROTO_IGMP => "IGMP",
        layout::IP_PROTO_IPIP => "IPIP",
        layout::IP_PROTO_TCP => "TCP",
        layout::IP_PROTO_UDP => "UDP",
        layout::IP_PROTO_IPV6 => "IPV6",
        layout::IP_PROTO_GRE => "GRE",
        layout::IP_PROTO_ESP => "ESP",
        layout::IP_PROTO_AH => "AH",
        layout::IP_PROTO_ICMPV6 => "ICMPV6",
        layout::IP_PROTO_OSPF => "OSPF",
        layout::IP_PROTO_PIM => "PIM",
        layout::IP_PROTO_VRRP => "VRRP",
        layout::IP_PROTO_SCTP => "SCTP",
        other => return Cow::Owned(format!("IP-{other}")),
    };
    Cow::Borrowed(keyword)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_protocols_use_keywords() {
        assert_eq!(protocol_name(6), "TCP");
        assert_eq!(protocol_name(1), "ICMP");
        assert_eq!(protocol_name(132), "SCTP");
    }

    #[test]
    fn unknown_protocols_use_number() {
        assert_eq!(protocol_name(253), "IP-253");
    }

    #[test]
    fn ports_are_shared_between_variants() {
        let tcp = TransportLayer::Tcp {
            source_port: 1,
            destination_port: 2,
        };
        let udp = TransportLayer::Udp {
            source_port: 3,
            destination_port: 4,
        };
        assert_eq!(tcp.ports(), (1, 2));
        assert_eq!(udp.ports(), (3, 4));
    }
}
