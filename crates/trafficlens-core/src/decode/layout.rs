/// DLT_IPV4: bare IPv4 without a link header.
pub const LINKTYPE_IPV4: i32 = 228;

pub const IP_PROTO_ICMP: u8 = 1;
pub const IP_PROTO_IGMP: u8 = 2;
pub const IP_PROTO_IPIP: u8 = 4;
pub const IP_PROTO_TCP: u8 = 6;
pub const IP_PROTO_UDP: u8 = 17;
pub const IP_PROTO_IPV6: u8 = 41;
pub const IP_PROTO_GRE: u8 = 47;
pub const IP_PROTO_ESP: u8 = 50;
pub const IP_PROTO_AH: u8 = 51;
pub const IP_PROTO_ICMPV6: u8 = 58;
pub const IP_PROTO_OSPF: u8 = 89;
pub const IP_PROTO_PIM: u8 = 103;
pub const IP_PROTO_VRRP: u8 = 112;
pub const IP_PROTO_SCTP: u8 = 132;
