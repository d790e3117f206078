#![allow(dead_code)]

use std::fs;
use std::path::Path;

use etherparse::PacketBuilder;

/// Ethernet frame carrying IPv4/TCP with `payload_len` zero bytes.
pub fn tcp_frame(src: [u8; 4], dst: [u8; 4], ports: (u16, u16), payload_len: usize) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2([0x02, 0, 0, 0, 0, 1], [0x02, 0, 0, 0, 0, 2])
        .ipv4(src, dst, 64)
        .tcp(ports.0, ports.1, 1, 1024);
    let mut frame = Vec::new();
    builder.write(&mut frame, &vec![0u8; payload_len]).unwrap();
    frame
}

/// Ethernet frame carrying IPv4/UDP with `payload_len` zero bytes.
pub fn udp_frame(src: [u8; 4], dst: [u8; 4], ports: (u16, u16), payload_len: usize) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2([0x02, 0, 0, 0, 0, 1], [0x02, 0, 0, 0, 0, 2])
        .ipv4(src, dst, 64)
        .udp(ports.0, ports.1);
    let mut frame = Vec::new();
    builder.write(&mut frame, &vec![0u8; payload_len]).unwrap();
    frame
}

/// Ethernet frame carrying ARP, which has no IPv4 layer.
pub fn arp_frame() -> Vec<u8> {
    let mut frame = vec![0xff; 6];
    frame.extend_from_slice(&[0x02, 0, 0, 0, 0, 1, 0x08, 0x06]);
    frame.extend_from_slice(&[0u8; 28]);
    frame
}

pub const MICROSECOND_MAGIC: u32 = 0xa1b2_c3d4;
pub const NANOSECOND_MAGIC: u32 = 0xa1b2_3c4d;

/// Little-endian microsecond pcap file with an Ethernet link type.
/// Each packet is `(ts_sec, ts_usec, frame)`.
pub fn legacy_pcap(packets: &[(u32, u32, Vec<u8>)]) -> Vec<u8> {
    legacy_pcap_with_magic(MICROSECOND_MAGIC, packets)
}

/// Like `legacy_pcap`, but the magic picks the fraction unit.
pub fn legacy_pcap_with_magic(magic: u32, packets: &[(u32, u32, Vec<u8>)]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&magic.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&4u16.to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&65_535u32.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    for (ts_sec, ts_usec, frame) in packets {
        let len = frame.len() as u32;
        out.extend_from_slice(&ts_sec.to_le_bytes());
        out.extend_from_slice(&ts_usec.to_le_bytes());
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(frame);
    }
    out
}

/// Little-endian pcapng file with one Ethernet interface whose
/// `if_tsresol` is `tsresol`. Each packet is `(ticks, frame)`.
pub fn pcapng_with_tsresol(tsresol: u8, packets: &[(u64, Vec<u8>)]) -> Vec<u8> {
    let mut out = Vec::new();
    // section header
    for word in [0x0a0d_0d0au32, 28, 0x1a2b_3c4d, 1] {
        out.extend_from_slice(&word.to_le_bytes());
    }
    out.extend_from_slice(&(-1i64).to_le_bytes());
    out.extend_from_slice(&28u32.to_le_bytes());
    // interface description: if_tsresol option, then end of options
    for word in [1u32, 32, 1, 65_535, 0x0001_0009] {
        out.extend_from_slice(&word.to_le_bytes());
    }
    out.extend_from_slice(&[tsresol, 0, 0, 0]);
    for word in [0u32, 32] {
        out.extend_from_slice(&word.to_le_bytes());
    }
    for (ticks, frame) in packets {
        let padded = frame.len().div_ceil(4) * 4;
        let total = (32 + padded) as u32;
        let len = frame.len() as u32;
        for word in [6u32, total, 0, (ticks >> 32) as u32, *ticks as u32, len, len] {
            out.extend_from_slice(&word.to_le_bytes());
        }
        out.extend_from_slice(frame);
        out.resize(out.len() + padded - frame.len(), 0);
        out.extend_from_slice(&total.to_le_bytes());
    }
    out
}

pub fn write_pcap(path: &Path, packets: &[(u32, u32, Vec<u8>)]) {
    fs::write(path, legacy_pcap(packets)).unwrap();
}

/// 2024-01-01T00:00:00Z
pub const JAN_1_2024: u32 = 1_704_067_200;
