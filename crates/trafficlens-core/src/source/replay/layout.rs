pub const PCAP_READER_BUFFER_SIZE: usize = 64 * 1024;

pub const PCAPNG_MAGIC: [u8; 4] = [0x0a, 0x0d, 0x0d, 0x0a];

/// High bit of pcapng `if_tsresol`: the exponent is a power of two.
pub const TSRESOL_BASE2_FLAG: u8 = 0x80;
