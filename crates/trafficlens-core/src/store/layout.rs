pub const BASIC_COLUMNS: [&str; 5] = ["timestamp", "src_ip", "dst_ip", "protocol", "length"];
pub const PORT_COLUMNS: [&str; 2] = ["src_port", "dst_port"];

/// A first line containing this token (any case) is treated as the header.
pub const HEADER_TOKEN: &str = "timestamp";

pub const TIMESTAMP_FIELD: usize = 0;
pub const SOURCE_FIELD: usize = 1;
pub const DEST_FIELD: usize = 2;
pub const PROTOCOL_FIELD: usize = 3;
pub const LENGTH_FIELD: usize = 4;
pub const SOURCE_PORT_FIELD: usize = 5;
pub const DEST_PORT_FIELD: usize = 6;

pub const CORE_FIELD_COUNT: usize = BASIC_COLUMNS.len();
