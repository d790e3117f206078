//! Durable CSV record store.
//!
//! One record per line, columns `timestamp,src_ip,dst_ip,protocol,length`,
//! optionally followed by `src_port,dst_port`. Fields are never quoted. The
//! writer appends and flushes line by line; the reader tolerates a missing
//! header and skips lines it cannot parse.

pub mod error;
pub mod layout;
pub mod reader;
pub mod writer;

pub use error::{RowError, StoreError};
pub use reader::{read_all, read_from};
pub use writer::RecordWriter;

use crate::record::PacketRecord;

/// Column layout used when writing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Schema {
    /// The five core columns.
    #[default]
    Basic,
    /// Core columns plus source and destination ports.
    WithPorts,
}

impl Schema {
    pub fn columns(&self) -> &'static [&'static str] {
        const WITH_PORTS: [&str; 7] = [
            layout::BASIC_COLUMNS[0],
            layout::BASIC_COLUMNS[1],
            layout::BASIC_COLUMNS[2],
            layout::BASIC_COLUMNS[3],
            layout::BASIC_COLUMNS[4],
            layout::PORT_COLUMNS[0],
            layout::PORT_COLUMNS[1],
        ];
        match self {
            Schema::Basic => &layout::BASIC_COLUMNS,
            Schema::WithPorts => &WITH_PORTS,
        }
    }
}

/// Writer configuration.
///
/// # Examples
/// ```
/// use trafficlens_core::{RecordLogOptions, Schema};
///
/// let options = RecordLogOptions::default();
/// assert_eq!(options.schema, Schema::Basic);
/// assert!(!options.sync);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordLogOptions {
    pub schema: Schema,
    /// Call `sync_data` after every append, not just flush.
    pub sync: bool,
}

/// A store line that was not turned into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number in the store.
    pub line: u64,
    pub reason: RowError,
}

/// Everything `read_all` recovered from a store.
#[derive(Debug, Clone, Default)]
pub struct LoadedRecords {
    /// Records in file order.
    pub records: Vec<PacketRecord>,
    pub skipped: Vec<SkippedLine>,
}
