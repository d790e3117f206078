use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::warn;

use super::error::{RowError, StoreError};
use super::layout;
use super::{LoadedRecords, SkippedLine};
use crate::record::{PacketRecord, parse_timestamp};

/// Read every record of a store file, in file order.
///
/// # Errors
/// Only I/O failures are fatal; malformed lines end up in
/// `LoadedRecords::skipped`.
pub fn read_all(path: &Path) -> Result<LoadedRecords, StoreError> {
    let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
    read_from(file)
}

/// Read records from any byte stream in the store format.
///
/// # Examples
/// ```
/// use trafficlens_core::read_from;
///
/// let text = "timestamp,src_ip,dst_ip,protocol,length\n\
///             2024-01-01T00:00:00.000000,10.0.0.1,10.0.0.2,TCP,1500\n\
///             garbage\n";
/// let loaded = read_from(text.as_bytes()).unwrap();
/// assert_eq!(loaded.records.len(), 1);
/// assert_eq!(loaded.skipped.len(), 1);
/// ```
pub fn read_from<R: Read>(source: R) -> Result<LoadedRecords, StoreError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(source);

    let mut loaded = LoadedRecords::default();
    let mut row = StringRecord::new();
    let mut first = true;

    loop {
        let line = reader.position().line();
        match reader.read_record(&mut row) {
            Ok(false) => break,
            Ok(true) => {}
            Err(err) if err.is_io_error() => return Err(StoreError::Csv(err)),
            Err(err) => {
                skip(&mut loaded, line, RowError::Unreadable(err.to_string()));
                first = false;
                continue;
            }
        }
        let line = row.position().map(|p| p.line()).unwrap_or(line);

        if std::mem::take(&mut first) && is_header(&row) {
            continue;
        }
        match parse_row(&row) {
            Ok(record) => loaded.records.push(record),
            Err(reason) => skip(&mut loaded, line, reason),
        }
    }

    Ok(loaded)
}

fn skip(loaded: &mut LoadedRecords, line: u64, reason: RowError) {
    warn!(line, %reason, "skipping malformed store line");
    loaded.skipped.push(SkippedLine { line, reason });
}

fn is_header(row: &StringRecord) -> bool {
    row.iter()
        .any(|field| field.to_ascii_lowercase().contains(layout::HEADER_TOKEN))
}

/// Build a record from the five core fields, plus ports when the row has
/// them. Empty port fields mean "no port".
fn parse_row(row: &StringRecord) -> Result<PacketRecord, RowError> {
    if row.len() < layout::CORE_FIELD_COUNT {
        return Err(RowError::TooFewFields {
            needed: layout::CORE_FIELD_COUNT,
            actual: row.len(),
        });
    }
    let field = |index: usize| row.get(index).unwrap_or("");

    let raw_ts = field(layout::TIMESTAMP_FIELD);
    let timestamp = parse_timestamp(raw_ts).ok_or_else(|| RowError::Timestamp(raw_ts.into()))?;
    let raw_len = field(layout::LENGTH_FIELD);
    let length = raw_len
        .parse::<u32>()
        .map_err(|_| RowError::Length(raw_len.into()))?;

    let record = PacketRecord::new(
        timestamp,
        field(layout::SOURCE_FIELD),
        field(layout::DEST_FIELD),
        field(layout::PROTOCOL_FIELD),
        length,
    );

    let source_port = parse_port(field(layout::SOURCE_PORT_FIELD))?;
    let dest_port = parse_port(field(layout::DEST_PORT_FIELD))?;
    match (source_port, dest_port) {
        (Some(source), Some(dest)) => Ok(record.with_ports(source, dest)),
        _ => Ok(record),
    }
}

fn parse_port(raw: &str) -> Result<Option<u16>, RowError> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<u16>()
        .map(Some)
        .map_err(|_| RowError::Port(raw.into()))
}
