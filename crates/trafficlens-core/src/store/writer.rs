use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator, WriterBuilder};
use tracing::{debug, info};

use super::error::StoreError;
use super::{RecordLogOptions, Schema};
use crate::record::{PacketRecord, format_timestamp};

/// Append-only writer over a record store file.
///
/// Every `append` is its own durability point: the line is flushed to the
/// operating system before the call returns, and optionally synced to disk.
/// The file handle is released when the writer is dropped.
pub struct RecordWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
    schema: Schema,
    sync: bool,
    appended: u64,
}

impl RecordWriter {
    /// Open (or create) the store. A header line is written only when the
    /// file is new or empty.
    pub fn open(path: &Path, options: &RecordLogOptions) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
            }
        }

        let is_new = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| StoreError::io(path, e))?;
        let writer = WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .quote_style(QuoteStyle::Never)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(file);

        let mut store = Self {
            path: path.to_path_buf(),
            writer,
            schema: options.schema,
            sync: options.sync,
            appended: 0,
        };
        if is_new {
            store.writer.write_record(options.schema.columns())?;
            store.commit()?;
            debug!(path = %path.display(), "record store created");
        }
        info!(path = %path.display(), schema = ?options.schema, "record store opened");
        Ok(store)
    }

    pub fn append(&mut self, record: &PacketRecord) -> Result<(), StoreError> {
        let timestamp = format_timestamp(record.timestamp())?;
        let length = record.length().to_string();
        let core = [
            timestamp.as_str(),
            record.source_address(),
            record.dest_address(),
            record.protocol(),
            length.as_str(),
        ];

        match self.schema {
            Schema::Basic => self.writer.write_record(core)?,
            Schema::WithPorts => {
                let source_port = record.source_port().map(|p| p.to_string());
                let dest_port = record.dest_port().map(|p| p.to_string());
                let ports = [
                    source_port.as_deref().unwrap_or(""),
                    dest_port.as_deref().unwrap_or(""),
                ];
                self.writer.write_record(core.iter().chain(ports.iter()))?;
            }
        }
        self.commit()?;
        self.appended += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records appended through this writer.
    pub fn appended(&self) -> u64 {
        self.appended
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.writer
            .flush()
            .map_err(|e| StoreError::io(&self.path, e))?;
        if self.sync {
            self.writer
                .get_ref()
                .sync_data()
                .map_err(|e| StoreError::io(&self.path, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use time::macros::datetime;

    fn sample() -> PacketRecord {
        PacketRecord::new(
            datetime!(2024-01-01 00:00:00 UTC),
            "10.0.0.1",
            "10.0.0.2",
            "TCP",
            1500,
        )
        .with_ports(40000, 443)
    }

    #[test]
    fn new_store_gets_header_then_lines() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data").join("packets.csv");

        let mut writer = RecordWriter::open(&path, &RecordLogOptions::default()).unwrap();
        writer.append(&sample()).unwrap();
        assert_eq!(writer.appended(), 1);

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "timestamp,src_ip,dst_ip,protocol,length\n\
             2024-01-01T00:00:00.000000,10.0.0.1,10.0.0.2,TCP,1500\n"
        );
    }

    #[test]
    fn reopening_appends_without_second_header() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("packets.csv");

        for _ in 0..2 {
            let mut writer = RecordWriter::open(&path, &RecordLogOptions::default()).unwrap();
            writer.append(&sample()).unwrap();
        }

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert_eq!(text.matches("timestamp").count(), 1);
    }

    #[test]
    fn append_is_visible_before_drop() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("packets.csv");
        let options = RecordLogOptions {
            sync: true,
            ..RecordLogOptions::default()
        };

        let mut writer = RecordWriter::open(&path, &options).unwrap();
        writer.append(&sample()).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.ends_with(",1500\n"));
        drop(writer);
    }

    #[test]
    fn port_schema_writes_empty_fields_for_portless_records() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("packets.csv");
        let options = RecordLogOptions {
            schema: Schema::WithPorts,
            ..RecordLogOptions::default()
        };

        let mut writer = RecordWriter::open(&path, &options).unwrap();
        writer.append(&sample()).unwrap();
        writer
            .append(&PacketRecord::empty(datetime!(2024-01-01 00:00:01 UTC)))
            .unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines[0],
            "timestamp,src_ip,dst_ip,protocol,length,src_port,dst_port"
        );
        assert_eq!(
            lines[1],
            "2024-01-01T00:00:00.000000,10.0.0.1,10.0.0.2,TCP,1500,40000,443"
        );
        assert_eq!(lines[2], "2024-01-01T00:00:01.000000,,,,0,,");
    }
}
