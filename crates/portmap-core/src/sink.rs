//! Destinations for correlated mappings

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::entry::CorrelatedMapping;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Failed to write mapping output: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to encode CSV record: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to encode JSON record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Anything mappings can be written through
pub trait MappingSink {
    fn write(&mut self, mapping: &CorrelatedMapping) -> Result<(), SinkError>;

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Tabular output with a fixed header row
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    /// Wrap a writer and emit the header row straight away
    pub fn new(inner: W) -> Result<Self, SinkError> {
        Self::with_header(inner, true)
    }

    /// The header row is written up front so that a run without mappings
    /// still leaves a header-only file.
    pub fn with_header(inner: W, header: bool) -> Result<Self, SinkError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        if header {
            writer.write_record(CorrelatedMapping::FIELDS)?;
        }
        Ok(Self { writer })
    }

    pub fn into_inner(self) -> Result<W, SinkError> {
        self.writer
            .into_inner()
            .map_err(|e| SinkError::Io(e.into_error()))
    }
}

impl CsvSink<BufWriter<File>> {
    /// Open `path` for writing
    ///
    /// With `append` set, records go to the end of an existing file and the
    /// header is only written when the file is new or empty.
    pub fn create(path: &Path, append: bool) -> Result<Self, SinkError> {
        let file = if append {
            OpenOptions::new().create(true).append(true).open(path)?
        } else {
            File::create(path)?
        };
        let header = file.metadata()?.len() == 0;
        debug!(path = %path.display(), append, header, "Opened CSV output");
        Self::with_header(BufWriter::new(file), header)
    }
}

impl<W: Write> MappingSink for CsvSink<W> {
    fn write(&mut self, mapping: &CorrelatedMapping) -> Result<(), SinkError> {
        self.writer.serialize(mapping)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// One JSON object per line
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLinesSink<BufWriter<File>> {
    pub fn create(path: &Path, append: bool) -> Result<Self, SinkError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> MappingSink for JsonLinesSink<W> {
    fn write(&mut self, mapping: &CorrelatedMapping) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, mapping)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps mappings in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub mappings: Vec<CorrelatedMapping>,
}

impl MappingSink for MemorySink {
    fn write(&mut self, mapping: &CorrelatedMapping) -> Result<(), SinkError> {
        self.mappings.push(mapping.clone());
        Ok(())
    }
}

impl<S: MappingSink + ?Sized> MappingSink for Box<S> {
    fn write(&mut self, mapping: &CorrelatedMapping) -> Result<(), SinkError> {
        (**self).write(mapping)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        (**self).flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn mapping(ip: [u8; 4], interface: &str) -> CorrelatedMapping {
        CorrelatedMapping {
            ip_address: Ipv4Addr::from(ip),
            mac_address: "0011.2233.4455".parse().unwrap(),
            switch_name: "SW-A".to_string(),
            switch_ip_address: "192.168.2.1".to_string(),
            interface: interface.to_string(),
            vlan: 10,
        }
    }

    #[test]
    fn test_csv_header_and_rows() {
        let mut sink = CsvSink::new(Vec::new()).unwrap();
        sink.write(&mapping([10, 0, 0, 5], "Gi0/1")).unwrap();
        sink.write(&mapping([10, 0, 0, 6], "Gi0/2")).unwrap();
        let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                "ip_address,mac_address,switch_name,switch_ip_address,interface,vlan",
                "10.0.0.5,0011.2233.4455,SW-A,192.168.2.1,Gi0/1,10",
                "10.0.0.6,0011.2233.4455,SW-A,192.168.2.1,Gi0/2,10",
            ]
        );
    }

    #[test]
    fn test_csv_no_rows_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("port_maps.csv");

        let mut sink = CsvSink::create(&path, false).unwrap();
        sink.flush().unwrap();
        drop(sink);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "ip_address,mac_address,switch_name,switch_ip_address,interface,vlan\n"
        );
    }

    #[test]
    fn test_csv_without_header() {
        let mut sink = CsvSink::with_header(Vec::new(), false).unwrap();
        sink.write(&mapping([10, 0, 0, 5], "Gi0/1")).unwrap();
        let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        assert_eq!(out, "10.0.0.5,0011.2233.4455,SW-A,192.168.2.1,Gi0/1,10\n");
    }

    #[test]
    fn test_csv_append_skips_header_on_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("port_maps.csv");

        let mut first = CsvSink::create(&path, true).unwrap();
        first.write(&mapping([10, 0, 0, 5], "Gi0/1")).unwrap();
        first.flush().unwrap();
        drop(first);

        let mut second = CsvSink::create(&path, true).unwrap();
        second.write(&mapping([10, 0, 0, 6], "Gi0/2")).unwrap();
        second.flush().unwrap();
        drop(second);

        let mut empty = CsvSink::create(&path, true).unwrap();
        empty.flush().unwrap();
        drop(empty);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
        assert_eq!(content.matches("ip_address,").count(), 1);
    }

    #[test]
    fn test_csv_create_truncates_without_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("port_maps.csv");
        std::fs::write(&path, "stale\n").unwrap();

        let mut sink = CsvSink::create(&path, false).unwrap();
        sink.write(&mapping([10, 0, 0, 5], "Gi0/1")).unwrap();
        sink.flush().unwrap();
        drop(sink);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("ip_address,"));
        assert!(!content.contains("stale"));
    }

    #[test]
    fn test_json_lines() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.write(&mapping([10, 0, 0, 5], "Gi0/1")).unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        let value: serde_json::Value = serde_json::from_str(out.trim_end()).unwrap();
        assert_eq!(value["ip_address"], "10.0.0.5");
        assert_eq!(value["mac_address"], "0011.2233.4455");
        assert_eq!(value["vlan"], 10);
    }

    #[test]
    fn test_memory_sink_through_box() {
        let mut sink = Box::new(MemorySink::default());
        MappingSink::write(&mut sink, &mapping([10, 0, 0, 5], "Gi0/1")).unwrap();
        MappingSink::flush(&mut sink).unwrap();
        assert_eq!(sink.mappings.len(), 1);
        assert_eq!(sink.mappings[0].interface, "Gi0/1");
    }
}
