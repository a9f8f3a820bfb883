//! Portmap Core - Parsing and correlation engine
//!
//! This crate turns raw switch and router CLI output into structured tables
//! and joins them to find which switch port hosts each IP address:
//! - Hardware address canonicalisation and format classification
//! - Line grammar for `show ip arp` and `show mac address-table`
//! - Per-device tables with last-line-wins indexing
//! - Correlation of resolution entries with forwarding entries
//! - Output sinks (CSV, JSON lines, in-memory)

pub mod correlate;
pub mod entry;
pub mod mac;
pub mod parser;
pub mod sink;
pub mod table;

pub use correlate::{correlate, correlate_switch, ExclusionSet, SwitchTable};
pub use entry::{Age, CorrelatedMapping, ForwardingEntry, ForwardingKey, ResolutionEntry};
pub use mac::{classify_mac, MacAddress, MacFormat, MacParseError};
pub use parser::{parse_line, LineRecord};
pub use sink::{CsvSink, JsonLinesSink, MappingSink, MemorySink, SinkError};
pub use table::{
    build_table, DeviceTable, DeviceTableBuilder, ForwardingTable, ResolutionTable,
};
