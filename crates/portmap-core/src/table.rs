//! Per-device record tables
//!
//! A table is filled through [`DeviceTableBuilder`] and handed to consumers
//! as a finished, read-only [`DeviceTable`].

use std::collections::BTreeMap;
use std::ops::Bound;
use tracing::debug;

use crate::entry::{ForwardingEntry, ResolutionEntry};
use crate::mac::MacAddress;
use crate::parser::LineRecord;

/// Records scraped from one device, keyed within that device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTable<T: LineRecord> {
    identity: String,
    entries: BTreeMap<T::Key, T>,
}

pub type ResolutionTable = DeviceTable<ResolutionEntry>;
pub type ForwardingTable = DeviceTable<ForwardingEntry>;

impl<T: LineRecord> DeviceTable<T> {
    /// Self-reported name of the device the records came from
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.entries.get(key)
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DeviceTable<ForwardingEntry> {
    /// Every forwarding entry for `mac`, across VLANs and ports
    pub fn entries_for(&self, mac: MacAddress) -> impl Iterator<Item = &ForwardingEntry> {
        self.entries
            .range((Bound::Included((mac, 0, String::new())), Bound::Unbounded))
            .take_while(move |((entry_mac, _, _), _)| *entry_mac == mac)
            .map(|(_, entry)| entry)
    }
}

/// Mutable accumulator for a [`DeviceTable`]
#[derive(Debug)]
pub struct DeviceTableBuilder<T: LineRecord> {
    identity: String,
    entries: BTreeMap<T::Key, T>,
}

impl<T: LineRecord> DeviceTableBuilder<T> {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Insert a record, replacing any earlier record with the same key
    pub fn insert(&mut self, record: T) -> Option<T> {
        self.entries.insert(record.key(), record)
    }

    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn finish(self) -> DeviceTable<T> {
        DeviceTable {
            identity: self.identity,
            entries: self.entries,
        }
    }
}

/// Parse every line of `raw` and index the records found
///
/// Lines that do not match the record grammar are skipped. A later line
/// with the same key as an earlier one wins.
pub fn build_table<T: LineRecord>(identity: &str, raw: &str) -> DeviceTable<T> {
    let mut builder = DeviceTableBuilder::new(identity);
    let mut parsed = 0usize;
    let mut skipped = 0usize;

    for line in raw.lines() {
        match T::parse_line(line) {
            Some(record) => {
                builder.insert(record);
                parsed += 1;
            }
            None => skipped += 1,
        }
    }

    let table = builder.finish();
    debug!(
        device = %identity,
        parsed,
        skipped,
        entries = table.len(),
        "Built device table"
    );
    table
}
