//! Join a router's resolution table against switch forwarding tables
//!
//! Hardware addresses are compared as canonical byte values. Entries learned
//! on excluded interfaces (trunks, uplinks) never produce a mapping.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::entry::CorrelatedMapping;
use crate::table::{ForwardingTable, ResolutionTable};

/// Forwarding table of one switch together with the address it was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchTable {
    pub address: String,
    pub table: ForwardingTable,
}

impl SwitchTable {
    pub fn new(address: impl Into<String>, table: ForwardingTable) -> Self {
        Self {
            address: address.into(),
            table,
        }
    }

    /// Self-reported switch name
    pub fn name(&self) -> &str {
        self.table.identity()
    }
}

/// Interface names whose forwarding entries are ignored
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExclusionSet(HashSet<String>);

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, interface: impl Into<String>) -> bool {
        self.0.insert(interface.into())
    }

    pub fn contains(&self, interface: &str) -> bool {
        self.0.contains(interface)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Mappings for a single switch
///
/// Every resolution entry is paired with every forwarding entry carrying the
/// same hardware address on a non-excluded interface. Nothing is
/// deduplicated.
pub fn correlate_switch<'a>(
    resolution: &'a ResolutionTable,
    switch: &'a SwitchTable,
    exclusions: &'a ExclusionSet,
) -> impl Iterator<Item = CorrelatedMapping> + 'a {
    resolution.iter().flat_map(move |arp| {
        switch
            .table
            .entries_for(arp.hardware_address)
            .filter(move |fwd| !exclusions.contains(&fwd.interface))
            .map(move |fwd| CorrelatedMapping {
                ip_address: arp.ip_address,
                mac_address: arp.hardware_address,
                switch_name: switch.name().to_string(),
                switch_ip_address: switch.address.clone(),
                interface: fwd.interface.clone(),
                vlan: fwd.vlan,
            })
    })
}

/// Mappings for every switch, one switch after another
pub fn correlate<'a>(
    resolution: &'a ResolutionTable,
    switches: &'a [SwitchTable],
    exclusions: &'a ExclusionSet,
) -> impl Iterator<Item = CorrelatedMapping> + 'a {
    switches
        .iter()
        .flat_map(move |switch| correlate_switch(resolution, switch, exclusions))
}
