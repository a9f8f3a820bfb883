//! Record types extracted from device tables and the correlated output record

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

use crate::mac::MacAddress;

/// Age of a resolution entry as reported by the router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Age {
    Minutes(u32),
    /// Printed as `-` by the router, typically for its own interface addresses
    Unknown,
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Age::Minutes(m) => write!(f, "{}", m),
            Age::Unknown => f.write_str("-"),
        }
    }
}

/// One row of the router's IP resolution (ARP) table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionEntry {
    pub ip_address: Ipv4Addr,
    pub hardware_address: MacAddress,
    pub age: Age,
    /// Layer 3 interface the address was learned on
    pub interface: String,
}

/// One row of a switch's forwarding (MAC address) table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardingEntry {
    pub hardware_address: MacAddress,
    pub vlan: u16,
    /// Physical or logical port the address was learned on
    pub interface: String,
    /// `DYNAMIC`, `STATIC`, ... exactly as printed
    pub entry_type: String,
}

/// Key of a forwarding entry within one switch table
///
/// The hardware address leads so that all entries for one address are
/// adjacent in an ordered table.
pub type ForwardingKey = (MacAddress, u16, String);

/// An IP address located on a switch port
///
/// Field order is the column order of the tabular output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelatedMapping {
    pub ip_address: Ipv4Addr,
    pub mac_address: MacAddress,
    pub switch_name: String,
    pub switch_ip_address: String,
    pub interface: String,
    pub vlan: u16,
}

impl CorrelatedMapping {
    /// Column names, in output order
    pub const FIELDS: [&'static str; 6] = [
        "ip_address",
        "mac_address",
        "switch_name",
        "switch_ip_address",
        "interface",
        "vlan",
    ];
}
