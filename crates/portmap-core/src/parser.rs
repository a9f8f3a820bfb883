//! Line grammar for Cisco IOS `show ip arp` and `show mac address-table`
//!
//! Each record kind has one pattern. A line either yields a record or is
//! skipped: headers, banners, blank lines and summary rows are not errors.

use regex::{Captures, Regex};
use std::net::Ipv4Addr;
use std::sync::LazyLock;

use crate::entry::{Age, ForwardingEntry, ForwardingKey, ResolutionEntry};
use crate::mac::MacAddress;

// Internet  10.0.0.5   12   0011.2233.4455  ARPA   Vlan10
static RESOLUTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^\w+\s+",
        r"(?P<ip>\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})\s+",
        r"(?P<age>\d+|-)\s+",
        r"(?P<mac>[0-9A-Fa-f]{4}\.[0-9A-Fa-f]{4}\.[0-9A-Fa-f]{4})\s+",
        r"\w+\s+",
        r"(?P<interface>\S+)\s*$",
    ))
    .expect("valid resolution line regex")
});

//   10    0011.2233.4455    DYNAMIC     Gi0/1
static FORWARDING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^\s+(?P<vlan>\d+)\s+",
        r"(?P<mac>[0-9A-Fa-f]{4}\.[0-9A-Fa-f]{4}\.[0-9A-Fa-f]{4})\s+",
        r"(?P<type>\w+)\s+",
        r"(?P<interface>\S+)\s*$",
    ))
    .expect("valid forwarding line regex")
});

/// A record that can be scraped from a single line of command output
pub trait LineRecord: Sized {
    /// Identifies the record within one device's table
    type Key: Ord + Clone;

    /// Parse one line, returning `None` for anything that is not a data row
    fn parse_line(line: &str) -> Option<Self>;

    fn key(&self) -> Self::Key;
}

/// Parse a line as record kind `T`
pub fn parse_line<T: LineRecord>(line: &str) -> Option<T> {
    T::parse_line(line)
}

fn mac_from(caps: &Captures<'_>) -> Option<MacAddress> {
    caps.name("mac")?.as_str().parse().ok()
}

impl LineRecord for ResolutionEntry {
    type Key = Ipv4Addr;

    fn parse_line(line: &str) -> Option<Self> {
        let caps = RESOLUTION_LINE.captures(line)?;

        // The pattern only checks shape; 999.1.1.1 is still rejected here
        let ip_address: Ipv4Addr = caps.name("ip")?.as_str().parse().ok()?;
        let age = match caps.name("age")?.as_str() {
            "-" => Age::Unknown,
            minutes => Age::Minutes(minutes.parse().ok()?),
        };

        Some(ResolutionEntry {
            ip_address,
            hardware_address: mac_from(&caps)?,
            age,
            interface: caps.name("interface")?.as_str().to_string(),
        })
    }

    fn key(&self) -> Ipv4Addr {
        self.ip_address
    }
}

impl LineRecord for ForwardingEntry {
    type Key = ForwardingKey;

    fn parse_line(line: &str) -> Option<Self> {
        let caps = FORWARDING_LINE.captures(line)?;

        Some(ForwardingEntry {
            hardware_address: mac_from(&caps)?,
            vlan: caps.name("vlan")?.as_str().parse().ok()?,
            interface: caps.name("interface")?.as_str().to_string(),
            entry_type: caps.name("type")?.as_str().to_string(),
        })
    }

    fn key(&self) -> ForwardingKey {
        (self.hardware_address, self.vlan, self.interface.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolution_line() {
        let line = "Internet  10.0.0.5               12   0011.2233.4455  ARPA   Vlan10";
        let entry: ResolutionEntry = parse_line(line).unwrap();
        assert_eq!(entry.ip_address, Ipv4Addr::new(10, 0, 0, 5));
        assert_eq!(entry.hardware_address.to_string(), "0011.2233.4455");
        assert_eq!(entry.age, Age::Minutes(12));
        assert_eq!(entry.interface, "Vlan10");
    }

    #[test]
    fn test_parse_resolution_line_unknown_age() {
        let line = "Internet  192.168.1.1             -   ca01.0a5c.0008  ARPA   GigabitEthernet0/0";
        let entry: ResolutionEntry = parse_line(line).unwrap();
        assert_eq!(entry.age, Age::Unknown);
        assert_eq!(entry.interface, "GigabitEthernet0/0");
    }

    #[test]
    fn test_resolution_header_and_incomplete_skipped() {
        let header = "Protocol  Address          Age (min)  Hardware Addr   Type   Interface";
        let incomplete = "Internet  10.0.0.9                 0   Incomplete      ARPA";
        assert!(parse_line::<ResolutionEntry>(header).is_none());
        assert!(parse_line::<ResolutionEntry>(incomplete).is_none());
        assert!(parse_line::<ResolutionEntry>("").is_none());
    }

    #[test]
    fn test_resolution_malformed_lines() {
        // not a dotted quad
        assert!(parse_line::<ResolutionEntry>(
            "Internet  10.0.5  12  0011.2233.4455  ARPA  Vlan10"
        )
        .is_none());
        // dotted quad shape but out of range
        assert!(parse_line::<ResolutionEntry>(
            "Internet  10.0.0.300  12  0011.2233.4455  ARPA  Vlan10"
        )
        .is_none());
        // missing interface token
        assert!(parse_line::<ResolutionEntry>(
            "Internet  10.0.0.5  12  0011.2233.4455  ARPA"
        )
        .is_none());
        // extra trailing token
        assert!(parse_line::<ResolutionEntry>(
            "Internet  10.0.0.5  12  0011.2233.4455  ARPA  Vlan10  extra"
        )
        .is_none());
        // non-numeric age
        assert!(parse_line::<ResolutionEntry>(
            "Internet  10.0.0.5  x  0011.2233.4455  ARPA  Vlan10"
        )
        .is_none());
    }

    #[test]
    fn test_parse_forwarding_line() {
        let line = "  10    0011.2233.4455    DYNAMIC     Gi0/1";
        let entry: ForwardingEntry = parse_line(line).unwrap();
        assert_eq!(entry.vlan, 10);
        assert_eq!(entry.hardware_address.to_string(), "0011.2233.4455");
        assert_eq!(entry.entry_type, "DYNAMIC");
        assert_eq!(entry.interface, "Gi0/1");
    }

    #[test]
    fn test_forwarding_summary_and_headers_skipped() {
        let lines = [
            "          Mac Address Table",
            "-------------------------------------------",
            "Vlan    Mac Address       Type        Ports",
            "----    -----------       --------    -----",
            " All    0100.0ccc.cccc    STATIC      CPU",
            "Total Mac Addresses for this criterion: 5",
            "",
        ];
        for line in lines {
            assert!(parse_line::<ForwardingEntry>(line).is_none(), "{line:?}");
        }
    }

    #[test]
    fn test_forwarding_malformed_lines() {
        // no leading whitespace
        assert!(parse_line::<ForwardingEntry>("10    0011.2233.4455    DYNAMIC     Gi0/1").is_none());
        // vlan does not fit
        assert!(parse_line::<ForwardingEntry>("  70000 0011.2233.4455 DYNAMIC Gi0/1").is_none());
        // non-numeric vlan
        assert!(parse_line::<ForwardingEntry>("  v10 0011.2233.4455 DYNAMIC Gi0/1").is_none());
        // missing port
        assert!(parse_line::<ForwardingEntry>("  10    0011.2233.4455    DYNAMIC").is_none());
    }

    #[test]
    fn test_trailing_whitespace_allowed() {
        assert!(parse_line::<ForwardingEntry>("   1    0011.2233.4455    DYNAMIC     Fa0/3   ").is_some());
        assert!(parse_line::<ResolutionEntry>("Internet  10.0.0.5  3  0011.2233.4455  ARPA  Vlan10 \r").is_some());
    }
}
