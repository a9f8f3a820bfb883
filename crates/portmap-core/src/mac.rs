//! Hardware (MAC) address type and textual format classification
//!
//! Network gear prints the same 48-bit address in several ways. The switch
//! and router tables use the Cisco triple-hextet form, hosts and other tools
//! use colon or dash separated octets. Everything is canonicalised to a
//! [`MacAddress`] before comparison.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

static CISCO_MAC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9A-Fa-f]{4}\.[0-9A-Fa-f]{4}\.[0-9A-Fa-f]{4}$").expect("valid cisco mac regex")
});

static UNIX_MAC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9A-Fa-f]{2}(:[0-9A-Fa-f]{2}){5}$").expect("valid unix mac regex")
});

static IEEE_MAC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9A-Fa-f]{2}(-[0-9A-Fa-f]{2}){5}$").expect("valid ieee mac regex")
});

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid hardware address: {0}")]
pub struct MacParseError(pub String);

/// Textual convention a hardware address is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MacFormat {
    /// Triple hextet, dot separated: `001b.7749.54fd`
    Cisco,
    /// Colon separated octets: `00:1b:77:49:54:fd`
    Unix,
    /// IEEE EUI-48 dash separated octets: `00-1B-77-49-54-FD`
    Ieee,
}

/// Identify which convention `text` is written in, if any
///
/// Only classifies. Use [`MacAddress::from_str`] to get the value.
pub fn classify_mac(text: &str) -> Option<MacFormat> {
    if CISCO_MAC.is_match(text) {
        Some(MacFormat::Cisco)
    } else if UNIX_MAC.is_match(text) {
        Some(MacFormat::Unix)
    } else if IEEE_MAC.is_match(text) {
        Some(MacFormat::Ieee)
    } else {
        None
    }
}

/// A 48-bit hardware address in canonical byte form
///
/// Displays and serializes in the Cisco triple-hextet form used by the
/// device tables it is parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Render in the given textual convention
    pub fn format_as(&self, format: MacFormat) -> String {
        let b = &self.0;
        match format {
            MacFormat::Cisco => format!(
                "{:02x}{:02x}.{:02x}{:02x}.{:02x}{:02x}",
                b[0], b[1], b[2], b[3], b[4], b[5]
            ),
            MacFormat::Unix => format!(
                "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
                b[0], b[1], b[2], b[3], b[4], b[5]
            ),
            MacFormat::Ieee => format!(
                "{:02X}-{:02X}-{:02X}-{:02X}-{:02X}-{:02X}",
                b[0], b[1], b[2], b[3], b[4], b[5]
            ),
        }
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_as(MacFormat::Cisco))
    }
}

impl FromStr for MacAddress {
    type Err = MacParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if classify_mac(s).is_none() {
            return Err(MacParseError(s.to_string()));
        }

        // Separators are already validated, so the remaining hex digits are
        // exactly twelve nibbles in order
        let digits: Vec<u8> = s
            .chars()
            .filter_map(|c| c.to_digit(16))
            .map(|d| d as u8)
            .collect();

        let mut bytes = [0u8; 6];
        for (i, pair) in digits.chunks_exact(2).enumerate() {
            bytes[i] = (pair[0] << 4) | pair[1];
        }
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = MacParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> String {
        mac.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_all_conventions() {
        assert_eq!(classify_mac("0011.2233.4455"), Some(MacFormat::Cisco));
        assert_eq!(classify_mac("001B.7749.54FD"), Some(MacFormat::Cisco));
        assert_eq!(classify_mac("00:11:22:33:44:55"), Some(MacFormat::Unix));
        assert_eq!(classify_mac("00-1B-77-49-54-FD"), Some(MacFormat::Ieee));
    }

    #[test]
    fn test_classify_rejects_malformed() {
        assert_eq!(classify_mac(""), None);
        assert_eq!(classify_mac("Incomplete"), None);
        assert_eq!(classify_mac("0011.2233"), None);
        assert_eq!(classify_mac("0011.2233.445g"), None);
        assert_eq!(classify_mac("00:11:22:33:44"), None);
        assert_eq!(classify_mac("00:11-22:33-44:55"), None);
        assert_eq!(classify_mac(" 0011.2233.4455"), None);
    }

    #[test]
    fn test_same_address_in_every_convention() {
        let cisco: MacAddress = "001b.7749.54fd".parse().unwrap();
        let unix: MacAddress = "00:1B:77:49:54:FD".parse().unwrap();
        let ieee: MacAddress = "00-1B-77-49-54-FD".parse().unwrap();
        assert_eq!(cisco, unix);
        assert_eq!(unix, ieee);
        assert_eq!(cisco.as_bytes(), &[0x00, 0x1b, 0x77, 0x49, 0x54, 0xfd]);
    }

    #[test]
    fn test_display_is_cisco_form() {
        let mac: MacAddress = "00:11:22:AA:BB:CC".parse().unwrap();
        assert_eq!(mac.to_string(), "0011.22aa.bbcc");
        assert_eq!(mac.format_as(MacFormat::Ieee), "00-11-22-AA-BB-CC");
        assert_eq!(mac.format_as(MacFormat::Unix), "00:11:22:aa:bb:cc");
    }

    #[test]
    fn test_prefix_is_not_equal() {
        // One address being a textual prefix of another must not make them equal
        let a: MacAddress = "0011.2233.4455".parse().unwrap();
        let b: MacAddress = "0011.2233.4456".parse().unwrap();
        assert_ne!(a, b);
        assert!("0011.2233.44".parse::<MacAddress>().is_err());
    }

    #[test]
    fn test_serde_uses_string_form() {
        let mac = MacAddress::new([0, 0x11, 0x22, 0x33, 0x44, 0x55]);
        let json = serde_json::to_string(&mac).unwrap();
        assert_eq!(json, "\"0011.2233.4455\"");
        let back: MacAddress = serde_json::from_str("\"00-11-22-33-44-55\"").unwrap();
        assert_eq!(back, mac);
    }
}
