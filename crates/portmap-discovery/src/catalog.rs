//! Command text per device platform

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("No command for {intent} on platform {platform}")]
    UnknownIntent { platform: Platform, intent: Intent },
    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),
}

/// Device CLI family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "cisco_ios")]
    CiscoIos,
    #[serde(rename = "cisco_xe")]
    CiscoXe,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::CiscoIos => f.write_str("cisco_ios"),
            Platform::CiscoXe => f.write_str("cisco_xe"),
        }
    }
}

impl FromStr for Platform {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cisco_ios" | "ios" => Ok(Platform::CiscoIos),
            "cisco_xe" | "iosxe" | "ios-xe" => Ok(Platform::CiscoXe),
            _ => Err(CatalogError::UnknownPlatform(s.to_string())),
        }
    }
}

/// What a command is meant to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// IP to hardware address table (ARP)
    ResolutionTable,
    /// Hardware address to port table
    ForwardingTable,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::ResolutionTable => f.write_str("resolution table"),
            Intent::ForwardingTable => f.write_str("forwarding table"),
        }
    }
}

const COMMANDS: &[(Platform, Intent, &str)] = &[
    (Platform::CiscoIos, Intent::ResolutionTable, "show ip arp"),
    (Platform::CiscoIos, Intent::ForwardingTable, "show mac address-table"),
    (Platform::CiscoXe, Intent::ResolutionTable, "show ip arp"),
    (Platform::CiscoXe, Intent::ForwardingTable, "show mac address-table"),
];

/// Static intent to command lookup for one platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandCatalog {
    platform: Platform,
}

impl CommandCatalog {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn command_for(&self, intent: Intent) -> Result<&'static str, CatalogError> {
        COMMANDS
            .iter()
            .find(|(platform, i, _)| *platform == self.platform && *i == intent)
            .map(|(_, _, command)| *command)
            .ok_or(CatalogError::UnknownIntent {
                platform: self.platform,
                intent,
            })
    }
}
