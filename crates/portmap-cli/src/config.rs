//! Configuration loading and validation

use anyhow::{bail, Result};
use portmap_core::ExclusionSet;
use portmap_discovery::{MappingPlan, Platform, SshProfile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub devices: DevicesConfig,
    #[serde(default)]
    pub ssh: SshProfile,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub collection: CollectionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevicesConfig {
    /// CLI family of every device
    #[serde(default = "default_platform")]
    pub platform: Platform,
    /// Core router or L3 switch holding the ARP table
    #[serde(default)]
    pub router: String,
    /// Access switches whose MAC tables are read
    #[serde(default)]
    pub switches: Vec<String>,
    /// Trunk and uplink ports to ignore
    #[serde(default)]
    pub exclude_interfaces: Vec<String>,
}

impl Default for DevicesConfig {
    fn default() -> Self {
        Self {
            platform: default_platform(),
            router: String::new(),
            switches: Vec::new(),
            exclude_interfaces: Vec::new(),
        }
    }
}

fn default_platform() -> Platform {
    Platform::CiscoIos
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Jsonl,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output file, `-` for stdout
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
    #[serde(default = "default_format")]
    pub format: OutputFormat,
    /// Add to an existing file instead of replacing it
    #[serde(default)]
    pub append: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            format: default_format(),
            append: false,
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("port_maps.csv")
}

fn default_format() -> OutputFormat {
    OutputFormat::Csv
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Switches read at the same time (1 = one after another)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

fn default_concurrency() -> usize {
    1
}

impl Config {
    /// Check the settings a run cannot do without
    pub fn validate(&self) -> Result<()> {
        if self.devices.router.trim().is_empty() {
            bail!("No router configured (set devices.router or pass --router)");
        }
        if self.devices.switches.is_empty() {
            bail!("No switches configured (set devices.switches or pass --switch)");
        }
        if self.collection.concurrency == 0 {
            bail!("collection.concurrency must be at least 1");
        }
        Ok(())
    }

    /// Convert to the run plan
    pub fn to_plan(&self) -> MappingPlan {
        MappingPlan {
            router: self.devices.router.clone(),
            switches: self.devices.switches.clone(),
            exclusions: self
                .devices
                .exclude_interfaces
                .iter()
                .cloned()
                .collect::<ExclusionSet>(),
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

/// Save an example configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let config = Config {
        devices: DevicesConfig {
            platform: Platform::CiscoIos,
            router: "192.168.1.1".to_string(),
            switches: vec![
                "192.168.2.1".to_string(),
                "192.168.2.2".to_string(),
                "192.168.2.3".to_string(),
                "192.168.2.4".to_string(),
            ],
            exclude_interfaces: vec!["Gi0/0".to_string()],
        },
        ssh: SshProfile {
            username: Some("netops".to_string()),
            ..SshProfile::default()
        },
        output: OutputConfig::default(),
        collection: CollectionConfig::default(),
    };

    let content = toml::to_string_pretty(&config)?;
    std::fs::write(path, content)?;
    Ok(())
}
