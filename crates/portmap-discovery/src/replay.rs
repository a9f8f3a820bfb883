//! Sessions served from captured command output
//!
//! A capture directory holds one TOML file per device, named after the
//! address used in the configuration (`192.168.2.1.toml`):
//!
//! ```toml
//! prompt = "SW-A#"
//!
//! [commands]
//! "show mac address-table" = """
//!   10    0011.2233.4455    DYNAMIC     Gi0/1
//! """
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::session::{identity_from_prompt, Connector, Session, SessionError};

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Failed to read capture: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse capture {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Recorded state of one device
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceCapture {
    /// Prompt the device showed, e.g. `core-sw1#`
    pub prompt: String,
    /// Command text to raw output
    #[serde(default)]
    pub commands: HashMap<String, String>,
    /// Refuse connections to this device
    #[serde(default)]
    pub unreachable: bool,
}

impl DeviceCapture {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_command(mut self, command: impl Into<String>, output: impl Into<String>) -> Self {
        self.commands.insert(command.into(), output.into());
        self
    }
}

/// Connector that replays [`DeviceCapture`]s instead of contacting devices
#[derive(Debug, Clone, Default)]
pub struct ReplayConnector {
    devices: HashMap<String, DeviceCapture>,
}

impl ReplayConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(mut self, address: impl Into<String>, capture: DeviceCapture) -> Self {
        self.devices.insert(address.into(), capture);
        self
    }

    /// Load every `*.toml` capture in `dir`
    pub fn from_dir(dir: &Path) -> Result<Self, ReplayError> {
        let mut connector = Self::new();

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }
            let Some(address) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let content = std::fs::read_to_string(&path)?;
            let capture: DeviceCapture =
                toml::from_str(&content).map_err(|source| ReplayError::Parse {
                    file: path.display().to_string(),
                    source,
                })?;
            debug!(address = %address, commands = capture.commands.len(), "Loaded capture");
            connector.devices.insert(address.to_string(), capture);
        }

        info!(dir = %dir.display(), devices = connector.devices.len(), "Loaded replay captures");
        Ok(connector)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[async_trait]
impl Connector for ReplayConnector {
    type Session = ReplaySession;

    async fn open(&self, address: &str) -> Result<ReplaySession, SessionError> {
        let capture = self.devices.get(address).ok_or_else(|| SessionError::Connect {
            address: address.to_string(),
            reason: "no capture for device".to_string(),
        })?;

        if capture.unreachable {
            return Err(SessionError::Connect {
                address: address.to_string(),
                reason: "device marked unreachable".to_string(),
            });
        }

        Ok(ReplaySession {
            address: address.to_string(),
            capture: capture.clone(),
            open: true,
        })
    }
}

#[derive(Debug)]
pub struct ReplaySession {
    address: String,
    capture: DeviceCapture,
    open: bool,
}

impl ReplaySession {
    fn ensure_open(&self, command: &str) -> Result<(), SessionError> {
        if self.open {
            Ok(())
        } else {
            Err(SessionError::Command {
                address: self.address.clone(),
                command: command.to_string(),
                reason: "session closed".to_string(),
            })
        }
    }
}

#[async_trait]
impl Session for ReplaySession {
    fn address(&self) -> &str {
        &self.address
    }

    async fn run(&mut self, command: &str) -> Result<String, SessionError> {
        self.ensure_open(command)?;
        self.capture
            .commands
            .get(command)
            .cloned()
            .ok_or_else(|| SessionError::Command {
                address: self.address.clone(),
                command: command.to_string(),
                reason: "no captured output".to_string(),
            })
    }

    async fn identity(&mut self) -> Result<String, SessionError> {
        identity_from_prompt(&self.capture.prompt).ok_or_else(|| SessionError::Identity {
            address: self.address.clone(),
        })
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.open = false;
        Ok(())
    }
}
