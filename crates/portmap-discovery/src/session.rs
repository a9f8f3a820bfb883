//! Remote command sessions
//!
//! A [`Connector`] opens one [`Session`] per device. The session runs
//! commands, reports the device's own name and must be closed by the caller.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to connect to {address}: {reason}")]
    Connect { address: String, reason: String },
    #[error("Command `{command}` failed on {address}: {reason}")]
    Command {
        address: String,
        command: String,
        reason: String,
    },
    #[error("Could not determine device name of {address}")]
    Identity { address: String },
    #[error("Failed to disconnect from {address}: {reason}")]
    Disconnect { address: String, reason: String },
}

/// An open command session to one device
#[async_trait]
pub trait Session: Send {
    /// Address the session was opened against
    fn address(&self) -> &str;

    /// Run a command and return its raw output
    async fn run(&mut self, command: &str) -> Result<String, SessionError>;

    /// The device's self-reported name
    async fn identity(&mut self) -> Result<String, SessionError>;

    async fn close(&mut self) -> Result<(), SessionError>;
}

/// Opens sessions to devices
#[async_trait]
pub trait Connector: Send + Sync {
    type Session: Session;

    async fn open(&self, address: &str) -> Result<Self::Session, SessionError>;
}

/// Device name from a CLI prompt such as `core-sw1#` or `edge-2>`
pub fn identity_from_prompt(prompt: &str) -> Option<String> {
    let trimmed = prompt.trim();
    let name = trimmed
        .strip_suffix('#')
        .or_else(|| trimmed.strip_suffix('>'))
        .unwrap_or(trimmed)
        .trim_end();

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
