//! Portmap Discovery - Reading tables from live (or captured) devices
//!
//! This crate provides the device-facing side of a port mapping run:
//! - Session and connector traits, with OpenSSH and capture-replay backends
//! - The command catalog for supported CLI platforms
//! - A collector that reads one resolution table and many forwarding tables
//! - The run pipeline that correlates and writes mappings switch by switch

pub mod catalog;
pub mod collector;
pub mod pipeline;
pub mod replay;
pub mod session;
pub mod ssh;

pub use catalog::{CatalogError, CommandCatalog, Intent, Platform};
pub use collector::{CollectError, Collector, SwitchFetch};
pub use pipeline::{MappingPlan, PortMapper, RunError, RunSummary, SwitchOutcome, SwitchSummary};
pub use replay::{DeviceCapture, ReplayConnector, ReplayError, ReplaySession};
pub use session::{identity_from_prompt, Connector, Session, SessionError};
pub use ssh::{SshConnector, SshProfile, SshSession};
