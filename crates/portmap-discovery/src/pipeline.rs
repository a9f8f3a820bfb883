//! One complete port mapping run
//!
//! The router's resolution table is read first. Each switch is then read and
//! correlated against it straight away, so mappings reach the sink switch by
//! switch.

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use portmap_core::{correlate_switch, ExclusionSet, MappingSink, SinkError};
use serde::{Deserialize, Serialize};
use std::pin::pin;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::catalog::CatalogError;
use crate::collector::{CollectError, Collector};
use crate::session::Connector;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("Failed to read router table: {0}")]
    Router(#[source] CollectError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Devices and filters for a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingPlan {
    pub router: String,
    pub switches: Vec<String>,
    #[serde(default)]
    pub exclusions: ExclusionSet,
}

/// What happened to one switch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SwitchOutcome {
    Mapped {
        name: String,
        entries: usize,
        mappings: usize,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchSummary {
    pub address: String,
    pub outcome: SwitchOutcome,
}

/// Outcome of a completed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub router_address: String,
    pub router_name: String,
    pub resolution_entries: usize,
    pub switches: Vec<SwitchSummary>,
    pub mappings_written: usize,
}

impl RunSummary {
    pub fn failed_switches(&self) -> impl Iterator<Item = &SwitchSummary> {
        self.switches
            .iter()
            .filter(|s| matches!(s.outcome, SwitchOutcome::Failed { .. }))
    }
}

/// Locates router-known IP addresses on switch ports
pub struct PortMapper<C: Connector> {
    collector: Collector<C>,
    plan: MappingPlan,
}

impl<C: Connector> PortMapper<C> {
    pub fn new(collector: Collector<C>, plan: MappingPlan) -> Self {
        Self { collector, plan }
    }

    /// Read every device and write all mappings to `sink`
    ///
    /// Only a router failure, a catalog miss or a sink error aborts the run.
    /// Unreadable switches are listed in the summary.
    pub async fn run<S: MappingSink + ?Sized>(&self, sink: &mut S) -> Result<RunSummary, RunError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let plan = &self.plan;
        info!(
            run_id = %run_id,
            router = %plan.router,
            switches = plan.switches.len(),
            "Starting port mapping run"
        );

        let resolution = self
            .collector
            .fetch_resolution_table(&plan.router)
            .await
            .map_err(RunError::Router)?;

        info!(
            router = %plan.router,
            name = %resolution.identity(),
            entries = resolution.len(),
            "Router resolution table read"
        );

        let mut switches = Vec::with_capacity(plan.switches.len());
        let mut mappings_written = 0usize;

        let mut fetches = pin!(self.collector.switch_stream(&plan.switches)?);
        while let Some(fetch) = fetches.next().await {
            let outcome = match fetch.result {
                Ok(switch) => {
                    let mut mappings = 0usize;
                    for mapping in correlate_switch(&resolution, &switch, &plan.exclusions) {
                        sink.write(&mapping)?;
                        mappings += 1;
                    }
                    info!(
                        address = %switch.address,
                        name = %switch.name(),
                        entries = switch.table.len(),
                        mappings,
                        "Switch correlated"
                    );
                    mappings_written += mappings;
                    SwitchOutcome::Mapped {
                        name: switch.name().to_string(),
                        entries: switch.table.len(),
                        mappings,
                    }
                }
                Err(e) => SwitchOutcome::Failed {
                    error: e.to_string(),
                },
            };
            switches.push(SwitchSummary {
                address: fetch.address,
                outcome,
            });
        }

        sink.flush()?;

        let summary = RunSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            router_address: plan.router.clone(),
            router_name: resolution.identity().to_string(),
            resolution_entries: resolution.len(),
            switches,
            mappings_written,
        };

        let failed = summary.failed_switches().count();
        if failed > 0 {
            warn!(failed, total = summary.switches.len(), "Some switches could not be read");
        }
        info!(run_id = %run_id, mappings = mappings_written, "Port mapping complete");

        Ok(summary)
    }
}
