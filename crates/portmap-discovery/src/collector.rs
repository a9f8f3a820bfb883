//! Multi-device table collection
//!
//! One session per device: open, learn the device name, run the catalog
//! command, build the table, close. The session is closed on every path.

use futures_util::stream::{self, Stream, StreamExt};
use portmap_core::{build_table, DeviceTable, LineRecord, ResolutionTable, SwitchTable};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogError, CommandCatalog, Intent};
use crate::session::{Connector, Session, SessionError};

#[derive(Error, Debug)]
pub enum CollectError {
    #[error("{address}: {source}")]
    Session {
        address: String,
        #[source]
        source: SessionError,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Result of fetching one switch's forwarding table
#[derive(Debug)]
pub struct SwitchFetch {
    pub address: String,
    pub result: Result<SwitchTable, SessionError>,
}

/// Drives sessions against a set of devices
pub struct Collector<C: Connector> {
    connector: C,
    catalog: CommandCatalog,
    concurrency: usize,
}

impl<C: Connector> Collector<C> {
    pub fn new(connector: C, catalog: CommandCatalog) -> Self {
        Self {
            connector,
            catalog,
            concurrency: 1,
        }
    }

    /// Allow up to `limit` switch fetches in flight (minimum 1)
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    /// Read the router's IP resolution table
    pub async fn fetch_resolution_table(
        &self,
        address: &str,
    ) -> Result<ResolutionTable, CollectError> {
        let command = self.catalog.command_for(Intent::ResolutionTable)?;
        self.fetch(address, command)
            .await
            .map_err(|source| CollectError::Session {
                address: address.to_string(),
                source,
            })
    }

    /// Read one switch's forwarding table
    pub async fn fetch_forwarding_table(&self, address: &str) -> Result<SwitchTable, CollectError> {
        let command = self.catalog.command_for(Intent::ForwardingTable)?;
        self.fetch_switch(address, command)
            .await
            .result
            .map_err(|source| CollectError::Session {
                address: address.to_string(),
                source,
            })
    }

    /// Forwarding tables for every switch, in the order given
    ///
    /// A switch that cannot be read is reported in its [`SwitchFetch`] and
    /// does not stop the others. Only a catalog miss fails the whole call.
    pub async fn fetch_switches(
        &self,
        addresses: &[String],
    ) -> Result<Vec<SwitchFetch>, CatalogError> {
        Ok(self.switch_stream(addresses)?.collect().await)
    }

    /// Like [`Collector::fetch_switches`] but yields each switch as soon as it is read
    pub fn switch_stream<'a>(
        &'a self,
        addresses: &'a [String],
    ) -> Result<impl Stream<Item = SwitchFetch> + 'a, CatalogError> {
        let command = self.catalog.command_for(Intent::ForwardingTable)?;
        Ok(stream::iter(addresses)
            .map(move |address| self.fetch_switch(address, command))
            .buffered(self.concurrency))
    }

    async fn fetch_switch(&self, address: &str, command: &str) -> SwitchFetch {
        let result = self
            .fetch(address, command)
            .await
            .map(|table| SwitchTable::new(address, table));

        if let Err(ref e) = result {
            warn!(address = %address, error = %e, "Failed to read forwarding table");
        }

        SwitchFetch {
            address: address.to_string(),
            result,
        }
    }

    async fn fetch<T: LineRecord>(
        &self,
        address: &str,
        command: &str,
    ) -> Result<DeviceTable<T>, SessionError> {
        info!(address = %address, command = %command, "Fetching device table");

        let mut session = self.connector.open(address).await?;
        let result = read_table(&mut session, command).await;

        if let Err(e) = session.close().await {
            warn!(address = %address, error = %e, "Failed to close session");
        }

        let table = result?;
        debug!(
            address = %address,
            device = %table.identity(),
            entries = table.len(),
            "Fetched device table"
        );
        Ok(table)
    }
}

async fn read_table<S: Session, T: LineRecord>(
    session: &mut S,
    command: &str,
) -> Result<DeviceTable<T>, SessionError> {
    let identity = session.identity().await?;
    let raw = session.run(command).await?;
    Ok(build_table(&identity, &raw))
}
