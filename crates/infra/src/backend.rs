//! Backend selection.
//!
//! The data-source implementations are chosen once at startup from
//! configuration and injected; nothing downstream branches on the mode.

use std::sync::Arc;

use gantry_core::resolve::ResolverOptions;
use gantry_core::{FinancialsSystem, SchedulingSystem, SyncOperationLog, SyncService};
use gantry_domain::{BackendKind, Config, Result};
use tracing::info;

use crate::fixture;
use crate::oplog::InMemorySyncLog;
use crate::remote::{EbsClient, P6Client};

/// The pair of data sources the orchestrator runs against.
pub struct Backends {
    pub scheduling: Arc<dyn SchedulingSystem>,
    pub financials: Arc<dyn FinancialsSystem>,
}

/// Construct the data sources selected by `config.backend`.
pub fn build_backends(config: &Config) -> Result<Backends> {
    match config.backend {
        BackendKind::Live => {
            info!("using live HTTP backends");
            Ok(Backends {
                scheduling: Arc::new(P6Client::new(&config.p6)?),
                financials: Arc::new(EbsClient::new(&config.ebs)?),
            })
        }
        BackendKind::Fixture => {
            info!("using in-memory fixture backends");
            let (scheduling, financials) = fixture::seeded_pair();
            Ok(Backends {
                scheduling: Arc::new(scheduling),
                financials: Arc::new(financials),
            })
        }
    }
}

/// Construct a ready-to-use sync service from configuration.
///
/// Uses the in-memory operation log; deployments with a durable log
/// collaborator pass their own implementation to [`SyncService::new`].
pub fn build_sync_service(config: &Config) -> Result<SyncService> {
    let backends = build_backends(config)?;
    let oplog: Arc<dyn SyncOperationLog> = Arc::new(InMemorySyncLog::new());
    Ok(SyncService::new(
        backends.scheduling,
        backends.financials,
        oplog,
        ResolverOptions { allow_fuzzy_names: config.sync.allow_fuzzy_project_match },
    ))
}
