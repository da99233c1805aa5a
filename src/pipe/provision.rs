//! Pipe provisioning — create-or-reuse every pipe in an agent table.

use futures_util::future::try_join_all;
use tracing::info;

use super::{PipeBackend, PipeError, PipeHandle};
use crate::config::AgentTable;

/// Create (or update) every pipe in `table` concurrently.
///
/// Fail-fast: the first error aborts the join. Handles come back in table order.
pub async fn provision(
    backend: &dyn PipeBackend,
    table: &AgentTable,
) -> Result<Vec<PipeHandle>, PipeError> {
    let requests: Vec<_> = table.agents().map(|a| a.create_request()).collect();

    let handles = try_join_all(requests.iter().map(|req| backend.create_pipe(req))).await?;

    for handle in &handles {
        info!(pipe = %handle.name, "pipe ready");
    }
    Ok(handles)
}
