//! Wall-clock bounded program execution
//!
//! Programs run synchronously, so each one is moved onto the blocking pool
//! and raced against the configured timeout. The step budget in
//! [`ExecutionLimits`] is what finally stops a program the host stopped
//! waiting for.

use anyhow::{bail, Context};
use progs_scripting::{ExecutionLimits, ProgramCatalog, Value};
use std::sync::Arc;
use std::time::Duration;

/// Resolve `name` against `args` and run it, giving up after `timeout`
pub async fn execute_bounded(
    catalog: Arc<ProgramCatalog>,
    name: &str,
    args: Vec<Value>,
    limits: ExecutionLimits,
    timeout: Duration,
) -> anyhow::Result<Value> {
    let owned_name = name.to_string();
    let task = tokio::task::spawn_blocking(move || catalog.call(&owned_name, &args, limits));

    match tokio::time::timeout(timeout, task).await {
        Ok(joined) => {
            let result = joined.with_context(|| format!("{} panicked", name))?;
            result.with_context(|| format!("{} failed", name))
        }
        Err(_) => bail!("{} exceeded its wall-clock budget of {:?}", name, timeout),
    }
}
