use std::sync::Arc;

use notesync_core::config::parse_sync_interval;
use notesync_core::sync::SyncLoop;
use tokio::sync::Mutex;

use crate::cli::FilterArgs;
use crate::commands::common::{apply_filter, build_controller, ResolvedProfile, TerminalRenderer};
use crate::error::CliError;

/// Show the gallery and refresh it in the background until Ctrl-C.
pub async fn run_watch(
    resolved: &ResolvedProfile,
    interval_secs: Option<u64>,
    filter: &FilterArgs,
) -> Result<(), CliError> {
    let interval = match interval_secs {
        Some(secs) => parse_sync_interval(&secs.to_string())?,
        None => resolved.config.sync_interval,
    };

    let mut controller =
        build_controller(resolved)?.with_render_sink(Arc::new(TerminalRenderer));
    apply_filter(&mut controller, filter);
    if let Err(error) = controller.refresh().await {
        tracing::warn!("Initial refresh failed: {}", error);
    }

    let controller = Arc::new(Mutex::new(controller));
    let handle = SyncLoop::spawn(Arc::clone(&controller), interval);

    tokio::signal::ctrl_c().await?;
    if handle.is_finished() {
        tracing::warn!("Background sync stopped before shutdown");
    }
    handle.shutdown().await;
    Ok(())
}
