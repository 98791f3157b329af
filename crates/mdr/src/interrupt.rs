//! Ctrl-C handling for long runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Exit status used when a second interrupt forces termination.
const FORCED_EXIT_CODE: i32 = 130;

/// Set `flag` on the first Ctrl-C so the run stops before the next file.
///
/// A second Ctrl-C terminates the process immediately. The signal is awaited
/// on a dedicated thread with a single-threaded runtime.
pub(crate) fn install(flag: Arc<AtomicBool>) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to start interrupt handler");
            return;
        }
    };

    let spawned = std::thread::Builder::new()
        .name("mdr-interrupt".to_owned())
        .spawn(move || runtime.block_on(wait_for_interrupt(flag)));
    if let Err(e) = spawned {
        tracing::warn!(error = %e, "Failed to start interrupt handler");
    }
}

async fn wait_for_interrupt(flag: Arc<AtomicBool>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
        return;
    }
    flag.store(true, Ordering::SeqCst);
    tracing::warn!("Interrupt received, stopping after the current file (press Ctrl+C again to abort)");

    if tokio::signal::ctrl_c().await.is_ok() {
        std::process::exit(FORCED_EXIT_CODE);
    }
}

