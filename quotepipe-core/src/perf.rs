//! CPU affinity utilities. Pinning is best-effort: a failure is logged and never fatal
//! (§9 re-architecture note on thread affinity).

use anyhow::Result;
use core_affinity::CoreId;

/// Pin the current thread to `core`. Logs and returns `Ok(())` either way — callers that
/// want hard failure on pin loss should inspect the log, not this return value's absence
/// of detail; the controller treats a failed pin as a warning, not a fatal error.
pub fn pin_to_core(core: usize) -> Result<()> {
    let core_id = CoreId { id: core };

    if core_affinity::set_for_current(core_id) {
        tracing::info!(core, "pinned thread to cpu core");
        Ok(())
    } else {
        anyhow::bail!("failed to pin thread to core {core}")
    }
}
