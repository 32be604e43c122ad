//! Player population proxy: entries in the persisted profile directory.

use std::path::Path;

use tracing::{debug, warn};

/// Count the entries of the player-data directory.
///
/// A listing failure is logged and reported as zero so the tick can
/// proceed; the warn line is what distinguishes a degraded zero from a
/// genuinely empty directory.
pub fn count_profiles(path: &Path) -> u64 {
    let entries = match std::fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "failed to list player data directory, reporting zero population"
            );
            return 0;
        }
    };

    let mut count = 0u64;
    for entry in entries {
        match entry {
            Ok(_) => count += 1,
            Err(e) => debug!(error = %e, "skipping unreadable directory entry"),
        }
    }
    count
}
