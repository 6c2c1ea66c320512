//! Structured observability hooks for publish and restore.
//!
//! Events are emitted at `info!` level (warnings for failures) with a
//! stable `event` field so they can be filtered in JSON output.

use std::path::Path;

use tracing::{info, warn};

use crate::restore::RestoreStage;

/// Span scoping every log line of one restore call.
///
/// ```ignore
/// coordinator.start(path, "3").run().instrument(restore_span(path, "3")).await
/// ```
pub fn restore_span(path: &Path, identifier: &str) -> tracing::Span {
    tracing::info_span!(
        "gitvers.restore",
        path = %path.display(),
        identifier = %identifier
    )
}

pub fn emit_publish_committed(version: u64, message: &str) {
    info!(event = "publish.committed", version = version, message = %message);
}

pub fn emit_publish_nothing_to_commit(path: &Path) {
    info!(event = "publish.nothing_to_commit", path = %path.display());
}

pub fn emit_publish_pushed(version: u64, remote: &str) {
    info!(event = "publish.pushed", version = version, remote = %remote);
}

pub fn emit_restore_transition(from: RestoreStage, to: &str) {
    info!(event = "restore.transition", from = %from, to = %to);
}

pub fn emit_restore_completed(commit: &str, branch: &str) {
    info!(event = "restore.completed", commit = %commit, branch = %branch);
}

/// Restore failure (warning level); `backup` is where the prior working
/// copy was left, if one was moved aside.
pub fn emit_restore_failed(stage: RestoreStage, error: &dyn std::fmt::Display, backup: Option<&Path>) {
    warn!(
        event = "restore.failed",
        stage = %stage,
        error = %error,
        backup = ?backup.map(|p| p.display().to_string()),
    );
}

pub fn emit_remote_created(url: &str) {
    info!(event = "remote.created", url = %url);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restore_span_create() {
        let _span = restore_span(Path::new("site"), "3").entered();
        emit_restore_transition(RestoreStage::ResolveIdentifier, "BackupExisting");
    }
}
