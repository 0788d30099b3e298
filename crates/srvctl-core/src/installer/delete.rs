//! Delete a registered instance and its install directory.

use tracing::{info, warn};

use crate::error::{InstallerError, Result};
use crate::fs::remove_tree;
use crate::process::InstanceControl;

use super::{
    DeleteParams, InstallPhase, InstallReport, Installer, Operation, PhaseTracker,
    require_server_id, require_type,
};

impl<C: InstanceControl> Installer<'_, C> {
    pub(super) fn delete(
        &self,
        op: &Operation,
        p: &DeleteParams,
        tracker: &mut PhaseTracker,
    ) -> Result<InstallReport> {
        let server_id = require_server_id(&p.server_id)?;
        let path = self
            .registry
            .install_path(server_id)?
            .ok_or_else(|| InstallerError::not_found(format!("{server_id} doesn't exist.")))?;

        if self.control.is_running(&path)? {
            return Err(InstallerError::InstanceRunning {
                id: server_id.to_string(),
            });
        }

        let record = self.registry.get(server_id)?;
        require_type(p.server_type, record.server_type, server_id)?;

        tracker.set_target(&path);
        tracker.advance(InstallPhase::MaterializingFiles);
        let mut report = InstallReport::new(op, server_id, &path);
        if path.exists() {
            remove_tree(&path)?;
        } else {
            warn!(path = %path.display(), "install path already gone");
            report
                .warnings
                .push(format!("{} did not exist on disk", path.display()));
        }

        tracker.advance(InstallPhase::RegisteringRecord);
        let removed = self.registry.remove(server_id)?;

        info!(id = %server_id, path = %path.display(), "server deleted");
        report.port = Some(removed.port);
        report.version = removed.version;
        Ok(report)
    }
}
