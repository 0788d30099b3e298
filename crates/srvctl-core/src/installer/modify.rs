//! Switch an instance to another locally installed engine version.

use tracing::info;

use crate::engines::major_minor;
use crate::error::{InstallerError, Result};
use crate::process::InstanceControl;
use crate::rewrite::{get_variable, set_variable};

use super::{
    ENV_FILE, InstallPhase, InstallReport, Installer, ModifyEngineParams, Operation, PhaseTracker,
    require_server_id, require_type,
};

const ENGINE_VERSION_VARIABLE: &str = "ENGN_VERSION";

impl<C: InstanceControl> Installer<'_, C> {
    /// The request is fully validated before the instance is stopped, so a
    /// rejected switch leaves the instance running and untouched.
    pub(super) fn modify_engine(
        &self,
        op: &Operation,
        p: &ModifyEngineParams,
        tracker: &mut PhaseTracker,
    ) -> Result<InstallReport> {
        let server_id = require_server_id(&p.server_id)?;
        let requested = p.version.trim();
        if requested.is_empty() {
            return Err(InstallerError::validation("Engine version is required"));
        }

        let record = self.registry.get(server_id)?;
        require_type(p.server_type, record.server_type, server_id)?;
        if !record.path.is_dir() {
            return Err(InstallerError::not_found(format!(
                "{} doesn't exist.",
                record.path.display()
            )));
        }

        let env = record.path.join(ENV_FILE);
        let current = get_variable(&env, ENGINE_VERSION_VARIABLE)?;
        let mut report = InstallReport::new(op, server_id, &record.path);
        report.port = Some(record.port.clone());

        let (current_line, requested_line) = (major_minor(&current)?, major_minor(requested)?);
        if current_line != requested_line {
            return Err(InstallerError::validation(format!(
                "It is not allowed to modify the major version ({current_line} -> {requested_line})"
            )));
        }
        if !self.catalog.is_installed(p.server_type, requested)? {
            return Err(InstallerError::not_found(format!(
                "{requested} is not installed. Install the version first under {}",
                self.catalog.engine_root(p.server_type).display()
            )));
        }
        if current == requested {
            report.version = Some(current);
            report.warnings.push(format!("{server_id} already uses {requested}"));
            return Ok(report);
        }

        tracker.set_target(&record.path);
        tracker.advance(InstallPhase::RewritingConfig);
        self.control.stop(&record.path)?;
        set_variable(&env, ENGINE_VERSION_VARIABLE, requested)?;

        tracker.advance(InstallPhase::RegisteringRecord);
        self.registry.touch(server_id)?;

        info!(id = %server_id, from = %current, to = %requested, "engine switched");
        report.version = Some(requested.to_string());
        Ok(report)
    }
}
