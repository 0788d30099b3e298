//! Clone a registered instance under a new id and port.

use std::path::Path;

use tracing::info;

use crate::error::{InstallerError, Result};
use crate::fs::{
    PermissionPolicy, apply_permissions, copy_tree, delete_by_wildcard, ensure_dir,
    is_subdirectory,
};
use crate::process::InstanceControl;
use crate::registry::ServerRecord;
use crate::rewrite::{get_variable, set_variable, try_set_variable};
use crate::secret::{ajp_secret, jvm_route};
use crate::types::ServerType;

use super::{
    CloneParams, ENV_FILE, InstallPhase, InstallReport, Installer, Operation, PhaseTracker,
    SECURE_CONF_DIR, path_str, require_absent_path, require_numeric_port, require_server_id,
    require_type,
};

impl<C: InstanceControl> Installer<'_, C> {
    pub(super) fn clone_server(
        &self,
        op: &Operation,
        p: &CloneParams,
        tracker: &mut PhaseTracker,
    ) -> Result<InstallReport> {
        let server_type = op.server_type();
        let source_id = require_server_id(&p.source_id)?;
        let clone_id = require_server_id(&p.clone_id)?;
        let clone_port = p.clone_port.trim();

        let source = self.registry.get(source_id)?;
        require_numeric_port(&source.port)?;
        require_numeric_port(clone_port)?;

        if !source.path.is_dir() {
            return Err(InstallerError::not_found(format!(
                "{} doesn't exist.",
                source.path.display()
            )));
        }
        if self.registry.exists(clone_id)? {
            return Err(InstallerError::DuplicateId {
                id: clone_id.to_string(),
            });
        }

        let clone_root = match self.config.clone_install_root() {
            Some(root) => root.to_path_buf(),
            None => source
                .path
                .parent()
                .map(|p| p.to_path_buf())
                .ok_or_else(|| {
                    InstallerError::validation(format!(
                        "{} has no parent directory",
                        source.path.display()
                    ))
                })?,
        };
        let target = clone_root.join(clone_id);
        require_absent_path(&target)?;
        require_type(server_type, source.server_type, source_id)?;

        tracker.set_target(&target);
        tracker.advance(InstallPhase::MaterializingFiles);
        copy_tree(&source.path, &target)?;
        let pid_files = delete_by_wildcard(&target, "*.pid")?;
        tracing::debug!(count = pid_files, "stale pid files removed");

        tracker.advance(InstallPhase::RewritingConfig);
        let env = target.join(ENV_FILE);
        let target_str = path_str(&target);
        let mut warnings = Vec::new();

        set_variable(&env, "SERVER_ID", clone_id)?;
        set_variable(&env, "SERVICE_PORT", clone_port)?;

        if server_type == ServerType::Was {
            set_variable(&env, "INSTALL_PATH", &target_str)?;
            let route = jvm_route(self.config.hostname(), clone_port)?;
            if !try_set_variable(&env, "JVM_ROUTE", &route) {
                warnings.push(format!("JVM_ROUTE is not declared in {}", env.display()));
            }
            set_variable(&env, "AJP_SECRET", &ajp_secret(clone_id))?;
            apply_permissions(&target.join(SECURE_CONF_DIR), PermissionPolicy::SECURE)?;
            ensure_dir(&target.join("temp"))?;
        } else {
            // document root inside the source moves with the clone; an external one is shared
            let source_install = get_variable(&env, "INSTALL_PATH")?;
            let source_doc_root = get_variable(&env, "DOC_ROOT")?;
            set_variable(&env, "INSTALL_PATH", &target_str)?;
            if is_subdirectory(Path::new(&source_install), Path::new(&source_doc_root)) {
                set_variable(&env, "DOC_ROOT", &path_str(&target.join("htdocs")))?;
            } else {
                info!(doc_root = %source_doc_root, "external document root kept");
            }
        }

        tracker.advance(InstallPhase::RegisteringRecord);
        let record = ServerRecord::new(clone_id, clone_port, server_type, &target)
            .with_version(source.version.clone())
            .with_hotfix(source.hotfix.clone());
        let record = self.registry.add(record)?;

        info!(source = %source.id, clone = %record.id, path = %record.path.display(), "server cloned");
        let mut report = InstallReport::new(op, &record.id, &record.path);
        report.port = Some(record.port);
        report.version = record.version;
        report.warnings = warnings;
        Ok(report)
    }
}
