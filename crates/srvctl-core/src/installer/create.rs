//! Create a new instance from a depot template.

use std::path::PathBuf;

use tracing::info;

use crate::error::{InstallerError, Result};
use crate::fs::{PermissionPolicy, apply_permissions, copy_tree};
use crate::process::InstanceControl;
use crate::registry::ServerRecord;
use crate::release::TemplateSource;
use crate::rewrite::{set_property, set_variable, set_xml_attribute};
use crate::secret::ajp_secret;
use crate::types::ServerType;

use super::params::{DEFAULT_SECONDARY_HOST, non_blank};
use super::{
    CreateSessionParams, CreateWasParams, CreateWebParams, ENV_FILE, HOME_VARIABLE, InstallPhase,
    InstallReport, Installer, Operation, PhaseTracker, SECURE_CONF_DIR, custom_log_home, path_str,
    require_absent_path, require_numeric_port, require_server_id,
};

const SESSION_CONF: &str = "session.conf";
const ROOT_CONTEXT_XML: [&str; 4] = ["conf", "Catalina", "localhost", "ROOT.xml"];

/// Inputs shared by every create variant, validated and defaulted.
struct CreatePlan {
    server_type: ServerType,
    server_id: String,
    port: String,
    run_user: String,
    target: PathBuf,
    template: TemplateSource,
    engine_version: Option<String>,
    log_home: Option<String>,
}

impl CreatePlan {
    fn env_file(&self) -> PathBuf {
        self.target.join(ENV_FILE)
    }
}

struct CreateInput<'p> {
    server_id: &'p str,
    service_port: &'p Option<String>,
    run_user: &'p Option<String>,
    install_root: &'p Option<PathBuf>,
    log_home: &'p Option<String>,
}

impl<C: InstanceControl> Installer<'_, C> {
    fn prepare_create(&self, server_type: ServerType, input: CreateInput<'_>) -> Result<CreatePlan> {
        let defaults = self.config.defaults(server_type);
        let server_id = require_server_id(input.server_id)?.to_string();

        let port = non_blank(input.service_port)
            .unwrap_or(&defaults.service_port)
            .to_string();
        require_numeric_port(&port)?;

        let run_user = non_blank(input.run_user)
            .unwrap_or_else(|| self.config.default_run_user(server_type))
            .to_string();
        if run_user == "root" && !self.config.root_user_allowed() {
            return Err(InstallerError::validation(format!(
                "{server_type} can't run as root user."
            )));
        }

        if self.registry.exists(&server_id)? {
            return Err(InstallerError::DuplicateId { id: server_id });
        }

        let install_root = input
            .install_root
            .clone()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| self.config.install_root(server_type));
        let target = install_root.join(&server_id);
        require_absent_path(&target)?;

        let template = self.resolver.resolve_depot_path(server_type)?;
        if !template.path.is_dir() {
            return Err(InstallerError::not_found(format!(
                "Template directory doesn't exist: {}",
                template.path.display()
            )));
        }
        let engine_version = self.catalog.latest(server_type)?;
        let log_home = custom_log_home(non_blank(input.log_home), &target);

        Ok(CreatePlan {
            server_type,
            server_id,
            port,
            run_user,
            target,
            template,
            engine_version,
            log_home,
        })
    }

    fn materialize(&self, plan: &CreatePlan, tracker: &mut PhaseTracker) -> Result<()> {
        tracker.set_target(&plan.target);
        tracker.advance(InstallPhase::MaterializingFiles);
        copy_tree(&plan.template.path, &plan.target)?;
        tracker.advance(InstallPhase::RewritingConfig);
        Ok(())
    }

    fn register_created(
        &self,
        op: &Operation,
        plan: CreatePlan,
        tracker: &mut PhaseTracker,
    ) -> Result<InstallReport> {
        tracker.advance(InstallPhase::RegisteringRecord);
        let record = ServerRecord::new(&plan.server_id, &plan.port, plan.server_type, &plan.target)
            .with_version(Some(plan.template.version.clone()));
        let record = self.registry.add(record)?;

        info!(id = %record.id, path = %record.path.display(), "server created");
        let mut report = InstallReport::new(op, &record.id, &record.path);
        report.port = Some(record.port);
        report.version = record.version;
        Ok(report)
    }

    pub(super) fn create_was(
        &self,
        op: &Operation,
        p: &CreateWasParams,
        tracker: &mut PhaseTracker,
    ) -> Result<InstallReport> {
        let plan = self.prepare_create(
            ServerType::Was,
            CreateInput {
                server_id: &p.server_id,
                service_port: &p.service_port,
                run_user: &p.run_user,
                install_root: &p.install_root,
                log_home: &p.log_home,
            },
        )?;
        let defaults = self.config.defaults(ServerType::Was);
        let ajp_address = non_blank(&p.ajp_address).unwrap_or(&defaults.ajp_address);
        let jvm_route = non_blank(&p.jvm_route).unwrap_or(&defaults.jvm_route);

        self.materialize(&plan, tracker)?;

        let env = plan.env_file();
        let target = path_str(&plan.target);
        set_variable(&env, "JAVA_HOME", self.config.java_home())?;
        set_variable(&env, HOME_VARIABLE, &path_str(self.config.home()))?;
        set_variable(&env, "SERVER_ID", &plan.server_id)?;
        set_variable(&env, "SERVICE_PORT", &plan.port)?;
        set_variable(&env, "INSTALL_PATH", &target)?;
        set_variable(&env, "WAS_USER", &plan.run_user)?;
        set_variable(&env, "JVM_ROUTE", jvm_route)?;
        if let Some(version) = &plan.engine_version {
            set_variable(&env, "ENGN_VERSION", version)?;
        }
        if let Some(log_home) = &plan.log_home {
            set_variable(&env, "LOG_HOME", log_home)?;
        }
        set_variable(&env, "AJP_ADDRESS", ajp_address)?;
        set_variable(&env, "AJP_SECRET", &ajp_secret(&plan.server_id))?;

        apply_permissions(&plan.target.join(SECURE_CONF_DIR), PermissionPolicy::SECURE)?;

        let root_xml = ROOT_CONTEXT_XML
            .iter()
            .fold(plan.target.clone(), |path, part| path.join(part));
        set_xml_attribute(
            &root_xml,
            "//Context",
            &[],
            "docBase",
            &path_str(&self.config.sample_application_dir()),
        )?;

        self.register_created(op, plan, tracker)
    }

    pub(super) fn create_web(
        &self,
        op: &Operation,
        p: &CreateWebParams,
        tracker: &mut PhaseTracker,
    ) -> Result<InstallReport> {
        let plan = self.prepare_create(
            ServerType::Web,
            CreateInput {
                server_id: &p.server_id,
                service_port: &p.service_port,
                run_user: &p.run_user,
                install_root: &p.install_root,
                log_home: &p.log_home,
            },
        )?;
        let engine_home = match non_blank(&p.engine_home) {
            Some(home) => home.to_string(),
            None => {
                let dir = match &plan.engine_version {
                    Some(version) => self.catalog.engine_dir(ServerType::Web, version),
                    None => self.catalog.engine_root(ServerType::Web),
                };
                path_str(&dir)
            }
        };
        let document_root = non_blank(&p.document_root)
            .map(str::to_string)
            .unwrap_or_else(|| path_str(&plan.target.join("htdocs")));

        self.materialize(&plan, tracker)?;

        let env = plan.env_file();
        set_variable(&env, "ENGN_HOME", &engine_home)?;
        set_variable(&env, "SERVER_ID", &plan.server_id)?;
        set_variable(&env, "SERVICE_PORT", &plan.port)?;
        set_variable(&env, "RUN_USER", &plan.run_user)?;
        set_variable(&env, "INSTALL_PATH", &path_str(&plan.target))?;
        set_variable(&env, "DOC_ROOT", &document_root)?;
        if let Some(log_home) = &plan.log_home {
            set_variable(&env, "LOG_HOME", log_home)?;
        }

        self.register_created(op, plan, tracker)
    }

    pub(super) fn create_session(
        &self,
        op: &Operation,
        p: &CreateSessionParams,
        tracker: &mut PhaseTracker,
    ) -> Result<InstallReport> {
        let defaults = self.config.defaults(ServerType::Session);
        let secondary_port = non_blank(&p.secondary_port)
            .unwrap_or(&defaults.secondary_service_port)
            .to_string();
        require_numeric_port(&secondary_port)?;
        let secondary_host = non_blank(&p.secondary_host).unwrap_or(DEFAULT_SECONDARY_HOST);

        let plan = self.prepare_create(
            ServerType::Session,
            CreateInput {
                server_id: &p.server_id,
                service_port: &p.service_port,
                run_user: &p.run_user,
                install_root: &p.install_root,
                log_home: &p.log_home,
            },
        )?;

        self.materialize(&plan, tracker)?;

        let env = plan.env_file();
        set_variable(&env, "JAVA_HOME", self.config.java_home())?;
        set_variable(&env, HOME_VARIABLE, &path_str(self.config.home()))?;
        set_variable(&env, "SERVER_ID", &plan.server_id)?;
        if let Some(version) = &plan.engine_version {
            set_variable(&env, "ENGN_VERSION", version)?;
        }
        set_variable(&env, "SESSION_HOME", &path_str(&plan.target))?;
        set_variable(&env, "RUN_USER", &plan.run_user)?;
        if let Some(log_home) = &plan.log_home {
            set_variable(&env, "LOG_HOME", log_home)?;
        }

        let conf = plan.target.join(SESSION_CONF);
        set_property(&conf, "server.name", &plan.server_id)?;
        set_property(&conf, "primary.port", &plan.port)?;
        set_property(&conf, "secondary.host", secondary_host)?;
        set_property(&conf, "secondary.port", &secondary_port)?;

        self.register_created(op, plan, tracker)
    }
}
