//! Maps a (command, server type) pair plus raw field values onto an
//! [`Operation`].

use std::path::PathBuf;

use crate::error::{InstallerError, Result};
use crate::installer::{
    CloneParams, CreateSessionParams, CreateWasParams, CreateWebParams, DeleteParams,
    ModifyEngineParams, Operation,
};
use crate::types::{CommandKind, ServerType};

/// Raw field values collected by a front end. Blank values count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationInput {
    pub server_id: Option<String>,
    pub service_port: Option<String>,
    pub run_user: Option<String>,
    pub install_root: Option<String>,
    pub log_home: Option<String>,
    pub document_root: Option<String>,
    pub engine_home: Option<String>,
    pub ajp_address: Option<String>,
    pub jvm_route: Option<String>,
    pub secondary_host: Option<String>,
    pub secondary_port: Option<String>,
    pub clone_id: Option<String>,
    pub clone_port: Option<String>,
    pub version: Option<String>,
}

/// What a command resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// A registry/filesystem mutation.
    Execute(Operation),
    /// Read-only listing of locally installed engines.
    ListEngines(ServerType),
}

/// Parse the command and type tags, then build the request.
pub fn dispatch(command: &str, server_type: &str, input: OperationInput) -> Result<Request> {
    build_request(command.parse()?, server_type.parse()?, input)
}

pub fn build_request(
    command: CommandKind,
    server_type: ServerType,
    input: OperationInput,
) -> Result<Request> {
    let op = match (command, server_type) {
        (CommandKind::ListEngines, _) => return Ok(Request::ListEngines(server_type)),
        (CommandKind::DownloadEngine, _) => {
            let engine = server_type.engine_name();
            return Err(InstallerError::Unsupported(format!(
                "download-engine is not supported; unpack engines into $SRVCTL_HOME/engines/{engine}/{engine}-<version>"
            )));
        }
        (CommandKind::Create, ServerType::Web) => Operation::CreateWeb(CreateWebParams {
            server_id: required(&input.server_id, "SERVER_ID")?,
            service_port: input.service_port,
            run_user: input.run_user,
            install_root: path(input.install_root),
            log_home: input.log_home,
            document_root: input.document_root,
            engine_home: input.engine_home,
        }),
        (CommandKind::Create, ServerType::Was) => Operation::CreateWas(CreateWasParams {
            server_id: required(&input.server_id, "SERVER_ID")?,
            service_port: input.service_port,
            run_user: input.run_user,
            install_root: path(input.install_root),
            log_home: input.log_home,
            ajp_address: input.ajp_address,
            jvm_route: input.jvm_route,
        }),
        (CommandKind::Create, ServerType::Session) => {
            Operation::CreateSession(CreateSessionParams {
                server_id: required(&input.server_id, "SERVER_ID")?,
                service_port: input.service_port,
                secondary_host: input.secondary_host,
                secondary_port: input.secondary_port,
                run_user: input.run_user,
                install_root: path(input.install_root),
                log_home: input.log_home,
            })
        }
        (CommandKind::Clone, ServerType::Session) => {
            return Err(InstallerError::Unsupported(
                "clone is not supported for session servers".to_string(),
            ));
        }
        (CommandKind::Clone, _) => {
            let params = CloneParams {
                source_id: required(&input.server_id, "SERVER_ID")?,
                clone_id: required(&input.clone_id, "CLONE_SERVER_ID")?,
                clone_port: required(&input.clone_port, "CLONE_SERVICE_PORT")?,
            };
            if server_type == ServerType::Web {
                Operation::CloneWeb(params)
            } else {
                Operation::CloneWas(params)
            }
        }
        (CommandKind::Delete, _) => Operation::Delete(DeleteParams {
            server_type,
            server_id: required(&input.server_id, "SERVER_ID")?,
        }),
        (CommandKind::Modify | CommandKind::ModifyEngine, _) => {
            Operation::ModifyEngine(ModifyEngineParams {
                server_type,
                server_id: required(&input.server_id, "SERVER_ID")?,
                version: required(&input.version, "ENGN_VERSION")?,
            })
        }
    };
    Ok(Request::Execute(op))
}

fn required(value: &Option<String>, field: &str) -> Result<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| InstallerError::validation(format!("{field} is required")))
}

fn path(value: Option<String>) -> Option<PathBuf> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
