//! Parameter structs for each operation.
//!
//! Optional fields left `None` (or blank) fall back to the configured
//! defaults for the server type.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::ServerType;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateWebParams {
    pub server_id: String,
    pub service_port: Option<String>,
    pub run_user: Option<String>,
    pub install_root: Option<PathBuf>,
    pub log_home: Option<String>,
    /// Defaults to `<install path>/htdocs`.
    pub document_root: Option<String>,
    /// Defaults to the latest installed httpd engine.
    pub engine_home: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateWasParams {
    pub server_id: String,
    pub service_port: Option<String>,
    pub run_user: Option<String>,
    pub install_root: Option<PathBuf>,
    pub log_home: Option<String>,
    pub ajp_address: Option<String>,
    pub jvm_route: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSessionParams {
    pub server_id: String,
    pub service_port: Option<String>,
    pub secondary_host: Option<String>,
    pub secondary_port: Option<String>,
    pub run_user: Option<String>,
    pub install_root: Option<PathBuf>,
    pub log_home: Option<String>,
}

/// Clone an existing instance under a new id and port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneParams {
    pub source_id: String,
    pub clone_id: String,
    pub clone_port: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteParams {
    pub server_type: ServerType,
    pub server_id: String,
}

/// Switch an instance to another installed engine of the same major.minor line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifyEngineParams {
    pub server_type: ServerType,
    pub server_id: String,
    pub version: String,
}

pub const DEFAULT_SECONDARY_HOST: &str = "127.0.0.1";

/// `Some(trimmed)` unless the value is missing or blank.
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
