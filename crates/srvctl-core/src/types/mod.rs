//! Shared core types used across the registry, resolver and installers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InstallerError;

/// Closed set of server types an instance can be created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerType {
    /// Apache-httpd style web server.
    Web,
    /// Tomcat style servlet container.
    Was,
    /// Session-replication server.
    Session,
}

impl ServerType {
    pub const ALL: [ServerType; 3] = [ServerType::Web, ServerType::Was, ServerType::Session];

    /// Tag stored in the registry and used in depot paths.
    pub fn as_str(self) -> &'static str {
        match self {
            ServerType::Web => "web",
            ServerType::Was => "was",
            ServerType::Session => "session",
        }
    }

    /// Directory name under `engines/` holding the runtimes for this type.
    pub fn engine_name(self) -> &'static str {
        match self {
            ServerType::Web => "httpd",
            ServerType::Was => "tomcat",
            ServerType::Session => "session",
        }
    }
}

impl fmt::Display for ServerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServerType {
    type Err = InstallerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "web" => Ok(ServerType::Web),
            "was" => Ok(ServerType::Was),
            "session" => Ok(ServerType::Session),
            other => Err(InstallerError::validation(format!(
                "Unknown server type: '{other}'. Use 'web', 'was' or 'session'"
            ))),
        }
    }
}

/// True when `value` is a non-empty run of ASCII digits.
pub fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Commands accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Create,
    Clone,
    Delete,
    Modify,
    ListEngines,
    DownloadEngine,
    ModifyEngine,
}

impl CommandKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CommandKind::Create => "create",
            CommandKind::Clone => "clone",
            CommandKind::Delete => "delete",
            CommandKind::Modify => "modify",
            CommandKind::ListEngines => "list-engines",
            CommandKind::DownloadEngine => "download-engine",
            CommandKind::ModifyEngine => "modify-engine",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandKind {
    type Err = InstallerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "create" => Ok(CommandKind::Create),
            "clone" => Ok(CommandKind::Clone),
            "delete" => Ok(CommandKind::Delete),
            "modify" => Ok(CommandKind::Modify),
            "list-engines" => Ok(CommandKind::ListEngines),
            "download-engine" => Ok(CommandKind::DownloadEngine),
            "modify-engine" => Ok(CommandKind::ModifyEngine),
            other => Err(InstallerError::validation(format!(
                "Unknown command: '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_type_parses_case_insensitively() {
        assert_eq!("WAS".parse::<ServerType>().unwrap(), ServerType::Was);
        assert_eq!(" web ".parse::<ServerType>().unwrap(), ServerType::Web);
        assert!("tomcat".parse::<ServerType>().is_err());
    }

    #[test]
    fn numeric_rejects_blank_and_signs() {
        assert!(is_numeric("8080"));
        assert!(!is_numeric(""));
        assert!(!is_numeric("-1"));
        assert!(!is_numeric("abc"));
    }

    #[test]
    fn command_kind_accepts_underscores() {
        assert_eq!(
            "modify_engine".parse::<CommandKind>().unwrap(),
            CommandKind::ModifyEngine
        );
        assert_eq!(
            CommandKind::ListEngines.to_string(),
            "list-engines".to_string()
        );
    }
}
