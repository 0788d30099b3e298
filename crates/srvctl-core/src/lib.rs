//! srvctl Core Library
//!
//! Provisions, clones, deletes and reconfigures application-server
//! instances from depot templates, and keeps the `install-info.xml`
//! registry of installed instances consistent.

pub mod config;
pub mod context;
pub mod dispatch;
pub mod engines;
pub mod error;
pub mod fs;
pub mod installer;
pub mod process;
pub mod registry;
pub mod release;
pub mod rewrite;
pub mod secret;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{DepotLayout, InstallerConfig, TypeDefaults};
    pub use crate::context::AppContext;

    // Errors
    pub use crate::error::{ErrorKind, InstallerError, Result};

    // Dispatch
    pub use crate::dispatch::{OperationInput, Request, build_request, dispatch};
    pub use crate::types::{CommandKind, ServerType};

    // Installers
    pub use crate::installer::{
        CloneParams, CreateSessionParams, CreateWasParams, CreateWebParams, DeleteParams,
        InstallPhase, InstallReport, Installer, ModifyEngineParams, Operation,
    };
    pub use crate::process::{InstanceControl, ProcessControl};

    // Registry and templates
    pub use crate::engines::EngineCatalog;
    pub use crate::registry::{RegistryStore, ServerRecord};
    pub use crate::release::{TemplateResolver, TemplateSource};
}
