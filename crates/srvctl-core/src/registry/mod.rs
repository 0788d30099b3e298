//! Installed-server registry (`install-info.xml`).

pub mod schema;
pub mod store;

pub use schema::{InstallInfo, ServerRecord};
pub use store::{RegistryStore, timestamp_now};
