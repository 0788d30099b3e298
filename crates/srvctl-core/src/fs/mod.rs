//! Filesystem primitives shared across installers.

pub mod copy;
pub mod paths;
pub mod permissions;
pub mod wildcard;

pub use copy::{copy_tree, ensure_dir, remove_tree};
pub use paths::{is_subdirectory, resolve_path};
pub use permissions::{PermissionPolicy, apply_permissions};
pub use wildcard::delete_by_wildcard;
