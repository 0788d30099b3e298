//! Deterministic per-instance identifiers.
//!
//! Both values are MD5 derived so re-creating an instance with the same
//! inputs reproduces them. They are not a security boundary.

use md5::{Digest, Md5};

use crate::error::{InstallerError, Result};
use crate::types::is_numeric;

const JVM_ROUTE_HOST_LEN: usize = 12;

/// Lowercase hex MD5 of `text`.
pub fn md5_hex(text: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|byte| format!("{:02x}", byte)).collect()
}

/// AJP shared secret for a server id.
pub fn ajp_secret(server_id: &str) -> String {
    md5_hex(server_id)
}

/// Load-balancer route: first 12 hex chars of md5(hostname) followed by the
/// decimal digits of `port * 2` in reverse order.
pub fn jvm_route(hostname: &str, port: &str) -> Result<String> {
    let doubled = is_numeric(port)
        .then(|| port.parse::<u64>().ok())
        .flatten()
        .and_then(|p| p.checked_mul(2))
        .ok_or_else(|| InstallerError::validation("Service Port should be numeric."))?;

    let mut route: String = md5_hex(hostname).chars().take(JVM_ROUTE_HOST_LEN).collect();
    route.extend(doubled.to_string().chars().rev());
    Ok(route)
}
