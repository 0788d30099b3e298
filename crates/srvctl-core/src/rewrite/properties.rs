//! `name=value` property files such as `session.conf`.

use std::path::Path;

use crate::error::{InstallerError, Result};

use super::{read_text, replace_first_line, write_if_changed};

fn property_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') || trimmed.starts_with('!') {
        return None;
    }
    let (key, value) = trimmed.split_once('=')?;
    (key.trim() == name).then_some(value)
}

pub fn set_property(path: &Path, name: &str, value: &str) -> Result<()> {
    let content = read_text(path)?;
    let updated = replace_first_line(&content, |body| {
        property_value(body, name).map(|_| format!("{name}={value}"))
    })
    .ok_or_else(|| InstallerError::VariableNotFound {
        name: name.to_string(),
        path: path.to_path_buf(),
    })?;
    write_if_changed(path, &content, &updated)?;
    tracing::debug!(path = %path.display(), name, value, "property set");
    Ok(())
}

pub fn get_property(path: &Path, name: &str) -> Result<String> {
    let content = read_text(path)?;
    content
        .lines()
        .find_map(|line| property_value(line, name))
        .map(|v| v.trim().to_string())
        .ok_or_else(|| InstallerError::VariableNotFound {
            name: name.to_string(),
            path: path.to_path_buf(),
        })
}
