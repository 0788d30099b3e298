//! Shell environment files (`env.sh` / `env.bat`).

use std::path::Path;

use tracing::debug;

use crate::error::{InstallerError, Result};

use super::{read_text, replace_first_line, write_if_changed};

/// Declaration keyword, chosen by file extension. Only `.sh` files use
/// `export`; everything else is treated as a batch file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclStyle {
    /// `export NAME=value`
    Export,
    /// `set NAME=value`
    Set,
}

impl DeclStyle {
    pub fn for_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("sh") => DeclStyle::Export,
            _ => DeclStyle::Set,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            DeclStyle::Export => "export",
            DeclStyle::Set => "set",
        }
    }
}

/// Split a declaration line of `name` into (prefix up to and including
/// `NAME=`, current value).
fn parse_declaration<'a>(line: &'a str, style: DeclStyle, name: &str) -> Option<(&'a str, &'a str)> {
    let indent = line.len() - line.trim_start().len();
    let after_keyword = line[indent..].strip_prefix(style.keyword())?;
    let decl = after_keyword.trim_start();
    if decl.len() == after_keyword.len() {
        // keyword must be followed by whitespace
        return None;
    }
    let value = decl.strip_prefix(name)?.strip_prefix('=')?;
    let prefix_len = line.len() - value.len();
    Some((&line[..prefix_len], value))
}

/// Rewrite the first declaration of `name` in `content`.
pub fn replace_declaration(content: &str, style: DeclStyle, name: &str, value: &str) -> Option<String> {
    replace_first_line(content, |body| {
        parse_declaration(body, style, name).map(|(prefix, _)| format!("{prefix}{value}"))
    })
}

/// Value of the first declaration of `name` in `content`.
pub fn find_declaration<'a>(content: &'a str, style: DeclStyle, name: &str) -> Option<&'a str> {
    content
        .lines()
        .find_map(|line| parse_declaration(line, style, name))
        .map(|(_, value)| value.trim())
}

/// Set `name` to `value`. The file must already declare `name`.
pub fn set_variable(path: &Path, name: &str, value: &str) -> Result<()> {
    let style = DeclStyle::for_path(path);
    let content = read_text(path)?;
    let updated = replace_declaration(&content, style, name, value).ok_or_else(|| {
        InstallerError::VariableNotFound {
            name: name.to_string(),
            path: path.to_path_buf(),
        }
    })?;
    write_if_changed(path, &content, &updated)?;
    debug!(path = %path.display(), name, value, "variable set");
    Ok(())
}

/// Like [`set_variable`] but never fails; returns whether the value was written.
pub fn try_set_variable(path: &Path, name: &str, value: &str) -> bool {
    match set_variable(path, name, value) {
        Ok(()) => true,
        Err(e) => {
            debug!(path = %path.display(), name, error = %e, "optional variable not set");
            false
        }
    }
}

pub fn get_variable(path: &Path, name: &str) -> Result<String> {
    let content = read_text(path)?;
    find_declaration(&content, DeclStyle::for_path(path), name)
        .map(str::to_string)
        .ok_or_else(|| InstallerError::VariableNotFound {
            name: name.to_string(),
            path: path.to_path_buf(),
        })
}
