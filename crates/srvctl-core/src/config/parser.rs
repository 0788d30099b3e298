//! TOML parser with helpful error messages

use std::path::Path;

use crate::error::{InstallerError, IoContext, Result};

use super::schema::InstallerToml;

/// Parse installer.toml with detailed error messages
pub fn parse_installer_toml(path: &Path) -> Result<InstallerToml> {
    let content = std::fs::read_to_string(path)
        .io_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_installer_toml_str(&content, path)
}

/// Parse installer.toml content; `origin` is only used in error messages.
pub fn parse_installer_toml_str(content: &str, origin: &Path) -> Result<InstallerToml> {
    let config: InstallerToml = toml::from_str(content)
        .map_err(|e| InstallerError::malformed(origin, enhance_toml_error(&e, content)))?;

    config.validate()?;

    Ok(config)
}

/// Enhance TOML parsing errors with the offending lines
fn enhance_toml_error(error: &toml::de::Error, content: &str) -> String {
    let message = error.message().to_string();

    match error.span() {
        Some(span) => {
            let line_num = content[..span.start.min(content.len())]
                .matches('\n')
                .count()
                + 1;
            format!(
                "TOML parsing error at line {}:\n{}\n\nError: {}",
                line_num,
                get_line_context(content, line_num),
                message
            )
        }
        None => format!("TOML parsing error: {message}"),
    }
}

/// Get context lines around an error
fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2);
    let end = (line_num + 1).min(lines.len());

    lines[start.min(end)..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
