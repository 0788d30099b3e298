//! In-place rewriting of configuration files inside a materialised tree.
//!
//! - `env_file`: shell declarations (`export NAME=value` / `set NAME=value`)
//! - `properties`: `name=value` property files
//! - `xml`: attribute values located by a small XPath subset

pub mod env_file;
pub mod properties;
pub mod xml;

use std::fs;
use std::path::Path;

use crate::error::{IoContext, Result};

pub use env_file::{DeclStyle, get_variable, set_variable, try_set_variable};
pub use properties::{get_property, set_property};
pub use xml::{XmlDocument, set_xml_attribute};

/// Replace the first line for which `rewrite` returns a new body.
///
/// Line endings are kept as they were, so the caller only deals with the
/// line body. Returns `None` when no line matched.
pub(crate) fn replace_first_line<F>(content: &str, mut rewrite: F) -> Option<String>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = String::with_capacity(content.len() + 16);
    let mut replaced = false;
    for line in content.split_inclusive('\n') {
        let (body, ending) = split_line_ending(line);
        if !replaced && let Some(new_body) = rewrite(body) {
            out.push_str(&new_body);
            out.push_str(ending);
            replaced = true;
            continue;
        }
        out.push_str(line);
    }
    replaced.then_some(out)
}

pub(crate) fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

pub(crate) fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).io_context(|| format!("Failed to read {}", path.display()))
}

/// Write only when the content changed.
pub(crate) fn write_if_changed(path: &Path, old: &str, new: &str) -> Result<()> {
    if old == new {
        return Ok(());
    }
    fs::write(path, new).io_context(|| format!("Failed to write {}", path.display()))
}
