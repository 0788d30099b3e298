//! XML attribute rewriting with a small XPath subset.
//!
//! Supported expressions: absolute (`/a/b`) and descendant (`//a`, `a//b`)
//! steps, `*` wildcards, and one optional equality predicate per step
//! comparing a child element's text or an attribute with a literal
//! (`'...'`) or a bound variable (`$name`):
//!
//! ```text
//! //Context
//! //release/depot/modules/module[id=$id]
//! /Server/Service/Connector[@protocol='AJP/1.3']
//! ```

use std::fs;
use std::path::Path;

use tracing::debug;
use xmltree::{Element, EmitterConfig, XMLNode};

use crate::error::{InstallerError, IoContext, Result};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// A parsed XML file: the root element plus the comments and processing
/// instructions before and after it.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    prolog: Vec<XMLNode>,
    root: Element,
    epilog: Vec<XMLNode>,
}

impl XmlDocument {
    pub fn new(root: Element) -> Self {
        Self {
            prolog: Vec::new(),
            root,
            epilog: Vec::new(),
        }
    }

    /// Parse `bytes`; `path` is only used for error messages.
    pub fn parse(path: &Path, bytes: &[u8]) -> Result<Self> {
        let nodes = Element::parse_all(bytes).map_err(|e| InstallerError::malformed(path, e))?;

        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut root = None;
        for node in nodes {
            match node {
                XMLNode::Element(el) if root.is_none() => root = Some(el),
                XMLNode::ProcessingInstruction(ref name, _) if name.eq_ignore_ascii_case("xml") => {}
                node @ (XMLNode::Comment(_) | XMLNode::ProcessingInstruction(..)) => {
                    if root.is_none() {
                        prolog.push(node);
                    } else {
                        epilog.push(node);
                    }
                }
                _ => {}
            }
        }
        let root = root.ok_or_else(|| InstallerError::malformed(path, "no root element"))?;
        Ok(Self {
            prolog,
            root,
            epilog,
        })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Serialise with an XML declaration and `indent` per nesting level.
    pub fn render(&self, path: &Path, indent: &'static str) -> Result<Vec<u8>> {
        let mut out = format!("{XML_DECLARATION}\n").into_bytes();
        for node in &self.prolog {
            push_top_level(&mut out, node);
        }
        self.root
            .write_with_config(
                &mut out,
                EmitterConfig::new()
                    .perform_indent(true)
                    .indent_string(indent)
                    .write_document_declaration(false),
            )
            .map_err(|e| InstallerError::malformed(path, e))?;
        out.push(b'\n');
        for node in &self.epilog {
            push_top_level(&mut out, node);
        }
        Ok(out)
    }
}

fn push_top_level(out: &mut Vec<u8>, node: &XMLNode) {
    let text = match node {
        XMLNode::Comment(comment) => format!("<!--{comment}-->\n"),
        XMLNode::ProcessingInstruction(name, Some(data)) => format!("<?{name} {data}?>\n"),
        XMLNode::ProcessingInstruction(name, None) => format!("<?{name}?>\n"),
        _ => return,
    };
    out.extend_from_slice(text.as_bytes());
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Operand {
    Literal(String),
    Variable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Subject {
    Child(String),
    Attribute(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Predicate {
    subject: Subject,
    operand: Operand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    name: String,
    descendant: bool,
    predicate: Option<Predicate>,
}

/// Parsed XPath expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XPath {
    steps: Vec<Step>,
}

impl XPath {
    pub fn parse(expr: &str) -> Result<Self> {
        let invalid = |why: &str| InstallerError::validation(format!("Invalid XPath '{expr}': {why}"));

        let mut steps = Vec::new();
        let mut rest = expr.trim();
        if rest.is_empty() {
            return Err(invalid("empty expression"));
        }
        while !rest.is_empty() {
            let descendant = if let Some(r) = rest.strip_prefix("//") {
                rest = r;
                true
            } else if let Some(r) = rest.strip_prefix('/') {
                rest = r;
                false
            } else if steps.is_empty() {
                false
            } else {
                return Err(invalid("expected '/'"));
            };

            let end = step_end(rest).ok_or_else(|| invalid("unclosed '['"))?;
            let (raw, tail) = rest.split_at(end);
            rest = tail;
            steps.push(parse_step(raw, descendant).map_err(|why| invalid(&why))?);
        }
        Ok(Self { steps })
    }
}

/// Byte offset of the next top-level '/', or the end of input.
fn step_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.checked_sub(1)?,
            '/' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    (depth == 0).then_some(s.len())
}

fn parse_step(raw: &str, descendant: bool) -> std::result::Result<Step, String> {
    let (name, predicate) = match raw.split_once('[') {
        Some((name, pred)) => {
            let pred = pred
                .strip_suffix(']')
                .ok_or_else(|| format!("malformed predicate in '{raw}'"))?;
            (name, Some(parse_predicate(pred)?))
        }
        None => (raw, None),
    };
    let name = name.trim();
    if name.is_empty() {
        return Err("empty step".to_string());
    }
    Ok(Step {
        name: name.to_string(),
        descendant,
        predicate,
    })
}

fn parse_predicate(raw: &str) -> std::result::Result<Predicate, String> {
    let (lhs, rhs) = raw
        .split_once('=')
        .ok_or_else(|| format!("predicate '{raw}' is not an equality"))?;
    let lhs = lhs.trim();
    let rhs = rhs.trim();

    let subject = match lhs.strip_prefix('@') {
        Some(attr) => Subject::Attribute(attr.to_string()),
        None => Subject::Child(lhs.to_string()),
    };
    let operand = if let Some(var) = rhs.strip_prefix('$') {
        Operand::Variable(var.to_string())
    } else if let Some(lit) = rhs
        .strip_prefix('\'')
        .and_then(|r| r.strip_suffix('\''))
        .or_else(|| rhs.strip_prefix('"').and_then(|r| r.strip_suffix('"')))
    {
        Operand::Literal(lit.to_string())
    } else {
        return Err(format!("unsupported operand '{rhs}'"));
    };
    Ok(Predicate { subject, operand })
}

type Vars<'a> = [(&'a str, &'a str)];

impl Step {
    fn matches(&self, el: &Element, vars: &Vars<'_>) -> bool {
        if self.name != "*" && self.name != el.name {
            return false;
        }
        let Some(pred) = &self.predicate else {
            return true;
        };
        let expected = match &pred.operand {
            Operand::Literal(v) => v.as_str(),
            Operand::Variable(name) => match vars.iter().find(|(k, _)| *k == name.as_str()) {
                Some((_, v)) => *v,
                None => return false,
            },
        };
        match &pred.subject {
            Subject::Attribute(attr) => el.attributes.get(attr).map(String::as_str) == Some(expected),
            Subject::Child(child) => el.children.iter().any(|node| match node {
                XMLNode::Element(c) if &c.name == child => c
                    .get_text()
                    .is_some_and(|text| text.trim() == expected),
                _ => false,
            }),
        }
    }
}

/// Search below `el` for `steps`, recording child indices in `path`.
fn find_in(el: &Element, path: &mut Vec<usize>, steps: &[Step], vars: &Vars<'_>) -> bool {
    let Some((step, rest)) = steps.split_first() else {
        return true;
    };
    for (i, node) in el.children.iter().enumerate() {
        let XMLNode::Element(child) = node else {
            continue;
        };
        path.push(i);
        if step.matches(child, vars) && find_in(child, path, rest, vars) {
            return true;
        }
        if step.descendant && find_in(child, path, steps, vars) {
            return true;
        }
        path.pop();
    }
    false
}

/// Path to the first element selected by `xpath`, in document order.
fn select(root: &Element, xpath: &XPath, vars: &Vars<'_>) -> Option<Vec<usize>> {
    let (first, rest) = xpath.steps.split_first()?;
    let mut path = Vec::new();
    if first.matches(root, vars) && find_in(root, &mut path, rest, vars) {
        return Some(path);
    }
    if first.descendant && find_in(root, &mut path, &xpath.steps, vars) {
        return Some(path);
    }
    None
}

fn element_at_mut<'a>(root: &'a mut Element, path: &[usize]) -> Option<&'a mut Element> {
    let mut el = root;
    for &i in path {
        el = match el.children.get_mut(i)? {
            XMLNode::Element(child) => child,
            _ => return None,
        };
    }
    Some(el)
}

/// Set `attr` on the first element selected by `xpath` to `value`.
///
/// Returns `Ok(true)` when the file was rewritten. A missing file, a missing
/// node or an attribute that already holds `value` leave the file untouched.
pub fn set_xml_attribute(
    path: &Path,
    xpath: &str,
    vars: &[(&str, &str)],
    attr: &str,
    value: &str,
) -> Result<bool> {
    let xpath = XPath::parse(xpath)?;
    if !path.is_file() {
        debug!(path = %path.display(), "xml file absent, attribute not set");
        return Ok(false);
    }

    let bytes = fs::read(path).io_context(|| format!("Failed to read {}", path.display()))?;
    let mut doc = XmlDocument::parse(path, &bytes)?;

    let Some(node_path) = select(doc.root(), &xpath, vars) else {
        debug!(path = %path.display(), "xpath matched nothing, attribute not set");
        return Ok(false);
    };
    let Some(element) = element_at_mut(doc.root_mut(), &node_path) else {
        return Ok(false);
    };
    if element.attributes.get(attr).map(String::as_str) == Some(value) {
        return Ok(false);
    }
    element.attributes.insert(attr.to_string(), value.to_string());

    let out = doc.render(path, "    ")?;
    fs::write(path, out).io_context(|| format!("Failed to write {}", path.display()))?;

    debug!(path = %path.display(), attr, value, "xml attribute set");
    Ok(true)
}
