//! Document model for `install-info.xml`.
//!
//! ```xml
//! <install>
//!   <servers>
//!     <server>
//!       <id>was-8080</id>
//!       <port>8080</port>
//!       <type>was</type>
//!       <path>/opt/srvctl/instances/was/was-8080</path>
//!       <version>9.0.00.A.RELEASE</version>
//!       <cdate>20240101120000000</cdate>
//!       <udate>20240101120000000</udate>
//!     </server>
//!   </servers>
//!   <modules>...</modules>
//! </install>
//! ```
//!
//! The document is kept as a tree. Only `<server>` elements under `servers`
//! are read or edited; sibling blocks and unknown `<server>` children are
//! written back untouched.

use std::path::{Path, PathBuf};

use serde::Serialize;
use xmltree::{Element, XMLNode};

use crate::error::{InstallerError, Result};
use crate::rewrite::xml::XmlDocument;
use crate::types::ServerType;

const ROOT: &str = "install";
const SERVERS: &str = "servers";
const SERVER: &str = "server";

/// One installed instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerRecord {
    pub id: String,
    pub port: String,
    #[serde(rename = "type")]
    pub server_type: ServerType,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub cdate: String,
    pub udate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hotfix: Option<String>,
}

impl ServerRecord {
    pub fn new(
        id: impl Into<String>,
        port: impl Into<String>,
        server_type: ServerType,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            port: port.into(),
            server_type,
            path: path.into(),
            recovery: None,
            version: None,
            cdate: String::new(),
            udate: String::new(),
            hotfix: None,
        }
    }

    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    pub fn with_hotfix(mut self, hotfix: Option<String>) -> Self {
        self.hotfix = hotfix;
        self
    }

    /// Read a `<server>` element. Blank optional children read back as `None`.
    fn from_element(el: &Element) -> std::result::Result<Self, String> {
        let required = |name: &str| {
            child_text(el, name).ok_or_else(|| format!("<{SERVER}> without <{name}>"))
        };
        let id = required("id")?;
        let server_type = required("type")?
            .parse()
            .map_err(|e| format!("server {id}: {e}"))?;
        Ok(Self {
            port: required("port")?,
            path: PathBuf::from(required("path")?),
            server_type,
            recovery: child_text(el, "recovery"),
            version: child_text(el, "version"),
            cdate: child_text(el, "cdate").unwrap_or_default(),
            udate: child_text(el, "udate").unwrap_or_default(),
            hotfix: child_text(el, "hotfix"),
            id,
        })
    }

    fn to_element(&self) -> Element {
        let mut el = Element::new(SERVER);
        let path = self.path.to_string_lossy();
        let fields = [
            ("id", Some(self.id.as_str())),
            ("port", Some(self.port.as_str())),
            ("type", Some(self.server_type.as_str())),
            ("path", Some(path.as_ref())),
            ("recovery", self.recovery.as_deref()),
            ("version", self.version.as_deref()),
            ("cdate", Some(self.cdate.as_str())),
            ("udate", Some(self.udate.as_str())),
            ("hotfix", self.hotfix.as_deref()),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                el.children.push(XMLNode::Element(text_element(name, value)));
            }
        }
        el
    }
}

fn text_element(name: &str, value: &str) -> Element {
    let mut el = Element::new(name);
    if !value.is_empty() {
        el.children.push(XMLNode::Text(value.to_string()));
    }
    el
}

/// Trimmed text of child `name`, `None` when absent or blank.
fn child_text(el: &Element, name: &str) -> Option<String> {
    let text = el.get_child(name)?.get_text()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn set_child_text(el: &mut Element, name: &str, value: &str) {
    match el.get_mut_child(name) {
        Some(child) => child.children = vec![XMLNode::Text(value.to_string())],
        None => el.children.push(XMLNode::Element(text_element(name, value))),
    }
}

fn is_server(node: &XMLNode, id: &str) -> bool {
    matches!(node, XMLNode::Element(el) if el.name == SERVER && child_text(el, "id").as_deref() == Some(id))
}

/// Whole registry document with its records decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallInfo {
    doc: XmlDocument,
    records: Vec<ServerRecord>,
}

impl Default for InstallInfo {
    fn default() -> Self {
        let mut root = Element::new(ROOT);
        root.children.push(XMLNode::Element(Element::new(SERVERS)));
        Self {
            doc: XmlDocument::new(root),
            records: Vec::new(),
        }
    }
}

impl InstallInfo {
    /// Decode the records of a parsed document; `path` is for error messages.
    pub fn from_document(path: &Path, doc: XmlDocument) -> Result<Self> {
        let records = match doc.root().get_child(SERVERS) {
            Some(servers) => servers
                .children
                .iter()
                .filter_map(|node| match node {
                    XMLNode::Element(el) if el.name == SERVER => Some(el),
                    _ => None,
                })
                .map(ServerRecord::from_element)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| InstallerError::malformed(path, e))?,
            None => Vec::new(),
        };
        Ok(Self { doc, records })
    }

    pub fn document(&self) -> &XmlDocument {
        &self.doc
    }

    pub fn find(&self, id: &str) -> Option<&ServerRecord> {
        self.records.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    pub fn records(&self) -> &[ServerRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ServerRecord> {
        self.records
    }

    fn servers_mut(&mut self) -> Option<&mut Element> {
        self.doc.root_mut().get_mut_child(SERVERS)
    }

    /// Append a `<server>` element for `record`.
    pub fn push(&mut self, record: ServerRecord) {
        let server = XMLNode::Element(record.to_element());
        let root = self.doc.root_mut();
        match root.get_mut_child(SERVERS) {
            Some(servers) => servers.children.push(server),
            None => {
                let mut servers = Element::new(SERVERS);
                servers.children.push(server);
                root.children.push(XMLNode::Element(servers));
            }
        }
        self.records.push(record);
    }

    /// Remove the first record with `id`, leaving every other node in place.
    pub fn remove(&mut self, id: &str) -> Option<ServerRecord> {
        let index = self.records.iter().position(|s| s.id == id)?;
        if let Some(servers) = self.servers_mut()
            && let Some(at) = servers.children.iter().position(|n| is_server(n, id))
        {
            servers.children.remove(at);
        }
        Some(self.records.remove(index))
    }

    /// Set `udate` of the record with `id`. Returns `false` when absent.
    pub fn set_udate(&mut self, id: &str, udate: &str) -> bool {
        let Some(record) = self.records.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        record.udate = udate.to_string();
        if let Some(servers) = self.servers_mut()
            && let Some(XMLNode::Element(el)) = servers.children.iter_mut().find(|n| is_server(n, id))
        {
            set_child_text(el, "udate", udate);
        }
        true
    }
}
