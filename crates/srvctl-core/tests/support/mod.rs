#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tempfile::TempDir;

use srvctl_core::config::{DepotLayout, InstallerConfig};
use srvctl_core::error::{InstallerError, Result};
use srvctl_core::process::InstanceControl;
use srvctl_core::types::ServerType;

pub const WAS_ENV: &str = "\
#!/bin/sh
export JAVA_HOME=
export SRVCTL_HOME=
export SERVER_ID=
export SERVICE_PORT=
export INSTALL_PATH=
export WAS_USER=
export JVM_ROUTE=
export ENGN_VERSION=
export LOG_HOME=${INSTALL_PATH}/logs
export AJP_ADDRESS=
export AJP_SECRET=
";

pub const WEB_ENV: &str = "\
#!/bin/sh
export ENGN_HOME=
export SERVER_ID=
export SERVICE_PORT=
export RUN_USER=
export INSTALL_PATH=
export DOC_ROOT=
export LOG_HOME=${INSTALL_PATH}/logs
";

pub const SESSION_ENV: &str = "\
#!/bin/sh
export JAVA_HOME=
export SRVCTL_HOME=
export SERVER_ID=
export ENGN_VERSION=
export SESSION_HOME=
export RUN_USER=
export LOG_HOME=${SESSION_HOME}/logs
";

pub const SESSION_CONF: &str = "\
# replication peers
server.name=
primary.port=
secondary.host=
secondary.port=
";

pub const ROOT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Context docBase="" reloadable="false">
    <Resources cachingAllowed="true"/>
</Context>
"#;

pub const SERVER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Server port="-1" shutdown="SHUTDOWN">
    <Service name="Catalina">
        <Connector protocol="AJP/1.3" secretRequired="true"/>
    </Service>
</Server>
"#;

/// A temporary product home.
pub struct TestHome {
    pub temp: TempDir,
    pub home: PathBuf,
}

impl TestHome {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let home = temp.path().join("srvctl");
        fs::create_dir_all(home.join("etc").join("info")).expect("Failed to create info dir");
        Self { temp, home }
    }

    pub fn config(&self) -> InstallerConfig {
        InstallerConfig::new(&self.home)
            .with_hostname("testhost")
            .with_java_home("/usr/lib/jvm/java-17")
            .with_run_user("srvctl")
    }

    pub fn engine_config(&self) -> InstallerConfig {
        self.config().with_depot_layout(DepotLayout::Engine)
    }

    pub fn write_manifest(&self, modules: &[(&str, &str)]) {
        let mut body = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<release>\n  <depot>\n    <modules>\n");
        for (id, version) in modules {
            body.push_str(&format!(
                "      <module>\n        <id>{id}</id>\n        <version>{version}</version>\n      </module>\n"
            ));
        }
        body.push_str("    </modules>\n  </depot>\n</release>\n");
        write(&self.home.join("etc/info/release-info.xml"), &body);
    }

    /// Release-layout template for `server_type` at `version`.
    pub fn write_template(&self, server_type: ServerType, version: &str) -> PathBuf {
        let dir = self
            .home
            .join("depot")
            .join(server_type.as_str())
            .join(version);
        populate_template(&dir, server_type);
        dir
    }

    /// Engine-layout template `depot/template/<type>/base-<type>-<line>`.
    pub fn write_engine_template(&self, server_type: ServerType, line: &str) -> PathBuf {
        let tag = server_type.as_str();
        let dir = self
            .home
            .join("depot/template")
            .join(tag)
            .join(format!("base-{tag}-{line}"));
        populate_template(&dir, server_type);
        dir
    }

    pub fn install_engine(&self, server_type: ServerType, version: &str) -> PathBuf {
        let engine = server_type.engine_name();
        let dir = self
            .home
            .join("engines")
            .join(engine)
            .join(format!("{engine}-{version}"));
        fs::create_dir_all(dir.join("bin")).expect("Failed to create engine dir");
        dir
    }

    pub fn registry_path(&self) -> PathBuf {
        self.home.join("etc/info/install-info.xml")
    }
}

fn populate_template(dir: &Path, server_type: ServerType) {
    match server_type {
        ServerType::Was => {
            write(&dir.join("env.sh"), WAS_ENV);
            write(&dir.join("conf/server.xml"), SERVER_XML);
            write(&dir.join("conf/Catalina/localhost/ROOT.xml"), ROOT_XML);
            write(&dir.join("logs/.keep"), "");
        }
        ServerType::Web => {
            write(&dir.join("env.sh"), WEB_ENV);
            write(&dir.join("conf/httpd.conf"), "Listen ${SERVICE_PORT}\n");
            write(&dir.join("htdocs/index.html"), "<html></html>\n");
        }
        ServerType::Session => {
            write(&dir.join("env.sh"), SESSION_ENV);
            write(&dir.join("session.conf"), SESSION_CONF);
        }
    }
}

pub fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    fs::write(path, content).expect("Failed to write file");
}

pub fn read(path: &Path) -> String {
    fs::read_to_string(path).expect("Failed to read file")
}

/// Declared value of `name` in a shell env file.
pub fn env_value(path: &Path, name: &str) -> String {
    srvctl_core::rewrite::get_variable(path, name).expect("variable should be declared")
}

#[cfg(unix)]
pub fn mode(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).expect("metadata").permissions().mode() & 0o777
}

/// In-memory stand-in for process probing and stop scripts.
#[derive(Debug, Clone, Default)]
pub struct FakeControl {
    pub running: bool,
    pub stop_fails: bool,
    pub stops: Arc<AtomicUsize>,
}

impl FakeControl {
    pub fn running() -> Self {
        Self {
            running: true,
            ..Default::default()
        }
    }

    pub fn failing_stop() -> Self {
        Self {
            stop_fails: true,
            ..Default::default()
        }
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl InstanceControl for FakeControl {
    fn is_running(&self, _install_path: &Path) -> Result<bool> {
        Ok(self.running)
    }

    fn stop(&self, install_path: &Path) -> Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if self.stop_fails {
            return Err(InstallerError::Process {
                command: install_path.join("stop.sh").display().to_string(),
                message: "exited with 1".to_string(),
            });
        }
        Ok(())
    }
}
