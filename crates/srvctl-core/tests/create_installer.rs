//! Integration tests for create operations

mod support;

use srvctl_core::error::{ErrorKind, InstallerError};
use srvctl_core::installer::{
    CreateSessionParams, CreateWasParams, CreateWebParams, Installer, Operation,
};
use srvctl_core::rewrite::get_property;
use srvctl_core::secret::md5_hex;
use srvctl_core::types::ServerType;

use support::{FakeControl, TestHome, env_value, read};

const WAS_VERSION: &str = "9.0.00.A.RELEASE";

fn was_params(id: &str, port: &str) -> CreateWasParams {
    CreateWasParams {
        server_id: id.to_string(),
        service_port: Some(port.to_string()),
        ..Default::default()
    }
}

fn setup_was() -> TestHome {
    let home = TestHome::new();
    home.write_manifest(&[("was", WAS_VERSION), ("web", "2.4.58.R1"), ("session", "1.0.3")]);
    home.write_template(ServerType::Was, WAS_VERSION);
    home
}

#[test]
fn create_was_materialises_and_registers() {
    let home = setup_was();
    let config = home.config();
    let installer = Installer::new(&config, FakeControl::default());

    let report = installer
        .execute(Operation::CreateWas(was_params("was-8080", "8080")))
        .expect("create should succeed");

    let target = home.home.join("instances/was/was-8080");
    assert_eq!(report.operation, "create");
    assert_eq!(report.server_type, ServerType::Was);
    assert_eq!(report.path, target);
    assert_eq!(report.port.as_deref(), Some("8080"));
    assert_eq!(report.version.as_deref(), Some(WAS_VERSION));

    let env = target.join("env.sh");
    assert_eq!(env_value(&env, "SERVER_ID"), "was-8080");
    assert_eq!(env_value(&env, "SERVICE_PORT"), "8080");
    assert_eq!(env_value(&env, "INSTALL_PATH"), target.to_string_lossy());
    assert_eq!(env_value(&env, "JAVA_HOME"), "/usr/lib/jvm/java-17");
    assert_eq!(env_value(&env, "SRVCTL_HOME"), home.home.to_string_lossy());
    assert_eq!(env_value(&env, "WAS_USER"), "srvctl");
    assert_eq!(env_value(&env, "JVM_ROUTE"), "host1_8180");
    assert_eq!(env_value(&env, "AJP_ADDRESS"), "127.0.0.1");
    assert_eq!(env_value(&env, "AJP_SECRET"), md5_hex("was-8080"));
    assert_eq!(env_value(&env, "AJP_SECRET").len(), 32);
    assert_eq!(env_value(&env, "LOG_HOME"), "${INSTALL_PATH}/logs");
    assert_eq!(env_value(&env, "ENGN_VERSION"), "", "no engine installed");

    let root_xml = read(&target.join("conf/Catalina/localhost/ROOT.xml"));
    let doc_base = home.home.join("depot/sample-application/ROOT");
    assert!(root_xml.contains(&format!("docBase=\"{}\"", doc_base.display())));

    let record = installer.registry().get("was-8080").unwrap();
    assert_eq!(record.port, "8080");
    assert_eq!(record.server_type, ServerType::Was);
    assert_eq!(record.path, target);
    assert_eq!(record.version.as_deref(), Some(WAS_VERSION));
    assert_eq!(record.cdate, record.udate);

    let template_env = home.home.join("depot/was").join(WAS_VERSION).join("env.sh");
    assert_eq!(read(&template_env), support::WAS_ENV, "template stays pristine");
}

#[cfg(unix)]
#[test]
fn create_was_secures_conf_directory() {
    let home = setup_was();
    let config = home.config();
    let installer = Installer::new(&config, FakeControl::default());

    installer
        .execute(Operation::CreateWas(was_params("was-8080", "8080")))
        .unwrap();

    let target = home.home.join("instances/was/was-8080");
    assert_eq!(support::mode(&target.join("conf")), 0o700);
    assert_eq!(support::mode(&target.join("conf/server.xml")), 0o600);
    assert_eq!(support::mode(&target.join("env.sh")), 0o755);
}

#[test]
fn custom_log_home_is_scoped_by_server_id() {
    let home = setup_was();
    let config = home.config();
    let installer = Installer::new(&config, FakeControl::default());

    let mut params = was_params("was-8080", "8080");
    params.log_home = Some("/var/log/srvctl".to_string());
    installer.execute(Operation::CreateWas(params)).unwrap();

    let env = home.home.join("instances/was/was-8080/env.sh");
    assert_eq!(env_value(&env, "LOG_HOME"), "/var/log/srvctl/${SERVER_ID}");
}

#[test]
fn engine_version_is_written_when_an_engine_is_installed() {
    let home = setup_was();
    home.install_engine(ServerType::Was, "9.0.07");
    let config = home.config();
    let installer = Installer::new(&config, FakeControl::default());

    installer
        .execute(Operation::CreateWas(was_params("was-8080", "8080")))
        .unwrap();

    let env = home.home.join("instances/was/was-8080/env.sh");
    assert_eq!(env_value(&env, "ENGN_VERSION"), "9.0.07");
}

#[test]
fn install_root_override_is_honoured() {
    let home = setup_was();
    let config = home.config();
    let installer = Installer::new(&config, FakeControl::default());
    let root = home.temp.path().join("custom");

    let mut params = was_params("was-9090", "9090");
    params.install_root = Some(root.clone());
    let report = installer.execute(Operation::CreateWas(params)).unwrap();

    assert_eq!(report.path, root.join("was-9090"));
    assert!(root.join("was-9090/env.sh").is_file());
}

#[test]
fn root_user_is_rejected_unless_allowed() {
    let home = setup_was();
    let config = home.config();
    let installer = Installer::new(&config, FakeControl::default());

    let mut params = was_params("was-8080", "8080");
    params.run_user = Some("root".to_string());
    let err = installer
        .execute(Operation::CreateWas(params.clone()))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(!home.home.join("instances/was/was-8080").exists());
    assert!(installer.registry().list().unwrap().is_empty());

    let permissive = home.config().with_root_user_allowed(true);
    let installer = Installer::new(&permissive, FakeControl::default());
    installer.execute(Operation::CreateWas(params)).unwrap();
    let env = home.home.join("instances/was/was-8080/env.sh");
    assert_eq!(env_value(&env, "WAS_USER"), "root");
}

#[test]
fn non_numeric_port_is_rejected_before_copy() {
    let home = setup_was();
    let config = home.config();
    let installer = Installer::new(&config, FakeControl::default());

    let err = installer
        .execute(Operation::CreateWas(was_params("was-x", "80a")))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(!home.home.join("instances/was/was-x").exists());
}

#[test]
fn duplicate_id_and_existing_path_conflict() {
    let home = setup_was();
    let config = home.config();
    let installer = Installer::new(&config, FakeControl::default());
    installer
        .execute(Operation::CreateWas(was_params("was-8080", "8080")))
        .unwrap();

    let dup = installer
        .execute(Operation::CreateWas(was_params("was-8080", "8081")))
        .unwrap_err();
    assert!(matches!(dup, InstallerError::DuplicateId { .. }));

    // unregistered directory in the way
    std::fs::create_dir_all(home.home.join("instances/was/was-9090/conf")).unwrap();
    let conflict = installer
        .execute(Operation::CreateWas(was_params("was-9090", "9090")))
        .unwrap_err();
    assert!(matches!(conflict, InstallerError::Conflict(_)));
    assert_eq!(conflict.kind(), ErrorKind::Conflict);
    assert!(!home.home.join("instances/was/was-9090/env.sh").exists());
    assert_eq!(installer.registry().list().unwrap().len(), 1);
}

#[test]
fn missing_template_directory_is_not_found() {
    let home = TestHome::new();
    home.write_manifest(&[("was", WAS_VERSION)]);
    let config = home.config();
    let installer = Installer::new(&config, FakeControl::default());

    let err = installer
        .execute(Operation::CreateWas(was_params("was-8080", "8080")))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!home.home.join("instances/was/was-8080").exists());
}

#[test]
fn template_missing_a_variable_leaves_unregistered_partial_tree() {
    let home = setup_was();
    let env = home.home.join("depot/was").join(WAS_VERSION).join("env.sh");
    support::write(&env, "export SERVER_ID=\n");
    let config = home.config();
    let installer = Installer::new(&config, FakeControl::default());

    let err = installer
        .execute(Operation::CreateWas(was_params("was-8080", "8080")))
        .unwrap_err();

    assert!(matches!(err, InstallerError::VariableNotFound { .. }));
    assert!(home.home.join("instances/was/was-8080").exists());
    assert!(!installer.registry().exists("was-8080").unwrap());
}

#[test]
fn create_web_defaults_document_root_and_engine_home() {
    let home = setup_was();
    home.write_template(ServerType::Web, "2.4.58.R1");
    let engine = home.install_engine(ServerType::Web, "2.4.58");
    let config = home.config();
    let installer = Installer::new(&config, FakeControl::default());

    let report = installer
        .execute(Operation::CreateWeb(CreateWebParams {
            server_id: "web-80".to_string(),
            ..Default::default()
        }))
        .unwrap();

    let target = home.home.join("instances/web/web-80");
    assert_eq!(report.port.as_deref(), Some("80"));
    let env = target.join("env.sh");
    assert_eq!(env_value(&env, "SERVICE_PORT"), "80");
    assert_eq!(env_value(&env, "RUN_USER"), "srvctl");
    assert_eq!(env_value(&env, "DOC_ROOT"), target.join("htdocs").to_string_lossy());
    assert_eq!(env_value(&env, "ENGN_HOME"), engine.to_string_lossy());
    assert_eq!(env_value(&env, "INSTALL_PATH"), target.to_string_lossy());
    assert_eq!(
        installer.registry().get("web-80").unwrap().version.as_deref(),
        Some("2.4.58.R1")
    );
}

#[test]
fn create_session_rewrites_properties() {
    let home = setup_was();
    home.write_template(ServerType::Session, "1.0.3");
    let config = home.config();
    let installer = Installer::new(&config, FakeControl::default());

    installer
        .execute(Operation::CreateSession(CreateSessionParams {
            server_id: "session-5180".to_string(),
            secondary_host: Some("10.0.0.2".to_string()),
            ..Default::default()
        }))
        .unwrap();

    let target = home.home.join("instances/session/session-5180");
    let conf = target.join("session.conf");
    assert_eq!(get_property(&conf, "server.name").unwrap(), "session-5180");
    assert_eq!(get_property(&conf, "primary.port").unwrap(), "5180");
    assert_eq!(get_property(&conf, "secondary.host").unwrap(), "10.0.0.2");
    assert_eq!(get_property(&conf, "secondary.port").unwrap(), "5181");
    let env = target.join("env.sh");
    assert_eq!(env_value(&env, "SESSION_HOME"), target.to_string_lossy());
    assert_eq!(env_value(&env, "SERVER_ID"), "session-5180");
}

#[test]
fn session_secondary_port_must_be_numeric() {
    let home = setup_was();
    home.write_template(ServerType::Session, "1.0.3");
    let config = home.config();
    let installer = Installer::new(&config, FakeControl::default());

    let err = installer
        .execute(Operation::CreateSession(CreateSessionParams {
            server_id: "session-5180".to_string(),
            secondary_port: Some("51x1".to_string()),
            ..Default::default()
        }))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(!home.home.join("instances/session/session-5180").exists());
}

#[test]
fn engine_layout_create_uses_base_template() {
    let home = TestHome::new();
    home.install_engine(ServerType::Was, "9.0.07");
    home.write_engine_template(ServerType::Was, "9.0");
    let config = home.engine_config();
    let installer = Installer::new(&config, FakeControl::default());

    let report = installer
        .execute(Operation::CreateWas(was_params("was-8080", "8080")))
        .unwrap();

    assert_eq!(report.version.as_deref(), Some("9.0.07"));
    let env = home.home.join("instances/was/was-8080/env.sh");
    assert_eq!(env_value(&env, "ENGN_VERSION"), "9.0.07");
}
