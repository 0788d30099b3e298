//! Integration tests for delete

mod support;

use srvctl_core::error::{ErrorKind, InstallerError};
use srvctl_core::installer::{CreateWasParams, DeleteParams, Installer, Operation};
use srvctl_core::types::ServerType;

use support::{FakeControl, TestHome, read};

fn setup() -> TestHome {
    let home = TestHome::new();
    home.write_manifest(&[("was", "9.0.00.A.RELEASE")]);
    home.write_template(ServerType::Was, "9.0.00.A.RELEASE");
    let config = home.config();
    Installer::new(&config, FakeControl::default())
        .execute(Operation::CreateWas(CreateWasParams {
            server_id: "was-8080".to_string(),
            service_port: Some("8080".to_string()),
            ..Default::default()
        }))
        .unwrap();
    home
}

fn delete(server_type: ServerType, id: &str) -> Operation {
    Operation::Delete(DeleteParams {
        server_type,
        server_id: id.to_string(),
    })
}

#[test]
fn delete_removes_tree_and_record() {
    let home = setup();
    let config = home.config();
    let installer = Installer::new(&config, FakeControl::default());

    let report = installer.execute(delete(ServerType::Was, "was-8080")).unwrap();

    assert_eq!(report.operation, "delete");
    assert_eq!(report.port.as_deref(), Some("8080"));
    assert!(!home.home.join("instances/was/was-8080").exists());
    assert!(!installer.registry().exists("was-8080").unwrap());
}

#[test]
fn unknown_id_is_not_found() {
    let home = setup();
    let config = home.config();
    let installer = Installer::new(&config, FakeControl::default());

    let err = installer.execute(delete(ServerType::Was, "was-9999")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn running_instance_is_left_alone() {
    let home = setup();
    let config = home.config();
    let registry_before = read(&home.registry_path());
    let installer = Installer::new(&config, FakeControl::running());

    let err = installer.execute(delete(ServerType::Was, "was-8080")).unwrap_err();

    assert!(matches!(err, InstallerError::InstanceRunning { ref id } if id == "was-8080"));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(home.home.join("instances/was/was-8080/env.sh").exists());
    assert_eq!(read(&home.registry_path()), registry_before);
}

#[test]
fn type_mismatch_is_rejected_without_mutation() {
    let home = setup();
    let config = home.config();
    let installer = Installer::new(&config, FakeControl::default());

    let err = installer.execute(delete(ServerType::Web, "was-8080")).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(home.home.join("instances/was/was-8080").exists());
    assert!(installer.registry().exists("was-8080").unwrap());
}

#[test]
fn vanished_install_path_still_unregisters() {
    let home = setup();
    std::fs::remove_dir_all(home.home.join("instances/was/was-8080")).unwrap();
    let config = home.config();
    let installer = Installer::new(&config, FakeControl::default());

    let report = installer.execute(delete(ServerType::Was, "was-8080")).unwrap();

    assert_eq!(report.warnings.len(), 1);
    assert!(!installer.registry().exists("was-8080").unwrap());
}
