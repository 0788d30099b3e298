//! Integration tests for env-file and property-file rewriting

mod support;

use srvctl_core::error::{ErrorKind, InstallerError};
use srvctl_core::rewrite::{get_property, get_variable, set_property, set_variable, try_set_variable};

use support::{SESSION_CONF, TestHome, WAS_ENV, read, write};

#[test]
fn set_variable_rewrites_only_the_declared_value() {
    let home = TestHome::new();
    let env = home.home.join("env.sh");
    write(&env, WAS_ENV);

    set_variable(&env, "SERVICE_PORT", "8080").unwrap();

    let content = read(&env);
    assert!(content.contains("export SERVICE_PORT=8080\n"));
    assert!(content.contains("export SERVER_ID=\n"));
    assert!(content.starts_with("#!/bin/sh\n"));
    assert_eq!(content.lines().count(), WAS_ENV.lines().count());
}

#[test]
fn repeated_rewrite_is_byte_identical() {
    let home = TestHome::new();
    let env = home.home.join("env.sh");
    write(&env, WAS_ENV);

    set_variable(&env, "SERVICE_PORT", "8080").unwrap();
    let once = std::fs::read(&env).unwrap();
    set_variable(&env, "SERVICE_PORT", "8080").unwrap();
    let twice = std::fs::read(&env).unwrap();

    assert_eq!(once, twice);
}

#[test]
fn prefix_names_do_not_match() {
    let home = TestHome::new();
    let env = home.home.join("env.sh");
    write(&env, "export SERVER_ID_OLD=a\nexport SERVER_ID=b\n");

    set_variable(&env, "SERVER_ID", "c").unwrap();

    assert_eq!(read(&env), "export SERVER_ID_OLD=a\nexport SERVER_ID=c\n");
}

#[test]
fn indentation_and_crlf_are_preserved() {
    let home = TestHome::new();
    let env = home.home.join("env.sh");
    write(&env, "if true; then\r\n    export LOG_HOME=/var/log\r\nfi\r\n");

    set_variable(&env, "LOG_HOME", "/data/logs/${SERVER_ID}").unwrap();

    assert_eq!(
        read(&env),
        "if true; then\r\n    export LOG_HOME=/data/logs/${SERVER_ID}\r\nfi\r\n"
    );
    assert_eq!(get_variable(&env, "LOG_HOME").unwrap(), "/data/logs/${SERVER_ID}");
}

#[test]
fn batch_files_use_set_keyword() {
    let home = TestHome::new();
    let env = home.home.join("env.bat");
    write(&env, "@echo off\nset SERVER_ID=\nset SERVICE_PORT=80\n");

    set_variable(&env, "SERVER_ID", "web-80").unwrap();

    assert_eq!(read(&env), "@echo off\nset SERVER_ID=web-80\nset SERVICE_PORT=80\n");
}

#[test]
fn undeclared_variable_fails_without_writing() {
    let home = TestHome::new();
    let env = home.home.join("env.sh");
    write(&env, WAS_ENV);

    let err = set_variable(&env, "NOT_THERE", "x").unwrap_err();

    assert!(matches!(err, InstallerError::VariableNotFound { ref name, .. } if name == "NOT_THERE"));
    assert_eq!(err.kind(), ErrorKind::ConfigFormat);
    assert_eq!(read(&env), WAS_ENV);
    assert!(!try_set_variable(&env, "NOT_THERE", "x"));
}

#[test]
fn missing_file_is_an_io_error() {
    let home = TestHome::new();
    let err = set_variable(&home.home.join("absent.sh"), "X", "y").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn properties_are_rewritten_in_place() {
    let home = TestHome::new();
    let conf = home.home.join("session.conf");
    write(&conf, SESSION_CONF);

    set_property(&conf, "primary.port", "5180").unwrap();
    set_property(&conf, "secondary.host", "10.0.0.2").unwrap();

    assert_eq!(get_property(&conf, "primary.port").unwrap(), "5180");
    assert_eq!(get_property(&conf, "secondary.host").unwrap(), "10.0.0.2");
    let content = read(&conf);
    assert!(content.starts_with("# replication peers\n"));
    assert!(content.contains("server.name=\n"));
}

#[test]
fn commented_property_is_not_a_declaration() {
    let home = TestHome::new();
    let conf = home.home.join("session.conf");
    write(&conf, "#server.name=old\n");

    let err = set_property(&conf, "server.name", "s1").unwrap_err();
    assert!(matches!(err, InstallerError::VariableNotFound { .. }));
}
