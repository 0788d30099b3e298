//! Integration tests for tree copy, wildcard deletion and permissions

mod support;

use srvctl_core::error::{ErrorKind, InstallerError};
use srvctl_core::fs::{
    PermissionPolicy, apply_permissions, copy_tree, delete_by_wildcard, is_subdirectory,
    remove_tree,
};

use support::{TestHome, read, write};

#[test]
fn copy_tree_copies_nested_files() {
    let home = TestHome::new();
    let src = home.home.join("src");
    write(&src.join("env.sh"), "export A=1\n");
    write(&src.join("conf/a/b.xml"), "<b/>");
    std::fs::create_dir_all(src.join("logs")).unwrap();
    let dst = home.home.join("out/dst");

    copy_tree(&src, &dst).unwrap();

    assert_eq!(read(&dst.join("env.sh")), "export A=1\n");
    assert_eq!(read(&dst.join("conf/a/b.xml")), "<b/>");
    assert!(dst.join("logs").is_dir());
    assert_eq!(read(&src.join("env.sh")), "export A=1\n", "source untouched");
}

#[test]
fn copy_into_itself_is_rejected() {
    let home = TestHome::new();
    let src = home.home.join("src");
    write(&src.join("env.sh"), "");

    let err = copy_tree(&src, &src.join("nested")).unwrap_err();
    assert!(matches!(err, InstallerError::Copy { .. }));
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(!src.join("nested").exists());

    let same = copy_tree(&src, &home.home.join("src/../src")).unwrap_err();
    assert!(matches!(same, InstallerError::Copy { .. }));
}

#[test]
fn copy_from_missing_source_fails() {
    let home = TestHome::new();
    let err = copy_tree(&home.home.join("nope"), &home.home.join("dst")).unwrap_err();
    assert!(matches!(err, InstallerError::Copy { .. }));
    assert!(!home.home.join("dst").exists());
}

#[cfg(unix)]
#[test]
fn copy_recreates_symlinks() {
    let home = TestHome::new();
    let src = home.home.join("src");
    write(&src.join("real.txt"), "x");
    std::os::unix::fs::symlink("real.txt", src.join("link.txt")).unwrap();
    let dst = home.home.join("dst");

    copy_tree(&src, &dst).unwrap();

    let link = std::fs::symlink_metadata(dst.join("link.txt")).unwrap();
    assert!(link.file_type().is_symlink());
    assert_eq!(
        std::fs::read_link(dst.join("link.txt")).unwrap(),
        std::path::PathBuf::from("real.txt")
    );
}

#[cfg(unix)]
#[test]
fn permission_policies_are_applied() {
    let home = TestHome::new();
    let src = home.home.join("src");
    write(&src.join("bin/start.sh"), "#!/bin/sh\n");
    write(&src.join("conf/server.xml"), "<Server/>");
    let dst = home.home.join("dst");

    copy_tree(&src, &dst).unwrap();
    assert_eq!(support::mode(&dst.join("bin/start.sh")), 0o755);
    assert_eq!(support::mode(&dst.join("bin")), 0o755);

    apply_permissions(&dst.join("conf"), PermissionPolicy::SECURE).unwrap();
    assert_eq!(support::mode(&dst.join("conf")), 0o700);
    assert_eq!(support::mode(&dst.join("conf/server.xml")), 0o600);
    assert_eq!(support::mode(&dst.join("bin/start.sh")), 0o755);
}

#[test]
fn permissions_on_missing_root_is_a_no_op() {
    let home = TestHome::new();
    apply_permissions(&home.home.join("absent"), PermissionPolicy::SECURE).unwrap();
}

#[test]
fn wildcard_deletes_matching_files_only() {
    let home = TestHome::new();
    let dir = home.home.join("inst");
    write(&dir.join("server.pid"), "123");
    write(&dir.join("logs/httpd.pid"), "456");
    write(&dir.join("pid.txt"), "keep");
    write(&dir.join("env.sh"), "keep");

    let removed = delete_by_wildcard(&dir, "*.pid").unwrap();

    assert_eq!(removed, 2);
    assert!(!dir.join("server.pid").exists());
    assert!(!dir.join("logs/httpd.pid").exists());
    assert!(dir.join("pid.txt").exists());
    assert!(dir.join("env.sh").exists());
}

#[test]
fn subdirectory_check_resolves_paths() {
    let home = TestHome::new();
    let base = home.home.join("web-80");
    std::fs::create_dir_all(base.join("htdocs")).unwrap();

    assert!(is_subdirectory(&base, &base.join("htdocs")));
    assert!(is_subdirectory(&base, &base.join("htdocs/../htdocs")));
    assert!(!is_subdirectory(&base, &home.home.join("shared/docs")));
    assert!(!is_subdirectory(&base, &base.join("../web-800")));
    assert!(!is_subdirectory(&base, std::path::Path::new("")));
}

#[test]
fn remove_tree_deletes_everything() {
    let home = TestHome::new();
    let dir = home.home.join("inst");
    write(&dir.join("a/b/c.txt"), "x");

    remove_tree(&dir).unwrap();
    assert!(!dir.exists());
}
