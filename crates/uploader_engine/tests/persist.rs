use std::fs;

use tempfile::TempDir;
use uploader_engine::{remove_if_exists, write_atomic};

#[test]
fn creates_missing_parent_dir() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("state").join("drafts.ron");
    write_atomic(&target, "[]").unwrap();
    assert_eq!(fs::read_to_string(&target).unwrap(), "[]");
}

#[test]
fn replaces_existing_content() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("drafts.ron");
    write_atomic(&target, "first").unwrap();
    write_atomic(&target, "second").unwrap();
    assert_eq!(fs::read_to_string(&target).unwrap(), "second");
    let leftovers = fs::read_dir(temp.path()).unwrap().count();
    assert_eq!(leftovers, 1);
}

#[test]
fn parent_that_is_a_file_is_an_error() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("not_a_dir");
    fs::write(&blocker, "x").unwrap();

    assert!(write_atomic(&blocker.join("drafts.ron"), "data").is_err());
    assert_eq!(fs::read_to_string(&blocker).unwrap(), "x");
}

#[test]
fn removing_missing_file_is_ok() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("drafts.ron");
    remove_if_exists(&target).unwrap();
    fs::write(&target, "x").unwrap();
    remove_if_exists(&target).unwrap();
    assert!(!target.exists());
}
