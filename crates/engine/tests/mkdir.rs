//! Integration tests for mkdir and ls

mod common;

use thicket::fs::DriveError;

#[tokio::test]
async fn test_mkdir_then_ls() {
    let (mut drive, _, _, _) = common::setup_drive().await;

    drive.mkdir("root/test_dir").await.unwrap();

    let items = drive.ls("root").await.unwrap();
    assert_eq!(common::names(&items), vec!["test_dir"]);

    // The new directory has no children.
    let children = drive.ls("root/test_dir").await.unwrap();
    assert!(children.is_empty());
}

#[tokio::test]
async fn test_mkdir_nested_creates_intermediates() {
    let (mut drive, _, _, _) = common::setup_drive().await;

    drive.mkdir("root/a/b/c").await.unwrap();

    assert_eq!(common::names(&drive.ls("root").await.unwrap()), vec!["a"]);
    assert_eq!(common::names(&drive.ls("root/a").await.unwrap()), vec!["b"]);
    assert_eq!(
        common::names(&drive.ls("root/a/b").await.unwrap()),
        vec!["c"]
    );
}

#[tokio::test]
async fn test_mkdir_existing_directory_is_noop() {
    let (mut drive, _, _, _) = common::setup_drive().await;

    let first = drive.mkdir("root/dir").await.unwrap();
    let second = drive.mkdir("root/dir").await.unwrap();

    assert_eq!(first.root_cid, second.root_cid);
    assert_eq!(first.private_ref, second.private_ref);
}

#[tokio::test]
async fn test_mkdir_over_file_fails() {
    let (mut drive, _, _, _) = common::setup_drive().await;

    drive.write_file("root/test.txt", b"data").await.unwrap();
    let err = drive.mkdir("root/test.txt").await.unwrap_err();
    assert!(matches!(err, DriveError::Structural(_)));
}

#[tokio::test]
async fn test_mkdir_under_file_fails() {
    let (mut drive, _, _, _) = common::setup_drive().await;

    drive.write_file("root/test.txt", b"data").await.unwrap();
    let err = drive.mkdir("root/test.txt/child").await.unwrap_err();
    assert!(matches!(err, DriveError::Structural(_)));
}

#[tokio::test]
async fn test_ls_missing_path_is_not_found() {
    let (drive, _, _, _) = common::setup_drive().await;

    let err = drive.ls("root/absent").await.unwrap_err();
    assert!(matches!(err, DriveError::NotFound(_)));
}

#[tokio::test]
async fn test_ls_file_is_not_found() {
    let (mut drive, _, _, _) = common::setup_drive().await;

    drive.write_file("root/test.txt", b"data").await.unwrap();
    let err = drive.ls("root/test.txt").await.unwrap_err();
    assert!(matches!(err, DriveError::NotFound(_)));
}

#[tokio::test]
async fn test_ls_orders_names() {
    let (mut drive, _, _, _) = common::setup_drive().await;

    drive.write_file("root/test.txt", b"x").await.unwrap();
    drive.mkdir("root/test1").await.unwrap();

    let items = drive.ls("root").await.unwrap();
    assert_eq!(common::names(&items), vec!["test.txt", "test1"]);
}

#[tokio::test]
async fn test_ls_json_transport_shape() {
    let (mut drive, _, _, _) = common::setup_drive().await;

    drive.write_file("root/test.txt", b"x").await.unwrap();
    let json = drive.ls_json("root").await.unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    let records = parsed.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["name"], "test.txt");
    assert!(records[0]["creation"].is_string());
    assert!(records[0]["modification"].is_string());
}

#[tokio::test]
async fn test_mkdir_multiple_siblings() {
    let (mut drive, _, _, _) = common::setup_drive().await;

    drive.mkdir("root/dir1").await.unwrap();
    drive.mkdir("root/dir2").await.unwrap();
    drive.mkdir("root/dir3").await.unwrap();

    let items = drive.ls("root").await.unwrap();
    assert_eq!(common::names(&items), vec!["dir1", "dir2", "dir3"]);
}
