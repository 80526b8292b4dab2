mod common;

use std::collections::HashMap;
use std::sync::Arc;

use common::MemoryServer;
use rax_ftp_client::{
    AppContext, FtpClientError, FtpConfig, FtpConnection, FtpOption, ModeSelection, Settings,
};

#[tokio::test]
async fn test_connect_is_idempotent() {
    let server = MemoryServer::new();
    let mut conn = server.connection();

    assert!(conn.connect().await.unwrap());
    assert!(conn.connect().await.unwrap());
    assert!(conn.is_connected());

    let state = server.state();
    assert_eq!(state.dials, 1);
    assert_eq!(state.logins, 1);
}

#[tokio::test]
async fn test_connect_without_host_never_dials() {
    let server = MemoryServer::new();
    let mut conn = FtpConnection::new(FtpConfig::new().user("alice"), server.connector());

    let err = conn.connect().await.unwrap_err();
    assert!(matches!(err, FtpClientError::Configuration(_)));
    assert_eq!(server.state().dials, 0);

    let mut empty = FtpConnection::new(FtpConfig::new(), server.connector());
    let err = empty.connect().await.unwrap_err();
    assert!(err.to_string().contains("config not set"));
}

#[tokio::test]
async fn test_rejected_login_is_authentication_error() {
    let server = MemoryServer::new();
    server.state().reject_login = true;
    let mut conn = server.connection();

    let err = conn.connect().await.unwrap_err();
    assert!(matches!(err, FtpClientError::Authentication(_)));
    assert!(!conn.is_connected());
    assert_eq!(server.calls().last().map(String::as_str), Some("QUIT"));
}

#[tokio::test]
async fn test_refused_dial_is_connection_error() {
    let server = MemoryServer::new();
    server.state().refuse_dial = true;
    let mut conn = server.connection();

    let err = conn.connect().await.unwrap_err();
    assert!(matches!(err, FtpClientError::Connection(_)));
    assert!(err.to_string().contains("unable to connect"));
}

#[tokio::test]
async fn test_passive_mode_applied_on_connect() {
    let server = MemoryServer::new();
    let mut conn = server.connection();
    conn.configure(FtpOption::Passive(false));
    conn.connect().await.unwrap();

    assert!(server.calls().contains(&"PASSIVE false".to_string()));
}

#[tokio::test]
async fn test_close() {
    let server = MemoryServer::new();
    let mut conn = server.connection();

    assert!(!conn.close().await);
    conn.connect().await.unwrap();
    assert!(conn.close().await);
    assert!(!conn.is_connected());
    assert!(!conn.close().await);

    // The next operation dials again.
    conn.current_dir().await.unwrap();
    assert_eq!(server.state().dials, 2);
}

#[tokio::test]
async fn test_configure_all_rejects_unknown_keys() {
    let server = MemoryServer::new();
    let mut conn = FtpConnection::new(FtpConfig::new(), server.connector());

    let mut values = HashMap::new();
    values.insert("host", "memory.test");
    values.insert("hots", "typo");
    assert!(conn.configure_all(&values).is_err());
    assert!(conn.config().is_empty());

    values.remove("hots");
    values.insert("port", "2121");
    conn.configure_all(&values).unwrap();
    assert_eq!(conn.config().port, Some(2121));
    conn.connect().await.unwrap();
}

#[tokio::test]
async fn test_single_operations() {
    let server = MemoryServer::new();
    server.add_dir("/pub");
    server.add_file("/pub/readme.txt", b"hello world");
    let mut conn = server.connection();

    assert_eq!(conn.file_size("/pub/readme.txt").await.unwrap(), Some(11));
    assert_eq!(
        conn.file_size_formatted("/pub/readme.txt").await.unwrap(),
        Some("11 bytes".to_string())
    );
    assert!(conn.file_exists("/pub/readme.txt").await.unwrap());
    assert!(!conn.file_exists("/pub/missing.txt").await.unwrap());
    assert!(conn.filemtime("/pub/readme.txt").await.unwrap().is_some());
    assert_eq!(conn.systype().await.unwrap(), "UNIX Type: L8");

    assert!(conn.dir_exists("/pub").await.unwrap());
    assert!(!conn.dir_exists("/nowhere").await.unwrap());
    assert_eq!(conn.current_dir().await.unwrap(), "/");

    conn.move_file("/pub/readme.txt", "/pub/README.txt").await.unwrap();
    assert_eq!(
        conn.list_files("/pub", false).await.unwrap(),
        vec!["README.txt".to_string()]
    );

    let err = conn.delete_file("/pub/readme.txt").await.unwrap_err();
    match err {
        FtpClientError::Operation { operation, path, .. } => {
            assert_eq!(operation, "delete");
            assert_eq!(path, "/pub/readme.txt");
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = conn.change_dir("").await.unwrap_err();
    assert!(matches!(err, FtpClientError::Operation { .. }));
}

#[tokio::test]
async fn test_upload_and_download() {
    let server = MemoryServer::new();
    let local = tempfile::tempdir().unwrap();
    let source = local.path().join("photo.JPG");
    tokio::fs::write(&source, [0u8, 1, 2, 3]).await.unwrap();

    let mut conn = server.connection();
    let sent = conn
        .upload(&source, "/photo.JPG", ModeSelection::Auto, Some(0o644))
        .await
        .unwrap();
    assert_eq!(sent, 4);

    let calls = server.calls();
    assert!(calls.contains(&"ALLO 4".to_string()));
    assert!(calls.contains(&"STOR /photo.JPG I".to_string()));
    assert!(calls.contains(&"SITE CHMOD 644 /photo.JPG".to_string()));

    let target = local.path().join("copy.jpg");
    conn.download("/photo.JPG", &target, ModeSelection::Auto)
        .await
        .unwrap();
    assert_eq!(tokio::fs::read(&target).await.unwrap(), vec![0u8, 1, 2, 3]);
}

#[tokio::test]
async fn test_upload_missing_source() {
    let server = MemoryServer::new();
    let mut conn = server.connection();

    let err = conn
        .upload("/definitely/not/here.txt", "/here.txt", ModeSelection::Auto, None)
        .await
        .unwrap_err();
    assert!(matches!(err, FtpClientError::SourceNotFound(_)));
    assert!(!server.calls().iter().any(|c| c.starts_with("STOR")));
}

#[tokio::test]
async fn test_registry_caches_per_name() {
    let server = MemoryServer::new();
    let mut groups = HashMap::new();
    groups.insert("default".to_string(), FtpConfig::new().host("memory.test"));
    let context = AppContext::new(Settings::from_groups(groups), server.connector());

    let first = context.connection("default").await;
    let second = context.registry().instance("default").await;
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(context.registry().len().await, 1);

    let fresh = context.registry().factory("default");
    assert_eq!(fresh.name(), "default");
    assert_eq!(context.registry().len().await, 1);

    first.lock().await.connect().await.unwrap();
    assert!(second.lock().await.is_connected());

    let unknown = context.connection("backup").await;
    let err = unknown.lock().await.connect().await.unwrap_err();
    assert!(matches!(err, FtpClientError::Configuration(_)));

    assert_eq!(context.registry().close_all().await, 1);
    assert!(context.registry().is_empty().await);
    assert!(!first.lock().await.is_connected());
}
