use hsfd_fs::{Error, FileSinkOpener, MountOptions, OutputSink, SinkOpener, StorageRoot};
use tempfile::tempdir;

#[tokio::test]
async fn test_mount_resolve_and_write() {
    let dir = tempdir().unwrap();
    let base = dir.path().join("spiffs");

    let root = StorageRoot::mount(&base, MountOptions::new().format_if_mount_failed(true)).unwrap();
    let path = root.resolve("download_file.bin").unwrap();

    let mut sink = FileSinkOpener::new(64).create(&path).await.unwrap();
    let payload = vec![0xA5u8; 1000];
    for chunk in payload.chunks(300) {
        assert_eq!(sink.write(chunk).await.unwrap(), chunk.len());
    }
    assert_eq!(sink.bytes_written(), 1000);
    sink.close().await.unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), payload);
    assert_eq!(root.info().root_bytes, 1000);
}

#[test]
fn test_missing_root_without_format_is_not_mounted() {
    let dir = tempdir().unwrap();
    let base = dir.path().join("absent");

    let err = StorageRoot::mount(&base, MountOptions::new().format_if_mount_failed(false)).unwrap_err();
    assert!(matches!(err, Error::NotMounted { .. }));
    assert!(!base.exists());
}

#[tokio::test]
async fn test_reopen_truncates_previous_download() {
    let dir = tempdir().unwrap();
    let root = StorageRoot::mount(dir.path(), MountOptions::new()).unwrap();
    let path = root.resolve("download_file.bin").unwrap();
    let opener = FileSinkOpener::default();

    let mut first = opener.create(&path).await.unwrap();
    first.write(&[1u8; 4096]).await.unwrap();
    first.close().await.unwrap();

    let mut second = opener.create(&path).await.unwrap();
    second.write(b"short").await.unwrap();
    second.close().await.unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), b"short");
}
