//! Integration tests for the chunked streaming path

mod common;

use std::io::Cursor;

fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Sizes spanning one chunk, many chunks, and exact chunk boundaries for
/// the 64-byte test chunk size.
const SIZES: &[usize] = &[0, 1, 63, 64, 65, 128, 1000];

#[tokio::test]
async fn test_stream_write_then_read_matches() {
    let (mut drive, _, _, _) = common::setup_small_chunk_drive().await;

    for &size in SIZES {
        let data = patterned(size);
        drive
            .write_file_from("root/streamed.bin", &mut Cursor::new(&data))
            .await
            .unwrap();

        let whole = drive.read_file("root/streamed.bin").await.unwrap();
        assert_eq!(whole.len(), size);
        assert_eq!(whole, data);

        let mut streamed = Vec::new();
        let written = drive
            .read_file_to("root/streamed.bin", &mut streamed)
            .await
            .unwrap();
        assert_eq!(written, size as u64);
        assert_eq!(streamed, data);
    }
}

#[tokio::test]
async fn test_buffered_write_then_stream_read_matches() {
    let (mut drive, _, _, _) = common::setup_small_chunk_drive().await;

    // Large enough to force the chunked representation on the whole-buffer
    // path too.
    let data = patterned(700);
    drive.write_file("root/big.bin", &data).await.unwrap();

    let mut streamed = Vec::new();
    let written = drive.read_file_to("root/big.bin", &mut streamed).await.unwrap();
    assert_eq!(written, 700);
    assert_eq!(streamed, data);
}

#[tokio::test]
async fn test_stream_and_buffer_writes_read_identically() {
    let (mut drive, _, _, _) = common::setup_small_chunk_drive().await;

    let data = patterned(500);
    drive
        .write_file_from("root/streamed.bin", &mut Cursor::new(&data))
        .await
        .unwrap();
    drive.write_file("root/buffered.bin", &data).await.unwrap();

    assert_eq!(
        drive.read_file("root/streamed.bin").await.unwrap(),
        drive.read_file("root/buffered.bin").await.unwrap(),
    );
}

#[tokio::test]
async fn test_local_file_roundtrip() {
    let (mut drive, _, _, _) = common::setup_small_chunk_drive().await;
    let temp = tempfile::TempDir::new().unwrap();

    let source = temp.path().join("source.bin");
    let data = patterned(300);
    std::fs::write(&source, &data).unwrap();

    drive
        .write_file_from_path("root/imported.bin", &source)
        .await
        .unwrap();

    let dest = temp.path().join("dest.bin");
    let written = drive
        .read_file_to_path("root/imported.bin", &dest)
        .await
        .unwrap();
    assert_eq!(written, 300);
    assert_eq!(std::fs::read(&dest).unwrap(), data);
}

#[tokio::test]
async fn test_streamed_file_survives_reload() {
    let (mut drive, _, master, store) = common::setup_small_chunk_drive().await;

    let data = patterned(640);
    let snapshot = drive
        .write_file_from("root/streamed.bin", &mut Cursor::new(&data))
        .await
        .unwrap();

    let reloaded = thicket::fs::Drive::load_with_key(
        std::sync::Arc::new(store.clone()),
        &master,
        &snapshot.root_cid,
        common::small_chunk_config(),
    )
    .await
    .unwrap();
    assert_eq!(reloaded.read_file("root/streamed.bin").await.unwrap(), data);
}
