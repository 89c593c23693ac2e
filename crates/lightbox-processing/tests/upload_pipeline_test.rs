//! Upload pipeline integration tests.
//!
//! Run with: `cargo test -p lightbox-processing --test upload_pipeline_test`

mod helpers;

use std::sync::Arc;

use helpers::decoder::StubRawDecoder;
use helpers::fixtures::{create_garbage, create_oriented_jpeg, create_test_jpeg, create_test_png};
use helpers::storage::MemoryStorage;
use helpers::{setup_test_app, setup_with};
use lightbox_core::{
    AppError, ErrorMetadata, FileKind, Folder, UploadOutcome, UploadReceipt, UploadRequest,
    UploadSettings,
};

#[tokio::test]
async fn test_upload_regular_jpeg() {
    let app = setup_test_app();
    let data = create_test_jpeg(1200, 800);

    let receipt = app
        .pipeline
        .upload(UploadRequest::new("photo.jpg", data.clone()).with_content_type("image/jpeg"))
        .await
        .unwrap();

    let UploadReceipt::Regular {
        filename,
        key,
        image_url,
        thumbnail_url,
        ..
    } = receipt
    else {
        panic!("expected a regular receipt");
    };

    assert_eq!(filename, "photo.jpg");
    assert!(key.starts_with("uploads/") && key.ends_with(".jpg"));
    assert_eq!(image_url, format!("{}/{}", helpers::storage::BASE_URL, key));

    assert_eq!(app.storage.keys_in(Folder::Uploads), vec![key.clone()]);
    let thumbnails = app.storage.keys_in(Folder::Thumbnails);
    assert_eq!(thumbnails.len(), 1);
    assert!(thumbnail_url.ends_with(&thumbnails[0]));
    assert!(app.storage.keys_in(Folder::Raw).is_empty());
    assert!(app.storage.keys_in(Folder::Processed).is_empty());

    // The original is stored byte for byte.
    let original = app.storage.object(&key).unwrap();
    assert_eq!(original.data.as_ref(), data.as_slice());
    assert_eq!(original.content_type, "image/jpeg");

    // Original and thumbnail share the key prefix.
    let stem = key.trim_start_matches("uploads/").trim_end_matches(".jpg");
    assert_eq!(thumbnails[0], format!("thumbnails/{}.jpg", stem));

    let thumbnail = app.storage.object(&thumbnails[0]).unwrap();
    let decoded = image::load_from_memory(&thumbnail.data).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (400, 267));
}

#[tokio::test]
async fn test_regular_thumbnail_follows_exif_orientation() {
    let app = setup_test_app();
    let data = create_oriented_jpeg(800, 400, 6);

    let receipt = app
        .pipeline
        .upload(UploadRequest::new("portrait.jpg", data.clone()))
        .await
        .unwrap();

    // The original keeps its bytes and tag; the thumbnail is upright.
    assert_eq!(app.storage.object(receipt.key()).unwrap().data.as_ref(), data.as_slice());
    let thumbnails = app.storage.keys_in(Folder::Thumbnails);
    let thumbnail = app.storage.object(&thumbnails[0]).unwrap();
    let decoded = image::load_from_memory(&thumbnail.data).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (200, 400));
}

#[tokio::test]
async fn test_upload_regular_png_keeps_extension() {
    let app = setup_test_app();

    let receipt = app
        .pipeline
        .upload(UploadRequest::new("Screenshot.PNG", create_test_png(50, 40)))
        .await
        .unwrap();

    assert!(receipt.key().ends_with(".png"));
    assert_eq!(app.storage.object(receipt.key()).unwrap().content_type, "image/png");
    assert!(receipt.thumbnail_url().ends_with(".jpg"));
}

#[tokio::test]
async fn test_upload_raw_cr2() {
    let app = setup_test_app();

    let receipt = app
        .pipeline
        .upload(UploadRequest::new("IMG_001.CR2", create_garbage(4096)))
        .await
        .unwrap();

    let UploadReceipt::Raw {
        filename,
        key,
        raw_url,
        processed_url,
        thumbnail_url,
        metadata,
        ..
    } = receipt
    else {
        panic!("expected a RAW receipt");
    };

    assert_eq!(filename, "IMG_001.CR2");
    assert!(key.starts_with("raw/") && key.ends_with(".cr2"));
    assert!(raw_url.ends_with(&key));
    assert_eq!((metadata.width, metadata.height, metadata.colors), (640, 480, 3));

    assert_eq!(app.storage.keys_in(Folder::Raw).len(), 1);
    assert_eq!(app.storage.keys_in(Folder::Processed).len(), 1);
    assert_eq!(app.storage.keys_in(Folder::Thumbnails).len(), 1);
    assert!(app.storage.keys_in(Folder::Uploads).is_empty());
    assert!(processed_url.ends_with(&app.storage.keys_in(Folder::Processed)[0]));
    assert!(thumbnail_url.ends_with(&app.storage.keys_in(Folder::Thumbnails)[0]));

    let processed = app
        .storage
        .object(&app.storage.keys_in(Folder::Processed)[0])
        .unwrap();
    assert_eq!(processed.content_type, "image/jpeg");
    let processed = image::load_from_memory(&processed.data).unwrap();
    assert_eq!((processed.width(), processed.height()), (640, 480));

    let entry = app.ledger.lookup(&key).await.unwrap();
    assert_eq!(entry.original_filename, "IMG_001.CR2");
    assert_eq!(entry.file_kind, FileKind::Raw);
    assert_eq!(entry.url, raw_url);
    assert_eq!(app.ledger.len().await.unwrap(), 1);
}

#[tokio::test]
async fn test_raw_receipt_json_shape() {
    let app = setup_test_app();

    let outcome = UploadOutcome::from(
        app.pipeline
            .upload(UploadRequest::new("DSC_0001.nef", create_garbage(128)))
            .await,
    );
    let json = serde_json::to_value(&outcome).unwrap();

    assert_eq!(json["status"], "success");
    assert_eq!(json["file_type"], "raw");
    assert_eq!(json["metadata"]["color_desc"], "RGGB");
    assert!(json["processed_url"].as_str().unwrap().contains("/processed/"));
}

#[tokio::test]
async fn test_invalid_file_type_has_no_side_effects() {
    let app = setup_test_app();

    let err = app
        .pipeline
        .upload(UploadRequest::new("notes.txt", b"hello".to_vec()).with_content_type("text/plain"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidFileType(_)));
    assert_eq!(err.http_status_code(), 400);
    assert_eq!(app.storage.len(), 0);
    assert!(app.ledger.is_empty().await.unwrap());
    assert!(!app.ledger_path().exists());
}

#[tokio::test]
async fn test_oversized_raw_is_rejected_before_any_write() {
    let app = setup_test_app();
    // Zeroed allocation; pages are never touched.
    let data = vec![0u8; 600 * 1024 * 1024];

    let outcome = UploadOutcome::from(
        app.pipeline
            .upload(UploadRequest::new("IMG_9999.CR2", data))
            .await,
    );

    match outcome {
        UploadOutcome::Rejected { code, .. } => assert_eq!(code, "FILE_TOO_LARGE"),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(app.storage.len(), 0);
}

#[tokio::test]
async fn test_regular_cap_is_lower_than_raw_cap() {
    let settings = UploadSettings {
        max_image_size_bytes: 1024,
        max_raw_size_bytes: 1024 * 1024,
        ..UploadSettings::default()
    };
    let app = setup_with(
        MemoryStorage::new(),
        Arc::new(StubRawDecoder::succeeding(64, 64)),
        settings,
    );

    let err = app
        .pipeline
        .upload(UploadRequest::new("big.png", create_garbage(2048)).with_content_type("image/png"))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "FILE_TOO_LARGE");
    assert_eq!(err.http_status_code(), 413);

    app.pipeline
        .upload(UploadRequest::new("big.arw", create_garbage(2048)))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_decode_failure_keeps_raw_original() {
    let app = setup_with(
        MemoryStorage::new(),
        Arc::new(StubRawDecoder::failing()),
        UploadSettings::default(),
    );

    let err = app
        .pipeline
        .upload(UploadRequest::new("corrupt.NEF", create_garbage(1024)))
        .await
        .unwrap_err();

    let raw_keys = app.storage.keys_in(Folder::Raw);
    assert_eq!(raw_keys.len(), 1);
    match err {
        AppError::Decode { raw_url, .. } => assert!(raw_url.ends_with(&raw_keys[0])),
        other => panic!("unexpected error: {:?}", other),
    }

    assert!(app.storage.keys_in(Folder::Processed).is_empty());
    assert!(app.storage.keys_in(Folder::Thumbnails).is_empty());
    // No mapping for a partially processed upload.
    assert!(app.ledger.is_empty().await.unwrap());
}

#[cfg(feature = "raw")]
#[tokio::test]
async fn test_corrupt_nef_with_rawloader_decoder() {
    let app = setup_with(
        MemoryStorage::new(),
        Arc::new(lightbox_processing::RawloaderDecoder),
        UploadSettings::default(),
    );

    let outcome = UploadOutcome::from(
        app.pipeline
            .upload(UploadRequest::new("corrupt.nef", create_garbage(64 * 1024)))
            .await,
    );

    match outcome {
        UploadOutcome::Failed { code, .. } => assert_eq!(code, "DECODE_ERROR"),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(app.storage.keys_in(Folder::Raw).len(), 1);
    assert_eq!(app.storage.len(), 1);
}

#[tokio::test]
async fn test_undecodable_regular_image_writes_nothing() {
    let app = setup_test_app();

    let err = app
        .pipeline
        .upload(
            UploadRequest::new("broken.jpg", create_garbage(512)).with_content_type("image/jpeg"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "ENCODE_ERROR");
    assert_eq!(app.storage.len(), 0);
}

#[tokio::test]
async fn test_thumbnail_write_failure_leaves_original_in_place() {
    let app = setup_with(
        MemoryStorage::failing_on(Folder::Thumbnails),
        Arc::new(StubRawDecoder::succeeding(64, 64)),
        UploadSettings::default(),
    );

    let err = app
        .pipeline
        .upload(UploadRequest::new("photo.jpg", create_test_jpeg(32, 32)))
        .await
        .unwrap_err();

    let uploads = app.storage.keys_in(Folder::Uploads);
    assert_eq!(uploads.len(), 1);
    match err {
        AppError::Storage {
            folder, written, ..
        } => {
            assert_eq!(written, uploads);
            assert_eq!(folder, Some(Folder::Thumbnails));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(app.ledger.is_empty().await.unwrap());
}

#[tokio::test]
async fn test_raw_processed_write_failure_reports_raw_key() {
    let app = setup_with(
        MemoryStorage::failing_on(Folder::Processed),
        Arc::new(StubRawDecoder::succeeding(64, 64)),
        UploadSettings::default(),
    );

    let err = app
        .pipeline
        .upload(UploadRequest::new("IMG_002.dng", create_garbage(256)))
        .await
        .unwrap_err();

    match err {
        AppError::Storage { written, .. } => {
            assert_eq!(written, app.storage.keys_in(Folder::Raw));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(app.storage.keys_in(Folder::Thumbnails).is_empty());
}

#[tokio::test]
async fn test_ledger_failure_after_writes() {
    let app = setup_test_app();
    // A directory squatting on the temp file makes the ledger write fail.
    let ledger_path = app.ledger_path();
    std::fs::create_dir_all(ledger_path.with_extension("json.tmp")).unwrap();

    let err = app
        .pipeline
        .upload(UploadRequest::new("photo.jpg", create_test_jpeg(16, 16)))
        .await
        .unwrap_err();

    let uploads = app.storage.keys_in(Folder::Uploads);
    match err {
        AppError::Ledger { key, .. } => assert_eq!(vec![key], uploads),
        other => panic!("unexpected error: {:?}", other),
    }
    // Artifacts stay reachable by key.
    assert_eq!(app.storage.keys_in(Folder::Thumbnails).len(), 1);
}

#[tokio::test]
async fn test_concurrent_uploads_get_distinct_keys() {
    let app = setup_test_app();
    let data = create_test_jpeg(24, 24);

    let mut handles = Vec::new();
    for i in 0..16 {
        let pipeline = app.pipeline.clone();
        let data = data.clone();
        handles.push(tokio::spawn(async move {
            pipeline
                .upload(UploadRequest::new(format!("photo_{}.jpg", i), data))
                .await
        }));
    }

    let mut keys = Vec::new();
    for handle in handles {
        keys.push(handle.await.unwrap().unwrap().key().to_string());
    }
    keys.sort();
    keys.dedup();

    assert_eq!(keys.len(), 16);
    assert_eq!(app.ledger.len().await.unwrap(), 16);
    assert_eq!(app.storage.keys_in(Folder::Uploads).len(), 16);
}
