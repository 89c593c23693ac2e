//! Test helpers: build an upload pipeline over in-memory storage.
//!
//! Run from workspace root: `cargo test -p lightbox-processing`.

#![allow(dead_code)]

pub mod decoder;
pub mod fixtures;
pub mod storage;

use std::sync::Arc;

use lightbox_core::UploadSettings;
use lightbox_db::FileMappingLedger;
use lightbox_processing::{GalleryLister, RawDecoder, UploadPipeline};
use tempfile::TempDir;

use decoder::StubRawDecoder;
use storage::MemoryStorage;

/// Pipeline, lister and the doubles behind them.
pub struct TestApp {
    pub pipeline: UploadPipeline,
    pub lister: GalleryLister,
    pub storage: Arc<MemoryStorage>,
    pub ledger: Arc<FileMappingLedger>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn ledger_path(&self) -> std::path::PathBuf {
        self.ledger.path().to_path_buf()
    }
}

/// Pipeline with default settings and a RAW decoder that always succeeds.
pub fn setup_test_app() -> TestApp {
    setup_with(
        MemoryStorage::new(),
        Arc::new(StubRawDecoder::succeeding(640, 480)),
        UploadSettings::default(),
    )
}

pub fn setup_with(
    storage: MemoryStorage,
    decoder: Arc<dyn RawDecoder>,
    settings: UploadSettings,
) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let ledger = Arc::new(FileMappingLedger::new(
        temp_dir.path().join("file_mappings.json"),
    ));
    let storage = Arc::new(storage);

    let pipeline = UploadPipeline::new(storage.clone(), ledger.clone(), decoder, settings);
    let lister = GalleryLister::new(storage.clone(), ledger.clone());

    TestApp {
        pipeline,
        lister,
        storage,
        ledger,
        _temp_dir: temp_dir,
    }
}
