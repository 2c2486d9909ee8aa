//! Shared helpers for itemflow-ingest integration tests

#![allow(dead_code)]

use std::io::Write;
use std::sync::Arc;

use itemflow_ingest::{
    CsvRecordReader, ImportPipeline, InMemoryItemRepository, ItemLoader, ItemValidator,
};
use tempfile::NamedTempFile;

/// Write `contents` to a temporary `.csv` file
pub fn csv_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("create temp csv");
    file.write_all(contents.as_bytes()).expect("write temp csv");
    file.flush().expect("flush temp csv");
    file
}

/// Pipeline with default CSV settings over `repository`
pub fn pipeline(repository: Arc<InMemoryItemRepository>) -> ImportPipeline {
    ImportPipeline::new(
        CsvRecordReader::new(),
        ItemValidator::new(),
        ItemLoader::new(repository),
    )
}

pub fn path_str(file: &NamedTempFile) -> String {
    file.path().display().to_string()
}
