//! Itemflow Ingest Library
//!
//! Imports items from CSV files into the item store.
//!
//! # Pipeline
//!
//! - **reader**: CSV → `RawRecord`, header columns resolved by name
//! - **transform**: drops blank names, trims, stamps `created_at`
//! - **loader**: submits the batch through the `ItemRepository` port
//! - **pipeline**: runs the three phases under `tracing` spans
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use itemflow_ingest::{
//!     CsvRecordReader, ImportPipeline, InMemoryItemRepository, ItemLoader, ItemValidator,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let repository = Arc::new(InMemoryItemRepository::new());
//!     let pipeline = ImportPipeline::new(
//!         CsvRecordReader::new(),
//!         ItemValidator::new(),
//!         ItemLoader::new(repository),
//!     );
//!
//!     let run = pipeline.run("./data/items.csv").await?;
//!     println!("{}", run.summary());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod reader;
pub mod repository;
pub mod transform;

// Re-export commonly used types
pub use config::IngestConfig;
pub use error::{ImportError, ImportResult, PersistenceError, Phase};
pub use loader::ItemLoader;
pub use pipeline::{ImportPipeline, ImportRun, RunState};
pub use reader::{ColumnMapping, CsvRecordReader, RawRecord};
pub use repository::{CommitPolicy, InMemoryItemRepository, ItemRepository, PgItemRepository};
pub use transform::ItemValidator;
