//! Itemflow Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging setup, and error handling for the itemflow workspace.
//!
//! # Overview
//!
//! - **Types**: the `Item` entity and its pre-persistence form `NewItem`
//! - **Error Handling**: `ItemflowError` and the `Result` alias
//! - **Logging**: `LogConfig` and `init_logging` for every binary
//!
//! # Example
//!
//! ```no_run
//! use itemflow_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> itemflow_common::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{ItemflowError, Result};
pub use types::{Item, NewItem};
