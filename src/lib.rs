//! # Propsum
//!
//! Batch rewriting and summarisation of property listings with a locally
//! hosted Ollama model.
//!
//! ## Features
//!
//! - **Resilient calls**: bounded, fixed-delay retries around every inference request
//! - **Streaming replies**: incremental NDJSON decoding that survives corrupt fragments
//! - **Per-record isolation**: one failing property never stops the batch
//! - **Embedded storage**: sled-backed properties and one summary per property

pub mod admin;
pub mod agent;
pub mod config;
pub mod extract;
pub mod property;
pub mod retry;
pub mod rewriter;
pub mod storage;
pub mod stream;

pub use agent::{GenerateError, Generator, OllamaClient};
pub use config::Config;
pub use property::{Amenity, Location, Property, PropertyId, PropertySummary};
pub use rewriter::{BatchReport, RecordOutcome, Rewriter, Stage};
pub use storage::{PropertyStore, Storage, StorageError};
