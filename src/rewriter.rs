//! The batch: rewrite every property listing, then summarise it.
//!
//! Records are processed one at a time. A failure anywhere in a record is
//! contained to that record; writes already made for it are kept.

use crate::agent::{GenerateError, Generator};
use crate::extract::{derive_description, extract_title, truncate_chars};
use crate::property::{Property, PropertyId};
use crate::storage::{PropertyStore, StorageError};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

const TITLE_PROMPT_CHARS: usize = 500;
const DESCRIPTION_PROMPT_CHARS: usize = 1000;

/// Progress of a single record through the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pending,
    Rewriting,
    Rewritten,
    Summarizing,
    Summarized,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Pending => "pending",
            Stage::Rewriting => "rewriting",
            Stage::Rewritten => "rewritten",
            Stage::Summarizing => "summarizing",
            Stage::Summarized => "summarized",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum RecordError {
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Final state of one record.
#[derive(Debug)]
pub enum RecordOutcome {
    Summarized {
        id: PropertyId,
        title: String,
    },
    Failed {
        id: PropertyId,
        /// Last stage entered before the error
        stage: Stage,
        cause: RecordError,
    },
}

impl RecordOutcome {
    pub fn id(&self) -> PropertyId {
        match self {
            RecordOutcome::Summarized { id, .. } | RecordOutcome::Failed { id, .. } => *id,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RecordOutcome::Failed { .. })
    }
}

/// Everything a run did, in processing order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<RecordOutcome>,
}

impl BatchReport {
    pub fn failed_ids(&self) -> Vec<PropertyId> {
        self.outcomes
            .iter()
            .filter(|o| o.is_failed())
            .map(RecordOutcome::id)
            .collect()
    }

    pub fn summarized(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_failed()).count()
    }
}

/// Prompt asking for a new title (on a `Title:` line) and description.
pub fn rewrite_prompt(property: &Property) -> String {
    format!(
        "Rewrite the following property information. Provide a concise and appealing title on the first line, prefixed with 'Title:', followed by a detailed description:\n\nCurrent Title: {}\nCurrent Description: {}",
        truncate_chars(&property.title, TITLE_PROMPT_CHARS),
        truncate_chars(&property.description, DESCRIPTION_PROMPT_CHARS),
    )
}

/// Prompt asking for a summary of the rewritten listing.
pub fn summary_prompt(property: &Property, title: &str, description: &str) -> String {
    format!(
        "Generate a summary for the following property information:\n\n{}\n{}\nLocation: {}\nAmenities: {}",
        title,
        truncate_chars(description, DESCRIPTION_PROMPT_CHARS),
        property.location_list(),
        property.amenity_list(),
    )
}

/// Drives the batch over a store with a text generator.
pub struct Rewriter<'a, G, S> {
    generator: &'a G,
    store: &'a S,
    throttle: Duration,
}

impl<'a, G, S> Rewriter<'a, G, S>
where
    G: Generator + Sync,
    S: PropertyStore + Sync,
{
    pub fn new(generator: &'a G, store: &'a S) -> Self {
        Self {
            generator,
            store,
            throttle: Duration::from_millis(500),
        }
    }

    /// Pause after each fully processed record.
    pub fn throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    /// Process every property. Only failing to enumerate the store aborts
    /// the run; per-record failures end up in the report.
    pub async fn run(&self) -> Result<BatchReport, StorageError> {
        let properties = self.store.properties()?;
        info!(count = properties.len(), "rewriting properties");

        let mut report = BatchReport::default();
        for property in properties {
            let outcome = self.process(property).await;
            if !outcome.is_failed() {
                tokio::time::sleep(self.throttle).await;
            }
            report.outcomes.push(outcome);
        }

        info!(
            summarized = report.summarized(),
            failed = %join_ids(&report.failed_ids()),
            "batch complete"
        );
        Ok(report)
    }

    /// Run one record to a terminal state.
    pub async fn process(&self, property: Property) -> RecordOutcome {
        let id = property.property_id;
        let mut stage = Stage::Pending;

        match self.rewrite_and_summarize(property, &mut stage).await {
            Ok(title) => {
                info!(property_id = id, "summarized \"{}\"", title);
                RecordOutcome::Summarized { id, title }
            }
            Err(cause) => {
                error!("Error processing property ID {} ({}): {}", id, stage, cause);
                RecordOutcome::Failed { id, stage, cause }
            }
        }
    }

    async fn rewrite_and_summarize(
        &self,
        mut property: Property,
        stage: &mut Stage,
    ) -> Result<String, RecordError> {
        *stage = Stage::Rewriting;
        let rewritten = self.generator.generate(&rewrite_prompt(&property)).await?;
        *stage = Stage::Rewritten;

        let title = extract_title(&rewritten);
        let description = derive_description(&rewritten);
        if !title.is_empty() {
            property.title = title.clone();
        }
        if !description.is_empty() {
            property.description = description.clone();
        }
        self.store
            .update_listing(property.property_id, &property.title, &property.description)?;

        *stage = Stage::Summarizing;
        let summary = self
            .generator
            .generate(&summary_prompt(&property, &title, &description))
            .await?;
        self.store
            .upsert_summary(property.property_id, summary.trim())?;
        *stage = Stage::Summarized;

        Ok(property.title)
    }
}

pub fn join_ids(ids: &[PropertyId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
