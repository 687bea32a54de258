//! Read-only views over stored summaries for the `list`, `search` and `show`
//! commands.

use crate::property::{Property, PropertySummary};
use crate::storage::{Storage, StorageError};
use chrono::{DateTime, Utc};
use std::fmt;

/// A summary joined with the property it belongs to.
#[derive(Debug, Clone)]
pub struct SummaryEntry {
    pub property: Property,
    pub summary: PropertySummary,
}

impl fmt::Display for SummaryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Summary for Property {}", self.property.title)
    }
}

/// Date cut-offs for listing summaries. Unset bounds match everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryFilter {
    pub created_since: Option<DateTime<Utc>>,
    pub updated_since: Option<DateTime<Utc>>,
}

impl SummaryFilter {
    fn matches(&self, summary: &PropertySummary) -> bool {
        self.created_since.map_or(true, |cutoff| summary.created_at >= cutoff)
            && self.updated_since.map_or(true, |cutoff| summary.updated_at >= cutoff)
    }
}

/// All summaries passing `filter`, most recently updated first.
pub fn list_entries(
    storage: &Storage,
    filter: &SummaryFilter,
) -> Result<Vec<SummaryEntry>, StorageError> {
    let mut entries = Vec::new();
    for summary in storage.list_summaries()? {
        if !filter.matches(&summary) {
            continue;
        }
        // orphaned summaries are skipped
        if let Some(property) = storage.get_property(summary.property_id)? {
            entries.push(SummaryEntry { property, summary });
        }
    }
    Ok(entries)
}

/// Case-insensitive substring match on property title and summary text.
pub fn search_entries(storage: &Storage, query: &str) -> Result<Vec<SummaryEntry>, StorageError> {
    let query_lower = query.to_lowercase();
    let results = list_entries(storage, &SummaryFilter::default())?
        .into_iter()
        .filter(|entry| {
            entry.property.title.to_lowercase().contains(&query_lower)
                || entry.summary.summary.to_lowercase().contains(&query_lower)
        })
        .collect();
    Ok(results)
}
