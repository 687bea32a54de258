//! Property records and the summaries generated for them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type PropertyId = u64;

/// A location a property belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location {
    pub name: String,
}

/// An amenity offered by a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amenity {
    pub name: String,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Display for Amenity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A property listing.
///
/// Only `title` and `description` are ever changed by the rewriter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub property_id: PropertyId,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub amenities: Vec<Amenity>,
}

impl Property {
    pub fn new(
        property_id: PropertyId,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            property_id,
            title: title.into(),
            description: description.into(),
            locations: Vec::new(),
            amenities: Vec::new(),
        }
    }

    pub fn with_locations<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locations = names.into_iter().map(|n| Location { name: n.into() }).collect();
        self
    }

    pub fn with_amenities<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.amenities = names.into_iter().map(|n| Amenity { name: n.into() }).collect();
        self
    }

    /// Locations rendered for a prompt: `"Lakeside, Downtown"`.
    pub fn location_list(&self) -> String {
        join_display(&self.locations)
    }

    /// Amenities rendered for a prompt: `"Pool, Gym"`.
    pub fn amenity_list(&self) -> String {
        join_display(&self.amenities)
    }
}

fn join_display<T: fmt::Display>(items: &[T]) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// The generated summary of one property. At most one exists per property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySummary {
    pub property_id: PropertyId,
    pub summary: String,
    /// Set once, when the summary is first stored
    pub created_at: DateTime<Utc>,
    /// Set on every write
    pub updated_at: DateTime<Utc>,
}

impl PropertySummary {
    pub fn new(property_id: PropertyId, summary: String) -> Self {
        let now = Utc::now();
        Self {
            property_id,
            summary,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the text, keeping `created_at` and never moving `updated_at` before it.
    pub fn revise(&mut self, summary: String) {
        self.summary = summary;
        self.updated_at = Utc::now().max(self.created_at);
    }
}
