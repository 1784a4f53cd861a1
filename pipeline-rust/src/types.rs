use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DEFAULT_ROLE: &str = "Student";

/// Who the pipeline is working for. The email is the key of the user's
/// document in the [`UserStore`](crate::UserStore).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
}

impl Identity {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.email
    }
}

/// A single generated cheat sheet. `generated_at` is unique within one
/// user's sheets and doubles as the replay key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedArtifact {
    pub topic: String,
    pub difficulty: String,
    pub programming_language: String,
    pub html: String,
    pub related_topics: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl GeneratedArtifact {
    /// File name offered when the sheet is downloaded, e.g.
    /// `dynamic_programming_cheat_sheet.html`.
    #[must_use]
    pub fn download_file_name(&self) -> String {
        let slug = self
            .topic
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("_");
        if slug.is_empty() {
            "algo_cheat_sheet.html".to_string()
        } else {
            format!("{slug}_cheat_sheet.html")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub title: String,
    pub time: DateTime<Utc>,
}

/// The per-user document. Both lists are append-only; insertion order is
/// recency order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub generated_sheets: Vec<GeneratedArtifact>,
    #[serde(default)]
    pub recent_searches: Vec<SearchHistoryEntry>,
}

impl UserRecord {
    /// A freshly signed-up user: default role, no history.
    pub fn new(identity: &Identity, created_at: DateTime<Utc>) -> Self {
        Self {
            email: identity.email.clone(),
            name: None,
            role: DEFAULT_ROLE.to_string(),
            created_at,
            generated_sheets: Vec::new(),
            recent_searches: Vec::new(),
        }
    }

    /// Latest `generated_at` among the user's sheets.
    #[must_use]
    pub fn latest_generated_at(&self) -> Option<DateTime<Utc>> {
        self.generated_sheets
            .iter()
            .map(|sheet| sheet.generated_at)
            .max()
    }

    /// Most recent searches first.
    pub fn recent_searches(&self, limit: usize) -> impl Iterator<Item = &SearchHistoryEntry> {
        self.recent_searches.iter().rev().take(limit)
    }

    /// Most recently generated sheets first.
    pub fn recent_sheets(&self, limit: usize) -> impl Iterator<Item = &GeneratedArtifact> {
        self.generated_sheets.iter().rev().take(limit)
    }

    #[must_use]
    pub fn stats(&self) -> UserStats {
        let explored: HashSet<String> = self
            .recent_searches
            .iter()
            .map(|entry| entry.title.to_lowercase())
            .chain(
                self.generated_sheets
                    .iter()
                    .map(|sheet| sheet.topic.to_lowercase()),
            )
            .collect();

        UserStats {
            sheets_created: self.generated_sheets.len(),
            topics_explored: explored.len(),
        }
    }
}

/// Numbers shown on the account screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserStats {
    pub sheets_created: usize,
    pub topics_explored: usize,
}

/// An entry of the "related topics" surface. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub title: String,
    pub icon: String,
}

impl Topic {
    pub fn new(title: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            icon: icon.into(),
        }
    }
}
