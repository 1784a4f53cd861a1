use crate::Topic;
use std::collections::HashSet;

/// Icon for topics that only the backend suggested.
pub const DEFAULT_ICON: &str = "📘";

pub const POPULAR_SEARCHES: [&str; 3] = [
    "Binary Search Trees",
    "Dynamic Programming",
    "Graph Algorithms",
];

/// Related topics shown for every sheet before backend suggestions are
/// merged in.
#[must_use]
pub fn curated_topics() -> Vec<Topic> {
    vec![
        Topic::new("Recursion", "🔄"),
        Topic::new("Memoization", "💾"),
        Topic::new("Graph Algorithms", "🔗"),
        Topic::new("Binary Trees", "🌳"),
    ]
}

fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Merge the curated list with backend suggestions.
///
/// Curated entries come first in their own order and keep their icons.
/// Suggestions follow in their order with [`DEFAULT_ICON`], skipping any
/// title already present under case-insensitive comparison. The first
/// occurrence of a title always wins.
#[must_use]
pub fn merge<S: AsRef<str>>(curated: &[Topic], suggested: &[S]) -> Vec<Topic> {
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(curated.len() + suggested.len());

    for topic in curated {
        if seen.insert(title_key(&topic.title)) {
            merged.push(topic.clone());
        }
    }

    for title in suggested {
        let title = title.as_ref().trim();
        if title.is_empty() {
            continue;
        }
        if seen.insert(title_key(title)) {
            merged.push(Topic::new(title, DEFAULT_ICON));
        }
    }

    merged
}

/// Drop case-insensitive duplicates and blank titles, keeping first
/// occurrences in order.
pub(crate) fn dedup_titles(titles: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    titles
        .into_iter()
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty() && seen.insert(title.to_lowercase()))
        .collect()
}
