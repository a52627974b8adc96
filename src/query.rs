//! Canonical query model shared by the aggregator and the facade.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ingest::types::SourceId;

/// Category whose headlines use [`FALLBACK_HEADLINES_TERM`] instead of its own name.
pub const GENERAL_CATEGORY: &str = "general";
pub const FALLBACK_HEADLINES_TERM: &str = "latest news";

pub const KNOWN_CATEGORIES: [&str; 7] = [
    "general",
    "technology",
    "business",
    "health",
    "science",
    "sports",
    "entertainment",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    Search,
    Headlines,
}

impl QueryMode {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryMode::Search => "search",
            QueryMode::Headlines => "headlines",
        }
    }
}

/// Which providers a query should reach.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SourceSelection {
    #[default]
    All,
    Only(BTreeSet<SourceId>),
}

impl SourceSelection {
    /// Empty list selects everything; unknown ids are dropped.
    /// A list made only of unknown ids selects nothing.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen_any = false;
        let mut set = BTreeSet::new();
        for raw in ids {
            let raw = raw.as_ref().trim();
            if raw.is_empty() {
                continue;
            }
            seen_any = true;
            match raw.parse::<SourceId>() {
                Ok(id) => {
                    set.insert(id);
                }
                Err(e) => tracing::debug!(error = %e, "ignoring unknown source in filter"),
            }
        }
        if seen_any {
            SourceSelection::Only(set)
        } else {
            SourceSelection::All
        }
    }

    /// Comma-joined ids as sent by the presentation layer; `None`/"" means no filter.
    pub fn from_csv(csv: Option<&str>) -> Self {
        match csv {
            Some(s) => Self::from_ids(s.split(',')),
            None => SourceSelection::All,
        }
    }

    pub fn includes(&self, id: SourceId) -> bool {
        match self {
            SourceSelection::All => true,
            SourceSelection::Only(set) => set.contains(&id),
        }
    }
}

impl From<BTreeSet<SourceId>> for SourceSelection {
    fn from(set: BTreeSet<SourceId>) -> Self {
        if set.is_empty() {
            SourceSelection::All
        } else {
            SourceSelection::Only(set)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalQuery {
    pub mode: QueryMode,
    pub term: String,
    pub sources: SourceSelection,
}

impl CanonicalQuery {
    pub fn search(term: impl Into<String>, sources: SourceSelection) -> Self {
        Self {
            mode: QueryMode::Search,
            term: term.into(),
            sources,
        }
    }

    pub fn headlines(category: &str, sources: SourceSelection) -> Self {
        Self {
            mode: QueryMode::Headlines,
            term: headlines_term(category),
            sources,
        }
    }
}

/// Term sent upstream for a category: its own name, or the generic fallback for "general".
pub fn headlines_term(category: &str) -> String {
    let c = category.trim();
    if c.is_empty() || c.eq_ignore_ascii_case(GENERAL_CATEGORY) {
        FALLBACK_HEADLINES_TERM.to_string()
    } else {
        c.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateRange {
    Day,
    #[default]
    Week,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    PublishedAt,
    Popularity,
    Relevancy,
}

/// Filter set supplied by the presentation layer. `date_range` and `sort_by`
/// are carried through but results are always ordered by recency.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsFilters {
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub date_range: DateRange,
    #[serde(default)]
    pub sort_by: SortBy,
}

impl NewsFilters {
    pub fn with_sources<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sources: ids.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn selection(&self) -> SourceSelection {
        SourceSelection::from_ids(&self.sources)
    }

    pub fn sources_csv(&self) -> String {
        self.sources.join(",")
    }
}
