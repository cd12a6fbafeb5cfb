//! Title search over the cached conversation list.

use crate::title::generate_title;
use crate::types::Conversation;

/// Queries shorter than this (in characters) are not searched.
pub const MIN_QUERY_CHARS: usize = 2;

/// Hint shown while the query is too short.
pub const SEARCH_HINT: &str = "Tapez au moins 2 caractères";

/// Message shown when nothing matches.
pub const NO_RESULTS: &str = "Aucun résultat trouvé";

/// A conversation matching a search query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    /// `updated_at` formatted as `dd/mm/yyyy`, empty when unknown.
    pub date: String,
}

impl SearchHit {
    fn from_conversation(conv: &Conversation, title: String) -> Self {
        Self {
            id: conv.id.clone(),
            title,
            date: conv
                .updated_at
                .map(|t| t.with_timezone(&chrono::Local).format("%d/%m/%Y").to_string())
                .unwrap_or_default(),
        }
    }
}

/// Result of running a query against the list.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The query is shorter than [`MIN_QUERY_CHARS`].
    Hint,
    /// The query is long enough but matched nothing.
    NoResults,
    /// Matching conversations, in list order.
    Matches(Vec<SearchHit>),
}

/// Case-insensitive substring search on generated titles.
pub fn search_conversations(conversations: &[Conversation], query: &str) -> SearchOutcome {
    let query = query.to_lowercase();
    if query.chars().count() < MIN_QUERY_CHARS {
        return SearchOutcome::Hint;
    }

    let hits: Vec<SearchHit> = conversations
        .iter()
        .filter_map(|conv| {
            let title = generate_title(conv);
            title
                .to_lowercase()
                .contains(&query)
                .then(|| SearchHit::from_conversation(conv, title))
        })
        .collect();

    if hits.is_empty() {
        SearchOutcome::NoResults
    } else {
        SearchOutcome::Matches(hits)
    }
}
