//! Sidebar view model and HTML rendering.
//!
//! The manager never hands out markup directly. It builds a [`SidebarView`]
//! and front ends either render it themselves or call [`render_sidebar_html`].
//! User input comes back as [`SidebarAction`] values, so nothing has to be
//! re-attached after a render.

use std::fmt::Write;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::grouping::{group_by_date, Bucket};
use crate::search::{SearchOutcome, NO_RESULTS, SEARCH_HINT};
use crate::title::generate_title;
use crate::types::Conversation;

// ============================================================================
// View Model
// ============================================================================

/// One clickable conversation in the sidebar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SidebarItem {
    pub id: String,
    pub title: String,
    pub active: bool,
}

/// A non-empty recency bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SidebarSection {
    pub bucket: Bucket,
    pub items: Vec<SidebarItem>,
}

impl SidebarSection {
    pub fn label(&self) -> &'static str {
        self.bucket.label()
    }
}

/// Everything needed to draw the sidebar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SidebarView {
    pub sections: Vec<SidebarSection>,
}

impl SidebarView {
    /// Build the view for `conversations`, highlighting `current_id`.
    pub fn build<Tz: TimeZone>(
        conversations: &[Conversation],
        current_id: Option<&str>,
        now: &DateTime<Tz>,
    ) -> Self {
        let sections = group_by_date(conversations, now)
            .into_iter()
            .map(|(bucket, convs)| SidebarSection {
                bucket,
                items: convs
                    .into_iter()
                    .map(|conv| SidebarItem {
                        id: conv.id.clone(),
                        title: generate_title(conv),
                        active: current_id == Some(conv.id.as_str()),
                    })
                    .collect(),
            })
            .collect();

        Self { sections }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Iterate over every item, section by section.
    pub fn items(&self) -> impl Iterator<Item = &SidebarItem> {
        self.sections.iter().flat_map(|s| s.items.iter())
    }

    /// The highlighted item, if any.
    pub fn active_item(&self) -> Option<&SidebarItem> {
        self.items().find(|item| item.active)
    }
}

/// User interactions a sidebar front end can report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "id", rename_all = "snake_case")]
pub enum SidebarAction {
    NewChat,
    OpenSearch,
    Select(String),
    Rename(String),
    Delete(String),
}

// ============================================================================
// HTML
// ============================================================================

/// Escape `&`, `<`, `>`, `"` and `'` for interpolation into HTML.
pub fn escape_html(unsafe_text: &str) -> String {
    let mut out = String::with_capacity(unsafe_text.len());
    for c in unsafe_text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Markup for a single conversation entry.
pub fn render_conversation_item(item: &SidebarItem) -> String {
    format!(
        concat!(
            "<div class=\"history-entry{active}\" data-conversation-id=\"{id}\">",
            "<div class=\"history-content\">",
            "<span class=\"icon\">💬</span>",
            "<span class=\"conversation-title\">{title}</span>",
            "</div>",
            "<div class=\"history-actions\">",
            "<button class=\"action-btn rename-btn\" title=\"Renommer\">✏️</button>",
            "<button class=\"action-btn delete-btn\" title=\"Supprimer\">🗑️</button>",
            "</div>",
            "</div>"
        ),
        active = if item.active { " active" } else { "" },
        id = escape_html(&item.id),
        title = escape_html(&item.title),
    )
}

/// Markup for the whole sidebar: header buttons then one section per bucket.
pub fn render_sidebar_html(view: &SidebarView) -> String {
    let mut html = String::from(concat!(
        "<div class=\"history-header\">",
        "<button class=\"new-chat-btn\">+ Nouvelle conversation</button>",
        "<button class=\"search-history-btn\">🔍 Rechercher</button>",
        "</div>"
    ));

    for section in &view.sections {
        let _ = write!(
            html,
            "<div class=\"history-section\"><div class=\"section-header\">{}</div>",
            escape_html(section.label())
        );
        for item in &section.items {
            html.push_str(&render_conversation_item(item));
        }
        html.push_str("</div>");
    }

    html
}

/// Markup for the search dialog's result area.
pub fn render_search_html(outcome: &SearchOutcome) -> String {
    match outcome {
        SearchOutcome::Hint => format!("<p class=\"search-hint\">{SEARCH_HINT}</p>"),
        SearchOutcome::NoResults => format!("<p class=\"no-results\">{NO_RESULTS}</p>"),
        SearchOutcome::Matches(hits) => hits
            .iter()
            .map(|hit| {
                format!(
                    "<div class=\"search-result-item\" data-conversation-id=\"{}\"><strong>{}</strong><small>{}</small></div>",
                    escape_html(&hit.id),
                    escape_html(&hit.title),
                    escape_html(&hit.date),
                )
            })
            .collect(),
    }
}
