//! Display titles for conversations.

use crate::types::Conversation;

/// Title shown when a conversation has neither a title nor a user message.
pub const DEFAULT_TITLE: &str = "Nouvelle conversation";

/// Maximum number of characters kept from the first user message.
pub const TITLE_PREVIEW_CHARS: usize = 40;

/// Pick the title displayed for a conversation.
///
/// Order of preference:
/// 1. the explicit title, when it is not blank;
/// 2. the first user message, trimmed and cut to [`TITLE_PREVIEW_CHARS`]
///    characters with a trailing `...` when longer;
/// 3. [`DEFAULT_TITLE`].
pub fn generate_title(conv: &Conversation) -> String {
    if let Some(title) = conv.title.as_deref() {
        if !title.trim().is_empty() {
            return title.to_string();
        }
    }

    if let Some(first) = conv.first_user_message() {
        return truncate_preview(first.content.trim());
    }

    DEFAULT_TITLE.to_string()
}

fn truncate_preview(text: &str) -> String {
    match text.char_indices().nth(TITLE_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;

    fn conv_with(title: Option<&str>, messages: Vec<Message>) -> Conversation {
        let mut conv = Conversation::new("c1", None);
        conv.title = title.map(str::to_string);
        conv.messages = messages;
        conv
    }

    #[test]
    fn explicit_title_wins() {
        let conv = conv_with(Some("Plan de voyage"), vec![Message::user("autre chose")]);
        assert_eq!(generate_title(&conv), "Plan de voyage");
    }

    #[test]
    fn explicit_title_is_not_trimmed() {
        let conv = conv_with(Some("  Rapport "), vec![]);
        assert_eq!(generate_title(&conv), "  Rapport ");
    }

    #[test]
    fn whitespace_title_falls_back_to_long_user_message() {
        let long = "Peux-tu m'expliquer le fonctionnement des emprunts en Rust ?";
        let conv = conv_with(Some("   "), vec![Message::user(long)]);

        let title = generate_title(&conv);
        assert_eq!(title, format!("{}...", &long[..40]));
        assert_eq!(title.chars().count(), 43);
    }

    #[test]
    fn short_user_message_is_kept_whole() {
        let conv = conv_with(None, vec![Message::user("  Bonjour  ")]);
        assert_eq!(generate_title(&conv), "Bonjour");
    }

    #[test]
    fn exactly_forty_chars_has_no_ellipsis() {
        let text = "a".repeat(40);
        let conv = conv_with(None, vec![Message::user(text.clone())]);
        assert_eq!(generate_title(&conv), text);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let text = "é".repeat(41);
        let conv = conv_with(None, vec![Message::user(text)]);
        assert_eq!(generate_title(&conv), format!("{}...", "é".repeat(40)));
    }

    #[test]
    fn skips_assistant_messages() {
        let conv = conv_with(
            Some(""),
            vec![Message::new("ai", "Réponse"), Message::user("Question")],
        );
        assert_eq!(generate_title(&conv), "Question");
    }

    #[test]
    fn empty_title_no_messages_uses_placeholder() {
        let conv = conv_with(Some(""), vec![]);
        assert_eq!(generate_title(&conv), DEFAULT_TITLE);
    }

    #[test]
    fn only_assistant_messages_uses_placeholder() {
        let conv = conv_with(None, vec![Message::new("ai", "Bonjour")]);
        assert_eq!(generate_title(&conv), DEFAULT_TITLE);
    }
}
