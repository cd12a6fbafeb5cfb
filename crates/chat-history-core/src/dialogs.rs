//! Blocking user dialogs the manager needs for rename and delete.

/// Prompt text used when renaming.
pub const RENAME_PROMPT: &str = "Nouveau titre:";

/// Confirmation text used before deleting.
pub const DELETE_CONFIRM: &str = "Êtes-vous sûr de vouloir supprimer cette conversation ?";

/// Modal prompt and confirm, answered synchronously by the user.
pub trait Dialogs: Send + Sync {
    /// Ask for a line of text, pre-filled with `default`.
    ///
    /// `None` means the user cancelled.
    fn prompt(&self, message: &str, default: &str) -> Option<String>;

    /// Ask a yes/no question.
    fn confirm(&self, message: &str) -> bool;
}

impl<D: Dialogs + ?Sized> Dialogs for Box<D> {
    fn prompt(&self, message: &str, default: &str) -> Option<String> {
        (**self).prompt(message, default)
    }

    fn confirm(&self, message: &str) -> bool {
        (**self).confirm(message)
    }
}

/// Dialogs with fixed answers, for non-interactive callers.
#[derive(Debug, Clone, Default)]
pub struct FixedDialogs {
    pub prompt_answer: Option<String>,
    pub confirm_answer: bool,
}

impl FixedDialogs {
    /// Answers every confirm with yes and every prompt with `title`.
    pub fn accepting(title: Option<String>) -> Self {
        Self {
            prompt_answer: title,
            confirm_answer: true,
        }
    }
}

impl Dialogs for FixedDialogs {
    fn prompt(&self, _message: &str, _default: &str) -> Option<String> {
        self.prompt_answer.clone()
    }

    fn confirm(&self, _message: &str) -> bool {
        self.confirm_answer
    }
}
