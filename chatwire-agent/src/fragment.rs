//! Output fragments.

use chatwire_core::ChatError;

/// One unit of output from a chat exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatFragment {
    /// Human-visible text.
    Text(String),
    /// Terminal failure; always the last fragment of an exchange.
    Error(ChatError),
}

impl ChatFragment {
    /// Render for a text consumer: text verbatim, errors as `{"error": "..."}`.
    #[must_use]
    pub fn to_wire(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Error(err) => err.to_error_json(),
        }
    }

    /// The text, if this is a text fragment.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Error(_) => None,
        }
    }

    /// Whether this is an error fragment.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl From<ChatError> for ChatFragment {
    fn from(err: ChatError) -> Self {
        Self::Error(err)
    }
}
