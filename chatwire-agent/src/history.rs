//! Caller-owned conversation history.
//!
//! The orchestrator never mutates a [`Conversation`] while streaming; it
//! works on a copy. Edits made here are the user's own (rewriting or deleting
//! a turn, regenerating from an earlier point).

use chatwire_core::{ChatError, ContentPart, Message, MessageContent, Role};
use serde::{Deserialize, Serialize};

/// An ordered list of messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the system prompt, replacing an existing leading one.
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        let system = Message::system(prompt);
        match self.messages.first_mut() {
            Some(first) if first.role == Role::System => *first = system,
            _ => self.messages.insert(0, system),
        }
        self
    }

    /// Append a user message.
    pub fn push_user(&mut self, content: impl Into<String>) -> &mut Self {
        self.push(Message::user(content))
    }

    /// Append a multi-part user message.
    pub fn push_user_parts(&mut self, parts: Vec<ContentPart>) -> &mut Self {
        self.push(Message::user_parts(parts))
    }

    /// Append an assistant message.
    pub fn push_assistant(&mut self, content: impl Into<String>) -> &mut Self {
        self.push(Message::assistant(content))
    }

    /// Append any message.
    pub fn push(&mut self, message: Message) -> &mut Self {
        self.messages.push(message);
        self
    }

    /// Replace the content of the message at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::InvalidMessage`] if `index` is out of range.
    pub fn edit(
        &mut self,
        index: usize,
        content: impl Into<MessageContent>,
    ) -> Result<(), ChatError> {
        let message = self.get_mut(index)?;
        message.content = Some(content.into());
        Ok(())
    }

    /// Remove and return the message at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::InvalidMessage`] if `index` is out of range.
    pub fn remove(&mut self, index: usize) -> Result<Message, ChatError> {
        self.check_index(index)?;
        Ok(self.messages.remove(index))
    }

    /// Keep messages up to and including `index`; used to regenerate a reply.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::InvalidMessage`] if `index` is out of range.
    pub fn truncate_after(&mut self, index: usize) -> Result<(), ChatError> {
        self.check_index(index)?;
        self.messages.truncate(index + 1);
        Ok(())
    }

    /// Drop the oldest messages so at most `max_messages` remain.
    ///
    /// A leading system prompt is always kept.
    pub fn keep_last(&mut self, max_messages: usize) {
        if self.messages.len() <= max_messages {
            return;
        }

        let has_system = self
            .messages
            .first()
            .is_some_and(|m| m.role == Role::System);
        if has_system && max_messages > 0 {
            let drop_count = self.messages.len() - max_messages;
            self.messages.drain(1..=drop_count);
        } else {
            let start = self.messages.len() - max_messages;
            self.messages.drain(..start);
        }
    }

    /// Replace the messages wholesale, e.g. with an exchange's working history.
    pub fn replace(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    /// All messages in order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The last message, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the conversation is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn check_index(&self, index: usize) -> Result<(), ChatError> {
        if index < self.messages.len() {
            Ok(())
        } else {
            Err(out_of_range(index, self.messages.len()))
        }
    }

    fn get_mut(&mut self, index: usize) -> Result<&mut Message, ChatError> {
        let len = self.messages.len();
        self.messages
            .get_mut(index)
            .ok_or_else(|| out_of_range(index, len))
    }
}

fn out_of_range(index: usize, len: usize) -> ChatError {
    ChatError::invalid_message(format!("message index {index} out of range (len {len})"))
}

impl From<Vec<Message>> for Conversation {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

impl From<Conversation> for Vec<Message> {
    fn from(conversation: Conversation) -> Self {
        conversation.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn sample() -> Conversation {
        let mut conversation = Conversation::new().with_system_prompt("Be brief.");
        conversation
            .push_user("first")
            .push_assistant("one")
            .push_user("second")
            .push_assistant("two");
        conversation
    }

    #[test]
    fn test_system_prompt_replaced() {
        let conversation = sample().with_system_prompt("Be verbose.");
        assert_eq!(conversation.len(), 5);
        assert_eq!(conversation.messages()[0], Message::system("Be verbose."));
    }

    #[test]
    fn test_edit_and_remove() {
        let mut conversation = sample();
        conversation.edit(1, "FIRST").unwrap();
        assert_eq!(conversation.messages()[1].text().as_deref(), Some("FIRST"));

        let removed = conversation.remove(2).unwrap();
        assert_eq!(removed, Message::assistant("one"));
        assert_eq!(conversation.len(), 4);
    }

    #[test]
    fn test_truncate_after() {
        let mut conversation = sample();
        conversation.truncate_after(3).unwrap();
        assert_eq!(conversation.last(), Some(&Message::user("second")));
    }

    #[rstest]
    #[case::edit(|c: &mut Conversation| c.edit(9, "x"))]
    #[case::remove(|c: &mut Conversation| c.remove(9).map(|_| ()))]
    #[case::truncate(|c: &mut Conversation| c.truncate_after(9))]
    fn test_out_of_range(#[case] op: fn(&mut Conversation) -> Result<(), ChatError>) {
        let mut conversation = sample();
        assert!(matches!(op(&mut conversation), Err(ChatError::InvalidMessage(_))));
        assert_eq!(conversation, sample());
    }

    #[test]
    fn test_keep_last_keeps_system_prompt() {
        let mut conversation = sample();
        conversation.keep_last(3);
        let texts: Vec<_> = conversation
            .messages()
            .iter()
            .filter_map(Message::text)
            .collect();
        assert_eq!(texts, vec!["Be brief.", "second", "two"]);
    }

    #[test]
    fn test_keep_last_without_system_prompt() {
        let mut conversation = Conversation::from(vec![
            Message::user("a"),
            Message::assistant("b"),
            Message::user("c"),
        ]);
        conversation.keep_last(1);
        assert_eq!(conversation.messages(), &[Message::user("c")]);
    }

    #[test]
    fn test_serializes_as_message_array() {
        let mut conversation = Conversation::new();
        conversation.push_user("hi");
        assert_eq!(
            serde_json::to_value(&conversation).unwrap(),
            serde_json::json!([{"role": "user", "content": "hi"}])
        );
    }
}
