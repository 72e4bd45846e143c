use crate::errors::CliError;
use crate::prompts::{self, ChatMessage};

pub const FAILURE_NOTICE: &str = "Failed to get a response. Please try again.";

/// A running conversation. Messages only ever get appended; `clear` starts
/// over.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    loading: bool,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Appends the user's turn and returns the full request for it.
    pub fn submit(&mut self, input: &str) -> Result<Vec<ChatMessage>, CliError> {
        if self.loading {
            return Err(CliError::Usage("A reply is still on its way.".to_string()));
        }
        let input = input.trim();
        if input.is_empty() {
            return Err(CliError::Usage("Type a message first.".to_string()));
        }

        let request = prompts::chat(input, &self.messages);
        self.messages.push(ChatMessage::user(input));
        self.loading = true;
        Ok(request)
    }

    /// Stores whatever the user saw of the reply. Empty text adds nothing.
    pub fn commit_reply(&mut self, text: String) {
        self.loading = false;
        if !text.is_empty() {
            self.messages.push(ChatMessage::assistant(text));
        }
    }

    /// The request failed; the user's turn stays so the next one sees it.
    pub fn fail(&mut self) {
        self.loading = false;
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.loading = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::Role;

    #[test]
    fn history_carries_earlier_turns() {
        let mut chat = ChatSession::new();
        let first = chat.submit("What is osmosis?").unwrap();
        assert_eq!(first.len(), 2);
        chat.commit_reply("Water moving across a membrane.".to_string());

        let second = chat.submit("And diffusion?").unwrap();
        let roles: Vec<Role> = second.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(second.last().unwrap().content, "And diffusion?");
        assert_eq!(chat.messages().len(), 3);
    }

    #[test]
    fn blank_and_concurrent_submissions_are_refused() {
        let mut chat = ChatSession::new();
        assert!(chat.submit("  ").is_err());
        chat.submit("hi").unwrap();
        assert!(chat.is_loading());
        assert!(chat.submit("again").is_err());
        chat.fail();
        assert!(!chat.is_loading());
        assert_eq!(chat.messages().len(), 1);
    }

    #[test]
    fn partial_reply_is_committed() {
        let mut chat = ChatSession::new();
        chat.submit("Explain").unwrap();
        chat.commit_reply("Half an ans".to_string());
        assert_eq!(chat.messages()[1], ChatMessage::assistant("Half an ans"));
    }

    #[test]
    fn clear_starts_over() {
        let mut chat = ChatSession::new();
        chat.submit("hi").unwrap();
        chat.commit_reply("hello".to_string());
        chat.clear();
        assert!(chat.messages().is_empty());
        assert_eq!(chat.submit("new").unwrap().len(), 2);
    }
}
