use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// A file chosen for upload with the next message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl PendingFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), bytes }
    }
}

/// Everything the backend needs to know about the current chat.
#[derive(Debug, Default)]
pub struct Conversation {
    pub provider: String,
    pub model: Option<String>,
    pub messages: Vec<Message>,
    /// true only between send initiation and outcome handling
    pub sending: bool,
    pub pending_file: Option<PendingFile>,
}

impl Conversation {
    pub fn new(provider: impl Into<String>) -> Self {
        Self { provider: provider.into(), ..Self::default() }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Drops the message log and any pending file. The provider and model survive.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.pending_file = None;
    }

    pub fn last_assistant(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }
}
