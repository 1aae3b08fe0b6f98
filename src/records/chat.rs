//! Website chat conversations.

use super::{Collection, RecordError, optional, required};
use crate::types::DocId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MAX_CONTENT_CHARS: usize = 4000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    #[default]
    Visitor,
    Agent,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConversation {
    pub id: DocId,
    /// Visitor display name or contact, when given.
    pub visitor: Option<String>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Collection for ChatConversation {
    const NAME: &'static str = "chats";

    fn id(&self) -> &DocId {
        &self.id
    }
}

/// Public payload. Without `conversation_id` a new conversation is started.
///
/// There is no role field: the sender's role is decided by the route, not
/// by the caller.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChatMessageInput {
    pub conversation_id: Option<DocId>,
    pub visitor: Option<String>,
    pub content: String,
}

impl ChatMessageInput {
    /// Validate the message body into a stored message from `role`.
    pub fn to_message(
        &self,
        role: ChatRole,
        now: DateTime<Utc>,
    ) -> Result<ChatMessage, RecordError> {
        let content = required("content", &self.content)?;
        if content.chars().count() > MAX_CONTENT_CHARS {
            return Err(RecordError::invalid(
                "content",
                format!("must be at most {MAX_CONTENT_CHARS} characters"),
            ));
        }
        Ok(ChatMessage {
            role,
            content,
            sent_at: now,
        })
    }
}

impl ChatConversation {
    pub fn start(
        visitor: Option<String>,
        first: ChatMessage,
        now: DateTime<Utc>,
    ) -> ChatConversation {
        ChatConversation {
            id: DocId::generate(),
            visitor: optional(visitor),
            messages: vec![first],
            created_at: now,
            updated_at: now,
        }
    }

    pub fn append(&mut self, message: ChatMessage) {
        self.updated_at = message.sent_at;
        self.messages.push(message);
    }
}

/// Most recently updated first, truncated to `limit`.
pub fn most_recent(mut conversations: Vec<ChatConversation>, limit: usize) -> Vec<ChatConversation> {
    conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    conversations.truncate(limit);
    conversations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::fixed_now;
    use chrono::Duration;

    fn input(content: &str) -> ChatMessageInput {
        ChatMessageInput {
            content: content.into(),
            ..Default::default()
        }
    }

    #[test]
    fn message_takes_role_from_caller() {
        let msg = input("  Hello  ").to_message(ChatRole::Visitor, fixed_now()).unwrap();
        assert_eq!(msg.role, ChatRole::Visitor);
        let reply = input("Hi").to_message(ChatRole::Agent, fixed_now()).unwrap();
        assert_eq!(reply.role, ChatRole::Agent);
        assert_eq!(msg.content, "Hello");
    }

    #[test]
    fn empty_and_oversized_content_rejected() {
        assert!(input(" ").to_message(ChatRole::Visitor, fixed_now()).is_err());
        let long = "x".repeat(MAX_CONTENT_CHARS + 1);
        assert!(matches!(
            input(&long).to_message(ChatRole::Visitor, fixed_now()),
            Err(RecordError::Invalid {
                field: "content",
                ..
            })
        ));
    }

    #[test]
    fn append_bumps_updated_at() {
        let t0 = fixed_now();
        let first = input("Hi").to_message(ChatRole::Visitor, t0).unwrap();
        let mut convo = ChatConversation::start(Some(" Sara ".into()), first, t0);
        assert_eq!(convo.visitor.as_deref(), Some("Sara"));

        let later = t0 + Duration::minutes(2);
        convo.append(input("Still there?").to_message(ChatRole::Visitor, later).unwrap());
        assert_eq!(convo.messages.len(), 2);
        assert_eq!(convo.updated_at, later);
        assert_eq!(convo.created_at, t0);
    }

    #[test]
    fn most_recent_sorts_and_truncates() {
        let t0 = fixed_now();
        let convos: Vec<ChatConversation> = (0..5)
            .map(|i| {
                let at = t0 + Duration::minutes(i);
                let msg = input("hi").to_message(ChatRole::Visitor, at).unwrap();
                ChatConversation::start(None, msg, at)
            })
            .collect();
        let newest = convos[4].id.clone();

        let recent = most_recent(convos, 2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, newest);
        assert!(recent[0].updated_at > recent[1].updated_at);
    }
}
