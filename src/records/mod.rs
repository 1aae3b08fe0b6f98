//! Typed record shapes stored in the document store.
//!
//! External input (admin forms, public submissions) arrives as `*Input` or
//! `*Submission` structs and is validated once, here, into the stored record.
//! Read sites never patch up missing fields: array fields default to empty
//! during deserialization and everything else is required or an explicit
//! `Option`.
//!
//! | Record | Collection | Input type |
//! |---|---|---|
//! | [`Property`] | `properties` | [`PropertyInput`] |
//! | [`PortfolioItem`] | `portfolio` | [`PortfolioInput`] |
//! | [`BlogPost`] | `blog` | [`BlogPostInput`] |
//! | [`HomepageSettings`] | `homepage` (singleton) | [`HomepageInput`] |
//! | [`Lead`] | `leads` | [`LeadSubmission`] |
//! | [`ChatConversation`] | `chats` | [`ChatMessageInput`] |

mod blog;
mod chat;
mod homepage;
mod lead;
mod portfolio;
mod property;

pub use blog::{BlogPost, BlogPostInput, BlogPostView, render_markdown, slugify};
pub use chat::{ChatConversation, ChatMessage, ChatMessageInput, ChatRole, most_recent};
pub use homepage::{HOMEPAGE_ID, HomepageInput, HomepageSettings, Stat};
pub use lead::{Lead, LeadKind, LeadSubmission};
pub use portfolio::{PortfolioInput, PortfolioItem, portfolio_ranks, sort_portfolio};
pub use property::{GalleryImage, Property, PropertyInput, PropertyStatus};

use crate::types::DocId;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("{field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl RecordError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        RecordError::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// A record type that lives in a named collection.
pub trait Collection: Serialize + DeserializeOwned + Clone + Send + 'static {
    const NAME: &'static str;

    fn id(&self) -> &DocId;
}

/// Trim and reject blank required text.
pub(crate) fn required(field: &'static str, value: &str) -> Result<String, RecordError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RecordError::invalid(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Trim optional text; blank becomes `None`.
pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("title", "  Villa  ").unwrap(), "Villa");
        assert_eq!(
            required("title", "   "),
            Err(RecordError::invalid("title", "must not be empty"))
        );
    }

    #[test]
    fn optional_drops_blank() {
        assert_eq!(optional(Some("  ".into())), None);
        assert_eq!(optional(Some(" x ".into())), Some("x".into()));
        assert_eq!(optional(None), None);
    }

    #[test]
    fn error_message_names_field() {
        let e = RecordError::invalid("email", "missing @");
        assert_eq!(e.to_string(), "email: missing @");
    }
}
