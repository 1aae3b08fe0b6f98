//! Visitor contact submissions.
//!
//! The public form posts a flat [`LeadSubmission`]; validation turns it into
//! a [`Lead`] whose [`LeadKind`] says what the visitor asked for.

use super::{Collection, RecordError, optional, required};
use crate::types::DocId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MAX_MESSAGE_CHARS: usize = 5000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LeadKind {
    PropertySearch {
        location: Option<String>,
        property_type: Option<String>,
        budget: Option<String>,
        bedrooms: Option<u8>,
    },
    Contact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: DocId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub kind: LeadKind,
    pub created_at: DateTime<Utc>,
}

impl Collection for Lead {
    const NAME: &'static str = "leads";

    fn id(&self) -> &DocId {
        &self.id
    }
}

/// Flat form payload. `kind` is `"property_search"` or `"contact"` (default).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LeadSubmission {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub kind: Option<String>,
    pub location: Option<String>,
    pub property_type: Option<String>,
    pub budget: Option<String>,
    pub bedrooms: Option<u8>,
}

impl Lead {
    pub fn from_submission(s: LeadSubmission, now: DateTime<Utc>) -> Result<Self, RecordError> {
        let name = required("name", &s.name)?;
        let email = optional(s.email).map(|e| e.to_lowercase());
        let phone = optional(s.phone);

        if email.is_none() && phone.is_none() {
            return Err(RecordError::invalid(
                "email",
                "an email address or phone number is required",
            ));
        }
        if let Some(e) = &email
            && !is_plausible_email(e)
        {
            return Err(RecordError::invalid("email", "is not a valid address"));
        }
        if let Some(p) = &phone
            && p.chars().filter(|c| c.is_ascii_digit()).count() < 7
        {
            return Err(RecordError::invalid("phone", "needs at least 7 digits"));
        }

        let message = optional(s.message);
        if let Some(m) = &message
            && m.chars().count() > MAX_MESSAGE_CHARS
        {
            return Err(RecordError::invalid(
                "message",
                format!("must be at most {MAX_MESSAGE_CHARS} characters"),
            ));
        }

        let kind = match s.kind.as_deref().map(str::trim) {
            None | Some("") | Some("contact") => LeadKind::Contact,
            Some("property_search") => LeadKind::PropertySearch {
                location: optional(s.location),
                property_type: optional(s.property_type),
                budget: optional(s.budget),
                bedrooms: s.bedrooms,
            },
            Some(other) => {
                return Err(RecordError::invalid(
                    "kind",
                    format!("unknown lead kind '{other}'"),
                ));
            }
        };

        Ok(Self {
            id: DocId::generate(),
            name,
            email,
            phone,
            message,
            kind,
            created_at: now,
        })
    }
}

/// `local@domain.tld` with no whitespace.
fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}
