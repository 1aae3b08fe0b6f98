//! Homepage settings: a single document with id [`HOMEPAGE_ID`].

use super::{Collection, RecordError, optional, required};
use crate::types::DocId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Document id of the singleton settings record.
pub const HOMEPAGE_ID: &str = "main";

static HOMEPAGE_DOC_ID: LazyLock<DocId> = LazyLock::new(|| DocId::from(HOMEPAGE_ID));

/// A headline figure, e.g. `{ label: "Deals closed", value: "350+" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomepageSettings {
    pub id: DocId,
    pub hero_title: String,
    #[serde(default)]
    pub hero_subtitle: String,
    pub hero_image: Option<String>,
    #[serde(default)]
    pub featured_property_ids: Vec<DocId>,
    #[serde(default)]
    pub stats: Vec<Stat>,
    pub updated_at: DateTime<Utc>,
}

impl Collection for HomepageSettings {
    const NAME: &'static str = "homepage";

    fn id(&self) -> &DocId {
        &HOMEPAGE_DOC_ID
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HomepageInput {
    pub hero_title: String,
    pub hero_subtitle: String,
    pub hero_image: Option<String>,
    pub featured_property_ids: Vec<DocId>,
    pub stats: Vec<Stat>,
}

impl HomepageSettings {
    /// Settings served before an admin has saved any.
    pub fn placeholder(now: DateTime<Utc>) -> Self {
        Self {
            id: HOMEPAGE_DOC_ID.clone(),
            hero_title: "Find your next address".to_string(),
            hero_subtitle: String::new(),
            hero_image: None,
            featured_property_ids: Vec::new(),
            stats: Vec::new(),
            updated_at: now,
        }
    }

    pub fn from_input(input: HomepageInput, now: DateTime<Utc>) -> Result<Self, RecordError> {
        let mut featured: Vec<DocId> = Vec::with_capacity(input.featured_property_ids.len());
        for id in input.featured_property_ids {
            if !featured.contains(&id) {
                featured.push(id);
            }
        }
        let stats = input
            .stats
            .into_iter()
            .map(|s| {
                Ok(Stat {
                    label: required("stats.label", &s.label)?,
                    value: required("stats.value", &s.value)?,
                })
            })
            .collect::<Result<Vec<_>, RecordError>>()?;
        Ok(Self {
            id: HOMEPAGE_DOC_ID.clone(),
            hero_title: required("hero_title", &input.hero_title)?,
            hero_subtitle: input.hero_subtitle.trim().to_string(),
            hero_image: optional(input.hero_image),
            featured_property_ids: featured,
            stats,
            updated_at: now,
        })
    }
}
