//! Completed projects shown in the portfolio grid.

use super::{Collection, GalleryImage, RecordError, optional, required};
use crate::gallery::RankUpdate;
use crate::types::DocId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioItem {
    pub id: DocId,
    pub title: String,
    pub location: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub description: String,
    pub image: Option<String>,
    #[serde(default)]
    pub gallery: Vec<GalleryImage>,
    pub completed_year: Option<u16>,
    /// Rank in the portfolio grid, zero-based.
    #[serde(default)]
    pub order: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Collection for PortfolioItem {
    const NAME: &'static str = "portfolio";

    fn id(&self) -> &DocId {
        &self.id
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PortfolioInput {
    pub title: String,
    pub location: Option<String>,
    pub category: Option<String>,
    pub description: String,
    pub image: Option<String>,
    pub gallery: Vec<String>,
    pub completed_year: Option<u16>,
}

impl PortfolioItem {
    /// New items go to the end of the grid; the caller picks `order`.
    pub fn create(
        input: PortfolioInput,
        order: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, RecordError> {
        Self::build(DocId::generate(), input, &[], order, now, now)
    }

    /// Replace editable fields; rank and identity are preserved.
    pub fn replace(&self, input: PortfolioInput, now: DateTime<Utc>) -> Result<Self, RecordError> {
        Self::build(
            self.id.clone(),
            input,
            &self.gallery,
            self.order,
            self.created_at,
            now,
        )
    }

    fn build(
        id: DocId,
        input: PortfolioInput,
        existing_gallery: &[GalleryImage],
        order: u32,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, RecordError> {
        if let Some(year) = input.completed_year
            && !(1900..=2100).contains(&year)
        {
            return Err(RecordError::invalid(
                "completed_year",
                format!("{year} is out of range"),
            ));
        }
        let urls: Vec<String> = input
            .gallery
            .iter()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();
        Ok(Self {
            id,
            title: required("title", &input.title)?,
            location: optional(input.location),
            category: optional(input.category),
            description: input.description.trim().to_string(),
            image: optional(input.image),
            gallery: GalleryImage::from_urls(&urls, existing_gallery),
            completed_year: input.completed_year,
            order,
            created_at,
            updated_at,
        })
    }
}

/// Sort items for display: by rank, ties broken by creation time.
pub fn sort_portfolio(items: &mut [PortfolioItem]) {
    items.sort_by(|a, b| a.order.cmp(&b.order).then(a.created_at.cmp(&b.created_at)));
}

/// Ids and stored ranks, in display order.
pub fn portfolio_ranks(mut items: Vec<PortfolioItem>) -> Vec<RankUpdate> {
    sort_portfolio(&mut items);
    items
        .into_iter()
        .map(|item| RankUpdate {
            id: item.id,
            rank: item.order,
        })
        .collect()
}
