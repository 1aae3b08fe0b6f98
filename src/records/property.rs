//! Property listings and their image galleries.

use super::{Collection, RecordError, optional, required};
use crate::gallery::RankUpdate;
use crate::types::DocId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    #[default]
    ForSale,
    ForRent,
    Sold,
    OffPlan,
}

/// One image in a gallery. `order` mirrors the position in the gallery vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub id: DocId,
    pub url: String,
    pub order: u32,
}

impl GalleryImage {
    /// Build a gallery from URLs, reusing ids from `existing` where the URL
    /// matches so reorders stay addressable across edits.
    ///
    /// Each existing id is claimed at most once, so a URL listed twice gets
    /// two distinct ids.
    pub fn from_urls(urls: &[String], existing: &[GalleryImage]) -> Vec<GalleryImage> {
        let mut unclaimed: Vec<&GalleryImage> = existing.iter().collect();
        urls.iter()
            .enumerate()
            .map(|(i, url)| {
                let id = match unclaimed.iter().position(|img| &img.url == url) {
                    Some(pos) => unclaimed.remove(pos).id.clone(),
                    None => DocId::generate(),
                };
                GalleryImage {
                    id,
                    url: url.clone(),
                    order: i as u32,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: DocId,
    pub title: String,
    pub location: String,
    /// Display price, e.g. "AED 2,400,000".
    pub price: Option<String>,
    pub property_type: Option<String>,
    pub bedrooms: Option<u8>,
    pub bathrooms: Option<u8>,
    pub area_sqft: Option<u32>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: PropertyStatus,
    #[serde(default)]
    pub featured: bool,
    /// Always the first gallery image when the gallery is non-empty.
    pub main_image: Option<String>,
    #[serde(default)]
    pub gallery: Vec<GalleryImage>,
    #[serde(default)]
    pub features: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Collection for Property {
    const NAME: &'static str = "properties";

    fn id(&self) -> &DocId {
        &self.id
    }
}

/// Admin form payload for creating or replacing a property.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PropertyInput {
    pub title: String,
    pub location: String,
    pub price: Option<String>,
    pub property_type: Option<String>,
    pub bedrooms: Option<u8>,
    pub bathrooms: Option<u8>,
    pub area_sqft: Option<u32>,
    pub description: String,
    pub status: PropertyStatus,
    pub featured: bool,
    /// Used only when `gallery` is empty.
    pub main_image: Option<String>,
    /// Image URLs in display order.
    pub gallery: Vec<String>,
    pub features: Vec<String>,
}

impl Property {
    pub fn create(input: PropertyInput, now: DateTime<Utc>) -> Result<Self, RecordError> {
        Self::build(DocId::generate(), input, &[], now, now)
    }

    /// Replace every editable field, keeping id, creation time and gallery ids.
    pub fn replace(&self, input: PropertyInput, now: DateTime<Utc>) -> Result<Self, RecordError> {
        Self::build(self.id.clone(), input, &self.gallery, self.created_at, now)
    }

    fn build(
        id: DocId,
        input: PropertyInput,
        existing_gallery: &[GalleryImage],
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, RecordError> {
        let urls: Vec<String> = input
            .gallery
            .iter()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();
        let gallery = GalleryImage::from_urls(&urls, existing_gallery);
        let mut property = Self {
            id,
            title: required("title", &input.title)?,
            location: required("location", &input.location)?,
            price: optional(input.price),
            property_type: optional(input.property_type),
            bedrooms: input.bedrooms,
            bathrooms: input.bathrooms,
            area_sqft: input.area_sqft,
            description: input.description.trim().to_string(),
            status: input.status,
            featured: input.featured,
            main_image: optional(input.main_image),
            gallery,
            features: input
                .features
                .into_iter()
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect(),
            created_at,
            updated_at,
        };
        property.sync_main_image();
        Ok(property)
    }

    /// Keep `main_image` pointing at the first gallery image.
    pub fn sync_main_image(&mut self) {
        if let Some(first) = self.gallery.first() {
            self.main_image = Some(first.url.clone());
        }
    }

    pub fn gallery_ids(&self) -> Vec<DocId> {
        self.gallery.iter().map(|g| g.id.clone()).collect()
    }

    /// Gallery ids in display order with their stored ranks.
    pub fn gallery_ranks(&self) -> Vec<RankUpdate> {
        self.gallery
            .iter()
            .map(|g| RankUpdate {
                id: g.id.clone(),
                rank: g.order,
            })
            .collect()
    }

    /// Rearrange the gallery to `order`, renumber, and resync the main image.
    ///
    /// Images missing from `order` keep their relative order after the listed
    /// ones; unknown ids are ignored.
    pub fn apply_gallery_order(&mut self, order: &[DocId]) {
        let mut remaining = std::mem::take(&mut self.gallery);
        let mut arranged = Vec::with_capacity(remaining.len());
        for id in order {
            if let Some(pos) = remaining.iter().position(|g| &g.id == id) {
                arranged.push(remaining.remove(pos));
            }
        }
        arranged.extend(remaining);
        for (i, img) in arranged.iter_mut().enumerate() {
            img.order = i as u32;
        }
        self.gallery = arranged;
        self.sync_main_image();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{fixed_now, property_input};

    #[test]
    fn create_assigns_id_and_orders_gallery() {
        let p = Property::create(property_input("Marina View"), fixed_now()).unwrap();
        assert_eq!(p.title, "Marina View");
        assert_eq!(p.gallery.len(), 3);
        let orders: Vec<u32> = p.gallery.iter().map(|g| g.order).collect();
        assert_eq!(orders, [0, 1, 2]);
        assert_eq!(p.main_image.as_deref(), Some("/media/one.jpg"));
    }

    #[test]
    fn create_requires_title_and_location() {
        let mut input = property_input("x");
        input.title = " ".into();
        assert!(matches!(
            Property::create(input, fixed_now()),
            Err(RecordError::Invalid { field: "title", .. })
        ));

        let mut input = property_input("x");
        input.location = String::new();
        assert!(matches!(
            Property::create(input, fixed_now()),
            Err(RecordError::Invalid { field: "location", .. })
        ));
    }

    #[test]
    fn main_image_from_input_only_without_gallery() {
        let mut input = property_input("x");
        input.gallery.clear();
        input.main_image = Some("/media/cover.jpg".into());
        let p = Property::create(input, fixed_now()).unwrap();
        assert_eq!(p.main_image.as_deref(), Some("/media/cover.jpg"));

        let mut input = property_input("x");
        input.main_image = Some("/media/cover.jpg".into());
        let p = Property::create(input, fixed_now()).unwrap();
        assert_eq!(p.main_image.as_deref(), Some("/media/one.jpg"));
    }

    #[test]
    fn replace_keeps_gallery_ids_for_known_urls() {
        let p = Property::create(property_input("x"), fixed_now()).unwrap();
        let mut input = property_input("x");
        input.gallery = vec!["/media/three.jpg".into(), "/media/new.jpg".into()];

        let q = p.replace(input, fixed_now()).unwrap();

        assert_eq!(q.id, p.id);
        assert_eq!(q.created_at, p.created_at);
        assert_eq!(q.gallery[0].id, p.gallery[2].id);
        assert!(p.gallery.iter().all(|g| g.id != q.gallery[1].id));
        assert_eq!(q.main_image.as_deref(), Some("/media/three.jpg"));
    }

    #[test]
    fn repeated_url_keeps_distinct_ids_across_edits() {
        let mut input = property_input("x");
        input.gallery = vec![
            "/media/a.jpg".into(),
            "/media/a.jpg".into(),
            "/media/b.jpg".into(),
        ];
        let p = Property::create(input.clone(), fixed_now()).unwrap();
        let q = p.replace(input, fixed_now()).unwrap();

        assert_eq!(q.gallery_ids(), p.gallery_ids());
        assert_ne!(q.gallery[0].id, q.gallery[1].id);
    }

    #[test]
    fn gallery_ranks_follow_stored_order() {
        let p = Property::create(property_input("x"), fixed_now()).unwrap();
        let ranks: Vec<u32> = p.gallery_ranks().iter().map(|r| r.rank).collect();
        assert_eq!(ranks, [0, 1, 2]);
        assert_eq!(p.gallery_ranks()[2].id, p.gallery[2].id);
    }

    #[test]
    fn apply_gallery_order_renumbers_and_syncs_main() {
        let mut p = Property::create(property_input("x"), fixed_now()).unwrap();
        let ids = p.gallery_ids();
        p.apply_gallery_order(&[ids[2].clone(), ids[0].clone(), ids[1].clone()]);

        assert_eq!(p.gallery_ids(), vec![ids[2].clone(), ids[0].clone(), ids[1].clone()]);
        let orders: Vec<u32> = p.gallery.iter().map(|g| g.order).collect();
        assert_eq!(orders, [0, 1, 2]);
        assert_eq!(p.main_image.as_deref(), Some("/media/three.jpg"));
    }

    #[test]
    fn apply_gallery_order_keeps_unlisted_images() {
        let mut p = Property::create(property_input("x"), fixed_now()).unwrap();
        let ids = p.gallery_ids();
        p.apply_gallery_order(&[ids[1].clone(), DocId::from("ghost")]);
        assert_eq!(p.gallery_ids(), vec![ids[1].clone(), ids[0].clone(), ids[2].clone()]);
    }

    #[test]
    fn stored_json_without_arrays_defaults_to_empty() {
        let json = r#"{
            "id": "p1", "title": "T", "location": "L",
            "price": null, "property_type": null, "bedrooms": null,
            "bathrooms": null, "area_sqft": null, "main_image": null,
            "created_at": "2026-01-01T00:00:00Z", "updated_at": "2026-01-01T00:00:00Z"
        }"#;
        let p: Property = serde_json::from_str(json).unwrap();
        assert!(p.gallery.is_empty());
        assert!(p.features.is_empty());
        assert_eq!(p.status, PropertyStatus::ForSale);
    }
}
