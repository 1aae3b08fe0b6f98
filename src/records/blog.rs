//! Blog posts with markdown bodies.

use super::{Collection, RecordError, optional, required};
use crate::types::DocId;
use chrono::{DateTime, Utc};
use pulldown_cmark::{Options, Parser, html};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: DocId,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: String,
    /// Markdown source.
    pub body: String,
    pub cover_image: Option<String>,
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Collection for BlogPost {
    const NAME: &'static str = "blog";

    fn id(&self) -> &DocId {
        &self.id
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BlogPostInput {
    pub title: String,
    /// Derived from the title when blank.
    pub slug: Option<String>,
    pub excerpt: String,
    pub body: String,
    pub cover_image: Option<String>,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub published: bool,
}

/// Response shape: the post plus its rendered HTML.
#[derive(Debug, Clone, Serialize)]
pub struct BlogPostView {
    #[serde(flatten)]
    pub post: BlogPost,
    pub body_html: String,
}

impl From<BlogPost> for BlogPostView {
    fn from(post: BlogPost) -> Self {
        let body_html = render_markdown(&post.body);
        Self { post, body_html }
    }
}

impl BlogPost {
    pub fn create(input: BlogPostInput, now: DateTime<Utc>) -> Result<Self, RecordError> {
        Self::build(DocId::generate(), input, None, now, now)
    }

    /// Replace editable fields. The first publish time sticks across edits.
    pub fn replace(&self, input: BlogPostInput, now: DateTime<Utc>) -> Result<Self, RecordError> {
        Self::build(self.id.clone(), input, self.published_at, self.created_at, now)
    }

    fn build(
        id: DocId,
        input: BlogPostInput,
        published_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, RecordError> {
        let title = required("title", &input.title)?;
        let slug = match optional(input.slug) {
            Some(s) => slugify(&s),
            None => slugify(&title),
        };
        if slug.is_empty() {
            return Err(RecordError::invalid(
                "slug",
                "needs at least one letter or digit",
            ));
        }
        let published_at = if input.published {
            published_at.or(Some(updated_at))
        } else {
            published_at
        };
        Ok(Self {
            id,
            title,
            slug,
            excerpt: input.excerpt.trim().to_string(),
            body: input.body,
            cover_image: optional(input.cover_image),
            author: optional(input.author),
            tags: input
                .tags
                .into_iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            published: input.published,
            published_at,
            created_at,
            updated_at,
        })
    }
}

/// URL slug: lowercase ASCII letters and digits separated by single dashes.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Render markdown to HTML (tables, strikethrough and footnotes enabled).
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}
