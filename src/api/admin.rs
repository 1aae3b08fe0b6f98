//! Back-office routes under `/api/admin`. All of them sit behind
//! [`require_admin`](super::auth::require_admin).

use super::error::ApiError;
use super::state::AppState;
use crate::gallery::{CommandKey, PersistReport, RankUpdate, ReorderCommand, ReorderScope, persist};
use crate::imaging::{Compression, FileOutcome, OutputFormat, compress_batch};
use crate::media::{MediaEntry, MediaError, list_media, save_media};
use crate::records::{
    BlogPost, BlogPostInput, BlogPostView, HomepageInput, HomepageSettings, Lead, PortfolioInput,
    PortfolioItem, Property, PropertyInput, RecordError, portfolio_ranks,
};
use crate::types::{DocId, UploadFile, mime_for_name};
use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// =========================================================================
// Reordering
// =========================================================================

/// Body of a drag-and-drop move.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub dragged: DocId,
    pub target: DocId,
    /// Resend the same id when retrying so the move is applied once.
    #[serde(default)]
    pub command_id: Option<CommandKey>,
}

/// The new order is returned even when saving it failed.
#[derive(Debug, Serialize)]
pub struct ReorderResponse {
    pub order: Vec<DocId>,
    pub primary: Option<DocId>,
    #[serde(flatten)]
    pub report: PersistReport,
}

fn apply_reorder(
    state: &AppState,
    scope: ReorderScope,
    current: Vec<RankUpdate>,
    request: ReorderRequest,
) -> ReorderResponse {
    let Some(command) = ReorderCommand::plan(
        scope,
        &current,
        &request.dragged,
        &request.target,
        request.command_id,
    ) else {
        let order: Vec<DocId> = current.into_iter().map(|r| r.id).collect();
        return ReorderResponse {
            primary: order.first().cloned(),
            order,
            report: PersistReport {
                persisted: true,
                outcome: None,
                warning: None,
            },
        };
    };

    let report = persist(&state.store, &command);
    ReorderResponse {
        order: command.order,
        primary: command.primary,
        report,
    }
}

/// POST /api/admin/properties/{id}/gallery/reorder
pub async fn reorder_gallery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<DocId>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<ReorderResponse>, ApiError> {
    let response = state
        .run_blocking(move |s| {
            let property = s.store.get::<Property>(&id)?;
            let scope = ReorderScope::Gallery {
                property_id: property.id.clone(),
            };
            Ok(apply_reorder(s, scope, property.gallery_ranks(), request))
        })
        .await?;
    Ok(Json(response))
}

/// POST /api/admin/portfolio/reorder
pub async fn reorder_portfolio(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<ReorderResponse>, ApiError> {
    let response = state
        .run_blocking(move |s| {
            let current = portfolio_ranks(s.store.list::<PortfolioItem>()?);
            Ok(apply_reorder(s, ReorderScope::Portfolio, current, request))
        })
        .await?;
    Ok(Json(response))
}

// =========================================================================
// Properties
// =========================================================================

/// POST /api/admin/properties
pub async fn create_property(
    State(state): State<Arc<AppState>>,
    Json(input): Json<PropertyInput>,
) -> Result<(StatusCode, Json<Property>), ApiError> {
    let property = Property::create(input, Utc::now())?;
    let property = state
        .run_blocking(move |s| Ok(s.store.insert(property)?))
        .await?;
    tracing::info!(id = %property.id, title = %property.title, "property created");
    Ok((StatusCode::CREATED, Json(property)))
}

/// PUT /api/admin/properties/{id}
pub async fn update_property(
    State(state): State<Arc<AppState>>,
    Path(id): Path<DocId>,
    Json(input): Json<PropertyInput>,
) -> Result<Json<Property>, ApiError> {
    let updated = state
        .run_blocking(move |s| {
            let updated = s.store.get::<Property>(&id)?.replace(input, Utc::now())?;
            Ok(s.store.put(updated)?)
        })
        .await?;
    Ok(Json(updated))
}

/// DELETE /api/admin/properties/{id}
pub async fn delete_property(
    State(state): State<Arc<AppState>>,
    Path(id): Path<DocId>,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .run_blocking(move |s| Ok(s.store.delete::<Property>(&id)?))
        .await?;
    tracing::info!(id = %deleted.id, "property deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =========================================================================
// Portfolio
// =========================================================================

/// POST /api/admin/portfolio
pub async fn create_portfolio_item(
    State(state): State<Arc<AppState>>,
    Json(input): Json<PortfolioInput>,
) -> Result<(StatusCode, Json<PortfolioItem>), ApiError> {
    let item = state
        .run_blocking(move |s| {
            let next_order = s
                .store
                .list::<PortfolioItem>()?
                .iter()
                .map(|i| i.order + 1)
                .max()
                .unwrap_or(0);
            let item = PortfolioItem::create(input, next_order, Utc::now())?;
            Ok(s.store.insert(item)?)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /api/admin/portfolio/{id}
pub async fn update_portfolio_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<DocId>,
    Json(input): Json<PortfolioInput>,
) -> Result<Json<PortfolioItem>, ApiError> {
    let updated = state
        .run_blocking(move |s| {
            let updated = s.store.get::<PortfolioItem>(&id)?.replace(input, Utc::now())?;
            Ok(s.store.put(updated)?)
        })
        .await?;
    Ok(Json(updated))
}

/// DELETE /api/admin/portfolio/{id}
pub async fn delete_portfolio_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<DocId>,
) -> Result<StatusCode, ApiError> {
    state
        .run_blocking(move |s| Ok(s.store.delete::<PortfolioItem>(&id)?))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =========================================================================
// Blog
// =========================================================================

fn ensure_unique_slug(state: &AppState, post: &BlogPost) -> Result<(), ApiError> {
    let taken = state
        .store
        .list::<BlogPost>()?
        .iter()
        .any(|p| p.slug == post.slug && p.id != post.id);
    if taken {
        return Err(RecordError::invalid("slug", format!("'{}' is already in use", post.slug)).into());
    }
    Ok(())
}

/// GET /api/admin/blog
///
/// Drafts included, most recently edited first.
pub async fn list_blog_posts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BlogPostView>>, ApiError> {
    let mut posts = state
        .run_blocking(|s| Ok(s.store.list::<BlogPost>()?))
        .await?;
    posts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    Ok(Json(posts.into_iter().map(BlogPostView::from).collect()))
}

/// POST /api/admin/blog
pub async fn create_blog_post(
    State(state): State<Arc<AppState>>,
    Json(input): Json<BlogPostInput>,
) -> Result<(StatusCode, Json<BlogPostView>), ApiError> {
    let post = BlogPost::create(input, Utc::now())?;
    let post = state
        .run_blocking(move |s| {
            ensure_unique_slug(s, &post)?;
            Ok(s.store.insert(post)?)
        })
        .await?;
    tracing::info!(id = %post.id, slug = %post.slug, published = post.published, "blog post created");
    Ok((StatusCode::CREATED, Json(post.into())))
}

/// PUT /api/admin/blog/{id}
pub async fn update_blog_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<DocId>,
    Json(input): Json<BlogPostInput>,
) -> Result<Json<BlogPostView>, ApiError> {
    let updated = state
        .run_blocking(move |s| {
            let updated = s.store.get::<BlogPost>(&id)?.replace(input, Utc::now())?;
            ensure_unique_slug(s, &updated)?;
            Ok(s.store.put(updated)?)
        })
        .await?;
    Ok(Json(updated.into()))
}

/// DELETE /api/admin/blog/{id}
pub async fn delete_blog_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<DocId>,
) -> Result<StatusCode, ApiError> {
    state
        .run_blocking(move |s| Ok(s.store.delete::<BlogPost>(&id)?))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =========================================================================
// Homepage and leads
// =========================================================================

/// PUT /api/admin/homepage
pub async fn update_homepage(
    State(state): State<Arc<AppState>>,
    Json(input): Json<HomepageInput>,
) -> Result<Json<HomepageSettings>, ApiError> {
    let settings = HomepageSettings::from_input(input, Utc::now())?;
    let saved = state
        .run_blocking(move |s| {
            for id in &settings.featured_property_ids {
                s.store.get::<Property>(id)?;
            }
            Ok(s.store.put_singleton(settings)?)
        })
        .await?;
    Ok(Json(saved))
}

/// GET /api/admin/leads
pub async fn list_leads(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Lead>>, ApiError> {
    let mut leads = state
        .run_blocking(|s| Ok(s.store.list::<Lead>()?))
        .await?;
    leads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(leads))
}

// =========================================================================
// Media
// =========================================================================

/// Per-file result of an upload.
#[derive(Debug, Serialize)]
pub struct UploadResult {
    pub name: String,
    pub original_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaEntry>,
    /// Output format when the file was re-encoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadResult {
    fn failed(name: String, original_size: usize, error: String) -> Self {
        Self {
            name,
            original_size,
            media: None,
            format: None,
            error: Some(error),
        }
    }
}

fn store_outcome(
    state: &AppState,
    outcome: FileOutcome,
    original_size: usize,
) -> Result<UploadResult, MediaError> {
    let compressed = match outcome.result {
        Ok(compressed) => compressed,
        Err(e) => return Ok(UploadResult::failed(outcome.name, original_size, e.to_string())),
    };
    let media = match save_media(state.media_dir(), &compressed.file) {
        Ok(media) => media,
        Err(e @ MediaError::NotAnImage { .. }) => {
            tracing::warn!(name = %outcome.name, "upload rejected: {e}");
            return Ok(UploadResult::failed(outcome.name, original_size, e.to_string()));
        }
        Err(e) => return Err(e),
    };
    let format = match compressed.compression {
        Compression::Unchanged => None,
        Compression::Reencoded { format, .. } => Some(format),
    };
    Ok(UploadResult {
        name: outcome.name,
        original_size,
        media: Some(media),
        format,
        error: None,
    })
}

/// Compress and store a batch. Runs on a blocking thread.
///
/// Files not declared as `image/*` are refused up front; results keep the
/// upload order.
fn process_uploads(
    state: &AppState,
    files: Vec<UploadFile>,
) -> Result<Vec<UploadResult>, MediaError> {
    let sizes: Vec<usize> = files.iter().map(UploadFile::size).collect();
    let mut results: Vec<Option<UploadResult>> = files.iter().map(|_| None).collect();
    let mut accepted = Vec::with_capacity(files.len());
    let mut positions = Vec::with_capacity(files.len());
    for (i, file) in files.into_iter().enumerate() {
        if file.mime.to_ascii_lowercase().starts_with("image/") {
            positions.push(i);
            accepted.push(file);
        } else {
            let error = MediaError::NotAnImage {
                name: file.name.clone(),
                mime: file.mime,
            };
            tracing::warn!(name = %file.name, "upload rejected: {error}");
            results[i] = Some(UploadResult::failed(file.name, sizes[i], error.to_string()));
        }
    }

    for outcome in compress_batch(&state.backend, accepted, &state.compression, None) {
        let i = positions[outcome.index];
        results[i] = Some(store_outcome(state, outcome, sizes[i])?);
    }
    Ok(results.into_iter().flatten().collect())
}

/// POST /api/admin/media
///
/// Multipart with one or more `file` fields. Answers 422 when no file in
/// the batch could be stored.
pub async fn upload_media(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<UploadResult>>), ApiError> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("upload").to_string();
        let mime = field
            .content_type()
            .unwrap_or_else(|| mime_for_name(&name))
            .to_string();
        let data = field.bytes().await?;
        files.push(UploadFile::new(name, mime, data.to_vec()));
    }
    if files.is_empty() {
        return Err(ApiError::BadRequest(
            "expected one or more 'file' fields".into(),
        ));
    }

    let count = files.len();
    let results = state
        .run_blocking(move |s| Ok(process_uploads(s, files)?))
        .await?;

    let failed = results.iter().filter(|r| r.error.is_some()).count();
    tracing::info!(files = count, failed, "upload batch processed");
    let status = if failed == count {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    };
    Ok((status, Json(results)))
}

/// GET /api/admin/media
pub async fn list_media_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MediaEntry>>, ApiError> {
    let entries = state
        .run_blocking(|s| Ok(list_media(s.media_dir())?))
        .await?;
    Ok(Json(entries))
}
