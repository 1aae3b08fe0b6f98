//! Routes the marketing site calls without credentials.

use super::error::ApiError;
use super::state::AppState;
use crate::config::MAX_RECENT_LIMIT;
use crate::records::{
    BlogPost, BlogPostView, ChatConversation, ChatMessageInput, ChatRole, HomepageSettings, Lead,
    LeadSubmission, PortfolioItem, Property, PropertyStatus, most_recent, sort_portfolio,
};
use crate::types::DocId;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

/// GET /api/health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

/// GET /api/chat/conversations?limit=N
pub async fn list_conversations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<ChatConversation>>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(state.config.chat.recent_limit)
        .min(MAX_RECENT_LIMIT);
    let conversations = state
        .run_blocking(|s| Ok(s.store.list::<ChatConversation>()?))
        .await?;
    Ok(Json(most_recent(conversations, limit)))
}

/// POST /api/chat/messages
///
/// Messages posted here are always from the visitor.
pub async fn post_chat_message(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ChatMessageInput>,
) -> Result<(StatusCode, Json<ChatConversation>), ApiError> {
    let now = Utc::now();
    let message = input.to_message(ChatRole::Visitor, now)?;

    let conversation = state
        .run_blocking(move |s| {
            Ok(match &input.conversation_id {
                Some(id) => {
                    let mut conversation = s.store.get::<ChatConversation>(id)?;
                    conversation.append(message);
                    s.store.put(conversation)?
                }
                None => {
                    let conversation = ChatConversation::start(input.visitor, message, now);
                    tracing::info!(id = %conversation.id, "chat conversation started");
                    s.store.insert(conversation)?
                }
            })
        })
        .await?;
    Ok((StatusCode::CREATED, Json(conversation)))
}

/// POST /api/leads
pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    Json(submission): Json<LeadSubmission>,
) -> Result<(StatusCode, Json<Lead>), ApiError> {
    let lead = Lead::from_submission(submission, Utc::now())?;
    let lead = state.run_blocking(move |s| Ok(s.store.insert(lead)?)).await?;
    tracing::info!(id = %lead.id, kind = ?lead.kind, "lead received");
    Ok((StatusCode::CREATED, Json(lead)))
}

#[derive(Debug, Default, Deserialize)]
pub struct PropertyFilter {
    pub status: Option<PropertyStatus>,
    pub featured: Option<bool>,
}

/// GET /api/properties?status=&featured=
///
/// Newest first.
pub async fn list_properties(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<PropertyFilter>,
) -> Result<Json<Vec<Property>>, ApiError> {
    let mut properties: Vec<Property> = state
        .run_blocking(|s| Ok(s.store.list::<Property>()?))
        .await?
        .into_iter()
        .filter(|p| filter.status.is_none_or(|s| p.status == s))
        .filter(|p| filter.featured.is_none_or(|f| p.featured == f))
        .collect();
    properties.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(properties))
}

/// GET /api/properties/{id}
pub async fn get_property(
    State(state): State<Arc<AppState>>,
    Path(id): Path<DocId>,
) -> Result<Json<Property>, ApiError> {
    let property = state
        .run_blocking(move |s| Ok(s.store.get::<Property>(&id)?))
        .await?;
    Ok(Json(property))
}

/// GET /api/portfolio
pub async fn list_portfolio(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PortfolioItem>>, ApiError> {
    let mut items = state
        .run_blocking(|s| Ok(s.store.list::<PortfolioItem>()?))
        .await?;
    sort_portfolio(&mut items);
    Ok(Json(items))
}

/// Published posts, newest first.
async fn published_posts(state: &Arc<AppState>) -> Result<Vec<BlogPost>, ApiError> {
    let mut posts: Vec<BlogPost> = state
        .run_blocking(|s| Ok(s.store.list::<BlogPost>()?))
        .await?
        .into_iter()
        .filter(|p| p.published)
        .collect();
    posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    Ok(posts)
}

/// GET /api/blog
pub async fn list_blog(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BlogPostView>>, ApiError> {
    let posts = published_posts(&state).await?;
    Ok(Json(posts.into_iter().map(BlogPostView::from).collect()))
}

/// GET /api/blog/{slug}
pub async fn get_blog_post(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<BlogPostView>, ApiError> {
    published_posts(&state)
        .await?
        .into_iter()
        .find(|p| p.slug == slug)
        .map(|p| Json(BlogPostView::from(p)))
        .ok_or_else(|| ApiError::NotFound(format!("blog post '{slug}'")))
}

/// GET /api/homepage
///
/// Placeholder settings until an admin saves some.
pub async fn get_homepage(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HomepageSettings>, ApiError> {
    let settings = state
        .run_blocking(|s| Ok(s.store.singleton::<HomepageSettings>()?))
        .await?
        .unwrap_or_else(|| HomepageSettings::placeholder(Utc::now()));
    Ok(Json(settings))
}
