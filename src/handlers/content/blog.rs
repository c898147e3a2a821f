use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::api::{validate_slug, validate_timestamp, Page, PageQuery, Payload};
use crate::app::AppState;
use crate::database::models::BlogPost;
use crate::database::{Fields, Repository};
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::filter::SortDirection;
use crate::middleware::{ApiResponse, Authenticated};
use crate::types::now_timestamp;

#[derive(Debug, Default, Deserialize)]
pub struct BlogQuery {
    pub tag: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

/// GET /api/blog - published posts, newest first
pub async fn list(State(state): State<AppState>, Query(query): Query<BlogQuery>) -> ApiResult<impl IntoResponse> {
    let page = Page::from_query(&query.page, &state.config.api)?;
    let repo = Repository::<BlogPost>::new(&state.store);
    let mut filter = repo.filter()?;
    filter.where_eq("is_published", json!(true))?;
    if let Some(tag) = query.tag.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        // Tags are stored as a JSON array, so match the encoded element
        filter.search(&["search_tags"], &Value::from(tag).to_string())?;
    }
    filter
        .order("published_at", SortDirection::Desc)?
        .order("id", SortDirection::Desc)?
        .limit(page.limit, Some(page.offset))?;
    Ok(ApiResponse::success(repo.list(filter).await?))
}

/// GET /api/blog/:slug - drafts are not visible
pub async fn get(State(state): State<AppState>, Path(slug): Path<String>) -> ApiResult<impl IntoResponse> {
    let repo = Repository::<BlogPost>::new(&state.store);
    let mut filter = repo.filter()?;
    filter
        .where_eq("slug", json!(slug.trim()))?
        .where_eq("is_published", json!(true))?;
    let post = repo
        .find_one(filter)
        .await?
        .ok_or_else(|| ApiError::not_found(ErrorCode::PostNotFound, "Post not found"))?;
    Ok(ApiResponse::success(post))
}

/// POST /api/blog
pub async fn post(
    Authenticated(identity): Authenticated,
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let payload = Payload::from_body(body)?;
    let slug = validate_slug(&payload.require("slug")?)?;
    let title = payload.require("title")?;
    let excerpt = payload.require("excerpt")?;
    let content = payload.require("content")?;
    let author = payload.optional_str("author")?.unwrap_or_else(|| identity.user.name.clone());
    let cover_image = payload.optional_str("coverImage")?;
    let tags = payload.optional_str_list("tags")?.unwrap_or_default();
    let is_published = payload.optional_bool("isPublished")?.unwrap_or(false);
    let published_at = match payload.optional_str("publishedAt")? {
        Some(at) => Some(validate_timestamp("publishedAt", &at)?),
        None if is_published => Some(now_timestamp()),
        None => None,
    };

    let fields = Fields::new()
        .set("slug", slug.clone())
        .set("title", title)
        .set("excerpt", excerpt)
        .set("content", content)
        .set("author", author)
        .set("cover_image", cover_image)
        .set("tags", tags)
        .set("is_published", is_published)
        .set("published_at", published_at);

    let post = match Repository::<BlogPost>::new(&state.store).insert(fields).await {
        Ok(post) => post,
        Err(e) if e.is_unique_violation() => {
            return Err(ApiError::conflict(ErrorCode::SlugTaken, format!("Slug '{}' is already in use", slug)))
        }
        Err(e) => return Err(e.into()),
    };

    info!(post_id = post.id, slug = %post.slug, user_id = identity.user.id, "blog_post_created");
    Ok(ApiResponse::created(post))
}
