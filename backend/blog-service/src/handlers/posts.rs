/// Post handlers - HTTP endpoints for post operations.
use crate::error::{AppError, Result};
use crate::middleware::Identity;
use crate::models::{non_blank, parse_tags_csv, Category, PostPatch};
use crate::services::PostService;
use crate::store::{ContentStore, UserDirectory};
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub category: Category,
    #[serde(rename = "tagsCsv", default)]
    pub tags_csv: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<Category>,
    #[serde(rename = "tagsCsv", default)]
    pub tags_csv: Option<String>,
}

impl UpdatePostRequest {
    /// Canonicalize into a patch: omitted and blank both mean "unchanged",
    /// which is the documented merge policy of this API.
    fn into_patch(self) -> PostPatch {
        PostPatch {
            title: non_blank(self.title),
            content: non_blank(self.content),
            category: self.category,
            tags: self
                .tags_csv
                .as_deref()
                .map(parse_tags_csv)
                .filter(|tags| !tags.is_empty()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedPost {
    pub id: Uuid,
}

/// Create a new post
pub async fn create_post(
    store: web::Data<dyn ContentStore>,
    users: web::Data<dyn UserDirectory>,
    identity: Identity,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let tags = parse_tags_csv(req.tags_csv.as_deref().unwrap_or_default());

    let service = PostService::new(store.into_inner(), users.into_inner());
    let post = service
        .create_post(&identity, req.title, req.content, req.category, tags)
        .await?;

    Ok(HttpResponse::Created().json(CreatedPost { id: post.id }))
}

/// Get a post by ID (public)
pub async fn get_post(
    store: web::Data<dyn ContentStore>,
    users: web::Data<dyn UserDirectory>,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = PostService::new(store.into_inner(), users.into_inner());
    let post = service.get_post(*post_id).await?;

    Ok(HttpResponse::Ok().json(post))
}

/// Update a post (author only)
pub async fn update_post(
    store: web::Data<dyn ContentStore>,
    users: web::Data<dyn UserDirectory>,
    identity: Identity,
    post_id: web::Path<Uuid>,
    req: web::Json<UpdatePostRequest>,
) -> Result<HttpResponse> {
    let service = PostService::new(store.into_inner(), users.into_inner());
    let post = service
        .edit_post(&identity, *post_id, req.into_inner().into_patch())
        .await?;

    Ok(HttpResponse::Ok().json(post))
}

/// Delete a post (author only)
pub async fn delete_post(
    store: web::Data<dyn ContentStore>,
    users: web::Data<dyn UserDirectory>,
    identity: Identity,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = PostService::new(store.into_inner(), users.into_inner());
    service.delete_post(&identity, *post_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "post deleted"
    })))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub like_count: i64,
    pub liked_by_caller: bool,
}

/// Toggle the caller's like on a post
pub async fn toggle_like(
    store: web::Data<dyn ContentStore>,
    users: web::Data<dyn UserDirectory>,
    identity: Identity,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = PostService::new(store.into_inner(), users.into_inner());
    let toggle = service.toggle_like(&identity, *post_id).await?;

    Ok(HttpResponse::Ok().json(LikeResponse {
        like_count: toggle.like_count,
        liked_by_caller: toggle.liked,
    }))
}

/// Remove the caller's like from a post
pub async fn unlike(
    store: web::Data<dyn ContentStore>,
    users: web::Data<dyn UserDirectory>,
    identity: Identity,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = PostService::new(store.into_inner(), users.into_inner());
    service.unlike(&identity, *post_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "post unliked"
    })))
}

fn require_self(identity: &Identity, user_id: Uuid) -> Result<()> {
    if identity.user_id != user_id {
        return Err(AppError::Forbidden(
            "you may only list your own posts".to_string(),
        ));
    }
    Ok(())
}

/// Posts authored by the caller
pub async fn get_user_posts(
    store: web::Data<dyn ContentStore>,
    users: web::Data<dyn UserDirectory>,
    identity: Identity,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    require_self(&identity, *user_id)?;

    let service = PostService::new(store.into_inner(), users.into_inner());
    let posts = service.posts_by_author(&identity).await?;

    Ok(HttpResponse::Ok().json(posts))
}

/// Posts the caller has liked
pub async fn get_user_liked_posts(
    store: web::Data<dyn ContentStore>,
    users: web::Data<dyn UserDirectory>,
    identity: Identity,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    require_self(&identity, *user_id)?;

    let service = PostService::new(store.into_inner(), users.into_inner());
    let posts = service.liked_posts(&identity).await?;

    Ok(HttpResponse::Ok().json(posts))
}
