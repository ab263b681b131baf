/// Comment handlers - HTTP endpoints for comment operations.
use crate::error::Result;
use crate::middleware::Identity;
use crate::services::CommentService;
use crate::store::{ContentStore, UserDirectory};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

/// Request body for creating a comment
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub text: String,
}

/// Request body for editing a comment
#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    #[serde(rename = "newText")]
    pub new_text: String,
}

/// Append a comment to a post
pub async fn create_comment(
    store: web::Data<dyn ContentStore>,
    users: web::Data<dyn UserDirectory>,
    identity: Identity,
    post_id: web::Path<Uuid>,
    req: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    let service = CommentService::new(store.into_inner(), users.into_inner());
    let comment = service
        .add_comment(&identity, *post_id, req.into_inner().text)
        .await?;

    Ok(HttpResponse::Created().json(comment))
}

/// Edit a comment (comment author only)
pub async fn update_comment(
    store: web::Data<dyn ContentStore>,
    users: web::Data<dyn UserDirectory>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
    req: web::Json<UpdateCommentRequest>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();

    let service = CommentService::new(store.into_inner(), users.into_inner());
    let comment = service
        .edit_comment(&identity, post_id, comment_id, req.into_inner().new_text)
        .await?;

    Ok(HttpResponse::Ok().json(comment))
}

/// Delete a comment (comment author only)
pub async fn delete_comment(
    store: web::Data<dyn ContentStore>,
    users: web::Data<dyn UserDirectory>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();

    let service = CommentService::new(store.into_inner(), users.into_inner());
    service
        .delete_comment(&identity, post_id, comment_id)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "comment deleted"
    })))
}
