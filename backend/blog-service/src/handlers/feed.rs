/// Feed handler - the public post listing with its combined filter.
use crate::error::Result;
use crate::models::Category;
use crate::services::FeedService;
use crate::store::{ContentStore, UserDirectory};
use actix_web::{web, HttpResponse};
use serde::Deserialize;

/// Query parameters of the public feed
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub search: Option<String>,
    pub category: Option<Category>,
    pub username: Option<String>,
}

/// List posts, optionally filtered by search term, category, and author
/// username (public)
pub async fn list_posts(
    store: web::Data<dyn ContentStore>,
    users: web::Data<dyn UserDirectory>,
    query: web::Query<FeedQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();

    let service = FeedService::new(store.into_inner(), users.into_inner());
    let posts = service
        .list(query.search, query.category, query.username)
        .await?;

    Ok(HttpResponse::Ok().json(posts))
}
