/// Feed service: the public listing and its combined filter.
use crate::error::{AppError, Result};
use crate::models::{Category, FeedFilter, PostView};
use crate::services::render_posts;
use crate::store::{ContentStore, UserDirectory};
use std::sync::Arc;

pub struct FeedService {
    store: Arc<dyn ContentStore>,
    users: Arc<dyn UserDirectory>,
}

impl FeedService {
    pub fn new(store: Arc<dyn ContentStore>, users: Arc<dyn UserDirectory>) -> Self {
        Self { store, users }
    }

    /// Combine the present predicates into one filter. The username is
    /// resolved to an author id up front: an unknown username is NotFound,
    /// not an empty listing.
    pub async fn build_filter(
        &self,
        search: Option<String>,
        category: Option<Category>,
        username: Option<String>,
    ) -> Result<FeedFilter> {
        let author_id = match username.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            Some(name) => Some(
                self.users
                    .find_user_id(name)
                    .await?
                    .ok_or_else(|| AppError::NotFound("user not found".to_string()))?,
            ),
            None => None,
        };

        Ok(FeedFilter {
            search: search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            category,
            author_id,
        })
    }

    /// Public feed listing, newest first, usernames resolved.
    pub async fn list(
        &self,
        search: Option<String>,
        category: Option<Category>,
        username: Option<String>,
    ) -> Result<Vec<PostView>> {
        let filter = self.build_filter(search, category, username).await?;
        let posts = self.store.list_posts(&filter).await?;
        render_posts(self.users.as_ref(), posts).await
    }
}
