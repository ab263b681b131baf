/// Post service: creation, reads, author-only edit/delete, and like toggling.
use crate::error::{AppError, Result};
use crate::middleware::Identity;
use crate::models::{validate_tags, Category, NewPost, Post, PostPatch, PostView};
use crate::services::{render_post, render_posts};
use crate::store::{ContentStore, LikeToggle, Mutation, UserDirectory};
use std::sync::Arc;
use uuid::Uuid;

pub struct PostService {
    store: Arc<dyn ContentStore>,
    users: Arc<dyn UserDirectory>,
}

impl PostService {
    pub fn new(store: Arc<dyn ContentStore>, users: Arc<dyn UserDirectory>) -> Self {
        Self { store, users }
    }

    /// Create a post authored by the caller. All validation happens before
    /// the store is touched.
    pub async fn create_post(
        &self,
        identity: &Identity,
        title: String,
        content: String,
        category: Category,
        tags: Vec<String>,
    ) -> Result<Post> {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::ValidationError("title is required".to_string()));
        }
        if content.trim().is_empty() {
            return Err(AppError::ValidationError("content is required".to_string()));
        }
        validate_tags(&tags).map_err(AppError::ValidationError)?;

        self.store
            .insert_post(NewPost {
                author_id: identity.user_id,
                title,
                content,
                category,
                tags,
            })
            .await
    }

    /// Public read of a single post, authors resolved to usernames.
    pub async fn get_post(&self, post_id: Uuid) -> Result<PostView> {
        let post = self
            .store
            .fetch_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("post not found".to_string()))?;
        render_post(self.users.as_ref(), post).await
    }

    /// Author-only partial update. The tag rule is checked before the post
    /// is even loaded, so a bad patch fails 400 regardless of the target.
    pub async fn edit_post(
        &self,
        identity: &Identity,
        post_id: Uuid,
        patch: PostPatch,
    ) -> Result<PostView> {
        if let Some(tags) = &patch.tags {
            validate_tags(tags).map_err(AppError::ValidationError)?;
        }

        match self.store.update_post(post_id, identity.user_id, patch).await? {
            Mutation::Applied(post) => render_post(self.users.as_ref(), post).await,
            Mutation::Missing => Err(AppError::NotFound("post not found".to_string())),
            Mutation::Denied => Err(AppError::Forbidden(
                "you do not have permission to edit this post".to_string(),
            )),
        }
    }

    /// Author-only delete; embedded comments and likes go with the post.
    pub async fn delete_post(&self, identity: &Identity, post_id: Uuid) -> Result<()> {
        match self.store.delete_post(post_id, identity.user_id).await? {
            Mutation::Applied(()) => Ok(()),
            Mutation::Missing => Err(AppError::NotFound("post not found".to_string())),
            Mutation::Denied => Err(AppError::Forbidden(
                "you do not have permission to delete this post".to_string(),
            )),
        }
    }

    /// Flip the caller's like on a post. Any authenticated user; a user only
    /// ever toggles their own membership.
    pub async fn toggle_like(&self, identity: &Identity, post_id: Uuid) -> Result<LikeToggle> {
        self.store
            .toggle_like(post_id, identity.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("post not found".to_string()))
    }

    /// Explicitly remove the caller's like; rejected when nothing to remove.
    pub async fn unlike(&self, identity: &Identity, post_id: Uuid) -> Result<()> {
        match self.store.remove_like(post_id, identity.user_id).await? {
            Some(true) => Ok(()),
            Some(false) => Err(AppError::BadRequest(
                "you have not liked this post".to_string(),
            )),
            None => Err(AppError::NotFound("post not found".to_string())),
        }
    }

    /// The caller's own posts, newest first.
    pub async fn posts_by_author(&self, identity: &Identity) -> Result<Vec<PostView>> {
        let posts = self.store.posts_by_author(identity.user_id).await?;
        render_posts(self.users.as_ref(), posts).await
    }

    /// Posts the caller currently likes.
    pub async fn liked_posts(&self, identity: &Identity) -> Result<Vec<PostView>> {
        let posts = self.store.posts_liked_by(identity.user_id).await?;
        render_posts(self.users.as_ref(), posts).await
    }
}
