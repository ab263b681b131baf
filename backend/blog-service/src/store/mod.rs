/// Storage traits for the blog service.
///
/// Services never touch a database handle directly; they are handed a
/// [`ContentStore`] and a [`UserDirectory`], which makes every consumer
/// testable against the in-memory implementation and keeps all persistence
/// atomicity concerns in one layer.
///
/// Ownership-gated mutations resolve to a [`Mutation`] so the caller can
/// distinguish "no such record" from "record exists, wrong owner" without a
/// separate read; the ownership predicate is evaluated atomically with the
/// mutation itself.
pub mod memory;
pub mod postgres;

use crate::error::Result;
use crate::models::{Comment, FeedFilter, NewPost, Post, PostPatch};
use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

/// Outcome of a mutation that requires the acting user to own the record.
#[derive(Debug)]
pub enum Mutation<T> {
    /// Mutation applied; payload is the record's new state.
    Applied(T),
    /// Target record does not exist.
    Missing,
    /// Target exists but is owned by someone else; nothing was changed.
    Denied,
}

/// Result of a like toggle: the caller's new membership state and the
/// post's like count after the flip.
#[derive(Debug, Clone, Copy)]
pub struct LikeToggle {
    pub liked: bool,
    pub like_count: i64,
}

/// Persistence operations over posts and their embedded likes and comments.
///
/// Like and comment mutations are atomic per post record: implementations
/// must not read membership and write it back in separate steps.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Persist a new post with empty likes and comments.
    async fn insert_post(&self, draft: NewPost) -> Result<Post>;

    /// Fetch a post with its like set and comments, or `None`.
    async fn fetch_post(&self, post_id: Uuid) -> Result<Option<Post>>;

    /// Apply a partial update if `author_id` owns the post. Fields absent
    /// from the patch keep their stored values.
    async fn update_post(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        patch: PostPatch,
    ) -> Result<Mutation<Post>>;

    /// Delete a post if `author_id` owns it, cascading likes and comments.
    async fn delete_post(&self, post_id: Uuid, author_id: Uuid) -> Result<Mutation<()>>;

    /// List posts matching the filter, newest first.
    async fn list_posts(&self, filter: &FeedFilter) -> Result<Vec<Post>>;

    /// All posts authored by a user, newest first.
    async fn posts_by_author(&self, author_id: Uuid) -> Result<Vec<Post>>;

    /// All posts the user currently likes.
    async fn posts_liked_by(&self, user_id: Uuid) -> Result<Vec<Post>>;

    /// Flip the user's membership in the post's like set: insert if absent,
    /// remove if present, as one conditional mutation. `None` if the post
    /// does not exist.
    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<LikeToggle>>;

    /// Remove the user's like. `Some(true)` removed, `Some(false)` the user
    /// had not liked the post, `None` no such post.
    async fn remove_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<bool>>;

    /// Append a comment to a post. `None` if the post does not exist.
    async fn insert_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        body: String,
    ) -> Result<Option<Comment>>;

    /// Replace a comment's text if `author_id` wrote it.
    async fn update_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        author_id: Uuid,
        body: String,
    ) -> Result<Mutation<Comment>>;

    /// Remove a comment if `author_id` wrote it.
    async fn delete_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        author_id: Uuid,
    ) -> Result<Mutation<()>>;
}

/// Read-only lookup into the account system owned by the identity service.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolve a username to its user id.
    async fn find_user_id(&self, username: &str) -> Result<Option<Uuid>>;

    /// Resolve a batch of user ids to usernames. Ids with no account are
    /// simply absent from the result.
    async fn username_map(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, String>>;
}
