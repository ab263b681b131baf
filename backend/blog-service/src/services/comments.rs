/// Comment service: append by any authenticated user, edit/delete by the
/// comment's author only.
use crate::error::{AppError, Result};
use crate::middleware::Identity;
use crate::models::{Comment, CommentView};
use crate::store::{ContentStore, Mutation, UserDirectory};
use std::sync::Arc;
use uuid::Uuid;

pub struct CommentService {
    store: Arc<dyn ContentStore>,
    users: Arc<dyn UserDirectory>,
}

impl CommentService {
    pub fn new(store: Arc<dyn ContentStore>, users: Arc<dyn UserDirectory>) -> Self {
        Self { store, users }
    }

    async fn render(&self, comment: Comment) -> Result<CommentView> {
        let usernames = self.users.username_map(&[comment.author_id]).await?;
        Ok(CommentView::assemble(comment, &usernames))
    }

    /// Append a comment authored by the caller.
    pub async fn add_comment(
        &self,
        identity: &Identity,
        post_id: Uuid,
        text: String,
    ) -> Result<CommentView> {
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(AppError::ValidationError(
                "comment text is required".to_string(),
            ));
        }

        let comment = self
            .store
            .insert_comment(post_id, identity.user_id, text)
            .await?
            .ok_or_else(|| AppError::NotFound("post not found".to_string()))?;

        self.render(comment).await
    }

    /// Replace a comment's text; comment author only.
    pub async fn edit_comment(
        &self,
        identity: &Identity,
        post_id: Uuid,
        comment_id: Uuid,
        new_text: String,
    ) -> Result<CommentView> {
        let new_text = new_text.trim().to_string();
        if new_text.is_empty() {
            return Err(AppError::ValidationError(
                "comment text is required".to_string(),
            ));
        }

        match self
            .store
            .update_comment(post_id, comment_id, identity.user_id, new_text)
            .await?
        {
            Mutation::Applied(comment) => self.render(comment).await,
            Mutation::Missing => Err(AppError::NotFound("comment not found".to_string())),
            Mutation::Denied => Err(AppError::Forbidden(
                "you do not have permission to edit this comment".to_string(),
            )),
        }
    }

    /// Remove a comment; comment author only.
    pub async fn delete_comment(
        &self,
        identity: &Identity,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<()> {
        match self
            .store
            .delete_comment(post_id, comment_id, identity.user_id)
            .await?
        {
            Mutation::Applied(()) => Ok(()),
            Mutation::Missing => Err(AppError::NotFound("comment not found".to_string())),
            Mutation::Denied => Err(AppError::Forbidden(
                "you do not have permission to delete this comment".to_string(),
            )),
        }
    }
}
