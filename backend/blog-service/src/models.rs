/// Data models for the blog service.
///
/// Domain types carry the embedded shape of a post (its like set and ordered
/// comments) regardless of which store backs them; the `*View` types are what
/// goes on the wire, with author ids resolved to usernames and camelCase
/// field names.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Upper bound on a single tag, in characters.
pub const TAG_MAX_LEN: usize = 50;

/// Fixed category set a post must belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "post_category", rename_all = "snake_case")]
pub enum Category {
    Technology,
    Travel,
    Food,
    Lifestyle,
    Business,
    Education,
    Health,
    Science,
    Entertainment,
}

/// Comment entity. Lives and dies with its parent post.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Post entity with its embedded like set and comments, in append order.
#[derive(Debug, Clone)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// User ids that currently like this post; never contains duplicates.
    pub likes: Vec<Uuid>,
    pub comments: Vec<Comment>,
}

/// Fields required to create a post. The author binding is immutable after
/// this point.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub tags: Vec<String>,
}

/// Partial update for a post. `None` means "keep the stored value"; there is
/// no way to clear a field through a patch.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<Category>,
    pub tags: Option<Vec<String>>,
}

impl PostPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.category.is_none()
            && self.tags.is_none()
    }
}

/// Combined feed predicate: present parts are ANDed together; the search term
/// itself matches title OR content OR any tag, case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct FeedFilter {
    pub search: Option<String>,
    pub category: Option<Category>,
    pub author_id: Option<Uuid>,
}

/// Author reference on read paths.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorView {
    pub id: Uuid,
    pub username: String,
}

/// Wire shape of a comment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub text: String,
    pub author: AuthorView,
    pub created_at: DateTime<Utc>,
}

/// Wire shape of a post.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub author: AuthorView,
    pub created_at: DateTime<Utc>,
    pub like_count: usize,
    pub likes: Vec<Uuid>,
    pub comments: Vec<CommentView>,
}

/// Display name used when an author id no longer resolves to an account.
const DELETED_USER: &str = "deleted";

fn author_view(id: Uuid, usernames: &HashMap<Uuid, String>) -> AuthorView {
    AuthorView {
        id,
        username: usernames
            .get(&id)
            .cloned()
            .unwrap_or_else(|| DELETED_USER.to_string()),
    }
}

impl CommentView {
    pub fn assemble(comment: Comment, usernames: &HashMap<Uuid, String>) -> Self {
        CommentView {
            id: comment.id,
            text: comment.body,
            author: author_view(comment.author_id, usernames),
            created_at: comment.created_at,
        }
    }
}

impl PostView {
    pub fn assemble(post: Post, usernames: &HashMap<Uuid, String>) -> Self {
        PostView {
            id: post.id,
            title: post.title,
            content: post.content,
            category: post.category,
            tags: post.tags,
            author: author_view(post.author_id, usernames),
            created_at: post.created_at,
            like_count: post.likes.len(),
            likes: post.likes,
            comments: post
                .comments
                .into_iter()
                .map(|c| CommentView::assemble(c, usernames))
                .collect(),
        }
    }
}

/// Split a comma-separated tag list, trimming whitespace around each entry.
/// A blank input yields no tags. Empty entries between commas are kept so
/// validation can reject them.
pub fn parse_tags_csv(csv: &str) -> Vec<String> {
    if csv.trim().is_empty() {
        return Vec::new();
    }
    csv.split(',').map(|tag| tag.trim().to_string()).collect()
}

/// Tag rule shared by create and edit: every tag non-empty and at most
/// `TAG_MAX_LEN` characters. Checked before anything is persisted.
pub fn validate_tags(tags: &[String]) -> Result<(), String> {
    for tag in tags {
        if tag.is_empty() {
            return Err("tags must be non-empty".to_string());
        }
        if tag.chars().count() > TAG_MAX_LEN {
            return Err(format!("tags must be at most {TAG_MAX_LEN} characters long"));
        }
    }
    Ok(())
}

/// Trim an optional text field, treating blank input as absent. This is the
/// canonical form for patch fields: omitted and empty both mean "unchanged".
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_csv_splits_and_trims() {
        assert_eq!(parse_tags_csv("a, b"), vec!["a", "b"]);
        assert_eq!(parse_tags_csv("rust,  web , api"), vec!["rust", "web", "api"]);
    }

    #[test]
    fn blank_csv_means_no_tags() {
        assert!(parse_tags_csv("").is_empty());
        assert!(parse_tags_csv("   ").is_empty());
    }

    #[test]
    fn empty_entries_survive_parsing_for_validation() {
        let tags = parse_tags_csv("a,,b");
        assert_eq!(tags, vec!["a", "", "b"]);
        assert!(validate_tags(&tags).is_err());
    }

    #[test]
    fn tag_length_rule() {
        let ok = vec!["a".repeat(TAG_MAX_LEN)];
        assert!(validate_tags(&ok).is_ok());

        let too_long = vec!["a".repeat(TAG_MAX_LEN + 1)];
        assert!(validate_tags(&too_long).is_err());

        let empty = vec![String::new()];
        assert!(validate_tags(&empty).is_err());
    }

    #[test]
    fn non_blank_canonicalizes_patch_fields() {
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("".into())), None);
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some("  title  ".into())), Some("title".into()));
    }

    #[test]
    fn category_serializes_as_its_display_name() {
        let json = serde_json::to_string(&Category::Technology).unwrap();
        assert_eq!(json, "\"Technology\"");

        let parsed: Category = serde_json::from_str("\"Travel\"").unwrap();
        assert_eq!(parsed, Category::Travel);
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert!(serde_json::from_str::<Category>("\"Gossip\"").is_err());
    }
}
