/// PostgreSQL implementation of the storage traits.
///
/// Likes and comments are normalized into their own tables keyed by post id,
/// with `ON DELETE CASCADE` providing the embedded lifecycle. Every mutation
/// that the traits require to be atomic is a single SQL statement: the
/// ownership predicate sits in the `WHERE` clause, and the like toggle is one
/// data-modifying CTE, so there is no read-then-write window to lose updates
/// in. Follow-up reads only classify failures, never decide them.
use crate::error::Result;
use crate::models::{Category, Comment, FeedFilter, NewPost, Post, PostPatch};
use crate::store::{ContentStore, LikeToggle, Mutation, UserDirectory};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use uuid::Uuid;

const POST_COLUMNS: &str =
    "id, title, content, category, tags, author_id, created_at, updated_at";

/// Post row as stored, before the like set and comments are attached.
#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    title: String,
    content: String,
    category: Category,
    tags: Vec<String>,
    author_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PostRow {
    fn into_post(self, likes: Vec<Uuid>, comments: Vec<Comment>) -> Post {
        Post {
            id: self.id,
            title: self.title,
            content: self.content,
            category: self.category,
            tags: self.tags,
            author_id: self.author_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            likes,
            comments,
        }
    }
}

/// Escape LIKE/ILIKE metacharacters so a search term matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[derive(Clone)]
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attach like sets and comments to a batch of post rows.
    async fn hydrate(&self, rows: Vec<PostRow>) -> Result<Vec<Post>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

        let like_rows = sqlx::query_as::<_, (Uuid, Uuid)>(
            r#"
            SELECT post_id, user_id
            FROM post_likes
            WHERE post_id = ANY($1)
            ORDER BY created_at ASC
            "#,
        )
        .bind(&post_ids)
        .fetch_all(&self.pool)
        .await?;

        let comment_rows = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, author_id, body, created_at, updated_at
            FROM comments
            WHERE post_id = ANY($1)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(&post_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut likes: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for (post_id, user_id) in like_rows {
            likes.entry(post_id).or_default().push(user_id);
        }

        let mut comments: HashMap<Uuid, Vec<Comment>> = HashMap::new();
        for comment in comment_rows {
            comments.entry(comment.post_id).or_default().push(comment);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let post_likes = likes.remove(&row.id).unwrap_or_default();
                let post_comments = comments.remove(&row.id).unwrap_or_default();
                row.into_post(post_likes, post_comments)
            })
            .collect())
    }

    async fn hydrate_one(&self, row: PostRow) -> Result<Post> {
        let mut posts = self.hydrate(vec![row]).await?;
        Ok(posts.remove(0))
    }

    async fn post_exists(&self, post_id: Uuid) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
                .bind(post_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn comment_exists(&self, post_id: Uuid, comment_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM comments WHERE id = $1 AND post_id = $2)",
        )
        .bind(comment_id)
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn insert_post(&self, draft: NewPost) -> Result<Post> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            INSERT INTO posts (author_id, title, content, category, tags)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {POST_COLUMNS}
            "#,
        ))
        .bind(draft.author_id)
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(draft.category)
        .bind(&draft.tags)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_post(Vec::new(), Vec::new()))
    }

    async fn fetch_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1",
        ))
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate_one(row).await?)),
            None => Ok(None),
        }
    }

    async fn update_post(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        patch: PostPatch,
    ) -> Result<Mutation<Post>> {
        // COALESCE keeps the stored value for absent patch fields; the
        // author predicate makes the ownership check part of the mutation.
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            UPDATE posts
            SET title = COALESCE($3, title),
                content = COALESCE($4, content),
                category = COALESCE($5::post_category, category),
                tags = COALESCE($6::text[], tags),
                updated_at = NOW()
            WHERE id = $1 AND author_id = $2
            RETURNING {POST_COLUMNS}
            "#,
        ))
        .bind(post_id)
        .bind(author_id)
        .bind(patch.title)
        .bind(patch.content)
        .bind(patch.category)
        .bind(patch.tags)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Mutation::Applied(self.hydrate_one(row).await?)),
            None if self.post_exists(post_id).await? => Ok(Mutation::Denied),
            None => Ok(Mutation::Missing),
        }
    }

    async fn delete_post(&self, post_id: Uuid, author_id: Uuid) -> Result<Mutation<()>> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1 AND author_id = $2")
            .bind(post_id)
            .bind(author_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            return Ok(Mutation::Applied(()));
        }
        if self.post_exists(post_id).await? {
            Ok(Mutation::Denied)
        } else {
            Ok(Mutation::Missing)
        }
    }

    async fn list_posts(&self, filter: &FeedFilter) -> Result<Vec<Post>> {
        let pattern = filter.search.as_deref().map(like_pattern);

        let rows = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE ($1::text IS NULL
                   OR title ILIKE $1
                   OR content ILIKE $1
                   OR EXISTS (SELECT 1 FROM unnest(tags) AS t(tag) WHERE t.tag ILIKE $1))
              AND ($2::post_category IS NULL OR category = $2)
              AND ($3::uuid IS NULL OR author_id = $3)
            ORDER BY created_at DESC
            "#,
        ))
        .bind(pattern)
        .bind(filter.category)
        .bind(filter.author_id)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn posts_by_author(&self, author_id: Uuid) -> Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE author_id = $1
            ORDER BY created_at DESC
            "#,
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn posts_liked_by(&self, user_id: Uuid) -> Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            SELECT p.id, p.title, p.content, p.category, p.tags, p.author_id,
                   p.created_at, p.updated_at
            FROM posts p
            JOIN post_likes l ON l.post_id = p.id
            WHERE l.user_id = $1
            ORDER BY l.created_at DESC
            "#,
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<LikeToggle>> {
        // One statement, one snapshot: remove the membership row if it is
        // visible, otherwise insert it. The ON CONFLICT DO UPDATE arm absorbs
        // the race where a concurrent toggle inserts first; the unique key
        // makes duplicates impossible either way. The count is corrected by
        // the CTE deltas because the outer SELECT still sees the
        // pre-statement snapshot.
        let result = sqlx::query(
            r#"
            WITH target AS (
                SELECT id FROM posts WHERE id = $1
            ), removed AS (
                DELETE FROM post_likes
                WHERE post_id = $1 AND user_id = $2
                  AND EXISTS (SELECT 1 FROM target)
                RETURNING user_id
            ), added AS (
                INSERT INTO post_likes (post_id, user_id)
                SELECT t.id, $2 FROM target t
                WHERE NOT EXISTS (SELECT 1 FROM removed)
                ON CONFLICT (post_id, user_id) DO UPDATE SET user_id = EXCLUDED.user_id
                RETURNING user_id
            )
            SELECT
                EXISTS (SELECT 1 FROM target) AS post_exists,
                EXISTS (SELECT 1 FROM added)  AS liked,
                (SELECT COUNT(*) FROM post_likes WHERE post_id = $1)
                    + (SELECT COUNT(*) FROM added)
                    - (SELECT COUNT(*) FROM removed) AS like_count
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await;

        let row = match result {
            Ok(row) => row,
            // Post deleted between snapshot and insert: same as not found.
            Err(sqlx::Error::Database(db))
                if db.constraint() == Some("post_likes_post_id_fkey") =>
            {
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        if !row.get::<bool, _>("post_exists") {
            return Ok(None);
        }

        Ok(Some(LikeToggle {
            liked: row.get::<bool, _>("liked"),
            like_count: row.get::<i64, _>("like_count"),
        }))
    }

    async fn remove_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<bool>> {
        let result = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            return Ok(Some(true));
        }
        if self.post_exists(post_id).await? {
            Ok(Some(false))
        } else {
            Ok(None)
        }
    }

    async fn insert_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        body: String,
    ) -> Result<Option<Comment>> {
        // Gated on post existence inside the statement so the append cannot
        // land on a post deleted mid-request.
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (post_id, author_id, body)
            SELECT p.id, $2, $3 FROM posts p WHERE p.id = $1
            RETURNING id, post_id, author_id, body, created_at, updated_at
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .bind(&body)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn update_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        author_id: Uuid,
        body: String,
    ) -> Result<Mutation<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments
            SET body = $4, updated_at = NOW()
            WHERE id = $2 AND post_id = $1 AND author_id = $3
            RETURNING id, post_id, author_id, body, created_at, updated_at
            "#,
        )
        .bind(post_id)
        .bind(comment_id)
        .bind(author_id)
        .bind(&body)
        .fetch_optional(&self.pool)
        .await?;

        match comment {
            Some(comment) => Ok(Mutation::Applied(comment)),
            None if self.comment_exists(post_id, comment_id).await? => Ok(Mutation::Denied),
            None => Ok(Mutation::Missing),
        }
    }

    async fn delete_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        author_id: Uuid,
    ) -> Result<Mutation<()>> {
        let result = sqlx::query(
            "DELETE FROM comments WHERE id = $2 AND post_id = $1 AND author_id = $3",
        )
        .bind(post_id)
        .bind(comment_id)
        .bind(author_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(Mutation::Applied(()));
        }
        if self.comment_exists(post_id, comment_id).await? {
            Ok(Mutation::Denied)
        } else {
            Ok(Mutation::Missing)
        }
    }
}

#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_user_id(&self, username: &str) -> Result<Option<Uuid>> {
        let id = sqlx::query_scalar("SELECT id FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn username_map(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, username FROM users WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("go"), "%go%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("back\\slash"), "%back\\\\slash%");
    }
}
