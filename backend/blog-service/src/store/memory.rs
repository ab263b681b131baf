/// In-memory implementation of the storage traits.
///
/// Posts are kept in the embedded shape the domain model describes: one
/// record per post carrying its like set and ordered comments. A single
/// mutex guards the map, so every trait operation is one critical section
/// and the atomicity contract holds by construction. This is the store the
/// test-suite runs against; it has no persistence.
use crate::error::Result;
use crate::models::{Comment, FeedFilter, NewPost, Post, PostPatch};
use crate::store::{ContentStore, LikeToggle, Mutation, UserDirectory};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryContentStore {
    posts: Mutex<HashMap<Uuid, Post>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(post: &Post, filter: &FeedFilter) -> bool {
    if let Some(category) = filter.category {
        if post.category != category {
            return false;
        }
    }
    if let Some(author_id) = filter.author_id {
        if post.author_id != author_id {
            return false;
        }
    }
    if let Some(term) = &filter.search {
        let needle = term.to_lowercase();
        let hit = post.title.to_lowercase().contains(&needle)
            || post.content.to_lowercase().contains(&needle)
            || post
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&needle));
        if !hit {
            return false;
        }
    }
    true
}

fn newest_first(mut posts: Vec<Post>) -> Vec<Post> {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    posts
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn insert_post(&self, draft: NewPost) -> Result<Post> {
        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            title: draft.title,
            content: draft.content,
            category: draft.category,
            tags: draft.tags,
            author_id: draft.author_id,
            created_at: now,
            updated_at: now,
            likes: Vec::new(),
            comments: Vec::new(),
        };

        let mut posts = self.posts.lock().unwrap();
        posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn fetch_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        let posts = self.posts.lock().unwrap();
        Ok(posts.get(&post_id).cloned())
    }

    async fn update_post(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        patch: PostPatch,
    ) -> Result<Mutation<Post>> {
        let mut posts = self.posts.lock().unwrap();
        let Some(post) = posts.get_mut(&post_id) else {
            return Ok(Mutation::Missing);
        };
        if post.author_id != author_id {
            return Ok(Mutation::Denied);
        }

        if let Some(title) = patch.title {
            post.title = title;
        }
        if let Some(content) = patch.content {
            post.content = content;
        }
        if let Some(category) = patch.category {
            post.category = category;
        }
        if let Some(tags) = patch.tags {
            post.tags = tags;
        }
        post.updated_at = Utc::now();

        Ok(Mutation::Applied(post.clone()))
    }

    async fn delete_post(&self, post_id: Uuid, author_id: Uuid) -> Result<Mutation<()>> {
        let mut posts = self.posts.lock().unwrap();
        let Some(post) = posts.get(&post_id) else {
            return Ok(Mutation::Missing);
        };
        if post.author_id != author_id {
            return Ok(Mutation::Denied);
        }

        // Likes and comments are embedded, so removal cascades.
        posts.remove(&post_id);
        Ok(Mutation::Applied(()))
    }

    async fn list_posts(&self, filter: &FeedFilter) -> Result<Vec<Post>> {
        let posts = self.posts.lock().unwrap();
        Ok(newest_first(
            posts
                .values()
                .filter(|post| matches(post, filter))
                .cloned()
                .collect(),
        ))
    }

    async fn posts_by_author(&self, author_id: Uuid) -> Result<Vec<Post>> {
        let posts = self.posts.lock().unwrap();
        Ok(newest_first(
            posts
                .values()
                .filter(|post| post.author_id == author_id)
                .cloned()
                .collect(),
        ))
    }

    async fn posts_liked_by(&self, user_id: Uuid) -> Result<Vec<Post>> {
        let posts = self.posts.lock().unwrap();
        Ok(newest_first(
            posts
                .values()
                .filter(|post| post.likes.contains(&user_id))
                .cloned()
                .collect(),
        ))
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<LikeToggle>> {
        let mut posts = self.posts.lock().unwrap();
        let Some(post) = posts.get_mut(&post_id) else {
            return Ok(None);
        };

        let liked = match post.likes.iter().position(|id| *id == user_id) {
            Some(index) => {
                post.likes.remove(index);
                false
            }
            None => {
                post.likes.push(user_id);
                true
            }
        };

        Ok(Some(LikeToggle {
            liked,
            like_count: post.likes.len() as i64,
        }))
    }

    async fn remove_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<bool>> {
        let mut posts = self.posts.lock().unwrap();
        let Some(post) = posts.get_mut(&post_id) else {
            return Ok(None);
        };

        match post.likes.iter().position(|id| *id == user_id) {
            Some(index) => {
                post.likes.remove(index);
                Ok(Some(true))
            }
            None => Ok(Some(false)),
        }
    }

    async fn insert_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        body: String,
    ) -> Result<Option<Comment>> {
        let mut posts = self.posts.lock().unwrap();
        let Some(post) = posts.get_mut(&post_id) else {
            return Ok(None);
        };

        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            post_id,
            author_id,
            body,
            created_at: now,
            updated_at: now,
        };
        post.comments.push(comment.clone());
        Ok(Some(comment))
    }

    async fn update_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        author_id: Uuid,
        body: String,
    ) -> Result<Mutation<Comment>> {
        let mut posts = self.posts.lock().unwrap();
        let Some(post) = posts.get_mut(&post_id) else {
            return Ok(Mutation::Missing);
        };
        let Some(comment) = post.comments.iter_mut().find(|c| c.id == comment_id) else {
            return Ok(Mutation::Missing);
        };
        if comment.author_id != author_id {
            return Ok(Mutation::Denied);
        }

        comment.body = body;
        comment.updated_at = Utc::now();
        Ok(Mutation::Applied(comment.clone()))
    }

    async fn delete_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        author_id: Uuid,
    ) -> Result<Mutation<()>> {
        let mut posts = self.posts.lock().unwrap();
        let Some(post) = posts.get_mut(&post_id) else {
            return Ok(Mutation::Missing);
        };
        let Some(index) = post.comments.iter().position(|c| c.id == comment_id) else {
            return Ok(Mutation::Missing);
        };
        if post.comments[index].author_id != author_id {
            return Ok(Mutation::Denied);
        }

        post.comments.remove(index);
        Ok(Mutation::Applied(()))
    }
}

/// In-memory username registry, seeded by tests.
#[derive(Default)]
pub struct MemoryUserDirectory {
    users: Mutex<HashMap<Uuid, String>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user, returning its generated id.
    pub fn add_user(&self, username: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.users.lock().unwrap().insert(id, username.to_string());
        id
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_user_id(&self, username: &str) -> Result<Option<Uuid>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|(_, name)| name.as_str() == username)
            .map(|(id, _)| *id))
    }

    async fn username_map(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, String>> {
        let users = self.users.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| users.get(id).map(|name| (*id, name.clone())))
            .collect())
    }
}
