//! Service-level tests of the interaction engine, run against the in-memory
//! store. These cover the contract the HTTP layer relies on: authorization,
//! the partial-merge policy, tag validation order, like-toggle semantics, and
//! comment ownership.

use blog_service::error::AppError;
use blog_service::middleware::Identity;
use blog_service::models::{Category, Post, PostPatch};
use blog_service::services::{CommentService, FeedService, PostService};
use blog_service::store::memory::{MemoryContentStore, MemoryUserDirectory};
use blog_service::store::{ContentStore, UserDirectory};
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

struct TestEnv {
    store: Arc<dyn ContentStore>,
    users: Arc<dyn UserDirectory>,
    directory: Arc<MemoryUserDirectory>,
}

impl TestEnv {
    fn new() -> Self {
        let directory = Arc::new(MemoryUserDirectory::new());
        TestEnv {
            store: Arc::new(MemoryContentStore::new()),
            users: directory.clone(),
            directory,
        }
    }

    fn posts(&self) -> PostService {
        PostService::new(self.store.clone(), self.users.clone())
    }

    fn comments(&self) -> CommentService {
        CommentService::new(self.store.clone(), self.users.clone())
    }

    fn feed(&self) -> FeedService {
        FeedService::new(self.store.clone(), self.users.clone())
    }

    fn login(&self, username: &str) -> Identity {
        Identity {
            user_id: self.directory.add_user(username),
            token_expiry: Utc::now() + Duration::hours(1),
        }
    }

    async fn publish(
        &self,
        identity: &Identity,
        title: &str,
        category: Category,
        tags: &[&str],
    ) -> Post {
        self.posts()
            .create_post(
                identity,
                title.to_string(),
                format!("{title} content"),
                category,
                tags.iter().map(|t| t.to_string()).collect(),
            )
            .await
            .expect("post creation failed")
    }
}

#[tokio::test]
async fn double_toggle_restores_original_state() {
    let env = TestEnv::new();
    let author = env.login("alice-writer");
    let reader = env.login("bob-the-builder");
    let post = env.publish(&author, "Hello", Category::Technology, &[]).await;

    let first = env.posts().toggle_like(&reader, post.id).await.unwrap();
    assert!(first.liked);
    assert_eq!(first.like_count, 1);

    let second = env.posts().toggle_like(&reader, post.id).await.unwrap();
    assert!(!second.liked);
    assert_eq!(second.like_count, 0);

    let view = env.posts().get_post(post.id).await.unwrap();
    assert!(view.likes.is_empty());
}

#[tokio::test]
async fn like_set_never_holds_duplicates() {
    let env = TestEnv::new();
    let author = env.login("alice-writer");
    let reader = env.login("bob-the-builder");
    let post = env.publish(&author, "Hello", Category::Technology, &[]).await;

    // Odd number of toggles leaves exactly one membership entry.
    for _ in 0..3 {
        env.posts().toggle_like(&reader, post.id).await.unwrap();
    }

    let view = env.posts().get_post(post.id).await.unwrap();
    assert_eq!(view.likes, vec![reader.user_id]);
    assert_eq!(view.like_count, 1);
}

#[tokio::test]
async fn concurrent_same_user_toggles_stay_consistent() {
    let env = TestEnv::new();
    let author = env.login("alice-writer");
    let reader = env.login("bob-the-builder");
    let post = env.publish(&author, "Hello", Category::Technology, &[]).await;

    let service_a = env.posts();
    let service_b = env.posts();
    let (a, b) = tokio::join!(
        service_a.toggle_like(&reader, post.id),
        service_b.toggle_like(&reader, post.id),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    // Each call is one net flip, so the pair must cancel out: one call saw
    // the like appear, the other saw it removed, and the set is empty again.
    assert_ne!(a.liked, b.liked);
    let view = env.posts().get_post(post.id).await.unwrap();
    assert!(view.likes.is_empty());
}

#[tokio::test]
async fn only_the_author_may_edit_or_delete() {
    let env = TestEnv::new();
    let author = env.login("alice-writer");
    let intruder = env.login("bob-the-builder");
    let post = env.publish(&author, "Mine", Category::Travel, &[]).await;

    let patch = PostPatch {
        title: Some("Stolen".to_string()),
        ..PostPatch::default()
    };
    let err = env
        .posts()
        .edit_post(&intruder, post.id, patch.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = env.posts().delete_post(&intruder, post.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    // The author's edit goes through.
    let view = env.posts().edit_post(&author, post.id, patch).await.unwrap();
    assert_eq!(view.title, "Stolen");
}

#[tokio::test]
async fn partial_update_keeps_omitted_fields() {
    let env = TestEnv::new();
    let author = env.login("alice-writer");
    let post = env
        .publish(&author, "Original", Category::Food, &["rust", "web"])
        .await;

    let patch = PostPatch {
        title: Some("Renamed".to_string()),
        ..PostPatch::default()
    };
    let view = env.posts().edit_post(&author, post.id, patch).await.unwrap();

    assert_eq!(view.title, "Renamed");
    assert_eq!(view.content, "Original content");
    assert_eq!(view.category, Category::Food);
    assert_eq!(view.tags, vec!["rust", "web"]);
}

#[tokio::test]
async fn tag_rules_reject_bad_posts_before_persisting() {
    let env = TestEnv::new();
    let author = env.login("alice-writer");

    let err = env
        .posts()
        .create_post(
            &author,
            "Tagged".to_string(),
            "body".to_string(),
            Category::Science,
            vec!["a".repeat(51)],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    let err = env
        .posts()
        .create_post(
            &author,
            "Tagged".to_string(),
            "body".to_string(),
            Category::Science,
            vec![String::new()],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    // Nothing reached the store.
    let all = env.feed().list(None, None, None).await.unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn patch_validation_runs_before_the_post_lookup() {
    let env = TestEnv::new();
    let author = env.login("alice-writer");

    let patch = PostPatch {
        tags: Some(vec![String::new()]),
        ..PostPatch::default()
    };
    // Bad tags on a nonexistent post: the tag rule wins.
    let err = env
        .posts()
        .edit_post(&author, Uuid::new_v4(), patch)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
}

#[tokio::test]
async fn missing_post_is_not_found() {
    let env = TestEnv::new();
    let user = env.login("alice-writer");

    let err = env.posts().get_post(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = env
        .posts()
        .toggle_like(&user, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = env
        .comments()
        .add_comment(&user, Uuid::new_v4(), "hi".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn unlike_requires_an_existing_like() {
    let env = TestEnv::new();
    let author = env.login("alice-writer");
    let reader = env.login("bob-the-builder");
    let post = env.publish(&author, "Hello", Category::Health, &[]).await;

    let err = env.posts().unlike(&reader, post.id).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    env.posts().toggle_like(&reader, post.id).await.unwrap();
    env.posts().unlike(&reader, post.id).await.unwrap();

    let view = env.posts().get_post(post.id).await.unwrap();
    assert!(view.likes.is_empty());
}

#[tokio::test]
async fn comment_ownership_is_enforced() {
    let env = TestEnv::new();
    let author = env.login("alice-writer");
    let commenter = env.login("bob-the-builder");
    let post = env.publish(&author, "Open thread", Category::Lifestyle, &[]).await;

    let comment = env
        .comments()
        .add_comment(&commenter, post.id, "first!".to_string())
        .await
        .unwrap();
    assert_eq!(comment.author.username, "bob-the-builder");

    // The post author is not the comment author.
    let err = env
        .comments()
        .edit_comment(&author, post.id, comment.id, "edited".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = env
        .comments()
        .delete_comment(&author, post.id, comment.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let edited = env
        .comments()
        .edit_comment(&commenter, post.id, comment.id, "edited".to_string())
        .await
        .unwrap();
    assert_eq!(edited.text, "edited");

    let view = env.posts().get_post(post.id).await.unwrap();
    assert_eq!(view.comments.len(), 1);
    assert_eq!(view.comments[0].text, "edited");

    env.comments()
        .delete_comment(&commenter, post.id, comment.id)
        .await
        .unwrap();
    let view = env.posts().get_post(post.id).await.unwrap();
    assert!(view.comments.is_empty());
}

#[tokio::test]
async fn deleting_a_post_destroys_its_comments_and_likes() {
    let env = TestEnv::new();
    let author = env.login("alice-writer");
    let reader = env.login("bob-the-builder");
    let post = env.publish(&author, "Ephemeral", Category::Business, &[]).await;

    env.posts().toggle_like(&reader, post.id).await.unwrap();
    env.comments()
        .add_comment(&reader, post.id, "nice".to_string())
        .await
        .unwrap();

    env.posts().delete_post(&author, post.id).await.unwrap();

    let err = env.posts().get_post(post.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(env.posts().liked_posts(&reader).await.unwrap().is_empty());
}

#[tokio::test]
async fn feed_filters_combine_category_search_and_author() {
    let env = TestEnv::new();
    let alice = env.login("alice-writer");
    let bob = env.login("bob-the-builder");
    env.publish(&alice, "Go basics", Category::Technology, &["golang"])
        .await;
    env.publish(&bob, "Travel diary", Category::Travel, &["asia"])
        .await;

    let tech = env
        .feed()
        .list(None, Some(Category::Technology), None)
        .await
        .unwrap();
    assert_eq!(tech.len(), 1);
    assert_eq!(tech[0].title, "Go basics");

    // Case-insensitive substring across title, content, and tags.
    let search = env
        .feed()
        .list(Some("go".to_string()), None, None)
        .await
        .unwrap();
    assert_eq!(search.len(), 1);
    assert_eq!(search[0].title, "Go basics");

    let by_tag = env
        .feed()
        .list(Some("ASIA".to_string()), None, None)
        .await
        .unwrap();
    assert_eq!(by_tag.len(), 1);
    assert_eq!(by_tag[0].title, "Travel diary");

    let by_author = env
        .feed()
        .list(None, None, Some("alice-writer".to_string()))
        .await
        .unwrap();
    assert_eq!(by_author.len(), 1);
    assert_eq!(by_author[0].author.username, "alice-writer");

    // AND semantics across present predicates.
    let none = env
        .feed()
        .list(
            Some("go".to_string()),
            Some(Category::Travel),
            None,
        )
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn unknown_username_fails_before_listing() {
    let env = TestEnv::new();
    let err = env
        .feed()
        .list(None, None, Some("nobody-here".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn author_listings_are_scoped_to_the_caller() {
    let env = TestEnv::new();
    let alice = env.login("alice-writer");
    let bob = env.login("bob-the-builder");
    let post = env.publish(&alice, "Mine", Category::Education, &[]).await;
    env.publish(&bob, "Yours", Category::Education, &[]).await;

    let mine = env.posts().posts_by_author(&alice).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].title, "Mine");

    env.posts().toggle_like(&bob, post.id).await.unwrap();
    let liked = env.posts().liked_posts(&bob).await.unwrap();
    assert_eq!(liked.len(), 1);
    assert_eq!(liked[0].id, post.id);
}
