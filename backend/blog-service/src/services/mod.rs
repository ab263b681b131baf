/// Business logic layer.
///
/// Services own validation order (request shape, then existence, then
/// ownership), delegate storage to the injected traits, and resolve author
/// ids to usernames when assembling wire views.
mod comments;
mod feed;
mod posts;

pub use comments::CommentService;
pub use feed::FeedService;
pub use posts::PostService;

use crate::error::Result;
use crate::models::{Post, PostView};
use crate::store::UserDirectory;
use uuid::Uuid;

/// Resolve usernames for one post and assemble its view.
pub(crate) async fn render_post(users: &dyn UserDirectory, post: Post) -> Result<PostView> {
    let mut views = render_posts(users, vec![post]).await?;
    Ok(views.remove(0))
}

/// Resolve usernames for a batch of posts in one directory round-trip.
pub(crate) async fn render_posts(
    users: &dyn UserDirectory,
    posts: Vec<Post>,
) -> Result<Vec<PostView>> {
    let mut ids: Vec<Uuid> = Vec::new();
    for post in &posts {
        ids.push(post.author_id);
        ids.extend(post.comments.iter().map(|c| c.author_id));
    }
    ids.sort_unstable();
    ids.dedup();

    let usernames = users.username_map(&ids).await?;
    Ok(posts
        .into_iter()
        .map(|post| PostView::assemble(post, &usernames))
        .collect())
}
