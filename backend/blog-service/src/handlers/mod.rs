/// HTTP request handlers and the route table.
pub mod comments;
pub mod feed;
pub mod posts;

use crate::middleware::JwtAuthMiddleware;
use actix_web::web;

/// Mount every API route. Shared between `main` and the HTTP test-suite so
/// the two can never drift apart.
///
/// `/posts` mixes public reads and protected writes on the same paths, so
/// each resource carries all of its methods and the protected handlers
/// authenticate through the `Identity` extractor. The `/users` scope is
/// uniformly protected and wraps the middleware instead.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/posts")
            .service(
                web::resource("")
                    .route(web::get().to(feed::list_posts))
                    .route(web::post().to(posts::create_post)),
            )
            .service(
                web::resource("/{post_id}")
                    .route(web::get().to(posts::get_post))
                    .route(web::put().to(posts::update_post))
                    .route(web::delete().to(posts::delete_post)),
            )
            .route("/{post_id}/like", web::post().to(posts::toggle_like))
            .route("/{post_id}/unlike", web::post().to(posts::unlike))
            .route("/{post_id}/comments", web::post().to(comments::create_comment))
            .service(
                web::resource("/{post_id}/comments/{comment_id}")
                    .route(web::put().to(comments::update_comment))
                    .route(web::delete().to(comments::delete_comment)),
            ),
    )
    .service(
        web::scope("/users")
            .wrap(JwtAuthMiddleware)
            .route("/{user_id}/posts", web::get().to(posts::get_user_posts))
            .route(
                "/{user_id}/liked-posts",
                web::get().to(posts::get_user_liked_posts),
            ),
    );
}
