//! HTTP handlers and route configuration.

mod auth;
mod follow;
mod forms;
mod health;
mod posts;

use actix_web::{HttpRequest, HttpResponse, http::header, web};
use serde::Serialize;
use uuid::Uuid;

use yatube_core::error::DomainError;
use yatube_shared::{ErrorResponse, Rendered};

use crate::middleware::error::AppResult;
use crate::observability::RequestId;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(posts::index))
        .route("/health", web::get().to(health::health_check))
        .route("/group/{slug}/", web::get().to(posts::group_posts))
        .route("/create/", web::get().to(posts::create_form))
        .route("/create/", web::post().to(posts::create_post))
        .route("/follow/", web::get().to(follow::follow_index))
        .service(
            web::scope("/profile/{username}")
                .route("/", web::get().to(posts::profile))
                .route("/follow/", web::get().to(follow::profile_follow))
                .route("/unfollow/", web::get().to(follow::profile_unfollow)),
        )
        .service(
            web::scope("/posts/{post_id}")
                .route("/", web::get().to(posts::post_detail))
                .route("/edit/", web::get().to(posts::edit_form))
                .route("/edit/", web::post().to(posts::edit_post))
                .route("/comment/", web::get().to(posts::comment_redirect))
                .route("/comment/", web::post().to(posts::add_comment)),
        )
        .service(
            web::scope("/auth")
                .route("/login/", web::get().to(auth::login_page))
                .route("/login/", web::post().to(auth::login))
                .route("/signup/", web::post().to(auth::signup)),
        )
        .default_service(web::to(not_found));
}

/// Wrap a context into a rendered page.
pub(crate) fn render<C: Serialize>(template: &str, context: C) -> HttpResponse {
    HttpResponse::Ok().json(Rendered::new(template, context))
}

pub(crate) fn redirect(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.as_ref()))
        .finish()
}

pub(crate) fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

pub(crate) fn post_url(post_id: Uuid) -> String {
    format!("/posts/{}/", post_id)
}

/// Post ids come from the path; anything that is not a UUID names no post.
pub(crate) fn parse_post_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| DomainError::not_found("Post", raw).into())
}

/// Fallback for every unrouted path.
async fn not_found(req: HttpRequest, request_id: RequestId) -> HttpResponse {
    tracing::debug!(path = %req.path(), "No route matched");

    let mut problem = ErrorResponse::not_found(format!("No page at {}", req.path()))
        .with_instance(req.path());
    if !request_id.as_str().is_empty() {
        problem = problem.with_request_id(request_id.as_str());
    }
    HttpResponse::NotFound().json(problem)
}
