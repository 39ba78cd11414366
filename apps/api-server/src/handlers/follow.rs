//! Personalized feed and follow/unfollow handlers.

use actix_web::{HttpResponse, web};
use serde::Serialize;

use yatube_core::feed::{Page, PostView};
use yatube_core::services::FollowOutcome;
use yatube_shared::dto::PageQuery;

use super::{redirect, render};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

pub const FOLLOW_TEMPLATE: &str = "posts/follow.html";
const FOLLOW_INDEX_URL: &str = "/follow/";

#[derive(Serialize)]
struct FollowContext {
    page_obj: Page<PostView>,
}

/// GET /follow/ - posts by the authors the requester follows.
pub async fn follow_index(
    identity: Identity,
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page_obj = state
        .feed
        .following(identity.user_id, query.page.as_deref())
        .await?;
    Ok(render(FOLLOW_TEMPLATE, FollowContext { page_obj }))
}

/// GET /profile/{username}/follow/
pub async fn profile_follow(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let outcome = state.social.follow(identity.user_id, &path).await?;
    if outcome != FollowOutcome::Created {
        tracing::debug!(follower = %identity.username, author = %path, ?outcome, "Follow not created");
    }
    Ok(redirect(FOLLOW_INDEX_URL))
}

/// GET /profile/{username}/unfollow/
pub async fn profile_unfollow(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    state.social.unfollow(identity.user_id, &path).await?;
    Ok(redirect(FOLLOW_INDEX_URL))
}
