//! Feed, post detail, post form and comment handlers.

use actix_web::{HttpRequest, HttpResponse, http::header::ContentType, web};
use serde::Serialize;
use validator::Validate;

use yatube_core::error::DomainError;
use yatube_core::feed::{Page, PostView};
use yatube_core::services::{EditOutcome, PostDetail};
use yatube_shared::Rendered;
use yatube_shared::dto::{CommentForm, PageQuery, PostForm};

use super::forms::{
    CommentFormView, FieldErrors, PostFormContext, PostFormView, field_errors, into_draft,
};
use super::{parse_post_id, post_url, profile_url, redirect, render};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::page_cache::PageCache;
use crate::state::AppState;

pub const INDEX_TEMPLATE: &str = "posts/index.html";
pub const GROUP_TEMPLATE: &str = "posts/group_list.html";
pub const PROFILE_TEMPLATE: &str = "posts/profile.html";
pub const DETAIL_TEMPLATE: &str = "posts/post_detail.html";
pub const FORM_TEMPLATE: &str = "posts/create_post.html";

#[derive(Serialize)]
struct IndexContext {
    page_obj: Page<PostView>,
}

#[derive(Serialize)]
struct DetailContext {
    #[serde(flatten)]
    detail: PostDetail,
    form: CommentFormView,
}

/// GET / - global feed, served from the page cache while fresh.
pub async fn index(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let key = PageCache::key_for(&req);
    if let Some(body) = state.pages.get(&key).await {
        return Ok(HttpResponse::Ok()
            .content_type(ContentType::json())
            .body(body));
    }

    let page_obj = state.feed.global(query.page.as_deref()).await?;
    let body = serde_json::to_string(&Rendered::new(INDEX_TEMPLATE, IndexContext { page_obj }))?;
    state.pages.store(&key, &body).await;

    Ok(HttpResponse::Ok()
        .content_type(ContentType::json())
        .body(body))
}

/// GET /group/{slug}/
pub async fn group_posts(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let feed = state.feed.group(&path, query.page.as_deref()).await?;
    Ok(render(GROUP_TEMPLATE, feed))
}

/// GET /profile/{username}/
pub async fn profile(
    state: web::Data<AppState>,
    path: web::Path<String>,
    viewer: OptionalIdentity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let viewer_id = viewer.0.map(|identity| identity.user_id);
    let feed = state
        .feed
        .profile(&path, viewer_id, query.page.as_deref())
        .await?;
    Ok(render(PROFILE_TEMPLATE, feed))
}

/// GET /posts/{post_id}/
pub async fn post_detail(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post_id = parse_post_id(&path)?;
    let detail = state.posts.detail(post_id).await?;
    Ok(render(
        DETAIL_TEMPLATE,
        DetailContext {
            detail,
            form: CommentFormView::default(),
        },
    ))
}

async fn form_page(
    state: &AppState,
    form: PostFormView,
    edit_of: Option<uuid::Uuid>,
) -> AppResult<HttpResponse> {
    let groups = state.posts.group_choices().await?;
    Ok(render(
        FORM_TEMPLATE,
        PostFormContext {
            form,
            groups,
            is_edit: edit_of.is_some(),
            post_id: edit_of,
        },
    ))
}

/// Collect validation and image errors of a submitted post form.
fn check_form(form: &PostForm) -> FieldErrors {
    match form.validate() {
        Ok(()) => FieldErrors::new(),
        Err(errors) => field_errors(&errors),
    }
}

/// GET /create/
pub async fn create_form(_identity: Identity, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    form_page(&state, PostFormView::default(), None).await
}

/// POST /create/
pub async fn create_post(
    identity: Identity,
    state: web::Data<AppState>,
    body: web::Json<PostForm>,
) -> AppResult<HttpResponse> {
    let form = body.into_inner();

    let errors = check_form(&form);
    if !errors.is_empty() {
        return form_page(&state, PostFormView::with_errors(&form, errors), None).await;
    }
    let draft = match into_draft(form.clone()) {
        Ok(draft) => draft,
        Err(errors) => {
            return form_page(&state, PostFormView::with_errors(&form, errors), None).await;
        }
    };

    match state.posts.create(identity.user_id, draft).await {
        Ok(_) => Ok(redirect(profile_url(&identity.username))),
        Err(DomainError::Validation(msg)) => {
            let errors = FieldErrors::from([("group".to_string(), vec![msg])]);
            form_page(&state, PostFormView::with_errors(&form, errors), None).await
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /posts/{post_id}/edit/ - only the author gets the form.
pub async fn edit_form(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post_id = parse_post_id(&path)?;
    let post = state.posts.find(post_id).await?;
    if post.author_id != identity.user_id {
        return Ok(redirect(post_url(post_id)));
    }

    form_page(&state, PostFormView::from_post(&post), Some(post_id)).await
}

/// POST /posts/{post_id}/edit/
pub async fn edit_post(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<PostForm>,
) -> AppResult<HttpResponse> {
    let post_id = parse_post_id(&path)?;
    let post = state.posts.find(post_id).await?;
    if post.author_id != identity.user_id {
        return Ok(redirect(post_url(post_id)));
    }

    let form = body.into_inner();
    let errors = check_form(&form);
    if !errors.is_empty() {
        return form_page(&state, PostFormView::with_errors(&form, errors), Some(post_id)).await;
    }
    let draft = match into_draft(form.clone()) {
        Ok(draft) => draft,
        Err(errors) => {
            return form_page(&state, PostFormView::with_errors(&form, errors), Some(post_id))
                .await;
        }
    };

    match state.posts.edit(post_id, identity.user_id, draft).await {
        Ok(EditOutcome::Updated(_)) | Ok(EditOutcome::NotAuthor(_)) => {
            Ok(redirect(post_url(post_id)))
        }
        Err(DomainError::Validation(msg)) => {
            let errors = FieldErrors::from([("group".to_string(), vec![msg])]);
            form_page(&state, PostFormView::with_errors(&form, errors), Some(post_id)).await
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /posts/{post_id}/comment/
///
/// A missing or blank comment is dropped; the requester lands on the post either way.
pub async fn add_comment(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: Option<web::Json<CommentForm>>,
) -> AppResult<HttpResponse> {
    let post_id = parse_post_id(&path)?;
    let form = body.map(web::Json::into_inner).unwrap_or_default();

    if form.validate().is_ok() {
        state
            .posts
            .add_comment(post_id, identity.user_id, form.text)
            .await?;
    } else {
        state.posts.find(post_id).await?;
        tracing::debug!(%post_id, "Discarding invalid comment");
    }

    Ok(redirect(post_url(post_id)))
}

/// GET /posts/{post_id}/comment/ - nothing submitted, back to the post.
pub async fn comment_redirect(
    _identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post_id = parse_post_id(&path)?;
    state.posts.find(post_id).await?;
    Ok(redirect(post_url(post_id)))
}
