//! Post detail, create/edit forms, comments and login-required redirects.

mod common;

use std::sync::Arc;

use actix_web::{App, http::StatusCode, test};
use api_server::state::Repositories;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::{Value, json};

use common::{FailingWrites, Harness, location};
use yatube_core::domain::{Comment, Post, User};
use yatube_core::ports::{BaseRepository, CommentRepository, PostFilter, PostRepository};

const SMALL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00,
    0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
];

#[actix_web::test]
async fn anonymous_writes_redirect_to_login() {
    let h = Harness::new();
    let author = h.user("auth").await;
    let post = h.post(&author, "Test post", None).await;
    let app = test::init_service(App::new().configure(h.configure())).await;

    let edit = format!("/posts/{}/edit/", post.id);
    let comment = format!("/posts/{}/comment/", post.id);
    let cases = [
        test::TestRequest::get().uri("/create/").to_request(),
        test::TestRequest::post()
            .uri("/create/")
            .set_json(json!({"text": "x"}))
            .to_request(),
        test::TestRequest::get().uri(&edit).to_request(),
        test::TestRequest::post().uri(&comment).to_request(),
        test::TestRequest::get().uri("/follow/").to_request(),
    ];
    let expected = ["/create/", "/create/", edit.as_str(), comment.as_str(), "/follow/"];

    for (req, next) in cases.into_iter().zip(expected) {
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), format!("/auth/login/?next={}", next));
    }
    assert_eq!(h.post_count().await, 1);
}

#[actix_web::test]
async fn invalid_token_is_treated_as_anonymous() {
    let h = Harness::new();
    let app = test::init_service(App::new().configure(h.configure())).await;

    let req = test::TestRequest::get()
        .uri("/create/")
        .insert_header(("Authorization", "Bearer not-a-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
}

#[actix_web::test]
async fn create_form_offers_groups() {
    let h = Harness::new();
    let author = h.user("auth").await;
    h.group("Test group", "test-slug").await;
    let app = test::init_service(App::new().configure(h.configure())).await;

    let req = test::TestRequest::get()
        .uri("/create/")
        .insert_header(h.bearer(&author))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["template"], "posts/create_post.html");
    assert_eq!(body["context"]["is_edit"], false);
    assert_eq!(body["context"]["groups"][0]["slug"], "test-slug");
}

#[actix_web::test]
async fn create_post_with_image_adds_one_record() {
    let h = Harness::new();
    let author = h.user("auth").await;
    let group = h.group("Test group", "test-slug").await;
    let app = test::init_service(App::new().configure(h.configure())).await;
    let before = h.post_count().await;

    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header(h.bearer(&author))
        .set_json(json!({
            "text": "Created through the form",
            "group": group.id,
            "image": {"name": "small.gif", "content": STANDARD.encode(SMALL_GIF)},
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/auth/");
    assert_eq!(h.post_count().await, before + 1);

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/group/test-slug/").to_request(),
    )
    .await;
    let created = &body["context"]["page_obj"]["items"][0];
    assert_eq!(created["text"], "Created through the form");
    assert_eq!(created["image"], "posts/small.gif");
    assert!(h.media.path().join("posts/small.gif").exists());
}

#[actix_web::test]
async fn invalid_create_rerenders_form() {
    let h = Harness::new();
    let author = h.user("auth").await;
    let app = test::init_service(App::new().configure(h.configure())).await;

    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header(h.bearer(&author))
        .set_json(json!({"text": "   "}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["template"], "posts/create_post.html");
    assert!(body["context"]["form"]["errors"]["text"].is_array());
    assert_eq!(h.post_count().await, 0);
}

#[actix_web::test]
async fn create_with_unknown_group_rerenders_form() {
    let h = Harness::new();
    let author = h.user("auth").await;
    let app = test::init_service(App::new().configure(h.configure())).await;

    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header(h.bearer(&author))
        .set_json(json!({"text": "Text", "group": uuid::Uuid::new_v4()}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert!(body["context"]["form"]["errors"]["group"].is_array());
    assert_eq!(h.post_count().await, 0);
}

#[actix_web::test]
async fn edit_updates_in_place() {
    let h = Harness::new();
    let author = h.user("auth").await;
    let group = h.group("Test group", "test-slug").await;
    let post = h.post(&author, "Original", None).await;
    let app = test::init_service(App::new().configure(h.configure())).await;
    let before = h.post_count().await;

    let form_req = test::TestRequest::get()
        .uri(&format!("/posts/{}/edit/", post.id))
        .insert_header(h.bearer(&author))
        .to_request();
    let form: Value = test::call_and_read_body_json(&app, form_req).await;
    assert_eq!(form["context"]["is_edit"], true);
    assert_eq!(form["context"]["form"]["text"], "Original");

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit/", post.id))
        .insert_header(h.bearer(&author))
        .set_json(json!({"text": "Edited", "group": group.id}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));
    assert_eq!(h.post_count().await, before);

    let stored = h.state.repos.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "Edited");
    assert_eq!(stored.group_id, Some(group.id));
}

#[actix_web::test]
async fn non_author_cannot_edit() {
    let h = Harness::new();
    let author = h.user("auth").await;
    let stranger = h.user("stranger").await;
    let post = h.post(&author, "Original", None).await;
    let app = test::init_service(App::new().configure(h.configure())).await;

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit/", post.id))
        .insert_header(h.bearer(&stranger))
        .set_json(json!({"text": "Hijacked"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));
    let stored = h.state.repos.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "Original");
}

#[actix_web::test]
async fn comment_appears_on_detail() {
    let h = Harness::new();
    let author = h.user("auth").await;
    let reader = h.user("reader").await;
    let post = h.post(&author, "Commented post", None).await;
    let app = test::init_service(App::new().configure(h.configure())).await;

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post.id))
        .insert_header(h.bearer(&reader))
        .set_json(json!({"text": "Nice post"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let detail: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/posts/{}/", post.id))
            .to_request(),
    )
    .await;
    assert_eq!(detail["template"], "posts/post_detail.html");
    assert_eq!(detail["context"]["author_post_count"], 1);
    assert_eq!(detail["context"]["comments"][0]["text"], "Nice post");
    assert_eq!(detail["context"]["comments"][0]["author"], "reader");
}

#[actix_web::test]
async fn blank_comment_is_dropped() {
    let h = Harness::new();
    let author = h.user("auth").await;
    let post = h.post(&author, "Quiet post", None).await;
    let app = test::init_service(App::new().configure(h.configure())).await;

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post.id))
        .insert_header(h.bearer(&author))
        .set_json(json!({"text": ""}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(h.state.repos.comments.find_by_post(post.id).await.unwrap().is_empty());
}

#[actix_web::test]
async fn unknown_post_is_404() {
    let h = Harness::new();
    let author = h.user("auth").await;
    let app = test::init_service(App::new().configure(h.configure())).await;

    for uri in [
        format!("/posts/{}/", uuid::Uuid::new_v4()),
        "/posts/not-a-uuid/".to_string(),
    ] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", uuid::Uuid::new_v4()))
        .insert_header(h.bearer(&author))
        .set_json(json!({"text": "Into the void"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

fn image_form(text: &str, file_name: &str) -> Value {
    json!({
        "text": text,
        "image": {"name": file_name, "content": STANDARD.encode(SMALL_GIF)},
    })
}

/// Seed a post whose image file already exists on disk.
async fn post_with_stored_image(
    h: &Harness,
    posts: &dyn PostRepository,
    author: &User,
) -> Post {
    let dir = h.media.path().join("posts");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("old.gif"), SMALL_GIF).unwrap();

    posts
        .create(Post::new(author.id, "Illustrated".to_string(), None).with_image("posts/old.gif"))
        .await
        .unwrap()
}

#[actix_web::test]
async fn edit_with_new_image_replaces_old_file() {
    let h = Harness::new();
    let author = h.user("auth").await;
    let post = post_with_stored_image(&h, h.state.repos.posts.as_ref(), &author).await;
    let app = test::init_service(App::new().configure(h.configure())).await;

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit/", post.id))
        .insert_header(h.bearer(&author))
        .set_json(image_form("Illustrated again", "new.gif"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let stored = h.state.repos.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.image.as_deref(), Some("posts/new.gif"));
    assert!(h.media.path().join("posts/new.gif").exists());
    assert!(!h.media.path().join("posts/old.gif").exists());
}

#[actix_web::test]
async fn edit_without_image_keeps_existing_file() {
    let h = Harness::new();
    let author = h.user("auth").await;
    let post = post_with_stored_image(&h, h.state.repos.posts.as_ref(), &author).await;
    let app = test::init_service(App::new().configure(h.configure())).await;

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit/", post.id))
        .insert_header(h.bearer(&author))
        .set_json(json!({"text": "Text only"}))
        .to_request();
    test::call_service(&app, req).await;

    let stored = h.state.repos.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.image.as_deref(), Some("posts/old.gif"));
    assert!(h.media.path().join("posts/old.gif").exists());
}

#[actix_web::test]
async fn failed_edit_keeps_old_image_and_drops_upload() {
    let repos = Repositories::in_memory();
    let store = repos.posts.clone();
    let h = Harness::with_repos(Repositories {
        posts: Arc::new(FailingWrites {
            inner: store.clone(),
        }),
        ..repos
    });
    let author = h.user("auth").await;
    let post = post_with_stored_image(&h, store.as_ref(), &author).await;
    let app = test::init_service(App::new().configure(h.configure())).await;

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit/", post.id))
        .insert_header(h.bearer(&author))
        .set_json(image_form("Never saved", "new.gif"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let stored = store.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.image.as_deref(), Some("posts/old.gif"));
    assert_eq!(stored.text, "Illustrated");
    assert!(h.media.path().join("posts/old.gif").exists());
    assert!(!h.media.path().join("posts/new.gif").exists());
}

#[actix_web::test]
async fn failed_create_drops_upload() {
    let repos = Repositories::in_memory();
    let store = repos.posts.clone();
    let h = Harness::with_repos(Repositories {
        posts: Arc::new(FailingWrites {
            inner: store.clone(),
        }),
        ..repos
    });
    let author = h.user("auth").await;
    let app = test::init_service(App::new().configure(h.configure())).await;

    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header(h.bearer(&author))
        .set_json(image_form("Never saved", "lost.gif"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(store.count(PostFilter::All).await.unwrap(), 0);
    assert!(!h.media.path().join("posts/lost.gif").exists());
}

#[actix_web::test]
async fn comment_by_missing_author_is_internal_error() {
    let h = Harness::new();
    let author = h.user("auth").await;
    let post = h.post(&author, "Haunted post", None).await;
    h.state
        .repos
        .comments
        .create(Comment::new(post.id, uuid::Uuid::new_v4(), "Ghost".to_string()))
        .await
        .unwrap();
    let app = test::init_service(App::new().configure(h.configure())).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/posts/{}/", post.id))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn anonymous_follow_keeps_special_characters_in_next() {
    let h = Harness::new();
    let app = test::init_service(App::new().configure(h.configure())).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/profile/a&b/follow/").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/profile/a%26b/follow/");
}
