//! Follow/unfollow and the personalized feed.

mod common;

use std::sync::Arc;

use actix_web::{App, http::StatusCode, test};
use api_server::state::Repositories;
use serde_json::Value;

use common::{Harness, StaleFollowReads, location};
use yatube_core::ports::FollowRepository;

#[actix_web::test]
async fn follow_is_idempotent_and_unfollow_removes_it() {
    let h = Harness::new();
    let follower = h.user("follower").await;
    let author = h.user("author").await;
    let app = test::init_service(App::new().configure(h.configure())).await;

    for _ in 0..2 {
        let req = test::TestRequest::get()
            .uri("/profile/author/follow/")
            .insert_header(h.bearer(&follower))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/follow/");
    }
    assert!(h.state.repos.follows.exists(follower.id, author.id).await.unwrap());
    assert!(!h.state.repos.follows.exists(author.id, follower.id).await.unwrap());

    let req = test::TestRequest::get()
        .uri("/profile/author/unfollow/")
        .insert_header(h.bearer(&follower))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(!h.state.repos.follows.exists(follower.id, author.id).await.unwrap());
}

#[actix_web::test]
async fn unfollow_only_touches_the_matching_edge() {
    let h = Harness::new();
    let follower = h.user("follower").await;
    let first = h.user("first").await;
    let second = h.user("second").await;
    let app = test::init_service(App::new().configure(h.configure())).await;

    for uri in ["/profile/first/follow/", "/profile/second/follow/", "/profile/first/unfollow/"] {
        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header(h.bearer(&follower))
            .to_request();
        test::call_service(&app, req).await;
    }

    assert!(!h.state.repos.follows.exists(follower.id, first.id).await.unwrap());
    assert!(h.state.repos.follows.exists(follower.id, second.id).await.unwrap());
}

#[actix_web::test]
async fn self_follow_is_ignored() {
    let h = Harness::new();
    let user = h.user("auth").await;
    let app = test::init_service(App::new().configure(h.configure())).await;

    let req = test::TestRequest::get()
        .uri("/profile/auth/follow/")
        .insert_header(h.bearer(&user))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(!h.state.repos.follows.exists(user.id, user.id).await.unwrap());
}

#[actix_web::test]
async fn follow_unknown_user_is_404() {
    let h = Harness::new();
    let user = h.user("auth").await;
    let app = test::init_service(App::new().configure(h.configure())).await;

    let req = test::TestRequest::get()
        .uri("/profile/nobody/follow/")
        .insert_header(h.bearer(&user))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn follow_feed_shows_only_followed_authors() {
    let h = Harness::new();
    let follower = h.user("follower").await;
    let bystander = h.user("bystander").await;
    let author = h.user("author").await;
    let post = h.post(&author, "For followers", None).await;
    let app = test::init_service(App::new().configure(h.configure())).await;

    let req = test::TestRequest::get()
        .uri("/profile/author/follow/")
        .insert_header(h.bearer(&follower))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get()
        .uri("/follow/")
        .insert_header(h.bearer(&follower))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["template"], "posts/follow.html");
    assert_eq!(body["context"]["page_obj"]["items"][0]["id"], post.id.to_string());

    let req = test::TestRequest::get()
        .uri("/follow/")
        .insert_header(h.bearer(&bystander))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["context"]["page_obj"]["items"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn profile_reports_following_for_viewer() {
    let h = Harness::new();
    let follower = h.user("follower").await;
    h.user("author").await;
    let app = test::init_service(App::new().configure(h.configure())).await;

    let req = test::TestRequest::get()
        .uri("/profile/author/follow/")
        .insert_header(h.bearer(&follower))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get()
        .uri("/profile/author/")
        .insert_header(h.bearer(&follower))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["context"]["following"], true);
}

#[actix_web::test]
async fn signup_then_login_yields_working_token() {
    let h = Harness::new();
    let app = test::init_service(App::new().configure(h.configure())).await;

    let credentials = serde_json::json!({"username": "newcomer", "password": "long-enough"});
    let req = test::TestRequest::post()
        .uri("/auth/signup/")
        .set_json(&credentials)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_json(&credentials)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let token = body["access_token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/follow/")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_json(serde_json::json!({"username": "newcomer", "password": "wrong-password"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn login_page_echoes_next() {
    let h = Harness::new();
    let app = test::init_service(App::new().configure(h.configure())).await;

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/auth/login/?next=/create/").to_request(),
    )
    .await;
    assert_eq!(body["template"], "users/login.html");
    assert_eq!(body["context"]["next"], "/create/");
}

#[actix_web::test]
async fn follow_losing_a_race_is_still_a_no_op() {
    let repos = Repositories::in_memory();
    let store = repos.follows.clone();
    let h = Harness::with_repos(Repositories {
        follows: Arc::new(StaleFollowReads {
            inner: store.clone(),
        }),
        ..repos
    });
    let follower = h.user("follower").await;
    let author = h.user("author").await;
    let app = test::init_service(App::new().configure(h.configure())).await;

    for _ in 0..2 {
        let req = test::TestRequest::get()
            .uri("/profile/author/follow/")
            .insert_header(h.bearer(&follower))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/follow/");
    }
    assert!(store.exists(follower.id, author.id).await.unwrap());
}

#[actix_web::test]
async fn account_without_password_cannot_log_in() {
    let h = Harness::new();
    h.user("seeded").await;
    let app = test::init_service(App::new().configure(h.configure())).await;

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_json(serde_json::json!({"username": "seeded", "password": "unusable"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
