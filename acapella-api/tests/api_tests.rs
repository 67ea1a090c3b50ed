//! Integration tests for the acapella-api HTTP surface
//!
//! Tests cover:
//! - Health endpoint (no auth required)
//! - Signup, login, and bearer-token gating of protected routes
//! - Follow/unfollow toggle parity and counter consistency
//! - Like round trips and `likes_count` maintenance
//! - Review creation, validation messages, and delete cascade
//! - The end-to-end path: follow, review, home feed
//! - Feed cursor pagination with `has_more`
//! - Role management and the admin application queue

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use std::path::PathBuf;
use tower::util::ServiceExt; // for `oneshot` method

use acapella_api::{build_router, AppState};
use acapella_common::config::ServiceConfig;
use acapella_common::db::init_memory_database;

/// Test helper: fresh in-memory app, optionally with master admin emails.
async fn setup_app(master_admins: &[&str]) -> axum::Router {
    let db = init_memory_database().await.unwrap();
    let config = ServiceConfig {
        root_folder: PathBuf::from("/tmp"),
        port: 0,
        master_admin_emails: master_admins.iter().map(|s| s.to_string()).collect(),
    };
    build_router(AppState::new(db, config))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn authed(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Test helper: extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Sign up and return (token, user json).
async fn signup(app: &axum::Router, email: &str) -> (String, Value) {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/signup",
            None,
            json!({ "email": email, "password": "password1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"].clone(),
    )
}

/// Create a song through the admin API and return its id.
async fn create_song(app: &axum::Router, admin_token: &str, title: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/songs",
            Some(admin_token),
            json!({ "title": title, "duration_secs": 200, "genre": "Pop" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    body["id"].as_str().unwrap().to_string()
}

// =============================================================================
// Health and auth plumbing
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let app = setup_app(&[]).await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "acapella-api");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = setup_app(&[]).await;

    let response = app.clone().oneshot(get("/api/me")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(authed("GET", "/api/me", "not-a-real-token"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signup_login_me() {
    let app = setup_app(&[]).await;
    let (token, user) = signup(&app, "jane.doe@example.com").await;

    // Username synthesized from the email local part
    assert_eq!(user["username"], "janedoe");
    assert_eq!(user["role"], "user");
    assert_eq!(user["profile_complete"], false);

    let response = app
        .clone()
        .oneshot(authed("GET", "/api/me", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let me = extract_json(response.into_body()).await;
    assert_eq!(me["username"], "janedoe");

    // Fresh login issues a second working token
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "jane.doe@example.com", "password": "password1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Wrong password is rejected
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "jane.doe@example.com", "password": "wrong-password" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let app = setup_app(&[]).await;
    let (token, _) = signup(&app, "leaver@example.com").await;

    let response = app
        .clone()
        .oneshot(authed("POST", "/api/auth/logout", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(authed("GET", "/api/me", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signup_collision_gets_distinct_username() {
    let app = setup_app(&[]).await;
    let (_, first) = signup(&app, "bob@example.com").await;
    let (_, second) = signup(&app, "bob@other.com").await;

    assert_eq!(first["username"], "bob");
    assert_ne!(second["username"], first["username"]);
    assert!(second["username"].as_str().unwrap().starts_with("bob"));
}

#[tokio::test]
async fn test_master_admin_email_elevated() {
    let app = setup_app(&["boss@example.com"]).await;
    let (_, user) = signup(&app, "Boss@Example.com").await;
    assert_eq!(user["role"], "master_admin");
}

// =============================================================================
// Profiles
// =============================================================================

#[tokio::test]
async fn test_profile_update_and_public_fetch() {
    let app = setup_app(&[]).await;
    let (token, _) = signup(&app, "carol@example.com").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/api/me",
            Some(&token),
            json!({
                "username": "carol_m",
                "display_name": "Carol M",
                "bio": "I review things."
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = extract_json(response.into_body()).await;
    assert_eq!(updated["username"], "carol_m");
    assert_eq!(updated["profile_complete"], true);

    let response = app.oneshot(get("/api/users/carol_m")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let profile = extract_json(response.into_body()).await;
    assert_eq!(profile["display_name"], "Carol M");
}

#[tokio::test]
async fn test_reserved_username_rejected() {
    let app = setup_app(&[]).await;
    let (token, _) = signup(&app, "sneaky@example.com").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/api/me",
            Some(&token),
            json!({ "username": "admin" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The check endpoint agrees
    let response = app
        .oneshot(get("/api/username-check?username=admin"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["available"], false);
}

#[tokio::test]
async fn test_username_taken_is_conflict() {
    let app = setup_app(&[]).await;
    let (token_a, _) = signup(&app, "first@example.com").await;
    let (token_b, _) = signup(&app, "second@example.com").await;

    let claim = json!({ "username": "shared_handle" });
    let response = app
        .clone()
        .oneshot(json_request("PATCH", "/api/me", Some(&token_a), claim.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request("PATCH", "/api/me", Some(&token_b), claim))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// =============================================================================
// Follow graph
// =============================================================================

#[tokio::test]
async fn test_follow_toggle_parity_and_counters() {
    let app = setup_app(&[]).await;
    let (token_a, user_a) = signup(&app, "a@example.com").await;
    let (_, user_b) = signup(&app, "b@example.com").await;
    let uid_b = user_b["uid"].as_str().unwrap();
    let name_a = user_a["username"].as_str().unwrap().to_string();
    let name_b = user_b["username"].as_str().unwrap().to_string();

    // Follow, duplicate follow, unfollow, follow again: net effect one edge
    for (method, changed) in [
        ("POST", true),
        ("POST", false),
        ("DELETE", true),
        ("POST", true),
    ] {
        let response = app
            .clone()
            .oneshot(authed(method, &format!("/api/follows/{}", uid_b), &token_a))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = extract_json(response.into_body()).await;
        assert_eq!(body["changed"], changed);
    }

    let response = app
        .clone()
        .oneshot(get(&format!("/api/users/{}", name_b)))
        .await
        .unwrap();
    let profile_b = extract_json(response.into_body()).await;
    assert_eq!(profile_b["followers_count"], 1);

    let response = app
        .clone()
        .oneshot(get(&format!("/api/users/{}/followers", name_b)))
        .await
        .unwrap();
    let followers = extract_json(response.into_body()).await;
    assert_eq!(followers.as_array().unwrap().len(), 1);
    assert_eq!(followers[0]["username"], name_a.as_str());

    let response = app
        .oneshot(get(&format!("/api/users/{}/following", name_a)))
        .await
        .unwrap();
    let following = extract_json(response.into_body()).await;
    assert_eq!(following[0]["uid"], uid_b);
}

#[tokio::test]
async fn test_self_follow_rejected() {
    let app = setup_app(&[]).await;
    let (token, user) = signup(&app, "loner@example.com").await;
    let uid = user["uid"].as_str().unwrap();

    let response = app
        .oneshot(authed("POST", &format!("/api/follows/{}", uid), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_follow_unknown_user_is_not_found() {
    let app = setup_app(&[]).await;
    let (token, _) = signup(&app, "eager@example.com").await;

    let response = app
        .oneshot(authed("POST", "/api/follows/no-such-uid", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Likes
// =============================================================================

#[tokio::test]
async fn test_like_round_trip_updates_count() {
    let app = setup_app(&["admin@example.com"]).await;
    let (admin_token, _) = signup(&app, "admin@example.com").await;
    let (fan_token, fan) = signup(&app, "fan@example.com").await;
    let song_id = create_song(&app, &admin_token, "Anthem").await;

    let like_uri = format!("/api/likes/song/{}", song_id);
    let response = app
        .clone()
        .oneshot(authed("POST", &like_uri, &fan_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Duplicate like does not double-count
    let response = app
        .clone()
        .oneshot(authed("POST", &like_uri, &fan_token))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["changed"], false);

    let response = app
        .clone()
        .oneshot(get(&format!("/api/songs/{}", song_id)))
        .await
        .unwrap();
    let song = extract_json(response.into_body()).await;
    assert_eq!(song["likes_count"], 1);

    // The user's like list carries the denormalized title
    let username = fan["username"].as_str().unwrap();
    let response = app
        .clone()
        .oneshot(get(&format!("/api/users/{}/likes", username)))
        .await
        .unwrap();
    let likes = extract_json(response.into_body()).await;
    assert_eq!(likes[0]["entity_title"], "Anthem");

    // Unlike restores the count
    let response = app
        .clone()
        .oneshot(authed("DELETE", &like_uri, &fan_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get(&format!("/api/songs/{}", song_id)))
        .await
        .unwrap();
    let song = extract_json(response.into_body()).await;
    assert_eq!(song["likes_count"], 0);
}

// =============================================================================
// Reviews
// =============================================================================

#[tokio::test]
async fn test_review_validation_messages() {
    let app = setup_app(&["admin@example.com"]).await;
    let (admin_token, _) = signup(&app, "admin@example.com").await;
    let song_id = create_song(&app, &admin_token, "Overture").await;

    // Missing rating keeps the picker message
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/reviews",
            Some(&admin_token),
            json!({
                "entity_type": "song",
                "entity_id": song_id,
                "rating": 0,
                "review_text": "long enough review text"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Please select a rating.");

    // Too-short text
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/reviews",
            Some(&admin_token),
            json!({
                "entity_type": "song",
                "entity_id": song_id,
                "rating": 4,
                "review_text": "meh"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_review_conflicts() {
    let app = setup_app(&["admin@example.com"]).await;
    let (admin_token, _) = signup(&app, "admin@example.com").await;
    let song_id = create_song(&app, &admin_token, "Overture").await;

    let review = json!({
        "entity_type": "song",
        "entity_id": song_id,
        "rating": 4,
        "review_text": "a solid tune overall"
    });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/reviews", Some(&admin_token), review.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request("POST", "/api/reviews", Some(&admin_token), review))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_review_delete_cascades_likes_and_counts() {
    let app = setup_app(&["admin@example.com"]).await;
    let (admin_token, _) = signup(&app, "admin@example.com").await;
    let (critic_token, _) = signup(&app, "critic@example.com").await;
    let (fan_token, fan) = signup(&app, "fan@example.com").await;
    let song_id = create_song(&app, &admin_token, "Overture").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/reviews",
            Some(&critic_token),
            json!({
                "entity_type": "song",
                "entity_id": song_id,
                "rating": 5,
                "review_text": "instant classic, truly"
            }),
        ))
        .await
        .unwrap();
    let review = extract_json(response.into_body()).await;
    let review_id = review["id"].as_str().unwrap().to_string();

    app.clone()
        .oneshot(authed(
            "POST",
            &format!("/api/likes/review/{}", review_id),
            &fan_token,
        ))
        .await
        .unwrap();

    // A stranger cannot delete
    let response = app
        .clone()
        .oneshot(authed(
            "DELETE",
            &format!("/api/reviews/{}", review_id),
            &fan_token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The author can
    let response = app
        .clone()
        .oneshot(authed(
            "DELETE",
            &format!("/api/reviews/{}", review_id),
            &critic_token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get(&format!("/api/reviews/{}", review_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The fan's like on the review is gone, and the song counter rolled back
    let fan_name = fan["username"].as_str().unwrap();
    let response = app
        .clone()
        .oneshot(get(&format!("/api/users/{}/likes", fan_name)))
        .await
        .unwrap();
    let likes = extract_json(response.into_body()).await;
    assert!(likes.as_array().unwrap().is_empty());

    let response = app
        .oneshot(get(&format!("/api/songs/{}", song_id)))
        .await
        .unwrap();
    let song = extract_json(response.into_body()).await;
    assert_eq!(song["review_count"], 0);
}

// =============================================================================
// Feeds
// =============================================================================

#[tokio::test]
async fn test_follow_review_home_feed_end_to_end() {
    let app = setup_app(&["admin@example.com"]).await;
    let (admin_token, _) = signup(&app, "admin@example.com").await;
    let (reader_token, _) = signup(&app, "reader@example.com").await;
    let (writer_token, writer) = signup(&app, "writer@example.com").await;
    let (stranger_token, _) = signup(&app, "stranger@example.com").await;
    let song_id = create_song(&app, &admin_token, "Midnight City").await;

    // Reader follows writer but not stranger
    app.clone()
        .oneshot(authed(
            "POST",
            &format!("/api/follows/{}", writer["uid"].as_str().unwrap()),
            &reader_token,
        ))
        .await
        .unwrap();

    for token in [&writer_token, &stranger_token] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/reviews",
                Some(token),
                json!({
                    "entity_type": "song",
                    "entity_id": song_id,
                    "rating": 5,
                    "review_text": "this one stays on repeat"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(authed("GET", "/api/feed/home", &reader_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let feed = extract_json(response.into_body()).await;

    let items = feed["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["user_id"], writer["uid"]);
    assert_eq!(items[0]["activity_type"], "review");
    assert_eq!(items[0]["entity_title"], "Midnight City");
    assert_eq!(feed["has_more"], false);
}

#[tokio::test]
async fn test_user_activity_merges_and_paginates() {
    let app = setup_app(&["admin@example.com"]).await;
    let (admin_token, _) = signup(&app, "admin@example.com").await;
    let (token, user) = signup(&app, "active@example.com").await;
    let (_, other) = signup(&app, "other@example.com").await;
    let username = user["username"].as_str().unwrap().to_string();

    // Three kinds of activity: two likes, one review, one follow. Spaced
    // out so every item lands on a distinct millisecond and the timestamp
    // cursor splits the pages cleanly.
    let song_a = create_song(&app, &admin_token, "Song A").await;
    let song_b = create_song(&app, &admin_token, "Song B").await;

    app.clone()
        .oneshot(authed("POST", &format!("/api/likes/song/{}", song_a), &token))
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    app.clone()
        .oneshot(authed("POST", &format!("/api/likes/song/{}", song_b), &token))
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/reviews",
            Some(&token),
            json!({
                "entity_type": "song",
                "entity_id": song_a,
                "rating": 3,
                "review_text": "decent but forgettable"
            }),
        ))
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    app.clone()
        .oneshot(authed(
            "POST",
            &format!("/api/follows/{}", other["uid"].as_str().unwrap()),
            &token,
        ))
        .await
        .unwrap();

    // Page size 2: first page full with a cursor, second page drains the rest
    let response = app
        .clone()
        .oneshot(get(&format!("/api/users/{}/activity?limit=2", username)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page1 = extract_json(response.into_body()).await;
    assert_eq!(page1["items"].as_array().unwrap().len(), 2);
    assert_eq!(page1["has_more"], true);
    let cursor = page1["next_cursor"].as_str().unwrap().to_string();

    let response = app
        .oneshot(get(&format!(
            "/api/users/{}/activity?limit=50&cursor={}",
            username, cursor
        )))
        .await
        .unwrap();
    let page2 = extract_json(response.into_body()).await;
    let remaining = page2["items"].as_array().unwrap();
    assert_eq!(remaining.len(), 2);
    assert_eq!(page2["has_more"], false);

    // Newest first across both pages
    let timestamps: Vec<i64> = page1["items"]
        .as_array()
        .unwrap()
        .iter()
        .chain(remaining.iter())
        .map(|i| i["created_at"].as_i64().unwrap())
        .collect();
    let sorted = {
        let mut s = timestamps.clone();
        s.sort_by(|a, b| b.cmp(a));
        s
    };
    assert_eq!(timestamps, sorted);
}

// =============================================================================
// Catalog authorization
// =============================================================================

#[tokio::test]
async fn test_catalog_writes_require_admin() {
    let app = setup_app(&[]).await;
    let (token, _) = signup(&app, "regular@example.com").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/songs",
            Some(&token),
            json!({ "title": "Nope", "duration_secs": 100 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_genre_rejected() {
    let app = setup_app(&["admin@example.com"]).await;
    let (admin_token, _) = signup(&app, "admin@example.com").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/songs",
            Some(&admin_token),
            json!({ "title": "X", "duration_secs": 100, "genre": "Bleepcore" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_prefix_matches() {
    let app = setup_app(&["admin@example.com"]).await;
    let (admin_token, _) = signup(&app, "admin@example.com").await;
    create_song(&app, &admin_token, "Midnight City").await;
    create_song(&app, &admin_token, "Morning Light").await;

    let response = app.oneshot(get("/api/search?q=mid")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["songs"].as_array().unwrap().len(), 1);
    assert_eq!(body["songs"][0]["title"], "Midnight City");
    assert!(body["albums"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_role_change_requires_master_admin() {
    let app = setup_app(&["root@example.com"]).await;
    let (root_token, _) = signup(&app, "root@example.com").await;
    let (user_token, user) = signup(&app, "user@example.com").await;
    let uid = user["uid"].as_str().unwrap().to_string();

    // A regular user cannot change roles
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/admin/users/{}/role", uid),
            Some(&user_token),
            json!({ "role": "admin" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Master admin can
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/admin/users/{}/role", uid),
            Some(&root_token),
            json!({ "role": "admin" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = extract_json(response.into_body()).await;
    assert_eq!(updated["role"], "admin");

    // The promoted user can now write to the catalog
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/songs",
            Some(&user_token),
            json!({ "title": "Now Allowed", "duration_secs": 90 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_application_lifecycle() {
    let app = setup_app(&["root@example.com"]).await;
    let (root_token, _) = signup(&app, "root@example.com").await;
    let (user_token, _) = signup(&app, "hopeful@example.com").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/admin-applications",
            Some(&user_token),
            json!({ "message": "I know this catalog inside out." }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let application = extract_json(response.into_body()).await;
    assert_eq!(application["status"], "pending");
    let app_id = application["id"].as_str().unwrap().to_string();

    // A second application while one is pending conflicts
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/admin-applications",
            Some(&user_token),
            json!({ "message": "me again" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Applicants cannot read the queue
    let response = app
        .clone()
        .oneshot(authed("GET", "/api/admin-applications", &user_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The master admin sees it pending
    let response = app
        .clone()
        .oneshot(authed(
            "GET",
            "/api/admin-applications?status=pending",
            &root_token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let pending = extract_json(response.into_body()).await;
    assert_eq!(pending.as_array().unwrap().len(), 1);
    assert_eq!(pending[0]["id"], app_id.as_str());

    // Approval promotes the applicant
    let response = app
        .clone()
        .oneshot(authed(
            "POST",
            &format!("/api/admin-applications/{}/approve", app_id),
            &root_token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let decided = extract_json(response.into_body()).await;
    assert_eq!(decided["status"], "approved");

    let response = app
        .clone()
        .oneshot(authed("GET", "/api/me", &user_token))
        .await
        .unwrap();
    let me = extract_json(response.into_body()).await;
    assert_eq!(me["role"], "admin");

    // And the new admin can write to the catalog
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/songs",
            Some(&user_token),
            json!({ "title": "First Addition", "duration_secs": 120 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
