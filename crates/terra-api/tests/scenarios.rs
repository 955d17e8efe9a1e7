/// End-to-end request scenarios against the full API router.
///
/// Each test builds a fresh in-memory database and drives the router with
/// `oneshot`, so no socket is bound.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use terra_api::auth::hash_password;
use terra_api::{AppState, AppStateInner, api_router, with_security_headers};
use terra_db::Database;
use terra_types::models::{Role, VoteDirection};

const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "admin12345";

struct TestApp {
    router: Router,
    state: AppState,
}

impl TestApp {
    fn new() -> Self {
        let state: AppState = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt_secret: "test-secret".into(),
        });
        let router = with_security_headers(api_router(state.clone()));
        Self { router, state }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Register a regular user and return (token, user id).
    async fn register(&self, email: &str, name: &str) -> (String, Uuid) {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({ "email": email, "password": "correct-horse", "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        token_and_id(&body)
    }

    async fn admin(&self) -> (String, Uuid) {
        let hash = hash_password(ADMIN_PASSWORD).unwrap();
        self.state
            .db
            .create_user(Uuid::new_v4(), ADMIN_EMAIL, &hash, "Admin User", Role::Admin)
            .unwrap()
            .unwrap();

        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        token_and_id(&body)
    }

    async fn create_post(&self, token: &str, title: &str) -> Uuid {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/community/posts",
                Some(token),
                Some(json!({ "title": title, "content": "Body text", "category": "general" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        id_of(&body)
    }
}

fn token_and_id(body: &Value) -> (String, Uuid) {
    let token = body["token"].as_str().unwrap().to_string();
    (token, id_of(&body["user"]))
}

fn id_of(body: &Value) -> Uuid {
    body["id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn register_login_and_me() {
    let app = TestApp::new();
    let (token, id) = app.register("  Alice@Example.com ", "Alice").await;

    let (status, me) = app.send(Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(id_of(&me), id);
    assert_eq!(me["email"], "alice@example.com");
    assert_eq!(me["role"], "user");
    assert!(me.get("password_hash").is_none());

    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "alice@example.com", "password": "another-pass", "name": "A" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "alice@example.com", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");

    let (status, _) = app.send(Method::GET, "/api/auth/me", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn carbon_entry_feeds_analytics() {
    let app = TestApp::new();
    let (token, _) = app.register("carbon@example.com", "Carbon").await;

    let (status, entry) = app
        .send(
            Method::POST,
            "/api/carbon/entries",
            Some(&token),
            Some(json!({ "category": "transport", "value": 10.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{entry}");
    assert_eq!(entry["calculated_emissions"].as_f64().unwrap(), 2.0);

    let (status, entries) = app
        .send(Method::GET, "/api/carbon/entries", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entries.as_array().unwrap().len(), 1);
    assert_eq!(entries[0]["id"], entry["id"]);

    let (status, analytics) = app
        .send(Method::GET, "/api/carbon/analytics", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(analytics["total_footprint"].as_f64().unwrap(), 2.0);
    assert_eq!(analytics["total_by_category"][0]["category"], "transport");
    assert_eq!(analytics["monthly_emissions"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/carbon/entries",
            Some(&token),
            Some(json!({ "category": "food", "value": -3.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn carbon_entries_are_private() {
    let app = TestApp::new();
    let (owner, _) = app.register("owner@example.com", "Owner").await;
    let (other, _) = app.register("other@example.com", "Other").await;

    let (_, entry) = app
        .send(
            Method::POST,
            "/api/carbon/entries",
            Some(&owner),
            Some(json!({ "category": "energy", "value": 4.0, "date": "2026-01-15" })),
        )
        .await;
    let uri = format!("/api/carbon/entries/{}", entry["id"].as_str().unwrap());

    let (status, _) = app.send(Method::DELETE, &uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, updated) = app
        .send(
            Method::PUT,
            &uri,
            Some(&owner),
            Some(json!({ "category": "food", "value": 2.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["calculated_emissions"].as_f64().unwrap(), 3.0);
    assert_eq!(updated["date"], "2026-01-15");
}

#[tokio::test]
async fn only_author_or_admin_may_delete_a_post() {
    let app = TestApp::new();
    let (author, _) = app.register("author@example.com", "Author").await;
    let (stranger, _) = app.register("stranger@example.com", "Stranger").await;
    let (admin, _) = app.admin().await;

    let post_id = app.create_post(&author, "Bike to work week").await;
    let uri = format!("/api/community/posts/{post_id}");

    let (status, body) = app.send(Method::DELETE, &uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");

    let (status, _) = app.send(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let missing = format!("/api/community/posts/{}", Uuid::new_v4());
    let (status, _) = app.send(Method::DELETE, &missing, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn strangers_cannot_edit_comments() {
    let app = TestApp::new();
    let (author, _) = app.register("author@example.com", "Author").await;
    let (stranger, _) = app.register("stranger@example.com", "Stranger").await;

    let post_id = app.create_post(&author, "Composting tips").await;
    let (status, comment) = app
        .send(
            Method::POST,
            "/api/community/comments",
            Some(&author),
            Some(json!({ "post_id": post_id, "content": "Start with a bin" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/api/community/comments/{}", comment["id"].as_str().unwrap());

    let (status, _) = app
        .send(Method::PUT, &uri, Some(&stranger), Some(json!({ "content": "mine now" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, edited) = app
        .send(Method::PUT, &uri, Some(&author), Some(json!({ "content": "Start small" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["content"], "Start small");

    let (_, detail) = app
        .send(Method::GET, &format!("/api/community/posts/{post_id}"), None, None)
        .await;
    assert_eq!(detail["comments"].as_array().unwrap().len(), 1);
    assert_eq!(detail["author_role"], "user");
}

#[tokio::test]
async fn revoting_replaces_the_previous_vote() {
    let app = TestApp::new();
    let (author, _) = app.register("author@example.com", "Author").await;
    let (voter, voter_id) = app.register("voter@example.com", "Voter").await;
    let post_id = app.create_post(&author, "Heat pumps").await;

    let (status, up) = app
        .send(
            Method::POST,
            "/api/community/votes",
            Some(&voter),
            Some(json!({ "post_id": post_id, "vote_type": "up" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(up["vote_score"], 1);

    let (_, down) = app
        .send(
            Method::POST,
            "/api/community/votes",
            Some(&voter),
            Some(json!({ "post_id": post_id, "vote_type": "down" })),
        )
        .await;
    assert_eq!(down["vote_score"], -1);
    assert_eq!(
        app.state.db.get_vote(voter_id, post_id).unwrap(),
        Some(VoteDirection::Down)
    );

    let (status, _) = app
        .send(
            Method::POST,
            "/api/community/votes",
            Some(&voter),
            Some(json!({ "post_id": post_id, "vote_type": "sideways" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bookmarking_twice_keeps_one_row() {
    let app = TestApp::new();
    let (admin, _) = app.admin().await;
    let (reader, _) = app.register("reader@example.com", "Reader").await;

    let (status, seeded) = app
        .send(Method::POST, "/api/news/fetch-news", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(seeded["count"], 3);
    assert_eq!(seeded["inserted"], 3);

    let (_, reseeded) = app
        .send(Method::POST, "/api/news/fetch-news", Some(&admin), None)
        .await;
    assert_eq!(reseeded["inserted"], 0);

    let (_, articles) = app.send(Method::GET, "/api/news/articles?limit=2", None, None).await;
    assert_eq!(articles.as_array().unwrap().len(), 2);
    let article_id = articles[0]["id"].clone();

    let (first, bookmark) = app
        .send(
            Method::POST,
            "/api/news/bookmarks",
            Some(&reader),
            Some(json!({ "article_id": article_id })),
        )
        .await;
    let (second, again) = app
        .send(
            Method::POST,
            "/api/news/bookmarks",
            Some(&reader),
            Some(json!({ "article_id": article_id })),
        )
        .await;
    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(bookmark["id"], again["id"]);

    let (_, bookmarks) = app
        .send(Method::GET, "/api/news/bookmarks", Some(&reader), None)
        .await;
    assert_eq!(bookmarks.as_array().unwrap().len(), 1);
    assert_eq!(bookmarks[0]["title"], articles[0]["title"]);
}

#[tokio::test]
async fn fetch_news_requires_admin() {
    let app = TestApp::new();
    let (reader, _) = app.register("reader@example.com", "Reader").await;

    let (status, _) = app
        .send(Method::POST, "/api/news/fetch-news", Some(&reader), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_routes_are_guarded() {
    let app = TestApp::new();
    let (user, _) = app.register("user@example.com", "User").await;

    let (status, _) = app.send(Method::GET, "/api/admin/stats", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.send(Method::GET, "/api/admin/stats", Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");

    let (admin, _) = app.admin().await;
    app.create_post(&user, "Hello").await;
    let (status, stats) = app.send(Method::GET, "/api/admin/stats", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalUsers"], 2);
    assert_eq!(stats["totalPosts"], 1);
    assert_eq!(stats["activeToday"], 0);
}

#[tokio::test]
async fn role_changes_apply_without_relogin() {
    let app = TestApp::new();
    let (admin, _) = app.admin().await;
    let (user, user_id) = app.register("promoted@example.com", "Promoted").await;
    let uri = format!("/api/admin/users/{user_id}/role");

    let (status, _) = app
        .send(Method::PUT, &uri, Some(&admin), Some(json!({ "role": "superuser" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(Method::PUT, &uri, Some(&admin), Some(json!({ "role": "admin" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "admin");

    // Same token, new role.
    let (status, _) = app.send(Method::GET, "/api/admin/users", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn reports_flow_through_moderation() {
    let app = TestApp::new();
    let (admin, _) = app.admin().await;
    let (author, _) = app.register("author@example.com", "Author").await;
    let (reporter, _) = app.register("reporter@example.com", "Reporter").await;
    let post_id = app.create_post(&author, "Suspicious link").await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/community/reports",
            Some(&reporter),
            Some(json!({ "reason": "no target" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, report) = app
        .send(
            Method::POST,
            "/api/community/reports",
            Some(&reporter),
            Some(json!({ "post_id": post_id, "reason": "spam" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{report}");
    assert_eq!(report["status"], "pending");

    let (_, listed) = app.send(Method::GET, "/api/admin/reports", Some(&admin), None).await;
    let summary = &listed["reports"][0];
    assert_eq!(summary["reporter_name"], "Reporter");
    assert_eq!(summary["reported_name"], "Author");
    assert_eq!(summary["post_title"], "Suspicious link");

    let uri = format!("/api/admin/reports/{}", report["id"].as_str().unwrap());
    let (status, _) = app
        .send(Method::PUT, &uri, Some(&admin), Some(json!({ "status": "ignored" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = app
        .send(Method::PUT, &uri, Some(&admin), Some(json!({ "status": "resolved" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["report"]["status"], "resolved");
}

#[tokio::test]
async fn unknown_api_paths_are_json_404s() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/api/does-not-exist", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Route not found");

    let (status, body) = app.send(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let app = TestApp::new();
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
    assert_eq!(headers["referrer-policy"], "no-referrer");
    assert_eq!(headers["cross-origin-resource-policy"], "cross-origin");
    assert_eq!(headers["x-dns-prefetch-control"], "off");
}

#[tokio::test]
async fn malformed_input_is_a_json_bad_request() {
    let app = TestApp::new();
    let (token, _) = app.register("typo@example.com", "Typo").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/community/posts",
            Some(&token),
            Some(json!({ "title": "t" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().is_some(), "{body}");

    let (status, body) = app
        .send(Method::DELETE, "/api/community/posts/not-a-uuid", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().is_some(), "{body}");

    let (status, body) = app
        .send(Method::GET, "/api/news/articles?limit=lots", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().is_some(), "{body}");
}

#[tokio::test]
async fn carbon_value_may_be_a_numeric_string() {
    let app = TestApp::new();
    let (token, _) = app.register("form@example.com", "Form").await;

    let (status, entry) = app
        .send(
            Method::POST,
            "/api/carbon/entries",
            Some(&token),
            Some(json!({ "category": "transport", "value": "10" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{entry}");
    assert_eq!(entry["calculated_emissions"].as_f64().unwrap(), 2.0);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/carbon/entries",
            Some(&token),
            Some(json!({ "category": "transport", "value": "ten" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().is_some(), "{body}");
}

#[tokio::test]
async fn strangers_cannot_delete_comments_or_edit_posts() {
    let app = TestApp::new();
    let (author, _) = app.register("author@example.com", "Author").await;
    let (stranger, _) = app.register("stranger@example.com", "Stranger").await;

    let post_id = app.create_post(&author, "Rain gardens").await;
    let (_, comment) = app
        .send(
            Method::POST,
            "/api/community/comments",
            Some(&author),
            Some(json!({ "post_id": post_id, "content": "Native plants help" })),
        )
        .await;
    let comment_uri = format!("/api/community/comments/{}", comment["id"].as_str().unwrap());
    let post_uri = format!("/api/community/posts/{post_id}");

    let (status, _) = app.send(Method::DELETE, &comment_uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            Method::PUT,
            &post_uri,
            Some(&stranger),
            Some(json!({ "title": "Hijacked", "content": "x", "category": "general" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, detail) = app.send(Method::GET, &post_uri, None, None).await;
    assert_eq!(detail["title"], "Rain gardens");
    assert_eq!(detail["comments"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn admins_moderate_any_comment() {
    let app = TestApp::new();
    let (author, _) = app.register("author@example.com", "Author").await;
    let (admin, _) = app.admin().await;

    let post_id = app.create_post(&author, "Solar co-ops").await;
    let (_, comment) = app
        .send(
            Method::POST,
            "/api/community/comments",
            Some(&author),
            Some(json!({ "post_id": post_id, "content": "Buy now!!!" })),
        )
        .await;
    let uri = format!("/api/community/comments/{}", comment["id"].as_str().unwrap());

    let (status, edited) = app
        .send(Method::PUT, &uri, Some(&admin), Some(json!({ "content": "[removed]" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["content"], "[removed]");

    let (status, _) = app.send(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, detail) = app
        .send(Method::GET, &format!("/api/community/posts/{post_id}"), None, None)
        .await;
    assert!(detail["comments"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn deleting_a_user_removes_their_content() {
    let app = TestApp::new();
    let (admin, _) = app.admin().await;
    let (leaver, leaver_id) = app.register("leaver@example.com", "Leaver").await;
    let (stayer, _) = app.register("stayer@example.com", "Stayer").await;

    let (status, listed) = app.send(Method::GET, "/api/admin/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let users = listed["users"].as_array().unwrap();
    assert_eq!(users.len(), 3);
    assert!(users.iter().all(|u| u.get("password_hash").is_none()));
    assert!(users.iter().any(|u| u["email"] == "leaver@example.com"));

    let own_post = app.create_post(&leaver, "Leaving soon").await;
    let other_post = app.create_post(&stayer, "Staying put").await;
    app.send(
        Method::POST,
        "/api/community/comments",
        Some(&leaver),
        Some(json!({ "post_id": other_post, "content": "Bye" })),
    )
    .await;

    let uri = format!("/api/admin/users/{leaver_id}");
    let (status, body) = app.send(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deleted successfully");

    let (status, _) = app
        .send(Method::GET, &format!("/api/community/posts/{own_post}"), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, detail) = app
        .send(Method::GET, &format!("/api/community/posts/{other_post}"), None, None)
        .await;
    assert!(detail["comments"].as_array().unwrap().is_empty());

    let (status, _) = app.send(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listed) = app.send(Method::GET, "/api/admin/users", Some(&admin), None).await;
    assert_eq!(listed["users"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn articles_filter_by_category_and_page() {
    let app = TestApp::new();
    let (admin, _) = app.admin().await;
    app.send(Method::POST, "/api/news/fetch-news", Some(&admin), None)
        .await;

    let (status, tech) = app
        .send(Method::GET, "/api/news/articles?category=technology", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let tech = tech.as_array().unwrap();
    assert_eq!(tech.len(), 1);
    assert_eq!(tech[0]["category"], "technology");

    let (_, none) = app
        .send(Method::GET, "/api/news/articles?category=astrology", None, None)
        .await;
    assert!(none.as_array().unwrap().is_empty());

    let (_, all) = app
        .send(Method::GET, "/api/news/articles?category=", None, None)
        .await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (_, first) = app
        .send(Method::GET, "/api/news/articles?limit=1&offset=0", None, None)
        .await;
    let (_, second) = app
        .send(Method::GET, "/api/news/articles?limit=1&offset=1", None, None)
        .await;
    assert_eq!(first.as_array().unwrap().len(), 1);
    assert_eq!(second.as_array().unwrap().len(), 1);
    assert_ne!(first[0]["id"], second[0]["id"]);

    let (_, past_end) = app
        .send(Method::GET, "/api/news/articles?offset=3", None, None)
        .await;
    assert!(past_end.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn interactions_with_missing_posts_are_404s() {
    let app = TestApp::new();
    let (token, _) = app.register("lost@example.com", "Lost").await;
    let missing = Uuid::new_v4();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/community/comments",
            Some(&token),
            Some(json!({ "post_id": missing, "content": "Hello?" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Post not found");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/community/votes",
            Some(&token),
            Some(json!({ "post_id": missing, "vote_type": "up" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Post not found");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/community/reports",
            Some(&token),
            Some(json!({ "post_id": missing, "reason": "spam" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Post not found");
}
