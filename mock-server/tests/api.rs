use std::convert::Infallible;

use axum::http::{self, Request, StatusCode};
use axum::response::Response;
use http_body_util::BodyExt;
use mock_server::app;
use tower::{Service, ServiceExt};

async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get_request(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn authed_request(method: &str, uri: &str, token: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .body(body.to_string())
        .unwrap()
}

fn authed_get(uri: &str, token: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .body(String::new())
        .unwrap()
}

async fn send<S>(app: &mut S, request: Request<String>) -> Response
where
    S: Service<Request<String>, Response = Response, Error = Infallible>,
{
    app.ready().await.unwrap().call(request).await.unwrap()
}

/// Request a verification code and complete registration; returns the
/// minted token and the user body.
async fn register_user<S>(app: &mut S, name: &str, email: &str) -> (String, serde_json::Value)
where
    S: Service<Request<String>, Response = Response, Error = Infallible>,
{
    let resp = send(
        app,
        json_request(
            "POST",
            "/api/auth/register/code",
            &format!(r#"{{"email":"{email}"}}"#),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let ack: serde_json::Value = body_json(resp).await;
    // The mock has no mailer; the ack's message ends with the code.
    let code = ack["message"]
        .as_str()
        .unwrap()
        .rsplit(' ')
        .next()
        .unwrap()
        .to_string();

    let body = format!(
        r#"{{"name":"{name}","email":"{email}","password":"pw","verificationCode":"{code}"}}"#
    );
    let resp = send(app, json_request("POST", "/api/auth/register", &body)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let session: serde_json::Value = body_json(resp).await;
    (
        session["token"].as_str().unwrap().to_string(),
        session["user"].clone(),
    )
}

// --- health ---

#[tokio::test]
async fn health_returns_ok() {
    let app = app();
    let resp = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["status"], "OK");
}

// --- auth ---

#[tokio::test]
async fn register_without_code_is_rejected() {
    let app = app();
    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            r#"{"name":"Ada","email":"a@b.com","password":"pw","verificationCode":"000000"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["message"], "invalid verification code");
}

#[tokio::test]
async fn me_requires_authentication() {
    let app = app();
    let resp = app.oneshot(get_request("/api/users/me")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn first_account_is_admin_later_ones_are_users() {
    let mut app = app().into_service();

    let (_, admin) = register_user(&mut app, "Ada", "ada@judge.dev").await;
    assert_eq!(admin["role"], "ADMIN");

    let (_, user) = register_user(&mut app, "Grace", "grace@judge.dev").await;
    assert_eq!(user["role"], "USER");

    // Duplicate email is a conflict even with a fresh code.
    let resp = send(
        &mut app,
        json_request(
            "POST",
            "/api/auth/register/code",
            r#"{"email":"ada@judge.dev"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = send(
        &mut app,
        json_request(
            "POST",
            "/api/auth/register",
            r#"{"name":"Ada","email":"ada@judge.dev","password":"pw","verificationCode":"whatever"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_verifies_credentials_and_stamps_last_login() {
    let mut app = app().into_service();
    let (_, user) = register_user(&mut app, "Ada", "ada@judge.dev").await;
    assert!(user.get("lastLoginAt").is_none());

    let resp = send(
        &mut app,
        json_request(
            "POST",
            "/api/auth/login",
            r#"{"email":"ada@judge.dev","password":"wrong"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["message"], "invalid credentials");

    let resp = send(
        &mut app,
        json_request(
            "POST",
            "/api/auth/login",
            r#"{"email":"ada@judge.dev","password":"pw"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let session: serde_json::Value = body_json(resp).await;
    assert!(session["token"].as_str().unwrap().len() > 10);
    assert!(session["user"]["lastLoginAt"].is_string());
}

// --- problems ---

#[tokio::test]
async fn problem_crud_requires_admin() {
    let mut app = app().into_service();
    let (_, _) = register_user(&mut app, "Ada", "ada@judge.dev").await;
    let (user_token, _) = register_user(&mut app, "Grace", "grace@judge.dev").await;

    let resp = send(
        &mut app,
        authed_request(
            "POST",
            "/api/problems",
            &user_token,
            r#"{"title":"Two Sum","slug":"two-sum","description":"d","difficulty":"EASY","language":"KOTLIN"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn problem_crud_lifecycle() {
    let mut app = app().into_service();
    let (token, _) = register_user(&mut app, "Ada", "ada@judge.dev").await;

    // create
    let resp = send(
        &mut app,
        authed_request(
            "POST",
            "/api/problems",
            &token,
            r#"{"title":"Two Sum","slug":"two-sum","description":"Find the pair.","difficulty":"EASY","language":"KOTLIN","tags":["arrays"]}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: serde_json::Value = body_json(resp).await;
    let id = created["id"].as_str().unwrap().to_string();

    // duplicate slug
    let resp = send(
        &mut app,
        authed_request(
            "POST",
            "/api/problems",
            &token,
            r#"{"title":"Other","slug":"two-sum","description":"d","difficulty":"EASY","language":"KOTLIN"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // fetch by slug and by id, no auth required
    let resp = send(&mut app, get_request("/api/problems/two-sum")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let by_slug: serde_json::Value = body_json(resp).await;
    assert_eq!(by_slug["id"], id.as_str());

    let resp = send(&mut app, get_request(&format!("/api/problems/{id}"))).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // update
    let resp = send(
        &mut app,
        authed_request(
            "PUT",
            &format!("/api/problems/{id}"),
            &token,
            r#"{"title":"Two Sum II","slug":"two-sum","description":"Find the pair.","difficulty":"MEDIUM","language":"KOTLIN"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: serde_json::Value = body_json(resp).await;
    assert_eq!(updated["title"], "Two Sum II");
    assert_eq!(updated["difficulty"], "MEDIUM");

    // list
    let resp = send(&mut app, get_request("/api/problems")).await;
    let problems: Vec<serde_json::Value> = body_json(resp).await;
    assert_eq!(problems.len(), 1);

    // delete
    let resp = send(
        &mut app,
        authed_request("DELETE", &format!("/api/problems/{id}"), &token, ""),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = send(&mut app, get_request("/api/problems/two-sum")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- submissions and dashboard ---

#[tokio::test]
async fn submission_and_dashboard_flow() {
    let mut app = app().into_service();
    let (admin_token, _) = register_user(&mut app, "Ada", "ada@judge.dev").await;
    let (user_token, user) = register_user(&mut app, "Grace", "grace@judge.dev").await;

    let resp = send(
        &mut app,
        authed_request(
            "POST",
            "/api/problems",
            &admin_token,
            r#"{"title":"Two Sum","slug":"two-sum","description":"d","difficulty":"EASY","language":"PYTHON"}"#,
        ),
    )
    .await;
    let problem: serde_json::Value = body_json(resp).await;
    let problem_id = problem["id"].as_str().unwrap().to_string();

    // passing submission
    let resp = send(
        &mut app,
        authed_request(
            "POST",
            "/api/submissions",
            &user_token,
            &format!(
                r#"{{"problemId":"{problem_id}","files":{{"main.py":"print(42)"}}}}"#
            ),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let passing: serde_json::Value = body_json(resp).await;
    assert_eq!(passing["status"], "COMPLETED");
    assert_eq!(passing["score"], 100.0);
    assert_eq!(passing["feedback"]["status"], "SUCCESS");

    // failing submission (blank file)
    let resp = send(
        &mut app,
        authed_request(
            "POST",
            "/api/submissions",
            &user_token,
            &format!(r#"{{"problemId":"{problem_id}","files":{{"main.py":"  "}}}}"#),
        ),
    )
    .await;
    let failing: serde_json::Value = body_json(resp).await;
    assert_eq!(failing["status"], "FAILED");
    assert_eq!(failing["score"], 0.0);

    // unknown problem
    let resp = send(
        &mut app,
        authed_request(
            "POST",
            "/api/submissions",
            &user_token,
            r#"{"problemId":"nope","files":{"main.py":"x"}}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // the caller sees only their own submissions, newest first
    let resp = send(&mut app, authed_get("/api/submissions", &user_token)).await;
    let mine: Vec<serde_json::Value> = body_json(resp).await;
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|s| s["userId"] == user["id"]));

    let resp = send(&mut app, authed_get("/api/submissions", &admin_token)).await;
    let admins: Vec<serde_json::Value> = body_json(resp).await;
    assert!(admins.is_empty());

    // an admin may read any single submission; a stranger's id 404s
    let submission_id = passing["id"].as_str().unwrap();
    let resp = send(
        &mut app,
        authed_get(&format!("/api/submissions/{submission_id}"), &admin_token),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    // execute echoes the command
    let resp = send(
        &mut app,
        authed_request(
            "POST",
            "/api/execute",
            &user_token,
            r#"{"language":"PYTHON","files":{"main.py":"print(1)"},"testCommand":"python main.py"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let execution: serde_json::Value = body_json(resp).await;
    assert_eq!(execution["success"], true);
    assert_eq!(execution["data"]["status"], "SUCCESS");
    assert_eq!(execution["data"]["exitCode"], 0);

    // dashboard aggregates
    let resp = send(&mut app, get_request("/api/dashboard/stats")).await;
    let stats: serde_json::Value = body_json(resp).await;
    assert_eq!(stats["totalUsers"], 2);
    assert_eq!(stats["totalProblems"], 1);
    assert_eq!(stats["totalSubmissions"], 2);
    assert_eq!(stats["successRate"], 0.5);

    // leaderboard with and without limit
    let resp = send(&mut app, get_request("/api/leaderboard")).await;
    let rows: Vec<serde_json::Value> = body_json(resp).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Grace");
    assert_eq!(rows[0]["score"], 100.0);

    let resp = send(&mut app, get_request("/api/leaderboard?limit=0")).await;
    let rows: Vec<serde_json::Value> = body_json(resp).await;
    assert!(rows.is_empty());
}

// --- user administration ---

#[tokio::test]
async fn user_administration_lifecycle() {
    let mut app = app().into_service();
    let (admin_token, _) = register_user(&mut app, "Ada", "ada@judge.dev").await;
    let (user_token, user) = register_user(&mut app, "Grace", "grace@judge.dev").await;
    let user_id = user["id"].as_str().unwrap().to_string();

    // listing requires the ADMIN role
    let resp = send(&mut app, authed_get("/api/users", &user_token)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = send(&mut app, authed_get("/api/users", &admin_token)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let users: Vec<serde_json::Value> = body_json(resp).await;
    assert_eq!(users.len(), 2);

    // promote, with an invalid role rejected first
    let resp = send(
        &mut app,
        authed_request(
            "PUT",
            &format!("/api/users/{user_id}/role"),
            &admin_token,
            r#"{"role":"ROOT"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send(
        &mut app,
        authed_request(
            "PUT",
            &format!("/api/users/{user_id}/role"),
            &admin_token,
            r#"{"role":"ADMIN"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let promoted: serde_json::Value = body_json(resp).await;
    assert_eq!(promoted["role"], "ADMIN");

    // delete revokes the account and its tokens
    let resp = send(
        &mut app,
        authed_request("DELETE", &format!("/api/users/{user_id}"), &admin_token, ""),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = send(&mut app, authed_get("/api/users/me", &user_token)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = send(
        &mut app,
        authed_request("DELETE", &format!("/api/users/{user_id}"), &admin_token, ""),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
