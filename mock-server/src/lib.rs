//! In-memory mock of the judge backend.
//!
//! Implements the REST surface the client core consumes: auth with email
//! verification codes, bearer-token sessions, problem CRUD, synchronous
//! grading, and dashboard aggregates. All state lives in one `RwLock`.
//!
//! Two deliberate mock rules keep tests self-contained: the first account
//! registered becomes ADMIN (so admin flows need no out-of-band seeding),
//! and the verification-code ack echoes the code in its message (there is
//! no mailer to deliver it).
//!
//! DTOs here are defined independently of the client core; the core's
//! integration tests catch schema drift between the two crates.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub difficulty: String,
    pub language: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starter_code: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub total_tests: u32,
    pub passed_tests: u32,
    pub failed_tests: u32,
    pub pass_rate: f64,
    pub score: f64,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    pub user_id: String,
    pub problem_id: String,
    pub status: String,
    pub files: BTreeMap<String, String>,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionBody {
    pub token: String,
    pub user: User,
}

struct Account {
    user: User,
    password: String,
}

#[derive(Default)]
struct JudgeState {
    accounts: HashMap<String, Account>,
    /// token -> user id
    tokens: HashMap<String, String>,
    /// email -> pending verification code, single-use
    codes: HashMap<String, String>,
    problems: HashMap<String, Problem>,
    submissions: HashMap<String, Submission>,
}

type Db = Arc<RwLock<JudgeState>>;

type Failure = (StatusCode, Json<serde_json::Value>);
type ApiResult<T> = Result<T, Failure>;

pub fn app() -> Router {
    let db = Db::default();
    Router::new()
        .route("/health", get(health))
        .route("/api/auth/register/code", post(request_code))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/users/me", get(me))
        .route("/api/users", get(list_users))
        .route("/api/users/{id}/role", put(update_role))
        .route("/api/users/{id}", delete(delete_user))
        .route("/api/problems", get(list_problems).post(create_problem))
        .route(
            "/api/problems/{key}",
            get(get_problem).put(update_problem).delete(delete_problem),
        )
        .route("/api/dashboard/stats", get(dashboard_stats))
        .route("/api/leaderboard", get(leaderboard))
        .route("/api/execute", post(execute))
        .route("/api/submissions", get(list_submissions).post(submit))
        .route("/api/submissions/{id}", get(get_submission))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app().layer(TraceLayer::new_for_http())).await
}

fn fail(status: StatusCode, message: &str) -> Failure {
    (status, Json(json!({ "message": message })))
}

fn mint_token() -> String {
    Uuid::new_v4().simple().to_string()
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

async fn authed(db: &Db, headers: &HeaderMap) -> Result<User, Failure> {
    let token = bearer_token(headers)
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "authentication required"))?;
    let state = db.read().await;
    let user_id = state
        .tokens
        .get(token)
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "invalid token"))?;
    state
        .accounts
        .get(user_id)
        .map(|account| account.user.clone())
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "invalid token"))
}

fn require_admin(user: &User) -> Result<(), Failure> {
    if user.role == "ADMIN" {
        Ok(())
    } else {
        Err(fail(StatusCode::FORBIDDEN, "admin privileges required"))
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "OK" }))
}

#[derive(Deserialize)]
struct CodeRequest {
    email: String,
}

async fn request_code(
    State(db): State<Db>,
    Json(input): Json<CodeRequest>,
) -> Json<serde_json::Value> {
    let minted = mint_token();
    let code = minted[..6].to_string();
    let mut state = db.write().await;
    state.codes.insert(input.email.clone(), code.clone());
    tracing::debug!(email = %input.email, "verification code issued");
    Json(json!({ "message": format!("verification code issued: {code}") }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterInput {
    name: String,
    email: String,
    password: String,
    verification_code: String,
}

async fn register(
    State(db): State<Db>,
    Json(input): Json<RegisterInput>,
) -> ApiResult<(StatusCode, Json<SessionBody>)> {
    let mut state = db.write().await;
    if state
        .accounts
        .values()
        .any(|account| account.user.email == input.email)
    {
        return Err(fail(StatusCode::CONFLICT, "email already registered"));
    }
    if state.codes.get(&input.email) != Some(&input.verification_code) {
        return Err(fail(StatusCode::BAD_REQUEST, "invalid verification code"));
    }
    state.codes.remove(&input.email);

    // Bootstrap rule: the first account is the administrator.
    let role = if state.accounts.is_empty() {
        "ADMIN"
    } else {
        "USER"
    };
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        email: input.email,
        name: input.name,
        role: role.to_string(),
        created_at: now,
        updated_at: now,
        last_login_at: None,
    };
    let token = mint_token();
    state.tokens.insert(token.clone(), user.id.clone());
    state.accounts.insert(
        user.id.clone(),
        Account {
            user: user.clone(),
            password: input.password,
        },
    );
    tracing::debug!(user = %user.id, role, "account registered");
    Ok((StatusCode::CREATED, Json(SessionBody { token, user })))
}

#[derive(Deserialize)]
struct LoginInput {
    email: String,
    password: String,
}

async fn login(
    State(db): State<Db>,
    Json(input): Json<LoginInput>,
) -> ApiResult<Json<SessionBody>> {
    let mut state = db.write().await;
    let account = state
        .accounts
        .values_mut()
        .find(|account| account.user.email == input.email)
        .filter(|account| account.password == input.password)
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "invalid credentials"))?;
    account.user.last_login_at = Some(Utc::now());
    let user = account.user.clone();
    let token = mint_token();
    state.tokens.insert(token.clone(), user.id.clone());
    Ok(Json(SessionBody { token, user }))
}

async fn me(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<User>> {
    let user = authed(&db, &headers).await?;
    Ok(Json(user))
}

// ---------------------------------------------------------------------------
// User administration
// ---------------------------------------------------------------------------

async fn list_users(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Vec<User>>> {
    let caller = authed(&db, &headers).await?;
    require_admin(&caller)?;
    let state = db.read().await;
    let mut users: Vec<User> = state
        .accounts
        .values()
        .map(|account| account.user.clone())
        .collect();
    users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    Ok(Json(users))
}

#[derive(Deserialize)]
struct RoleInput {
    role: String,
}

async fn update_role(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<RoleInput>,
) -> ApiResult<Json<User>> {
    let caller = authed(&db, &headers).await?;
    require_admin(&caller)?;
    if input.role != "ADMIN" && input.role != "USER" {
        return Err(fail(StatusCode::BAD_REQUEST, "unknown role"));
    }
    let mut state = db.write().await;
    let account = state
        .accounts
        .get_mut(&id)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "user not found"))?;
    account.user.role = input.role;
    account.user.updated_at = Utc::now();
    Ok(Json(account.user.clone()))
}

async fn delete_user(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let caller = authed(&db, &headers).await?;
    require_admin(&caller)?;
    let mut state = db.write().await;
    if state.accounts.remove(&id).is_none() {
        return Err(fail(StatusCode::NOT_FOUND, "user not found"));
    }
    // Cascade: the user's tokens and submissions go with the account.
    state.tokens.retain(|_, user_id| user_id != &id);
    state.submissions.retain(|_, submission| submission.user_id != id);
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Problems
// ---------------------------------------------------------------------------

async fn list_problems(State(db): State<Db>) -> Json<Vec<Problem>> {
    let state = db.read().await;
    let mut problems: Vec<Problem> = state.problems.values().cloned().collect();
    problems.sort_by(|a, b| a.title.cmp(&b.title));
    Json(problems)
}

async fn get_problem(
    State(db): State<Db>,
    Path(key): Path<String>,
) -> ApiResult<Json<Problem>> {
    let state = db.read().await;
    state
        .problems
        .values()
        .find(|problem| problem.id == key || problem.slug == key)
        .cloned()
        .map(Json)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "problem not found"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProblemInput {
    title: String,
    slug: String,
    description: String,
    difficulty: String,
    language: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    starter_code: Option<String>,
}

async fn create_problem(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<ProblemInput>,
) -> ApiResult<(StatusCode, Json<Problem>)> {
    let caller = authed(&db, &headers).await?;
    require_admin(&caller)?;
    let mut state = db.write().await;
    if state.problems.values().any(|problem| problem.slug == input.slug) {
        return Err(fail(StatusCode::CONFLICT, "slug already in use"));
    }
    let problem = Problem {
        id: Uuid::new_v4().to_string(),
        title: input.title,
        slug: input.slug,
        description: input.description,
        difficulty: input.difficulty,
        language: input.language,
        tags: input.tags,
        starter_code: input.starter_code,
    };
    state.problems.insert(problem.id.clone(), problem.clone());
    Ok((StatusCode::CREATED, Json(problem)))
}

async fn update_problem(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<ProblemInput>,
) -> ApiResult<Json<Problem>> {
    let caller = authed(&db, &headers).await?;
    require_admin(&caller)?;
    let mut state = db.write().await;
    let problem = state
        .problems
        .get_mut(&id)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "problem not found"))?;
    problem.title = input.title;
    problem.slug = input.slug;
    problem.description = input.description;
    problem.difficulty = input.difficulty;
    problem.language = input.language;
    problem.tags = input.tags;
    problem.starter_code = input.starter_code;
    Ok(Json(problem.clone()))
}

async fn delete_problem(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let caller = authed(&db, &headers).await?;
    require_admin(&caller)?;
    let mut state = db.write().await;
    if state.problems.remove(&id).is_none() {
        return Err(fail(StatusCode::NOT_FOUND, "problem not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Stats {
    total_users: u64,
    total_problems: u64,
    total_submissions: u64,
    success_rate: f64,
}

async fn dashboard_stats(State(db): State<Db>) -> Json<Stats> {
    let state = db.read().await;
    let total = state.submissions.len();
    let passed = state
        .submissions
        .values()
        .filter(|submission| submission.status == "COMPLETED" && submission.score > 0.0)
        .count();
    let success_rate = if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64
    };
    Json(Stats {
        total_users: state.accounts.len() as u64,
        total_problems: state.problems.len() as u64,
        total_submissions: total as u64,
        success_rate,
    })
}

#[derive(Deserialize)]
struct LeaderboardQuery {
    limit: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LeaderboardRow {
    user_id: String,
    name: String,
    score: f64,
}

async fn leaderboard(
    State(db): State<Db>,
    Query(query): Query<LeaderboardQuery>,
) -> Json<Vec<LeaderboardRow>> {
    let state = db.read().await;
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for submission in state.submissions.values() {
        *totals.entry(submission.user_id.as_str()).or_insert(0.0) += submission.score;
    }
    let mut rows: Vec<LeaderboardRow> = totals
        .into_iter()
        .filter_map(|(user_id, score)| {
            state.accounts.get(user_id).map(|account| LeaderboardRow {
                user_id: user_id.to_string(),
                name: account.user.name.clone(),
                score,
            })
        })
        .collect();
    rows.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
    if let Some(limit) = query.limit {
        rows.truncate(limit);
    }
    Json(rows)
}

// ---------------------------------------------------------------------------
// Execution and submissions
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteInput {
    language: String,
    files: BTreeMap<String, String>,
    test_command: String,
}

async fn execute(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<ExecuteInput>,
) -> ApiResult<Json<serde_json::Value>> {
    authed(&db, &headers).await?;
    let ran = input
        .files
        .values()
        .any(|content| !content.trim().is_empty());
    let (status, exit_code, error, tail) = if ran {
        ("SUCCESS", 0, None, "ok")
    } else {
        ("FAILED", 1, Some("no source files provided"), "")
    };
    Ok(Json(json!({
        "success": ran,
        "data": {
            "executionId": Uuid::new_v4().to_string(),
            "status": status,
            "output": format!("[{}] $ {}\n{tail}", input.language, input.test_command),
            "error": error,
            "exitCode": exit_code,
            "executionTime": 42.0,
            "memoryUsed": 16_777_216u64,
        }
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitInput {
    problem_id: String,
    files: BTreeMap<String, String>,
}

async fn submit(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<SubmitInput>,
) -> ApiResult<(StatusCode, Json<Submission>)> {
    let caller = authed(&db, &headers).await?;
    let mut state = db.write().await;
    if !state.problems.contains_key(&input.problem_id) {
        return Err(fail(StatusCode::NOT_FOUND, "problem not found"));
    }
    let submission = grade(&caller.id, input);
    state
        .submissions
        .insert(submission.id.clone(), submission.clone());
    Ok((StatusCode::CREATED, Json(submission)))
}

/// Synchronous stand-in for the real grading pipeline: non-empty files
/// pass every test, empty ones fail them all.
fn grade(user_id: &str, input: SubmitInput) -> Submission {
    let passed = input
        .files
        .values()
        .any(|content| !content.trim().is_empty());
    let (status, exec_status, score, passed_tests, message) = if passed {
        ("COMPLETED", "SUCCESS", 100.0, 3u32, "all tests passed")
    } else {
        ("FAILED", "FAILED", 0.0, 0u32, "submitted files were empty")
    };
    let now = Utc::now();
    Submission {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        problem_id: input.problem_id,
        status: status.to_string(),
        files: input.files,
        score,
        feedback: Some(Feedback {
            total_tests: 3,
            passed_tests,
            failed_tests: 3 - passed_tests,
            pass_rate: passed_tests as f64 / 3.0,
            score,
            status: exec_status.to_string(),
            output: None,
            message: message.to_string(),
        }),
        created_at: now,
        updated_at: now,
    }
}

async fn list_submissions(
    State(db): State<Db>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Submission>>> {
    let caller = authed(&db, &headers).await?;
    let state = db.read().await;
    let mut rows: Vec<Submission> = state
        .submissions
        .values()
        .filter(|submission| submission.user_id == caller.id)
        .cloned()
        .collect();
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    Ok(Json(rows))
}

async fn get_submission(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Submission>> {
    let caller = authed(&db, &headers).await?;
    let state = db.read().await;
    state
        .submissions
        .get(&id)
        .filter(|submission| submission.user_id == caller.id || caller.role == "ADMIN")
        .cloned()
        .map(Json)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "submission not found"))
}
