//! Stateless HTTP request builder and response parser for the judge API.
//!
//! # Design
//! `JudgeClient` holds only a `base_url` and carries no mutable state
//! between calls. Every backend operation is split into a `build_*` method
//! that produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`; the host executes the round-trip in between. Bearer
//! tokens are attached by the builders, status interpretation and payload
//! sniffing happen in the parsers, so every view sees one failure shape no
//! matter which endpoint it touched.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    Credentials, DashboardStats, ExecuteCode, ExecutionResponse, HealthStatus, LeaderboardEntry,
    Problem, ProblemDraft, Registration, RoleUpdate, ServerMessage, Session, SubmitSolution,
    Submission, User, UserRole,
};

/// Synchronous, stateless client for the judge backend.
///
/// Does not log, does not retry, and touches no shared state; the only
/// side effect of any operation is the network call the host performs.
#[derive(Debug, Clone)]
pub struct JudgeClient {
    base_url: String,
}

impl JudgeClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    pub fn build_login(&self, credentials: &Credentials) -> Result<HttpRequest, ApiError> {
        self.post_json("/api/auth/login", None, credentials)
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<Session, ApiError> {
        parse_json(response)
    }

    pub fn build_register(&self, registration: &Registration) -> Result<HttpRequest, ApiError> {
        self.post_json("/api/auth/register", None, registration)
    }

    pub fn parse_register(&self, response: HttpResponse) -> Result<Session, ApiError> {
        parse_json(response)
    }

    /// Ask the backend to email a verification code to `email`. Unrelated
    /// to the session lifecycle; callers invoke it before `build_register`.
    pub fn build_request_verification_code(&self, email: &str) -> Result<HttpRequest, ApiError> {
        self.post_json(
            "/api/auth/register/code",
            None,
            &serde_json::json!({ "email": email }),
        )
    }

    pub fn parse_request_verification_code(
        &self,
        response: HttpResponse,
    ) -> Result<ServerMessage, ApiError> {
        parse_json(response)
    }

    pub fn build_fetch_profile(&self, token: &str) -> HttpRequest {
        self.get("/api/users/me", Some(token))
    }

    pub fn parse_fetch_profile(&self, response: HttpResponse) -> Result<User, ApiError> {
        parse_json(response)
    }

    // -----------------------------------------------------------------------
    // Problems
    // -----------------------------------------------------------------------

    pub fn build_list_problems(&self) -> HttpRequest {
        self.get("/api/problems", None)
    }

    pub fn parse_list_problems(&self, response: HttpResponse) -> Result<Vec<Problem>, ApiError> {
        parse_json(response)
    }

    /// `key` may be the problem id or its slug.
    pub fn build_get_problem(&self, key: &str) -> HttpRequest {
        self.get(&format!("/api/problems/{key}"), None)
    }

    pub fn parse_get_problem(&self, response: HttpResponse) -> Result<Problem, ApiError> {
        parse_json(response)
    }

    pub fn build_create_problem(
        &self,
        token: &str,
        draft: &ProblemDraft,
    ) -> Result<HttpRequest, ApiError> {
        self.post_json("/api/problems", Some(token), draft)
    }

    pub fn parse_create_problem(&self, response: HttpResponse) -> Result<Problem, ApiError> {
        parse_json(response)
    }

    pub fn build_update_problem(
        &self,
        token: &str,
        id: &str,
        draft: &ProblemDraft,
    ) -> Result<HttpRequest, ApiError> {
        self.put_json(&format!("/api/problems/{id}"), token, draft)
    }

    pub fn parse_update_problem(&self, response: HttpResponse) -> Result<Problem, ApiError> {
        parse_json(response)
    }

    pub fn build_delete_problem(&self, token: &str, id: &str) -> HttpRequest {
        self.delete(&format!("/api/problems/{id}"), token)
    }

    pub fn parse_delete_problem(&self, response: HttpResponse) -> Result<(), ApiError> {
        parse_no_content(response)
    }

    // -----------------------------------------------------------------------
    // User administration
    // -----------------------------------------------------------------------

    pub fn build_list_users(&self, token: &str) -> HttpRequest {
        self.get("/api/users", Some(token))
    }

    pub fn parse_list_users(&self, response: HttpResponse) -> Result<Vec<User>, ApiError> {
        parse_json(response)
    }

    pub fn build_update_user_role(
        &self,
        token: &str,
        user_id: &str,
        role: UserRole,
    ) -> Result<HttpRequest, ApiError> {
        self.put_json(&format!("/api/users/{user_id}/role"), token, &RoleUpdate { role })
    }

    pub fn parse_update_user_role(&self, response: HttpResponse) -> Result<User, ApiError> {
        parse_json(response)
    }

    pub fn build_delete_user(&self, token: &str, user_id: &str) -> HttpRequest {
        self.delete(&format!("/api/users/{user_id}"), token)
    }

    pub fn parse_delete_user(&self, response: HttpResponse) -> Result<(), ApiError> {
        parse_no_content(response)
    }

    // -----------------------------------------------------------------------
    // Dashboard
    // -----------------------------------------------------------------------

    pub fn build_dashboard_stats(&self) -> HttpRequest {
        self.get("/api/dashboard/stats", None)
    }

    pub fn parse_dashboard_stats(&self, response: HttpResponse) -> Result<DashboardStats, ApiError> {
        parse_json(response)
    }

    pub fn build_leaderboard(&self, limit: Option<u32>) -> HttpRequest {
        let path = with_query(
            "/api/leaderboard",
            &[("limit", limit.map(|value| value.to_string()))],
        );
        self.get(&path, None)
    }

    pub fn parse_leaderboard(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<LeaderboardEntry>, ApiError> {
        parse_json(response)
    }

    pub fn build_health(&self) -> HttpRequest {
        self.get("/health", None)
    }

    /// Tolerates deployments that put a bare text body behind `/health`:
    /// a non-JSON body is taken verbatim (trimmed) as the status string.
    pub fn parse_health(&self, response: HttpResponse) -> Result<HealthStatus, ApiError> {
        ensure_success(&response)?;
        if response.is_json() {
            serde_json::from_str(&response.body)
                .map_err(|e| ApiError::Deserialization(e.to_string()))
        } else {
            Ok(HealthStatus {
                status: response.body.trim().to_string(),
            })
        }
    }

    // -----------------------------------------------------------------------
    // Execution and submissions
    // -----------------------------------------------------------------------

    pub fn build_execute_code(
        &self,
        token: &str,
        payload: &ExecuteCode,
    ) -> Result<HttpRequest, ApiError> {
        self.post_json("/api/execute", Some(token), payload)
    }

    pub fn parse_execute_code(
        &self,
        response: HttpResponse,
    ) -> Result<ExecutionResponse, ApiError> {
        parse_json(response)
    }

    pub fn build_list_submissions(&self, token: &str) -> HttpRequest {
        self.get("/api/submissions", Some(token))
    }

    pub fn parse_list_submissions(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<Submission>, ApiError> {
        parse_json(response)
    }

    pub fn build_get_submission(&self, token: &str, id: &str) -> HttpRequest {
        self.get(&format!("/api/submissions/{id}"), Some(token))
    }

    pub fn parse_get_submission(&self, response: HttpResponse) -> Result<Submission, ApiError> {
        parse_json(response)
    }

    pub fn build_submit_solution(
        &self,
        token: &str,
        payload: &SubmitSolution,
    ) -> Result<HttpRequest, ApiError> {
        self.post_json("/api/submissions", Some(token), payload)
    }

    pub fn parse_submit_solution(&self, response: HttpResponse) -> Result<Submission, ApiError> {
        parse_json(response)
    }

    // -----------------------------------------------------------------------
    // Request assembly
    // -----------------------------------------------------------------------

    fn get(&self, path: &str, token: Option<&str>) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}{}", self.base_url, path),
            headers: auth_headers(token),
            body: None,
        }
    }

    fn delete(&self, path: &str, token: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: format!("{}{}", self.base_url, path),
            headers: auth_headers(Some(token)),
            body: None,
        }
    }

    fn post_json<T: Serialize>(
        &self,
        path: &str,
        token: Option<&str>,
        payload: &T,
    ) -> Result<HttpRequest, ApiError> {
        self.with_json_body(HttpMethod::Post, path, token, payload)
    }

    fn put_json<T: Serialize>(
        &self,
        path: &str,
        token: &str,
        payload: &T,
    ) -> Result<HttpRequest, ApiError> {
        self.with_json_body(HttpMethod::Put, path, Some(token), payload)
    }

    fn with_json_body<T: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        token: Option<&str>,
        payload: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let mut headers = auth_headers(token);
        headers.push(("content-type".to_string(), "application/json".to_string()));
        Ok(HttpRequest {
            method,
            path: format!("{}{}", self.base_url, path),
            headers,
            body: Some(body),
        })
    }
}

fn auth_headers(token: Option<&str>) -> Vec<(String, String)> {
    match token {
        Some(token) => vec![("authorization".to_string(), format!("Bearer {token}"))],
        None => Vec::new(),
    }
}

/// Append query parameters to `path`, skipping entries whose value is
/// `None` entirely.
fn with_query(path: &str, params: &[(&str, Option<String>)]) -> String {
    let mut out = path.to_string();
    let mut separator = '?';
    for (key, value) in params {
        if let Some(value) = value {
            out.push(separator);
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            separator = '&';
        }
    }
    out
}

fn ensure_success(response: &HttpResponse) -> Result<(), ApiError> {
    if (200..300).contains(&response.status) {
        Ok(())
    } else {
        Err(ApiError::from_response(response))
    }
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    ensure_success(&response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// For 204-style responses: success carries no body worth decoding.
fn parse_no_content(response: HttpResponse) -> Result<(), ApiError> {
    ensure_success(&response)?;
    Ok(())
}
