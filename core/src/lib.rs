//! Deterministic client core for an online coding-judge platform.
//!
//! # Overview
//! Everything the judge frontend does that is not markup lives here: a
//! typed API client for the backend REST surface, the session/auth
//! lifecycle with persistence, and the view-model state machines behind
//! the problem, submission, admin, and dashboard screens.
//!
//! # Design
//! - Host-does-IO: the core builds `HttpRequest` values and parses
//!   `HttpResponse` values; the host executes round-trips through the
//!   `HttpTransport` seam. Every state machine here is deterministic
//!   under test.
//! - `JudgeClient` is stateless. `SessionStore` is the only cross-view
//!   shared state and is only ever replaced wholesale, never partially
//!   mutated.
//! - Wire DTOs are defined independently of the mock server; integration
//!   tests catch schema drift between the two crates.

pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod http;
pub mod session;
pub mod storage;
pub mod types;
pub mod view;

pub use client::JudgeClient;
pub use config::Config;
pub use error::{ApiError, ErrorPayload};
pub use filter::ProblemFilter;
pub use http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};
pub use session::{SessionState, SessionStore};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
pub use types::{Credentials, Registration, Session, User, UserRole};
pub use view::{Confirmation, DashboardView, ListView, LoadState, LoadTicket, MutationOutcome};
