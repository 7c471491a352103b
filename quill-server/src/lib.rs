//! quill-server: HTTP server for the quill blog engine
//!
//! Persistence (SQLite + FTS5 through sqlx) and presentation (axum routes
//! rendering server-side HTML) for a single-author blog: create/edit
//! workflows behind a password-gated session, public listing, full-text
//! search, and Markdown detail views.

pub mod db;
pub mod http;
pub mod models;

pub use db::{create_pool, DbError, EntryRepo};
pub use http::server::{build_router, run_server, AppState, ServerConfig};
