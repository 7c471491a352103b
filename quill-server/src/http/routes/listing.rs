//! Public listing/search and the auth-gated drafts listing

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::db::EntryRepo;
use crate::http::error::PageError;
use crate::http::pages;
use crate::http::server::AppState;
use crate::http::session::{Flash, Session};
use crate::models::Pagination;

use super::{page_context, page_response, redirect_to_login};

#[derive(Debug, Deserialize)]
struct IndexParams {
    q: Option<String>,
    page: Option<u32>,
}

/// GET /index - published entries by recency, or search results for `q`.
async fn index(
    State(state): State<Arc<AppState>>,
    session: Session,
    flash: Flash,
    Query(params): Query<IndexParams>,
) -> Result<Response, PageError> {
    let repo = EntryRepo::new(&state.pool);
    let page = Pagination::new(params.page.unwrap_or(1), Pagination::default().per_page);

    let search = params.q.as_deref().filter(|q| !q.trim().is_empty());
    let listing = match search {
        // Search reaches drafts as well as published entries.
        Some(q) => repo.search(q, page).await?,
        None => repo.list_published(page).await?,
    };

    let ctx = page_context(session, &flash);
    Ok(page_response(
        pages::index_page(&ctx, &listing, search),
        &flash,
    ))
}

#[derive(Debug, Deserialize)]
struct DraftsParams {
    page: Option<u32>,
}

/// GET /drafts/ - unpublished entries, operator only.
async fn drafts(
    State(state): State<Arc<AppState>>,
    session: Session,
    flash: Flash,
    Query(params): Query<DraftsParams>,
) -> Result<Response, PageError> {
    if !session.logged_in {
        return Ok(redirect_to_login("/drafts/"));
    }

    let page = Pagination::new(params.page.unwrap_or(1), Pagination::default().per_page);
    let listing = EntryRepo::new(&state.pool).list_drafts(page).await?;

    let ctx = page_context(session, &flash);
    Ok(page_response(pages::drafts_page(&ctx, &listing), &flash))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/index", get(index))
        .route("/drafts/", get(drafts))
}
