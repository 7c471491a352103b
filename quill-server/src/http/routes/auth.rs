//! Login and logout workflows

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::response::{AppendHeaders, Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;

use crate::http::pages;
use crate::http::server::AppState;
use crate::http::session::{
    clear_session_cookie, flash_cookie, password_matches, session_cookie, Flash, FlashLevel,
    Session,
};

use super::{page_context, page_response};

#[derive(Debug, Deserialize)]
struct NextParams {
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    #[serde(default)]
    password: String,
    next: Option<String>,
}

/// GET /login/
async fn login_form(
    State(_state): State<Arc<AppState>>,
    session: Session,
    flash: Flash,
    Query(params): Query<NextParams>,
) -> Response {
    let ctx = page_context(session, &flash);
    page_response(
        pages::login_page(&ctx, params.next.as_deref(), None),
        &flash,
    )
}

/// POST /login/
async fn login_submit(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    if !form.password.is_empty() && password_matches(&state.site.admin_password, &form.password) {
        // Only bounce to our own paths; anything else falls back to the index.
        let target = form
            .next
            .filter(|next| next.starts_with('/'))
            .unwrap_or_else(|| String::from("/index"));
        return (
            AppendHeaders([
                (SET_COOKIE, session_cookie(&state.session_key)),
                (
                    SET_COOKIE,
                    flash_cookie(FlashLevel::Success, "Successfully logged in."),
                ),
            ]),
            Redirect::to(&target),
        )
            .into_response();
    }

    let ctx = page_context(session, &Flash(None));
    Html(pages::login_page(
        &ctx,
        form.next.as_deref(),
        Some("Incorrect password."),
    ))
    .into_response()
}

/// GET /logout/ - confirmation only; the POST clears the session.
async fn logout_confirm(
    State(_state): State<Arc<AppState>>,
    session: Session,
    flash: Flash,
) -> Response {
    let ctx = page_context(session, &flash);
    page_response(pages::logout_page(&ctx), &flash)
}

/// POST /logout/
async fn logout_submit(State(_state): State<Arc<AppState>>) -> Response {
    (
        AppendHeaders([(SET_COOKIE, clear_session_cookie())]),
        Redirect::to("/"),
    )
        .into_response()
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login/", get(login_form).post(login_submit))
        .route("/logout/", get(logout_confirm).post(logout_submit))
}
