//! Route handlers for the seven-path HTTP surface
//!
//! Auth is an explicit check at the top of each protected handler: no
//! session flag means a redirect to `/login/` carrying the requested path.

pub mod auth;
pub mod entries;
pub mod listing;

use axum::http::header::SET_COOKIE;
use axum::response::{AppendHeaders, Html, IntoResponse, Redirect, Response};

use crate::http::pages::PageContext;
use crate::http::session::{clear_flash_cookie, Flash, Session};

/// Rendering context for the current request.
pub(crate) fn page_context(session: Session, flash: &Flash) -> PageContext {
    PageContext {
        logged_in: session.logged_in,
        flash: flash.0.clone(),
    }
}

/// Wrap a rendered page, clearing the flash cookie it just displayed.
pub(crate) fn page_response(body: String, flash: &Flash) -> Response {
    if flash.0.is_some() {
        (
            AppendHeaders([(SET_COOKIE, clear_flash_cookie())]),
            Html(body),
        )
            .into_response()
    } else {
        Html(body).into_response()
    }
}

/// Redirect an unauthenticated request to login, preserving the target.
///
/// `next` is always one of our own paths (slugs are word characters and
/// hyphens), so it embeds in the query string as-is.
pub(crate) fn redirect_to_login(next: &str) -> Response {
    Redirect::to(&format!("/login/?next={next}")).into_response()
}
