//! Create, edit, and detail workflows

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header::SET_COOKIE;
use axum::response::{AppendHeaders, Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;

use quill_core::{render_html, Entry};

use crate::db::{DbError, EntryRepo};
use crate::http::error::PageError;
use crate::http::pages::{self, PageContext};
use crate::http::server::AppState;
use crate::http::session::{flash_cookie, Flash, FlashLevel, FlashMessage, Session};

use super::{page_context, page_response, redirect_to_login};

#[derive(Debug, Deserialize)]
pub struct EntryForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub published: Option<String>,
}

/// Checkbox parsing rule: field present and non-empty means true.
pub fn checkbox_value(field: Option<&str>) -> bool {
    field.map(|value| !value.is_empty()).unwrap_or(false)
}

/// GET / - blank form for a new entry.
async fn create_form(
    State(_state): State<Arc<AppState>>,
    session: Session,
    flash: Flash,
) -> Response {
    let ctx = page_context(session, &flash);
    page_response(
        pages::entry_form_page(&ctx, &Entry::new(), "Create entry", "/", None),
        &flash,
    )
}

/// POST / - save a new entry.
async fn create_submit(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<EntryForm>,
) -> Result<Response, PageError> {
    create_or_edit(state, session, Entry::new(), form, "Create entry", "/").await
}

/// GET /{slug}/ - one entry; drafts resolve only for the operator.
async fn detail(
    State(state): State<Arc<AppState>>,
    session: Session,
    flash: Flash,
    Path(slug): Path<String>,
) -> Result<Response, PageError> {
    let entry = EntryRepo::new(&state.pool)
        .find_by_slug(&slug, session.logged_in)
        .await?;
    let html_content = render_html(&entry.content, &state.oembed, state.site.site_width).await;

    let ctx = page_context(session, &flash);
    Ok(page_response(
        pages::detail_page(&ctx, &entry, &html_content),
        &flash,
    ))
}

/// GET /{slug}/edit/ - form pre-filled from the stored entry.
async fn edit_form(
    State(state): State<Arc<AppState>>,
    session: Session,
    flash: Flash,
    Path(slug): Path<String>,
) -> Result<Response, PageError> {
    if !session.logged_in {
        return Ok(redirect_to_login(&format!("/{slug}/edit/")));
    }

    let entry = EntryRepo::new(&state.pool).find_by_slug(&slug, true).await?;
    let action = format!("/{slug}/edit/");

    let ctx = page_context(session, &flash);
    Ok(page_response(
        pages::entry_form_page(&ctx, &entry, "Edit entry", &action, None),
        &flash,
    ))
}

/// POST /{slug}/edit/ - save changes to an existing entry.
async fn edit_submit(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(slug): Path<String>,
    Form(form): Form<EntryForm>,
) -> Result<Response, PageError> {
    if !session.logged_in {
        return Ok(redirect_to_login(&format!("/{slug}/edit/")));
    }

    let entry = EntryRepo::new(&state.pool).find_by_slug(&slug, true).await?;
    let action = format!("/{slug}/edit/");
    create_or_edit(state, session, entry, form, "Edit entry", &action).await
}

/// Shared create/edit logic, parameterized by the target entry.
///
/// Validation and slug-conflict failures re-render the form with the
/// entered values preserved; nothing is persisted on those paths. A saved
/// draft redirects to its edit view; a published save renders the done
/// confirmation.
async fn create_or_edit(
    state: Arc<AppState>,
    session: Session,
    mut entry: Entry,
    form: EntryForm,
    heading: &str,
    action: &str,
) -> Result<Response, PageError> {
    entry.title = form.title;
    entry.content = form.content;
    entry.published = checkbox_value(form.published.as_deref());

    let ctx = PageContext {
        logged_in: session.logged_in,
        flash: None,
    };

    if entry.title.is_empty() {
        return Ok(Html(pages::entry_form_page(
            &ctx,
            &entry,
            heading,
            action,
            Some("Title is required."),
        ))
        .into_response());
    }

    match EntryRepo::new(&state.pool).save(&mut entry).await {
        Err(DbError::DuplicateSlug) => Ok(Html(pages::entry_form_page(
            &ctx,
            &entry,
            heading,
            action,
            Some("Error: this title is already in use."),
        ))
        .into_response()),
        Err(other) => Err(other.into()),
        Ok(()) => {
            if entry.published {
                let ctx = PageContext {
                    logged_in: session.logged_in,
                    flash: Some(FlashMessage::success("Entry saved successfully.")),
                };
                Ok(Html(pages::done_page(&ctx, &entry)).into_response())
            } else {
                Ok((
                    AppendHeaders([(
                        SET_COOKIE,
                        flash_cookie(FlashLevel::Success, "Entry saved successfully."),
                    )]),
                    Redirect::to(&format!("/{}/edit/", entry.slug)),
                )
                    .into_response())
            }
        }
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(create_form).post(create_submit))
        .route("/{slug}/", get(detail))
        .route("/{slug}/edit/", get(edit_form).post(edit_submit))
}
