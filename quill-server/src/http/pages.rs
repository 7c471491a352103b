//! Server-rendered HTML pages
//!
//! No template engine: each view is a small builder over a shared layout.
//! Every piece of user-sourced text goes through the escape helpers from
//! the rendering pipeline before it touches markup.

use quill_core::render::{escape_text, escape_url};
use quill_core::Entry;

use crate::http::session::FlashMessage;
use crate::models::Paginated;

/// Per-request rendering context: auth state and a pending flash message.
pub struct PageContext {
    pub logged_in: bool,
    pub flash: Option<FlashMessage>,
}

const STYLE: &str = "\
body{max-width:46em;margin:2em auto;padding:0 1em;font-family:sans-serif;line-height:1.5}\
nav{margin-bottom:2em}nav a{margin-right:1em}\
.flash{padding:.5em 1em;border-radius:3px;margin-bottom:1em}\
.flash.success{background:#e2f4e3}.flash.danger{background:#f9e0e0}\
.entry-meta{color:#666;font-size:.9em}\
.draft-badge{background:#eee;border-radius:3px;padding:0 .4em;font-size:.8em}\
textarea{width:100%;min-height:18em}input[type=text],input[type=password]{width:100%}\
.highlight{background:#f6f6f6;padding:.7em;overflow-x:auto}";

fn layout(title: &str, ctx: &PageContext, body: &str) -> String {
    let mut nav = String::from(
        "<nav><a href=\"/index\">Entries</a><a href=\"/\">New entry</a>",
    );
    if ctx.logged_in {
        nav.push_str("<a href=\"/drafts/\">Drafts</a><a href=\"/logout/\">Log out</a>");
    } else {
        nav.push_str("<a href=\"/login/\">Log in</a>");
    }
    nav.push_str("</nav>");

    let flash = match &ctx.flash {
        Some(f) => format!(
            "<div class=\"flash {}\">{}</div>",
            f.level.css_class(),
            escape_text(&f.message)
        ),
        None => String::new(),
    };

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title} - quill</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         {nav}\n{flash}\n{body}\n</body>\n</html>\n",
        title = escape_text(title),
    )
}

fn entry_list(listing: &Paginated<Entry>) -> String {
    if listing.items.is_empty() {
        return String::from("<p>No entries.</p>");
    }
    let mut out = String::from("<ul>");
    for entry in &listing.items {
        out.push_str(&format!(
            "<li><a href=\"/{slug}/\">{title}</a> \
             <span class=\"entry-meta\">{timestamp}</span>{badge}</li>",
            slug = escape_url(&entry.slug),
            title = escape_text(&entry.title),
            timestamp = entry.timestamp.format("%Y-%m-%d"),
            badge = if entry.published {
                ""
            } else {
                " <span class=\"draft-badge\">draft</span>"
            },
        ));
    }
    out.push_str("</ul>");
    out
}

fn pagination_nav(listing: &Paginated<Entry>, base: &str, search: Option<&str>) -> String {
    if !listing.has_prev() && !listing.has_next() {
        return String::new();
    }
    let link = |page: u32, label: &str| {
        let q = search
            .map(|q| format!("&q={}", escape_url(q)))
            .unwrap_or_default();
        format!("<a href=\"{base}?page={page}{q}\">{label}</a> ")
    };
    let mut nav = String::from("<p>");
    if listing.has_prev() {
        nav.push_str(&link(listing.page - 1, "&laquo; newer"));
    }
    if listing.has_next() {
        nav.push_str(&link(listing.page + 1, "older &raquo;"));
    }
    nav.push_str("</p>");
    nav
}

/// Listing of published entries, or search results when `search` is set.
pub fn index_page(ctx: &PageContext, listing: &Paginated<Entry>, search: Option<&str>) -> String {
    let heading = match search {
        Some(q) => format!("Search results for \"{}\"", escape_text(q)),
        None => String::from("Entries"),
    };
    let search_box = format!(
        "<form method=\"get\" action=\"/index\">\
         <input type=\"text\" name=\"q\" value=\"{}\" placeholder=\"Search entries\">\
         </form>",
        escape_text(search.unwrap_or("")),
    );
    let body = format!(
        "<h1>{heading}</h1>{search_box}{list}{nav}",
        list = entry_list(listing),
        nav = pagination_nav(listing, "/index", search),
    );
    layout("Entries", ctx, &body)
}

/// Auth-gated listing of unpublished entries.
pub fn drafts_page(ctx: &PageContext, listing: &Paginated<Entry>) -> String {
    let body = format!(
        "<h1>Drafts</h1>{list}{nav}",
        list = entry_list(listing),
        nav = pagination_nav(listing, "/drafts/", None),
    );
    layout("Drafts", ctx, &body)
}

/// Create/edit form, pre-filled from the entry.
///
/// `error` carries a same-request validation or conflict message; entered
/// values are always preserved in the re-render.
pub fn entry_form_page(
    ctx: &PageContext,
    entry: &Entry,
    heading: &str,
    action: &str,
    error: Option<&str>,
) -> String {
    let error_banner = match error {
        Some(message) => format!(
            "<div class=\"flash danger\">{}</div>",
            escape_text(message)
        ),
        None => String::new(),
    };
    let body = format!(
        "<h1>{heading}</h1>{error_banner}\
         <form method=\"post\" action=\"{action}\">\
         <p><label>Title<br><input type=\"text\" name=\"title\" value=\"{title}\"></label></p>\
         <p><label>Content<br><textarea name=\"content\">{content}</textarea></label></p>\
         <p><label><input type=\"checkbox\" name=\"published\" value=\"y\"{checked}> Published</label></p>\
         <p><button type=\"submit\">Save</button></p>\
         </form>",
        heading = escape_text(heading),
        action = escape_url(action),
        title = escape_text(&entry.title),
        content = escape_text(&entry.content),
        checked = if entry.published { " checked" } else { "" },
    );
    layout(heading, ctx, &body)
}

/// One rendered entry. `html_content` comes out of the rendering pipeline.
pub fn detail_page(ctx: &PageContext, entry: &Entry, html_content: &str) -> String {
    let body = format!(
        "<h1>{title}</h1>\
         <p class=\"entry-meta\">{timestamp}{badge}{edit}</p>\
         <div class=\"entry-content\">{html_content}</div>",
        title = escape_text(&entry.title),
        timestamp = entry.timestamp.format("%Y-%m-%d %H:%M"),
        badge = if entry.published {
            ""
        } else {
            " <span class=\"draft-badge\">draft</span>"
        },
        edit = if ctx.logged_in {
            format!(
                " &middot; <a href=\"/{}/edit/\">edit</a>",
                escape_url(&entry.slug)
            )
        } else {
            String::new()
        },
    );
    layout(&entry.title, ctx, &body)
}

/// Confirmation view after publishing an entry.
pub fn done_page(ctx: &PageContext, entry: &Entry) -> String {
    let body = format!(
        "<h1>Saved</h1>\
         <p><a href=\"/{slug}/\">{title}</a> is now published.</p>",
        slug = escape_url(&entry.slug),
        title = escape_text(&entry.title),
    );
    layout("Saved", ctx, &body)
}

/// Login form; `next` round-trips the originally-requested path.
pub fn login_page(ctx: &PageContext, next: Option<&str>, error: Option<&str>) -> String {
    let error_banner = match error {
        Some(message) => format!(
            "<div class=\"flash danger\">{}</div>",
            escape_text(message)
        ),
        None => String::new(),
    };
    let next_field = match next {
        Some(next) => format!(
            "<input type=\"hidden\" name=\"next\" value=\"{}\">",
            escape_text(next)
        ),
        None => String::new(),
    };
    let body = format!(
        "<h1>Log in</h1>{error_banner}\
         <form method=\"post\" action=\"/login/\">{next_field}\
         <p><label>Password<br><input type=\"password\" name=\"password\" autofocus></label></p>\
         <p><button type=\"submit\">Log in</button></p>\
         </form>",
    );
    layout("Log in", ctx, &body)
}

/// Logout confirmation; the POST does the clearing.
pub fn logout_page(ctx: &PageContext) -> String {
    let body = "<h1>Log out?</h1>\
         <form method=\"post\" action=\"/logout/\">\
         <p><button type=\"submit\">Log out</button></p>\
         </form>";
    layout("Log out", ctx, body)
}

pub fn not_found_body() -> String {
    String::from("<h3>Not found</h3>")
}

pub fn server_error_body() -> String {
    String::from("<h3>Server error</h3>")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(logged_in: bool) -> PageContext {
        PageContext {
            logged_in,
            flash: None,
        }
    }

    fn listing(items: Vec<Entry>) -> Paginated<Entry> {
        let total = items.len() as i64;
        Paginated {
            items,
            total,
            page: 1,
            per_page: 20,
        }
    }

    #[test]
    fn form_escapes_entered_values() {
        let entry = Entry {
            title: "a <b> \"quoted\" title".into(),
            content: "body & </textarea> escape".into(),
            ..Entry::new()
        };
        let html = entry_form_page(&ctx(false), &entry, "Create entry", "/", None);
        assert!(html.contains("a &lt;b&gt; &quot;quoted&quot; title"));
        assert!(html.contains("body &amp; &lt;/textarea&gt; escape"));
        assert!(!html.contains("</textarea> escape"));
    }

    #[test]
    fn drafts_are_badged_in_listings() {
        let draft = Entry {
            title: "wip".into(),
            slug: "wip".into(),
            ..Entry::new()
        };
        let html = index_page(&ctx(true), &listing(vec![draft]), None);
        assert!(html.contains("draft-badge"));
    }

    #[test]
    fn flash_banner_is_rendered_and_escaped() {
        let context = PageContext {
            logged_in: false,
            flash: Some(FlashMessage::success("saved <ok>")),
        };
        let html = index_page(&context, &listing(vec![]), None);
        assert!(html.contains("flash success"));
        assert!(html.contains("saved &lt;ok&gt;"));
    }

    #[test]
    fn nav_reflects_auth_state() {
        let anonymous = index_page(&ctx(false), &listing(vec![]), None);
        assert!(anonymous.contains("/login/"));
        assert!(!anonymous.contains("/drafts/"));

        let operator = index_page(&ctx(true), &listing(vec![]), None);
        assert!(operator.contains("/drafts/"));
        assert!(operator.contains("/logout/"));
    }

    #[test]
    fn pagination_links_preserve_search_query() {
        let mut items = Vec::new();
        for i in 0..3 {
            items.push(Entry {
                title: format!("t{i}"),
                slug: format!("t{i}"),
                published: true,
                ..Entry::new()
            });
        }
        let page = Paginated {
            items,
            total: 50,
            page: 2,
            per_page: 20,
        };
        let html = index_page(&ctx(false), &page, Some("rust"));
        assert!(html.contains("/index?page=1&q=rust"));
        assert!(html.contains("/index?page=3&q=rust"));
    }
}
