//! Markdown-to-HTML rendering with embedded-media expansion
//!
//! The pipeline runs over the `pulldown-cmark` event stream in three
//! passes:
//!
//! 1. paragraphs consisting of a single media URL are exchanged for rich
//!    embed fragments through the oEmbed client;
//! 2. bare URLs in ordinary text become links;
//! 3. fenced code blocks are rewrapped with a `highlight` css class (the
//!    highlighting itself is stylesheet-owned).
//!
//! All escaping is done by `pulldown-cmark` / `pulldown-cmark-escape`;
//! nothing here writes user text into HTML by hand.

use once_cell::sync::Lazy;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use pulldown_cmark_escape::{escape_href, escape_html};
use regex::Regex;

use crate::oembed::OEmbedClient;

static BARE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s<>"']+"#).expect("static pattern"));

/// Render entry Markdown to display HTML.
///
/// `max_width` bounds the width of expanded embeds and is forwarded to the
/// oEmbed providers.
pub async fn render_html(content: &str, oembed: &OEmbedClient, max_width: u32) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let events: Vec<Event> = Parser::new_ext(content, options).collect();
    let events = expand_embeds(events, oembed, max_width).await;
    let events = urlize(events);
    let events = rewrite_code_blocks(events);

    let mut out = String::with_capacity(content.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    out
}

/// Escape a string for HTML body text or a double-quoted attribute.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let _ = escape_html(&mut out, s);
    out
}

/// Escape a string for an href attribute value.
pub fn escape_url(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let _ = escape_href(&mut out, s);
    out
}

/// Replace paragraphs holding a single media URL with embed fragments.
async fn expand_embeds<'a>(
    events: Vec<Event<'a>>,
    oembed: &OEmbedClient,
    max_width: u32,
) -> Vec<Event<'a>> {
    let mut out = Vec::with_capacity(events.len());
    let mut i = 0;
    while i < events.len() {
        if let Some((url, end)) = standalone_url(&events, i) {
            if let Some(fragment) = oembed.fetch(&url, max_width).await {
                out.push(Event::Html(CowStr::from(fragment)));
                i = end + 1;
                continue;
            }
        }
        out.push(events[i].clone());
        i += 1;
    }
    out
}

/// If the paragraph starting at `i` is nothing but one URL, return the URL
/// and the index of the closing paragraph event.
fn standalone_url(events: &[Event], i: usize) -> Option<(String, usize)> {
    if !matches!(events.get(i)?, Event::Start(Tag::Paragraph)) {
        return None;
    }
    match events.get(i + 1)? {
        // A URL typed on its own line.
        Event::Text(text) => {
            let candidate = text.trim();
            if is_url(candidate) && matches!(events.get(i + 2)?, Event::End(TagEnd::Paragraph)) {
                return Some((candidate.to_string(), i + 2));
            }
            None
        }
        // An autolink (or explicit link) whose text is the URL itself.
        Event::Start(Tag::Link { dest_url, .. }) => {
            let dest = dest_url.to_string();
            if !is_url(&dest) {
                return None;
            }
            match (events.get(i + 2)?, events.get(i + 3)?, events.get(i + 4)?) {
                (Event::Text(text), Event::End(TagEnd::Link), Event::End(TagEnd::Paragraph))
                    if text.as_ref() == dest =>
                {
                    Some((dest, i + 4))
                }
                _ => None,
            }
        }
        _ => None,
    }
}

fn is_url(s: &str) -> bool {
    BARE_URL
        .find(s)
        .map(|m| m.start() == 0 && m.end() == s.len())
        .unwrap_or(false)
}

/// Turn bare URLs in ordinary text into links.
///
/// Text inside links, images, and code blocks is left untouched.
fn urlize(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out = Vec::with_capacity(events.len());
    let mut suppress = 0usize;
    for event in events {
        match &event {
            Event::Start(Tag::Link { .. })
            | Event::Start(Tag::Image { .. })
            | Event::Start(Tag::CodeBlock(_)) => suppress += 1,
            Event::End(TagEnd::Link) | Event::End(TagEnd::Image) | Event::End(TagEnd::CodeBlock) => {
                suppress = suppress.saturating_sub(1)
            }
            Event::Text(text) if suppress == 0 && BARE_URL.is_match(text) => {
                push_urlized(&mut out, text);
                continue;
            }
            _ => {}
        }
        out.push(event);
    }
    out
}

fn push_urlized<'a>(out: &mut Vec<Event<'a>>, text: &str) {
    let mut last = 0;
    for m in BARE_URL.find_iter(text) {
        if m.start() > last {
            out.push(Event::Text(text[last..m.start()].to_string().into()));
        }
        let url = m.as_str();
        let mut anchor = String::from("<a href=\"");
        let _ = escape_href(&mut anchor, url);
        anchor.push_str("\">");
        let _ = escape_html(&mut anchor, url);
        anchor.push_str("</a>");
        out.push(Event::Html(anchor.into()));
        last = m.end();
    }
    if last < text.len() {
        out.push(Event::Text(text[last..].to_string().into()));
    }
}

/// Rewrap fenced code blocks so the stylesheet can highlight them.
///
/// The inner text still flows through `push_html`'s escaping; only the
/// wrapping tags are replaced.
fn rewrite_code_blocks(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out = Vec::with_capacity(events.len());
    let mut in_fenced = false;
    for event in events {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                in_fenced = true;
                let mut open = String::from("<pre class=\"highlight\"><code");
                if let Some(lang) = info.split_whitespace().next() {
                    if !lang.is_empty() {
                        open.push_str(" class=\"language-");
                        let _ = escape_html(&mut open, lang);
                        open.push('"');
                    }
                }
                open.push('>');
                out.push(Event::Html(open.into()));
            }
            Event::End(TagEnd::CodeBlock) if in_fenced => {
                in_fenced = false;
                out.push(Event::Html("</code></pre>".into()));
            }
            other => out.push(other),
        }
    }
    out
}
