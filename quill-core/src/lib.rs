//! quill-core: domain logic for the quill blog engine
//!
//! Owns the `Entry` model and the pieces of the system that are pure logic:
//! slug derivation, Markdown-to-HTML rendering with embedded-media
//! expansion, and site configuration.

pub mod config;
pub mod entry;
pub mod oembed;
pub mod render;
pub mod slug;

pub use config::SiteConfig;
pub use entry::Entry;
pub use oembed::{OEmbedClient, Provider};
pub use render::render_html;
pub use slug::slugify;
