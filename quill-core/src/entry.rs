//! The blog entry model
//!
//! An entry starts life as an unsaved draft (`id` is `None`) and receives
//! its identifier from the store on first save. The full-text index mirrors
//! `title + "\n" + content` per entry; `fts_document` is the single source
//! of that concatenation.

use chrono::{DateTime, Utc};

/// A single blog post.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Store-assigned identifier; `None` until first save.
    pub id: Option<i64>,
    pub title: String,
    /// URL-safe unique identifier, derived from `title` when left empty.
    pub slug: String,
    /// Raw Markdown source.
    pub content: String,
    pub published: bool,
    /// Creation time, set once and used for display ordering.
    pub timestamp: DateTime<Utc>,
}

impl Entry {
    /// A fresh, unsaved draft with no content yet.
    pub fn new() -> Self {
        Self {
            id: None,
            title: String::new(),
            slug: String::new(),
            content: String::new(),
            published: false,
            timestamp: Utc::now(),
        }
    }

    /// The text mirrored into the full-text index for this entry.
    pub fn fts_document(&self) -> String {
        format!("{}\n{}", self.title, self.content)
    }
}

impl Default for Entry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_is_unsaved_draft() {
        let entry = Entry::new();
        assert_eq!(entry.id, None);
        assert!(!entry.published);
        assert!(entry.slug.is_empty());
    }

    #[test]
    fn fts_document_joins_title_and_content() {
        let entry = Entry {
            title: "Hello".into(),
            content: "# Hi".into(),
            ..Entry::new()
        };
        assert_eq!(entry.fts_document(), "Hello\n# Hi");
    }
}
