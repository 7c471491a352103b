//! Entry repository
//!
//! Owns the save path (row write + full-text index sync in one
//! transaction), the publish-state queries, slug lookup, and FTS5 search.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use quill_core::{slugify, Entry};

use crate::models::{Paginated, Pagination};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("slug already in use")]
    DuplicateSlug,

    #[error("not found: entry '{slug}'")]
    NotFound { slug: String },
}

/// Entry repository
pub struct EntryRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> EntryRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist an entry and synchronize its full-text index row.
    ///
    /// Derives the slug from the title when it is empty (edits never
    /// re-derive). Inserts when `id` is `None`, updates otherwise; on
    /// success the entry carries its assigned id. Row write and index
    /// write share one transaction, so the index can never go stale
    /// against a committed row. A slug collision maps to
    /// [`DbError::DuplicateSlug`].
    pub async fn save(&self, entry: &mut Entry) -> Result<(), DbError> {
        if entry.slug.is_empty() {
            entry.slug = slugify(&entry.title);
        }

        let mut tx = self.pool.begin().await?;

        let id = match entry.id {
            None => {
                let id: i64 = sqlx::query_scalar(
                    r#"
                    INSERT INTO entries (title, slug, content, published, timestamp)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    RETURNING id
                    "#,
                )
                .bind(&entry.title)
                .bind(&entry.slug)
                .bind(&entry.content)
                .bind(entry.published)
                .bind(entry.timestamp)
                .fetch_one(&mut *tx)
                .await
                .map_err(slug_conflict)?;
                entry.id = Some(id);
                id
            }
            Some(id) => {
                sqlx::query(
                    "UPDATE entries SET title = ?1, slug = ?2, content = ?3, published = ?4 WHERE id = ?5",
                )
                .bind(&entry.title)
                .bind(&entry.slug)
                .bind(&entry.content)
                .bind(entry.published)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(slug_conflict)?;
                id
            }
        };

        let document = entry.fts_document();
        let updated = sqlx::query("UPDATE entries_fts SET content = ?2 WHERE rowid = ?1")
            .bind(id)
            .bind(&document)
            .execute(&mut *tx)
            .await?;
        if updated.rows_affected() == 0 {
            sqlx::query("INSERT INTO entries_fts (rowid, content) VALUES (?1, ?2)")
                .bind(id)
                .bind(&document)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Published entries, newest first.
    pub async fn list_published(&self, page: Pagination) -> Result<Paginated<Entry>, DbError> {
        self.list_by_state(true, page).await
    }

    /// Draft entries, newest first.
    pub async fn list_drafts(&self, page: Pagination) -> Result<Paginated<Entry>, DbError> {
        self.list_by_state(false, page).await
    }

    async fn list_by_state(
        &self,
        published: bool,
        page: Pagination,
    ) -> Result<Paginated<Entry>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, slug, content, published, timestamp,
                   COUNT(*) OVER () AS total
            FROM entries
            WHERE published = ?1
            ORDER BY timestamp DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(published)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(self.pool)
        .await?;

        Ok(paginate(rows, page))
    }

    /// Resolve one entry by slug.
    ///
    /// Drafts resolve only when `include_drafts` (the authenticated
    /// operator); anonymous callers see published entries alone.
    pub async fn find_by_slug(&self, slug: &str, include_drafts: bool) -> Result<Entry, DbError> {
        let row = sqlx::query(
            r#"
            SELECT id, title, slug, content, published, timestamp
            FROM entries
            WHERE slug = ?1 AND (published = 1 OR ?2)
            "#,
        )
        .bind(slug)
        .bind(include_drafts)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound {
            slug: slug.to_owned(),
        })?;

        Ok(entry_from_row(&row))
    }

    /// Full-text search across all entries, published and drafts alike.
    ///
    /// Ordering is the index's own relevance rank; no ranking logic here.
    /// Draft rows match on purpose - search is the operator's reach into
    /// unpublished work.
    pub async fn search(&self, query: &str, page: Pagination) -> Result<Paginated<Entry>, DbError> {
        let fts_query = sanitize_query(query);
        if fts_query.is_empty() {
            return Ok(Paginated {
                items: vec![],
                total: 0,
                page: page.page,
                per_page: page.per_page,
            });
        }

        let rows = sqlx::query(
            r#"
            SELECT e.id, e.title, e.slug, e.content, e.published, e.timestamp,
                   COUNT(*) OVER () AS total
            FROM entries e
            JOIN entries_fts ON entries_fts.rowid = e.id
            WHERE entries_fts MATCH ?1
            ORDER BY rank
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(&fts_query)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(self.pool)
        .await?;

        Ok(paginate(rows, page))
    }
}

/// Quote each term so FTS5 operator characters in user input match
/// literally instead of erroring; terms still combine with implicit AND.
fn sanitize_query(raw: &str) -> String {
    raw.split_whitespace()
        .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" ")
}

fn slug_conflict(err: sqlx::Error) -> DbError {
    match err {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => DbError::DuplicateSlug,
        other => DbError::Sqlx(other),
    }
}

fn entry_from_row(row: &SqliteRow) -> Entry {
    Entry {
        id: Some(row.get("id")),
        title: row.get("title"),
        slug: row.get("slug"),
        content: row.get("content"),
        published: row.get("published"),
        timestamp: row.get("timestamp"),
    }
}

fn paginate(rows: Vec<SqliteRow>, page: Pagination) -> Paginated<Entry> {
    let total = rows.first().map(|r| r.get::<i64, _>("total")).unwrap_or(0);
    let items = rows.iter().map(entry_from_row).collect();
    Paginated {
        items,
        total,
        page: page.page,
        per_page: page.per_page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{migrations, pool::create_memory_pool};
    use chrono::{Duration, Utc};

    async fn test_pool() -> SqlitePool {
        let pool = create_memory_pool().await.expect("pool");
        migrations::run(&pool).await.expect("migrations");
        pool
    }

    fn entry(title: &str, content: &str, published: bool) -> Entry {
        Entry {
            title: title.into(),
            content: content.into(),
            published,
            ..Entry::new()
        }
    }

    async fn index_document(pool: &SqlitePool, id: i64) -> Option<String> {
        sqlx::query_scalar("SELECT content FROM entries_fts WHERE rowid = ?1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .expect("index lookup")
    }

    async fn count(pool: &SqlitePool, sql: &str) -> i64 {
        sqlx::query_scalar(sql).fetch_one(pool).await.expect("count")
    }

    #[tokio::test]
    async fn save_derives_slug_and_assigns_id() {
        let pool = test_pool().await;
        let repo = EntryRepo::new(&pool);

        let mut e = entry("Hello, World!", "# Hi", false);
        repo.save(&mut e).await.expect("save");

        assert_eq!(e.slug, "hello-world");
        let id = e.id.expect("id assigned");
        assert_eq!(
            index_document(&pool, id).await.as_deref(),
            Some("Hello, World!\n# Hi")
        );
    }

    #[tokio::test]
    async fn edits_resync_index_but_keep_slug() {
        let pool = test_pool().await;
        let repo = EntryRepo::new(&pool);

        let mut e = entry("First Title", "original", false);
        repo.save(&mut e).await.expect("save");
        let id = e.id.unwrap();

        e.title = "Renamed Title".into();
        e.content = "revised body".into();
        repo.save(&mut e).await.expect("resave");

        // Slug was already set, so the rename does not re-derive it.
        assert_eq!(e.slug, "first-title");
        assert_eq!(
            index_document(&pool, id).await.as_deref(),
            Some("Renamed Title\nrevised body")
        );
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM entries_fts").await, 1);
    }

    #[tokio::test]
    async fn duplicate_slug_fails_and_changes_nothing() {
        let pool = test_pool().await;
        let repo = EntryRepo::new(&pool);

        let mut first = entry("Hello, World!", "one", false);
        repo.save(&mut first).await.expect("save");

        let mut second = entry("Hello, World!", "two", false);
        let err = repo.save(&mut second).await.expect_err("must collide");
        assert!(matches!(err, DbError::DuplicateSlug));
        assert_eq!(second.id, None);

        assert_eq!(count(&pool, "SELECT COUNT(*) FROM entries").await, 1);
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM entries_fts").await, 1);
        assert_eq!(
            index_document(&pool, first.id.unwrap()).await.as_deref(),
            Some("Hello, World!\none")
        );
    }

    #[tokio::test]
    async fn published_and_drafts_partition_all_entries() {
        let pool = test_pool().await;
        let repo = EntryRepo::new(&pool);

        for (title, published) in [("a", true), ("b", false), ("c", true)] {
            let mut e = entry(title, "body", published);
            repo.save(&mut e).await.expect("save");
        }

        let published = repo.list_published(Pagination::default()).await.unwrap();
        let drafts = repo.list_drafts(Pagination::default()).await.unwrap();

        assert!(published.items.iter().all(|e| e.published));
        assert!(drafts.items.iter().all(|e| !e.published));
        assert_eq!(published.total + drafts.total, 3);
    }

    #[tokio::test]
    async fn listings_order_by_timestamp_descending() {
        let pool = test_pool().await;
        let repo = EntryRepo::new(&pool);

        let base = Utc::now();
        for (title, age) in [("oldest", 60), ("middle", 30), ("newest", 0)] {
            let mut e = entry(title, "body", true);
            e.timestamp = base - Duration::seconds(age);
            repo.save(&mut e).await.expect("save");
        }

        let listed = repo.list_published(Pagination::default()).await.unwrap();
        let titles: Vec<_> = listed.items.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["newest", "middle", "oldest"]);
    }

    #[tokio::test]
    async fn find_by_slug_respects_draft_visibility() {
        let pool = test_pool().await;
        let repo = EntryRepo::new(&pool);

        let mut draft = entry("Secret Draft", "wip", false);
        repo.save(&mut draft).await.expect("save");

        let anonymous = repo.find_by_slug("secret-draft", false).await;
        assert!(matches!(anonymous, Err(DbError::NotFound { .. })));

        let operator = repo.find_by_slug("secret-draft", true).await.unwrap();
        assert_eq!(operator.title, "Secret Draft");

        let missing = repo.find_by_slug("never-existed", true).await;
        assert!(matches!(missing, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn search_matches_words_only_in_content() {
        let pool = test_pool().await;
        let repo = EntryRepo::new(&pool);

        let mut e = entry("Plain Title", "the xylophone paragraph", true);
        repo.save(&mut e).await.expect("save");

        let hits = repo
            .search("xylophone", Pagination::default())
            .await
            .unwrap();
        assert_eq!(hits.total, 1);
        assert_eq!(hits.items[0].slug, "plain-title");
    }

    #[tokio::test]
    async fn search_reaches_drafts() {
        let pool = test_pool().await;
        let repo = EntryRepo::new(&pool);

        let mut e = entry("Hidden", "unpublished quasar notes", false);
        repo.save(&mut e).await.expect("save");

        let hits = repo.search("quasar", Pagination::default()).await.unwrap();
        assert_eq!(hits.total, 1);
    }

    #[tokio::test]
    async fn search_tolerates_operator_characters() {
        let pool = test_pool().await;
        let repo = EntryRepo::new(&pool);

        let mut e = entry("Ops", "body text", true);
        repo.save(&mut e).await.expect("save");

        // None of these may surface an FTS syntax error.
        for q in ["\"", "AND", "body NEAR", "col:umn", "   "] {
            repo.search(q, Pagination::default())
                .await
                .expect("search must not error");
        }
    }

    #[tokio::test]
    async fn stale_search_never_happens_after_edit() {
        let pool = test_pool().await;
        let repo = EntryRepo::new(&pool);

        let mut e = entry("Topic", "about zebras", true);
        repo.save(&mut e).await.expect("save");

        e.content = "now about quokkas".into();
        repo.save(&mut e).await.expect("resave");

        assert_eq!(
            repo.search("zebras", Pagination::default()).await.unwrap().total,
            0
        );
        assert_eq!(
            repo.search("quokkas", Pagination::default()).await.unwrap().total,
            1
        );
    }
}
