//! Story and episode archive.
//!
//! SQLite-backed vector store with dedup-aware batch upserts, plus a JSON
//! flat-file fallback used when the database cannot be opened.

mod fallback;

pub use fallback::{EpisodeSnapshot, FallbackStore, StoriesSnapshot};

use crate::embedding::{Embedder, EMBEDDING_DIM};
use crate::episode::EpisodeManifest;
use crate::error::{Result, SendeError};
use crate::story::Story;
use chrono::{NaiveDate, Utc};
use rusqlite::{params, params_from_iter, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument};

/// Version written into every inserted row. Readers tolerate absent or
/// older values.
pub const SCHEMA_VERSION: i64 = 1;

const STORY_COLUMNS: &str = "id, source, title, url, arxiv_id, summary, raw_text, score, comments, \
     subreddit, author, fetched_at, used_in_episode, used_episode_date, schema_version, vector";

/// A story row as persisted in the archive.
#[derive(Debug, Clone)]
pub struct StoredStory {
    pub id: String,
    pub source: String,
    pub title: String,
    pub url: String,
    pub arxiv_id: Option<String>,
    pub summary: String,
    pub raw_text: String,
    pub score: i64,
    pub comments: i64,
    pub subreddit: Option<String>,
    pub author: Option<String>,
    pub fetched_at: String,
    pub used_in_episode: bool,
    pub used_episode_date: Option<String>,
    pub schema_version: i64,
    pub vector: Vec<f32>,
}

/// A search hit with its similarity score.
#[derive(Debug, Clone)]
pub struct ScoredStory {
    pub story: StoredStory,
    pub score: f32,
}

/// Summary of a stored episode record.
#[derive(Debug, Clone)]
pub struct EpisodeSummary {
    pub episode_date: String,
    pub generated_at: String,
    pub story_count: usize,
}

/// Counts from one `store_stories_batch` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Stories embedded and inserted as new rows.
    pub inserted: usize,
    /// Existing rows whose usage fields were updated.
    pub updated: usize,
    /// Existing rows left untouched (already used, or mark_used off).
    pub skipped: usize,
}

struct ExistingRow {
    id: String,
    used_in_episode: bool,
}

/// SQLite-backed archive of stories and episode records.
///
/// Single logical writer; lookups, embedding calls, and inserts for a batch
/// run strictly sequentially within the call.
pub struct StoryStore {
    conn: Mutex<Connection>,
    embedder: Arc<dyn Embedder>,
}

impl StoryStore {
    /// Open (or create) the archive database.
    ///
    /// Any failure to connect or create the tables surfaces as
    /// `StorageUnavailable` so callers can switch to the fallback store.
    #[instrument(skip_all)]
    pub fn open(path: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
        debug_assert_eq!(embedder.dimensions(), EMBEDDING_DIM);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SendeError::StorageUnavailable(format!("cannot create data dir: {}", e))
            })?;
        }

        let conn = Connection::open(path)
            .map_err(|e| SendeError::StorageUnavailable(format!("cannot open database: {}", e)))?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .and_then(|_| Self::ensure_schema(&conn))
            .map_err(|e| {
                SendeError::StorageUnavailable(format!("cannot initialize schema: {}", e))
            })?;

        info!("Opened story archive at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
            embedder,
        })
    }

    /// Create an in-memory archive (useful for testing).
    pub fn in_memory(embedder: Arc<dyn Embedder>) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SendeError::StorageUnavailable(format!("cannot open database: {}", e)))?;
        Self::ensure_schema(&conn).map_err(|e| {
            SendeError::StorageUnavailable(format!("cannot initialize schema: {}", e))
        })?;

        Ok(Self {
            conn: Mutex::new(conn),
            embedder,
        })
    }

    fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS stories (
                id TEXT PRIMARY KEY,
                source TEXT NOT NULL,
                title TEXT NOT NULL,
                url TEXT NOT NULL,
                arxiv_id TEXT,
                summary TEXT NOT NULL,
                raw_text TEXT NOT NULL,
                score INTEGER NOT NULL DEFAULT 0,
                comments INTEGER NOT NULL DEFAULT 0,
                subreddit TEXT,
                author TEXT,
                created_utc TEXT,
                fetched_at TEXT NOT NULL,
                selftext TEXT,
                comments_summary TEXT,
                discussion_highlights TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                used_in_episode INTEGER NOT NULL DEFAULT 0,
                used_episode_date TEXT,
                schema_version INTEGER,
                vector BLOB NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_stories_url ON stories(url);
            CREATE INDEX IF NOT EXISTS idx_stories_arxiv_id ON stories(arxiv_id);

            CREATE TABLE IF NOT EXISTS episodes (
                episode_date TEXT NOT NULL,
                episode_text TEXT NOT NULL,
                manifest TEXT NOT NULL,
                generated_at TEXT NOT NULL,
                schema_version INTEGER,
                vector BLOB NOT NULL
            );
            "#,
        )
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| SendeError::StorageUnavailable(format!("connection lock poisoned: {}", e)))
    }

    /// Store a batch of stories for one episode date.
    ///
    /// Stories already present (matched by id, url, or arxiv id) are never
    /// re-embedded; if `mark_used` is set and the row has not been used
    /// before, its usage fields are updated in place. Genuinely new stories
    /// are embedded in a single batch call and inserted together.
    #[instrument(skip(self, stories), fields(count = stories.len(), date = %episode_date))]
    pub async fn store_stories_batch(
        &self,
        stories: &[Story],
        episode_date: NaiveDate,
        mark_used: bool,
    ) -> Result<BatchOutcome> {
        let date_str = episode_date.to_string();
        let mut outcome = BatchOutcome::default();
        let mut new_stories: Vec<Story> = Vec::new();

        {
            let conn = self.lock_conn()?;
            let tx = conn.unchecked_transaction()?;
            for story in stories {
                match Self::lookup_existing(&tx, story)? {
                    Some(existing) => {
                        // First-use semantics: a previously-used story keeps
                        // the date of the first episode that aired it.
                        if mark_used && !existing.used_in_episode {
                            tx.execute(
                                "UPDATE stories SET used_in_episode = 1, used_episode_date = ?1 \
                                 WHERE id = ?2",
                                params![date_str, existing.id],
                            )?;
                            outcome.updated += 1;
                        } else {
                            outcome.skipped += 1;
                        }
                    }
                    None => new_stories.push(story.clone()),
                }
            }
            tx.commit()?;
        }

        if new_stories.is_empty() {
            debug!("No new stories in batch");
            return Ok(outcome);
        }

        let texts: Vec<String> = new_stories.iter().map(|s| s.embedding_text()).collect();

        // Embedding is all-or-nothing per batch: a failure here aborts
        // before any new row is written.
        let vectors = self.embedder.embed_batch(&texts).await.map_err(|e| {
            SendeError::StorageUnavailable(format!("embedding generation failed: {}", e))
        })?;

        let conn = self.lock_conn()?;
        let tx = conn.unchecked_transaction()?;
        for (story, vector) in new_stories.iter().zip(&vectors) {
            Self::insert_story(&tx, story, vector, mark_used.then(|| date_str.as_str()))?;
        }
        tx.commit()?;
        outcome.inserted = new_stories.len();

        info!(
            "Stored story batch: {} new, {} marked used, {} unchanged",
            outcome.inserted, outcome.updated, outcome.skipped
        );
        Ok(outcome)
    }

    /// Store one episode record. Episode rows are never deduplicated; the
    /// caller owns the once-per-date discipline.
    #[instrument(skip(self, episode_text, manifest), fields(date = %episode_date))]
    pub async fn store_episode(
        &self,
        episode_date: NaiveDate,
        episode_text: &str,
        manifest: &EpisodeManifest,
    ) -> Result<()> {
        let vector = self.embedder.embed(episode_text).await.map_err(|e| {
            SendeError::StorageUnavailable(format!("embedding generation failed: {}", e))
        })?;
        debug_assert_eq!(vector.len(), EMBEDDING_DIM);

        let manifest_json = serde_json::to_string(manifest)?;

        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO episodes \
             (episode_date, episode_text, manifest, generated_at, schema_version, vector) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                episode_date.to_string(),
                episode_text,
                manifest_json,
                Utc::now().to_rfc3339(),
                SCHEMA_VERSION,
                embedding_to_bytes(&vector),
            ],
        )?;

        info!("Stored episode record for {}", episode_date);
        Ok(())
    }

    /// Identity lookup: `id`, `url`, or `arxiv_id` equality, any one match
    /// counts. A story with no usable key skips deduplication entirely.
    fn lookup_existing(conn: &Connection, story: &Story) -> rusqlite::Result<Option<ExistingRow>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if !story.id.is_empty() {
            clauses.push("id = ?");
            values.push(story.id.clone());
        }
        if !story.source_url.is_empty() {
            clauses.push("url = ?");
            values.push(story.source_url.clone());
        }
        if let Some(arxiv_id) = story.arxiv_id() {
            clauses.push("arxiv_id = ?");
            values.push(arxiv_id.to_string());
        }

        if clauses.is_empty() {
            return Ok(None);
        }

        let sql = format!(
            "SELECT id, used_in_episode FROM stories WHERE {} LIMIT 1",
            clauses.join(" OR ")
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(values.iter()))?;
        match rows.next()? {
            Some(row) => Ok(Some(ExistingRow {
                id: row.get(0)?,
                used_in_episode: row.get(1)?,
            })),
            None => Ok(None),
        }
    }

    fn insert_story(
        conn: &Connection,
        story: &Story,
        vector: &[f32],
        used_episode_date: Option<&str>,
    ) -> Result<()> {
        debug_assert_eq!(vector.len(), EMBEDDING_DIM);

        let meta = &story.source_meta;
        let tags_json = serde_json::to_string(&story.tags)?;

        conn.execute(
            "INSERT OR REPLACE INTO stories \
             (id, source, title, url, arxiv_id, summary, raw_text, score, comments, subreddit, \
              author, created_utc, fetched_at, selftext, comments_summary, \
              discussion_highlights, tags, used_in_episode, used_episode_date, schema_version, \
              vector) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, \
                     ?17, ?18, ?19, ?20, ?21)",
            params![
                story.id,
                meta.source.as_str(),
                story.title,
                story.source_url,
                story.arxiv_id(),
                story.summary,
                story.raw_text,
                meta.score.unwrap_or(0),
                meta.comments.unwrap_or(0),
                meta.subreddit,
                meta.author,
                meta.extra.get("created_utc"),
                Utc::now().to_rfc3339(),
                meta.extra.get("selftext"),
                meta.extra.get("comments_summary"),
                meta.extra.get("discussion_highlights"),
                tags_json,
                used_episode_date.is_some(),
                used_episode_date,
                SCHEMA_VERSION,
                embedding_to_bytes(vector),
            ],
        )?;
        Ok(())
    }

    /// Fetch the stored row matching a story's identity keys, if any.
    pub fn find_story(&self, story: &Story) -> Result<Option<StoredStory>> {
        let conn = self.lock_conn()?;
        let existing = Self::lookup_existing(&conn, story)?;
        match existing {
            Some(row) => {
                let sql = format!("SELECT {} FROM stories WHERE id = ?1", STORY_COLUMNS);
                let mut stmt = conn.prepare(&sql)?;
                let stored = stmt.query_row(params![row.id], row_to_stored)?;
                Ok(Some(stored))
            }
            None => Ok(None),
        }
    }

    /// Semantic search over stored stories.
    pub async fn search_stories(&self, query: &str, limit: usize) -> Result<Vec<ScoredStory>> {
        let query_vector = self.embedder.embed(query).await?;
        self.search_by_vector(&query_vector, limit)
    }

    /// Rank all stored stories by cosine similarity against a query vector.
    #[instrument(skip(self, query_vector))]
    pub fn search_by_vector(&self, query_vector: &[f32], limit: usize) -> Result<Vec<ScoredStory>> {
        let conn = self.lock_conn()?;
        let sql = format!("SELECT {} FROM stories", STORY_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;

        let stories = stmt.query_map([], row_to_stored)?;

        let mut results: Vec<ScoredStory> = stories
            .filter_map(|s| s.ok())
            .map(|story| {
                let score = cosine_similarity(query_vector, &story.vector);
                ScoredStory { story, score }
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        debug!("Found {} matching stories", results.len());
        Ok(results)
    }

    /// Total stored story rows.
    pub fn story_count(&self) -> Result<usize> {
        let conn = self.lock_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM stories", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Total stored episode rows.
    pub fn episode_count(&self) -> Result<usize> {
        let conn = self.lock_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM episodes", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// List stored episode records, newest first.
    pub fn list_episodes(&self) -> Result<Vec<EpisodeSummary>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT episode_date, generated_at, manifest FROM episodes ORDER BY episode_date DESC",
        )?;

        let episodes = stmt.query_map([], |row| {
            let manifest_json: String = row.get(2)?;
            let story_count = serde_json::from_str::<EpisodeManifest>(&manifest_json)
                .map(|m| m.story_count)
                .unwrap_or(0);
            Ok(EpisodeSummary {
                episode_date: row.get(0)?,
                generated_at: row.get(1)?,
                story_count,
            })
        })?;

        Ok(episodes.filter_map(|e| e.ok()).collect())
    }
}

fn row_to_stored(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredStory> {
    let vector_bytes: Vec<u8> = row.get(15)?;
    Ok(StoredStory {
        id: row.get(0)?,
        source: row.get(1)?,
        title: row.get(2)?,
        url: row.get(3)?,
        arxiv_id: row.get(4)?,
        summary: row.get(5)?,
        raw_text: row.get(6)?,
        score: row.get(7)?,
        comments: row.get(8)?,
        subreddit: row.get(9)?,
        author: row.get(10)?,
        fetched_at: row.get(11)?,
        used_in_episode: row.get(12)?,
        used_episode_date: row.get(13)?,
        schema_version: row.get::<_, Option<i64>>(14)?.unwrap_or(0),
        vector: bytes_to_embedding(&vector_bytes),
    })
}

/// Serialize embedding to little-endian bytes.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize embedding from bytes.
fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| {
            let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
            f32::from_le_bytes(arr)
        })
        .collect()
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::l2_normalize;
    use crate::story::{Source, SourceMeta};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic embedder that records every batch it receives.
    struct FakeEmbedder {
        calls: AtomicUsize,
        batches: Mutex<Vec<Vec<String>>>,
    }

    impl FakeEmbedder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                batches: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn batches(&self) -> Vec<Vec<String>> {
            self.batches.lock().unwrap().clone()
        }

        fn vector_for(text: &str) -> Vec<f32> {
            let seed: u32 = text.bytes().map(u32::from).sum();
            let mut vector: Vec<f32> = (0..EMBEDDING_DIM)
                .map(|i| ((seed.wrapping_add(i as u32)) % 17 + 1) as f32)
                .collect();
            l2_normalize(&mut vector);
            vector
        }
    }

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let embeddings = self.embed_batch(&[text.to_string()]).await?;
            Ok(embeddings.into_iter().next().unwrap())
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.batches.lock().unwrap().push(texts.to_vec());
            Ok(texts.iter().map(|t| Self::vector_for(t)).collect())
        }

        fn dimensions(&self) -> usize {
            EMBEDDING_DIM
        }
    }

    /// Embedder that always fails, for abort-path tests.
    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(SendeError::Embedding("model exploded".to_string()))
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(SendeError::Embedding("model exploded".to_string()))
        }

        fn dimensions(&self) -> usize {
            EMBEDDING_DIM
        }
    }

    fn story(id: &str, url: &str, raw_text: &str) -> Story {
        Story {
            id: id.to_string(),
            title: format!("Title for {}", id),
            summary: format!("Summary for {}", id),
            source_url: url.to_string(),
            source_meta: SourceMeta::new(Source::Reddit),
            raw_text: raw_text.to_string(),
            tags: vec!["test".to_string()],
        }
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn sample_batch() -> Vec<Story> {
        vec![
            story("reddit-aaa", "https://example.com/aaa", "first story text"),
            story("reddit-bbb", "https://example.com/bbb", "second story text"),
            story("reddit-ccc", "https://example.com/ccc", "third story text"),
        ]
    }

    #[tokio::test]
    async fn test_new_batch_inserts_all_stories() {
        let embedder = FakeEmbedder::new();
        let store = StoryStore::in_memory(embedder.clone()).unwrap();
        let stories = sample_batch();

        let outcome = store
            .store_stories_batch(&stories, date("2026-02-04"), true)
            .await
            .unwrap();

        assert_eq!(outcome.inserted, 3);
        assert_eq!(outcome.updated, 0);
        assert_eq!(embedder.call_count(), 1);
        assert_eq!(store.story_count().unwrap(), 3);

        for s in &stories {
            let row = store.find_story(s).unwrap().unwrap();
            assert!(row.used_in_episode);
            assert_eq!(row.used_episode_date.as_deref(), Some("2026-02-04"));
            assert_eq!(row.schema_version, SCHEMA_VERSION);
            assert_eq!(row.vector.len(), EMBEDDING_DIM);
            // Each row carries the vector for its own text, not a neighbor's.
            assert_eq!(row.vector, FakeEmbedder::vector_for(&s.embedding_text()));
        }
    }

    #[tokio::test]
    async fn test_vectors_follow_batch_order_for_large_batches() {
        let embedder = FakeEmbedder::new();
        let store = StoryStore::in_memory(embedder.clone()).unwrap();
        let stories: Vec<Story> = (0..60)
            .map(|i| {
                story(
                    &format!("reddit-{:03}", i),
                    &format!("https://example.com/{:03}", i),
                    &format!("story text number {}", i),
                )
            })
            .collect();

        store
            .store_stories_batch(&stories, date("2026-02-04"), true)
            .await
            .unwrap();

        assert_eq!(embedder.call_count(), 1);
        assert_eq!(store.story_count().unwrap(), 60);
        for s in &stories {
            let row = store.find_story(s).unwrap().unwrap();
            assert_eq!(row.vector, FakeEmbedder::vector_for(&s.embedding_text()));
        }
    }

    #[tokio::test]
    async fn test_reingestion_is_idempotent() {
        let embedder = FakeEmbedder::new();
        let store = StoryStore::in_memory(embedder.clone()).unwrap();
        let stories = sample_batch();

        store
            .store_stories_batch(&stories, date("2026-02-04"), true)
            .await
            .unwrap();
        let outcome = store
            .store_stories_batch(&stories, date("2026-02-05"), true)
            .await
            .unwrap();

        assert_eq!(outcome.inserted, 0);
        assert_eq!(outcome.updated, 0);
        assert_eq!(outcome.skipped, 3);
        // No second embedding call for an all-known batch.
        assert_eq!(embedder.call_count(), 1);
        assert_eq!(store.story_count().unwrap(), 3);

        // First-use date survives the re-ingestion.
        for s in &stories {
            let row = store.find_story(s).unwrap().unwrap();
            assert_eq!(row.used_episode_date.as_deref(), Some("2026-02-04"));
        }
    }

    #[tokio::test]
    async fn test_partition_embeds_only_new_stories() {
        let embedder = FakeEmbedder::new();
        let store = StoryStore::in_memory(embedder.clone()).unwrap();
        let known = story("reddit-known", "https://example.com/known", "known text");
        let fresh = story("reddit-fresh", "https://example.com/fresh", "fresh text");

        store
            .store_stories_batch(std::slice::from_ref(&known), date("2026-02-04"), true)
            .await
            .unwrap();

        let outcome = store
            .store_stories_batch(&[known.clone(), fresh.clone()], date("2026-02-05"), true)
            .await
            .unwrap();

        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(embedder.call_count(), 2);
        let batches = embedder.batches();
        assert_eq!(batches[1], vec!["fresh text".to_string()]);
    }

    #[tokio::test]
    async fn test_identity_match_by_url() {
        let embedder = FakeEmbedder::new();
        let store = StoryStore::in_memory(embedder.clone()).unwrap();

        let original = story("reddit-orig", "https://example.com/shared", "text");
        store
            .store_stories_batch(std::slice::from_ref(&original), date("2026-02-04"), true)
            .await
            .unwrap();

        // Same URL under a different id is the same story.
        let refetched = story("reddit-refetched", "https://example.com/shared", "text");
        let outcome = store
            .store_stories_batch(std::slice::from_ref(&refetched), date("2026-02-05"), true)
            .await
            .unwrap();

        assert_eq!(outcome.inserted, 0);
        assert_eq!(store.story_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_identity_match_by_arxiv_id() {
        let embedder = FakeEmbedder::new();
        let store = StoryStore::in_memory(embedder.clone()).unwrap();

        let mut original = story("alphaxiv-2401.01234", "https://alphaxiv.org/abs/2401.01234", "t");
        original.source_meta.source = Source::Alphaxiv;
        original
            .source_meta
            .extra
            .insert("arxiv_id".to_string(), "2401.01234".to_string());
        store
            .store_stories_batch(std::slice::from_ref(&original), date("2026-02-04"), true)
            .await
            .unwrap();

        let mut mirror = story("alphaxiv-mirror", "https://other.org/2401.01234", "t");
        mirror.source_meta.source = Source::Alphaxiv;
        mirror
            .source_meta
            .extra
            .insert("arxiv_id".to_string(), "2401.01234".to_string());
        let outcome = store
            .store_stories_batch(std::slice::from_ref(&mirror), date("2026-02-05"), true)
            .await
            .unwrap();

        assert_eq!(outcome.inserted, 0);
        assert_eq!(store.story_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_story_without_identity_keys_is_new() {
        let embedder = FakeEmbedder::new();
        let store = StoryStore::in_memory(embedder.clone()).unwrap();

        let anonymous = story("", "", "mystery text");
        let outcome = store
            .store_stories_batch(std::slice::from_ref(&anonymous), date("2026-02-04"), true)
            .await
            .unwrap();

        assert_eq!(outcome.inserted, 1);
    }

    #[tokio::test]
    async fn test_mark_used_false_defers_usage() {
        let embedder = FakeEmbedder::new();
        let store = StoryStore::in_memory(embedder.clone()).unwrap();
        let s = story("reddit-later", "https://example.com/later", "text");

        store
            .store_stories_batch(std::slice::from_ref(&s), date("2026-02-04"), false)
            .await
            .unwrap();
        let row = store.find_story(&s).unwrap().unwrap();
        assert!(!row.used_in_episode);
        assert_eq!(row.used_episode_date, None);

        // The first used batch sets the usage date.
        let outcome = store
            .store_stories_batch(std::slice::from_ref(&s), date("2026-02-06"), true)
            .await
            .unwrap();
        assert_eq!(outcome.updated, 1);
        let row = store.find_story(&s).unwrap().unwrap();
        assert!(row.used_in_episode);
        assert_eq!(row.used_episode_date.as_deref(), Some("2026-02-06"));
    }

    #[tokio::test]
    async fn test_embedding_failure_aborts_batch() {
        let store = StoryStore::in_memory(Arc::new(FailingEmbedder)).unwrap();
        let stories = sample_batch();

        let err = store
            .store_stories_batch(&stories, date("2026-02-04"), true)
            .await
            .unwrap_err();

        assert!(matches!(err, SendeError::StorageUnavailable(_)));
        // No partial insert of some-but-not-all new stories.
        assert_eq!(store.story_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_no_op() {
        let embedder = FakeEmbedder::new();
        let store = StoryStore::in_memory(embedder.clone()).unwrap();

        let outcome = store
            .store_stories_batch(&[], date("2026-02-04"), true)
            .await
            .unwrap();

        assert_eq!(outcome, BatchOutcome::default());
        assert_eq!(embedder.call_count(), 0);
    }

    #[tokio::test]
    async fn test_store_episode_appends_one_row_per_call() {
        let embedder = FakeEmbedder::new();
        let store = StoryStore::in_memory(embedder.clone()).unwrap();
        let manifest = EpisodeManifest {
            episode_date: "2026-02-04".to_string(),
            story_count: 3,
            segments: vec!["00_-_intro".to_string()],
        };

        store
            .store_episode(date("2026-02-04"), "episode text", &manifest)
            .await
            .unwrap();
        assert_eq!(store.episode_count().unwrap(), 1);

        store
            .store_episode(date("2026-02-04"), "episode text", &manifest)
            .await
            .unwrap();
        assert_eq!(store.episode_count().unwrap(), 2);

        let episodes = store.list_episodes().unwrap();
        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[0].episode_date, "2026-02-04");
        assert_eq!(episodes[0].story_count, 3);
    }

    #[tokio::test]
    async fn test_search_ranks_by_similarity() {
        let embedder = FakeEmbedder::new();
        let store = StoryStore::in_memory(embedder.clone()).unwrap();
        let stories = sample_batch();

        store
            .store_stories_batch(&stories, date("2026-02-04"), true)
            .await
            .unwrap();

        let query_vector = FakeEmbedder::vector_for("second story text");
        let results = store.search_by_vector(&query_vector, 2).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].story.id, "reddit-bbb");
        assert!((results[0].score - 1.0).abs() < 0.001);
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn test_embedding_bytes_roundtrip() {
        let original = vec![0.5f32, -1.25, 3.75];
        let bytes = embedding_to_bytes(&original);
        assert_eq!(bytes.len(), 12);
        assert_eq!(bytes_to_embedding(&bytes), original);
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &c).abs() < 0.001);
    }
}
