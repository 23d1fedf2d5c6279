use crate::docs::error::DocumentStoreError;
use crate::docs::store::{next_server_timestamp, normalize_feed, DocumentStore};
use crate::docs::subscription::{RelationFeeds, RelationSubscription, VideoSubscription};
use crate::models::{RelationKind, RelationRecord, StoredVideo, VideoDocument, VideoEntry};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// A SQLite implementation of the DocumentStore trait.
///
/// Document bodies are stored as JSON so older field shapes survive; ids and
/// timestamps live in their own columns. Writes publish a fresh feed snapshot
/// while still holding the connection, so subscribers see snapshots in write
/// order. Relation writes do the same for open relation feeds.
///
/// A row whose body no longer decodes is logged and left out of listings
/// rather than failing them.
pub struct SqliteDocumentStore {
    connection: Arc<Mutex<Connection>>,
    feed: Arc<watch::Sender<Vec<VideoEntry>>>,
    relation_feeds: Arc<RelationFeeds>,
}

impl SqliteDocumentStore {
    /// Create a new SqliteDocumentStore with the given database path
    pub fn new(db_path: &str) -> Result<Self, DocumentStoreError> {
        info!("Creating SQLite document store at path: {db_path}");

        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent).map_err(|e| {
                    error!("Failed to create directory {parent:?}: {e}");
                    DocumentStoreError::OpenError(format!("Failed to create directory: {e}"))
                })?;
            }
        }

        let connection = Connection::open(db_path).map_err(|e| {
            error!("Failed to open SQLite database at {db_path}: {e}");
            DocumentStoreError::OpenError(format!("Failed to open SQLite database: {e}"))
        })?;

        connection
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS videos (
                    id TEXT PRIMARY KEY,
                    created_at INTEGER NOT NULL,
                    body TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_videos_created_at ON videos(created_at);
                CREATE TABLE IF NOT EXISTS relations (
                    user_id TEXT NOT NULL,
                    kind TEXT NOT NULL,
                    video_id TEXT NOT NULL,
                    acted_at INTEGER NOT NULL,
                    body TEXT NOT NULL,
                    PRIMARY KEY (user_id, kind, video_id)
                );",
            )
            .map_err(|e| {
                error!("Failed to create document tables: {e}");
                DocumentStoreError::OpenError(format!("Failed to create tables: {e}"))
            })?;

        let initial = normalize_feed(Self::query_videos(&connection)?);
        let (feed, _) = watch::channel(initial);

        info!("SQLite document store initialized successfully at: {db_path}");
        Ok(SqliteDocumentStore {
            connection: Arc::new(Mutex::new(connection)),
            feed: Arc::new(feed),
            relation_feeds: Arc::new(RelationFeeds::default()),
        })
    }

    fn micros_to_datetime(micros: i64) -> Result<DateTime<Utc>, DocumentStoreError> {
        DateTime::from_timestamp_micros(micros).ok_or_else(|| {
            DocumentStoreError::OperationError(format!("Invalid timestamp: {micros}"))
        })
    }

    fn query_videos(conn: &Connection) -> Result<Vec<StoredVideo>, DocumentStoreError> {
        let mut stmt = conn
            .prepare("SELECT id, created_at, body FROM videos ORDER BY created_at DESC, id ASC")
            .map_err(|e| DocumentStoreError::OperationError(format!("Failed to prepare: {e}")))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(|e| DocumentStoreError::OperationError(format!("Failed to query: {e}")))?;

        let mut videos = Vec::new();
        for row in rows {
            let (id, created_at, body) = row.map_err(|e| {
                DocumentStoreError::OperationError(format!("Failed to read row: {e}"))
            })?;
            let document: VideoDocument = match serde_json::from_str(&body) {
                Ok(document) => document,
                Err(e) => {
                    warn!("Skipping undecodable video document {id}: {e}");
                    continue;
                }
            };
            videos.push(StoredVideo {
                id,
                created_at: Self::micros_to_datetime(created_at)?,
                document,
            });
        }
        Ok(videos)
    }

    fn query_relations(
        conn: &Connection,
        user_id: &str,
        kind: RelationKind,
    ) -> Result<Vec<RelationRecord>, DocumentStoreError> {
        let mut stmt = conn
            .prepare(
                "SELECT video_id, body FROM relations
                 WHERE user_id = ?1 AND kind = ?2
                 ORDER BY acted_at DESC",
            )
            .map_err(|e| DocumentStoreError::OperationError(format!("Failed to prepare: {e}")))?;

        let rows = stmt
            .query_map(params![user_id, Self::kind_to_string(kind)], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|e| DocumentStoreError::OperationError(format!("Failed to query: {e}")))?;

        let mut records = Vec::new();
        for row in rows {
            let (video_id, body) = row.map_err(|e| {
                DocumentStoreError::OperationError(format!("Failed to read row: {e}"))
            })?;
            match serde_json::from_str::<RelationRecord>(&body) {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    "Skipping undecodable {} record {video_id}: {e}",
                    kind.collection()
                ),
            }
        }
        Ok(records)
    }

    fn publish(conn: &Connection, feed: &watch::Sender<Vec<VideoEntry>>) {
        match Self::query_videos(conn) {
            Ok(videos) => {
                feed.send_replace(normalize_feed(videos));
            }
            Err(e) => error!("Failed to publish feed snapshot: {e}"),
        }
    }

    fn kind_to_string(kind: RelationKind) -> &'static str {
        kind.collection()
    }

    /// Run `f` against the connection on the blocking pool
    async fn with_connection<T, F>(&self, f: F) -> Result<T, DocumentStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &watch::Sender<Vec<VideoEntry>>) -> Result<T, DocumentStoreError>
            + Send
            + 'static,
    {
        let connection = Arc::clone(&self.connection);
        let feed = Arc::clone(&self.feed);

        task::spawn_blocking(move || {
            let conn = match connection.lock() {
                Ok(conn) => conn,
                Err(_) => {
                    error!("Failed to acquire database lock");
                    return Err(DocumentStoreError::Locked);
                }
            };
            f(&*conn, &*feed)
        })
        .await
        .map_err(|e| {
            error!("Task panic in document store: {e}");
            DocumentStoreError::OperationError(format!("Task panic: {e}"))
        })?
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn add_video(&self, document: VideoDocument) -> Result<StoredVideo, DocumentStoreError> {
        let body = serde_json::to_string(&document)
            .map_err(|e| DocumentStoreError::OperationError(format!("Failed to encode: {e}")))?;

        self.with_connection(move |conn, feed| {
            let last: Option<i64> = conn
                .query_row("SELECT MAX(created_at) FROM videos", [], |row| row.get(0))
                .map_err(|e| {
                    DocumentStoreError::OperationError(format!("Failed to read clock: {e}"))
                })?;
            let last = last.map(Self::micros_to_datetime).transpose()?;
            let created_at = next_server_timestamp(last);
            let id = Uuid::new_v4().simple().to_string();

            conn.execute(
                "INSERT INTO videos (id, created_at, body) VALUES (?1, ?2, ?3)",
                params![id, created_at.timestamp_micros(), body],
            )
            .map_err(|e| {
                error!("Failed to insert video document: {e}");
                DocumentStoreError::OperationError(format!("Failed to insert video: {e}"))
            })?;

            debug!("Added video document {id}");
            Self::publish(conn, feed);

            Ok(StoredVideo {
                id,
                created_at,
                document,
            })
        })
        .await
    }

    async fn list_video_documents(&self) -> Result<Vec<StoredVideo>, DocumentStoreError> {
        self.with_connection(|conn, _| Self::query_videos(conn)).await
    }

    async fn subscribe_videos(&self) -> Result<VideoSubscription, DocumentStoreError> {
        Ok(VideoSubscription::new(self.feed.subscribe()))
    }

    async fn delete_video(&self, id: &str) -> Result<(), DocumentStoreError> {
        let id = id.to_string();
        self.with_connection(move |conn, feed| {
            let removed = conn
                .execute("DELETE FROM videos WHERE id = ?1", params![id])
                .map_err(|e| {
                    DocumentStoreError::OperationError(format!("Failed to delete video: {e}"))
                })?;
            if removed == 0 {
                return Err(DocumentStoreError::DocumentNotFound(id));
            }

            debug!("Deleted video document {id}");
            Self::publish(conn, feed);
            Ok(())
        })
        .await
    }

    async fn get_relation(
        &self,
        user_id: &str,
        kind: RelationKind,
        video_id: &str,
    ) -> Result<Option<RelationRecord>, DocumentStoreError> {
        let user_id = user_id.to_string();
        let video_id = video_id.to_string();
        self.with_connection(move |conn, _| {
            let body: Option<String> = conn
                .query_row(
                    "SELECT body FROM relations WHERE user_id = ?1 AND kind = ?2 AND video_id = ?3",
                    params![user_id, Self::kind_to_string(kind), video_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| {
                    DocumentStoreError::OperationError(format!("Failed to read relation: {e}"))
                })?;

            body.map(|body| {
                serde_json::from_str(&body)
                    .map_err(|e| DocumentStoreError::DecodeError(video_id.clone(), e.to_string()))
            })
            .transpose()
        })
        .await
    }

    async fn set_relation(
        &self,
        mut record: RelationRecord,
    ) -> Result<RelationRecord, DocumentStoreError> {
        let feeds = Arc::clone(&self.relation_feeds);
        self.with_connection(move |conn, _| {
            let last: Option<i64> = conn
                .query_row("SELECT MAX(acted_at) FROM relations", [], |row| row.get(0))
                .map_err(|e| {
                    DocumentStoreError::OperationError(format!("Failed to read clock: {e}"))
                })?;
            let last = last.map(Self::micros_to_datetime).transpose()?;
            record.acted_at = next_server_timestamp(last);

            let body = serde_json::to_string(&record).map_err(|e| {
                DocumentStoreError::OperationError(format!("Failed to encode: {e}"))
            })?;
            conn.execute(
                "INSERT OR REPLACE INTO relations (user_id, kind, video_id, acted_at, body)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.user_id,
                    Self::kind_to_string(record.kind),
                    record.video_id,
                    record.acted_at.timestamp_micros(),
                    body
                ],
            )
            .map_err(|e| {
                error!("Failed to write relation: {e}");
                DocumentStoreError::OperationError(format!("Failed to write relation: {e}"))
            })?;

            feeds.publish(&record.user_id, record.kind, || {
                Self::query_relations(conn, &record.user_id, record.kind)
            });
            Ok(record)
        })
        .await
    }

    async fn delete_relation(
        &self,
        user_id: &str,
        kind: RelationKind,
        video_id: &str,
    ) -> Result<(), DocumentStoreError> {
        let user_id = user_id.to_string();
        let video_id = video_id.to_string();
        let feeds = Arc::clone(&self.relation_feeds);
        self.with_connection(move |conn, _| {
            conn.execute(
                "DELETE FROM relations WHERE user_id = ?1 AND kind = ?2 AND video_id = ?3",
                params![user_id, Self::kind_to_string(kind), video_id],
            )
            .map_err(|e| {
                DocumentStoreError::OperationError(format!("Failed to delete relation: {e}"))
            })?;

            feeds.publish(&user_id, kind, || Self::query_relations(conn, &user_id, kind));
            Ok(())
        })
        .await
    }

    async fn list_relations(
        &self,
        user_id: &str,
        kind: RelationKind,
    ) -> Result<Vec<RelationRecord>, DocumentStoreError> {
        let user_id = user_id.to_string();
        self.with_connection(move |conn, _| Self::query_relations(conn, &user_id, kind))
            .await
    }

    async fn subscribe_relations(
        &self,
        user_id: &str,
        kind: RelationKind,
    ) -> Result<RelationSubscription, DocumentStoreError> {
        let user_id = user_id.to_string();
        let feeds = Arc::clone(&self.relation_feeds);
        self.with_connection(move |conn, _| {
            feeds.subscribe(&user_id, kind, || Self::query_relations(conn, &user_id, kind))
        })
        .await
    }
}
