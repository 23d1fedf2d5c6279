use crate::docs::error::DocumentStoreError;
use crate::docs::store::{next_server_timestamp, normalize_feed, DocumentStore};
use crate::docs::subscription::{RelationFeeds, RelationSubscription, VideoSubscription};
use crate::models::{RelationKind, RelationRecord, StoredVideo, VideoDocument, VideoEntry};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;

type RelationKey = (String, RelationKind, String);

/// A fake in-memory implementation of the DocumentStore trait for testing
#[derive(Clone)]
pub struct FakeDocumentStore {
    videos: Arc<RwLock<HashMap<String, StoredVideo>>>,
    relations: Arc<RwLock<HashMap<RelationKey, RelationRecord>>>,
    last_timestamp: Arc<RwLock<Option<DateTime<Utc>>>>,
    feed: Arc<watch::Sender<Vec<VideoEntry>>>,
    relation_feeds: Arc<RelationFeeds>,
    fail_video_writes: Arc<AtomicBool>,
    fail_relation_writes: Arc<AtomicBool>,
    fail_reads: Arc<AtomicBool>,
    relation_write_delay_ms: Arc<AtomicU64>,
}

impl FakeDocumentStore {
    /// Create a new empty FakeDocumentStore
    pub fn new() -> Self {
        let (feed, _) = watch::channel(Vec::new());
        FakeDocumentStore {
            videos: Arc::new(RwLock::new(HashMap::new())),
            relations: Arc::new(RwLock::new(HashMap::new())),
            last_timestamp: Arc::new(RwLock::new(None)),
            feed: Arc::new(feed),
            relation_feeds: Arc::new(RelationFeeds::default()),
            fail_video_writes: Arc::new(AtomicBool::new(false)),
            fail_relation_writes: Arc::new(AtomicBool::new(false)),
            fail_reads: Arc::new(AtomicBool::new(false)),
            relation_write_delay_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Insert a raw document as-is, bypassing id and timestamp assignment
    pub fn fake_insert_document(&self, stored: StoredVideo) {
        let mut videos = self.videos.write().unwrap();
        videos.insert(stored.id.clone(), stored);
        self.publish(&videos);
    }

    /// Make writes to `videos` fail
    pub fn fake_fail_video_writes(&self, fail: bool) {
        self.fail_video_writes.store(fail, Ordering::SeqCst);
    }

    /// Make relation writes and deletes fail
    pub fn fake_fail_relation_writes(&self, fail: bool) {
        self.fail_relation_writes.store(fail, Ordering::SeqCst);
    }

    /// Make listing and reads fail
    pub fn fake_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Hold relation writes in flight for `delay` before applying them
    pub fn fake_delay_relation_writes(&self, delay: Duration) {
        self.relation_write_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    async fn relation_write_delay(&self) {
        let delay = self.relation_write_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }

    pub fn fake_video_count(&self) -> usize {
        self.videos.read().unwrap().len()
    }

    fn sorted(videos: &HashMap<String, StoredVideo>) -> Vec<StoredVideo> {
        let mut sorted: Vec<StoredVideo> = videos.values().cloned().collect();
        // Newest first, id as a stable tie-break
        sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        sorted
    }

    fn publish(&self, videos: &HashMap<String, StoredVideo>) {
        self.feed.send_replace(normalize_feed(Self::sorted(videos)));
    }

    fn user_relations(
        relations: &HashMap<RelationKey, RelationRecord>,
        user_id: &str,
        kind: RelationKind,
    ) -> Vec<RelationRecord> {
        let mut records: Vec<RelationRecord> = relations
            .values()
            .filter(|record| record.user_id == user_id && record.kind == kind)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.acted_at.cmp(&a.acted_at));
        records
    }

    fn check(flag: &AtomicBool, what: &str) -> Result<(), DocumentStoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(DocumentStoreError::PermissionDenied(format!(
                "simulated failure: {what}"
            )))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for FakeDocumentStore {
    async fn add_video(&self, document: VideoDocument) -> Result<StoredVideo, DocumentStoreError> {
        Self::check(&self.fail_video_writes, "add video")?;

        let mut videos = self.videos.write().unwrap();
        let mut last = self.last_timestamp.write().unwrap();
        let created_at = next_server_timestamp(*last);
        *last = Some(created_at);

        let stored = StoredVideo {
            id: Uuid::new_v4().simple().to_string(),
            created_at,
            document,
        };
        videos.insert(stored.id.clone(), stored.clone());
        self.publish(&videos);
        Ok(stored)
    }

    async fn list_video_documents(&self) -> Result<Vec<StoredVideo>, DocumentStoreError> {
        Self::check(&self.fail_reads, "list videos")?;
        let videos = self.videos.read().unwrap();
        Ok(Self::sorted(&videos))
    }

    async fn subscribe_videos(&self) -> Result<VideoSubscription, DocumentStoreError> {
        Self::check(&self.fail_reads, "subscribe")?;
        Ok(VideoSubscription::new(self.feed.subscribe()))
    }

    async fn delete_video(&self, id: &str) -> Result<(), DocumentStoreError> {
        Self::check(&self.fail_video_writes, "delete video")?;

        let mut videos = self.videos.write().unwrap();
        if videos.remove(id).is_none() {
            return Err(DocumentStoreError::DocumentNotFound(id.to_string()));
        }
        self.publish(&videos);
        Ok(())
    }

    async fn get_relation(
        &self,
        user_id: &str,
        kind: RelationKind,
        video_id: &str,
    ) -> Result<Option<RelationRecord>, DocumentStoreError> {
        Self::check(&self.fail_reads, "get relation")?;
        let relations = self.relations.read().unwrap();
        Ok(relations
            .get(&(user_id.to_string(), kind, video_id.to_string()))
            .cloned())
    }

    async fn set_relation(
        &self,
        mut record: RelationRecord,
    ) -> Result<RelationRecord, DocumentStoreError> {
        self.relation_write_delay().await;
        Self::check(&self.fail_relation_writes, "set relation")?;

        let mut relations = self.relations.write().unwrap();
        let mut last = self.last_timestamp.write().unwrap();
        record.acted_at = next_server_timestamp(*last);
        *last = Some(record.acted_at);

        relations.insert(
            (record.user_id.clone(), record.kind, record.video_id.clone()),
            record.clone(),
        );
        self.relation_feeds.publish(&record.user_id, record.kind, || {
            Ok(Self::user_relations(&relations, &record.user_id, record.kind))
        });
        Ok(record)
    }

    async fn delete_relation(
        &self,
        user_id: &str,
        kind: RelationKind,
        video_id: &str,
    ) -> Result<(), DocumentStoreError> {
        self.relation_write_delay().await;
        Self::check(&self.fail_relation_writes, "delete relation")?;
        let mut relations = self.relations.write().unwrap();
        relations.remove(&(user_id.to_string(), kind, video_id.to_string()));
        self.relation_feeds.publish(user_id, kind, || {
            Ok(Self::user_relations(&relations, user_id, kind))
        });
        Ok(())
    }

    async fn list_relations(
        &self,
        user_id: &str,
        kind: RelationKind,
    ) -> Result<Vec<RelationRecord>, DocumentStoreError> {
        Self::check(&self.fail_reads, "list relations")?;
        let relations = self.relations.read().unwrap();
        Ok(Self::user_relations(&relations, user_id, kind))
    }

    async fn subscribe_relations(
        &self,
        user_id: &str,
        kind: RelationKind,
    ) -> Result<RelationSubscription, DocumentStoreError> {
        Self::check(&self.fail_reads, "subscribe relations")?;
        let relations = self.relations.read().unwrap();
        self.relation_feeds.subscribe(user_id, kind, || {
            Ok(Self::user_relations(&relations, user_id, kind))
        })
    }
}

impl Default for FakeDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}
