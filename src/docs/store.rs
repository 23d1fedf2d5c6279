use crate::docs::error::DocumentStoreError;
use crate::docs::subscription::{RelationSubscription, VideoSubscription};
use crate::models::{RelationKind, RelationRecord, StoredVideo, VideoDocument, VideoEntry};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// DocumentStore trait defining the interface for the structured store
/// backing the feed and the per-user relation collections
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Add a document to `videos`; the store assigns the id and a creation
    /// timestamp strictly greater than any it assigned before
    async fn add_video(&self, document: VideoDocument) -> Result<StoredVideo, DocumentStoreError>;

    /// Every document in `videos`, newest first, as stored
    async fn list_video_documents(&self) -> Result<Vec<StoredVideo>, DocumentStoreError>;

    /// Subscribe to live snapshots of the normalized feed
    async fn subscribe_videos(&self) -> Result<VideoSubscription, DocumentStoreError>;

    /// Delete a document from `videos`
    async fn delete_video(&self, id: &str) -> Result<(), DocumentStoreError>;

    /// Read one relation record
    async fn get_relation(
        &self,
        user_id: &str,
        kind: RelationKind,
        video_id: &str,
    ) -> Result<Option<RelationRecord>, DocumentStoreError>;

    /// Create or overwrite a relation record. The store stamps `acted_at`
    /// with its own clock, strictly after any relation it stamped before,
    /// and returns the record as written.
    async fn set_relation(
        &self,
        record: RelationRecord,
    ) -> Result<RelationRecord, DocumentStoreError>;

    /// Delete a relation record; deleting a missing record succeeds
    async fn delete_relation(
        &self,
        user_id: &str,
        kind: RelationKind,
        video_id: &str,
    ) -> Result<(), DocumentStoreError>;

    /// A user's relation records of one kind, most recent action first
    async fn list_relations(
        &self,
        user_id: &str,
        kind: RelationKind,
    ) -> Result<Vec<RelationRecord>, DocumentStoreError>;

    /// Subscribe to live snapshots of a user's relation records of one kind,
    /// most recent action first
    async fn subscribe_relations(
        &self,
        user_id: &str,
        kind: RelationKind,
    ) -> Result<RelationSubscription, DocumentStoreError>;

    /// The normalized feed, newest first. Documents without a URL are left out.
    async fn list_videos(&self) -> Result<Vec<VideoEntry>, DocumentStoreError> {
        Ok(normalize_feed(self.list_video_documents().await?))
    }
}

/// Normalize stored documents into feed entries, keeping order
pub fn normalize_feed(documents: Vec<StoredVideo>) -> Vec<VideoEntry> {
    documents
        .into_iter()
        .filter_map(StoredVideo::into_entry)
        .collect()
}

/// Implementation of DocumentStore trait for Arc<T> where T implements DocumentStore
///
/// This allows sharing store instances across components efficiently.
#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    async fn add_video(&self, document: VideoDocument) -> Result<StoredVideo, DocumentStoreError> {
        (**self).add_video(document).await
    }

    async fn list_video_documents(&self) -> Result<Vec<StoredVideo>, DocumentStoreError> {
        (**self).list_video_documents().await
    }

    async fn subscribe_videos(&self) -> Result<VideoSubscription, DocumentStoreError> {
        (**self).subscribe_videos().await
    }

    async fn delete_video(&self, id: &str) -> Result<(), DocumentStoreError> {
        (**self).delete_video(id).await
    }

    async fn get_relation(
        &self,
        user_id: &str,
        kind: RelationKind,
        video_id: &str,
    ) -> Result<Option<RelationRecord>, DocumentStoreError> {
        (**self).get_relation(user_id, kind, video_id).await
    }

    async fn set_relation(
        &self,
        record: RelationRecord,
    ) -> Result<RelationRecord, DocumentStoreError> {
        (**self).set_relation(record).await
    }

    async fn delete_relation(
        &self,
        user_id: &str,
        kind: RelationKind,
        video_id: &str,
    ) -> Result<(), DocumentStoreError> {
        (**self).delete_relation(user_id, kind, video_id).await
    }

    async fn list_relations(
        &self,
        user_id: &str,
        kind: RelationKind,
    ) -> Result<Vec<RelationRecord>, DocumentStoreError> {
        (**self).list_relations(user_id, kind).await
    }

    async fn subscribe_relations(
        &self,
        user_id: &str,
        kind: RelationKind,
    ) -> Result<RelationSubscription, DocumentStoreError> {
        (**self).subscribe_relations(user_id, kind).await
    }
}

/// Server timestamp for a new write: now at microsecond precision, bumped
/// past `last` so timestamps are strictly increasing per store
pub fn next_server_timestamp(last: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    let now = DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now);
    match last {
        Some(last) if now <= last => last + Duration::microseconds(1),
        _ => now,
    }
}
