use crate::auth::Session;
use crate::docs::{DocumentStore, DocumentStoreError, RelationSubscription};
use crate::models::{RelationKind, RelationRecord, VideoEntry};
use tracing::debug;

/// Whether the user holds the relation with the video
pub async fn relation_exists<D: DocumentStore + ?Sized>(
    store: &D,
    user_id: &str,
    kind: RelationKind,
    video_id: &str,
) -> Result<bool, DocumentStoreError> {
    Ok(store.get_relation(user_id, kind, video_id).await?.is_some())
}

/// Create the relation record when `on`, delete it otherwise
pub async fn write_relation<D: DocumentStore + ?Sized>(
    store: &D,
    user_id: &str,
    kind: RelationKind,
    entry: &VideoEntry,
    on: bool,
) -> Result<(), DocumentStoreError> {
    if on {
        let record = store
            .set_relation(RelationRecord::for_entry(user_id, kind, entry))
            .await?;
        debug!("{} {} at {}", kind.collection(), entry.id, record.acted_at);
        Ok(())
    } else {
        store.delete_relation(user_id, kind, &entry.id).await
    }
}

/// The user's saved videos, most recently saved first
pub async fn load_saved<D: DocumentStore + ?Sized>(
    store: &D,
    session: &Session,
) -> Result<Vec<VideoEntry>, DocumentStoreError> {
    Ok(store
        .list_relations(&session.uid, RelationKind::Saved)
        .await?
        .into_iter()
        .map(RelationRecord::into_entry)
        .collect())
}

/// Live saved page: every save or unsave by the user yields a fresh list,
/// most recently saved first
pub struct SavedList {
    subscription: RelationSubscription,
}

impl SavedList {
    pub async fn open<D: DocumentStore + ?Sized>(
        store: &D,
        session: &Session,
    ) -> Result<Self, DocumentStoreError> {
        let subscription = store
            .subscribe_relations(&session.uid, RelationKind::Saved)
            .await?;
        Ok(Self { subscription })
    }

    /// The current list first, then one list per change. `None` once the
    /// store has gone away.
    pub async fn next(&mut self) -> Option<Vec<VideoEntry>> {
        let records = self.subscription.next().await?;
        Some(records.into_iter().map(RelationRecord::into_entry).collect())
    }
}
