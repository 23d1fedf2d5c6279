use crate::admin::error::MaintenanceError;
use crate::auth::{AdminAllowList, Session};
use crate::docs::DocumentStore;
use crate::objects::path::CANONICAL_VIDEO_CONTENT_TYPE;
use crate::objects::{resolve_object_path, ObjectStore};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepTally {
    pub fixed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl fmt::Display for SweepTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Fix complete. Fixed {}, skipped {}, failed {}.",
            self.fixed, self.skipped, self.failed
        )
    }
}

/// Rewrites the content type of every stored video object to `video/mp4`
pub struct MaintenanceSweep<D: DocumentStore + ?Sized, O: ObjectStore + ?Sized> {
    store: Arc<D>,
    objects: Arc<O>,
    admins: AdminAllowList,
}

impl<D: DocumentStore + ?Sized, O: ObjectStore + ?Sized> MaintenanceSweep<D, O> {
    pub fn new(store: Arc<D>, objects: Arc<O>, admins: AdminAllowList) -> Self {
        Self {
            store,
            objects,
            admins,
        }
    }

    /// Visit every document once. Only a failure to list the collection
    /// aborts the sweep.
    pub async fn run(&self, session: &Session) -> Result<SweepTally, MaintenanceError> {
        if !self.admins.permits(session) {
            return Err(MaintenanceError::NotAuthorized);
        }

        let documents = self.store.list_video_documents().await?;
        info!("Fixing content type of {} videos", documents.len());

        let mut tally = SweepTally::default();
        for stored in documents {
            let Some(url) = stored.document.url.as_deref().filter(|url| !url.is_empty()) else {
                debug!("Skipping {}: no url", stored.id);
                tally.skipped += 1;
                continue;
            };

            let path = match resolve_object_path(&*self.objects, url) {
                Ok(path) => path,
                Err(e) => {
                    debug!("Skipping {}: {}", stored.id, e);
                    tally.skipped += 1;
                    continue;
                }
            };

            match self
                .objects
                .set_content_type(&path, CANONICAL_VIDEO_CONTENT_TYPE)
                .await
            {
                Ok(()) => tally.fixed += 1,
                Err(e) => {
                    warn!("Content type update failed for {}: {}", url, e);
                    tally.failed += 1;
                }
            }
        }

        info!("{}", tally);
        Ok(tally)
    }
}
