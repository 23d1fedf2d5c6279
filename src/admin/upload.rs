use crate::admin::error::UploadError;
use crate::auth::{AdminAllowList, Session};
use crate::docs::DocumentStore;
use crate::models::{parse_hashtags, VideoDocument};
use crate::objects::path::{sanitize_file_name, strip_extension, video_object_path};
use crate::objects::{ObjectStore, UploadProgress};
use bytes::Bytes;
use chrono::Utc;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// A local file selected for upload, with its editable title and hashtag text
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    /// Declared MIME type, e.g. `video/mp4`
    pub content_type: String,
    pub data: Bytes,
    pub title: String,
    pub hashtags: String,
}

impl UploadFile {
    /// A file with the default title (its name without extension) and no hashtags
    pub fn new(name: &str, content_type: &str, data: Bytes) -> Self {
        Self {
            name: name.to_string(),
            content_type: content_type.to_string(),
            data,
            title: strip_extension(name).to_string(),
            hashtags: String::new(),
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_hashtags(mut self, hashtags: &str) -> Self {
        self.hashtags = hashtags.to_string();
        self
    }

    fn is_video(&self) -> bool {
        self.content_type.starts_with("video/")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadResult {
    Uploaded { video_id: String, url: String },
    Skipped { reason: String },
    Failed { message: String },
}

/// One file's attempt
#[derive(Debug, Clone, PartialEq)]
pub struct UploadTask {
    pub file_name: String,
    pub object_path: Option<String>,
    /// Fraction of bytes transferred when the attempt ended
    pub progress: f64,
    pub result: UploadResult,
}

/// Terminal report of a batch
#[derive(Debug, Clone, PartialEq)]
pub struct UploadSummary {
    pub tasks: Vec<UploadTask>,
}

impl UploadSummary {
    pub fn total(&self) -> usize {
        self.tasks.len()
    }

    pub fn uploaded(&self) -> usize {
        self.tasks
            .iter()
            .filter(|task| matches!(task.result, UploadResult::Uploaded { .. }))
            .count()
    }

    pub fn skipped(&self) -> Vec<&str> {
        self.tasks
            .iter()
            .filter(|task| matches!(task.result, UploadResult::Skipped { .. }))
            .map(|task| task.file_name.as_str())
            .collect()
    }

    pub fn failures(&self) -> Vec<&str> {
        self.tasks
            .iter()
            .filter_map(|task| match &task.result {
                UploadResult::Failed { message } => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.failures().last().copied()
    }
}

impl fmt::Display for UploadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.last_error() {
            None => write!(f, "Done. Videos added. ({}/{})", self.uploaded(), self.total()),
            Some(last) => write!(
                f,
                "Done with errors ({}/{}). Last error: {}",
                self.uploaded(),
                self.total(),
                last
            ),
        }
    }
}

/// Uploads video files and registers them in the feed, one file at a time.
///
/// A failing file is recorded and the batch moves on.
pub struct UploadPipeline<D: DocumentStore + ?Sized, O: ObjectStore + ?Sized> {
    store: Arc<D>,
    objects: Arc<O>,
    admins: AdminAllowList,
}

impl<D: DocumentStore + ?Sized, O: ObjectStore + ?Sized> UploadPipeline<D, O> {
    pub fn new(store: Arc<D>, objects: Arc<O>, admins: AdminAllowList) -> Self {
        Self {
            store,
            objects,
            admins,
        }
    }

    /// Run a batch. `on_progress` receives the file index and the fraction of
    /// that file uploaded after each chunk.
    pub async fn run<F>(
        &self,
        session: &Session,
        files: Vec<UploadFile>,
        on_progress: F,
    ) -> Result<UploadSummary, UploadError>
    where
        F: Fn(usize, f64) + Send + Sync,
    {
        if !self.admins.permits(session) {
            return Err(UploadError::NotAuthorized);
        }
        if files.is_empty() {
            return Err(UploadError::NoFiles);
        }

        info!("Uploading {} files", files.len());
        let mut tasks = Vec::with_capacity(files.len());
        for (index, file) in files.iter().enumerate() {
            let task = self.upload_one(index, file, &on_progress).await;
            tasks.push(task);
        }

        let summary = UploadSummary { tasks };
        info!("{}", summary);
        Ok(summary)
    }

    async fn upload_one<F>(&self, index: usize, file: &UploadFile, on_progress: &F) -> UploadTask
    where
        F: Fn(usize, f64) + Send + Sync,
    {
        if !file.is_video() {
            warn!("Skipping non-video {} ({})", file.name, file.content_type);
            return UploadTask {
                file_name: file.name.clone(),
                object_path: None,
                progress: 0.0,
                result: UploadResult::Skipped {
                    reason: format!("{} is not a video", file.content_type),
                },
            };
        }

        let safe_name = sanitize_file_name(&file.name);
        let path = video_object_path(Utc::now().timestamp_millis(), index, &safe_name);
        let last_fraction = Mutex::new(0.0f64);
        let report = |progress: UploadProgress| {
            let fraction = progress.fraction();
            if let Ok(mut last) = last_fraction.lock() {
                *last = fraction;
            }
            on_progress(index, fraction);
        };

        let result = self.transfer(file, &path, &safe_name, &report).await;
        let progress = last_fraction.lock().map(|last| *last).unwrap_or(0.0);
        let result = match result {
            Ok((video_id, url)) => {
                debug!("Uploaded {} as {}", file.name, path);
                UploadResult::Uploaded { video_id, url }
            }
            Err(message) => {
                error!("{}", message);
                UploadResult::Failed { message }
            }
        };

        UploadTask {
            file_name: file.name.clone(),
            object_path: Some(path),
            progress,
            result,
        }
    }

    async fn transfer(
        &self,
        file: &UploadFile,
        path: &str,
        safe_name: &str,
        report: &(dyn Fn(UploadProgress) + Send + Sync),
    ) -> Result<(String, String), String> {
        self.objects
            .upload(path, file.data.clone(), &file.content_type, report)
            .await
            .map_err(|e| format!("Storage upload failed for {}: {}", file.name, e))?;

        self.objects
            .set_content_type(path, &file.content_type)
            .await
            .map_err(|e| format!("Storage finalize failed for {}: {}", file.name, e))?;
        let url = self
            .objects
            .download_url(path)
            .await
            .map_err(|e| format!("Storage finalize failed for {}: {}", file.name, e))?;

        let title = match file.title.trim() {
            "" => safe_name.to_string(),
            title => title.to_string(),
        };
        let document = VideoDocument {
            url: Some(url.clone()),
            title: Some(title),
            hashtags: parse_hashtags(&file.hashtags),
            ..Default::default()
        };
        let stored = self
            .store
            .add_video(document)
            .await
            .map_err(|e| format!("Document write failed for {}: {}", file.name, e))?;

        Ok((stored.id, url))
    }
}
