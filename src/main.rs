// src/main.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::{debug, error, info};

use motivate_feed::admin::{MaintenanceSweep, UploadFile, UploadPipeline};
use motivate_feed::auth::login::continue_with_credentials;
use motivate_feed::auth::{AdminAllowList, Session, StaticAuthProvider};
use motivate_feed::config::{self, Config};
use motivate_feed::docs::{DocumentStore, SqliteDocumentStore};
use motivate_feed::feed::{
    load_saved, BackgroundVideo, BackgroundView, FeedController, Playback, PlaybackError,
    ToggleOutcome, VideoCard,
};
use motivate_feed::logging::init_logging;
use motivate_feed::models::{RelationKind, VideoEntry};
use motivate_feed::objects::S3ObjectStore;
use motivate_feed::prefs::Preferences;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config.toml",
        global = true
    )]
    config: String,

    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the feed, newest first
    Feed,
    /// Print the signed-in user's saved videos
    Saved,
    /// Upload video files and add them to the feed
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Title for every file; defaults to each file name without extension
        #[arg(long)]
        title: Option<String>,

        /// Hashtags, e.g. "#grit, focus"
        #[arg(long)]
        tags: Option<String>,
    },
    /// Rewrite the content type of every stored video
    Fix,
    /// Delete a video and its stored object
    Delete { video_id: String },
    /// Toggle like on a video
    Like { video_id: String },
    /// Toggle save on a video
    Save { video_id: String },
    /// Show or change viewer preferences
    Prefs {
        #[arg(long)]
        muted: Option<Switch>,

        #[arg(long)]
        auto_advance: Option<Switch>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Switch {
    On,
    Off,
}

impl Switch {
    fn enabled(self) -> bool {
        matches!(self, Switch::On)
    }
}

/// The terminal has no media element; playback calls are accepted and dropped
struct HeadlessPlayer;

#[async_trait]
impl Playback for HeadlessPlayer {
    async fn play(&self, _muted: bool) -> Result<(), PlaybackError> {
        Ok(())
    }

    fn pause(&self) {}

    fn seek_to_start(&self) {}

    fn set_muted(&self, _muted: bool) {}
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match config::load_config(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            process::exit(1);
        }
    };

    let _log_guard = init_logging(config.logging.as_ref(), cli.verbose)?;
    info!("Motivate feed v{}", env!("CARGO_PKG_VERSION"));
    debug!("Configuration loaded from {}", cli.config);

    let prefs = Preferences::load(&config.preferences.path)
        .context("Failed to load preferences")?;

    if let Commands::Prefs {
        muted,
        auto_advance,
    } = cli.command
    {
        return update_prefs(&prefs, muted, auto_advance).await;
    }

    let store = Arc::new(
        SqliteDocumentStore::new(&config.store.path).context("Failed to open document store")?,
    );
    let admins = AdminAllowList::from_config(&config.admin.emails, &config.admin.tokens);

    match cli.command {
        Commands::Feed => show_feed(&config, store, prefs).await,
        Commands::Saved => {
            let session = sign_in(&config).await?;
            match load_saved(&*store, &session).await {
                Ok(saved) => print_entries(&saved, None),
                Err(e) => println!("{}", e),
            }
            Ok(())
        }
        Commands::Upload { files, title, tags } => {
            let session = sign_in(&config).await?;
            let objects = Arc::new(open_objects(&config).await?);
            let mut batch = Vec::with_capacity(files.len());
            for path in &files {
                batch.push(read_upload_file(path, title.as_deref(), tags.as_deref()).await?);
            }

            let pipeline = UploadPipeline::new(store, objects, admins);
            match pipeline
                .run(&session, batch, |index, fraction| {
                    debug!("File {}: {:.0}%", index, fraction * 100.0);
                })
                .await
            {
                Ok(summary) => println!("{}", summary),
                Err(e) => println!("{}", e),
            }
            Ok(())
        }
        Commands::Fix => {
            let session = sign_in(&config).await?;
            let objects = Arc::new(open_objects(&config).await?);
            let sweep = MaintenanceSweep::new(store, objects, admins);
            match sweep.run(&session).await {
                Ok(tally) => println!("{}", tally),
                Err(e) => println!("{}", e),
            }
            Ok(())
        }
        Commands::Delete { video_id } => {
            let session = sign_in(&config).await?;
            let Some(card) = mount_card(&store, &video_id, prefs, session).await? else {
                return Ok(());
            };
            let objects = open_objects(&config).await?;
            match card.admin_delete(&objects, &admins).await {
                Ok(outcome) => match outcome.removed_object {
                    Some(path) => println!("Deleted {} and {}", outcome.video_id, path),
                    None => println!("Deleted {}; its stored object was left behind", outcome.video_id),
                },
                Err(e) => println!("{}", e),
            }
            Ok(())
        }
        Commands::Like { video_id } => {
            toggle_relation(&config, &store, &video_id, prefs, RelationKind::Like).await
        }
        Commands::Save { video_id } => {
            toggle_relation(&config, &store, &video_id, prefs, RelationKind::Saved).await
        }
        Commands::Prefs { .. } => Ok(()),
    }
}

async fn toggle_relation(
    config: &Config,
    store: &Arc<SqliteDocumentStore>,
    video_id: &str,
    prefs: Preferences,
    kind: RelationKind,
) -> Result<()> {
    let session = sign_in(config).await?;
    let Some(card) = mount_card(store, video_id, prefs, session).await? else {
        return Ok(());
    };
    let (label, outcome) = match kind {
        RelationKind::Like => ("Liked", card.toggle_like().await),
        RelationKind::Saved => ("Saved", card.toggle_save().await),
    };
    match outcome {
        Ok(ToggleOutcome::Applied(on)) => println!("{}: {}", label, on),
        Ok(ToggleOutcome::Reverted { value, reason }) => {
            println!("{}: {} ({})", label, value, reason)
        }
        Ok(ToggleOutcome::Busy) => println!("{} change already in progress", label),
        Err(e) => println!("{}", e),
    }
    Ok(())
}

async fn sign_in(config: &Config) -> Result<Session> {
    let session_config = config
        .session
        .clone()
        .context("A [session] section is required for this command")?;
    let email = session_config.email.clone();
    let password = session_config.password.clone();
    let auth = StaticAuthProvider::new(session_config);
    let session = continue_with_credentials(&auth, &email, &password)
        .await
        .context("Sign-in failed")?;
    info!("Signed in as {}", session.uid);
    Ok(session)
}

async fn open_objects(config: &Config) -> Result<S3ObjectStore> {
    let objects_config = config
        .objects
        .as_ref()
        .context("An [objects] section is required for this command")?;
    S3ObjectStore::new(objects_config)
        .await
        .context("Failed to connect to object storage")
}

async fn show_feed(config: &Config, store: Arc<SqliteDocumentStore>, prefs: Preferences) -> Result<()> {
    let background = BackgroundVideo::mount(
        &config.background.sources,
        &config.background.poster,
        config.background.reduced_motion,
        &mut rand::rng(),
    )
    .context("Invalid [background] configuration")?;
    match background.view() {
        BackgroundView::Video { source } => println!("Background: {}", source),
        BackgroundView::Poster { path } => println!("Background poster: {}", path),
    }

    let mut feed = FeedController::new(prefs, config.feed.active_threshold);
    if let Err(e) = feed.attach(&*store).await {
        println!("{}", e);
        return Ok(());
    }
    print_entries(feed.entries(), feed.active_index());
    feed.teardown();
    Ok(())
}

fn print_entries(entries: &[VideoEntry], active: Option<usize>) {
    if entries.is_empty() {
        println!("No videos yet.");
        return;
    }
    for (index, entry) in entries.iter().enumerate() {
        let marker = if Some(index) == active { ">" } else { " " };
        println!(
            "{} {} [{}] {} {}",
            marker,
            entry.id,
            entry.created_at.format("%Y-%m-%d %H:%M"),
            entry.title.as_deref().unwrap_or("(untitled)"),
            entry.display_tags()
        );
        println!("    {}", entry.url);
    }
}

async fn mount_card(
    store: &Arc<SqliteDocumentStore>,
    video_id: &str,
    prefs: Preferences,
    session: Session,
) -> Result<Option<VideoCard<SqliteDocumentStore, HeadlessPlayer>>> {
    let entry = match store.list_videos().await {
        Ok(entries) => entries.into_iter().find(|entry| entry.id == video_id),
        Err(e) => {
            error!("Failed to list videos: {}", e);
            println!("{}", e);
            return Ok(None);
        }
    };
    let Some(entry) = entry else {
        println!("No video with id {}", video_id);
        return Ok(None);
    };
    Ok(Some(
        VideoCard::mount(entry, store.clone(), HeadlessPlayer, prefs, Some(session)).await,
    ))
}

async fn read_upload_file(path: &Path, title: Option<&str>, tags: Option<&str>) -> Result<UploadFile> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} is not a file", path.display()))?;

    let mut file = UploadFile::new(&name, content_type_for(path), Bytes::from(data));
    if let Some(title) = title {
        file = file.with_title(title);
    }
    if let Some(tags) = tags {
        file = file.with_hashtags(tags);
    }
    Ok(file)
}

/// Declared content type from the file extension
fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "m4v" => "video/x-m4v",
        "mkv" => "video/x-matroska",
        "ogv" => "video/ogg",
        _ => "application/octet-stream",
    }
}

async fn update_prefs(prefs: &Preferences, muted: Option<Switch>, auto_advance: Option<Switch>) -> Result<()> {
    if let Some(muted) = muted {
        prefs.set_muted(muted.enabled()).await?;
    }
    if let Some(auto_advance) = auto_advance {
        prefs.set_auto_advance(auto_advance.enabled()).await?;
    }
    let values = prefs.values();
    println!("muted: {}", values.muted);
    println!("autoAdvance: {}", values.auto_advance);
    Ok(())
}
