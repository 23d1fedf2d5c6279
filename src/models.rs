use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Maximum number of tags kept on a video
pub const MAX_TAGS: usize = 20;

/// A playable item of the feed, normalized from its stored document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoEntry {
    pub id: String,
    pub url: String,
    pub title: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub poster: Option<String>,
}

impl VideoEntry {
    /// Tags rendered the way the card shows them, e.g. `#grit #focus`
    pub fn display_tags(&self) -> String {
        self.tags
            .iter()
            .map(|tag| format!("#{tag}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Body of a document in the `videos` collection as it is stored.
///
/// Older documents carry their tags under `hashtags`, newer ones under `tags`,
/// and some were written without a `url`. Nothing outside the document store
/// reads this type directly except the maintenance sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "tag_list", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "tag_list", skip_serializing_if = "Vec::is_empty")]
    pub hashtags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
}

/// Stored tags are a list, but some documents hold one free-text string
/// such as `"grit focus"`. Both decode to raw, unnormalized tags.
fn tag_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StoredTags {
        List(Vec<String>),
        Text(String),
    }

    Ok(match Option::<StoredTags>::deserialize(deserializer)? {
        Some(StoredTags::List(tags)) => tags,
        Some(StoredTags::Text(text)) => split_tag_text(&text).map(String::from).collect(),
        None => Vec::new(),
    })
}

fn split_tag_text(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
}

/// A video document together with the fields the store assigns on write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredVideo {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub document: VideoDocument,
}

impl StoredVideo {
    /// Normalize into a feed entry. Returns `None` when the document has no playable URL.
    pub fn into_entry(self) -> Option<VideoEntry> {
        let url = self.document.url.filter(|url| !url.trim().is_empty())?;
        let raw_tags = if self.document.tags.is_empty() {
            self.document.hashtags
        } else {
            self.document.tags
        };

        Some(VideoEntry {
            id: self.id,
            url,
            title: self.document.title.filter(|title| !title.is_empty()),
            tags: normalize_tags(raw_tags),
            created_at: self.created_at,
            poster: self.document.poster,
        })
    }
}

/// The two per-user relations a viewer can hold with a video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    Like,
    Saved,
}

impl RelationKind {
    /// Name of the per-user collection holding this relation
    pub fn collection(&self) -> &'static str {
        match self {
            RelationKind::Like => "likes",
            RelationKind::Saved => "saved",
        }
    }
}

/// Marker that a user liked or saved a video. Its existence is the relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRecord {
    pub user_id: String,
    pub video_id: String,
    pub kind: RelationKind,
    pub title: String,
    pub url: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub poster: Option<String>,
    pub acted_at: DateTime<Utc>,
}

impl RelationRecord {
    /// Build a record carrying a denormalized copy of the entry. `acted_at`
    /// is provisional; the document store stamps it on write.
    pub fn for_entry(user_id: &str, kind: RelationKind, entry: &VideoEntry) -> Self {
        Self {
            user_id: user_id.to_string(),
            video_id: entry.id.clone(),
            kind,
            title: entry.title.clone().unwrap_or_default(),
            url: entry.url.clone(),
            tags: entry.tags.clone(),
            created_at: entry.created_at,
            poster: entry.poster.clone(),
            acted_at: Utc::now(),
        }
    }

    /// Present the denormalized copy as a feed entry
    pub fn into_entry(self) -> VideoEntry {
        VideoEntry {
            id: self.video_id,
            url: self.url,
            title: if self.title.is_empty() {
                None
            } else {
                Some(self.title)
            },
            tags: self.tags,
            created_at: self.created_at,
            poster: self.poster,
        }
    }
}

/// Normalize a list of raw tags: trim, drop leading `#`, lowercase,
/// drop empties, dedup keeping first occurrence, cap at [`MAX_TAGS`].
pub fn normalize_tags<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tags: Vec<String> = Vec::new();
    for tag in raw {
        let tag = tag.as_ref().trim().trim_start_matches('#').trim().to_lowercase();
        if tag.is_empty() || tags.contains(&tag) {
            continue;
        }
        tags.push(tag);
        if tags.len() == MAX_TAGS {
            break;
        }
    }
    tags
}

/// Parse free-text hashtag input such as `"#drive, power focus"`
pub fn parse_hashtags(input: &str) -> Vec<String> {
    normalize_tags(split_tag_text(input))
}
