use crate::objects::error::UrlPathError;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Prefix under which uploaded videos live
pub const VIDEO_PREFIX: &str = "videos";

/// Content type forced onto every video object by the maintenance sweep
pub const CANONICAL_VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Characters left unescaped when an object path is embedded in a URL segment.
/// `/` is escaped so the whole path stays a single segment.
const OBJECT_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'.')
    .remove(b'-')
    .remove(b'_')
    .remove(b'~');

/// Make a file name safe for an object path: whitespace runs become `_`,
/// then everything outside `[A-Za-z0-9._-]` is dropped.
pub fn sanitize_file_name(name: &str) -> String {
    let mut underscored = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                underscored.push('_');
            }
            in_whitespace = true;
        } else {
            underscored.push(c);
            in_whitespace = false;
        }
    }

    underscored
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect()
}

/// `videos/{epochMillis}-{fileIndex}-{safeName}`
pub fn video_object_path(epoch_millis: i64, file_index: usize, safe_name: &str) -> String {
    format!("{VIDEO_PREFIX}/{epoch_millis}-{file_index}-{safe_name}")
}

/// File name without its last extension: `clip.final.mp4` -> `clip.final`
pub fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() && !ext.contains('/') => stem,
        _ => name,
    }
}

/// Percent-encode an object path as a single URL segment
pub fn encode_object_path(path: &str) -> String {
    utf8_percent_encode(path, OBJECT_SEGMENT).to_string()
}

/// Recover an object path from a download URL of the form
/// `.../o/{percent-encoded path}?...`.
///
/// Takes the text between the first `/o/` and the following `?` (or the end)
/// and percent-decodes it.
pub fn path_from_download_url(url: &str) -> Result<String, UrlPathError> {
    let encoded = url
        .split("/o/")
        .nth(1)
        .and_then(|rest| rest.split('?').next())
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| UrlPathError::MissingSegment(url.to_string()))?;

    percent_decode_str(encoded)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| UrlPathError::InvalidEncoding(encoded.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_whitespace_and_strips_symbols() {
        assert_eq!(sanitize_file_name("My Video!!.mp4"), "My_Video.mp4");
        assert_eq!(sanitize_file_name("Believe In You.mov"), "Believe_In_You.mov");
        assert_eq!(sanitize_file_name("a \t  b.mp4"), "a_b.mp4");
        assert_eq!(sanitize_file_name("ünïcode clip.webm"), "ncode_clip.webm");
        assert_eq!(sanitize_file_name("keep-this_name.v2.mp4"), "keep-this_name.v2.mp4");
    }

    #[test]
    fn sanitized_names_only_contain_allowed_characters() {
        for name in ["  spaced  out .mp4", "a/b\\c:d*e?.mov", "(1) [final] {cut}.mp4", ""] {
            let safe = sanitize_file_name(name);
            assert!(
                safe.chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')),
                "unexpected character in {safe:?}"
            );
            assert!(!safe.contains("__"), "whitespace run not collapsed in {safe:?}");
        }
    }

    #[test]
    fn object_paths_differ_by_index_for_same_millisecond() {
        let first = video_object_path(1_700_000_000_000, 0, "clip.mp4");
        let second = video_object_path(1_700_000_000_000, 1, "clip.mp4");
        assert_eq!(first, "videos/1700000000000-0-clip.mp4");
        assert_ne!(first, second);
    }

    #[test]
    fn strip_extension_removes_last_extension_only() {
        assert_eq!(strip_extension("Believe In You.mov"), "Believe In You");
        assert_eq!(strip_extension("clip.final.mp4"), "clip.final");
        assert_eq!(strip_extension("noext"), "noext");
        assert_eq!(strip_extension("trailing."), "trailing.");
    }

    #[test]
    fn path_from_download_url_decodes_segment() {
        let url = "https://storage.example.com/v0/b/bucket/o/videos%2F171-0-My_Video.mp4?alt=media&token=abc";
        assert_eq!(
            path_from_download_url(url).unwrap(),
            "videos/171-0-My_Video.mp4"
        );
    }

    #[test]
    fn path_from_download_url_without_query() {
        let url = "https://storage.example.com/v0/b/bucket/o/videos%2Fclip.mp4";
        assert_eq!(path_from_download_url(url).unwrap(), "videos/clip.mp4");
    }

    #[test]
    fn path_from_download_url_rejects_malformed_input() {
        assert!(matches!(
            path_from_download_url("not a url"),
            Err(UrlPathError::MissingSegment(_))
        ));
        assert!(matches!(
            path_from_download_url("https://host/v0/b/bucket/o/?alt=media"),
            Err(UrlPathError::MissingSegment(_))
        ));
        assert!(matches!(
            path_from_download_url(""),
            Err(UrlPathError::MissingSegment(_))
        ));
        assert!(matches!(
            path_from_download_url("https://host/o/%FF%FE?x"),
            Err(UrlPathError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn encoded_paths_round_trip_through_url_parsing() {
        let path = "videos/1700000000000-3-Believe_In_You.mov";
        let url = format!("https://cdn.example.com/o/{}?alt=media", encode_object_path(path));
        assert!(!encode_object_path(path).contains('/'));
        assert_eq!(path_from_download_url(&url).unwrap(), path);
    }
}
