//! Recognizers for video hosts whose watch pages have a dedicated
//! embeddable player.
//!
//! Recognition is best-effort: an unrecognized URL simply leaves the
//! alternate-content toggle disabled, it is never an error.

use url::Url;

/// A recognized video id plus the host family it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoEmbed {
    YouTube(String),
    Bilibili(String),
}

impl VideoEmbed {
    /// URL of the dedicated player for this id.
    pub fn player_url(&self) -> String {
        match self {
            VideoEmbed::YouTube(id) => format!("https://www.youtube.com/embed/{id}?autoplay=1"),
            VideoEmbed::Bilibili(id) => {
                format!("https://player.bilibili.com/player.html?bvid={id}&page=1")
            }
        }
    }

    pub fn id(&self) -> &str {
        match self {
            VideoEmbed::YouTube(id) | VideoEmbed::Bilibili(id) => id,
        }
    }
}

/// Try to extract a playable video id from a watch-page URL.
pub fn recognize(url: &str) -> Option<VideoEmbed> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    if is_youtube_host(host) {
        return youtube_id(&parsed).map(VideoEmbed::YouTube);
    }
    if is_bilibili_host(host) {
        return bilibili_id(&parsed).map(VideoEmbed::Bilibili);
    }
    None
}

fn is_youtube_host(host: &str) -> bool {
    matches!(
        host,
        "www.youtube.com" | "youtube.com" | "m.youtube.com" | "youtu.be"
    )
}

fn is_bilibili_host(host: &str) -> bool {
    matches!(host, "www.bilibili.com" | "bilibili.com" | "m.bilibili.com")
}

/// YouTube ids are exactly 11 URL-safe base64 characters, found either in the
/// `v` query parameter of a watch URL or positionally in short/embed paths.
fn youtube_id(url: &Url) -> Option<String> {
    if let Some((_, value)) = url.query_pairs().find(|(key, _)| key == "v")
        && is_youtube_id(&value)
    {
        return Some(value.into_owned());
    }
    let mut segments = url.path_segments()?;
    let id = match segments.next()? {
        // youtu.be/<id>
        candidate if url.host_str() == Some("youtu.be") => candidate,
        "embed" | "shorts" | "live" => segments.next()?,
        _ => return None,
    };
    is_youtube_id(id).then(|| id.to_string())
}

fn is_youtube_id(candidate: &str) -> bool {
    candidate.len() == 11
        && candidate
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Bilibili watch URLs carry a `BV`-prefixed id in the `/video/` path or in a
/// `bvid` query parameter.
fn bilibili_id(url: &Url) -> Option<String> {
    if let Some((_, value)) = url.query_pairs().find(|(key, _)| key == "bvid")
        && is_bilibili_id(&value)
    {
        return Some(value.into_owned());
    }
    let mut segments = url.path_segments()?;
    while let Some(segment) = segments.next() {
        if segment == "video" {
            let id = segments.next()?;
            return is_bilibili_id(id).then(|| id.to_string());
        }
    }
    None
}

fn is_bilibili_id(candidate: &str) -> bool {
    candidate.len() == 12
        && candidate.starts_with("BV")
        && candidate[2..].bytes().all(|b| b.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_watch_query_form() {
        let embed = recognize("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
        assert_eq!(embed, VideoEmbed::YouTube("dQw4w9WgXcQ".into()));
        assert!(embed.player_url().contains("dQw4w9WgXcQ"));
    }

    #[test]
    fn recognizes_positional_forms() {
        assert_eq!(
            recognize("https://youtu.be/dQw4w9WgXcQ"),
            Some(VideoEmbed::YouTube("dQw4w9WgXcQ".into()))
        );
        assert_eq!(
            recognize("https://www.youtube.com/embed/dQw4w9WgXcQ"),
            Some(VideoEmbed::YouTube("dQw4w9WgXcQ".into()))
        );
    }

    #[test]
    fn rejects_wrong_length_ids() {
        assert_eq!(recognize("https://www.youtube.com/watch?v=short"), None);
        assert_eq!(recognize("https://www.youtube.com/results?search_query=x"), None);
    }

    #[test]
    fn recognizes_bilibili_path_and_query() {
        assert_eq!(
            recognize("https://www.bilibili.com/video/BV1GJ411x7h7/?p=2"),
            Some(VideoEmbed::Bilibili("BV1GJ411x7h7".into()))
        );
        assert_eq!(
            recognize("https://www.bilibili.com/play?bvid=BV1GJ411x7h7"),
            Some(VideoEmbed::Bilibili("BV1GJ411x7h7".into()))
        );
    }

    #[test]
    fn unrelated_hosts_do_not_match() {
        assert_eq!(recognize("https://example.com/watch?v=dQw4w9WgXcQ"), None);
    }
}
