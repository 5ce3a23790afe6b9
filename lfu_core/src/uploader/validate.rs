use reqwest::Url;

use crate::types::types::UploadError;

/// Source format → target formats the conversion service supports.
const CONVERSIONS: &[(&str, &[&str])] = &[
    ("youtube", &["wav", "mp3", "aiff", "mp4", "flac"]),
    ("mp3", &["flac", "wav"]),
    ("wav", &["mp3", "flac", "ogg", "aiff"]),
    ("flac", &["mp3", "wav", "ogg", "aiff"]),
    ("rar", &["iso", "zip"]),
    ("iso", &["rar", "zip"]),
    ("png", &["jpg"]),
    ("jpg", &["png"]),
    ("mp4", &["mov"]),
    ("mov", &["mp4"]),
];

pub fn conversion_targets(from: &str) -> Option<&'static [&'static str]> {
    CONVERSIONS
        .iter()
        .find(|(source, _)| *source == from)
        .map(|(_, targets)| *targets)
}

/// Reject pairs the service would refuse, before any bytes are sent.
pub fn validate_conversion(from: &str, to: &str) -> Result<(), UploadError> {
    match conversion_targets(from) {
        Some(targets) if targets.contains(&to) => Ok(()),
        _ => Err(UploadError::UnsupportedConversion {
            from: from.to_string(),
            to: to.to_string(),
        }),
    }
}

fn is_video_id(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Accepts `youtube.com/watch?v=ID`, `youtu.be/ID`, `youtube.com/embed/ID`
/// and `youtube.com/v/ID`, over http or https, with or without `www.`.
pub fn validate_youtube_url(raw: &str) -> Result<(), UploadError> {
    let invalid = || UploadError::InvalidYoutubeUrl(raw.to_string());
    let url = Url::parse(raw).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }

    let host = url.host_str().ok_or_else(invalid)?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    let segments: Vec<&str> = url.path_segments().map(|s| s.collect()).unwrap_or_default();

    let valid = match (host, segments.as_slice()) {
        ("youtu.be", [id, ..]) => is_video_id(id),
        ("youtube.com", ["watch", ..]) => url
            .query_pairs()
            .any(|(k, v)| k == "v" && is_video_id(&v)),
        ("youtube.com", ["embed" | "v", id, ..]) => is_video_id(id),
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_pairs_pass() {
        assert!(validate_conversion("wav", "mp3").is_ok());
        assert!(validate_conversion("youtube", "flac").is_ok());
        assert!(validate_conversion("mov", "mp4").is_ok());
    }

    #[test]
    fn unsupported_pairs_fail() {
        assert!(matches!(
            validate_conversion("mp3", "ogg"),
            Err(UploadError::UnsupportedConversion { .. })
        ));
        assert!(validate_conversion("docx", "pdf").is_err());
        assert_eq!(conversion_targets("docx"), None);
    }

    #[test]
    fn youtube_url_shapes() {
        for ok in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "http://youtube.com/watch?v=abc-_1",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://youtube.com/v/dQw4w9WgXcQ",
        ] {
            assert!(validate_youtube_url(ok).is_ok(), "{} should pass", ok);
        }
        for bad in [
            "not a url",
            "ftp://youtube.com/watch?v=abc",
            "https://vimeo.com/12345",
            "https://www.youtube.com/watch?list=abc",
            "https://youtu.be/",
            "https://www.youtube.com/channel/abc",
        ] {
            assert!(
                matches!(validate_youtube_url(bad), Err(UploadError::InvalidYoutubeUrl(_))),
                "{} should fail",
                bad
            );
        }
    }
}
