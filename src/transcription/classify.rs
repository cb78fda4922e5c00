//! Header/content/footer splitting and format/type classification of transcription comments.

use once_cell::sync::Lazy;
use regex::Regex;

/// Markdown horizontal rule separating header, content and footer.
pub const SEPARATOR: &str = "---";

/// `*<format> Transcription[:] [<type>]*`
static HEADER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\*(?P<format>[\w ]*\w)\s+transcription:?\s*(?P<type>[\w ]*)\*").unwrap()
});

/// Ordered type normalization rules.
///
/// Every rule is checked against the type phrase of the header; a match
/// overwrites the type with the rule's label, so a later rule wins over an
/// earlier one when both match.
pub const TYPE_RULES: &[(&[&str], &str)] = &[
    (&["twitter"], "Twitter"),
    (&["facebook"], "Facebook"),
    (&["tumblr"], "Tumblr"),
    (&["reddit"], "Reddit"),
    (&["picture", "photo", "photogra"], "Picture"),
    (&["review"], "Review"),
    (&["youtube"], "YouTube"),
    (&["code"], "Code"),
    (&["chat", "message", "discord", "email", "e-mail"], "Chat"),
    (&["meme"], "Meme"),
    (&["social media"], "Social Media"),
    (&["image"], "Image"),
    (&["video"], "Video"),
    (&["text"], "Text"),
];

/// Split a comment body into trimmed header, content and footer.
///
/// Separators beyond the first and last belong to the content. A body with
/// fewer than two separators has empty content.
#[must_use]
pub fn extract_components(body: &str) -> (String, String, String) {
    let segments: Vec<&str> = body.split(SEPARATOR).collect();

    let header = segments.first().map_or("", |s| s.trim());
    let footer = segments.last().map_or("", |s| s.trim());
    let content = if segments.len() > 2 {
        segments[1..segments.len() - 1].join(SEPARATOR).trim().to_string()
    } else {
        String::new()
    };

    (header.to_string(), content, footer.to_string())
}

/// Classify a header into `(format, type)`.
///
/// Headers that don't look like `*Image Transcription: Twitter*` yield `(None, None)`.
#[must_use]
pub fn extract_format_and_type(header: &str) -> (Option<String>, Option<String>) {
    let Some(captures) = HEADER_PATTERN.captures(header) else {
        return (None, None);
    };

    let mut format = captures["format"].trim().to_string();
    let type_phrase = captures
        .name("type")
        .map(|m| m.as_str().trim())
        .filter(|t| !t.is_empty())
        .unwrap_or(format.as_str())
        .to_string();

    let lowered = type_phrase.to_lowercase();
    if lowered.contains("gif") {
        format = "GIF".to_string();
    }

    (Some(format), Some(normalize_type(&type_phrase)))
}

/// Apply [`TYPE_RULES`] to a raw type phrase.
#[must_use]
pub fn normalize_type(type_phrase: &str) -> String {
    let lowered = type_phrase.to_lowercase();
    let mut normalized = type_phrase;

    for (needles, label) in TYPE_RULES {
        if needles.iter().any(|needle| lowered.contains(needle)) {
            normalized = *label;
        }
    }

    normalized.to_string()
}
