//! Text-versus-binary classification of a response `Content-Type`.
//!
//! The result never changes how the body is handled; it only decides
//! whether the host gets a warning that the body may not be text.

use std::collections::BTreeSet;

use mime::Mime;

/// Outcome of classifying a content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentClass {
    Text,
    Binary,
}

impl ContentClass {
    pub fn is_text(&self) -> bool {
        matches!(self, ContentClass::Text)
    }
}

/// Classify a raw `Content-Type` header value.
///
/// Text means the media type is `text/*`, exactly `application/json`, or
/// starts with `application/samlmetadata+xml`, and any `charset` is
/// `utf-8` or `us-ascii`. Anything unparsable is binary, including an
/// empty subtype or a parameter given twice.
pub fn classify(content_type: &str) -> ContentClass {
    let Some(parsed) = parse_media_type(content_type) else {
        return ContentClass::Binary;
    };

    if !is_text_media_type(&parsed) {
        return ContentClass::Binary;
    }

    let charset = parsed
        .get_param(mime::CHARSET)
        .map(|c| c.as_str().to_ascii_lowercase())
        .unwrap_or_default();

    match charset.as_str() {
        "" | "utf-8" | "us-ascii" => ContentClass::Text,
        _ => ContentClass::Binary,
    }
}

/// Parse leniently around the media type (`text/plain ; charset=utf-8`)
/// but strictly about its shape.
fn parse_media_type(content_type: &str) -> Option<Mime> {
    let normalized = match content_type.split_once(';') {
        Some((essence, params)) => format!("{};{params}", essence.trim()),
        None => content_type.trim().to_string(),
    };
    let parsed: Mime = normalized.parse().ok()?;

    if parsed.subtype().as_str().is_empty() {
        return None;
    }
    let mut seen = BTreeSet::new();
    for (name, _) in parsed.params() {
        if !seen.insert(name.as_str().to_ascii_lowercase()) {
            return None;
        }
    }
    Some(parsed)
}

fn is_text_media_type(parsed: &Mime) -> bool {
    let essence = parsed.essence_str();
    parsed.type_() == mime::TEXT
        || essence == "application/json"
        || essence.starts_with("application/samlmetadata+xml")
}
