//! Regex helpers for pulling values out of pages and URLs

use crate::utils::error::TiktokError;
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

/// Video page URLs this extractor understands
pub static VALID_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://www\.tiktokv?\.com/(?:@[\w\._]+|share)/video/(?P<id>\d+)")
        .expect("valid url pattern")
});

/// Script tag carrying the embedded page state
pub static NEXT_DATA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"id="__NEXT_DATA__"\s+type="application/json"\s*[^>]+>\s*(?P<json_string_id>[^<]+)"#,
    )
    .expect("valid page data pattern")
});

/// Capture group selection for [`search_regex`]
#[derive(Debug, Clone, Copy)]
pub enum Group<'g> {
    /// A named capture group
    Named(&'g str),
    /// The first group that participated in the match
    FirstMatched,
}

/// Search `subject` with each pattern in order and return the selected group
/// of the first one that matches.
///
/// When nothing matches, `fatal` decides between an
/// [`TiktokError::ExtractionError`] naming `name` and a logged warning with
/// `Ok(None)`.
pub fn search_regex(
    patterns: &[&Regex],
    subject: &str,
    name: &str,
    group: Group<'_>,
    fatal: bool,
) -> Result<Option<String>, TiktokError> {
    let captures = patterns.iter().find_map(|re| re.captures(subject));

    let found = captures.and_then(|caps| match group {
        Group::Named(group_name) => caps.name(group_name).map(|m| m.as_str().to_string()),
        Group::FirstMatched => caps
            .iter()
            .skip(1)
            .flatten()
            .next()
            .map(|m| m.as_str().to_string()),
    });

    match found {
        Some(value) => Ok(Some(value)),
        None if fatal => Err(TiktokError::ExtractionError(name.to_string())),
        None => {
            warn!("unable to extract {}", name);
            Ok(None)
        }
    }
}

/// Extract the numeric video id from a video page URL
pub fn match_id(url: &str) -> Result<String, TiktokError> {
    VALID_URL_RE
        .captures(url)
        .and_then(|caps| caps.name("id"))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| TiktokError::InvalidUrl(url.to_string()))
}

/// Extract the embedded JSON document from a video page
pub fn extract_page_json(webpage: &str) -> Result<String, TiktokError> {
    search_regex(
        &[&*NEXT_DATA_RE],
        webpage,
        "json_string",
        Group::Named("json_string_id"),
        true,
    )?
    .ok_or_else(|| TiktokError::ExtractionError("json_string".to_string()))
}
