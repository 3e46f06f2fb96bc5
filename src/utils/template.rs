//! Output filename templates
//!
//! A template is plain text with `{key}` placeholders; `{{` and `}}` produce
//! literal braces. Keys are the scalar fields of [`VideoData`] plus the UTC
//! calendar fields `Y`, `m`, `d`, `H`, `M` and `S` derived from
//! `create_time`. An unknown key is an error, as is a calendar key for a
//! video without `create_time`. Other fields with no value render as `None`.

use crate::extractor::models::VideoData;
use crate::utils::error::TemplateError;
use chrono::{DateTime, Utc};

/// Characters replaced inside substituted values
const INVALID_CHARS: [char; 10] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|', '\0'];

/// Rendered in place of a record field that has no value
pub const NULL_VALUE: &str = "None";

/// Every key a template may reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKey {
    Id,
    Ext,
    Width,
    Height,
    Duration,
    CommentCount,
    DiggCount,
    ShareCount,
    PlayCount,
    CreateTime,
    UploadDate,
    Title,
    Description,
    NickName,
    UniqueId,
    SecUid,
    UserId,
    UserUrl,
    WebpageUrl,
    FollowerCount,
    HeartTotal,
    DuetInfo,
    MusicId,
    MusicTitle,
    MusicArtist,
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl TemplateKey {
    pub fn parse(key: &str) -> Option<Self> {
        let key = match key {
            "id" => Self::Id,
            "ext" => Self::Ext,
            "width" => Self::Width,
            "height" => Self::Height,
            "duration" => Self::Duration,
            "comment_count" => Self::CommentCount,
            "digg_count" => Self::DiggCount,
            "share_count" => Self::ShareCount,
            "play_count" => Self::PlayCount,
            "create_time" => Self::CreateTime,
            "upload_date" => Self::UploadDate,
            "title" => Self::Title,
            "description" => Self::Description,
            "nick_name" => Self::NickName,
            "unique_id" => Self::UniqueId,
            "sec_uid" => Self::SecUid,
            "user_id" => Self::UserId,
            "user_url" => Self::UserUrl,
            "webpage_url" => Self::WebpageUrl,
            "follower_count" => Self::FollowerCount,
            "heart_total" => Self::HeartTotal,
            "duet_info" => Self::DuetInfo,
            "music_id" => Self::MusicId,
            "music_title" => Self::MusicTitle,
            "music_artist" => Self::MusicArtist,
            "Y" => Self::Year,
            "m" => Self::Month,
            "d" => Self::Day,
            "H" => Self::Hour,
            "M" => Self::Minute,
            "S" => Self::Second,
            _ => return None,
        };
        Some(key)
    }

    /// strftime pattern for the calendar keys
    fn time_format(self) -> Option<&'static str> {
        match self {
            Self::Year => Some("%Y"),
            Self::Month => Some("%m"),
            Self::Day => Some("%d"),
            Self::Hour => Some("%H"),
            Self::Minute => Some("%M"),
            Self::Second => Some("%S"),
            _ => None,
        }
    }
}

/// A record augmented with its derived calendar fields
pub struct TemplateContext<'a> {
    data: &'a VideoData,
    created: Option<DateTime<Utc>>,
}

impl<'a> TemplateContext<'a> {
    pub fn new(data: &'a VideoData) -> Self {
        let created = data
            .create_time
            .and_then(|ts| DateTime::from_timestamp(ts, 0));
        Self { data, created }
    }

    /// Text for a key, `None` when this video has no value for it
    pub fn resolve(&self, key: TemplateKey) -> Option<String> {
        if let Some(fmt) = key.time_format() {
            return self.created.map(|dt| format_utctime(&dt, fmt));
        }

        let d = self.data;
        let int = |v: Option<i64>| v.map(|n| n.to_string());
        match key {
            TemplateKey::Id => d.id.clone(),
            TemplateKey::Ext => Some(d.ext.clone()),
            TemplateKey::Width => int(d.width),
            TemplateKey::Height => int(d.height),
            TemplateKey::Duration => int(d.duration),
            TemplateKey::CommentCount => int(d.comment_count),
            TemplateKey::DiggCount => int(d.digg_count),
            TemplateKey::ShareCount => int(d.share_count),
            TemplateKey::PlayCount => int(d.play_count),
            TemplateKey::CreateTime => int(d.create_time),
            TemplateKey::UploadDate => d.upload_date.clone(),
            TemplateKey::Title => Some(d.title.clone()),
            TemplateKey::Description => d.description.clone(),
            TemplateKey::NickName => d.nick_name.clone(),
            TemplateKey::UniqueId => d.unique_id.clone(),
            TemplateKey::SecUid => d.sec_uid.clone(),
            TemplateKey::UserId => d.user_id.clone(),
            TemplateKey::UserUrl => d.user_url.clone(),
            TemplateKey::WebpageUrl => d.webpage_url.clone(),
            TemplateKey::FollowerCount => int(d.follower_count),
            TemplateKey::HeartTotal => d.heart_total.clone(),
            TemplateKey::DuetInfo => d.duet_info.clone(),
            TemplateKey::MusicId => d.music_id.clone(),
            TemplateKey::MusicTitle => d.music_title.clone(),
            TemplateKey::MusicArtist => d.music_artist.clone(),
            TemplateKey::Year
            | TemplateKey::Month
            | TemplateKey::Day
            | TemplateKey::Hour
            | TemplateKey::Minute
            | TemplateKey::Second => None,
        }
    }
}

pub fn format_utctime(time: &DateTime<Utc>, fmt: &str) -> String {
    time.format(fmt).to_string()
}

/// Render `template` for `data`
pub fn expand_template(template: &str, data: &VideoData) -> Result<String, TemplateError> {
    let ctx = TemplateContext::new(data);
    let mut out = String::with_capacity(template.len() + 32);
    let mut rest = template;
    let mut offset = 0;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
            offset += pos + 2;
        } else if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
            offset += pos + 2;
        } else if tail.starts_with('}') {
            return Err(TemplateError::Syntax {
                position: offset + pos,
                reason: "single '}' encountered",
            });
        } else {
            let close = tail.find('}').ok_or(TemplateError::Syntax {
                position: offset + pos,
                reason: "unclosed '{'",
            })?;
            let name = &tail[1..close];
            let key = TemplateKey::parse(name)
                .ok_or_else(|| TemplateError::UnknownPlaceholder(name.to_string()))?;
            let value = match ctx.resolve(key) {
                Some(value) => value,
                None if key.time_format().is_some() => {
                    return Err(TemplateError::MissingValue(name.to_string()))
                }
                None => NULL_VALUE.to_string(),
            };
            out.push_str(&sanitize_component(&value));
            rest = &tail[close + 1..];
            offset += pos + close + 1;
        }
    }
    out.push_str(rest);

    Ok(out)
}

/// Make a substituted value safe to embed in a path
///
/// Separators and characters invalid on common filesystems become `_`, so a
/// value can never climb out of the directory the template describes.
pub fn sanitize_component(value: &str) -> String {
    let replaced: String = value
        .chars()
        .map(|c| {
            if INVALID_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    if replaced.trim_matches('.').is_empty() && !replaced.is_empty() {
        return "_".repeat(replaced.len());
    }
    replaced
}
