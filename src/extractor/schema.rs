//! Structural check of the metadata record before it is written out

use crate::extractor::models::VideoData;
use crate::utils::error::TiktokError;
use serde_json::Value;

/// JSON kind a record field may hold besides `null`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    StringList,
    List,
}

impl FieldKind {
    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            FieldKind::List => value.is_array(),
        }
    }
}

/// Every key of the record, whether it may be `null`, and its kind
pub const VIDEO_DATA_SCHEMA: &[(&str, bool, FieldKind)] = &[
    ("id", true, FieldKind::String),
    ("play_urls", true, FieldKind::StringList),
    ("ext", false, FieldKind::String),
    ("width", true, FieldKind::Integer),
    ("height", true, FieldKind::Integer),
    ("duration", true, FieldKind::Integer),
    ("thumbnails", true, FieldKind::StringList),
    ("comment_count", true, FieldKind::Integer),
    ("digg_count", true, FieldKind::Integer),
    ("share_count", true, FieldKind::Integer),
    ("play_count", true, FieldKind::Integer),
    ("create_time", true, FieldKind::Integer),
    ("upload_date", true, FieldKind::String),
    ("title", false, FieldKind::String),
    ("description", true, FieldKind::String),
    ("nick_name", true, FieldKind::String),
    ("unique_id", true, FieldKind::String),
    ("sec_uid", true, FieldKind::String),
    ("user_id", true, FieldKind::String),
    ("user_url", true, FieldKind::String),
    ("profile_pics", true, FieldKind::StringList),
    ("webpage_url", true, FieldKind::String),
    ("follower_count", true, FieldKind::Integer),
    ("heart_total", true, FieldKind::String),
    ("challenge_list", true, FieldKind::List),
    ("duet_info", true, FieldKind::String),
    ("text_extra", true, FieldKind::List),
    ("music_id", true, FieldKind::String),
    ("music_title", true, FieldKind::String),
    ("music_artist", true, FieldKind::String),
    ("music_covers", true, FieldKind::StringList),
];

/// Validate a serialized record: all keys present, values of the right kind.
/// Null values are accepted wherever the schema marks the field nullable.
pub fn validate(record: &Value) -> Result<(), TiktokError> {
    let obj = record
        .as_object()
        .ok_or_else(|| TiktokError::SchemaViolation("record is not an object".to_string()))?;

    for (key, nullable, kind) in VIDEO_DATA_SCHEMA {
        match obj.get(*key) {
            None => {
                return Err(TiktokError::SchemaViolation(format!(
                    "'{}' is a required property",
                    key
                )))
            }
            Some(Value::Null) if *nullable => {}
            Some(value) if kind.accepts(value) => {}
            Some(value) => {
                return Err(TiktokError::SchemaViolation(format!(
                    "'{}' has unexpected value {}",
                    key, value
                )))
            }
        }
    }
    Ok(())
}

/// Validate a record built in memory
pub fn aweme_validate(data: &VideoData) -> Result<(), TiktokError> {
    validate(&serde_json::to_value(data)?)
}
