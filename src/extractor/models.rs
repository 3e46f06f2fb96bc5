//! Data structures for video metadata

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Flat, normalized metadata for one video
///
/// Every field is independently optional. The derived fields (`upload_date`,
/// `user_url`, `webpage_url`) are `None` whenever their inputs are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoData {
    pub id: Option<String>,
    pub play_urls: Option<Vec<String>>,
    pub ext: String,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub duration: Option<i64>,
    pub thumbnails: Option<Vec<String>>,
    pub comment_count: Option<i64>,
    pub digg_count: Option<i64>,
    pub share_count: Option<i64>,
    pub play_count: Option<i64>,
    pub create_time: Option<i64>,
    pub upload_date: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub nick_name: Option<String>,
    pub unique_id: Option<String>,
    pub sec_uid: Option<String>,
    pub user_id: Option<String>,
    pub user_url: Option<String>,
    pub profile_pics: Option<Vec<String>>,
    pub webpage_url: Option<String>,
    pub follower_count: Option<i64>,
    pub heart_total: Option<String>,
    pub challenge_list: Option<Vec<Value>>,
    pub duet_info: Option<String>,
    pub text_extra: Option<Vec<Value>>,
    pub music_id: Option<String>,
    pub music_title: Option<String>,
    pub music_artist: Option<String>,
    pub music_covers: Option<Vec<String>>,
}

impl VideoData {
    /// URL the video file is downloaded from
    pub fn play_url(&self) -> Option<&str> {
        first(&self.play_urls)
    }

    /// URL the cover image is downloaded from
    pub fn thumbnail_url(&self) -> Option<&str> {
        first(&self.thumbnails)
    }
}

fn first(urls: &Option<Vec<String>>) -> Option<&str> {
    urls.as_ref()?.first().map(String::as_str)
}

/// On-disk JSON sidecar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub video_data: VideoData,
    /// Raw platform sub-object the record was built from
    pub aweme_data: Value,
    /// Version of the tool that captured this video
    #[serde(rename = "tiktok-dl")]
    pub tool_version: String,
    /// Unix time of the capture
    pub timestamp: i64,
}

impl Envelope {
    pub fn new(video_data: VideoData, aweme_data: Value) -> Self {
        Self {
            video_data,
            aweme_data,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_urls() {
        let data = VideoData {
            play_urls: Some(vec!["https://v/1".into(), "https://v/2".into()]),
            thumbnails: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(data.play_url(), Some("https://v/1"));
        assert_eq!(data.thumbnail_url(), None);
    }

    #[test]
    fn test_envelope_field_names() {
        let envelope = Envelope::new(VideoData::default(), Value::Null);
        let json = serde_json::to_value(&envelope).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("video_data"));
        assert!(obj.contains_key("aweme_data"));
        assert_eq!(obj["tiktok-dl"], env!("CARGO_PKG_VERSION"));
        assert!(obj["timestamp"].as_i64().unwrap() > 0);
    }
}
