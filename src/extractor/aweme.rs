//! Mapping of the platform's page state into [`VideoData`]

use crate::extractor::access::{int_or_none, project, str_or_none, string_list, try_get, try_get_with};
use crate::extractor::models::VideoData;
use chrono::DateTime;
use serde_json::Value;

pub const SITE_URL: &str = "https://www.tiktok.com";

static EMPTY: Value = Value::Null;

/// Build the metadata record from the `pageProps` object of a video page.
///
/// Never fails: anything missing or of the wrong type comes out as `None`.
pub fn aweme_extractor(aweme_data: &Value) -> VideoData {
    let video_info = section(aweme_data, "/videoData/itemInfos");
    let author_info = section(aweme_data, "/videoData/authorInfos");
    let share_info = section(aweme_data, "/shareMeta");
    let music_info = section(aweme_data, "/videoData/musicInfos");
    let author_stats = section(aweme_data, "/videoData/authorStats");

    let id = str_or_none(video_info.get("id"));
    let unique_id = str_or_none(author_info.get("uniqueId"));
    let nick_name = str_or_none(author_info.get("nickName"));

    let create_time = try_get_with(
        video_info,
        &[
            &|v: &Value| try_get::<i64>(v, &["/createTime"]),
            &|v: &Value| int_or_none(project(v, "/createTime")),
        ],
    );

    let title = format!("{} on TikTok", nick_name.as_deref().unwrap_or("None"));
    let user_url = unique_id.as_ref().map(|u| format!("{SITE_URL}/@{u}"));
    let webpage_url = match (&unique_id, &id) {
        (Some(u), Some(i)) => Some(format!("{SITE_URL}/@{u}/video/{i}?source=h5_t")),
        _ => None,
    };

    VideoData {
        play_urls: string_list(try_get(video_info, &["/video/urls"])),
        ext: "mp4".to_string(),
        width: try_get(video_info, &["/video/videoMeta/width"]),
        height: try_get(video_info, &["/video/videoMeta/height"]),
        duration: try_get(video_info, &["/video/videoMeta/duration"]),
        thumbnails: string_list(try_get(video_info, &["/covers"])),
        comment_count: int_or_none(video_info.get("commentCount")),
        digg_count: int_or_none(video_info.get("diggCount")),
        share_count: int_or_none(video_info.get("shareCount")),
        play_count: int_or_none(video_info.get("playCount")),
        upload_date: create_time.and_then(upload_date),
        create_time,
        title,
        description: str_or_none(share_info.get("desc")),
        sec_uid: str_or_none(author_info.get("secUid")),
        user_id: str_or_none(author_info.get("userId")),
        user_url,
        profile_pics: string_list(try_get(author_info, &["/covers"])),
        webpage_url,
        follower_count: int_or_none(author_stats.get("followerCount")),
        heart_total: str_or_none(author_stats.get("heartCount")),
        challenge_list: try_get::<&Vec<Value>>(aweme_data, &["/videoData/challengeInfoList"])
            .cloned(),
        duet_info: try_get(aweme_data, &["/videoData/duetInfo"]),
        text_extra: try_get::<&Vec<Value>>(aweme_data, &["/videoData/textExtra"]).cloned(),
        music_id: str_or_none(music_info.get("musicId")),
        music_title: str_or_none(music_info.get("musicName")),
        music_artist: str_or_none(music_info.get("authorName")),
        music_covers: string_list(try_get(music_info, &["/covers"])),
        id,
        nick_name,
        unique_id,
    }
}

/// A nested object, or `null` when it is missing or not an object
fn section<'a>(src: &'a Value, pointer: &str) -> &'a Value {
    project(src, pointer)
        .filter(|v| v.is_object())
        .unwrap_or(&EMPTY)
}

/// `YYYYMMDD` in UTC; `None` for timestamps out of chrono's range
pub fn upload_date(timestamp: i64) -> Option<String> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.format("%Y%m%d").to_string())
}
