//! Page parsing and metadata normalization

pub mod access;
pub mod aweme;
pub mod models;
pub mod schema;
pub mod search;

pub use aweme::aweme_extractor;
pub use models::{Envelope, VideoData};
pub use schema::aweme_validate;
pub use search::{extract_page_json, match_id};
