//! Image assets produced by jobs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::JobId;

pub type AssetId = i64;

/// Provenance tag recorded on every produced image
pub const ASSET_SOURCE: &str = "profileperfect-ai";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: AssetId,
    pub job_id: JobId,
    pub uri: String,
    /// Source image this one was retouched from. Reference only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_image_id: Option<AssetId>,
    pub favorited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_preset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_preset: Option<String>,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAsset {
    pub uri: String,
    pub parent_image_id: Option<AssetId>,
    pub style_preset: Option<String>,
    pub background_preset: Option<String>,
}
