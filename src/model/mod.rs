//! Domain model - jobs, assets and submission requests

pub mod asset;
pub mod job;
pub mod request;

pub use asset::{Asset, AssetId, NewAsset, ASSET_SOURCE};
pub use job::{Job, JobId, JobKind, JobStatus, NewJob};
pub use request::{
    EditType, GenerationParams, GenerationRequest, ImageQuality, ImageSize, JobRequest,
    RetouchParams, RetouchRequest, ValidatedRequest,
};
