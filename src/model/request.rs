//! Submission requests and their validation
//!
//! Generation and retouch bodies arrive as separate JSON shapes but are
//! funnelled through one [`JobRequest`] and validated by a single
//! dispatcher, producing a [`ValidatedRequest`] with every default filled in.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::model::{AssetId, JobKind};

pub const MIN_REFERENCE_IMAGES: usize = 5;
pub const MAX_REFERENCE_IMAGES: usize = 10;
pub const MIN_COUNT: u32 = 1;
pub const MAX_COUNT: u32 = 32;
pub const DEFAULT_COUNT: u32 = 16;
pub const MIN_INTENSITY: f32 = 0.1;
pub const MAX_INTENSITY: f32 = 1.0;

/// Images covered by one credit
const IMAGES_PER_CREDIT: u32 = 4;

/// Body of `POST /api/generate`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[serde(default)]
    pub reference_images: Vec<String>,
    #[serde(default)]
    pub style_preset: String,
    #[serde(default)]
    pub background_preset: String,
    pub count: Option<u32>,
    pub size: Option<String>,
    pub quality: Option<String>,
}

/// Body of `POST /api/retouch`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetouchRequest {
    pub source_image_id: Option<AssetId>,
    pub edit_type: Option<String>,
    pub intensity: Option<f32>,
    pub background_prompt: Option<String>,
    pub preserve_identity: Option<bool>,
}

#[derive(Debug, Clone)]
pub enum JobRequest {
    Generation(GenerationRequest),
    Retouch(RetouchRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSize {
    #[serde(rename = "1024x1024")]
    Square,
    #[serde(rename = "1024x1536")]
    Portrait,
    #[serde(rename = "1536x1024")]
    Landscape,
}

impl ImageSize {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "1024x1024" => Some(Self::Square),
            "1024x1536" => Some(Self::Portrait),
            "1536x1024" => Some(Self::Landscape),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Square => "1024x1024",
            Self::Portrait => "1024x1536",
            Self::Landscape => "1536x1024",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageQuality {
    Standard,
    High,
}

impl ImageQuality {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "standard" => Some(Self::Standard),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditType {
    Retouch,
    Background,
    Both,
}

impl EditType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "retouch" => Some(Self::Retouch),
            "background" => Some(Self::Background),
            "both" => Some(Self::Both),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Retouch => "retouch",
            Self::Background => "background",
            Self::Both => "both",
        }
    }

    pub fn credit_cost(self) -> u32 {
        match self {
            Self::Retouch => 2,
            Self::Background => 3,
            Self::Both => 4,
        }
    }
}

/// Normalized generation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub reference_images: Vec<String>,
    pub style_preset: String,
    pub background_preset: String,
    pub count: u32,
    pub size: ImageSize,
    pub quality: ImageQuality,
}

/// Normalized retouch parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RetouchParams {
    pub source_image_id: AssetId,
    pub edit_type: EditType,
    pub intensity: f32,
    pub background_prompt: Option<String>,
    pub preserve_identity: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidatedRequest {
    Generation(GenerationParams),
    Retouch(RetouchParams),
}

impl JobRequest {
    pub fn kind(&self) -> JobKind {
        match self {
            JobRequest::Generation(_) => JobKind::Generation,
            JobRequest::Retouch(_) => JobKind::Retouch,
        }
    }

    /// Validate and normalize the request
    pub fn validate(self) -> Result<ValidatedRequest> {
        match self {
            JobRequest::Generation(request) => {
                validate_generation(request).map(ValidatedRequest::Generation)
            }
            JobRequest::Retouch(request) => validate_retouch(request).map(ValidatedRequest::Retouch),
        }
    }
}

impl ValidatedRequest {
    pub fn kind(&self) -> JobKind {
        match self {
            ValidatedRequest::Generation(_) => JobKind::Generation,
            ValidatedRequest::Retouch(_) => JobKind::Retouch,
        }
    }

    pub fn required_credits(&self) -> u32 {
        match self {
            ValidatedRequest::Generation(params) => params.count.div_ceil(IMAGES_PER_CREDIT),
            ValidatedRequest::Retouch(params) => params.edit_type.credit_cost(),
        }
    }
}

fn validate_generation(request: GenerationRequest) -> Result<GenerationParams> {
    let image_count = request.reference_images.len();
    if image_count == 0 {
        return Err(invalid("Reference images are required"));
    }
    if !(MIN_REFERENCE_IMAGES..=MAX_REFERENCE_IMAGES).contains(&image_count) {
        return Err(invalid(&format!(
            "Must provide {}-{} reference images",
            MIN_REFERENCE_IMAGES, MAX_REFERENCE_IMAGES
        )));
    }
    if request.reference_images.iter().any(|r| r.trim().is_empty()) {
        return Err(invalid("Reference images must not be empty"));
    }
    if request.style_preset.trim().is_empty() {
        return Err(invalid("Style preset is required"));
    }
    if request.background_preset.trim().is_empty() {
        return Err(invalid("Background preset is required"));
    }

    let count = request.count.unwrap_or(DEFAULT_COUNT);
    if !(MIN_COUNT..=MAX_COUNT).contains(&count) {
        return Err(invalid(&format!(
            "Count must be between {} and {}",
            MIN_COUNT, MAX_COUNT
        )));
    }

    let size = match request.size.as_deref() {
        None => ImageSize::Square,
        Some(s) => ImageSize::parse(s).ok_or_else(|| invalid("Invalid size specified"))?,
    };
    let quality = match request.quality.as_deref() {
        None => ImageQuality::High,
        Some(q) => ImageQuality::parse(q).ok_or_else(|| invalid("Invalid quality specified"))?,
    };

    Ok(GenerationParams {
        reference_images: request.reference_images,
        style_preset: request.style_preset,
        background_preset: request.background_preset,
        count,
        size,
        quality,
    })
}

fn validate_retouch(request: RetouchRequest) -> Result<RetouchParams> {
    let source_image_id = match request.source_image_id {
        Some(id) if id > 0 => id,
        _ => return Err(invalid("Source image ID is required")),
    };

    let edit_type = request
        .edit_type
        .as_deref()
        .and_then(EditType::parse)
        .ok_or_else(|| invalid("Edit type must be retouch, background, or both"))?;

    let intensity = match request.intensity {
        Some(i) if i.is_finite() && (MIN_INTENSITY..=MAX_INTENSITY).contains(&i) => i,
        _ => {
            return Err(invalid(&format!(
                "Intensity must be a number between {} and {}",
                MIN_INTENSITY, MAX_INTENSITY
            )))
        }
    };

    let background_prompt = request
        .background_prompt
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());
    if edit_type == EditType::Background && background_prompt.is_none() {
        return Err(invalid("Background prompt is required for background edits"));
    }

    let preserve_identity = request
        .preserve_identity
        .ok_or_else(|| invalid("Preserve identity must be true or false"))?;

    Ok(RetouchParams {
        source_image_id,
        edit_type,
        intensity,
        background_prompt,
        preserve_identity,
    })
}

fn invalid(message: &str) -> AppError {
    AppError::Validation(message.to_string())
}
