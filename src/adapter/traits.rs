//! Generation adapter interface

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{GenerationParams, RetouchParams};

/// Normalized work handed to a generation adapter
#[derive(Debug, Clone)]
pub enum AdapterRequest {
    Generation(GenerationParams),
    Retouch {
        /// URI of the image being retouched
        source_image: String,
        params: RetouchParams,
    },
}

/// One produced image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub url: String,
    pub revised_prompt: Option<String>,
}

/// External image producer. Implementations may be slow and may fail;
/// callers bound every call with a timeout.
#[async_trait]
pub trait GenerationAdapter: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, request: AdapterRequest) -> Result<Vec<GeneratedImage>>;

    async fn health_check(&self) -> bool {
        true
    }
}
