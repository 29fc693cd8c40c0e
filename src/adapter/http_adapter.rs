//! OpenAI-compatible HTTP generation adapter

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::adapter::prompt::{generation_prompt, retouch_prompt};
use crate::adapter::traits::{AdapterRequest, GeneratedImage, GenerationAdapter};
use crate::config::AdapterConfig;
use crate::error::{AppError, Result};
use crate::storage::StorageAdapter;

/// Adapter speaking the `/v1/images/*` API shape
pub struct HttpAdapter {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    edit_model: String,
    health_check_path: String,
    /// Where inline (`b64_json`) results are written so they can be
    /// referenced by URL
    storage: Option<Arc<dyn StorageAdapter>>,
}

#[derive(Debug, Serialize)]
struct ApiGenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    n: u32,
    size: &'a str,
    quality: &'a str,
}

#[derive(Debug, Serialize)]
struct ApiEditRequest<'a> {
    model: &'a str,
    image: &'a str,
    prompt: String,
    n: u32,
}

#[derive(Debug, Deserialize)]
struct ApiImagesResponse {
    #[serde(default)]
    data: Vec<ApiImageData>,
}

#[derive(Debug, Deserialize)]
struct ApiImageData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
    #[serde(default)]
    revised_prompt: Option<String>,
}

impl HttpAdapter {
    pub fn new(config: &AdapterConfig, storage: Option<Arc<dyn StorageAdapter>>) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::Internal("HTTP adapter requires an endpoint".to_string()))?;

        // Backstop only; the orchestrator applies the adapter timeout
        let client = Client::builder()
            .timeout(config.timeout() + Duration::from_secs(5))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            edit_model: config.edit_model.clone(),
            health_check_path: config.health_check_path.clone(),
            storage,
        })
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<ApiImagesResponse> {
        let url = format!("{}{}", self.endpoint, path);
        debug!(url = %url, "Sending adapter request");

        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Adapter(format!(
                "Adapter returned {}: {}",
                status, body
            )));
        }

        response
            .json::<ApiImagesResponse>()
            .await
            .map_err(|e| AppError::Adapter(format!("Failed to parse response: {}", e)))
    }

    /// Turn API image entries into URLs, storing inline payloads
    async fn resolve_images(&self, data: Vec<ApiImageData>) -> Result<Vec<GeneratedImage>> {
        let mut images = Vec::with_capacity(data.len());
        for item in data {
            let url = match (item.url, item.b64_json) {
                (Some(url), _) if !url.is_empty() => url,
                (_, Some(b64)) => {
                    let storage = self.storage.as_ref().ok_or_else(|| {
                        AppError::Adapter("Inline image returned but no storage configured".to_string())
                    })?;
                    storage
                        .put_base64(&b64, &format!("generated-{}", Uuid::new_v4()))
                        .await?
                }
                _ => {
                    return Err(AppError::Adapter(
                        "Adapter returned an image without url or data".to_string(),
                    ))
                }
            };
            images.push(GeneratedImage {
                url,
                revised_prompt: item.revised_prompt,
            });
        }
        Ok(images)
    }
}

#[async_trait]
impl GenerationAdapter for HttpAdapter {
    fn name(&self) -> &str {
        "http"
    }

    async fn generate(&self, request: AdapterRequest) -> Result<Vec<GeneratedImage>> {
        let response = match &request {
            AdapterRequest::Generation(params) => {
                let body = ApiGenerateRequest {
                    model: &self.model,
                    prompt: generation_prompt(params),
                    n: params.count,
                    size: params.size.as_str(),
                    quality: params.quality.as_str(),
                };
                self.post("/v1/images/generations", &body).await?
            }
            AdapterRequest::Retouch {
                source_image,
                params,
            } => {
                let body = ApiEditRequest {
                    model: &self.edit_model,
                    image: source_image,
                    prompt: retouch_prompt(params),
                    n: 1,
                };
                self.post("/v1/images/edits", &body).await?
            }
        };

        if response.data.is_empty() {
            warn!(endpoint = %self.endpoint, "Adapter returned no images");
            return Err(AppError::Adapter("No images generated from API".to_string()));
        }

        self.resolve_images(response.data).await
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}{}", self.endpoint, self.health_check_path);
        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!(status = %response.status(), "Adapter health check failed");
                false
            }
            Err(e) => {
                debug!(error = %e, "Adapter health check failed");
                false
            }
        }
    }
}
