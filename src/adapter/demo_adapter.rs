//! Demo adapter used when no model endpoint is configured

use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::adapter::traits::{AdapterRequest, GeneratedImage, GenerationAdapter};
use crate::error::Result;

/// Returns placeholder image URLs after a simulated processing delay
pub struct DemoAdapter {
    base_url: String,
    latency: Duration,
}

impl DemoAdapter {
    pub fn new(base_url: impl Into<String>, latency: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            latency,
        }
    }

    fn simulated_delay(&self) -> Duration {
        let base = self.latency.as_millis() as u64;
        if base == 0 {
            return Duration::ZERO;
        }
        let jitter = rand::thread_rng().gen_range(0..=base / 2);
        Duration::from_millis(base + jitter)
    }
}

#[async_trait]
impl GenerationAdapter for DemoAdapter {
    fn name(&self) -> &str {
        "demo"
    }

    async fn generate(&self, request: AdapterRequest) -> Result<Vec<GeneratedImage>> {
        let delay = self.simulated_delay();
        tokio::time::sleep(delay).await;

        let batch = Uuid::new_v4();
        let images = match request {
            AdapterRequest::Generation(params) => {
                info!(count = params.count, "Demo mode: returning mock headshots");
                (1..=params.count)
                    .map(|i| GeneratedImage {
                        url: format!("{}/{}-headshot-{}.jpg", self.base_url, batch, i),
                        revised_prompt: None,
                    })
                    .collect()
            }
            AdapterRequest::Retouch { params, .. } => {
                info!(edit_type = params.edit_type.as_str(), "Demo mode: returning mock retouch");
                vec![GeneratedImage {
                    url: format!(
                        "{}/{}-retouched-{}.jpg",
                        self.base_url,
                        batch,
                        params.edit_type.as_str()
                    ),
                    revised_prompt: None,
                }]
            }
        };

        Ok(images)
    }
}
