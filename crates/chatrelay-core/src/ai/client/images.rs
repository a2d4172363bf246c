//! Image generation for the draw branch

use reqwest::Client;
use serde_json::Value;
use tracing::info;

use super::core::{build_request, handle_error_response};
use crate::ai::types::ImageResult;
use crate::constants;
use crate::error::{ProviderError, ProviderResult};

/// Images endpoint client, available in API-key mode only
pub struct ImageClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl ImageClient {
    pub fn new(http: Client, api_key: String, base_url: String) -> Self {
        Self {
            http,
            api_key,
            base_url,
        }
    }

    fn api_url(&self) -> String {
        format!(
            "{}/v1/images/generations",
            self.base_url.trim_end_matches('/')
        )
    }

    /// Generate a single fixed-size image for `prompt`
    pub async fn create_image(&self, prompt: &str) -> ProviderResult<ImageResult> {
        info!(
            "Image generation: n={}, size={}",
            constants::ai::IMAGE_COUNT,
            constants::ai::IMAGE_SIZE
        );
        let body = serde_json::json!({
            "prompt": prompt,
            "n": constants::ai::IMAGE_COUNT,
            "size": constants::ai::IMAGE_SIZE,
        });

        let response = build_request(&self.http, &self.api_url(), &self.api_key)
            .json(&body)
            .send()
            .await?;
        let response = handle_error_response(response, |status, body| ProviderError::Api {
            status,
            body,
        })
        .await?;

        let json: Value = response.json().await?;
        let url = json
            .get("data")
            .and_then(|d| d.as_array())
            .and_then(|arr| arr.first())
            .and_then(|img| img.get("url"))
            .and_then(|u| u.as_str())
            .map(str::to_string);

        Ok(ImageResult { url })
    }
}
